use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

pub type SearchId = u64;

/// Parameters of one plain search (`GET /query`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub match_count: u32,
    pub folders: Vec<String>,
    pub archived_folders: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchResult {
    pub file_name: String,
    pub file_path: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub similarity: Option<f64>,
    #[serde(default)]
    pub last_modified_at: Option<String>,
}

/// Backend-proposed mutation. The client never builds or edits one; it
/// forwards the descriptor verbatim to the execute endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PendingAction(serde_json::Value);

impl PendingAction {
    pub fn from_json(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn as_json(&self) -> &serde_json::Value {
        &self.0
    }

    /// The descriptor's own `action` field, if any.
    pub fn declared_kind(&self) -> Option<&str> {
        self.0.get("action").and_then(serde_json::Value::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActionKind {
    MoveFiles,
    CopyFiles,
    TagFiles,
}

impl ActionKind {
    pub const ALL: [ActionKind; 3] = [
        ActionKind::MoveFiles,
        ActionKind::CopyFiles,
        ActionKind::TagFiles,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ActionKind::MoveFiles => "move_files",
            ActionKind::CopyFiles => "copy_files",
            ActionKind::TagFiles => "tag_files",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct SearchResults {
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<SearchResult>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub confirm_required: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pending_actions: BTreeMap<String, PendingAction>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub tag_color: Option<u32>,
    #[serde(default)]
    pub tagged_count: Option<u64>,
    #[serde(default)]
    pub taggable_count: Option<u64>,
}

impl SearchResults {
    /// The pending action of `kind`, when confirmation is required and the
    /// descriptor declares the same kind as its key.
    pub fn pending(&self, kind: ActionKind) -> Option<&PendingAction> {
        if !self.confirm_required {
            return None;
        }
        self.pending_actions
            .get(kind.key())
            .filter(|action| action.declared_kind() == Some(kind.key()))
    }

    pub fn confirmable(&self) -> Vec<ActionKind> {
        ActionKind::ALL
            .into_iter()
            .filter(|kind| self.pending(*kind).is_some())
            .collect()
    }

    pub fn tag_color_name(&self) -> Option<&'static str> {
        self.tag_color
            .and_then(TagColor::from_code)
            .map(TagColor::label)
    }

    pub(crate) fn apply_action_outcome(&mut self, kind: ActionKind, outcome: &ActionOutcome) {
        self.confirm_required = false;
        self.pending_actions.clear();
        if kind == ActionKind::TagFiles {
            if outcome.color.is_some() {
                self.tag_color = outcome.color;
            }
            if outcome.tagged_count.is_some() {
                self.tagged_count = outcome.tagged_count;
            }
        }
    }
}

/// Response of `POST /actions/execute`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ActionOutcome {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub color: Option<u32>,
    #[serde(default, rename = "taggedCount")]
    pub tagged_count: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagColor {
    Gray,
    Green,
    Purple,
    Blue,
    Yellow,
    Red,
    Orange,
}

impl TagColor {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(TagColor::Gray),
            2 => Some(TagColor::Green),
            3 => Some(TagColor::Purple),
            4 => Some(TagColor::Blue),
            5 => Some(TagColor::Yellow),
            6 => Some(TagColor::Red),
            7 => Some(TagColor::Orange),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TagColor::Gray => "gray",
            TagColor::Green => "green",
            TagColor::Purple => "purple",
            TagColor::Blue => "blue",
            TagColor::Yellow => "yellow",
            TagColor::Red => "red",
            TagColor::Orange => "orange",
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
