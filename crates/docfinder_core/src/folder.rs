use std::collections::BTreeSet;

/// A registered directory tracked by the client.
///
/// `archived` is client-only state; the backend never sees it. A folder is
/// only ever archived after it has been processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folder {
    pub path: String,
    pub name: String,
    pub processed: bool,
    pub archived: bool,
    pub files: Vec<String>,
}

impl Folder {
    fn unprocessed(path: String) -> Self {
        Self {
            name: display_name(&path),
            path,
            processed: false,
            archived: false,
            files: Vec::new(),
        }
    }
}

/// Folder as reported by the backend inventory (`GET /folders/`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFolder {
    pub path: String,
    pub name: String,
    pub files: Vec<String>,
}

/// Per-folder detail of an ingest call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IngestFolderReport {
    pub path: String,
    pub status: String,
    pub processed_count: u64,
    pub total_attempted: u64,
    pub failed_files: Vec<String>,
}

/// Response of `POST /dir/`: `completed` lists the paths the backend
/// reports as done.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IngestReport {
    pub completed: Vec<String>,
    pub folders: Vec<IngestFolderReport>,
}

impl IngestReport {
    pub fn failed_file_count(&self) -> usize {
        self.folders.iter().map(|f| f.failed_files.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeFailure {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RegistrationOutcome {
    pub added: Vec<Folder>,
    /// Paths already present in the collection (or repeated in the batch).
    pub rejected: Vec<String>,
    /// Path whose directory probe failed; the whole batch was dropped.
    pub failed_probe: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveOutcome {
    /// Unprocessed folder removed outright.
    Removed,
    Archived,
    Unknown,
}

/// Canonical ordered collection of folders, keyed by path.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FolderSet {
    folders: Vec<Folder>,
}

impl FolderSet {
    pub fn iter(&self) -> impl Iterator<Item = &Folder> {
        self.folders.iter()
    }

    pub fn len(&self) -> usize {
        self.folders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&Folder> {
        self.folders.iter().find(|folder| folder.path == path)
    }

    fn get_mut(&mut self, path: &str) -> Option<&mut Folder> {
        self.folders.iter_mut().find(|folder| folder.path == path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Splits candidates into paths that may be registered and paths that
    /// are already present (by exact path equality) or repeated.
    pub fn partition_candidates(&self, candidates: &[String]) -> (Vec<String>, Vec<String>) {
        let mut fresh = Vec::new();
        let mut rejected = Vec::new();
        let mut seen = BTreeSet::new();
        for path in candidates {
            if self.contains(path) || !seen.insert(path.as_str()) {
                rejected.push(path.clone());
            } else {
                fresh.push(path.clone());
            }
        }
        (fresh, rejected)
    }

    /// Adds probed paths as unprocessed folders. Paths that became present
    /// since the probe was issued are rejected instead.
    pub(crate) fn register(&mut self, probed: &[String]) -> RegistrationOutcome {
        let (fresh, rejected) = self.partition_candidates(probed);
        let added: Vec<Folder> = fresh.into_iter().map(Folder::unprocessed).collect();
        self.folders.extend(added.iter().cloned());
        RegistrationOutcome {
            added,
            rejected,
            failed_probe: None,
        }
    }

    pub(crate) fn archive(&mut self, path: &str) -> ArchiveOutcome {
        let Some(index) = self.folders.iter().position(|f| f.path == path) else {
            return ArchiveOutcome::Unknown;
        };
        if self.folders[index].processed {
            self.folders[index].archived = true;
            ArchiveOutcome::Archived
        } else {
            self.folders.remove(index);
            ArchiveOutcome::Removed
        }
    }

    pub(crate) fn unarchive(&mut self, path: &str) -> bool {
        match self.get_mut(path) {
            Some(folder) => {
                folder.archived = false;
                true
            }
            None => false,
        }
    }

    pub(crate) fn remove(&mut self, path: &str) -> Option<Folder> {
        let index = self.folders.iter().position(|f| f.path == path)?;
        Some(self.folders.remove(index))
    }

    /// Folders eligible for ingest: not archived and not yet processed.
    pub fn unprocessed_paths(&self) -> Vec<String> {
        self.folders
            .iter()
            .filter(|f| !f.archived && !f.processed)
            .map(|f| f.path.clone())
            .collect()
    }

    pub fn archived_paths(&self) -> Vec<String> {
        self.folders
            .iter()
            .filter(|f| f.archived)
            .map(|f| f.path.clone())
            .collect()
    }

    /// Processed folders currently included in queries.
    pub fn searchable_paths(&self) -> Vec<String> {
        self.folders
            .iter()
            .filter(|f| f.processed && !f.archived)
            .map(|f| f.path.clone())
            .collect()
    }

    /// Ingest phase 1: promote backend-confirmed paths. Returns the paths
    /// that are present locally.
    pub(crate) fn mark_processed(&mut self, completed: &[String]) -> Vec<String> {
        let mut promoted = Vec::new();
        for path in completed {
            if let Some(folder) = self.get_mut(path) {
                folder.processed = true;
                promoted.push(path.clone());
            }
        }
        promoted
    }

    /// Ingest phase 2: take `name` and `files` from the refetched inventory
    /// for the given paths only. `archived` and `processed` are untouched,
    /// so applying the same inventory twice is a no-op.
    pub(crate) fn merge_inventory_files(&mut self, remote: &[RemoteFolder], only: &[String]) {
        for entry in remote {
            if !only.iter().any(|path| path == &entry.path) {
                continue;
            }
            if let Some(folder) = self.get_mut(&entry.path) {
                folder.name = entry.name.clone();
                folder.files = entry.files.clone();
            }
        }
    }

    /// Startup seeding: every backend folder is processed. Local folders
    /// with the same path are promoted and keep their `archived` flag.
    pub(crate) fn seed_from_inventory(&mut self, remote: Vec<RemoteFolder>) {
        for entry in remote {
            match self.get_mut(&entry.path) {
                Some(folder) => {
                    folder.processed = true;
                    folder.name = entry.name;
                    folder.files = entry.files;
                }
                None => self.folders.push(Folder {
                    path: entry.path,
                    name: entry.name,
                    processed: true,
                    archived: false,
                    files: entry.files,
                }),
            }
        }
    }

    /// Re-applies a persisted archive set. Unprocessed folders are skipped.
    pub(crate) fn apply_archived(&mut self, archived: &BTreeSet<String>) -> usize {
        let mut applied = 0;
        for folder in &mut self.folders {
            if folder.processed && !folder.archived && archived.contains(&folder.path) {
                folder.archived = true;
                applied += 1;
            }
        }
        applied
    }
}

/// Display label for a folder path: its last non-empty segment.
pub fn display_name(path: &str) -> String {
    path.trim_end_matches(['/', '\\'])
        .rsplit(['/', '\\'])
        .find(|segment| !segment.is_empty())
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| path.to_string())
}
