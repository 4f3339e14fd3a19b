const AGENT_KEYWORDS: [&str; 4] = [
    "summarize",
    "summary",
    "synthesize",
    "what do the documents say",
];

/// Whether a query asks for cross-document synthesis rather than a plain
/// search. Case-insensitive substring match.
pub fn is_agent_query(text: &str) -> bool {
    let lowered = text.to_lowercase();
    AGENT_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
}
