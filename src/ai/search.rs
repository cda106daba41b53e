//! Semantic search through a generative model.
//!
//! The model sees a numbered list of the newest entries and answers with the
//! numbers of the relevant ones. Its reply is untrusted free text, so the
//! numbers are recovered with a regex and checked against the list.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::knowledge::KnowledgeEntry;

pub const SYSTEM_PROMPT: &str =
    "You are a helpful search assistant. Be concise and only return article numbers.";

static INDEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid index regex"));
static NONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bnone\b").expect("valid none regex"));

/// Numbered list the model ranks, one block per entry.
pub fn build_context(entries: &[KnowledgeEntry]) -> String {
    entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| format!("[{idx}] Title: {}\nSummary: {}\n", entry.title, entry.summary))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn build_prompt(query: &str, context: &str) -> String {
    format!(
        "You are searching a personal knowledge base. Given the user's query and a list of saved \
articles, pick the articles that are relevant to the query.

User Query: \"{query}\"

Saved Articles:
{context}

Answer with ONLY the numbers of the relevant articles, most relevant first, separated by commas. \
If no article is relevant, answer \"none\".
Example: 0,2,5"
    )
}

/// Indices named in `reply`, in reply order.
///
/// - the word `none` anywhere means no match;
/// - indices outside `0..context_len` are dropped;
/// - repeated indices keep their first position;
/// - an empty reply, or one without numbers, matches nothing.
pub fn parse_ranked_indices(reply: &str, context_len: usize) -> Vec<usize> {
    if NONE.is_match(reply) {
        return vec![];
    }

    let mut indices: Vec<usize> = Vec::new();
    for found in INDEX.find_iter(reply) {
        // digit runs too long for usize are out of range anyway
        let Ok(idx) = found.as_str().parse::<usize>() else {
            continue;
        };
        if idx < context_len && !indices.contains(&idx) {
            indices.push(idx);
        }
    }

    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eid::EntryId;
    use chrono::Utc;

    fn entry(title: &str, summary: &str) -> KnowledgeEntry {
        KnowledgeEntry {
            id: EntryId::generate(),
            title: title.to_string(),
            url: String::new(),
            summary: summary.to_string(),
            full_text: String::new(),
            saved_at: Utc::now(),
            tags: vec![],
            is_selection: false,
        }
    }

    #[test]
    fn test_none_means_no_results() {
        assert!(parse_ranked_indices("none", 5).is_empty());
        assert!(parse_ranked_indices("None.", 5).is_empty());
        assert!(parse_ranked_indices("NONE of them, sorry", 5).is_empty());
    }

    #[test]
    fn test_none_must_be_a_whole_word() {
        assert_eq!(parse_ranked_indices("1 (nonetheless relevant)", 5), vec![1]);
    }

    #[test]
    fn test_indices_keep_reply_order() {
        assert_eq!(parse_ranked_indices("0,2", 5), vec![0, 2]);
        assert_eq!(parse_ranked_indices("3, 1, 4", 5), vec![3, 1, 4]);
        assert_eq!(parse_ranked_indices("Articles [2] and [0]", 5), vec![2, 0]);
    }

    #[test]
    fn test_out_of_range_and_duplicates_are_dropped() {
        assert_eq!(parse_ranked_indices("0,7,1", 3), vec![0, 1]);
        assert_eq!(parse_ranked_indices("1,1,0,1", 3), vec![1, 0]);
        assert_eq!(parse_ranked_indices("99999999999999999999999", 3), Vec::<usize>::new());
    }

    #[test]
    fn test_empty_or_wordy_reply_matches_nothing() {
        assert!(parse_ranked_indices("", 3).is_empty());
        assert!(parse_ranked_indices("I am not sure.", 3).is_empty());
    }

    #[test]
    fn test_context_numbers_entries_from_zero() {
        let entries = vec![entry("Rust", "ownership"), entry("Go", "goroutines")];
        let context = build_context(&entries);

        assert_eq!(
            context,
            "[0] Title: Rust\nSummary: ownership\n\n[1] Title: Go\nSummary: goroutines\n"
        );

        let prompt = build_prompt("memory safety", &context);
        assert!(prompt.contains("User Query: \"memory safety\""));
        assert!(prompt.contains("[1] Title: Go"));
        assert!(prompt.contains("\"none\""));
    }
}
