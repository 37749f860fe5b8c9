//! Summary tokenization for similarity matching
//!
//! Issue summaries are reduced to a set of lower-cased alphanumeric words of
//! at least three characters, minus a short list of glue words. Trackers in
//! scope carry both English and Spanish summaries, so the stopword list covers
//! the most frequent function words of each.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

/// Shortest token kept
pub const MIN_TOKEN_LEN: usize = 3;

static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-z0-9]+").expect("valid regex"));

const STOPWORDS: &[&str] = &[
    // English
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "can", "for", "from", "has", "have",
    "if", "in", "into", "is", "it", "its", "not", "of", "on", "or", "that", "the", "this", "to",
    "was", "were", "when", "with",
    // Spanish
    "al", "con", "de", "del", "el", "en", "es", "la", "las", "lo", "los", "no", "para", "por",
    "que", "se", "sin", "su", "un", "una", "y",
];

/// Whether a lower-cased word is on the stopword list
pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(&word)
}

/// Turn free text into its normalized token set.
///
/// Empty or whitespace-only input yields an empty set.
pub fn tokenize(text: &str) -> BTreeSet<String> {
    let lowered = text.to_lowercase();
    WORD_RE
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|t| t.len() >= MIN_TOKEN_LEN && !is_stopword(t))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(words: &[&str]) -> BTreeSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_tokenize_basic() {
        assert_eq!(
            tokenize("Payment API timeout when submitting transfer"),
            set(&["api", "payment", "submitting", "timeout", "transfer"])
        );
    }

    #[test]
    fn test_tokenize_drops_short_and_stopwords() {
        assert_eq!(tokenize("Error on the UI in app"), set(&["app", "error"]));
        assert_eq!(tokenize("Fallo de login con token para SPEI"), set(&["fallo", "login", "spei", "token"]));
    }

    #[test]
    fn test_tokenize_splits_on_punctuation() {
        assert_eq!(
            tokenize("[MX-1234] login/token: 500 error!!"),
            set(&["1234", "500", "error", "login", "token"])
        );
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \t\n").is_empty());
        assert!(tokenize("a an to").is_empty());
    }

    #[test]
    fn test_tokenize_idempotent() {
        let text = "Timeout timeout TIMEOUT in checkout";
        let once = tokenize(text);
        let joined = once.iter().cloned().collect::<Vec<_>>().join(" ");
        assert_eq!(tokenize(&joined), once);
        assert_eq!(once, set(&["checkout", "timeout"]));
    }
}
