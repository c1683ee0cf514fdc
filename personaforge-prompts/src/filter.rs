//! Immersive-mode meta-analysis filter, spec §4.10 step 6. A lazily built
//! `OnceLock<Vec<Regex>>` pattern table strips meta-analysis phrasing
//! rather than injection attempts (that's `personaforge-attribution`'s
//! job).

use regex::Regex;
use std::sync::OnceLock;

static META_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();

fn patterns() -> &'static Vec<Regex> {
    META_PATTERNS.get_or_init(|| {
        vec![
            Regex::new(r"(?i)core conversation analysis").unwrap(),
            Regex::new(r"(?i)emotional analysis").unwrap(),
            Regex::new(r"(?i)overall assessment").unwrap(),
            Regex::new(r"(?i)relevance score").unwrap(),
            Regex::new(r"(?i)would you like me to").unwrap(),
            Regex::new(r"(?i)\b\d{1,3}\s*/\s*100\b").unwrap(),
            Regex::new(r"(?i)\b\d+(\.\d+)?\s*(out of|/)\s*10\b").unwrap(),
        ]
    })
}

/// `true` if `text` looks like an out-of-character analytical breakdown
/// rather than an in-character message.
pub fn is_meta_analysis(text: &str) -> bool {
    patterns().iter().any(|re| re.is_match(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_known_meta_phrases() {
        assert!(is_meta_analysis("Core Conversation Analysis: the user seems happy"));
        assert!(is_meta_analysis("Relevance Score: 87/100"));
        assert!(is_meta_analysis("Would you like me to summarize this further?"));
    }

    #[test]
    fn ordinary_message_passes() {
        assert!(!is_meta_analysis("I had a lovely walk this morning, how about you?"));
    }
}
