use std::collections::HashSet;

const STOP_WORDS: &[&str] = &[
    "the", "and", "but", "for", "with", "that", "this", "have", "has", "had",
    "does", "did", "will", "would", "could", "should", "you", "your", "they",
    "them", "their", "what", "when", "where", "which", "about", "into", "just",
];

/// Stop-word-filtered unique long tokens, capped at 10 (§4.7).
pub fn extract_keywords(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut keywords = Vec::new();
    for raw in text.to_ascii_lowercase().split_whitespace() {
        let word: String = raw.chars().filter(|c| c.is_alphanumeric()).collect();
        if word.len() <= 3 || STOP_WORDS.contains(&word.as_str()) {
            continue;
        }
        if seen.insert(word.clone()) {
            keywords.push(word);
        }
        if keywords.len() == 10 {
            break;
        }
    }
    keywords
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_stop_words_and_short_tokens() {
        let keywords = extract_keywords("What is your favorite book about the sea?");
        assert!(keywords.contains(&"favorite".to_string()));
        assert!(keywords.contains(&"book".to_string()));
        assert!(!keywords.contains(&"the".to_string()));
    }

    #[test]
    fn deduplicates_and_caps_at_ten() {
        let text = "alpha alpha beta gamma delta epsilon zeta eta theta iota kappa lambda";
        let keywords = extract_keywords(text);
        assert!(keywords.len() <= 10);
        assert_eq!(keywords.iter().filter(|k| *k == "alpha").count(), 1);
    }
}
