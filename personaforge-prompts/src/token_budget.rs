//! Token counting and budget enforcement, spec §4.10.5. Uses a
//! `tiktoken-rs` encoder for the configured model when available, falling
//! back to a characters-per-4 estimate otherwise.

use std::collections::HashMap;
use tiktoken_rs::{get_bpe_from_model, CoreBPE};

pub struct TokenCounter {
    encoder: Option<CoreBPE>,
    model_name: String,
    cache: parking_lot::RwLock<HashMap<String, usize>>,
}

impl TokenCounter {
    pub fn new(model_name: &str) -> Self {
        let encoder = match get_bpe_from_model(model_name) {
            Ok(enc) => Some(enc),
            Err(_) => get_bpe_from_model("cl100k_base").ok(),
        };

        Self {
            encoder,
            model_name: model_name.to_string(),
            cache: parking_lot::RwLock::new(HashMap::new()),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn count_tokens(&self, text: &str) -> usize {
        if let Some(count) = self.cache.read().get(text) {
            return *count;
        }

        let count = match &self.encoder {
            Some(enc) => enc.encode_with_special_tokens(text).len(),
            None => Self::estimate_tokens(text),
        };

        let mut cache = self.cache.write();
        if cache.len() < 10_000 {
            cache.insert(text.to_string(), count);
        }
        count
    }

    /// ~4 characters per token, used only when no encoder is loaded.
    pub fn estimate_tokens(text: &str) -> usize {
        (text.len() as f32 / 4.0).ceil() as usize
    }

    /// Truncates `text` from the end so it fits within `max_tokens`.
    pub fn truncate_to_tokens(&self, text: &str, max_tokens: usize) -> String {
        match &self.encoder {
            Some(enc) => {
                let tokens = enc.encode_with_special_tokens(text);
                if tokens.len() <= max_tokens {
                    return text.to_string();
                }
                enc.decode(tokens[..max_tokens].to_vec())
                    .unwrap_or_else(|_| text.chars().take(max_tokens * 4).collect())
            }
            None => text.chars().take(max_tokens * 4).collect(),
        }
    }
}

/// Tracks how much of a fixed token budget has been spent, spec §4.10.5.
pub struct TokenBudget {
    total_budget: usize,
    used_tokens: usize,
}

impl TokenBudget {
    pub fn new(total_budget: usize) -> Self {
        Self {
            total_budget,
            used_tokens: 0,
        }
    }

    pub fn use_tokens(&mut self, tokens: usize) {
        self.used_tokens += tokens;
    }

    pub fn available_tokens(&self) -> usize {
        self.total_budget.saturating_sub(self.used_tokens)
    }

    pub fn is_over_budget(&self) -> bool {
        self.used_tokens > self.total_budget
    }

    pub fn overage(&self) -> usize {
        self.used_tokens.saturating_sub(self.total_budget)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_tokens_without_panicking_when_model_unknown() {
        let counter = TokenCounter::new("not-a-real-model");
        let count = counter.count_tokens("hello there, friend");
        assert!(count > 0);
    }

    #[test]
    fn budget_tracks_overage() {
        let mut budget = TokenBudget::new(100);
        budget.use_tokens(150);
        assert!(budget.is_over_budget());
        assert_eq!(budget.overage(), 50);
    }
}
