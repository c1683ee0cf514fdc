//! In-character apology fallback, spec §4.12 step 8: on total LLM failure
//! the Orchestrator must still reply, just not with an error message.

/// A handful of variants so a string of consecutive failures doesn't read
/// as a stuck bot repeating itself verbatim.
const FALLBACKS: &[&str] = &[
    "Sorry, I got a little lost in thought there — could you say that again?",
    "Hm, my mind wandered for a second. What were you saying?",
    "I didn't quite catch that, can you repeat it?",
];

pub fn fallback_reply(seed: usize) -> &'static str {
    FALLBACKS[seed % FALLBACKS.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycles_through_variants() {
        assert_ne!(fallback_reply(0), fallback_reply(1));
    }
}
