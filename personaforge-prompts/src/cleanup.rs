//! Post-LLM cleanup, spec §4.10: strips a leading `"<persona_name>:"` or
//! bolded/italicized variant the model sometimes echoes back.

pub fn strip_persona_prefix(display_name: &str, reply: &str) -> String {
    let trimmed = reply.trim_start();
    for variant in [
        format!("{display_name}:"),
        format!("**{display_name}:**"),
        format!("*{display_name}:*"),
        format!("**{display_name}**:"),
    ] {
        if let Some(rest) = trimmed.strip_prefix(&variant) {
            return rest.trim_start().to_string();
        }
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_plain_prefix() {
        assert_eq!(strip_persona_prefix("Elena", "Elena: hi there!"), "hi there!");
    }

    #[test]
    fn strips_bolded_prefix() {
        assert_eq!(strip_persona_prefix("Elena", "**Elena:** hi there!"), "hi there!");
    }

    #[test]
    fn leaves_text_without_prefix_untouched() {
        assert_eq!(strip_persona_prefix("Elena", "hi there!"), "hi there!");
    }
}
