//! Small text helpers shared across agents and memory.

/// Truncates a string to at most `max_chars` characters, appending an
/// ellipsis when anything was cut. Safe on multi-byte text.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{cut}...")
}

/// Strips an enclosing fenced code block (``` or ```lang) from a
/// plain-text response, if present.
pub fn strip_fence_wrapper(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }

    let mut lines: Vec<&str> = trimmed.lines().collect();
    // Drop the opening fence line (which may carry a language tag).
    lines.remove(0);
    if lines.last().map(|l| l.trim()) == Some("```") {
        lines.pop();
    }
    lines.join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("abcdef", 3), "abc...");
        // Multi-byte safety.
        assert_eq!(truncate_chars("辩论主题很长", 3), "辩论主...");
    }

    #[test]
    fn test_strip_fence_wrapper() {
        assert_eq!(strip_fence_wrapper("plain text"), "plain text");
        assert_eq!(strip_fence_wrapper("```\nbody\n```"), "body");
        assert_eq!(strip_fence_wrapper("```markdown\nbody line\n```"), "body line");
        assert_eq!(strip_fence_wrapper("```\nno closing fence"), "no closing fence");
    }
}
