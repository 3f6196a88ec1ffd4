//! Structured output extraction
//!
//! Replies may wrap a machine-readable answer as `OUTPUT="""..."""`. When
//! such a block is present only its trimmed inner text is emitted.

use regex::Regex;
use std::sync::OnceLock;

fn structured_block() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r#"(?s)OUTPUT ?= ?"""(.*?)""""#).ok())
        .as_ref()
}

/// Return the first structured block's inner text, or the whole reply
///
/// # Examples
///
/// ```
/// use ragbot::output::extract_structured_output;
///
/// assert_eq!(extract_structured_output(r#"OUTPUT="""Result: 42""""#), "Result: 42");
/// assert_eq!(extract_structured_output("plain reply"), "plain reply");
/// ```
pub fn extract_structured_output(reply: &str) -> &str {
    structured_block()
        .and_then(|re| re.captures(reply))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or(reply)
}
