//! Text sanitization for model output.
//!
//! The completion provider is asked to prefix replies with a role tag and to
//! return bare JSON, but it does not always comply. These helpers have
//! exact-match semantics (trim, then remove a fixed literal token where it
//! appears) and are idempotent, so they are safe to apply to already-clean
//! text.

/// Removes one leading occurrence of `prefix` from trimmed `text`.
///
/// Only a prefix at the very start of the trimmed text is removed; the same
/// literal appearing later in the reply is conversation content and stays.
pub fn strip_role_prefix(text: &str, prefix: &str) -> String {
    let trimmed = text.trim();
    let stripped = trimmed.strip_prefix(prefix).unwrap_or(trimmed);
    stripped.trim().to_string()
}

/// Removes every triple-backtick fence from `text`, wherever it appears.
///
/// Truncated model output can leave a fence mid-string, so this scans the
/// whole text rather than only the ends. A `json` language tag immediately
/// following a fence is removed with it.
pub fn strip_code_fences(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(index) = rest.find("```") {
        output.push_str(&rest[..index]);
        rest = &rest[index + 3..];
        if let Some(after_tag) = rest.strip_prefix("json") {
            rest = after_tag;
        }
    }
    output.push_str(rest);

    output.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::{strip_code_fences, strip_role_prefix};

    #[test]
    fn strips_leading_role_prefix_and_trims() {
        assert_eq!(strip_role_prefix("  CLIENT: Hello there  ", "CLIENT:"), "Hello there");
    }

    #[test]
    fn leaves_text_without_prefix_unchanged() {
        assert_eq!(strip_role_prefix("Hello there", "CLIENT:"), "Hello there");
    }

    #[test]
    fn prefix_stripping_is_idempotent() {
        let once = strip_role_prefix("ADMIN: Welcome", "ADMIN:");
        assert_eq!(strip_role_prefix(&once, "ADMIN:"), once);
    }

    #[test]
    fn mid_text_role_tag_is_preserved() {
        assert_eq!(
            strip_role_prefix("CLIENT: he said ADMIN: no", "CLIENT:"),
            "he said ADMIN: no"
        );
    }

    #[test]
    fn strips_surrounding_fences_and_language_tag() {
        assert_eq!(
            strip_code_fences("```json\n{\"status\":\"booked\"}\n```"),
            "{\"status\":\"booked\"}"
        );
    }

    #[test]
    fn strips_fence_left_mid_string_by_truncation() {
        assert_eq!(strip_code_fences("{\"a\":\"b\"}```json"), "{\"a\":\"b\"}");
    }

    #[test]
    fn fence_stripping_is_idempotent_on_plain_text() {
        assert_eq!(strip_code_fences("{\"a\":\"b\"}"), "{\"a\":\"b\"}");
    }
}
