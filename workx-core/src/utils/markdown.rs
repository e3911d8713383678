/// Escape user-supplied text for Telegram's legacy `Markdown` parse mode.
///
/// Only `_`, `*`, `` ` `` and `[` are special there.
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// `@username`, escaped, or `fallback` when there is none.
pub fn mention(username: Option<&str>, fallback: &str) -> String {
    match username.filter(|name| !name.is_empty()) {
        Some(name) => escape_markdown(&format!("@{name}")),
        None => fallback.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_special_characters() {
        assert_eq!(escape_markdown("john_doe"), "john\\_doe");
        assert_eq!(escape_markdown("*bold* `code` [link]"), "\\*bold\\* \\`code\\` \\[link]");
        assert_eq!(escape_markdown("שלום"), "שלום");
    }

    #[test]
    fn test_mention_fallback() {
        assert_eq!(mention(Some("ann_lee"), "n/a"), "@ann\\_lee");
        assert_eq!(mention(None, "n/a"), "n/a");
        assert_eq!(mention(Some(""), "n/a"), "n/a");
    }
}
