/// Safely truncate a string to a maximum number of characters (not bytes).
/// This avoids panics when slicing multi-byte UTF-8 characters.
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    let char_count = s.chars().count();
    if char_count > max_chars {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{truncated}...")
    } else {
        s.to_string()
    }
}

/// Single-line preview of feed text for tables.
pub fn preview(text: Option<&str>, max_chars: usize) -> String {
    match text {
        Some(text) => truncate_str(&text.replace('\n', " "), max_chars),
        None => String::from("(no text)"),
    }
}
