#[must_use]
pub fn truncate_with_ellipsis(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => {
            let truncated = &s[..idx];
            format!("{}...", truncated.trim_end())
        }
        None => s.to_string(),
    }
}

/// First `max_chars` characters of `s`, cut on a char boundary.
#[must_use]
pub fn excerpt(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Show only the last four characters of a secret.
#[must_use]
pub fn mask_secret(s: &str) -> String {
    let count = s.chars().count();
    if count <= 8 {
        return "****".into();
    }
    let tail: String = s.chars().skip(count - 4).collect();
    format!("****{tail}")
}
