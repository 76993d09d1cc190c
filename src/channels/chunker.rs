/// Split `text` into pieces of at most `max_chars` characters, breaking after
/// a newline where possible and mid-line only when a single line is too long.
#[must_use]
pub fn chunk_message(text: &str, max_chars: usize) -> Vec<String> {
    if text.is_empty() || max_chars == 0 {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split_inclusive('\n') {
        let line_len = line.chars().count();
        if current_len + line_len <= max_chars {
            current.push_str(line);
            current_len += line_len;
            continue;
        }

        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if line_len <= max_chars {
            current.push_str(line);
            current_len = line_len;
            continue;
        }

        for ch in line.chars() {
            if current_len == max_chars {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            current.push(ch);
            current_len += 1;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::chunk_message;

    #[test]
    fn empty_message_has_no_chunks() {
        assert!(chunk_message("", 10).is_empty());
    }

    #[test]
    fn short_message_is_one_chunk() {
        assert_eq!(chunk_message("hello", 10), vec!["hello"]);
    }

    #[test]
    fn breaks_on_line_boundaries() {
        let text = "line one\nline two\nline three";
        let chunks = chunk_message(text, 18);
        assert_eq!(chunks, vec!["line one\nline two\n", "line three"]);
    }

    #[test]
    fn long_line_is_hard_split_by_characters() {
        let text = "ключ".repeat(10);
        let chunks = chunk_message(&text, 7);
        assert!(chunks.iter().all(|c| c.chars().count() <= 7));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn health_report_sized_text_fits_telegram_limit() {
        let text = "service: FAIL (http 500: boom)\n".repeat(300);
        let chunks = chunk_message(&text, 4096);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= 4096));
        assert_eq!(chunks.concat(), text);
    }
}
