/// Collapse every run of `\r`/`\n` into one space, then keep at most `max`
/// characters.
pub fn safe_str(input: &str, max: usize) -> String {
    let mut out = String::with_capacity(input.len().min(max));
    let mut in_break = false;

    for c in input.chars() {
        if c == '\r' || c == '\n' {
            if !in_break {
                out.push(' ');
                in_break = true;
            }
        } else {
            out.push(c);
            in_break = false;
        }
    }

    match out.char_indices().nth(max) {
        Some((idx, _)) => {
            out.truncate(idx);
            out
        }
        None => out,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_line_break_runs_to_single_space() {
        assert_eq!(safe_str("a\r\nb", 100), "a b");
        assert_eq!(safe_str("a\n\n\r\n\rb\nc", 100), "a b c");
        assert_eq!(safe_str("\nlead and trail\r", 100), " lead and trail ");
    }

    #[test]
    fn leaves_clean_input_untouched() {
        assert_eq!(safe_str("Token: ABC123", 100), "Token: ABC123");
        assert_eq!(safe_str("", 10), "");
    }

    #[test]
    fn truncates_to_exact_character_count() {
        assert_eq!(safe_str(&"x".repeat(250), 200).chars().count(), 200);
        assert_eq!(safe_str("abc", 3), "abc");
        assert_eq!(safe_str("abcd", 3), "abc");
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let s = "ç".repeat(130);
        let out = safe_str(&s, 120);
        assert_eq!(out.chars().count(), 120);
        assert!(out.chars().all(|c| c == 'ç'));
    }

    #[test]
    fn truncation_applies_after_collapsing() {
        // 3 chars + 4 line breaks + 3 chars collapses to 7 chars.
        assert_eq!(safe_str("abc\r\n\r\ndef", 7), "abc def");
    }
}
