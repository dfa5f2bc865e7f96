/// Leading-digit parse of a numeric-as-text count. Anything unparseable is 0.
pub fn parse_count(text: &str) -> u64 {
    let digits = text
        .trim_start()
        .trim_start_matches('+')
        .chars()
        .take_while(char::is_ascii_digit)
        .collect::<String>();

    digits.parse().unwrap_or(if digits.is_empty() { 0 } else { u64::MAX })
}

pub fn format_count(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return trimmed.to_owned();
    }

    let mut grouped = String::with_capacity(trimmed.len() + trimmed.len() / 3);
    for (index, digit) in trimmed.chars().enumerate() {
        if index > 0 && (trimmed.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

pub fn truncate_label(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_owned();
    }
    let mut shortened = text.chars().take(max_chars.saturating_sub(1)).collect::<String>();
    shortened.push('…');
    shortened
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_count_follows_leading_digits() {
        assert_eq!(parse_count("0"), 0);
        assert_eq!(parse_count("1523"), 1523);
        assert_eq!(parse_count("  42k"), 42);
        assert_eq!(parse_count("n/a"), 0);
        assert_eq!(parse_count(""), 0);
        assert_eq!(parse_count("-5"), 0);
    }

    #[test]
    fn parse_count_saturates_on_overflow() {
        assert_eq!(parse_count("99999999999999999999999"), u64::MAX);
    }

    #[test]
    fn format_count_groups_thousands() {
        assert_eq!(format_count("1234567"), "1,234,567");
        assert_eq!(format_count("999"), "999");
        assert_eq!(format_count("hidden"), "hidden");
    }

    #[test]
    fn long_labels_are_cut_on_char_boundaries() {
        assert_eq!(truncate_label("short", 10), "short");
        assert_eq!(truncate_label("héllo wörld", 6), "héllo…");
    }
}
