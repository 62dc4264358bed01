/// Trailing digits compared when two addresses differ in formatting or
/// country-code prefix.
pub const DEFAULT_TAIL_DIGITS: usize = 8;

/// Strips everything but ASCII digits.
pub fn normalize_digits(address: &str) -> String {
    address.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Last `n` characters of `digits`, or all of it when shorter.
pub fn tail(digits: &str, n: usize) -> String {
    let len = digits.chars().count();
    if len <= n {
        digits.to_string()
    } else {
        digits.chars().skip(len - n).collect()
    }
}

/// Suffix used for fuzzy matching, `None` when the address has no digits.
pub fn match_tail(address: &str, n: usize) -> Option<String> {
    let digits = normalize_digits(address);
    if digits.is_empty() {
        None
    } else {
        Some(tail(&digits, n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_digits() {
        assert_eq!(normalize_digits("+1 (555) 123-4567"), "15551234567");
        assert_eq!(normalize_digits("06.12.34.56.78"), "0612345678");
        assert_eq!(normalize_digits(""), "");
        assert_eq!(normalize_digits("bob@example.com"), "");
    }

    #[test]
    fn test_tail() {
        assert_eq!(tail("15551234567", 8), "51234567");
        assert_eq!(tail("1234", 8), "1234");
        assert_eq!(tail("12345678", 8), "12345678");
        assert_eq!(tail("", 8), "");
    }

    #[test]
    fn differently_formatted_numbers_share_a_tail() {
        assert_eq!(
            match_tail("+1 555-123-4567", DEFAULT_TAIL_DIGITS),
            match_tail("5551234567", DEFAULT_TAIL_DIGITS)
        );
        assert_eq!(
            match_tail("+33 6 12 34 56 78", DEFAULT_TAIL_DIGITS).as_deref(),
            Some("12345678")
        );
        assert_eq!(match_tail("no digits", DEFAULT_TAIL_DIGITS), None);
    }
}
