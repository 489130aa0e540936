//! Small text helpers for the card parser: locale-aware price parsing,
//! digit extraction and keyword detection.

/// Parses a European-format price string ("185.000€", "1.250.000€") into
/// whole euros. Dots are thousands separators; a trailing comma starts the
/// decimal part, which is dropped. Returns 0 when no usable number remains.
pub fn parse_price(text: &str) -> i64 {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',')
        .collect();
    if cleaned.is_empty() {
        return 0;
    }

    // Last comma is the decimal separator; anything after it is cents.
    let integer_part = match cleaned.rfind(',') {
        Some(pos) => &cleaned[..pos],
        None => cleaned.as_str(),
    };
    let digits: String = integer_part
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();

    digits.parse().unwrap_or(0)
}

/// First run of digits in the text ("3 hab." → 3, "95 m²" → 95), or `None`
/// when the text has no digits at all.
pub fn extract_number(text: &str) -> Option<i64> {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        None
    } else {
        digits.parse().ok()
    }
}

/// Case-insensitive substring match against a keyword set.
pub fn contains_keyword(text: &str, keywords: &[&str]) -> bool {
    if text.is_empty() {
        return false;
    }
    let lower = text.to_lowercase();
    keywords
        .iter()
        .any(|keyword| lower.contains(&keyword.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_price_handles_plain_thousands() {
        assert_eq!(parse_price("185.000€"), 185_000);
    }

    #[test]
    fn parse_price_collapses_multiple_thousands_separators() {
        assert_eq!(parse_price("1.250.000€"), 1_250_000);
    }

    #[test]
    fn parse_price_drops_decimal_part() {
        assert_eq!(parse_price("1.250,50 €"), 1_250);
    }

    #[test]
    fn parse_price_returns_zero_without_digits() {
        assert_eq!(parse_price(""), 0);
        assert_eq!(parse_price("A consultar"), 0);
    }

    #[test]
    fn extract_number_takes_first_digit_run() {
        assert_eq!(extract_number("3 hab."), Some(3));
        assert_eq!(extract_number("95 m²"), Some(95));
        assert_eq!(extract_number("bajo 2 de 4"), Some(2));
    }

    #[test]
    fn extract_number_returns_none_without_digits() {
        assert_eq!(extract_number("no digits"), None);
        assert_eq!(extract_number(""), None);
    }

    #[test]
    fn contains_keyword_is_case_insensitive() {
        assert!(contains_keyword("Piso con GARAJE incluido", &["garaje"]));
        assert!(contains_keyword("plaza de Parking", &["garaje", "parking"]));
        assert!(!contains_keyword("piso luminoso", &["garaje", "parking"]));
        assert!(!contains_keyword("", &["garaje"]));
    }
}
