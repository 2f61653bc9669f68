//! Text helpers for rendering tables in a terminal

use rust_decimal::Decimal;

/// Group the digits of an integer string with thousands separators
pub fn format_number<T: ToString>(n: T) -> String {
    let s = n.to_string();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s.as_str()),
    };
    let mut result = String::new();
    let mut count = 0;
    for c in digits.chars().rev() {
        if count == 3 {
            result.push(',');
            count = 0;
        }
        result.push(c);
        count += 1;
    }
    let grouped: String = result.chars().rev().collect();
    format!("{}{}", sign, grouped)
}

/// Amount with two decimals and grouped thousands, e.g. `-12,345.60`
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let text = format!("{:.2}", rounded.abs());
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    format!("{}{}.{}", sign, format_number(whole), fraction)
}

/// Cut `text` to `width` characters, marking the cut with `…`
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut cut: String = text.chars().take(width - 1).collect();
    cut.push('…');
    cut
}

/// Left-align `text` in a cell of `width` characters
pub fn pad(text: &str, width: usize) -> String {
    let cell = truncate(text, width);
    let fill = width.saturating_sub(cell.chars().count());
    format!("{}{}", cell, " ".repeat(fill))
}

/// Right-align `text` in a cell of `width` characters
pub fn pad_left(text: &str, width: usize) -> String {
    let cell = truncate(text, width);
    let fill = width.saturating_sub(cell.chars().count());
    format!("{}{}", " ".repeat(fill), cell)
}

/// Human-readable column header: `bank_account` -> `Bank Account`
pub fn header_label(field: &str) -> String {
    field
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(1234567), "1,234,567");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(-1234), "-1,234");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(Decimal::from_str("1234567.5").unwrap()), "1,234,567.50");
        assert_eq!(format_amount(Decimal::from_str("-980.125").unwrap()), "-980.12");
        assert_eq!(format_amount(Decimal::ZERO), "0.00");
    }

    #[test]
    fn test_truncate_and_pad() {
        assert_eq!(truncate("Groceries", 5), "Groc…");
        assert_eq!(truncate("Rent", 10), "Rent");
        assert_eq!(pad("Rent", 6), "Rent  ");
        assert_eq!(pad_left("42", 4), "  42");
        assert_eq!(pad("Electricity", 6).chars().count(), 6);
    }

    #[test]
    fn test_header_label() {
        assert_eq!(header_label("bank_account"), "Bank Account");
        assert_eq!(header_label("name"), "Name");
    }
}
