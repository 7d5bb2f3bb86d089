//! Money helpers: parsing stored amounts and formatting them as USD.

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

use super::error::TraderError;

/// Format an amount as US dollars, e.g. `$1,234.56` or `-$0.50`.
pub fn usd(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let text = format!("{:.2}", rounded.abs());
    let (whole, frac) = text.split_once('.').unwrap_or((&text, "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{sign}${grouped}.{frac}")
}

/// Parse a decimal amount as stored in the database or config.
pub fn parse_amount(text: &str) -> Result<Decimal, TraderError> {
    Decimal::from_str(text.trim()).map_err(|e| TraderError::validation(format!(
        "invalid amount {text:?}: {e}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn usd_formats_small_amounts() {
        assert_eq!(usd(dec("0")), "$0.00");
        assert_eq!(usd(dec("5")), "$5.00");
        assert_eq!(usd(dec("150.5")), "$150.50");
    }

    #[test]
    fn usd_groups_thousands() {
        assert_eq!(usd(dec("1000")), "$1,000.00");
        assert_eq!(usd(dec("8500")), "$8,500.00");
        assert_eq!(usd(dec("1234567.891")), "$1,234,567.89");
    }

    #[test]
    fn usd_rounds_half_away_from_zero() {
        assert_eq!(usd(dec("0.005")), "$0.01");
        assert_eq!(usd(dec("2.344")), "$2.34");
    }

    #[test]
    fn usd_negative_amounts() {
        assert_eq!(usd(dec("-1500.25")), "-$1,500.25");
        assert_eq!(usd(dec("-0.001")), "$0.00");
    }

    #[test]
    fn parse_amount_accepts_decimal_text() {
        assert_eq!(parse_amount(" 10000.00 ").unwrap(), dec("10000"));
        assert!(matches!(
            parse_amount("ten"),
            Err(TraderError::Validation { .. })
        ));
    }
}
