//! Display formatting for amounts, ratios and months (es-CL).
//!
//! Values formatted here are for presentation only and never fed back
//! into computations.

use crate::month::Month;

const CURRENCY_SYMBOL: &str = "$";
const THOUSANDS_SEPARATOR: char = '.';

const MONTH_NAMES: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// Formats an integer CLP amount, e.g. `450000` as `$450.000`.
/// Missing values format as zero.
pub fn format_currency(value: Option<i64>) -> String {
    let value = value.unwrap_or(0);
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(THOUSANDS_SEPARATOR);
        }
        grouped.push(digit);
    }

    if value < 0 {
        format!("-{}{}", CURRENCY_SYMBOL, grouped)
    } else {
        format!("{}{}", CURRENCY_SYMBOL, grouped)
    }
}

/// Formats a 0.0-1.0 ratio as a whole percentage.
pub fn format_percent(ratio: f64) -> String {
    format!("{}%", (ratio * 100.0).round() as i64)
}

/// Long Spanish month label, e.g. `octubre 2026`.
pub fn month_label(month: Month) -> String {
    let index = usize::try_from(month.month().saturating_sub(1)).unwrap_or(0);
    let name = MONTH_NAMES.get(index).copied().unwrap_or_default();
    format!("{} {}", name, month.year())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(Some(450000)), "$450.000");
        assert_eq!(format_currency(Some(1234567)), "$1.234.567");
        assert_eq!(format_currency(Some(999)), "$999");
        assert_eq!(format_currency(Some(-150000)), "-$150.000");
        assert_eq!(format_currency(None), "$0");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(0.75), "75%");
        assert_eq!(format_percent(0.333), "33%");
        assert_eq!(format_percent(1.0), "100%");
    }

    #[test]
    fn test_month_label() {
        let month: Month = "2026-10".parse().unwrap();
        assert_eq!(month_label(month), "octubre 2026");

        let month: Month = "2024-01".parse().unwrap();
        assert_eq!(month_label(month), "enero 2024");
    }
}
