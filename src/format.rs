//! Number formatting for the token table
//!
//! Every function here is pure: same input, same output. Absent values render
//! as [`PLACEHOLDER`].

use crate::constants::{
    BELOW_MIN_PRICE_MARKER, CURRENCY_PREFIX, FALLBACK_LOGO_URL, MIN_DISPLAY_PRICE, PLACEHOLDER,
    PRICE_MAX_FRACTION_DIGITS, PRICE_MIN_FRACTION_DIGITS,
};
use serde::{Deserialize, Serialize};

/// Direction of a price change; the renderer picks the color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeTone {
    Positive,
    Negative,
    Neutral,
}

/// Rendered change column: text plus tone (no tone when the value is absent)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeCell {
    pub text: String,
    pub tone: Option<ChangeTone>,
}

/// Price with currency prefix, 2 to 8 fractional digits and `,` grouping
pub fn format_price(price: Option<f64>) -> String {
    match price {
        Some(p) if p.is_finite() => {
            if p < MIN_DISPLAY_PRICE {
                return BELOW_MIN_PRICE_MARKER.to_string();
            }
            let fixed = format!("{:.1$}", p, PRICE_MAX_FRACTION_DIGITS);
            format!(
                "{}{}",
                CURRENCY_PREFIX,
                group_thousands(&trim_fraction(&fixed, PRICE_MIN_FRACTION_DIGITS))
            )
        }
        _ => PLACEHOLDER.to_string(),
    }
}

/// Tone of a signed change
pub fn change_tone(change: f64) -> ChangeTone {
    if change > 0.0 {
        ChangeTone::Positive
    } else if change < 0.0 {
        ChangeTone::Negative
    } else {
        ChangeTone::Neutral
    }
}

/// Percent change with exactly 2 decimals
pub fn format_change(change: Option<f64>) -> ChangeCell {
    match change {
        Some(c) if c.is_finite() => {
            // -0.0 would print as "-0.00"
            let c = if c == 0.0 { 0.0 } else { c };
            ChangeCell {
                text: format!("{:.2}%", c),
                tone: Some(change_tone(c)),
            }
        }
        _ => ChangeCell {
            text: PLACEHOLDER.to_string(),
            tone: None,
        },
    }
}

/// Volume with `M`/`K` suffixes above a million/thousand, 2 decimals
pub fn format_volume(volume: Option<f64>) -> String {
    match volume {
        Some(v) if v.is_finite() => {
            let magnitude = v.abs();
            if magnitude >= 1_000_000.0 {
                format!("{:.2}M", v / 1_000_000.0)
            } else if magnitude >= 1_000.0 {
                format!("{:.2}K", v / 1_000.0)
            } else {
                format!("{:.2}", v)
            }
        }
        _ => PLACEHOLDER.to_string(),
    }
}

/// Logo to display: the provided one unless it is missing or failed to load
pub fn resolve_logo(provided: Option<&str>, load_failed: bool) -> &str {
    match provided {
        Some(url) if !load_failed && !url.trim().is_empty() => url,
        _ => FALLBACK_LOGO_URL,
    }
}

/// Drops trailing fractional zeros, keeping at least `min_digits`
fn trim_fraction(fixed: &str, min_digits: usize) -> String {
    let Some((integer, fraction)) = fixed.split_once('.') else {
        return format!("{}.{}", fixed, "0".repeat(min_digits));
    };

    let significant = fraction.trim_end_matches('0').len().max(min_digits);
    let mut fraction = fraction[..significant.min(fraction.len())].to_string();
    while fraction.len() < min_digits {
        fraction.push('0');
    }

    format!("{}.{}", integer, fraction)
}

/// Inserts `,` between thousands of the integer part
pub fn group_thousands(formatted: &str) -> String {
    let (sign, unsigned) = match formatted.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", formatted),
    };
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(formatted.len() + integer.len() / 3);
    grouped.push_str(sign);
    for (i, ch) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(fraction) = fraction {
        grouped.push('.');
        grouped.push_str(fraction);
    }

    grouped
}
