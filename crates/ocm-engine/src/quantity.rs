//! Kubernetes quantity arithmetic
//!
//! Quantities are handled as signed thousandths of their base unit (millicores
//! for CPU, millibytes for memory), which is exact for every suffix a request
//! is written with in practice. Anything finer than a thousandth rounds up.

use crate::error::QuantityError;

const BINARY_SUFFIXES: &[(&str, u32)] = &[
    ("Ei", 60),
    ("Pi", 50),
    ("Ti", 40),
    ("Gi", 30),
    ("Mi", 20),
    ("Ki", 10),
];

const DECIMAL_SUFFIXES: &[(&str, i32)] = &[
    ("E", 18),
    ("P", 15),
    ("T", 12),
    ("G", 9),
    ("M", 6),
    ("k", 3),
];

/// Power-of-ten and power-of-two scale of a suffix
fn suffix_scale(suffix: &str) -> Option<(i32, u32)> {
    let scale = match suffix {
        "" => (0, 0),
        "n" => (-9, 0),
        "u" => (-6, 0),
        "m" => (-3, 0),
        "k" => (3, 0),
        "M" => (6, 0),
        "G" => (9, 0),
        "T" => (12, 0),
        "P" => (15, 0),
        "E" => (18, 0),
        "Ki" => (0, 10),
        "Mi" => (0, 20),
        "Gi" => (0, 30),
        "Ti" => (0, 40),
        "Pi" => (0, 50),
        "Ei" => (0, 60),
        _ => {
            let exponent = suffix.strip_prefix(['e', 'E'])?;
            (exponent.parse::<i32>().ok()?, 0)
        }
    };
    Some(scale)
}

/// Parse a quantity such as `500m`, `1.5`, `512Mi` or `1e3` into thousandths
pub fn parse_millis(quantity: &str) -> Result<i128, QuantityError> {
    let text = quantity.trim();
    if text.is_empty() {
        return Err(QuantityError::Empty);
    }
    let invalid = || QuantityError::Invalid(quantity.to_string());
    let overflow = || QuantityError::Overflow(quantity.to_string());

    let (negative, unsigned) = match text.as_bytes()[0] {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };

    let number_len = unsigned
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(unsigned.len());
    let (number, suffix) = unsigned.split_at(number_len);

    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    if (whole.is_empty() && fraction.is_empty()) || fraction.contains('.') {
        return Err(invalid());
    }

    let (scale10, scale2) = suffix_scale(suffix).ok_or_else(invalid)?;

    let mantissa: i128 = format!("{whole}{fraction}")
        .parse::<i128>()
        .ok()
        .and_then(|m| m.checked_mul(1i128 << scale2))
        .ok_or_else(overflow)?;

    let exponent = i32::try_from(fraction.len())
        .ok()
        .and_then(|digits| scale10.checked_sub(digits))
        .and_then(|e| e.checked_add(3))
        .ok_or_else(overflow)?;
    let magnitude = if exponent >= 0 {
        10i128
            .checked_pow(exponent.unsigned_abs())
            .and_then(|factor| mantissa.checked_mul(factor))
            .ok_or_else(overflow)?
    } else {
        match 10i128.checked_pow(exponent.unsigned_abs()) {
            Some(divisor) => mantissa / divisor + i128::from(mantissa % divisor != 0),
            // below any representable thousandth
            None => i128::from(mantissa > 0),
        }
    };

    Ok(if negative { -magnitude } else { magnitude })
}

/// Canonical CPU notation: whole cores, otherwise millicores
pub fn format_cpu(millis: i128) -> String {
    if millis % 1000 == 0 {
        (millis / 1000).to_string()
    } else {
        format!("{millis}m")
    }
}

/// Suffix family a quantity is written in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notation {
    /// `Ki`, `Mi`, `Gi`, ...
    Binary,
    /// `k`, `M`, `G`, ... and plain numbers
    Decimal,
}

impl Notation {
    pub fn of(quantity: &str) -> Self {
        if quantity.trim_end().ends_with('i') {
            Notation::Binary
        } else {
            Notation::Decimal
        }
    }
}

/// Canonical memory notation
///
/// Binary quantities use the largest exact binary suffix and fall back to
/// decimal; decimal quantities use the largest exact decimal suffix. Values
/// with no exact suffix are written as plain bytes.
pub fn format_memory(millis: i128, notation: Notation) -> String {
    if millis % 1000 != 0 {
        return format!("{millis}m");
    }
    let bytes = millis / 1000;
    if bytes == 0 {
        return "0".to_string();
    }

    if notation == Notation::Binary {
        for (suffix, shift) in BINARY_SUFFIXES {
            let unit = 1i128 << shift;
            if bytes % unit == 0 {
                return format!("{}{suffix}", bytes / unit);
            }
        }
    }
    for (suffix, power) in DECIMAL_SUFFIXES {
        let unit = 10i128.pow(*power as u32);
        if bytes % unit == 0 {
            return format!("{}{suffix}", bytes / unit);
        }
    }
    bytes.to_string()
}
