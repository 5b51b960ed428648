//! Balance text parsing

use crate::error::{Error, Result};

const GROUP_SEPARATORS: [char; 3] = [',', '_', ' '];

/// Parse a balance reported as text.
///
/// Accepts an optional sign and thousands separators (`,`, `_` or a space, one
/// kind per value, in groups of three). Anything else, including `NaN` and
/// infinities, is `Error::InvalidBalance`.
pub fn parse_balance(raw: &str) -> Result<f64> {
    let invalid = || Error::InvalidBalance(raw.to_string());

    let trimmed = raw.trim();
    let (sign, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    // at most one sign
    if unsigned.is_empty() || unsigned.starts_with(['+', '-']) {
        return Err(invalid());
    }

    let (integer, fraction) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    if fraction.is_some_and(|f| f.contains(&GROUP_SEPARATORS[..])) {
        return Err(invalid());
    }

    let integer = match GROUP_SEPARATORS.iter().find(|sep| integer.contains(**sep)) {
        Some(sep) => ungroup(integer, *sep).ok_or_else(invalid)?,
        None => integer.to_string(),
    };

    let normalized = match fraction {
        Some(f) => format!("{sign}{integer}.{f}"),
        None => format!("{sign}{integer}"),
    };

    match normalized.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(invalid()),
    }
}

/// Join digit groups like `1,234,567`, or `None` if the grouping is malformed
fn ungroup(integer: &str, sep: char) -> Option<String> {
    let mut groups = integer.split(sep);
    let first = groups.next()?;
    if first.is_empty() || first.len() > 3 || !first.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let mut joined = first.to_string();
    for group in groups {
        if group.len() != 3 || !group.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        joined.push_str(group);
    }
    Some(joined)
}
