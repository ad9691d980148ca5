//! Star-count normalization.
//!
//! Counts above a threshold are displayed abbreviated (`1.2k`). Only the
//! thousands suffix exists on the source pages; anything else is rejected.

use topicscrape_shared::{Result, TopicScrapeError};

/// Suffix denoting "thousand".
const THOUSAND_SUFFIX: char = 'k';

/// Decimal places kept when expanding a `k` count; further digits are truncated.
const THOUSAND_DIGITS: usize = 3;

/// Parse a displayed count such as `842`, `1k` or `90.5k` into an exact integer.
///
/// Surrounding whitespace is ignored. Abbreviated values are truncated, so
/// `1.2345k` is `1234`. Signs, grouping separators, exponents and any other
/// suffix are a [`TopicScrapeError::Format`].
pub fn parse_count(text: &str) -> Result<u64> {
    let trimmed = text.trim();
    match trimmed.strip_suffix(THOUSAND_SUFFIX) {
        Some(mantissa) => parse_thousands(trimmed, mantissa.trim_end()),
        None => parse_integer(trimmed),
    }
}

fn parse_integer(input: &str) -> Result<u64> {
    if !is_digits(input) {
        return Err(TopicScrapeError::format(input, "expected a whole number"));
    }
    input
        .parse::<u64>()
        .map_err(|e| TopicScrapeError::format(input, e.to_string()))
}

fn parse_thousands(input: &str, mantissa: &str) -> Result<u64> {
    let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));

    let valid = (whole.is_empty() || is_digits(whole))
        && (fraction.is_empty() || is_digits(fraction))
        && !(whole.is_empty() && fraction.is_empty());
    if !valid {
        return Err(TopicScrapeError::format(
            input,
            "expected a decimal number before the 'k' suffix",
        ));
    }

    let whole = if whole.is_empty() {
        0
    } else {
        whole
            .parse::<u64>()
            .map_err(|e| TopicScrapeError::format(input, e.to_string()))?
    };

    // Right-pad to exactly three digits: "5" -> 500, "25" -> 250, "1234" -> 123.
    let fraction = fraction
        .chars()
        .chain(std::iter::repeat('0'))
        .take(THOUSAND_DIGITS)
        .fold(0u64, |acc, c| acc * 10 + u64::from(c as u8 - b'0'));

    whole
        .checked_mul(1000)
        .and_then(|n| n.checked_add(fraction))
        .ok_or_else(|| TopicScrapeError::format(input, "count overflows u64"))
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
