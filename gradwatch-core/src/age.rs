//! Relative posting age ("12d", "1mo", "2w", "6h") normalised to whole days.

use std::sync::LazyLock;

use regex::Regex;

static AGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)(mo|w|d|h)$").expect("age pattern compiles"));

/// Spelled-out unit variants, longest first so "months" is rewritten before "month".
const UNIT_ALIASES: &[(&str, &str)] = &[
    ("months", "mo"),
    ("month", "mo"),
    ("weeks", "w"),
    ("week", "w"),
    ("days", "d"),
    ("day", "d"),
    ("hours", "h"),
    ("hour", "h"),
    ("hrs", "h"),
    ("hr", "h"),
];

const DAYS_PER_WEEK: u64 = 7;
const DAYS_PER_MONTH: u64 = 30;

/// Convert a displayed age token into the canonical `"<N>d"` form.
///
/// Total: empty or unparseable input yields `"0d"`. Hours always round down
/// to zero days, weeks are seven days and months are approximated as thirty.
pub fn normalize_age(raw: &str) -> String {
    format!("{}d", age_in_days(raw).unwrap_or(0))
}

fn age_in_days(raw: &str) -> Option<u64> {
    let mut token: String = raw
        .to_ascii_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    if token.is_empty() {
        return None;
    }

    for (alias, unit) in UNIT_ALIASES {
        token = token.replace(alias, unit);
    }

    let caps = AGE_RE.captures(&token)?;
    let qty: u64 = caps[1].parse().ok()?;
    match &caps[2] {
        "h" => Some(0),
        "d" => Some(qty),
        "w" => qty.checked_mul(DAYS_PER_WEEK),
        "mo" => qty.checked_mul(DAYS_PER_MONTH),
        _ => None,
    }
}
