//! Regional location matching.
//!
//! A location string is regional when any pattern in an ordered list of
//! case-insensitive regular expressions matches anywhere in it. The default
//! list covers New York City by full name, abbreviation and borough.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

/// Default patterns for the New York City metro area.
pub const NYC_PATTERNS: &[&str] = &[
    r"\bNYC\b",
    r"\bNY\b",
    r"\bNew York\b",
    r"\bNew York[, ]+NY\b",
    r"\bManhattan\b",
    r"\bBrooklyn\b",
    r"\bQueens\b",
    r"\bBronx\b",
    r"\bStaten Island\b",
];

static NYC: LazyLock<RegionMatcher> = LazyLock::new(|| {
    RegionMatcher::new(NYC_PATTERNS.iter().copied()).expect("default region patterns compile")
});

#[derive(Debug, Clone)]
pub struct RegionMatcher {
    patterns: Vec<Regex>,
}

impl RegionMatcher {
    /// Compile the given patterns, in order, as case-insensitive expressions.
    pub fn new<I, S>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| RegexBuilder::new(p.as_ref()).case_insensitive(true).build())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn nyc() -> Self {
        NYC.clone()
    }

    /// True iff any pattern matches somewhere in `location`.
    pub fn is_regional(&self, location: &str) -> bool {
        self.matching_pattern(location).is_some()
    }

    /// The first pattern (in list order) that matches, if any.
    pub fn matching_pattern(&self, location: &str) -> Option<&str> {
        if location.trim().is_empty() {
            return None;
        }
        self.patterns
            .iter()
            .find(|re| re.is_match(location))
            .map(Regex::as_str)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl Default for RegionMatcher {
    fn default() -> Self {
        Self::nyc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_names_abbreviations_and_boroughs() {
        let nyc = RegionMatcher::nyc();
        for loc in [
            "New York, NY",
            "NYC",
            "nyc",
            "Remote, New York",
            "Brooklyn",
            "Long Island City, Queens",
            "the bronx",
            "Staten Island, NY",
            "SF, CA, NY",
            "Manhattan, Kansas",
        ] {
            assert!(nyc.is_regional(loc), "expected match for {loc:?}");
        }
    }

    #[test]
    fn rejects_other_regions() {
        let nyc = RegionMatcher::nyc();
        for loc in ["Austin, TX", "San Francisco, CA", "Remote in USA", "Sunnyvale", "Albany"] {
            assert!(!nyc.is_regional(loc), "expected no match for {loc:?}");
        }
    }

    #[test]
    fn empty_location_is_never_regional() {
        let nyc = RegionMatcher::nyc();
        assert!(!nyc.is_regional(""));
        assert!(!nyc.is_regional("   "));
    }

    #[test]
    fn reports_first_matching_pattern_in_list_order() {
        let nyc = RegionMatcher::nyc();
        assert_eq!(nyc.matching_pattern("New York, NY"), Some(r"\bNY\b"));
        assert_eq!(nyc.matching_pattern("Brooklyn"), Some(r"\bBrooklyn\b"));
    }

    #[test]
    fn custom_patterns_and_invalid_pattern() {
        let austin = RegionMatcher::new([r"\bAustin\b"]).unwrap();
        assert!(austin.is_regional("austin, tx"));
        assert!(!austin.is_regional("New York"));
        assert!(RegionMatcher::new(["(unclosed"]).is_err());
    }
}
