use std::sync::LazyLock;

use regex::Regex;

/// "PhD" as a standalone word, with or without the dot.
static PHD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bph\.?d\b").expect("phd pattern compiles"));

const GRADUATE_CAP: &str = "🎓";

/// One job listing row extracted from the source document.
///
/// Identified by `url`: two postings with the same url are the same listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    pub company: String,
    pub title: String,
    /// First hyperlink of the apply cell. `None` makes the posting untrackable.
    pub url: Option<String>,
    pub location: String,
    /// Age token as displayed, e.g. "12d" or "1mo".
    pub age_raw: String,
    /// Canonical "<N>d" form of `age_raw`.
    pub age_days: String,
}

impl Posting {
    /// True when the title carries a degree-program marker (PhD roles, 🎓).
    pub fn is_disqualified(&self) -> bool {
        self.title.contains(GRADUATE_CAP) || PHD.is_match(&self.title)
    }

    /// Plain-text message announcing this posting on the notification channel.
    pub fn notification_text(&self, region_label: &str) -> String {
        format!(
            "{region_label} job added: {} | {} | {} | Age={} | Location={}",
            self.title,
            self.company,
            self.url.as_deref().unwrap_or_default(),
            self.age_raw,
            self.location,
        )
    }
}

/// Truncate to at most `max` characters without splitting a code point.
pub(crate) fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
