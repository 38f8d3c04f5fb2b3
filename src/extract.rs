//! Availability decision for one row's status text.
//!
//! The target page renders either a disabled/informational label or an
//! actionable "Book" control in the same cell. Negative phrases are checked
//! first: the word "book" can appear incidentally inside longer
//! disabled-state sentences, so a negative match always wins.

/// Phrases that mark the booking calendar as not yet open.
pub const NO_CALENDAR_PHRASES: &[&str] = &[
    "booking calendar not yet available",
    "calendar not yet available",
    "not yet available",
];

/// Maximum characters to read from the page body when the structured row
/// cannot be located.
pub const BODY_FALLBACK_MAX_CHARS: usize = 5000;

/// Decides whether a row's status text means "bookable".
#[derive(Debug, Clone)]
pub struct StatusMatcher {
    negative_phrases: Vec<String>,
}

impl StatusMatcher {
    /// Matcher with the default negative-phrase set.
    pub fn new() -> Self {
        Self::with_extra_phrases(&[])
    }

    /// Matcher extended with operator-configured negative phrases.
    pub fn with_extra_phrases(extra: &[String]) -> Self {
        let mut negative_phrases: Vec<String> = NO_CALENDAR_PHRASES
            .iter()
            .map(|p| p.to_lowercase())
            .collect();
        negative_phrases.extend(extra.iter().map(|p| p.to_lowercase()));
        Self { negative_phrases }
    }

    /// True iff `raw` reads as bookable.
    ///
    /// Negative phrases win over the "book" token. Empty or whitespace-only
    /// input is never bookable.
    pub fn is_available(&self, raw: &str) -> bool {
        let text = raw.trim().to_lowercase();
        if text.is_empty() {
            return false;
        }
        if self.negative_phrases.iter().any(|p| text.contains(p)) {
            return false;
        }
        text.contains("book")
    }
}

impl Default for StatusMatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Truncate to at most `max` characters on a char boundary.
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
