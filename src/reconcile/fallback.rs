//! Static fallback addresses

use crate::config::DEFAULT_FALLBACK_ADDRESSES;
use crate::geocoding::{PlaceSuggestion, MAX_SUGGESTIONS};
use unicode_normalization::UnicodeNormalization;

/// Local list shown when live search has nothing to offer
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackList {
    entries: Vec<String>,
}

impl Default for FallbackList {
    fn default() -> Self {
        Self::new(DEFAULT_FALLBACK_ADDRESSES.iter().map(|s| s.to_string()))
    }
}

impl FallbackList {
    pub fn new<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            entries: entries
                .into_iter()
                .filter(|e| !e.trim().is_empty())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries containing `query` (case-insensitive), first five in list order.
    /// A blank query matches nothing.
    pub fn matching(&self, query: &str) -> Vec<PlaceSuggestion> {
        let needle = fold(query.trim());
        if needle.is_empty() || self.is_empty() {
            return Vec::new();
        }

        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| fold(entry).contains(&needle))
            .take(MAX_SUGGESTIONS)
            .map(|(idx, entry)| PlaceSuggestion::new(format!("fallback:{}", idx), entry.clone()))
            .collect()
    }
}

/// Compatibility-normalize then lowercase, so "ＭＡＩＮ" finds "Main".
fn fold(text: &str) -> String {
    text.nfkc().collect::<String>().to_lowercase()
}
