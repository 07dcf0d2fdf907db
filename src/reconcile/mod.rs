//! Suggestion reconciliation
//!
//! Decides what the user sees for the current query: live provider results
//! when there are any, otherwise matches from the local fallback list. A
//! response only lands if it belongs to the query that is active now, so a
//! slow answer to an old query can never replace a newer one.

pub mod fallback;

#[cfg(test)]
mod property_tests;

pub use fallback::FallbackList;

use crate::geocoding::google::ATTRIBUTION_LOGO_URL;
use crate::geocoding::{PlaceSuggestion, ProviderKind, SearchOutcome, MAX_SUGGESTIONS};
use schemars::JsonSchema;
use serde::Serialize;
use tracing::debug;

/// Where a query session stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Empty input
    Idle,
    /// Live search outstanding
    Searching,
    /// Provider returned at least one suggestion
    ResolvedLive,
    /// Provider returned nothing or was skipped
    ResolvedEmpty,
    /// Provider failed; shown like `ResolvedEmpty`
    Failed,
    /// A suggestion was picked; list hidden until the next edit
    Dismissed,
}

/// Origin of the visible items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionSource {
    None,
    Live,
    Fallback,
}

/// Provider mark that must accompany the list
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct Attribution {
    pub provider: ProviderKind,
    pub text: String,
    pub logo_url: String,
}

impl Attribution {
    fn for_provider(provider: ProviderKind) -> Option<Self> {
        match provider {
            ProviderKind::Google => Some(Self {
                provider,
                text: "Powered by Google".to_string(),
                logo_url: ATTRIBUTION_LOGO_URL.to_string(),
            }),
            _ => None,
        }
    }
}

/// Everything a host needs to render the suggestion list
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct SuggestionView {
    pub query: String,
    pub phase: Phase,
    pub loading: bool,
    pub source: SuggestionSource,
    pub items: Vec<PlaceSuggestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribution: Option<Attribution>,
}

impl SuggestionView {
    pub fn labels(&self) -> Vec<&str> {
        self.items.iter().map(|s| s.label.as_str()).collect()
    }

    /// Whether the list panel has anything to show
    pub fn is_visible(&self) -> bool {
        self.loading || !self.items.is_empty()
    }
}

/// Whether a response was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Applied,
    Stale,
}

/// Per-input suggestion state
#[derive(Debug)]
pub struct Reconciler {
    provider: ProviderKind,
    fallback: FallbackList,
    query: String,
    phase: Phase,
    live: Vec<PlaceSuggestion>,
}

impl Reconciler {
    pub fn new(provider: ProviderKind, fallback: FallbackList) -> Self {
        Self {
            provider,
            fallback,
            query: String::new(),
            phase: Phase::Idle,
            live: Vec::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Start a session for `text`. Returns the trimmed query to search for,
    /// or `None` when the input is blank.
    pub fn begin(&mut self, text: &str) -> Option<String> {
        self.query = text.trim().to_string();
        self.live.clear();

        if self.query.is_empty() {
            self.phase = Phase::Idle;
            None
        } else {
            self.phase = Phase::Searching;
            Some(self.query.clone())
        }
    }

    /// Apply the outcome of a live search for `query`, unless a different
    /// query has become active (or the list was dismissed) in the meantime.
    pub fn resolve(&mut self, query: &str, outcome: SearchOutcome) -> Resolution {
        let accepting = !matches!(self.phase, Phase::Idle | Phase::Dismissed);
        if !accepting || query.trim() != self.query {
            debug!("Discarding stale results for {:?} (active {:?})", query, self.query);
            return Resolution::Stale;
        }

        match outcome {
            SearchOutcome::Live(places) if !places.is_empty() => {
                self.live = places.into_iter().take(MAX_SUGGESTIONS).collect();
                self.phase = Phase::ResolvedLive;
            }
            SearchOutcome::Live(_) | SearchOutcome::Skipped => {
                self.live.clear();
                self.phase = Phase::ResolvedEmpty;
            }
            SearchOutcome::Failed(err) => {
                // Already logged by the router; the user only sees fallbacks.
                debug!("Falling back after failed search for {:?}: {}", query, err);
                self.live.clear();
                self.phase = Phase::Failed;
            }
        }
        Resolution::Applied
    }

    /// Hide the list after a selection; `value` becomes the active text.
    pub fn dismiss(&mut self, value: &str) {
        self.query = value.trim().to_string();
        self.live.clear();
        self.phase = Phase::Dismissed;
    }

    pub fn view(&self) -> SuggestionView {
        let (items, loading) = match self.phase {
            Phase::Idle | Phase::Dismissed => (Vec::new(), false),
            Phase::Searching => (self.fallback.matching(&self.query), true),
            Phase::ResolvedLive => (self.live.clone(), false),
            Phase::ResolvedEmpty | Phase::Failed => (self.fallback.matching(&self.query), false),
        };

        let source = match (self.phase, items.is_empty()) {
            (_, true) => SuggestionSource::None,
            (Phase::ResolvedLive, false) => SuggestionSource::Live,
            (_, false) => SuggestionSource::Fallback,
        };

        let attribution = if !loading && !items.is_empty() {
            Attribution::for_provider(self.provider)
        } else {
            None
        };

        SuggestionView {
            query: self.query.clone(),
            phase: self.phase,
            loading,
            source,
            items,
            attribution,
        }
    }
}
