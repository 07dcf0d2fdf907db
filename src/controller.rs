//! Autocomplete controller
//!
//! Owns the input value of one address field. Every edit is reported through
//! `on_change`, starts a reconciler session and dispatches a debounced live
//! search; picking a suggestion is reported through `on_select`. Views are
//! pushed to the listener whenever the visible list changes.

use crate::config::ProviderConfig;
use crate::dispatch::{Debouncer, DispatchError};
use crate::geocoding::{PlaceSuggestion, ProviderKind, ProviderRouter, SearchOutcome};
use crate::reconcile::{FallbackList, Reconciler, Resolution, SuggestionView};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

pub const DEFAULT_PLACEHOLDER: &str = "Enter address";

/// Callbacks a host screen receives from the controller.
///
/// Calls may come from a runtime worker thread. None happen after
/// [`AutocompleteController::unmount`] returns.
pub trait AutocompleteListener: Send + Sync {
    /// Raw text after every edit
    fn on_change(&self, _text: &str) {}
    /// Label of the suggestion the user picked
    fn on_select(&self, _label: &str) {}
    /// The suggestion list changed
    fn on_suggestions(&self, _view: &SuggestionView) {}
}

/// Initial host-provided properties
#[derive(Debug, Clone, Default)]
pub struct ControllerProps {
    pub value: String,
    pub placeholder: Option<String>,
}

/// Cancelled once the control is torn down
#[derive(Clone)]
struct LivenessToken {
    rx: watch::Receiver<bool>,
}

impl LivenessToken {
    fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow() {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

pub struct AutocompleteController {
    value: String,
    placeholder: String,
    provider: ProviderKind,
    dispatcher: Debouncer<String, Vec<PlaceSuggestion>>,
    state: Arc<Mutex<Reconciler>>,
    listener: Arc<dyn AutocompleteListener>,
    shutdown: watch::Sender<bool>,
    /// Bumped each time a dispatched search has been resolved
    resolved: Arc<watch::Sender<u64>>,
}

impl AutocompleteController {
    pub fn new(
        router: ProviderRouter,
        config: &ProviderConfig,
        props: ControllerProps,
        listener: Arc<dyn AutocompleteListener>,
    ) -> Self {
        let provider = router.provider();
        let fallback = FallbackList::new(config.fallback_addresses.iter().cloned());
        debug!("Autocomplete via {} with {} fallback addresses", provider, fallback.len());

        let dispatcher = Debouncer::new(config.debounce_window(), move |query: String| {
            let router = router.clone();
            async move { router.try_search(&query).await }
        });

        let (shutdown, _) = watch::channel(false);
        let (resolved, _) = watch::channel(0);

        Self {
            value: props.value,
            placeholder: props
                .placeholder
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_PLACEHOLDER.to_string()),
            provider,
            dispatcher,
            state: Arc::new(Mutex::new(Reconciler::new(provider, fallback))),
            listener,
            shutdown,
            resolved: Arc::new(resolved),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    pub fn is_unmounted(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Current suggestion list
    pub fn view(&self) -> SuggestionView {
        lock(&self.state).view()
    }

    /// The user edited the text. Must be called within a tokio runtime.
    pub fn input(&mut self, text: &str) {
        if self.is_unmounted() {
            return;
        }

        self.value = text.to_string();
        self.listener.on_change(text);

        let query = {
            let mut state = lock(&self.state);
            let query = state.begin(text);
            self.listener.on_suggestions(&state.view());
            query
        };

        match query {
            Some(query) => self.dispatch(query),
            None => self.dispatcher.cancel(),
        }
    }

    /// The user picked suggestion `index` of the current view.
    ///
    /// The list is hidden and no search runs for the new value.
    pub fn select(&mut self, index: usize) -> Option<String> {
        if self.is_unmounted() {
            return None;
        }

        let label = {
            let mut state = lock(&self.state);
            let label = state.view().items.get(index)?.label.clone();
            state.dismiss(&label);
            self.listener.on_suggestions(&state.view());
            label
        };

        self.dispatcher.cancel();
        self.value = label.clone();
        info!("Selected address: {}", label);
        self.listener.on_select(&label);
        Some(label)
    }

    /// Host-driven value change: no callbacks, no search.
    pub fn set_value(&mut self, value: &str) {
        if self.is_unmounted() {
            return;
        }
        self.value = value.to_string();
        lock(&self.state).dismiss(value);
        self.dispatcher.cancel();
    }

    /// Wait up to `limit` for the pending search to resolve.
    ///
    /// Returns `false` if the list was still loading when the limit ran out,
    /// or if the control has been unmounted.
    pub async fn settle(&self, limit: Duration) -> bool {
        let mut updates = self.resolved.subscribe();
        let settled = async {
            loop {
                if self.is_unmounted() {
                    return false;
                }
                if !self.view().loading {
                    return true;
                }
                if updates.changed().await.is_err() {
                    return false;
                }
            }
        };
        tokio::time::timeout(limit, settled).await.unwrap_or(false)
    }

    /// Tear the control down. In-flight searches finish in the background but
    /// nothing they return is applied or reported.
    pub fn unmount(&mut self) {
        {
            // Taken so that no task is midway through publishing a view.
            let _state = lock(&self.state);
            self.shutdown.send_replace(true);
        }
        self.dispatcher.cancel();
        debug!("Autocomplete control unmounted");
    }

    fn dispatch(&self, query: String) {
        let pending = self.dispatcher.call(query.clone());
        let state = Arc::clone(&self.state);
        let listener = Arc::clone(&self.listener);
        let resolved = Arc::clone(&self.resolved);
        let liveness = LivenessToken {
            rx: self.shutdown.subscribe(),
        };

        tokio::spawn(async move {
            let result = tokio::select! {
                _ = liveness.cancelled() => return,
                result = pending => result,
            };

            let outcome = match result {
                Ok(places) => SearchOutcome::Live(places),
                Err(DispatchError::Superseded) => return,
                Err(DispatchError::Search(err)) => SearchOutcome::Failed(err),
            };

            let mut state = lock(&state);
            if liveness.is_cancelled() {
                return;
            }
            if state.resolve(&query, outcome) == Resolution::Applied {
                listener.on_suggestions(&state.view());
            }
            drop(state);
            resolved.send_modify(|n| *n += 1);
        });
    }
}

impl Drop for AutocompleteController {
    fn drop(&mut self) {
        if !self.is_unmounted() {
            self.unmount();
        }
    }
}

fn lock(state: &Mutex<Reconciler>) -> MutexGuard<'_, Reconciler> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
