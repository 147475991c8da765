//! Consumer-held state for the search box and the forecast view.
//!
//! Both follow "last dispatched wins": every request is tagged with a
//! sequence number and its result is applied only if no newer request was
//! dispatched in the meantime.

use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::{
    config::Config,
    error::FetchError,
    forecast::ForecastAdapter,
    model::{ForecastBundle, LocationCandidate},
    resolver::{LocationResolver, is_searchable},
};

/// State with a "request in flight" flag tied to a sequence number.
trait Pending {
    fn finish(&mut self, seq: u64);
}

/// Clears the loading flag of request `seq` when dropped, so a cancelled
/// future does not leave the state stuck in loading.
struct LoadingGuard<'a, S: Pending> {
    state: &'a Mutex<S>,
    seq: u64,
}

impl<'a, S: Pending> LoadingGuard<'a, S> {
    fn new(state: &'a Mutex<S>, seq: u64) -> Self {
        Self { state, seq }
    }
}

impl<S: Pending> Drop for LoadingGuard<'_, S> {
    fn drop(&mut self) {
        self.state.lock().finish(self.seq);
    }
}

/// Handle for one dispatched search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    seq: u64,
    query: String,
}

impl SearchTicket {
    pub fn query(&self) -> &str {
        &self.query
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Results replaced the displayed list; holds the candidate count.
    Applied(usize),
    /// A newer search was dispatched during the debounce interval; nothing was sent.
    Superseded,
    /// The response arrived after a newer search was dispatched and was dropped.
    Stale,
}

#[derive(Debug, Default)]
struct SearchState {
    latest: u64,
    query: String,
    results: Vec<LocationCandidate>,
    loading: bool,
}

impl Pending for SearchState {
    fn finish(&mut self, seq: u64) {
        // A newer search keeps the flag set.
        if self.latest == seq {
            self.loading = false;
        }
    }
}

/// Search box state: the current query and the candidates on display.
#[derive(Debug)]
pub struct SearchSession {
    resolver: LocationResolver,
    debounce: Duration,
    state: Mutex<SearchState>,
}

impl SearchSession {
    pub fn new(resolver: LocationResolver, debounce: Duration) -> Self {
        Self {
            resolver,
            debounce,
            state: Mutex::new(SearchState::default()),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        Ok(Self::new(LocationResolver::from_config(config)?, config.search_debounce()))
    }

    /// Record a new query and, if it is long enough, make it the latest search.
    ///
    /// Short queries return `None` and leave any in-flight search current.
    pub fn dispatch(&self, query: &str) -> Option<SearchTicket> {
        let mut state = self.state.lock();
        state.query = query.to_string();

        if !is_searchable(query) {
            return None;
        }

        state.latest += 1;
        state.loading = true;
        Some(SearchTicket {
            seq: state.latest,
            query: query.to_string(),
        })
    }

    /// Run a dispatched search and apply its results if it is still the latest.
    ///
    /// Dropping the returned future before it completes is allowed.
    pub async fn resolve(&self, ticket: SearchTicket) -> SearchOutcome {
        // Declared before any lock guard below so it drops after them.
        let _loading = LoadingGuard::new(&self.state, ticket.seq);

        if !self.debounce.is_zero() {
            tokio::time::sleep(self.debounce).await;
        }
        if !self.is_latest(&ticket) {
            debug!(query = %ticket.query, "Search superseded before sending");
            return SearchOutcome::Superseded;
        }

        let candidates = self.resolver.search(&ticket.query).await;

        let mut state = self.state.lock();
        if state.latest != ticket.seq {
            debug!(query = %ticket.query, "Dropping stale search results");
            return SearchOutcome::Stale;
        }

        let count = candidates.len();
        state.results = candidates;
        SearchOutcome::Applied(count)
    }

    /// Dispatch and resolve in one go. `None` for queries too short to send.
    pub async fn search(&self, query: &str) -> Option<SearchOutcome> {
        let ticket = self.dispatch(query)?;
        Some(self.resolve(ticket).await)
    }

    pub fn results(&self) -> Vec<LocationCandidate> {
        self.state.lock().results.clone()
    }

    pub fn query(&self) -> String {
        self.state.lock().query.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().loading
    }

    /// Reset after a selection. In-flight searches become stale.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.latest += 1;
        state.query.clear();
        state.results.clear();
        state.loading = false;
    }

    fn is_latest(&self, ticket: &SearchTicket) -> bool {
        self.state.lock().latest == ticket.seq
    }
}

#[derive(Debug)]
pub enum ForecastOutcome {
    /// The new bundle replaced the previous one.
    Updated,
    /// The fetch failed; the previous bundle, if any, is still shown.
    Failed(FetchError),
    /// Another location was selected while this fetch was running.
    Stale,
}

#[derive(Debug, Default)]
struct ViewState {
    latest: u64,
    selected: Option<LocationCandidate>,
    // The bundle on display and the location it was fetched for.
    shown: Option<(LocationCandidate, ForecastBundle)>,
    loading: bool,
}

impl Pending for ViewState {
    fn finish(&mut self, seq: u64) {
        if self.latest == seq {
            self.loading = false;
        }
    }
}

/// The selected location and the forecast shown for it.
#[derive(Debug)]
pub struct ForecastView {
    adapter: ForecastAdapter,
    state: Mutex<ViewState>,
}

impl ForecastView {
    pub fn new(adapter: ForecastAdapter) -> Self {
        Self {
            adapter,
            state: Mutex::new(ViewState::default()),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        Ok(Self::new(ForecastAdapter::from_config(config)?))
    }

    /// Select a location and load its forecast.
    ///
    /// A bundle is only ever replaced whole. On failure the old one stays.
    /// Dropping the returned future leaves the previous bundle in place.
    pub async fn select(&self, location: LocationCandidate) -> ForecastOutcome {
        let coordinates = location.coordinates();
        let seq = {
            let mut state = self.state.lock();
            state.latest += 1;
            state.selected = Some(location.clone());
            state.loading = true;
            state.latest
        };
        let _loading = LoadingGuard::new(&self.state, seq);

        let result = self.adapter.fetch_forecast(coordinates).await;

        let mut state = self.state.lock();
        if state.latest != seq {
            debug!(?coordinates, "Dropping forecast for superseded selection");
            return ForecastOutcome::Stale;
        }

        match result {
            Ok(bundle) => {
                state.shown = Some((location, bundle));
                ForecastOutcome::Updated
            }
            Err(err) => {
                warn!(?coordinates, error = %err, "Forecast fetch failed");
                ForecastOutcome::Failed(err)
            }
        }
    }

    /// The most recently selected location, whether or not its fetch succeeded.
    pub fn location(&self) -> Option<LocationCandidate> {
        self.state.lock().selected.clone()
    }

    pub fn bundle(&self) -> Option<ForecastBundle> {
        self.state.lock().shown.as_ref().map(|(_, bundle)| bundle.clone())
    }

    /// Location the displayed bundle belongs to.
    pub fn bundle_location(&self) -> Option<LocationCandidate> {
        self.state.lock().shown.as_ref().map(|(location, _)| location.clone())
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().loading
    }
}
