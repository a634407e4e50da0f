//! Fetch orchestration per call site.
//!
//! A [`FetchSite`] stands for one logical consumer of the cache. Each
//! invocation carries a dependency fingerprint; the site
//!
//! - drops the invocation when a fetch for the same dependencies is already
//!   in flight,
//! - skips it when the store already satisfies the caller,
//! - otherwise runs the fetch and folds the result into the store.
//!
//! Changing dependencies or tearing the site down while a fetch is in flight
//! makes that fetch stale: when it resolves, its result is thrown away and
//! neither the store nor the site state is touched. There are no timeouts;
//! a fetch that never resolves leaves the site fetching until the caller
//! drops the invocation, which releases the site and cancels the token.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;

use dc_store::Store;

use crate::error::{AppError, AppResult};

/// The store as shared between sites on one thread.
pub type SharedStore = Rc<RefCell<Store>>;

pub fn shared_store(store: Store) -> SharedStore {
    Rc::new(RefCell::new(store))
}

/// Set when the fetch it was handed to has gone stale.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    cancelled: Rc<Cell<bool>>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }

    fn cancel(&self) {
        self.cancelled.set(true);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchState {
    Idle,
    Fetching,
}

/// How one invocation of a site ended.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The store already satisfied the request.
    Skipped,
    /// A fetch for the same dependencies was already in flight.
    Dropped,
    /// The response was folded into the store.
    Completed,
    /// The fetch failed; the store is unchanged.
    Failed(AppError),
    /// The fetch resolved after its dependencies changed or the site was torn
    /// down; the response was ignored.
    Discarded,
}

impl FetchOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, FetchOutcome::Completed)
    }

    /// True when the caller can read what it asked for from the store.
    pub fn is_ready(&self) -> bool {
        matches!(self, FetchOutcome::Completed | FetchOutcome::Skipped)
    }

    pub fn error(&self) -> Option<&AppError> {
        match self {
            FetchOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }

    pub fn into_result(self) -> AppResult<FetchOutcome> {
        match self {
            FetchOutcome::Failed(e) => Err(e),
            other => Ok(other),
        }
    }
}

#[derive(Debug, Default)]
struct SiteState {
    deps: Option<String>,
    generation: u64,
    /// Generation of the fetch currently in flight.
    in_flight: Option<u64>,
    cancel: Option<CancelToken>,
}

impl SiteState {
    fn invalidate(&mut self) {
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
        self.in_flight = None;
        self.generation += 1;
    }
}

/// Releases the site if an invocation is dropped while its fetch is pending.
struct InFlight<'a> {
    site: &'a FetchSite,
    generation: u64,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let Ok(mut state) = self.site.state.try_borrow_mut() else {
            return;
        };
        if state.in_flight == Some(self.generation) {
            tracing::debug!(site = %self.site.label, "in-flight fetch abandoned");
            state.in_flight = None;
            if let Some(token) = state.cancel.take() {
                token.cancel();
            }
        }
    }
}

/// One call site's view of the cache.
#[derive(Debug)]
pub struct FetchSite {
    label: String,
    store: SharedStore,
    state: RefCell<SiteState>,
}

impl FetchSite {
    pub fn new(label: impl Into<String>, store: SharedStore) -> Self {
        Self {
            label: label.into(),
            store,
            state: RefCell::new(SiteState::default()),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn state(&self) -> FetchState {
        if self.state.borrow().in_flight.is_some() {
            FetchState::Fetching
        } else {
            FetchState::Idle
        }
    }

    pub fn is_fetching(&self) -> bool {
        self.state() == FetchState::Fetching
    }

    /// Mark any in-flight fetch stale and forget the current dependencies.
    pub fn teardown(&self) {
        let mut state = self.state.borrow_mut();
        if state.in_flight.is_some() {
            tracing::debug!(site = %self.label, "teardown while fetching; result will be discarded");
        }
        state.invalidate();
        state.deps = None;
    }

    /// Run one invocation.
    ///
    /// `deps` identifies the request (see `dc_store::request_fingerprint`).
    /// `satisfied` is evaluated against the current store; `fetch` is only
    /// called when it returns false. `reduce` folds a successful result into
    /// the store.
    pub async fn run<T, S, F, Fut, R>(
        &self,
        deps: &str,
        satisfied: S,
        fetch: F,
        reduce: R,
    ) -> FetchOutcome
    where
        S: FnOnce(&Store) -> bool,
        F: FnOnce(CancelToken) -> Fut,
        Fut: Future<Output = AppResult<T>>,
        R: FnOnce(&mut Store, T),
    {
        let (generation, token) = {
            let mut state = self.state.borrow_mut();

            if state.deps.as_deref() != Some(deps) {
                if state.in_flight.is_some() {
                    tracing::debug!(site = %self.label, "dependencies changed; in-flight fetch is stale");
                }
                state.invalidate();
                state.deps = Some(deps.to_string());
            }

            if state.in_flight == Some(state.generation) {
                tracing::debug!(site = %self.label, "fetch already in flight; dropping invocation");
                return FetchOutcome::Dropped;
            }

            if satisfied(&*self.store.borrow()) {
                tracing::debug!(site = %self.label, "store satisfies request; skipping fetch");
                return FetchOutcome::Skipped;
            }

            let token = CancelToken::new();
            state.in_flight = Some(state.generation);
            state.cancel = Some(token.clone());
            (state.generation, token)
        };

        let guard = InFlight {
            site: self,
            generation,
        };
        let result = fetch(token).await;

        {
            let mut state = self.state.borrow_mut();
            if state.generation != generation || state.in_flight != Some(generation) {
                tracing::debug!(site = %self.label, "discarding stale response");
                return FetchOutcome::Discarded;
            }
            state.in_flight = None;
            state.cancel = None;
        }
        drop(guard);

        match result {
            Ok(value) => {
                reduce(&mut *self.store.borrow_mut(), value);
                tracing::info!(site = %self.label, "fetch completed");
                FetchOutcome::Completed
            }
            Err(e) => {
                tracing::debug!(site = %self.label, error = %e, "fetch failed");
                FetchOutcome::Failed(e)
            }
        }
    }
}
