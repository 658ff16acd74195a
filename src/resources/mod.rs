//! Resource controllers
//!
//! A [`ResourceController`] owns one collection of remote resources and runs
//! the load/mutate lifecycle for it: fetch the list, apply a mutation, then
//! refresh exactly once. Resource-specific details (endpoints, notices,
//! validation) are supplied by a [`ResourceKind`].

pub mod agents;
pub mod reminders;

pub use agents::{AgentAction, AgentController, AgentFilter, Agents};
pub use reminders::{ReminderAction, ReminderController, ReminderFilter, Reminders};

use crate::error::{Error, Result};
use crate::gateway::{ApiError, ApiRequest, RequestGateway};
use crate::notifier::{Notice, Notifier};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Resource-specific behavior plugged into a [`ResourceController`]
pub trait ResourceKind: Send + Sync + 'static {
    type Item: DeserializeOwned + Clone + Send + Sync + 'static;
    type Filter: Clone + PartialEq + Default + fmt::Debug + Send + Sync + 'static;
    type Action: fmt::Debug + Send + Sync;

    /// Field of the list response that holds the items
    const LIST_FIELD: &'static str;

    /// Notice shown when a load fails
    const LOAD_FAILED: &'static str;

    fn list_request(filter: &Self::Filter) -> ApiRequest;

    /// Validate `action` and build its request
    fn action_request(action: &Self::Action) -> Result<ApiRequest>;

    /// Identifies an action for duplicate-submission checks
    fn action_key(action: &Self::Action) -> String;

    fn success_notice(action: &Self::Action, response: &Value) -> Notice;

    fn failure_notice(action: &Self::Action, error: &Error) -> Notice;
}

/// How overlapping loads are reconciled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadOrdering {
    /// Only the most recently issued load may update the collection
    #[default]
    LatestIssued,
    /// Whichever load completes last wins
    LastCompletion,
}

/// A list of remote items plus its load state
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<T> {
    pub items: Vec<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            error: None,
        }
    }
}

struct State<K: ResourceKind> {
    collection: Collection<K::Item>,
    filter: K::Filter,
    generation: u64,
    pending_loads: usize,
    in_flight: HashSet<String>,
}

struct Inner<K: ResourceKind> {
    gateway: RequestGateway,
    notifier: Arc<dyn Notifier>,
    ordering: LoadOrdering,
    state: Mutex<State<K>>,
}

impl<K: ResourceKind> Inner<K> {
    fn lock(&self) -> MutexGuard<'_, State<K>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears the loading flag when a load ends, however it ends
struct LoadingGuard<'a, K: ResourceKind> {
    inner: &'a Inner<K>,
}

impl<K: ResourceKind> Drop for LoadingGuard<'_, K> {
    fn drop(&mut self) {
        let mut state = self.inner.lock();
        state.pending_loads = state.pending_loads.saturating_sub(1);
        state.collection.loading = state.pending_loads > 0;
    }
}

/// Releases an action's in-flight key
struct InFlightGuard<'a, K: ResourceKind> {
    inner: &'a Inner<K>,
    key: String,
}

impl<K: ResourceKind> Drop for InFlightGuard<'_, K> {
    fn drop(&mut self) {
        self.inner.lock().in_flight.remove(&self.key);
    }
}

/// Load/mutate orchestration for one resource collection
pub struct ResourceController<K: ResourceKind> {
    inner: Arc<Inner<K>>,
}

impl<K: ResourceKind> Clone for ResourceController<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: ResourceKind> ResourceController<K> {
    pub fn new(gateway: RequestGateway, notifier: Arc<dyn Notifier>) -> Self {
        Self::with_ordering(gateway, notifier, LoadOrdering::default())
    }

    pub fn with_ordering(
        gateway: RequestGateway,
        notifier: Arc<dyn Notifier>,
        ordering: LoadOrdering,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                gateway,
                notifier,
                ordering,
                state: Mutex::new(State {
                    collection: Collection::default(),
                    filter: K::Filter::default(),
                    generation: 0,
                    pending_loads: 0,
                    in_flight: HashSet::new(),
                }),
            }),
        }
    }

    pub fn ordering(&self) -> LoadOrdering {
        self.inner.ordering
    }

    pub(crate) fn gateway(&self) -> &RequestGateway {
        &self.inner.gateway
    }

    /// Snapshot of the collection
    pub fn collection(&self) -> Collection<K::Item> {
        self.inner.lock().collection.clone()
    }

    pub fn items(&self) -> Vec<K::Item> {
        self.inner.lock().collection.items.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.lock().collection.loading
    }

    pub fn error(&self) -> Option<String> {
        self.inner.lock().collection.error.clone()
    }

    /// Active filter
    pub fn filter(&self) -> K::Filter {
        self.inner.lock().filter.clone()
    }

    /// Make `filter` active and fetch the list
    pub async fn load(&self, filter: K::Filter) -> Result<()> {
        self.inner.lock().filter = filter;
        self.reload().await
    }

    /// Fetch the list with the active filter
    ///
    /// On failure the items are kept, the error is recorded and a notice is
    /// emitted.
    pub async fn reload(&self) -> Result<()> {
        let (request, generation) = {
            let mut state = self.inner.lock();
            state.generation += 1;
            state.pending_loads += 1;
            state.collection.loading = true;
            (K::list_request(&state.filter), state.generation)
        };
        let _loading = LoadingGuard { inner: &*self.inner };

        let result = self
            .inner
            .gateway
            .send_value(request)
            .await
            .and_then(|body| decode_items::<K>(body));

        let mut state = self.inner.lock();
        if self.inner.ordering == LoadOrdering::LatestIssued && generation != state.generation {
            tracing::debug!(
                "Discarding superseded {} response (generation {} < {})",
                K::LIST_FIELD,
                generation,
                state.generation
            );
            return Ok(());
        }

        match result {
            Ok(items) => {
                tracing::debug!("Loaded {} {}", items.len(), K::LIST_FIELD);
                state.collection.items = items;
                state.collection.error = None;
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Failed to load {}: {}", K::LIST_FIELD, e);
                state.collection.error = Some(e.message().to_string());
                drop(state);
                self.inner.notifier.notify(Notice::error(K::LOAD_FAILED));
                Err(e.into())
            }
        }
    }

    /// Change the active filter, reloading if it differs
    pub async fn set_filter(&self, filter: K::Filter) -> Result<()> {
        {
            let mut state = self.inner.lock();
            if state.filter == filter {
                return Ok(());
            }
            state.filter = filter;
        }
        self.reload().await
    }

    /// Apply `action` remotely, then refresh the list once
    ///
    /// Returns the mutation's response body. A second submission of an
    /// action that is still in flight fails with [`Error::InFlight`].
    pub async fn mutate(&self, action: K::Action) -> Result<Value> {
        let key = K::action_key(&action);
        {
            let mut state = self.inner.lock();
            if !state.in_flight.insert(key.clone()) {
                tracing::debug!("Ignoring duplicate submission of {}", key);
                return Err(Error::InFlight(key));
            }
        }
        let in_flight = InFlightGuard {
            inner: &*self.inner,
            key,
        };

        let result = match K::action_request(&action) {
            Ok(request) => self.inner.gateway.send_value(request).await.map_err(Error::from),
            Err(e) => Err(e),
        };
        drop(in_flight);

        match result {
            Ok(response) => {
                tracing::info!("{:?} succeeded", action);
                self.inner
                    .notifier
                    .notify(K::success_notice(&action, &response));
                // Failure is already recorded on the collection and notified
                let _ = self.reload().await;
                Ok(response)
            }
            Err(e) => {
                tracing::warn!("{:?} failed: {}", action, e);
                self.inner.notifier.notify(K::failure_notice(&action, &e));
                Err(e)
            }
        }
    }
}

fn decode_items<K: ResourceKind>(body: Value) -> std::result::Result<Vec<K::Item>, ApiError> {
    match body.get(K::LIST_FIELD) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(items) => serde_json::from_value(items.clone()).map_err(|e| {
            ApiError::new(None, format!("invalid response body: {}", e), Some(body.clone()))
        }),
    }
}
