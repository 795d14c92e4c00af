//! Per-type entity cache with coalesced, staleness-checked loads
//!
//! One [`EntityStore`] exists per entity type for the whole session. It is the
//! only writer of its own state; the router and view composer read snapshots
//! and call the load operations.
//!
//! Loads are coalesced: while a list load (or a detail load for the same id)
//! is in flight, further calls await the same shared future instead of
//! issuing another request. Each fetch runs on its own task that applies its
//! own result, so the result lands exactly once even if every caller is
//! dropped before it completes.
//!
//! Detail loads are staleness-checked against the most recently requested id:
//! a `load_one(i)` that completes after `load_one(j)` (or `select(j)`) was
//! requested does not touch `current`.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use conch_api::{ApiClient, FetchError, FetchResult};
use conch_core::prelude::*;
use conch_core::{Device, Entity, EntityKind, Problem, Rack, Relay};
use futures_util::future::{BoxFuture, FutureExt, Shared};

use crate::router::LoadRequest;

type ListFetch<T> = Arc<dyn Fn() -> BoxFuture<'static, FetchResult<Vec<T>>> + Send + Sync>;
type OneFetch<T> = Arc<dyn Fn(String) -> BoxFuture<'static, FetchResult<T>> + Send + Sync>;
type SharedLoad<T> = Shared<BoxFuture<'static, FetchResult<T>>>;

/// The most recent failed load of a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    /// `None` for a list load
    pub id: Option<String>,
    pub error: FetchError,
}

impl LoadFailure {
    pub fn is_not_found_for(&self, id: &str) -> bool {
        self.error.is_not_found() && self.id.as_deref() == Some(id)
    }
}

/// Read-only copy of a store's state.
#[derive(Debug, Clone)]
pub struct StoreSnapshot<T> {
    pub list: Vec<T>,
    pub current: Option<T>,
    /// Any fetch for this store is outstanding
    pub loading: bool,
    /// A list fetch is outstanding
    pub list_loading: bool,
    /// Ids with an outstanding detail fetch
    pub loading_ids: Vec<String>,
    /// The list has completed at least one load
    pub cached: bool,
    pub last_error: Option<LoadFailure>,
}

impl<T: Entity> StoreSnapshot<T> {
    /// `current`, only if it is the entity with this id.
    pub fn current_for(&self, id: &str) -> Option<&T> {
        self.current.as_ref().filter(|entity| entity.id() == id)
    }

    pub fn is_loading_one(&self, id: &str) -> bool {
        self.loading_ids.iter().any(|loading| loading == id)
    }
}

struct StoreState<T> {
    list: Vec<T>,
    current: Option<T>,
    cached: bool,
    last_error: Option<LoadFailure>,
    all_in_flight: Option<SharedLoad<Vec<T>>>,
    one_in_flight: HashMap<String, SharedLoad<T>>,
    /// Most recently requested detail id; results for any other id are stale
    wanted: Option<String>,
}

impl<T> Default for StoreState<T> {
    fn default() -> Self {
        Self {
            list: Vec::new(),
            current: None,
            cached: false,
            last_error: None,
            all_in_flight: None,
            one_in_flight: HashMap::new(),
            wanted: None,
        }
    }
}

/// Cache and loading state for one entity type.
pub struct EntityStore<T: Entity> {
    state: Arc<Mutex<StoreState<T>>>,
    fetch_all: ListFetch<T>,
    fetch_one: OneFetch<T>,
}

impl<T: Entity> Clone for EntityStore<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            fetch_all: Arc::clone(&self.fetch_all),
            fetch_one: Arc::clone(&self.fetch_one),
        }
    }
}

impl<T: Entity> fmt::Debug for EntityStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("EntityStore")
            .field("kind", &T::KIND)
            .field("len", &state.list.len())
            .field("current", &state.current.as_ref().map(|c| c.id().to_string()))
            .field("list_loading", &state.all_in_flight.is_some())
            .field("loading_ids", &state.one_in_flight.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<T: Entity> EntityStore<T> {
    /// Create an empty store from a list fetch and a detail fetch.
    pub fn new<FA, FAF, FO, FOF>(fetch_all: FA, fetch_one: FO) -> Self
    where
        FA: Fn() -> FAF + Send + Sync + 'static,
        FAF: Future<Output = FetchResult<Vec<T>>> + Send + 'static,
        FO: Fn(String) -> FOF + Send + Sync + 'static,
        FOF: Future<Output = FetchResult<T>> + Send + 'static,
    {
        Self {
            state: Arc::new(Mutex::new(StoreState::default())),
            fetch_all: Arc::new(move || fetch_all().boxed()),
            fetch_one: Arc::new(move |id| fetch_one(id).boxed()),
        }
    }

    /// Create a store backed by the inventory API's `/<resource>` endpoints.
    pub fn over_api(api: Arc<ApiClient>) -> Self {
        let list_api = Arc::clone(&api);
        Self::new(
            move || {
                let api = Arc::clone(&list_api);
                async move { api.list::<T>().await }
            },
            move |id: String| {
                let api = Arc::clone(&api);
                async move { api.get::<T>(&id).await }
            },
        )
    }

    fn lock(&self) -> MutexGuard<'_, StoreState<T>> {
        lock_state(&self.state)
    }

    pub fn kind(&self) -> EntityKind {
        T::KIND
    }

    pub fn snapshot(&self) -> StoreSnapshot<T> {
        let state = self.lock();
        let list_loading = state.all_in_flight.is_some();
        let loading_ids: Vec<String> = state.one_in_flight.keys().cloned().collect();
        StoreSnapshot {
            list: state.list.clone(),
            current: state.current.clone(),
            loading: list_loading || !loading_ids.is_empty(),
            list_loading,
            loading_ids,
            cached: state.cached,
            last_error: state.last_error.clone(),
        }
    }

    pub fn is_loading(&self) -> bool {
        let state = self.lock();
        state.all_in_flight.is_some() || !state.one_in_flight.is_empty()
    }

    pub fn is_cached(&self) -> bool {
        self.lock().cached
    }

    pub fn current_id(&self) -> Option<String> {
        self.lock().current.as_ref().map(|c| c.id().to_string())
    }

    /// Load the full list, joining a list load already in flight.
    ///
    /// On failure the previous list is kept and `LoadFailed` is returned.
    pub async fn load_all(&self) -> Result<Vec<T>> {
        let load = {
            let mut state = self.lock();
            match &state.all_in_flight {
                Some(load) => {
                    debug!("Joining in-flight {} list load", T::KIND);
                    load.clone()
                }
                None => {
                    // Spawned under the lock so the task cannot apply before
                    // the slot is filled
                    let weak = Arc::downgrade(&self.state);
                    let load = spawn_load((self.fetch_all)(), move |result| {
                        apply_list(&weak, result)
                    });
                    state.all_in_flight = Some(load.clone());
                    load
                }
            }
        };

        load.await.map_err(|e| e.into_error(T::KIND, None))
    }

    /// Load one entity into `current`, joining a load for the same id.
    ///
    /// The result is only applied if `id` is still the most recently
    /// requested one when it arrives; a stale success is returned to the
    /// caller but leaves `current` alone. On failure `current` is untouched.
    pub async fn load_one(&self, id: &str) -> Result<T> {
        let load = {
            let mut state = self.lock();
            state.wanted = Some(id.to_string());
            match state.one_in_flight.get(id) {
                Some(load) => {
                    debug!("Joining in-flight {} load for {}", T::KIND, id);
                    load.clone()
                }
                None => {
                    let weak = Arc::downgrade(&self.state);
                    let owned_id = id.to_string();
                    let load = spawn_load((self.fetch_one)(id.to_string()), move |result| {
                        apply_one(&weak, &owned_id, result)
                    });
                    state.one_in_flight.insert(id.to_string(), load.clone());
                    load
                }
            }
        };

        load.await.map_err(|e| e.into_error(T::KIND, Some(id)))
    }

    /// Set `current` from the cached list without a network call.
    pub fn select(&self, id: &str) -> Result<T> {
        let mut state = self.lock();
        let found = state.list.iter().find(|entity| entity.id() == id).cloned();
        match found {
            Some(entity) => {
                state.wanted = Some(id.to_string());
                state.current = Some(entity.clone());
                Ok(entity)
            }
            None => Err(Error::not_found(T::KIND.resource(), id)),
        }
    }
}

/// Run `fetch` on its own task and hand back a joinable handle to it.
///
/// The task applies the result itself, so dropping every caller does not
/// strand the store in a loading state. A panicking fetch is reported as a
/// network failure.
fn spawn_load<R, F>(fetch: BoxFuture<'static, FetchResult<R>>, apply: F) -> SharedLoad<R>
where
    R: Clone + Send + Sync + 'static,
    F: FnOnce(&FetchResult<R>) + Send + 'static,
{
    let handle = tokio::spawn(async move {
        let result = AssertUnwindSafe(fetch)
            .catch_unwind()
            .await
            .unwrap_or_else(|_| Err(FetchError::Network("fetch task panicked".to_string())));
        apply(&result);
        result
    });

    handle
        .map(|joined| {
            joined.unwrap_or_else(|e| Err(FetchError::Network(format!("fetch task ended: {}", e))))
        })
        .boxed()
        .shared()
}

fn lock_state<T>(state: &Mutex<StoreState<T>>) -> MutexGuard<'_, StoreState<T>> {
    // A panic while holding the lock cannot leave the plain data inconsistent
    state.lock().unwrap_or_else(|e| e.into_inner())
}

fn apply_list<T: Entity>(state: &Weak<Mutex<StoreState<T>>>, result: &FetchResult<Vec<T>>) {
    let Some(state) = state.upgrade() else {
        return;
    };
    let mut state = lock_state(&state);
    state.all_in_flight = None;
    match result {
        Ok(items) => {
            debug!("Loaded {} {}", items.len(), T::KIND.collection());
            state.list = items.clone();
            state.cached = true;
            if state.last_error.as_ref().is_some_and(|e| e.id.is_none()) {
                state.last_error = None;
            }
        }
        Err(e) => {
            warn!("Failed to load {}: {}", T::KIND.collection(), e);
            state.last_error = Some(LoadFailure {
                id: None,
                error: e.clone(),
            });
        }
    }
}

fn apply_one<T: Entity>(state: &Weak<Mutex<StoreState<T>>>, id: &str, result: &FetchResult<T>) {
    let Some(state) = state.upgrade() else {
        return;
    };
    let mut state = lock_state(&state);
    state.one_in_flight.remove(id);

    if state.wanted.as_deref() != Some(id) {
        debug!(
            "Discarding stale {} result for {} (wanted {:?})",
            T::KIND,
            id,
            state.wanted
        );
        return;
    }

    match result {
        Ok(entity) => {
            state.current = Some(entity.clone());
            if state.last_error.as_ref().is_some_and(|e| e.id.is_some()) {
                state.last_error = None;
            }
        }
        Err(e) => {
            warn!("Failed to load {} {}: {}", T::KIND, id, e);
            state.last_error = Some(LoadFailure {
                id: Some(id.to_string()),
                error: e.clone(),
            });
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Store set
// ─────────────────────────────────────────────────────────────────────────────

/// One store per entity type, owned by the application context.
#[derive(Debug, Clone)]
pub struct Stores {
    pub racks: EntityStore<Rack>,
    pub devices: EntityStore<Device>,
    pub relays: EntityStore<Relay>,
    pub problems: EntityStore<Problem>,
}

impl Stores {
    pub fn over_api(api: &Arc<ApiClient>) -> Self {
        Self {
            racks: EntityStore::over_api(Arc::clone(api)),
            devices: EntityStore::over_api(Arc::clone(api)),
            relays: EntityStore::over_api(Arc::clone(api)),
            problems: EntityStore::over_api(Arc::clone(api)),
        }
    }

    /// Try to satisfy a route load from cached data. Returns `false` when
    /// the load still has to run.
    ///
    /// A cached list satisfies a list load. A detail load is satisfied when
    /// `current` already is the requested entity, or by calling `select`
    /// against the cached list, which makes that entity `current`.
    pub fn satisfy_from_cache(&self, request: &LoadRequest) -> bool {
        match request {
            LoadRequest::All(kind) => self.is_cached(*kind),
            LoadRequest::One(kind, id) => match kind {
                EntityKind::Rack => select_cached(&self.racks, id),
                EntityKind::Device => select_cached(&self.devices, id),
                EntityKind::Relay => select_cached(&self.relays, id),
                EntityKind::Problem => select_cached(&self.problems, id),
            },
        }
    }

    fn is_cached(&self, kind: EntityKind) -> bool {
        match kind {
            EntityKind::Rack => self.racks.is_cached(),
            EntityKind::Device => self.devices.is_cached(),
            EntityKind::Relay => self.relays.is_cached(),
            EntityKind::Problem => self.problems.is_cached(),
        }
    }

    /// Run one route load against the matching store.
    pub async fn load(&self, request: &LoadRequest) -> Result<()> {
        match request {
            LoadRequest::All(kind) => match kind {
                EntityKind::Rack => self.racks.load_all().await.map(|_| ()),
                EntityKind::Device => self.devices.load_all().await.map(|_| ()),
                EntityKind::Relay => self.relays.load_all().await.map(|_| ()),
                EntityKind::Problem => self.problems.load_all().await.map(|_| ()),
            },
            LoadRequest::One(kind, id) => match kind {
                EntityKind::Rack => self.racks.load_one(id).await.map(|_| ()),
                EntityKind::Device => self.devices.load_one(id).await.map(|_| ()),
                EntityKind::Relay => self.relays.load_one(id).await.map(|_| ()),
                EntityKind::Problem => self.problems.load_one(id).await.map(|_| ()),
            },
        }
    }
}

fn select_cached<T: Entity>(store: &EntityStore<T>, id: &str) -> bool {
    store.current_id().as_deref() == Some(id) || store.select(id).is_ok()
}
