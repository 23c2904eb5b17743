//! View-state persistence: storage seam, wire schema, and the debounced
//! save adapter.
//!
//! A [`StateStore`] round-trips the serializable subset of a table's state
//! to a named slot. What sits behind it (memory, a JSON file, an embedded
//! database) is irrelevant to the engine; [`Persistence`] only requires the
//! two async functions.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::future::BoxFuture;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::column::Row;
use crate::debounce::Debouncer;
use crate::filter::RangeFilter;
use crate::sort::ViewSort;
use crate::table::TableView;

/// Debounce window between a state change and the save reaching the store.
pub const SAVE_DEBOUNCE: Duration = Duration::from_millis(300);

/// Error type for store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("store backend error: {0}")]
    Backend(String),
}

/// The wire/storage form of a table's view state.
///
/// Only fields present in a loaded state overwrite engine defaults; filter
/// sets travel as arrays for serializability and are rehydrated on load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SerializedTableState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<ViewSort>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<HashMap<String, Vec<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_filters: Option<HashMap<String, RangeFilter>>,
}

/// Storage seam for table view state.
///
/// `load` is called once when a table mounts; `save` receives the full
/// current state on every (debounced) change, so a lost write is repaired
/// by the next one.
pub trait StateStore: Send + Sync {
    /// Load the saved state for a table, `None` when nothing was saved.
    fn load<'a>(
        &'a self,
        table: &'a str,
    ) -> BoxFuture<'a, Result<Option<SerializedTableState>, StoreError>>;

    /// Persist the full state for a table.
    fn save<'a>(
        &'a self,
        table: &'a str,
        state: SerializedTableState,
    ) -> BoxFuture<'a, Result<(), StoreError>>;
}

// =============================================================================
// Reference stores
// =============================================================================

/// In-process store, mainly for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, SerializedTableState>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn load<'a>(
        &'a self,
        table: &'a str,
    ) -> BoxFuture<'a, Result<Option<SerializedTableState>, StoreError>> {
        Box::pin(async move { Ok(self.entries.read().await.get(table).cloned()) })
    }

    fn save<'a>(
        &'a self,
        table: &'a str,
        state: SerializedTableState,
    ) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            self.entries.write().await.insert(table.to_string(), state);
            Ok(())
        })
    }
}

/// One JSON file per table under a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Create a store rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{table}.json"))
    }
}

impl StateStore for JsonFileStore {
    fn load<'a>(
        &'a self,
        table: &'a str,
    ) -> BoxFuture<'a, Result<Option<SerializedTableState>, StoreError>> {
        Box::pin(async move {
            let path = self.path_for(table);
            match tokio::fs::read(&path).await {
                Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }

    fn save<'a>(
        &'a self,
        table: &'a str,
        state: SerializedTableState,
    ) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            tokio::fs::create_dir_all(&self.dir).await?;
            let bytes = serde_json::to_vec_pretty(&state)?;
            tokio::fs::write(self.path_for(table), bytes).await?;
            Ok(())
        })
    }
}

// =============================================================================
// Serialization on the view
// =============================================================================

impl<T: Row> TableView<T> {
    /// Snapshot the serializable subset of the view state.
    pub fn serialize_state(&self) -> SerializedTableState {
        self.with_inner_mut(|access| {
            let (search, page, page_size, sort, filters) = access.snapshot();
            let selected = filters
                .selected
                .iter()
                .map(|(k, set)| {
                    let mut values: Vec<String> = set.iter().cloned().collect();
                    values.sort();
                    (k.clone(), values)
                })
                .collect();
            SerializedTableState {
                search: Some(search),
                page: Some(page),
                page_size: Some(page_size),
                sort: Some(sort),
                filters: Some(selected),
                range_filters: Some(filters.ranges.clone()),
            }
        })
        .unwrap_or_default()
    }

    /// Overlay a loaded state onto the view. Absent fields keep their
    /// defaults; discrete columns without a persisted entry stay fully
    /// selected.
    pub fn apply_state(&self, state: SerializedTableState) {
        self.with_inner_mut(|access| {
            let selected = state.filters.map(|filters| {
                filters
                    .into_iter()
                    .map(|(k, values)| (k, values.into_iter().collect::<HashSet<String>>()))
                    .collect()
            });
            access.apply(
                state.search,
                state.page,
                state.page_size,
                state.sort,
                selected,
                state.range_filters,
            );
        });
        self.mark_dirty();
    }
}

// =============================================================================
// Persistence adapter
// =============================================================================

/// Binds a [`TableView`] to a [`StateStore`]: loads once on attach, then
/// saves the full state 300 ms after each change burst.
///
/// Dropping (or [`detach`](Persistence::detach)ing) the adapter cancels any
/// pending save and discards a still-in-flight load, so a torn-down table is
/// never mutated late.
pub struct Persistence {
    alive: Arc<AtomicBool>,
    debouncer: Arc<Debouncer>,
    unbind: Box<dyn Fn() + Send + Sync>,
}

impl Persistence {
    /// Attach with the default 300 ms save debounce.
    pub fn attach<T: Row>(table: &TableView<T>, store: Arc<dyn StateStore>) -> Self {
        Self::attach_with(table, store, SAVE_DEBOUNCE)
    }

    /// Attach with a custom save debounce window.
    pub fn attach_with<T: Row>(
        table: &TableView<T>,
        store: Arc<dyn StateStore>,
        save_debounce: Duration,
    ) -> Self {
        let alive = Arc::new(AtomicBool::new(true));
        let debouncer = Arc::new(Debouncer::new(save_debounce));

        // One-time load. A failure means "no saved state"; the engine keeps
        // its defaults and logging is all that happens.
        {
            let table = table.clone();
            let store = Arc::clone(&store);
            let alive = Arc::clone(&alive);
            tokio::spawn(async move {
                match store.load(table.name()).await {
                    Ok(Some(state)) => {
                        if alive.load(Ordering::SeqCst) {
                            debug!("persist: restoring state for '{}'", table.name());
                            table.apply_state(state);
                        } else {
                            debug!(
                                "persist: '{}' detached before load resolved, discarding",
                                table.name()
                            );
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!("persist: load for '{}' failed, using defaults: {e}", table.name());
                    }
                }
            });
        }

        // Debounced saves on every subsequent change. The payload is
        // snapshotted when the timer fires, so a burst collapses into one
        // write of the final state.
        let listener_table = table.clone();
        let listener_alive = Arc::clone(&alive);
        let listener_debouncer = Arc::clone(&debouncer);
        table.set_on_change(Some(Arc::new(move || {
            if !listener_alive.load(Ordering::SeqCst) {
                return;
            }
            let table = listener_table.clone();
            let store = Arc::clone(&store);
            let alive = Arc::clone(&listener_alive);
            listener_debouncer.call(move || {
                if !alive.load(Ordering::SeqCst) {
                    return;
                }
                let Ok(handle) = tokio::runtime::Handle::try_current() else {
                    warn!("persist: no async runtime, skipping save for '{}'", table.name());
                    return;
                };
                let state = table.serialize_state();
                handle.spawn(async move {
                    if let Err(e) = store.save(table.name(), state).await {
                        // The next debounce cycle resends the full state,
                        // so a lost write heals itself.
                        warn!("persist: save for '{}' failed: {e}", table.name());
                    }
                });
            });
        })));

        let unbind_table = table.clone();
        Self {
            alive,
            debouncer,
            unbind: Box::new(move || unbind_table.set_on_change(None)),
        }
    }

    /// Detach from the table: no further loads apply and no saves run.
    pub fn detach(self) {
        // Drop does the work.
    }
}

impl Drop for Persistence {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::SeqCst);
        self.debouncer.cancel();
        (self.unbind)();
    }
}
