//! Persistence: serialization round-trips, debounced saves, detach guard.

mod common;

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use common::table;
use futures::future::BoxFuture;
use gridstate::prelude::*;

/// Store wrapper that counts writes, to observe debounce coalescing.
struct CountingStore {
    inner: MemoryStore,
    saves: AtomicUsize,
}

impl CountingStore {
    fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            saves: AtomicUsize::new(0),
        }
    }
}

impl StateStore for CountingStore {
    fn load<'a>(
        &'a self,
        table: &'a str,
    ) -> BoxFuture<'a, Result<Option<SerializedTableState>, StoreError>> {
        self.inner.load(table)
    }

    fn save<'a>(
        &'a self,
        table: &'a str,
        state: SerializedTableState,
    ) -> BoxFuture<'a, Result<(), StoreError>> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save(table, state)
    }
}

/// Store whose load takes a while, for the detach guard.
struct SlowStore {
    delay: Duration,
    state: SerializedTableState,
}

impl StateStore for SlowStore {
    fn load<'a>(
        &'a self,
        _table: &'a str,
    ) -> BoxFuture<'a, Result<Option<SerializedTableState>, StoreError>> {
        Box::pin(async move {
            tokio::time::sleep(self.delay).await;
            Ok(Some(self.state.clone()))
        })
    }

    fn save<'a>(
        &'a self,
        _table: &'a str,
        _state: SerializedTableState,
    ) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async { Ok(()) })
    }
}

struct FailingStore;

impl StateStore for FailingStore {
    fn load<'a>(
        &'a self,
        _table: &'a str,
    ) -> BoxFuture<'a, Result<Option<SerializedTableState>, StoreError>> {
        Box::pin(async { Err(StoreError::Backend("unavailable".into())) })
    }

    fn save<'a>(
        &'a self,
        _table: &'a str,
        _state: SerializedTableState,
    ) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async { Err(StoreError::Backend("unavailable".into())) })
    }
}

async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

#[test]
fn test_state_round_trip_reproduces_view() {
    let a = table("round_trip").with_page_size(10);
    a.set_search("ta");
    a.handle_column_click("name", false);
    a.handle_column_click("count", false);
    a.handle_filter_select_only("status", ["pending", "closed"]);
    a.handle_range_filter_change("count", Some(1.0), None);
    a.set_page(2);

    let saved = a.serialize_state();

    let b = table("round_trip_b").with_page_size(10);
    b.apply_state(saved);

    assert_eq!(b.search(), "ta");
    assert_eq!(b.debounced_search(), "ta");
    assert_eq!(b.page(), 2);
    assert_eq!(b.page_size(), 10);
    assert_eq!(b.sort(), a.sort());
    let expected: HashSet<String> = ["pending", "closed"].iter().map(|s| s.to_string()).collect();
    assert_eq!(b.filter_selection("status"), expected);
    assert_eq!(b.range_filter("count"), Some(RangeFilter { min: Some(1.0), max: None }));
    assert_eq!(common::names(&b.filtered()), common::names(&a.filtered()));
}

#[test]
fn test_wire_format_round_trips_through_json() {
    let t = table("json_wire");
    t.handle_column_click("name", false);
    t.handle_column_click("name", false); // desc
    t.handle_filter_select_only("status", ["active"]);

    let state = t.serialize_state();
    let json = serde_json::to_string(&state).unwrap();
    assert!(json.contains("\"desc\""));
    let back: SerializedTableState = serde_json::from_str(&json).unwrap();
    assert_eq!(back, state);
}

#[test]
fn test_absent_fields_keep_defaults() {
    let t = table("partial_apply");
    t.apply_state(SerializedTableState {
        page: Some(3),
        ..Default::default()
    });
    assert_eq!(t.page(), 3);
    assert_eq!(t.page_size(), 20);
    assert_eq!(t.search(), "");
    // Discrete column with no persisted entry stays fully selected.
    assert_eq!(t.filter_selection("status").len(), 3);
    assert!(!t.has_active_filters());
}

#[tokio::test(start_paused = true)]
async fn test_saves_are_debounced_and_carry_final_state() {
    let store = Arc::new(CountingStore::new());
    let t = table("debounced");
    let persistence = Persistence::attach(&t, store.clone());
    settle().await;

    // A burst of edits within the window collapses into one write.
    t.handle_filter_toggle("status", "closed");
    t.handle_filter_toggle("status", "pending");
    t.handle_column_click("name", false);

    tokio::time::sleep(Duration::from_millis(350)).await;
    settle().await;

    assert_eq!(store.saves.load(Ordering::SeqCst), 1);
    let saved = store.inner.load("debounced").await.unwrap().unwrap();
    let filters = saved.filters.unwrap();
    assert_eq!(filters.get("status").unwrap(), &vec!["active".to_string()]);
    assert_eq!(
        saved.sort.unwrap().primary,
        SortColumn::new("name", SortDirection::Asc)
    );

    persistence.detach();
}

#[tokio::test(start_paused = true)]
async fn test_new_change_restarts_save_timer() {
    let store = Arc::new(CountingStore::new());
    let t = table("restart_timer");
    let _persistence = Persistence::attach(&t, store.clone());
    settle().await;

    t.set_page(2);
    tokio::time::sleep(Duration::from_millis(200)).await;
    t.set_page(3);
    tokio::time::sleep(Duration::from_millis(200)).await;
    // 400 ms elapsed but neither window completed uninterrupted.
    assert_eq!(store.saves.load(Ordering::SeqCst), 0);

    tokio::time::sleep(Duration::from_millis(150)).await;
    settle().await;
    assert_eq!(store.saves.load(Ordering::SeqCst), 1);
    assert_eq!(
        store.inner.load("restart_timer").await.unwrap().unwrap().page,
        Some(3)
    );
}

#[tokio::test(start_paused = true)]
async fn test_load_restores_state_on_attach() {
    let store = Arc::new(MemoryStore::new());
    store
        .save(
            "restore",
            SerializedTableState {
                page: Some(2),
                page_size: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let t = table("restore");
    let _persistence = Persistence::attach(&t, store);
    settle().await;

    assert_eq!(t.page(), 2);
    assert_eq!(t.page_size(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_detach_discards_in_flight_load() {
    let store = Arc::new(SlowStore {
        delay: Duration::from_millis(500),
        state: SerializedTableState {
            page: Some(7),
            ..Default::default()
        },
    });

    let t = table("slow_load");
    let persistence = Persistence::attach(&t, store);
    settle().await;
    persistence.detach();

    tokio::time::sleep(Duration::from_millis(600)).await;
    settle().await;
    assert_eq!(t.page(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failed_load_falls_back_to_defaults() {
    let t = table("failing");
    let _persistence = Persistence::attach(&t, Arc::new(FailingStore));
    settle().await;

    assert_eq!(t.page(), 1);
    assert_eq!(t.filtered().len(), 5);
}

#[tokio::test]
async fn test_json_file_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path());

    assert!(store.load("works").await.unwrap().is_none());

    let state = SerializedTableState {
        search: Some("alpha".to_string()),
        page: Some(2),
        ..Default::default()
    };
    store.save("works", state.clone()).await.unwrap();
    assert_eq!(store.load("works").await.unwrap(), Some(state));
}
