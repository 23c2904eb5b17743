//! Search debounce timing: keystrokes restart the window, never queue.

mod common;

use std::time::Duration;

use gridstate::prelude::*;

fn debounced_table() -> TableView<common::Item> {
    common::init_logging();
    TableView::new("debounced_search", common::columns())
        .with_search_fn(|item: &common::Item, q| fuzzy_matches(&item.name, q))
        .with_rows(common::items())
}

#[tokio::test(start_paused = true)]
async fn test_search_commits_after_window() {
    let t = debounced_table();
    t.set_search("alp");
    assert_eq!(t.debounced_search(), "");
    assert_eq!(t.filtered().len(), 5);

    tokio::time::sleep(Duration::from_millis(210)).await;
    tokio::task::yield_now().await;
    assert_eq!(t.debounced_search(), "alp");
    assert_eq!(common::names(&t.filtered()), vec!["Alpha"]);
}

#[tokio::test(start_paused = true)]
async fn test_new_keystroke_restarts_window() {
    let t = debounced_table();
    t.set_search("a");
    tokio::time::sleep(Duration::from_millis(150)).await;
    t.set_search("al");
    tokio::time::sleep(Duration::from_millis(150)).await;
    // 300 ms elapsed, but no window ran uninterrupted.
    assert_eq!(t.debounced_search(), "");

    tokio::time::sleep(Duration::from_millis(60)).await;
    tokio::task::yield_now().await;
    assert_eq!(t.debounced_search(), "al");
}

#[tokio::test(start_paused = true)]
async fn test_flush_commits_immediately() {
    let t = debounced_table();
    t.set_search("gam");
    t.flush_search();
    assert_eq!(t.debounced_search(), "gam");
    assert_eq!(common::names(&t.filtered()), vec!["Gamma"]);
}

#[test]
fn test_without_runtime_search_commits_inline() {
    let t = debounced_table();
    t.set_search("bet");
    assert_eq!(t.debounced_search(), "bet");
    assert_eq!(common::names(&t.filtered()), vec!["Beta"]);
}
