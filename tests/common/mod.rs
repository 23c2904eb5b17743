//! Shared fixtures for the integration tests.

use std::sync::Once;
use std::time::Duration;

use gridstate::prelude::*;

static INIT: Once = Once::new();

pub fn init_logging() {
    INIT.call_once(|| {
        let _ = simplelog::SimpleLogger::init(
            log::LevelFilter::Debug,
            simplelog::Config::default(),
        );
    });
}

#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: u32,
    pub name: String,
    pub status: String,
    pub count: Option<i64>,
}

impl Item {
    pub fn new(id: u32, name: &str, status: &str, count: Option<i64>) -> Self {
        Self {
            id,
            name: name.to_string(),
            status: status.to_string(),
            count,
        }
    }
}

impl Row for Item {
    type Key = u32;

    fn key(&self) -> u32 {
        self.id
    }

    fn value(&self, column: &str) -> Value {
        match column {
            "id" => self.id.into(),
            "name" => self.name.as_str().into(),
            "status" => self.status.as_str().into(),
            "count" => self.count.into(),
            _ => Value::Null,
        }
    }
}

pub fn items() -> Vec<Item> {
    vec![
        Item::new(1, "Alpha", "active", Some(10)),
        Item::new(2, "Beta", "pending", Some(5)),
        Item::new(3, "Gamma", "active", Some(20)),
        Item::new(4, "Delta", "closed", Some(0)),
        Item::new(5, "Epsilon", "pending", Some(15)),
    ]
}

pub fn columns() -> Vec<Column<Item>> {
    vec![
        Column::new("name"),
        Column::new("status").filter_options(["active", "pending", "closed"]),
        Column::new("count").filter_range(),
    ]
}

/// A view over the standard five records with inline search commits, so
/// synchronous tests never wait on the debounce timer.
pub fn table(name: &str) -> TableView<Item> {
    init_logging();
    TableView::new(name, columns())
        .with_search_debounce(Duration::ZERO)
        .with_search_fn(|item: &Item, q| fuzzy_matches(&item.name, q))
        .with_rows(items())
}

pub fn names(rows: &[Item]) -> Vec<&str> {
    rows.iter().map(|i| i.name.as_str()).collect()
}
