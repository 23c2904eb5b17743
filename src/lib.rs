//! Headless table view-state engine.
//!
//! `gridstate` takes an arbitrary collection of typed records plus a column
//! descriptor set and produces a searched, filtered, multi-level-sorted,
//! paginated, selection-tracked view, with optional persistence and keyboard
//! navigation. Rendering is left entirely to the caller.
//!
//! ```ignore
//! let table = TableView::new("works", vec![
//!     Column::new("title"),
//!     Column::new("status").filter_options(["draft", "submitted"]),
//!     Column::new("word_count").filter_range(),
//! ])
//! .with_search_fn(|work: &Work, q| fuzzy_matches(&work.title, q))
//! .with_rows(works);
//!
//! table.handle_column_click("title", false);
//! for work in table.paginated() {
//!     // render a row
//! }
//! ```

pub mod column;
pub mod debounce;
pub mod events;
pub mod filter;
pub mod keys;
pub mod persist;
pub mod search;
pub mod sort;
pub mod table;
pub mod value;

pub mod prelude {
    pub use crate::column::{Column, Row};
    pub use crate::events::{EventResult, Modifiers};
    pub use crate::filter::RangeFilter;
    pub use crate::keys::{Key, KeyCombo, KeyboardController};
    pub use crate::persist::{
        JsonFileStore, MemoryStore, Persistence, SerializedTableState, StateStore, StoreError,
    };
    pub use crate::search::fuzzy_matches;
    pub use crate::sort::{SortColumn, SortDirection, ViewSort};
    pub use crate::table::TableView;
    pub use crate::value::Value;
}
