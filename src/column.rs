//! Column descriptors and the row accessor trait.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use crate::value::Value;

/// Trait for records that can be driven through a table view.
///
/// The engine never constructs or mutates a record; it only reads cells
/// through this trait and identifies rows by their key.
///
/// # Example
///
/// ```ignore
/// #[derive(Clone)]
/// struct Work {
///     id: u32,
///     title: String,
///     status: String,
/// }
///
/// impl Row for Work {
///     type Key = u32;
///
///     fn key(&self) -> u32 {
///         self.id
///     }
///
///     fn value(&self, column: &str) -> Value {
///         match column {
///             "title" => self.title.as_str().into(),
///             "status" => self.status.as_str().into(),
///             _ => Value::Null,
///         }
///     }
/// }
/// ```
pub trait Row: Clone + Send + Sync + 'static {
    /// The key type used to identify this row.
    type Key: Clone + Eq + Hash + ToString + Send + Sync + 'static;

    /// Return a stable, unique key for this row.
    fn key(&self) -> Self::Key;

    /// Read the value of a column for this row.
    ///
    /// Unknown columns should return [`Value::Null`].
    fn value(&self, column: &str) -> Value;
}

/// Callback producing the ordering value for a column, overriding
/// [`Row::value`] when the natural sort key differs from the displayed one
/// (e.g. an ordinal rank behind a status label).
pub type SortValueFn<T> = Arc<dyn Fn(&T) -> Value + Send + Sync>;

/// One sortable/filterable dimension of the record set.
///
/// # Example
///
/// ```ignore
/// let columns = vec![
///     Column::new("title"),
///     Column::new("status").filter_options(["draft", "submitted", "accepted"]),
///     Column::new("word_count").filter_range(),
/// ];
/// ```
pub struct Column<T> {
    /// Unique identifier for this column within its table.
    pub key: String,
    /// Distinct values this column may take; presence makes the column a
    /// discrete-filter column. The default selection is all options.
    pub filter_options: Option<Vec<String>>,
    /// Whether this column carries a numeric range filter.
    pub filter_range: bool,
    /// Optional ordering-value override.
    pub sort_value: Option<SortValueFn<T>>,
}

impl<T> Column<T> {
    /// Create a new column with the given key.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            filter_options: None,
            filter_range: false,
            sort_value: None,
        }
    }

    /// Make this a discrete-filter column with the given option set.
    pub fn filter_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter_options = Some(options.into_iter().map(Into::into).collect());
        self
    }

    /// Make this a numeric range-filter column.
    pub fn filter_range(mut self) -> Self {
        self.filter_range = true;
        self
    }

    /// Set the ordering-value override for this column.
    pub fn sort_value(mut self, f: impl Fn(&T) -> Value + Send + Sync + 'static) -> Self {
        self.sort_value = Some(Arc::new(f));
        self
    }
}

impl<T> Clone for Column<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            filter_options: self.filter_options.clone(),
            filter_range: self.filter_range,
            sort_value: self.sort_value.clone(),
        }
    }
}

impl<T> fmt::Debug for Column<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("key", &self.key)
            .field("filter_options", &self.filter_options)
            .field("filter_range", &self.filter_range)
            .field("sort_value", &self.sort_value.as_ref().map(|_| "<fn>"))
            .finish()
    }
}
