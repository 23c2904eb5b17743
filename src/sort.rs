//! Multi-level sort state and the column-click cycling rules.

use std::cmp::Ordering;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::column::{Column, Row};
use crate::value::{Value, compare_values};

/// Maximum number of stacked sort levels.
pub const SORT_LEVELS: usize = 4;

/// Direction of one sort level.
///
/// `Unset` (the empty string on the wire) means the slot carries no sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[serde(rename = "asc")]
    Asc,
    #[serde(rename = "desc")]
    Desc,
    #[default]
    #[serde(rename = "")]
    Unset,
}

/// One sort level: a column key and a direction.
///
/// An empty column and `Unset` direction both mean the slot is vacant.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortColumn {
    pub column: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortColumn {
    /// Create a populated sort level.
    pub fn new(column: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }

    /// Check whether this slot carries a sort.
    pub fn is_set(&self) -> bool {
        !self.column.is_empty()
    }
}

/// The ordered 4-level sort specification.
///
/// Invariant: if a later slot is populated, all earlier slots are too.
/// Removing a mid-chain level promotes the later levels forward, so the
/// chain never has gaps.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ViewSort {
    #[serde(default)]
    pub primary: SortColumn,
    #[serde(default)]
    pub secondary: SortColumn,
    #[serde(default)]
    pub tertiary: SortColumn,
    #[serde(default)]
    pub quaternary: SortColumn,
}

impl ViewSort {
    /// Check whether any sort is active.
    pub fn is_active(&self) -> bool {
        self.primary.is_set()
    }

    /// View the slots in order.
    pub fn slots(&self) -> [&SortColumn; SORT_LEVELS] {
        [
            &self.primary,
            &self.secondary,
            &self.tertiary,
            &self.quaternary,
        ]
    }

    fn set_slots(&mut self, levels: Vec<SortColumn>) {
        let mut it = levels.into_iter();
        self.primary = it.next().unwrap_or_default();
        self.secondary = it.next().unwrap_or_default();
        self.tertiary = it.next().unwrap_or_default();
        self.quaternary = it.next().unwrap_or_default();
    }

    /// Clear all levels.
    pub fn clear(&mut self) {
        *self = ViewSort::default();
    }

    /// Exclusive-sort shortcut (meta-click on a header).
    ///
    /// Clicking the current primary clears the sort entirely; clicking any
    /// other column makes it the sole ascending level. Multi-level sort is
    /// always discarded.
    pub fn set_exclusive(&mut self, column: &str) {
        if self.primary.column == column {
            debug!("sort: exclusive click on primary '{column}', clearing sort");
            self.clear();
        } else {
            debug!("sort: exclusive sort on '{column}'");
            *self = ViewSort {
                primary: SortColumn::new(column, SortDirection::Asc),
                ..ViewSort::default()
            };
        }
    }

    /// Plain header click: cycle the column through asc → desc → removed.
    ///
    /// A column not yet in the chain is appended ascending to the first
    /// vacant slot; with all four slots occupied the click is ignored.
    /// Removing a mid-chain level shifts the later levels forward.
    pub fn cycle(&mut self, column: &str) {
        let mut levels: Vec<SortColumn> = self.slots().into_iter().cloned().collect();
        match levels.iter().position(|s| s.is_set() && s.column == column) {
            Some(i) => match levels[i].direction {
                SortDirection::Asc => {
                    debug!("sort: '{column}' asc -> desc at level {i}");
                    levels[i].direction = SortDirection::Desc;
                }
                SortDirection::Desc => {
                    debug!("sort: '{column}' removed from level {i}");
                    // Removing a level promotes everything after it; set_slots
                    // backfills the vacated tail with empty slots.
                    levels.remove(i);
                }
                // Should not occur for a populated slot; repair to asc.
                SortDirection::Unset => {
                    levels[i].direction = SortDirection::Asc;
                }
            },
            None => {
                if let Some(vacant) = levels.iter().position(|s| !s.is_set()) {
                    debug!("sort: '{column}' appended asc at level {vacant}");
                    levels[vacant] = SortColumn::new(column, SortDirection::Asc);
                } else {
                    // Fifth-level sort is not supported.
                    debug!("sort: all levels occupied, ignoring click on '{column}'");
                }
            }
        }
        self.set_slots(levels);
    }
}

/// Sort `rows` (as indices into `data`) by the given sort spec.
///
/// With no active sort the input order is preserved. `sort_by` is stable,
/// so equal rows keep their relative order at every level.
pub(crate) fn sort_indices<T: Row>(
    data: &[T],
    indices: &mut Vec<usize>,
    sort: &ViewSort,
    columns: &[Column<T>],
) {
    if !sort.is_active() {
        return;
    }
    indices.sort_by(|&a, &b| compare_rows(&data[a], &data[b], sort, columns));
}

/// 4-level lexicographic comparison of two rows.
pub(crate) fn compare_rows<T: Row>(
    a: &T,
    b: &T,
    sort: &ViewSort,
    columns: &[Column<T>],
) -> Ordering {
    for slot in sort.slots() {
        if !slot.is_set() || slot.direction == SortDirection::Unset {
            continue;
        }
        let va = sort_value(a, &slot.column, columns);
        let vb = sort_value(b, &slot.column, columns);
        let ord = compare_level(&va, &vb, slot.direction);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// Per-level comparison. Nulls sort last under both directions; the
/// direction only negates comparisons between two non-null values.
fn compare_level(a: &Value, b: &Value, direction: SortDirection) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            let ord = compare_values(a, b);
            if direction == SortDirection::Desc {
                ord.reverse()
            } else {
                ord
            }
        }
    }
}

fn sort_value<T: Row>(row: &T, column: &str, columns: &[Column<T>]) -> Value {
    let descriptor = columns.iter().find(|c| c.key == column);
    match descriptor.and_then(|c| c.sort_value.as_ref()) {
        Some(f) => f(row),
        None => row.value(column),
    }
}
