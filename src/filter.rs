//! Discrete and numeric range filter state.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::column::{Column, Row};
use crate::value::Value;

/// Inclusive numeric bounds for a range-filter column.
///
/// An entry with both bounds unset is equivalent to no filter.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RangeFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl RangeFilter {
    /// Check whether at least one bound is set.
    pub fn is_active(&self) -> bool {
        self.min.is_some() || self.max.is_some()
    }

    /// Check a value against the bounds.
    ///
    /// A missing or non-numeric value fails only if a bound is actually set.
    pub fn accepts(&self, value: &Value) -> bool {
        if !self.is_active() {
            return true;
        }
        let Some(n) = value.as_num() else {
            return false;
        };
        if let Some(min) = self.min
            && n < min
        {
            return false;
        }
        if let Some(max) = self.max
            && n > max
        {
            return false;
        }
        true
    }
}

/// Per-table filter state: selected option sets per discrete column plus
/// range bounds per numeric column.
#[derive(Debug, Clone, Default)]
pub struct Filters {
    /// Selected options per discrete-filter column.
    pub selected: HashMap<String, HashSet<String>>,
    /// Range bounds per range-filter column.
    pub ranges: HashMap<String, RangeFilter>,
}

impl Filters {
    /// Seed every discrete-filter column that has no entry yet with its full
    /// option set, so newly added columns never start as "nothing selected".
    pub(crate) fn seed_defaults<T>(&mut self, columns: &[Column<T>]) {
        for col in columns {
            if let Some(options) = &col.filter_options {
                self.selected
                    .entry(col.key.clone())
                    .or_insert_with(|| options.iter().cloned().collect());
            }
        }
    }

    /// Reset every discrete column back to all options and drop all ranges.
    pub(crate) fn reset<T>(&mut self, columns: &[Column<T>]) {
        self.selected.clear();
        self.ranges.clear();
        self.seed_defaults(columns);
    }

    /// Check whether a discrete column's selection actually filters.
    ///
    /// Zero selected options or all options selected both mean inactive.
    fn is_discrete_active<T>(&self, col: &Column<T>) -> bool {
        let Some(options) = &col.filter_options else {
            return false;
        };
        match self.selected.get(&col.key) {
            Some(set) => !set.is_empty() && set.len() < options.len(),
            None => false,
        }
    }

    /// True iff any discrete column has a proper non-full, non-empty subset
    /// selected, or any range filter has a bound set.
    pub(crate) fn any_active<T>(&self, columns: &[Column<T>]) -> bool {
        columns.iter().any(|c| self.is_discrete_active(c))
            || self.ranges.values().any(RangeFilter::is_active)
    }

    /// Check one row against every active filter.
    pub(crate) fn accepts<T: Row>(&self, row: &T, columns: &[Column<T>]) -> bool {
        for col in columns {
            if self.is_discrete_active(col) {
                // is_discrete_active guarantees the entry exists.
                let Some(set) = self.selected.get(&col.key) else {
                    continue;
                };
                if !set.contains(&row.value(&col.key).coerce_string()) {
                    return false;
                }
            }
            if col.filter_range
                && let Some(range) = self.ranges.get(&col.key)
                && !range.accepts(&row.value(&col.key))
            {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_missing_value_fails_only_with_bounds() {
        let unbounded = RangeFilter::default();
        assert!(unbounded.accepts(&Value::Null));
        assert!(unbounded.accepts(&Value::from("text")));

        let bounded = RangeFilter {
            min: Some(1.0),
            max: None,
        };
        assert!(!bounded.accepts(&Value::Null));
        assert!(!bounded.accepts(&Value::from("text")));
        assert!(bounded.accepts(&Value::Num(1.0)));
        assert!(!bounded.accepts(&Value::Num(0.5)));
    }

    #[test]
    fn test_range_bounds_inclusive() {
        let range = RangeFilter {
            min: Some(5.0),
            max: Some(10.0),
        };
        assert!(range.accepts(&Value::Num(5.0)));
        assert!(range.accepts(&Value::Num(10.0)));
        assert!(!range.accepts(&Value::Num(10.1)));
    }
}
