//! The table view-state engine.
//!
//! [`TableView<T>`] owns all view state for one logical table (search text,
//! page, page size, sort spec, filters, selection) and derives the
//! `filtered -> sorted -> paginated` views from whatever rows the caller
//! last supplied. Rendering is entirely the caller's concern; this type is
//! headless.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use log::debug;

use crate::column::{Column, Row};
use crate::debounce::Debouncer;
use crate::filter::{Filters, RangeFilter};
use crate::sort::{ViewSort, sort_indices};

/// Default rows per page.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Default debounce window between a search keystroke and the pipeline
/// seeing the new query.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(200);

/// Predicate deciding whether a row matches a search query.
pub type SearchFn<T> = Arc<dyn Fn(&T, &str) -> bool + Send + Sync>;

/// Listener invoked after every view-state mutation (used by persistence).
pub type ChangeListener = Arc<dyn Fn() + Send + Sync>;

/// Internal state for one table view.
struct ViewInner<T: Row> {
    /// Column descriptors.
    columns: Vec<Column<T>>,
    /// Raw unfiltered rows, replaced wholesale by the caller on refetch.
    rows: Vec<T>,
    /// Optional search predicate. Without one, search text is collected but
    /// has no filtering effect.
    search_fn: Option<SearchFn<T>>,
    /// Raw search text as typed.
    search: String,
    /// Debounce-committed search text, the one filtering actually uses.
    debounced_search: String,
    /// Current page, 1-based.
    page: usize,
    /// Rows per page.
    page_size: usize,
    /// Selected row index, 0-based and local to the current page.
    selected_index: usize,
    /// Multi-level sort spec.
    sort: ViewSort,
    /// Discrete and range filter state.
    filters: Filters,
    /// Change listener for persistence.
    on_change: Option<ChangeListener>,
}

impl<T: Row> ViewInner<T> {
    fn filtered_indices(&self) -> Vec<usize> {
        let query = self.debounced_search.as_str();
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| {
                let search_ok = query.is_empty()
                    || self.search_fn.as_ref().is_none_or(|f| f(*row, query));
                search_ok && self.filters.accepts(*row, &self.columns)
            })
            .map(|(i, _)| i)
            .collect()
    }

    fn sorted_indices(&self) -> Vec<usize> {
        let mut indices = self.filtered_indices();
        sort_indices(&self.rows, &mut indices, &self.sort, &self.columns);
        indices
    }

    fn total_pages(&self) -> usize {
        let len = self.sorted_indices().len();
        len.div_ceil(self.page_size.max(1))
    }

    /// Stale page numbers are clamped at read time, never corrected in the
    /// stored state, so widening a filter recovers the user's page.
    fn effective_page(&self) -> usize {
        let total = self.total_pages();
        if total > 0 { self.page.min(total) } else { self.page }
    }
}

/// A headless, paginated table view over caller-owned records.
///
/// `TableView<T>` manages the view state for one table:
/// - Debounced search plus discrete and numeric range filters
/// - Up to four stacked sort levels with header-click cycling
/// - Pagination with stale-page clamping
/// - Page-local selection with global-index navigation
///
/// Cloning is cheap and shares state, so the view can be handed to event
/// handlers and async tasks alike.
pub struct TableView<T: Row> {
    /// Stable name identifying this table (persistence slot).
    name: String,
    inner: Arc<RwLock<ViewInner<T>>>,
    /// Dirty flag for re-render.
    dirty: Arc<AtomicBool>,
    search_debounce: Arc<Debouncer>,
}

impl<T: Row> TableView<T> {
    /// Create a new view with the given stable name and columns.
    pub fn new(name: impl Into<String>, columns: Vec<Column<T>>) -> Self {
        let mut filters = Filters::default();
        filters.seed_defaults(&columns);
        Self {
            name: name.into(),
            inner: Arc::new(RwLock::new(ViewInner {
                columns,
                rows: Vec::new(),
                search_fn: None,
                search: String::new(),
                debounced_search: String::new(),
                page: 1,
                page_size: DEFAULT_PAGE_SIZE,
                selected_index: 0,
                sort: ViewSort::default(),
                filters,
                on_change: None,
            })),
            dirty: Arc::new(AtomicBool::new(false)),
            search_debounce: Arc::new(Debouncer::new(SEARCH_DEBOUNCE)),
        }
    }

    /// Set the initial rows.
    pub fn with_rows(self, rows: Vec<T>) -> Self {
        self.set_rows(rows);
        self
    }

    /// Set the rows per page.
    pub fn with_page_size(self, page_size: usize) -> Self {
        if let Ok(mut guard) = self.inner.write() {
            guard.page_size = page_size.max(1);
        }
        self
    }

    /// Set the search predicate.
    pub fn with_search_fn(self, f: impl Fn(&T, &str) -> bool + Send + Sync + 'static) -> Self {
        if let Ok(mut guard) = self.inner.write() {
            guard.search_fn = Some(Arc::new(f));
        }
        self
    }

    /// Override the search debounce window. Zero commits keystrokes inline.
    pub fn with_search_debounce(mut self, delay: Duration) -> Self {
        self.search_debounce = Arc::new(Debouncer::new(delay));
        self
    }

    /// Get the table's stable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the column descriptors.
    pub fn columns(&self) -> Vec<Column<T>> {
        self.inner
            .read()
            .map(|g| g.columns.clone())
            .unwrap_or_default()
    }

    // -------------------------------------------------------------------------
    // Rows
    // -------------------------------------------------------------------------

    /// Replace all rows (e.g. after a refetch). View state is kept; a page
    /// now past the end is clamped at read time.
    pub fn set_rows(&self, rows: Vec<T>) {
        if let Ok(mut guard) = self.inner.write() {
            guard.rows = rows;
        }
        self.dirty.store(true, Ordering::SeqCst);
    }

    /// Get the number of raw rows.
    pub fn len(&self) -> usize {
        self.inner.read().map(|g| g.rows.len()).unwrap_or(0)
    }

    /// Check if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // -------------------------------------------------------------------------
    // Derived pipeline
    // -------------------------------------------------------------------------

    /// Rows passing search and all active filters, input order preserved.
    pub fn filtered(&self) -> Vec<T> {
        self.inner
            .read()
            .map(|g| {
                g.filtered_indices()
                    .into_iter()
                    .map(|i| g.rows[i].clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Filtered rows under the current sort spec.
    pub fn sorted(&self) -> Vec<T> {
        self.inner
            .read()
            .map(|g| {
                g.sorted_indices()
                    .into_iter()
                    .map(|i| g.rows[i].clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of rows in the sorted view.
    pub fn sorted_len(&self) -> usize {
        self.inner
            .read()
            .map(|g| g.filtered_indices().len())
            .unwrap_or(0)
    }

    /// The current page of the sorted view.
    pub fn paginated(&self) -> Vec<T> {
        self.inner
            .read()
            .map(|g| {
                let indices = g.sorted_indices();
                let page = g.effective_page().max(1);
                let start = (page - 1) * g.page_size;
                indices
                    .into_iter()
                    .skip(start)
                    .take(g.page_size)
                    .map(|i| g.rows[i].clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Total number of pages (0 when no rows survive filtering).
    pub fn total_pages(&self) -> usize {
        self.inner.read().map(|g| g.total_pages()).unwrap_or(0)
    }

    /// The page actually shown: the stored page clamped to the available
    /// range whenever any pages exist.
    pub fn effective_page(&self) -> usize {
        self.inner.read().map(|g| g.effective_page()).unwrap_or(1)
    }

    // -------------------------------------------------------------------------
    // Search
    // -------------------------------------------------------------------------

    /// Set the search text.
    ///
    /// Resets the page and selection immediately; the filter pipeline picks
    /// the new query up after the debounce window (or inline with a zero
    /// window or no async runtime).
    pub fn set_search(&self, query: impl Into<String>) {
        if let Ok(mut guard) = self.inner.write() {
            guard.search = query.into();
            guard.page = 1;
            guard.selected_index = 0;
        }
        self.dirty.store(true, Ordering::SeqCst);
        let inner = Arc::clone(&self.inner);
        let dirty = Arc::clone(&self.dirty);
        self.search_debounce.call(move || {
            if let Ok(mut guard) = inner.write() {
                guard.debounced_search = guard.search.clone();
            }
            dirty.store(true, Ordering::SeqCst);
            notify(&inner);
        });
        self.notify();
    }

    /// Commit any pending search text immediately.
    pub fn flush_search(&self) {
        self.search_debounce.cancel();
        if let Ok(mut guard) = self.inner.write() {
            guard.debounced_search = guard.search.clone();
        }
        self.dirty.store(true, Ordering::SeqCst);
        self.notify();
    }

    /// The raw search text as typed.
    pub fn search(&self) -> String {
        self.inner
            .read()
            .map(|g| g.search.clone())
            .unwrap_or_default()
    }

    /// The committed search text the filter stage uses.
    pub fn debounced_search(&self) -> String {
        self.inner
            .read()
            .map(|g| g.debounced_search.clone())
            .unwrap_or_default()
    }

    // -------------------------------------------------------------------------
    // Sorting
    // -------------------------------------------------------------------------

    /// Get the current sort spec.
    pub fn sort(&self) -> ViewSort {
        self.inner
            .read()
            .map(|g| g.sort.clone())
            .unwrap_or_default()
    }

    /// Handle a header click on `column`.
    ///
    /// A plain click cycles the column through asc → desc → removed within
    /// the 4-level chain; a meta click sorts by that column exclusively (and
    /// clears the sort when the column is already primary).
    pub fn handle_column_click(&self, column: &str, meta: bool) {
        if let Ok(mut guard) = self.inner.write() {
            if meta {
                guard.sort.set_exclusive(column);
            } else {
                guard.sort.cycle(column);
            }
        }
        self.dirty.store(true, Ordering::SeqCst);
        self.notify();
    }

    /// True iff a primary sort column is set.
    pub fn has_active_sort(&self) -> bool {
        self.inner
            .read()
            .map(|g| g.sort.is_active())
            .unwrap_or(false)
    }

    // -------------------------------------------------------------------------
    // Filters
    // -------------------------------------------------------------------------

    /// Flip membership of `value` in a discrete column's selected set.
    pub fn handle_filter_toggle(&self, column: &str, value: &str) {
        if let Ok(mut guard) = self.inner.write() {
            let set = guard.filters.selected.entry(column.to_string()).or_default();
            if !set.remove(value) {
                set.insert(value.to_string());
            }
        }
        self.dirty.store(true, Ordering::SeqCst);
        self.notify();
    }

    /// Select every option of a discrete column (making it inactive).
    pub fn handle_filter_select_all(&self, column: &str) {
        if let Ok(mut guard) = self.inner.write() {
            let options: HashSet<String> = guard
                .columns
                .iter()
                .find(|c| c.key == column)
                .and_then(|c| c.filter_options.as_ref())
                .map(|opts| opts.iter().cloned().collect())
                .unwrap_or_default();
            guard.filters.selected.insert(column.to_string(), options);
        }
        self.dirty.store(true, Ordering::SeqCst);
        self.notify();
    }

    /// Deselect every option of a discrete column (also inactive: an empty
    /// selection means "no filtering", not "match nothing").
    pub fn handle_filter_select_none(&self, column: &str) {
        if let Ok(mut guard) = self.inner.write() {
            guard
                .filters
                .selected
                .insert(column.to_string(), HashSet::new());
        }
        self.dirty.store(true, Ordering::SeqCst);
        self.notify();
    }

    /// Replace a discrete column's selection with exactly the given values.
    pub fn handle_filter_select_only<I, S>(&self, column: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Ok(mut guard) = self.inner.write() {
            let set: HashSet<String> = values.into_iter().map(Into::into).collect();
            guard.filters.selected.insert(column.to_string(), set);
        }
        self.dirty.store(true, Ordering::SeqCst);
        self.notify();
    }

    /// Replace a column's range filter. Both bounds unset removes the entry.
    pub fn handle_range_filter_change(&self, column: &str, min: Option<f64>, max: Option<f64>) {
        if let Ok(mut guard) = self.inner.write() {
            if min.is_none() && max.is_none() {
                guard.filters.ranges.remove(column);
            } else {
                guard
                    .filters
                    .ranges
                    .insert(column.to_string(), RangeFilter { min, max });
            }
        }
        self.dirty.store(true, Ordering::SeqCst);
        self.notify();
    }

    /// Get a discrete column's currently selected options.
    pub fn filter_selection(&self, column: &str) -> HashSet<String> {
        self.inner
            .read()
            .ok()
            .and_then(|g| g.filters.selected.get(column).cloned())
            .unwrap_or_default()
    }

    /// Get a column's range filter, if set.
    pub fn range_filter(&self, column: &str) -> Option<RangeFilter> {
        self.inner
            .read()
            .ok()
            .and_then(|g| g.filters.ranges.get(column).copied())
    }

    /// True iff any discrete or range filter actually narrows the view.
    pub fn has_active_filters(&self) -> bool {
        self.inner
            .read()
            .map(|g| g.filters.any_active(&g.columns))
            .unwrap_or(false)
    }

    /// Reset search, filters, and sort. Page, page size, and selection are
    /// left alone.
    pub fn handle_clear_all(&self) {
        debug!("table '{}': clearing search, filters, and sort", self.name);
        self.search_debounce.cancel();
        if let Ok(mut guard) = self.inner.write() {
            guard.search.clear();
            guard.debounced_search.clear();
            let columns = guard.columns.clone();
            guard.filters.reset(&columns);
            guard.sort.clear();
        }
        self.dirty.store(true, Ordering::SeqCst);
        self.notify();
    }

    // -------------------------------------------------------------------------
    // Pagination & selection
    // -------------------------------------------------------------------------

    /// Get the stored page (1-based, may exceed the available range).
    pub fn page(&self) -> usize {
        self.inner.read().map(|g| g.page).unwrap_or(1)
    }

    /// Set the page (1-based; floored at 1, not clamped above).
    pub fn set_page(&self, page: usize) {
        if let Ok(mut guard) = self.inner.write() {
            guard.page = page.max(1);
        }
        self.dirty.store(true, Ordering::SeqCst);
        self.notify();
    }

    /// Get the rows-per-page setting.
    pub fn page_size(&self) -> usize {
        self.inner
            .read()
            .map(|g| g.page_size)
            .unwrap_or(DEFAULT_PAGE_SIZE)
    }

    /// Set the rows-per-page setting (floored at 1).
    pub fn set_page_size(&self, page_size: usize) {
        if let Ok(mut guard) = self.inner.write() {
            guard.page_size = page_size.max(1);
        }
        self.dirty.store(true, Ordering::SeqCst);
        self.notify();
    }

    /// Get the page-local selected row index.
    pub fn selected_index(&self) -> usize {
        self.inner.read().map(|g| g.selected_index).unwrap_or(0)
    }

    /// Set the page-local selected row index.
    pub fn set_selected_index(&self, index: usize) {
        if let Ok(mut guard) = self.inner.write() {
            guard.selected_index = index;
        }
        self.dirty.store(true, Ordering::SeqCst);
        self.notify();
    }

    /// The selected row, if the current page has one at the selected index.
    pub fn selected_row(&self) -> Option<T> {
        let index = self.selected_index();
        self.paginated().into_iter().nth(index)
    }

    /// Position of the selection within the whole sorted view.
    pub fn global_index(&self) -> usize {
        self.inner
            .read()
            .map(|g| (g.effective_page().max(1) - 1) * g.page_size + g.selected_index)
            .unwrap_or(0)
    }

    /// Jump the selection to position `n` of the sorted view, moving pages
    /// as needed. `n` is clamped to the available range; with an empty view
    /// this is a no-op.
    pub fn navigate_to_global_index(&self, n: usize) {
        if let Ok(mut guard) = self.inner.write() {
            let len = guard.sorted_indices().len();
            if len == 0 {
                return;
            }
            let n = n.min(len - 1);
            guard.page = n / guard.page_size + 1;
            guard.selected_index = n % guard.page_size;
        }
        self.dirty.store(true, Ordering::SeqCst);
        self.notify();
    }

    /// Advance one page; on the last page, jump the selection to the last
    /// row instead.
    pub fn next_page(&self) {
        if let Ok(mut guard) = self.inner.write() {
            let total = guard.total_pages();
            let page = guard.effective_page();
            if page < total {
                guard.page = page + 1;
            } else if total > 0 {
                let len = guard.sorted_indices().len();
                let page_start = (page.max(1) - 1) * guard.page_size;
                guard.selected_index = (len - page_start).saturating_sub(1);
            }
        }
        self.dirty.store(true, Ordering::SeqCst);
        self.notify();
    }

    /// Go back one page; on the first page, jump the selection to the first
    /// row instead.
    pub fn prev_page(&self) {
        if let Ok(mut guard) = self.inner.write() {
            let page = guard.effective_page();
            if page > 1 {
                guard.page = page - 1;
            } else {
                guard.selected_index = 0;
            }
        }
        self.dirty.store(true, Ordering::SeqCst);
        self.notify();
    }

    // -------------------------------------------------------------------------
    // Reordering gate
    // -------------------------------------------------------------------------

    /// Whether manual row reordering is meaningful: only with no search, no
    /// active filter, and no sort. The reorder itself mutates caller-owned
    /// data; the view only gates the affordance.
    pub fn can_reorder(&self) -> bool {
        self.inner
            .read()
            .map(|g| {
                g.search.is_empty()
                    && g.debounced_search.is_empty()
                    && !g.filters.any_active(&g.columns)
                    && !g.sort.is_active()
            })
            .unwrap_or(false)
    }

    // -------------------------------------------------------------------------
    // Change tracking
    // -------------------------------------------------------------------------

    /// Register the change listener (used by the persistence adapter).
    pub fn set_on_change(&self, listener: Option<ChangeListener>) {
        if let Ok(mut guard) = self.inner.write() {
            guard.on_change = listener;
        }
    }

    fn notify(&self) {
        notify(&self.inner);
    }

    /// Check if the view has changed since the last render.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// Clear the dirty flag.
    pub fn clear_dirty(&self) {
        self.dirty.store(false, Ordering::SeqCst);
    }

    pub(crate) fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::SeqCst);
    }

    pub(crate) fn with_inner_mut<R>(&self, f: impl FnOnce(&mut ViewInnerAccess<'_, T>) -> R) -> Option<R> {
        let mut guard = self.inner.write().ok()?;
        let mut access = ViewInnerAccess { inner: &mut *guard };
        Some(f(&mut access))
    }
}

/// Invoke the registered change listener outside any lock.
fn notify<T: Row>(inner: &Arc<RwLock<ViewInner<T>>>) {
    let listener = inner
        .read()
        .ok()
        .and_then(|g| g.on_change.clone());
    if let Some(listener) = listener {
        listener();
    }
}

/// Restricted mutable access used by the persistence module when applying
/// loaded state, so serialization stays next to its wire types.
pub(crate) struct ViewInnerAccess<'a, T: Row> {
    inner: &'a mut ViewInner<T>,
}

impl<T: Row> ViewInnerAccess<'_, T> {
    pub(crate) fn snapshot(
        &self,
    ) -> (
        String,
        usize,
        usize,
        ViewSort,
        &Filters,
    ) {
        (
            self.inner.search.clone(),
            self.inner.page,
            self.inner.page_size,
            self.inner.sort.clone(),
            &self.inner.filters,
        )
    }

    pub(crate) fn apply(
        &mut self,
        search: Option<String>,
        page: Option<usize>,
        page_size: Option<usize>,
        sort: Option<ViewSort>,
        selected: Option<std::collections::HashMap<String, HashSet<String>>>,
        ranges: Option<std::collections::HashMap<String, RangeFilter>>,
    ) {
        if let Some(search) = search {
            self.inner.debounced_search = search.clone();
            self.inner.search = search;
        }
        if let Some(page) = page {
            self.inner.page = page.max(1);
        }
        if let Some(page_size) = page_size {
            self.inner.page_size = page_size.max(1);
        }
        if let Some(sort) = sort {
            self.inner.sort = sort;
        }
        if let Some(selected) = selected {
            for (column, set) in selected {
                self.inner.filters.selected.insert(column, set);
            }
        }
        if let Some(ranges) = ranges {
            for (column, range) in ranges {
                self.inner.filters.ranges.insert(column, range);
            }
        }
        // Columns with no persisted entry keep their all-selected default.
        let columns = self.inner.columns.clone();
        self.inner.filters.seed_defaults(&columns);
    }
}

impl<T: Row> Clone for TableView<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            inner: Arc::clone(&self.inner),
            dirty: Arc::clone(&self.dirty),
            search_debounce: Arc::clone(&self.search_debounce),
        }
    }
}

impl<T: Row> std::fmt::Debug for TableView<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableView")
            .field("name", &self.name)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
