//! Tabula view: derives a displayable, paginated row window from a record
//! snapshot under per-table ephemeral ui state.
//!
//! The projection order is a fixed contract: column filters (AND) → global
//! search (OR across textual fields) → stable multi-key sort → clamp page →
//! slice. Filtering never depends on sort order and pagination always sees
//! the fully filtered+sorted sequence.

#![forbid(unsafe_code)]

use std::cmp::Ordering;
use std::time::Instant;

use metrics::histogram;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tabula_core::columns::ColumnSpec;
use tabula_core::{FieldValue, Record, RecordId, TableSnapshot, ValueType};
use tracing::{debug, warn};

mod visibility;

pub use visibility::ColumnVisibility;

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SortKey {
    pub column: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageState {
    pub index: usize,
    pub size: usize,
}

impl Default for PageState {
    fn default() -> Self {
        Self { index: 0, size: DEFAULT_PAGE_SIZE }
    }
}

/// Row counts after each projection stage, for tests and `--explain` output.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ViewDebugInfo {
    pub total: usize,
    pub after_filters: usize,
    pub after_search: usize,
}

/// Render-ready projection of a snapshot under the current view state.
#[derive(Debug, Clone)]
pub struct DerivedView {
    /// The page window, in filtered+sorted order. Never longer than the page
    /// size; empty iff the filtered sequence is empty.
    pub rows: Vec<Record>,
    pub total_filtered: usize,
    pub page_index: usize,
    pub page_count: usize,
    pub debug: ViewDebugInfo,
}

/// Ephemeral per-table ui state plus the operations that mutate it.
///
/// Created when a table mounts with its column schema; destroyed with it.
/// Rendering code never touches the fields directly.
pub struct ViewState {
    columns: Vec<ColumnSpec>,
    search: String,
    filters: FxHashMap<String, FieldValue>,
    sort: Vec<SortKey>,
    page: PageState,
    visibility: ColumnVisibility,
    selection: FxHashSet<RecordId>,
    /// Page count from the last `compute_view`, used to clamp `set_page`
    /// before the next recomputation.
    last_page_count: usize,
}

impl ViewState {
    pub fn new(columns: Vec<ColumnSpec>) -> Self {
        Self {
            columns,
            search: String::new(),
            filters: FxHashMap::default(),
            sort: Vec::new(),
            page: PageState::default(),
            visibility: ColumnVisibility::default(),
            selection: FxHashSet::default(),
            last_page_count: 0,
        }
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    fn column(&self, id: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.id == id)
    }

    // ---------------- search ----------------

    /// Replace the global search text; a new search invalidates the previous
    /// page window, so the page index resets.
    pub fn set_search_text(&mut self, text: impl Into<String>) {
        self.search = text.into();
        self.page.index = 0;
    }

    pub fn search_text(&self) -> &str {
        &self.search
    }

    // ---------------- column filters ----------------

    /// Set a per-column filter predicate. Unknown or non-filterable column
    /// ids are a no-op, tolerating stale keys after schema changes.
    pub fn set_column_filter(&mut self, column: &str, value: FieldValue) {
        match self.column(column) {
            Some(spec) if spec.filterable => {
                self.filters.insert(column.to_string(), value);
                self.page.index = 0;
            }
            _ => debug!(column, "ignoring filter on unknown or non-filterable column"),
        }
    }

    pub fn clear_column_filter(&mut self, column: &str) {
        if self.filters.remove(column).is_some() {
            self.page.index = 0;
        }
    }

    pub fn active_filters(&self) -> usize {
        self.filters.len()
    }

    // ---------------- sort ----------------

    /// Cycle the primary sort on a column: none → asc → desc → none.
    ///
    /// Keeps a single-key sequence (observed usage is single-column); callers
    /// wanting multi-key order use [`set_sort`](Self::set_sort). Does not
    /// reset the page index.
    pub fn toggle_sort(&mut self, column: &str) {
        match self.column(column) {
            Some(spec) if spec.sortable => {}
            _ => {
                debug!(column, "ignoring sort on unknown or non-sortable column");
                return;
            }
        }
        match self.sort.first() {
            Some(k) if k.column == column => match k.direction {
                SortDirection::Asc => self.sort[0].direction = SortDirection::Desc,
                SortDirection::Desc => self.sort.clear(),
            },
            _ => {
                self.sort =
                    vec![SortKey { column: column.to_string(), direction: SortDirection::Asc }]
            }
        }
    }

    /// Replace the whole sort sequence; keys on unknown or non-sortable
    /// columns are dropped.
    pub fn set_sort(&mut self, keys: Vec<SortKey>) {
        self.sort = keys
            .into_iter()
            .filter(|k| self.columns.iter().any(|c| c.id == k.column && c.sortable))
            .collect();
    }

    pub fn sort_keys(&self) -> &[SortKey] {
        &self.sort
    }

    // ---------------- pagination ----------------

    /// Set the page index, clamped against the last computed page count.
    pub fn set_page(&mut self, index: usize) {
        self.page.index = match self.last_page_count {
            0 => index,
            n => index.min(n - 1),
        };
    }

    /// Set the page size; zero is rejected and leaves the state unchanged.
    pub fn set_page_size(&mut self, size: usize) {
        if size == 0 {
            warn!("rejecting page size 0");
            return;
        }
        self.page.size = size;
        self.page.index = 0;
    }

    pub fn page(&self) -> PageState {
        self.page
    }

    // ---------------- selection ----------------

    pub fn select(&mut self, id: impl Into<RecordId>) {
        self.selection.insert(id.into());
    }

    pub fn deselect(&mut self, id: &str) {
        self.selection.remove(id);
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selection.contains(id)
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Drop selected ids that no longer exist in the snapshot.
    pub fn retain_existing(&mut self, snap: &TableSnapshot) {
        self.selection.retain(|id| snap.records.iter().any(|r| &r.id == id));
    }

    // ---------------- visibility ----------------

    pub fn visibility(&self) -> &ColumnVisibility {
        &self.visibility
    }

    pub fn visibility_mut(&mut self) -> &mut ColumnVisibility {
        &mut self.visibility
    }

    /// Columns to actually render: schema order, hidden ones excluded.
    pub fn visible_columns(&self) -> Vec<&ColumnSpec> {
        self.columns.iter().filter(|c| self.visibility.is_visible(c.id)).collect()
    }

    // ---------------- projection ----------------

    /// Derive the current view from a snapshot.
    ///
    /// Deterministic in `(self, snap)` and free of side effects beyond
    /// clamping the stored page index back into range, so it is safe to
    /// recompute on every state change.
    pub fn compute_view(&mut self, snap: &TableSnapshot) -> DerivedView {
        let t0 = Instant::now();
        let total = snap.records.len();

        // Stage 1: column filters, logical AND.
        let mut kept: Vec<&Record> =
            snap.records.iter().filter(|r| self.matches_filters(r)).collect();
        let after_filters = kept.len();

        // Stage 2: global search, logical OR across textual fields.
        if !self.search.is_empty() {
            let needle = self.search.to_lowercase();
            kept.retain(|r| self.search_haystack_matches(r, &needle));
        }
        let after_search = kept.len();

        // Stage 3: stable multi-key sort.
        if !self.sort.is_empty() {
            let keys: Vec<(&ColumnSpec, SortDirection)> = self
                .sort
                .iter()
                .filter_map(|k| self.column(&k.column).map(|c| (c, k.direction)))
                .collect();
            kept.sort_by(|a, b| {
                for (spec, dir) in keys.iter() {
                    let ord = compare_cells(a, b, spec);
                    let ord = match dir {
                        SortDirection::Asc => ord,
                        SortDirection::Desc => ord.reverse(),
                    };
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            });
        }

        // Stage 4: clamp the page index, then slice the window.
        let total_filtered = kept.len();
        let size = self.page.size;
        let page_count = (total_filtered + size - 1) / size;
        let page_index = if page_count == 0 { 0 } else { self.page.index.min(page_count - 1) };
        self.page.index = page_index;
        self.last_page_count = page_count;

        let start = page_index * size;
        let rows: Vec<Record> =
            kept.iter().skip(start).take(size).map(|r| (*r).clone()).collect();

        histogram!("view_compute_ms", t0.elapsed().as_secs_f64() * 1_000.0);
        DerivedView {
            rows,
            total_filtered,
            page_index,
            page_count,
            debug: ViewDebugInfo { total, after_filters, after_search },
        }
    }

    fn matches_filters(&self, record: &Record) -> bool {
        for (column, wanted) in self.filters.iter() {
            let spec = match self.column(column) {
                Some(s) => s,
                // Stale filter key after a schema change: ignore, don't drop rows.
                None => continue,
            };
            if !cell_matches(record, spec, wanted) {
                return false;
            }
        }
        true
    }

    fn search_haystack_matches(&self, record: &Record, needle: &str) -> bool {
        for value in record.fields.values() {
            if let Some(s) = value.as_str() {
                if s.to_lowercase().contains(needle) {
                    return true;
                }
            }
        }
        for (_, projected) in record.projected.iter() {
            if projected.to_lowercase().contains(needle) {
                return true;
            }
        }
        false
    }
}

/// Rendered cell value for a column: projected display string first, then
/// the stored field.
pub fn cell_value(record: &Record, column: &ColumnSpec) -> Option<String> {
    if let Some(p) = record.projected_value(column.id) {
        return Some(p.to_string());
    }
    record.field(column.id).map(|v| v.display())
}

fn cell_matches(record: &Record, spec: &ColumnSpec, wanted: &FieldValue) -> bool {
    match spec.value_type {
        // Text columns: case-insensitive substring containment.
        ValueType::Text => match cell_value(record, spec) {
            Some(cell) => {
                let want = wanted.display().to_lowercase();
                cell.to_lowercase().contains(&want)
            }
            None => false,
        },
        // Enum and bool columns: exact equality.
        ValueType::Enum => match (record.field(spec.id).and_then(|v| v.as_str()), wanted.as_str()) {
            (Some(cell), Some(want)) => cell == want,
            _ => false,
        },
        ValueType::Bool => matches!(
            (record.field(spec.id), wanted),
            (Some(FieldValue::Bool(a)), FieldValue::Bool(b)) if a == b
        ),
        ValueType::Number => matches!(
            (record.field(spec.id), wanted),
            (Some(FieldValue::Number(a)), FieldValue::Number(b)) if a.total_cmp(b) == Ordering::Equal
        ),
        ValueType::Date => matches!(
            (record.field(spec.id), wanted),
            (Some(FieldValue::Date(a)), FieldValue::Date(b)) if a == b
        ),
    }
}

/// Ordering for one sort key: lexicographic for text, numeric for numbers,
/// chronological for dates, false < true for bools. Missing values sort
/// first; mismatched types fall back to display-string comparison.
///
/// Projected-only columns (no stored field) compare by their rendered cell
/// value, same as filtering does.
fn compare_cells(a: &Record, b: &Record, spec: &ColumnSpec) -> Ordering {
    if let (Some(x), Some(y)) = (a.field(spec.id), b.field(spec.id)) {
        return match (x, y) {
            (FieldValue::Number(m), FieldValue::Number(n)) => m.total_cmp(n),
            (FieldValue::Date(m), FieldValue::Date(n)) => m.cmp(n),
            (FieldValue::Bool(m), FieldValue::Bool(n)) => m.cmp(n),
            (FieldValue::Text(m), FieldValue::Text(n))
            | (FieldValue::Enum(m), FieldValue::Enum(n)) => m.cmp(n),
            _ => x.display().cmp(&y.display()),
        };
    }
    match (cell_value(a, spec), cell_value(b, spec)) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => x.cmp(&y),
    }
}

#[cfg(test)]
mod tests;
