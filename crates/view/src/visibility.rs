//! Column visibility: default-visible lookup with explicit overrides.

use rustc_hash::FxHashMap;
use tabula_core::columns::ColumnSpec;

/// Tracks which named columns are shown. Absent key means visible.
#[derive(Debug, Clone, Default)]
pub struct ColumnVisibility {
    overrides: FxHashMap<String, bool>,
}

impl ColumnVisibility {
    pub fn is_visible(&self, column: &str) -> bool {
        self.overrides.get(column).copied().unwrap_or(true)
    }

    /// Idempotent set.
    pub fn set_visible(&mut self, column: &str, visible: bool) {
        self.overrides.insert(column.to_string(), visible);
    }

    pub fn toggle(&mut self, column: &str) {
        let next = !self.is_visible(column);
        self.set_visible(column, next);
    }

    /// Column ids the visibility-toggle ui may offer. Non-hideable columns
    /// (the actions column) are excluded so crud intents stay reachable.
    pub fn toggleable_columns<'a>(&self, columns: &'a [ColumnSpec]) -> Vec<&'a str> {
        columns.iter().filter(|c| c.hideable).map(|c| c.id).collect()
    }
}
