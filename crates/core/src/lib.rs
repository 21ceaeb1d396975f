//! Tabula core types shared by every table-engine crate.

#![forbid(unsafe_code)]

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

pub mod columns;

/// Stable unique identifier of a record within one table.
pub type RecordId = String;

/// Semantic type of a column/field, used to pick filter and sort behavior.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ValueType {
    Text,
    Number,
    Bool,
    Enum,
    Date,
}

/// One typed field value on a record.
///
/// `Date` carries epoch seconds; rendering is left to callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Enum(String),
    Date(i64),
}

impl FieldValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            FieldValue::Text(_) => ValueType::Text,
            FieldValue::Number(_) => ValueType::Number,
            FieldValue::Bool(_) => ValueType::Bool,
            FieldValue::Enum(_) => ValueType::Enum,
            FieldValue::Date(_) => ValueType::Date,
        }
    }

    /// Render the value for display, search haystacks and type-mismatch sorts.
    pub fn display(&self) -> String {
        match self {
            FieldValue::Text(s) | FieldValue::Enum(s) => s.clone(),
            FieldValue::Number(n) => {
                if n.fract() == 0.0 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Date(ts) => ts.to_string(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) | FieldValue::Enum(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// Field name → value mapping; insertion order is irrelevant, the column
/// schema drives display order.
pub type Fields = FxHashMap<String, FieldValue>;

/// Projected display-only fields: `(column id, rendered string)`.
pub type ProjectedFields = SmallVec<[(String, String); 4]>;

/// One domain record (asset, symbol, swap profile, commission, ...).
///
/// Records are immutable once handed to a view; edits go through a working
/// copy staged by the crud orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub fields: Fields,
    /// Derived display strings computed from other fields (e.g. a symbol's
    /// base/quote pair). Filled by a [`DisplayProjector`]; may be empty.
    pub projected: ProjectedFields,
}

impl Record {
    pub fn new(id: impl Into<RecordId>, fields: Fields) -> Self {
        Self { id: id.into(), fields, projected: SmallVec::new() }
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Projected value for a column id, if the projector produced one.
    pub fn projected_value(&self, column: &str) -> Option<&str> {
        self.projected
            .iter()
            .find(|(id, _)| id == column)
            .map(|(_, v)| v.as_str())
    }
}

/// Immutable snapshot of one table's records at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TableSnapshot {
    pub epoch: u64,
    pub records: Vec<Record>,
}

/// A committed change request directed at a record store.
///
/// Tagged variants let the consuming store handle each case exhaustively,
/// with no runtime payload inspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Mutation {
    /// Insert a new record; the store assigns the id.
    Create { fields: Fields },
    /// Replace only the named fields on the record matching `id`.
    Update { id: RecordId, fields: Fields },
    /// Remove the record matching `id`.
    Delete { id: RecordId },
}

/// Computes projected display fields from a record's raw fields.
pub trait DisplayProjector: Send + Sync {
    fn project(&self, fields: &Fields) -> ProjectedFields;
}

/// Errors a persistent backing store could surface through `apply`.
///
/// The in-memory store never returns these; the orchestrator maps them to
/// error notifications while preserving the edit buffer.
#[derive(Debug, thiserror::Error, Serialize, Deserialize)]
pub enum StoreError {
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("backend: {0}")]
    Backend(String),
}

pub mod prelude {
    pub use super::{
        DisplayProjector, FieldValue, Fields, Mutation, ProjectedFields, Record, RecordId,
        StoreError, TableSnapshot, ValueType,
    };
    pub use super::columns::{builtin_columns_for, ColumnSpec, EntityKind};
}
