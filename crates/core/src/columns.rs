//! Built-in column sets for the trading-admin entities.
//!
//! This module provides:
//! - Stable column ids + specs (labels, widths, semantic types)
//! - A registry mapping each entity kind to its column set
//! - The fixed actions column that can never be hidden

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::ValueType;

/// The table entities the admin dashboard manages.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Asset,
    Symbol,
    SwapProfile,
    Commission,
    CommissionLayer,
    NotificationSetting,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Asset,
        EntityKind::Symbol,
        EntityKind::SwapProfile,
        EntityKind::Commission,
        EntityKind::CommissionLayer,
        EntityKind::NotificationSetting,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Asset => "asset",
            EntityKind::Symbol => "symbol",
            EntityKind::SwapProfile => "swap-profile",
            EntityKind::Commission => "commission",
            EntityKind::CommissionLayer => "commission-layer",
            EntityKind::NotificationSetting => "notification-setting",
        }
    }

    pub fn parse(s: &str) -> Option<EntityKind> {
        EntityKind::ALL.iter().copied().find(|k| k.as_str() == s)
    }
}

/// One column of a table schema. `width` is a render hint only.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnSpec {
    pub id: &'static str,
    pub label: &'static str,
    pub width: f32,
    pub value_type: ValueType,
    pub sortable: bool,
    pub filterable: bool,
    pub hideable: bool,
}

/// Id of the row-actions column. It is the only path to crud intents, so it
/// is never hideable, sortable or filterable.
pub const COL_ACTIONS: &str = "actions";

// ---------------- Column ids (stable) ----------------
pub const COL_ID: &str = "id";
pub const COL_NAME: &str = "name";
pub const COL_STATUS: &str = "status";

// Assets
pub const ASSET_CODE: &str = "code";
pub const ASSET_PRECISION: &str = "precision";

// Symbols
pub const SYM_BASE: &str = "base_asset";
pub const SYM_QUOTE: &str = "quote_asset";
pub const SYM_PAIR: &str = "pair";
pub const SYM_DIGITS: &str = "digits";

// Swap profiles
pub const SWAP_LONG_RATE: &str = "long_rate";
pub const SWAP_SHORT_RATE: &str = "short_rate";
pub const SWAP_MODE: &str = "mode";

// Commissions
pub const COMM_RATE: &str = "rate";
pub const COMM_RATE_PCT: &str = "rate_pct";
pub const COMM_MODE: &str = "mode";

// Commission layers
pub const LAYER_TIER: &str = "tier";
pub const LAYER_FROM_VOLUME: &str = "from_volume";
pub const LAYER_RATE: &str = "rate";

// Notification settings
pub const NOTIF_CHANNEL: &str = "channel";
pub const NOTIF_ENABLED: &str = "enabled";
pub const NOTIF_CREATED: &str = "created_at";

fn col(id: &'static str, label: &'static str, width: f32, value_type: ValueType) -> ColumnSpec {
    ColumnSpec { id, label, width, value_type, sortable: true, filterable: true, hideable: true }
}

fn actions_col() -> ColumnSpec {
    ColumnSpec {
        id: COL_ACTIONS,
        label: "Actions",
        width: 90.0,
        value_type: ValueType::Text,
        sortable: false,
        filterable: false,
        hideable: false,
    }
}

/// Return the full column set for an entity, in display order, ending with
/// the actions column.
pub fn builtin_columns_for(kind: EntityKind) -> Vec<ColumnSpec> {
    let mut cols: Vec<ColumnSpec> = vec![col(COL_ID, "ID", 80.0, ValueType::Text)];

    match kind {
        EntityKind::Asset => {
            cols.push(col(COL_NAME, "Name", 160.0, ValueType::Text));
            cols.push(col(ASSET_CODE, "Code", 80.0, ValueType::Text));
            cols.push(col(ASSET_PRECISION, "Precision", 90.0, ValueType::Number));
            cols.push(col(COL_STATUS, "Status", 100.0, ValueType::Enum));
        }
        EntityKind::Symbol => {
            cols.push(col(COL_NAME, "Name", 160.0, ValueType::Text));
            cols.push(col(SYM_BASE, "Base", 80.0, ValueType::Text));
            cols.push(col(SYM_QUOTE, "Quote", 80.0, ValueType::Text));
            cols.push(col(SYM_PAIR, "Pair", 110.0, ValueType::Text));
            cols.push(col(SYM_DIGITS, "Digits", 70.0, ValueType::Number));
            cols.push(col(COL_STATUS, "Status", 100.0, ValueType::Enum));
        }
        EntityKind::SwapProfile => {
            cols.push(col(COL_NAME, "Name", 160.0, ValueType::Text));
            cols.push(col(SWAP_LONG_RATE, "Long Rate", 90.0, ValueType::Number));
            cols.push(col(SWAP_SHORT_RATE, "Short Rate", 90.0, ValueType::Number));
            cols.push(col(SWAP_MODE, "Mode", 100.0, ValueType::Enum));
            cols.push(col(COL_STATUS, "Status", 100.0, ValueType::Enum));
        }
        EntityKind::Commission => {
            cols.push(col(COL_NAME, "Name", 160.0, ValueType::Text));
            cols.push(col(COMM_RATE, "Rate", 80.0, ValueType::Number));
            cols.push(col(COMM_RATE_PCT, "Rate %", 80.0, ValueType::Text));
            cols.push(col(COMM_MODE, "Mode", 100.0, ValueType::Enum));
            cols.push(col(COL_STATUS, "Status", 100.0, ValueType::Enum));
        }
        EntityKind::CommissionLayer => {
            cols.push(col(COL_NAME, "Name", 160.0, ValueType::Text));
            cols.push(col(LAYER_TIER, "Tier", 60.0, ValueType::Number));
            cols.push(col(LAYER_FROM_VOLUME, "From Volume", 110.0, ValueType::Number));
            cols.push(col(LAYER_RATE, "Rate", 80.0, ValueType::Number));
        }
        EntityKind::NotificationSetting => {
            cols.push(col(COL_NAME, "Name", 160.0, ValueType::Text));
            cols.push(col(NOTIF_CHANNEL, "Channel", 100.0, ValueType::Enum));
            cols.push(col(NOTIF_ENABLED, "Enabled", 80.0, ValueType::Bool));
            cols.push(col(NOTIF_CREATED, "Created", 110.0, ValueType::Date));
        }
    }

    cols.push(actions_col());
    cols
}
