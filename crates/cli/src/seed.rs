//! Seed data for the CLI: a small, plausible trading-admin dataset per
//! entity, applied through the same store path the engine uses.

use chrono::NaiveDate;
use tabula_core::columns::EntityKind;
use tabula_core::{FieldValue, Fields, Record};
use tabula_store::RecordStore;

fn fields(pairs: Vec<(&str, FieldValue)>) -> Fields {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

fn date(y: i32, m: u32, d: u32) -> FieldValue {
    let ts = NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or(0);
    FieldValue::Date(ts)
}

/// Build a store for `kind`, preloaded with mock rows and the entity's
/// display projector.
pub fn seed_store(kind: EntityKind) -> RecordStore {
    let mut store = RecordStore::with_projector(tabula_schema::projector_for(kind));
    store.replace_all(seed_records(kind));
    store.publish();
    store
}

fn seed_records(kind: EntityKind) -> Vec<Record> {
    match kind {
        EntityKind::Asset => vec![
            asset("1", "Bitcoin", "BTC", 8.0, "Active"),
            asset("2", "Ethereum", "ETH", 8.0, "Active"),
            asset("3", "US Dollar", "USD", 2.0, "Active"),
            asset("4", "Euro", "EUR", 2.0, "Active"),
            asset("5", "Litecoin", "LTC", 8.0, "Inactive"),
            asset("6", "Ripple", "XRP", 6.0, "Inactive"),
            asset("7", "Cardano", "ADA", 6.0, "Active"),
            asset("8", "Gold", "XAU", 3.0, "Active"),
        ],
        EntityKind::Symbol => vec![
            symbol("1", "Bitcoin vs Dollar", "BTC", "USD", 2.0, "Active"),
            symbol("2", "Ethereum vs Dollar", "ETH", "USD", 2.0, "Active"),
            symbol("3", "Euro vs Dollar", "EUR", "USD", 5.0, "Active"),
            symbol("4", "Litecoin vs Bitcoin", "LTC", "BTC", 8.0, "Inactive"),
            symbol("5", "Gold vs Dollar", "XAU", "USD", 2.0, "Active"),
        ],
        EntityKind::SwapProfile => vec![
            swap("1", "Crypto Standard", -15.0, -12.0, "Points", "Active"),
            swap("2", "FX Major", -2.5, -1.8, "Points", "Active"),
            swap("3", "Metals", -4.0, -3.2, "Percent", "Active"),
            swap("4", "Legacy", 0.0, 0.0, "Disabled", "Inactive"),
        ],
        EntityKind::Commission => vec![
            commission("1", "Standard", 0.25, "PerDeal", "Active"),
            commission("2", "VIP", 0.1, "PerDeal", "Active"),
            commission("3", "Volume Tiered", 0.05, "PerVolume", "Active"),
            commission("4", "Promo 2025", 0.0, "PerDeal", "Inactive"),
        ],
        EntityKind::CommissionLayer => vec![
            layer("1", "Tier 1", 1.0, 0.0, 0.3),
            layer("2", "Tier 2", 2.0, 100_000.0, 0.2),
            layer("3", "Tier 3", 3.0, 1_000_000.0, 0.1),
        ],
        EntityKind::NotificationSetting => vec![
            notif("1", "Margin Call", "Email", true, date(2025, 1, 6)),
            notif("2", "Stop Out", "Push", true, date(2025, 1, 6)),
            notif("3", "Deposit Received", "Email", true, date(2025, 3, 14)),
            notif("4", "Weekly Digest", "Sms", false, date(2025, 5, 2)),
        ],
    }
}

fn asset(id: &str, name: &str, code: &str, precision: f64, status: &str) -> Record {
    Record::new(
        id,
        fields(vec![
            ("name", FieldValue::Text(name.to_string())),
            ("code", FieldValue::Text(code.to_string())),
            ("precision", FieldValue::Number(precision)),
            ("status", FieldValue::Enum(status.to_string())),
        ]),
    )
}

fn symbol(id: &str, name: &str, base: &str, quote: &str, digits: f64, status: &str) -> Record {
    Record::new(
        id,
        fields(vec![
            ("name", FieldValue::Text(name.to_string())),
            ("base_asset", FieldValue::Text(base.to_string())),
            ("quote_asset", FieldValue::Text(quote.to_string())),
            ("digits", FieldValue::Number(digits)),
            ("status", FieldValue::Enum(status.to_string())),
        ]),
    )
}

fn swap(id: &str, name: &str, long: f64, short: f64, mode: &str, status: &str) -> Record {
    Record::new(
        id,
        fields(vec![
            ("name", FieldValue::Text(name.to_string())),
            ("long_rate", FieldValue::Number(long)),
            ("short_rate", FieldValue::Number(short)),
            ("mode", FieldValue::Enum(mode.to_string())),
            ("status", FieldValue::Enum(status.to_string())),
        ]),
    )
}

fn commission(id: &str, name: &str, rate: f64, mode: &str, status: &str) -> Record {
    Record::new(
        id,
        fields(vec![
            ("name", FieldValue::Text(name.to_string())),
            ("rate", FieldValue::Number(rate)),
            ("mode", FieldValue::Enum(mode.to_string())),
            ("status", FieldValue::Enum(status.to_string())),
        ]),
    )
}

fn layer(id: &str, name: &str, tier: f64, from_volume: f64, rate: f64) -> Record {
    Record::new(
        id,
        fields(vec![
            ("name", FieldValue::Text(name.to_string())),
            ("tier", FieldValue::Number(tier)),
            ("from_volume", FieldValue::Number(from_volume)),
            ("rate", FieldValue::Number(rate)),
        ]),
    )
}

fn notif(id: &str, name: &str, channel: &str, enabled: bool, created: FieldValue) -> Record {
    Record::new(
        id,
        fields(vec![
            ("name", FieldValue::Text(name.to_string())),
            ("channel", FieldValue::Enum(channel.to_string())),
            ("enabled", FieldValue::Bool(enabled)),
            ("created_at", created),
        ]),
    )
}
