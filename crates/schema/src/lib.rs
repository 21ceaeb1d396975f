//! Tabula schema: per-entity field specs, create templates, submit-time
//! validation and built-in display projectors.

#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use smallvec::SmallVec;
use tabula_core::columns::{self, EntityKind};
use tabula_core::{DisplayProjector, FieldValue, Fields, ProjectedFields, ValueType};

/// Validation rules for one editable field of an entity.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub value_type: ValueType,
    pub required: bool,
    /// Inclusive numeric range, `Number` fields only.
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Allowed values, `Enum` fields only.
    pub choices: &'static [&'static str],
}

const fn text(name: &'static str, required: bool) -> FieldSpec {
    FieldSpec { name, value_type: ValueType::Text, required, min: None, max: None, choices: &[] }
}

const fn number(name: &'static str, min: f64, max: f64) -> FieldSpec {
    FieldSpec {
        name,
        value_type: ValueType::Number,
        required: true,
        min: Some(min),
        max: Some(max),
        choices: &[],
    }
}

const fn choice(name: &'static str, choices: &'static [&'static str]) -> FieldSpec {
    FieldSpec { name, value_type: ValueType::Enum, required: true, min: None, max: None, choices }
}

const fn flag(name: &'static str) -> FieldSpec {
    FieldSpec { name, value_type: ValueType::Bool, required: true, min: None, max: None, choices: &[] }
}

pub const STATUS_CHOICES: &[&str] = &["Active", "Inactive"];
pub const SWAP_MODE_CHOICES: &[&str] = &["Points", "Percent", "Disabled"];
pub const COMMISSION_MODE_CHOICES: &[&str] = &["PerDeal", "PerVolume"];
pub const CHANNEL_CHOICES: &[&str] = &["Email", "Sms", "Push"];

static ASSET_FIELDS: &[FieldSpec] = &[
    text(columns::COL_NAME, true),
    text(columns::ASSET_CODE, true),
    number(columns::ASSET_PRECISION, 0.0, 18.0),
    choice(columns::COL_STATUS, STATUS_CHOICES),
];

static SYMBOL_FIELDS: &[FieldSpec] = &[
    text(columns::COL_NAME, true),
    text(columns::SYM_BASE, true),
    text(columns::SYM_QUOTE, true),
    number(columns::SYM_DIGITS, 0.0, 10.0),
    choice(columns::COL_STATUS, STATUS_CHOICES),
];

static SWAP_FIELDS: &[FieldSpec] = &[
    text(columns::COL_NAME, true),
    number(columns::SWAP_LONG_RATE, -100.0, 100.0),
    number(columns::SWAP_SHORT_RATE, -100.0, 100.0),
    choice(columns::SWAP_MODE, SWAP_MODE_CHOICES),
    choice(columns::COL_STATUS, STATUS_CHOICES),
];

static COMMISSION_FIELDS: &[FieldSpec] = &[
    text(columns::COL_NAME, true),
    number(columns::COMM_RATE, 0.0, 100.0),
    choice(columns::COMM_MODE, COMMISSION_MODE_CHOICES),
    choice(columns::COL_STATUS, STATUS_CHOICES),
];

static LAYER_FIELDS: &[FieldSpec] = &[
    text(columns::COL_NAME, true),
    number(columns::LAYER_TIER, 1.0, 100.0),
    number(columns::LAYER_FROM_VOLUME, 0.0, f64::MAX),
    number(columns::LAYER_RATE, 0.0, 100.0),
];

static NOTIF_FIELDS: &[FieldSpec] = &[
    text(columns::COL_NAME, true),
    choice(columns::NOTIF_CHANNEL, CHANNEL_CHOICES),
    flag(columns::NOTIF_ENABLED),
];

/// Editable field specs for an entity, in schema order.
pub fn field_specs_for(kind: EntityKind) -> &'static [FieldSpec] {
    match kind {
        EntityKind::Asset => ASSET_FIELDS,
        EntityKind::Symbol => SYMBOL_FIELDS,
        EntityKind::SwapProfile => SWAP_FIELDS,
        EntityKind::Commission => COMMISSION_FIELDS,
        EntityKind::CommissionLayer => LAYER_FIELDS,
        EntityKind::NotificationSetting => NOTIF_FIELDS,
    }
}

pub fn field_spec(kind: EntityKind, name: &str) -> Option<&'static FieldSpec> {
    field_specs_for(kind).iter().find(|f| f.name == name)
}

/// Default-valued field map used when a create popup opens. Has no id and
/// carries no validation errors; required-field rules only bite at submit.
pub fn default_template(kind: EntityKind) -> Fields {
    let mut fields = Fields::default();
    for spec in field_specs_for(kind) {
        let v = match spec.value_type {
            ValueType::Text => FieldValue::Text(String::new()),
            ValueType::Number => FieldValue::Number(spec.min.unwrap_or(0.0)),
            ValueType::Bool => FieldValue::Bool(false),
            ValueType::Enum => {
                FieldValue::Enum(spec.choices.first().copied().unwrap_or("").to_string())
            }
            ValueType::Date => FieldValue::Date(0),
        };
        fields.insert(spec.name.to_string(), v);
    }
    fields
}

/// Validate a full edit buffer against the entity's field specs.
///
/// Pure: never mutates anything, always runs over the whole buffer. The
/// buffer is submittable iff the returned map is empty. Fields not present
/// in the field specs are ignored (tolerates stale keys after schema changes).
pub fn validate(kind: EntityKind, fields: &Fields) -> BTreeMap<String, String> {
    let mut errors = BTreeMap::new();
    for spec in field_specs_for(kind) {
        let value = fields.get(spec.name);
        match value {
            None => {
                if spec.required {
                    errors.insert(spec.name.to_string(), "required".to_string());
                }
            }
            Some(v) => {
                if let Some(msg) = validate_value(spec, v) {
                    errors.insert(spec.name.to_string(), msg);
                }
            }
        }
    }
    errors
}

fn validate_value(spec: &FieldSpec, value: &FieldValue) -> Option<String> {
    if value.value_type() != spec.value_type {
        return Some(format!("expected {:?} value", spec.value_type));
    }
    match value {
        FieldValue::Text(s) => {
            if spec.required && s.trim().is_empty() {
                return Some("must not be empty".to_string());
            }
        }
        FieldValue::Number(n) => {
            if !n.is_finite() {
                return Some("must be a finite number".to_string());
            }
            if let Some(min) = spec.min {
                if *n < min {
                    return Some(format!("must be at least {}", min));
                }
            }
            if let Some(max) = spec.max {
                if *n > max {
                    return Some(format!("must be at most {}", max));
                }
            }
        }
        FieldValue::Enum(s) => {
            if !spec.choices.contains(&s.as_str()) {
                return Some(format!("must be one of {}", spec.choices.join(", ")));
            }
        }
        FieldValue::Bool(_) | FieldValue::Date(_) => {}
    }
    None
}

/// Return a display projector for entities with derived columns; `None` when
/// every column maps straight to a stored field.
pub fn projector_for(kind: EntityKind) -> Option<Arc<dyn DisplayProjector>> {
    match kind {
        EntityKind::Symbol | EntityKind::Commission => {
            Some(Arc::new(BuiltinProjector { kind }))
        }
        _ => None,
    }
}

struct BuiltinProjector {
    kind: EntityKind,
}

impl BuiltinProjector {
    fn project_symbol(&self, fields: &Fields) -> ProjectedFields {
        let mut out = SmallVec::new();
        let base = fields.get(columns::SYM_BASE).and_then(|v| v.as_str()).unwrap_or("");
        let quote = fields.get(columns::SYM_QUOTE).and_then(|v| v.as_str()).unwrap_or("");
        if !base.is_empty() || !quote.is_empty() {
            out.push((columns::SYM_PAIR.to_string(), format!("{}/{}", base, quote)));
        }
        out
    }

    fn project_commission(&self, fields: &Fields) -> ProjectedFields {
        let mut out = SmallVec::new();
        if let Some(rate) = fields.get(columns::COMM_RATE).and_then(|v| v.as_number()) {
            out.push((columns::COMM_RATE_PCT.to_string(), format!("{}%", rate)));
        }
        out
    }
}

impl DisplayProjector for BuiltinProjector {
    fn project(&self, fields: &Fields) -> ProjectedFields {
        match self.kind {
            EntityKind::Symbol => self.project_symbol(fields),
            EntityKind::Commission => self.project_commission(fields),
            _ => SmallVec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commission_fields(name: &str, rate: f64) -> Fields {
        let mut f = Fields::default();
        f.insert("name".to_string(), FieldValue::Text(name.to_string()));
        f.insert("rate".to_string(), FieldValue::Number(rate));
        f.insert("mode".to_string(), FieldValue::Enum("PerDeal".to_string()));
        f.insert("status".to_string(), FieldValue::Enum("Active".to_string()));
        f
    }

    #[test]
    fn valid_commission_has_no_errors() {
        let errors = validate(EntityKind::Commission, &commission_fields("Standard", 0.25));
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    }

    #[test]
    fn commission_rate_must_stay_within_percent_range() {
        let errors = validate(EntityKind::Commission, &commission_fields("Standard", 250.0));
        assert_eq!(errors.get("rate").map(String::as_str), Some("must be at most 100"));

        let errors = validate(EntityKind::Commission, &commission_fields("Standard", -1.0));
        assert_eq!(errors.get("rate").map(String::as_str), Some("must be at least 0"));
    }

    #[test]
    fn empty_name_is_rejected_at_submit() {
        let errors = validate(EntityKind::Commission, &commission_fields("   ", 1.0));
        assert_eq!(errors.get("name").map(String::as_str), Some("must not be empty"));
    }

    #[test]
    fn missing_required_field_is_reported() {
        let mut f = commission_fields("Standard", 1.0);
        f.remove("mode");
        let errors = validate(EntityKind::Commission, &f);
        assert_eq!(errors.get("mode").map(String::as_str), Some("required"));
    }

    #[test]
    fn unknown_enum_choice_is_rejected() {
        let mut f = commission_fields("Standard", 1.0);
        f.insert("status".to_string(), FieldValue::Enum("Paused".to_string()));
        let errors = validate(EntityKind::Commission, &f);
        assert!(errors.get("status").is_some());
    }

    #[test]
    fn type_mismatch_is_rejected() {
        let mut f = commission_fields("Standard", 1.0);
        f.insert("rate".to_string(), FieldValue::Text("high".to_string()));
        let errors = validate(EntityKind::Commission, &f);
        assert_eq!(errors.get("rate").map(String::as_str), Some("expected Number value"));
    }

    #[test]
    fn stale_buffer_keys_are_ignored() {
        let mut f = commission_fields("Standard", 1.0);
        f.insert("legacy_column".to_string(), FieldValue::Text("x".to_string()));
        assert!(validate(EntityKind::Commission, &f).is_empty());
    }

    #[test]
    fn template_covers_every_spec_field() {
        for kind in EntityKind::ALL {
            let template = default_template(kind);
            for spec in field_specs_for(kind) {
                let v = template.get(spec.name).expect("template field present");
                assert_eq!(v.value_type(), spec.value_type);
            }
        }
    }

    #[test]
    fn symbol_projector_renders_the_pair() {
        let mut f = Fields::default();
        f.insert("base_asset".to_string(), FieldValue::Text("BTC".to_string()));
        f.insert("quote_asset".to_string(), FieldValue::Text("USD".to_string()));
        let p = projector_for(EntityKind::Symbol).expect("symbol projector");
        let out = p.project(&f);
        assert_eq!(out.as_slice(), &[("pair".to_string(), "BTC/USD".to_string())]);
    }

    #[test]
    fn commission_projector_renders_percent() {
        let f = commission_fields("Standard", 0.5);
        let p = projector_for(EntityKind::Commission).expect("commission projector");
        let out = p.project(&f);
        assert_eq!(out.as_slice(), &[("rate_pct".to_string(), "0.5%".to_string())]);
    }
}
