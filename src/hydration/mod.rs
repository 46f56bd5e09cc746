//! Hydration of persisted incident records into selection state
//!
//! A stored incident may predate the taxonomy currently served: ids can point
//! at deleted tags, legacy rows carry names instead of ids, and boolean
//! columns are strings. Hydration is best-effort. Every field is resolved on
//! its own (id first, then name), anything unresolvable becomes empty, and
//! the [`HydrationReport`] records which fields were discarded.
//!
//! Fields are not checked against their resolved parent, so a record can
//! hydrate a valid child under an empty parent.

pub mod report;

pub use report::{FieldOutcome, FieldReport, HydrationReport};

use incident_types::{CategorySlot, IncidentRecord, LookupOption, RawRef, Tag, TagId, TriState};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::risk::{RiskChoice, RiskInputs, MAX_RAW_ORDINAL};
use crate::selector::CategorySelection;
use crate::taxonomy::TaxonomyIndex;

/// Validated selection state recovered from a record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Hydrated {
    pub selection: CategorySelection,
    pub risk: RiskInputs,
    pub incident_level: Option<TagId>,
    pub building: Option<i64>,
    pub property_damage: TriState,
    pub report: HydrationReport,
}

/// Option whose id stringifies to the stored value
pub fn validate(value: Option<&RawRef>, options: &[&Tag]) -> Option<TagId> {
    let raw = value?.as_str();
    options
        .iter()
        .find(|tag| tag.id.to_string() == raw)
        .map(|tag| tag.id)
}

/// Option whose name equals `name`, ignoring case and surrounding space
pub fn lookup_by_name(name: &str, options: &[&Tag]) -> Option<TagId> {
    let wanted = name.trim().to_lowercase();
    if wanted.is_empty() {
        return None;
    }
    options
        .iter()
        .find(|tag| tag.name.trim().to_lowercase() == wanted)
        .map(|tag| tag.id)
}

/// Normalize a boolean-like stored value
pub fn normalize_flag(value: Option<&Value>) -> Option<TriState> {
    match value {
        None | Some(Value::Null) => Some(TriState::Unset),
        Some(Value::Bool(b)) => Some(TriState::from(Some(*b))),
        Some(Value::String(s)) => match s.trim().to_lowercase().as_str() {
            "true" => Some(TriState::True),
            "false" => Some(TriState::False),
            "" => Some(TriState::Unset),
            _ => None,
        },
        Some(Value::Number(n)) => match n.as_i64() {
            Some(1) => Some(TriState::True),
            Some(0) => Some(TriState::False),
            _ => None,
        },
        Some(_) => None,
    }
}

/// Name to try when the id does not validate: the explicit name column, or
/// the stored value itself when it is not numeric
fn name_candidate<'a>(raw: Option<&'a RawRef>, name: Option<&'a str>) -> Option<&'a str> {
    name.or_else(|| raw.filter(|r| r.as_int().is_none()).map(RawRef::as_str))
}

fn resolve_tag(
    report: &mut HydrationReport,
    field: &'static str,
    raw: Option<&RawRef>,
    name: Option<&str>,
    options: &[&Tag],
) -> Option<TagId> {
    if raw.is_none() && name.is_none() {
        report.record(field, FieldOutcome::Absent);
        return None;
    }

    if let Some(id) = validate(raw, options) {
        report.record(field, FieldOutcome::Validated);
        return Some(id);
    }

    let candidate = name_candidate(raw, name);
    if let Some(id) = candidate.and_then(|n| lookup_by_name(n, options)) {
        report.record(
            field,
            FieldOutcome::RecoveredByName {
                name: candidate.unwrap_or_default().to_string(),
            },
        );
        return Some(id);
    }

    report.record(
        field,
        FieldOutcome::Dropped {
            raw: raw.map(|r| r.to_string()),
            name: name.map(str::to_string),
        },
    );
    None
}

fn resolve_risk_choice(
    report: &mut HydrationReport,
    field: &'static str,
    raw: Option<&RawRef>,
    vocabulary: &[&Tag],
) -> Option<RiskChoice> {
    if !vocabulary.is_empty() {
        return resolve_tag(report, field, raw, None, vocabulary).map(RiskChoice::Tag);
    }

    let Some(raw) = raw else {
        report.record(field, FieldOutcome::Absent);
        return None;
    };

    match raw.as_int() {
        Some(n) if (1..=i64::from(MAX_RAW_ORDINAL)).contains(&n) => {
            report.record(field, FieldOutcome::RawOrdinal);
            u8::try_from(n).ok().map(RiskChoice::Ordinal)
        }
        _ => {
            report.record(
                field,
                FieldOutcome::Dropped {
                    raw: Some(raw.to_string()),
                    name: None,
                },
            );
            None
        }
    }
}

fn resolve_building(
    report: &mut HydrationReport,
    raw: Option<&RawRef>,
    buildings: &[LookupOption],
) -> Option<i64> {
    const FIELD: &str = "building_id";

    let Some(raw) = raw else {
        report.record(FIELD, FieldOutcome::Absent);
        return None;
    };

    if let Some(b) = buildings.iter().find(|b| b.id.to_string() == raw.as_str()) {
        report.record(FIELD, FieldOutcome::Validated);
        return Some(b.id);
    }

    let wanted = raw.as_str().to_lowercase();
    if raw.as_int().is_none() {
        if let Some(b) = buildings
            .iter()
            .find(|b| b.name.trim().to_lowercase() == wanted)
        {
            report.record(
                FIELD,
                FieldOutcome::RecoveredByName {
                    name: raw.to_string(),
                },
            );
            return Some(b.id);
        }
    }

    report.record(
        FIELD,
        FieldOutcome::Dropped {
            raw: Some(raw.to_string()),
            name: None,
        },
    );
    None
}

/// Hydrate `record` against `index`. Never fails.
pub fn resolve(record: &IncidentRecord, index: &TaxonomyIndex) -> Hydrated {
    let mut report = HydrationReport::default();
    let mut selection = CategorySelection::default();

    for slot in CategorySlot::ALL {
        let options = index.of_kind(slot.kind());
        let id = resolve_tag(
            &mut report,
            slot.record_field(),
            record.category_ref(slot),
            record.category_name(slot),
            &options,
        );
        selection.set(slot, id);
    }

    let incident_level = resolve_tag(
        &mut report,
        "inc_level_id",
        record.inc_level_id.as_ref(),
        None,
        &index.incident_levels(),
    );

    let risk = RiskInputs {
        severity: resolve_risk_choice(
            &mut report,
            "inc_severity",
            record.inc_severity.as_ref(),
            &index.severities(),
        ),
        probability: resolve_risk_choice(
            &mut report,
            "inc_probability",
            record.inc_probability.as_ref(),
            &index.probabilities(),
        ),
    };

    let building = resolve_building(&mut report, record.building_id.as_ref(), index.buildings());

    let property_damage = match normalize_flag(record.property_damage.as_ref()) {
        Some(state) => {
            let outcome = if state == TriState::Unset {
                FieldOutcome::Absent
            } else {
                FieldOutcome::Validated
            };
            report.record("property_damage", outcome);
            state
        }
        None => {
            report.record(
                "property_damage",
                FieldOutcome::Dropped {
                    raw: record.property_damage.as_ref().map(Value::to_string),
                    name: None,
                },
            );
            TriState::Unset
        }
    };

    let dropped = report.dropped().count();
    if dropped > 0 {
        tracing::info!(
            record = ?record.id.as_ref().map(RawRef::as_str),
            dropped,
            "Hydrated incident with discarded fields"
        );
    }

    Hydrated {
        selection,
        risk,
        incident_level,
        building,
        property_damage,
        report,
    }
}

/// Resolver bound to one loaded taxonomy
#[derive(Debug, Clone)]
pub struct PersistedSelectionResolver {
    index: Arc<TaxonomyIndex>,
}

impl PersistedSelectionResolver {
    pub fn new(index: Arc<TaxonomyIndex>) -> Self {
        Self { index }
    }

    pub fn resolve(&self, record: &IncidentRecord) -> Hydrated {
        resolve(record, &self.index)
    }
}
