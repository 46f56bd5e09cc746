//! Per-field record of what hydration did with each persisted value

use serde::Serialize;

/// What happened to one persisted field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FieldOutcome {
    /// Nothing was stored
    Absent,
    /// Stored id found in the live option list
    Validated,
    /// Id unknown (or missing) but the stored name matched an option
    RecoveredByName { name: String },
    /// Stored bare 1–5 ordinal kept because no vocabulary exists
    RawOrdinal,
    /// Stored value could not be resolved and was cleared
    Dropped {
        raw: Option<String>,
        name: Option<String>,
    },
}

impl FieldOutcome {
    pub fn is_dropped(&self) -> bool {
        matches!(self, FieldOutcome::Dropped { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldReport {
    pub field: &'static str,
    #[serde(flatten)]
    pub outcome: FieldOutcome,
}

/// Outcomes for every hydrated field, in hydration order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HydrationReport {
    fields: Vec<FieldReport>,
}

impl HydrationReport {
    pub(crate) fn record(&mut self, field: &'static str, outcome: FieldOutcome) {
        if let FieldOutcome::Dropped { raw, name } = &outcome {
            tracing::debug!(field, ?raw, ?name, "Dropping unresolvable persisted value");
        }
        self.fields.push(FieldReport { field, outcome });
    }

    pub fn fields(&self) -> &[FieldReport] {
        &self.fields
    }

    pub fn outcome(&self, field: &str) -> Option<&FieldOutcome> {
        self.fields
            .iter()
            .find(|f| f.field == field)
            .map(|f| &f.outcome)
    }

    /// Fields whose stored value was discarded
    pub fn dropped(&self) -> impl Iterator<Item = &FieldReport> {
        self.fields.iter().filter(|f| f.outcome.is_dropped())
    }

    pub fn recovered_by_name(&self) -> impl Iterator<Item = &FieldReport> {
        self.fields
            .iter()
            .filter(|f| matches!(f.outcome, FieldOutcome::RecoveredByName { .. }))
    }

    /// True when nothing stored was discarded
    pub fn is_clean(&self) -> bool {
        self.dropped().next().is_none()
    }
}
