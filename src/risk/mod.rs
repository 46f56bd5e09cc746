//! Risk scoring: severity × probability → band → incident level
//!
//! ```text
//! RiskInputs ──ordinal_of──▶ (sev, prob) ──classify──▶ RiskBand
//!                                                       │
//!                              IncidentLevel vocabulary ─┴─▶ LevelMatch
//! ```

pub mod band;
pub mod level;

pub use band::{classify, risk_score, RiskBand};
pub use level::{resolve_incident_level, LevelMatch, LevelRule, MatchTier, LEVEL_RULES};

use incident_types::{Tag, TagId};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::taxonomy::TaxonomyIndex;

/// Highest ordinal accepted when no vocabulary is configured
pub const MAX_RAW_ORDINAL: u8 = 5;

/// A severity or probability choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum RiskChoice {
    /// Entry of the Severity / Probability vocabulary
    Tag(TagId),
    /// Bare 1–5 ordinal, used when the backend has no vocabulary
    Ordinal(u8),
}

impl fmt::Display for RiskChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskChoice::Tag(id) => write!(f, "{}", id),
            RiskChoice::Ordinal(n) => write!(f, "{}", n),
        }
    }
}

impl RiskChoice {
    /// Value written to the `inc_severity` / `inc_probability` columns
    pub fn stored_value(self) -> i64 {
        match self {
            RiskChoice::Tag(id) => id.get(),
            RiskChoice::Ordinal(n) => i64::from(n),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RiskInputs {
    pub severity: Option<RiskChoice>,
    pub probability: Option<RiskChoice>,
}

/// Ordinal of a choice against its vocabulary.
///
/// A vocabulary tag's ordinal is the first number in its name when that
/// number is 1–5, otherwise its one-based position. Tags missing from the
/// vocabulary, entries past the fifth without a usable number, and raw
/// ordinals outside 1–5 have no ordinal.
pub fn ordinal_of(choice: Option<RiskChoice>, vocabulary: &[&Tag]) -> Option<u8> {
    match choice? {
        RiskChoice::Ordinal(n) if (1..=MAX_RAW_ORDINAL).contains(&n) => Some(n),
        RiskChoice::Ordinal(_) => None,
        RiskChoice::Tag(id) => {
            let position = vocabulary.iter().position(|tag| tag.id == id)?;
            let in_range = |n: &u8| (1..=MAX_RAW_ORDINAL).contains(n);
            let from_name = level::tokens(&vocabulary[position].name)
                .iter()
                .find_map(|t| t.parse::<u8>().ok())
                .filter(in_range);
            from_name.or_else(|| u8::try_from(position + 1).ok().filter(in_range))
        }
    }
}

/// Everything derived from one severity/probability pair
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RiskAssessment {
    pub severity: Option<u8>,
    pub probability: Option<u8>,
    pub score: Option<u32>,
    pub band: Option<RiskBand>,
    pub level: Option<LevelMatch>,
}

impl RiskAssessment {
    /// Whether the incident-level field is driven by the assessment
    pub fn locks_level(&self) -> bool {
        self.level.is_some()
    }
}

/// Computes risk assessments against a loaded taxonomy
#[derive(Debug, Clone)]
pub struct RiskClassifier {
    index: Arc<TaxonomyIndex>,
}

impl RiskClassifier {
    pub fn new(index: Arc<TaxonomyIndex>) -> Self {
        Self { index }
    }

    /// Assess a pair of inputs. Same inputs, same taxonomy, same result.
    pub fn assess(&self, inputs: &RiskInputs) -> RiskAssessment {
        let severity = ordinal_of(inputs.severity, &self.index.severities());
        let probability = ordinal_of(inputs.probability, &self.index.probabilities());

        let (Some(sev), Some(prob)) = (severity, probability) else {
            return RiskAssessment {
                severity,
                probability,
                ..RiskAssessment::default()
            };
        };

        let score = risk_score(sev, prob);
        let band = classify(sev, prob);
        let level = band.and_then(|b| resolve_incident_level(b, &self.index.incident_levels()));

        tracing::debug!(
            severity = sev,
            probability = prob,
            score,
            band = ?band,
            level = ?level.as_ref().map(|l| l.tag),
            "Risk assessed"
        );

        RiskAssessment {
            severity,
            probability,
            score: Some(score),
            band,
            level,
        }
    }
}
