//! Incident edit session
//!
//! Owns the mutable classification state for one incident form, from
//! hydration to submit or cancel. The incident-level field follows the risk
//! assessment: whenever a band resolves to a level the field is locked to it,
//! and a level that was filled in by the assessment is cleared as soon as the
//! assessment stops producing one. Levels chosen by hand (or restored from
//! the record) are only replaced, never cleared, by the assessment.

use incident_types::{CategorySlot, IncidentRecord, IncidentUpdate, Tag, TagId, TriState};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::hydration::{self, HydrationReport};
use crate::risk::{RiskAssessment, RiskChoice, RiskClassifier, RiskInputs};
use crate::selector::{CascadingSelector, CategorySelection};
use crate::taxonomy::TaxonomyIndex;

/// Who put the current value into the incident-level field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelSource {
    /// Chosen by hand or restored from the record; kept when an input is unset
    Manual,
    /// Filled in by the assessment; cleared when the assessment yields no level
    Computed,
}

/// Serializable view of a session's state
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub selection: CategorySelection,
    pub risk: RiskInputs,
    pub assessment: RiskAssessment,
    pub incident_level: Option<TagId>,
    pub level_source: LevelSource,
    pub incident_level_editable: bool,
    pub building: Option<i64>,
    pub property_damage: TriState,
}

/// Classification state of one incident form
#[derive(Debug, Clone)]
pub struct IncidentEditSession {
    id: Uuid,
    index: Arc<TaxonomyIndex>,
    selector: CascadingSelector,
    classifier: RiskClassifier,
    risk: RiskInputs,
    assessment: RiskAssessment,
    incident_level: Option<TagId>,
    level_source: LevelSource,
    building: Option<i64>,
    property_damage: TriState,
    hydration: Option<HydrationReport>,
}

impl IncidentEditSession {
    /// Blank session for a new incident
    pub fn new(index: Arc<TaxonomyIndex>) -> Self {
        Self {
            id: Uuid::new_v4(),
            selector: CascadingSelector::new(index.clone()),
            classifier: RiskClassifier::new(index.clone()),
            index,
            risk: RiskInputs::default(),
            assessment: RiskAssessment::default(),
            incident_level: None,
            level_source: LevelSource::Manual,
            building: None,
            property_damage: TriState::Unset,
            hydration: None,
        }
    }

    /// Session for an existing incident.
    ///
    /// The taxonomy must already be loaded; hydrating against an empty index
    /// clears every field.
    pub fn open(index: Arc<TaxonomyIndex>, record: &IncidentRecord) -> Self {
        let hydrated = hydration::resolve(record, &index);

        let mut session = Self::new(index.clone());
        session.selector = CascadingSelector::with_selection(index, hydrated.selection);
        session.risk = hydrated.risk;
        session.incident_level = hydrated.incident_level;
        session.building = hydrated.building;
        session.property_damage = hydrated.property_damage;
        session.hydration = Some(hydrated.report);
        session.recompute();

        tracing::debug!(
            session = %session.id,
            record = ?record.id.as_ref().map(|r| r.as_str()),
            "Opened incident edit session"
        );
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn taxonomy(&self) -> &TaxonomyIndex {
        &self.index
    }

    // ========================================================================
    // Categories
    // ========================================================================

    pub fn selection(&self) -> &CategorySelection {
        self.selector.selection()
    }

    pub fn options(&self, slot: CategorySlot) -> Vec<&Tag> {
        self.selector.options(slot)
    }

    pub fn is_enabled(&self, slot: CategorySlot) -> bool {
        self.selector.is_enabled(slot)
    }

    pub fn select_category(&mut self, slot: CategorySlot, value: Option<TagId>) -> bool {
        self.selector.select(slot, value)
    }

    // ========================================================================
    // Risk
    // ========================================================================

    pub fn risk(&self) -> &RiskInputs {
        &self.risk
    }

    pub fn assessment(&self) -> &RiskAssessment {
        &self.assessment
    }

    pub fn set_severity(&mut self, choice: Option<RiskChoice>) {
        self.risk.severity = choice;
        self.recompute();
    }

    pub fn set_probability(&mut self, choice: Option<RiskChoice>) {
        self.risk.probability = choice;
        self.recompute();
    }

    pub fn incident_level(&self) -> Option<TagId> {
        self.incident_level
    }

    pub fn level_source(&self) -> LevelSource {
        self.level_source
    }

    /// The field is read-only while the assessment supplies the level
    pub fn incident_level_editable(&self) -> bool {
        !self.assessment.locks_level()
    }

    /// Choose the incident level by hand.
    ///
    /// Refused while the field is locked, or when the id is not in the level
    /// vocabulary.
    pub fn set_incident_level(&mut self, level: Option<TagId>) -> bool {
        if !self.incident_level_editable() {
            return false;
        }
        if let Some(id) = level {
            if !self.index.incident_levels().iter().any(|tag| tag.id == id) {
                return false;
            }
        }
        self.incident_level = level;
        self.level_source = LevelSource::Manual;
        true
    }

    /// Re-run the assessment and apply it to the incident-level field
    fn recompute(&mut self) {
        self.assessment = self.classifier.assess(&self.risk);

        match &self.assessment.level {
            Some(level) => {
                self.incident_level = Some(level.tag);
                self.level_source = LevelSource::Computed;
            }
            None if self.level_source == LevelSource::Computed => {
                self.incident_level = None;
                self.level_source = LevelSource::Manual;
            }
            None => {}
        }
    }

    // ========================================================================
    // Other fields
    // ========================================================================

    pub fn building(&self) -> Option<i64> {
        self.building
    }

    /// Set the building; ids missing from the lookup are refused
    pub fn set_building(&mut self, building: Option<i64>) -> bool {
        if let Some(id) = building {
            if !self.index.buildings().iter().any(|b| b.id == id) {
                return false;
            }
        }
        self.building = building;
        true
    }

    pub fn property_damage(&self) -> TriState {
        self.property_damage
    }

    pub fn set_property_damage(&mut self, value: TriState) {
        self.property_damage = value;
    }

    /// Hydration outcome, for sessions opened from a record
    pub fn hydration_report(&self) -> Option<&HydrationReport> {
        self.hydration.as_ref()
    }

    // ========================================================================
    // Output
    // ========================================================================

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            selection: self.selection().clone(),
            risk: self.risk,
            assessment: self.assessment.clone(),
            incident_level: self.incident_level,
            level_source: self.level_source,
            incident_level_editable: self.incident_level_editable(),
            building: self.building,
            property_damage: self.property_damage,
        }
    }

    /// Update payload carrying the current state under the read field names
    pub fn to_update(&self) -> IncidentUpdate {
        let mut update = IncidentUpdate::default();
        for (slot, value) in self.selection().iter() {
            update.set_category(slot, value);
        }
        update.inc_level_id = self.incident_level;
        update.inc_severity = self.risk.severity.map(RiskChoice::stored_value);
        update.inc_probability = self.risk.probability.map(RiskChoice::stored_value);
        update.building_id = self.building;
        update.property_damage = self.property_damage.as_option();
        update
    }

    /// End the session, producing the update to send
    pub fn submit(self) -> IncidentUpdate {
        let update = self.to_update();
        tracing::debug!(session = %self.id, "Submitted incident edit session");
        update
    }

    /// End the session without producing an update
    pub fn cancel(self) {
        tracing::debug!(session = %self.id, "Cancelled incident edit session");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::{MatchTier, RiskBand};
    use incident_types::{Depth, LookupOption, RawRef, TagKind, Tree};

    fn index() -> Arc<TaxonomyIndex> {
        Arc::new(TaxonomyIndex::build(
            vec![
                Tag::new(1, "Safety", TagKind::Category, None),
                Tag::new(10, "Slip", TagKind::SubCategory, Some(1)),
                Tag::new(11, "Fall", TagKind::SubCategory, Some(1)),
                Tag::new(20, "Wet floor", TagKind::SubSubCategory, Some(10)),
                Tag::new(90, "Low", TagKind::IncidentLevel, None),
                Tag::new(91, "Medium", TagKind::IncidentLevel, None),
                Tag::new(92, "High", TagKind::IncidentLevel, None),
                Tag::new(93, "Extreme", TagKind::IncidentLevel, None),
            ],
            vec![LookupOption {
                id: 7,
                name: "Tower A".to_string(),
            }],
        ))
    }

    fn ordinal(n: u8) -> Option<RiskChoice> {
        Some(RiskChoice::Ordinal(n))
    }

    #[test]
    fn test_severity_and_probability_lock_the_level() {
        let mut session = IncidentEditSession::new(index());
        assert!(session.incident_level_editable());

        session.set_severity(ordinal(4));
        assert!(session.incident_level_editable());
        assert_eq!(session.incident_level(), None);

        session.set_probability(ordinal(5));
        assert_eq!(session.assessment().band, Some(RiskBand::High));
        assert_eq!(session.incident_level(), Some(TagId(92)));
        assert_eq!(session.level_source(), LevelSource::Computed);
        assert!(!session.incident_level_editable());
        assert!(!session.set_incident_level(Some(TagId(90))));
    }

    #[test]
    fn test_unsetting_an_input_clears_computed_level() {
        let mut session = IncidentEditSession::new(index());
        session.set_severity(ordinal(4));
        session.set_probability(ordinal(5));
        assert!(session.incident_level().is_some());

        session.set_severity(None);
        assert_eq!(session.assessment().band, None);
        assert_eq!(session.incident_level(), None);
        assert!(session.incident_level_editable());
    }

    #[test]
    fn test_manual_level_survives_incomplete_inputs() {
        let mut session = IncidentEditSession::new(index());
        assert!(session.set_incident_level(Some(TagId(91))));
        session.set_severity(ordinal(2));
        assert_eq!(session.incident_level(), Some(TagId(91)));
        assert_eq!(session.level_source(), LevelSource::Manual);

        // Completing the pair overrides the manual choice
        session.set_probability(ordinal(1));
        assert_eq!(session.incident_level(), Some(TagId(90)));
        assert_eq!(
            session.assessment().level.as_ref().map(|l| l.tier),
            Some(MatchTier::Keyword)
        );
    }

    #[test]
    fn test_unsetting_an_input_keeps_a_chosen_level() {
        let mut session = IncidentEditSession::new(index());
        session.set_severity(ordinal(3));
        assert!(session.set_incident_level(Some(TagId(92))));

        session.set_severity(None);
        assert_eq!(session.incident_level(), Some(TagId(92)));
        assert_eq!(session.level_source(), LevelSource::Manual);
        assert!(session.incident_level_editable());
    }

    #[test]
    fn test_unsetting_an_input_keeps_a_restored_level() {
        let record = IncidentRecord {
            inc_level_id: Some(RawRef::new("91")),
            inc_severity: Some(RawRef::new("2")),
            ..IncidentRecord::default()
        };
        let mut session = IncidentEditSession::open(index(), &record);
        assert_eq!(session.incident_level(), Some(TagId(91)));

        session.set_severity(None);
        assert_eq!(session.incident_level(), Some(TagId(91)));
        assert_eq!(session.level_source(), LevelSource::Manual);
    }

    #[test]
    fn test_set_incident_level_rejects_unknown_ids() {
        let mut session = IncidentEditSession::new(index());
        assert!(!session.set_incident_level(Some(TagId(1))));
        assert!(session.set_incident_level(None));
    }

    #[test]
    fn test_open_hydrates_and_recomputes() {
        let record = IncidentRecord {
            inc_category_id: Some(RawRef::new("1")),
            inc_sub_category_id: Some(RawRef::new("10")),
            inc_level_id: Some(RawRef::new("90")),
            inc_severity: Some(RawRef::new("5")),
            inc_probability: Some(RawRef::new("5")),
            building_id: Some(RawRef::new("7")),
            property_damage: Some(serde_json::json!("true")),
            ..IncidentRecord::default()
        };

        let session = IncidentEditSession::open(index(), &record);
        let primary = |depth| CategorySlot::of(Tree::Primary, depth);

        assert_eq!(session.selection().get(primary(Depth::Two)), Some(TagId(10)));
        let names: Vec<_> = session
            .options(primary(Depth::Three))
            .iter()
            .map(|t| t.name.clone())
            .collect();
        assert_eq!(names, vec!["Wet floor"]);

        // Stored "Low" is replaced by the computed Extreme level
        assert_eq!(session.assessment().band, Some(RiskBand::Extreme));
        assert_eq!(session.incident_level(), Some(TagId(93)));
        assert_eq!(session.building(), Some(7));
        assert_eq!(session.property_damage(), TriState::True);
        assert!(session.hydration_report().is_some_and(|r| r.is_clean()));
    }

    #[test]
    fn test_open_keeps_stored_level_without_inputs() {
        let record = IncidentRecord {
            inc_level_id: Some(RawRef::new("91")),
            ..IncidentRecord::default()
        };
        let session = IncidentEditSession::open(index(), &record);
        assert_eq!(session.incident_level(), Some(TagId(91)));
        assert!(session.incident_level_editable());
    }

    #[test]
    fn test_submit_maps_back_to_record_fields() {
        let mut session = IncidentEditSession::new(index());
        session.select_category(CategorySlot::of(Tree::Primary, Depth::One), Some(TagId(1)));
        session.select_category(CategorySlot::of(Tree::Primary, Depth::Two), Some(TagId(11)));
        session.set_severity(ordinal(1));
        session.set_probability(ordinal(3));
        assert!(session.set_building(Some(7)));
        assert!(!session.set_building(Some(8)));
        session.set_property_damage(TriState::False);

        let update = session.submit();
        assert_eq!(update.inc_category_id, Some(TagId(1)));
        assert_eq!(update.inc_sub_category_id, Some(TagId(11)));
        assert_eq!(update.inc_sub_sub_category_id, None);
        assert_eq!(update.inc_level_id, Some(TagId(90)));
        assert_eq!(update.inc_severity, Some(1));
        assert_eq!(update.inc_probability, Some(3));
        assert_eq!(update.building_id, Some(7));
        assert_eq!(update.property_damage, Some(false));
    }

    #[test]
    fn test_snapshot_reflects_state() {
        let mut session = IncidentEditSession::new(index());
        session.set_severity(ordinal(3));
        session.set_probability(ordinal(3));
        let snapshot = session.snapshot();
        assert_eq!(snapshot.session_id, session.id());
        assert_eq!(snapshot.assessment.score, Some(9));
        assert!(!snapshot.incident_level_editable);
        session.cancel();
    }
}
