//! Incident read and update payloads
//!
//! Persisted incidents reference taxonomy tags loosely: ids may arrive as
//! numbers or strings, legacy rows carry bare category names, and boolean-like
//! columns are stored as the strings `"true"`/`"false"`. These types keep the
//! stored values as-is; normalization happens during hydration.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

use crate::tag::{CategorySlot, Depth, TagId, Tree};

/// A stored reference in its string form (`12`, `"12"`, `"Slip and trip"`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RawRef(String);

impl RawRef {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Normalize a JSON scalar; `null`, blank strings and structured values are absent
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(Self(trimmed.to_string()))
                }
            }
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Self(i.to_string()))
                } else {
                    n.as_f64().map(|f| {
                        if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                            Self((f as i64).to_string())
                        } else {
                            Self(f.to_string())
                        }
                    })
                }
            }
            Value::Bool(b) => Some(Self(b.to_string())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Integer view of the reference, if it is one
    pub fn as_int(&self) -> Option<i64> {
        self.0.parse().ok()
    }
}

impl fmt::Display for RawRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RawRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        RawRef::from_value(&value)
            .ok_or_else(|| serde::de::Error::custom(format!("not a scalar reference: {}", value)))
    }
}

/// Lenient `Option<RawRef>` field deserializer
pub fn deserialize_opt_ref<'de, D>(deserializer: D) -> Result<Option<RawRef>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(RawRef::from_value))
}

/// Three-state boolean: explicit true, explicit false, or never answered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriState {
    True,
    False,
    #[default]
    Unset,
}

impl TriState {
    pub fn as_option(self) -> Option<bool> {
        match self {
            TriState::True => Some(true),
            TriState::False => Some(false),
            TriState::Unset => None,
        }
    }
}

impl From<Option<bool>> for TriState {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => TriState::True,
            Some(false) => TriState::False,
            None => TriState::Unset,
        }
    }
}

// ============================================================================
// INCIDENT READ
// ============================================================================

/// Incident as returned by the incident read endpoint
///
/// Only the fields the triage engine hydrates are modelled; everything else
/// the endpoint returns is ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncidentRecord {
    #[serde(default, deserialize_with = "deserialize_opt_ref")]
    pub id: Option<RawRef>,

    #[serde(default, deserialize_with = "deserialize_opt_ref")]
    pub inc_category_id: Option<RawRef>,
    #[serde(default, deserialize_with = "deserialize_opt_ref")]
    pub inc_sub_category_id: Option<RawRef>,
    #[serde(default, deserialize_with = "deserialize_opt_ref")]
    pub inc_sub_sub_category_id: Option<RawRef>,
    #[serde(default, deserialize_with = "deserialize_opt_ref")]
    pub inc_sub_sub_sub_category_id: Option<RawRef>,
    #[serde(default)]
    pub sub_sub_sub_category_name: Option<String>,

    #[serde(default, deserialize_with = "deserialize_opt_ref")]
    pub inc_sec_category_id: Option<RawRef>,
    #[serde(default, deserialize_with = "deserialize_opt_ref")]
    pub inc_sec_sub_category_id: Option<RawRef>,
    #[serde(default, deserialize_with = "deserialize_opt_ref")]
    pub inc_sec_sub_sub_category_id: Option<RawRef>,
    #[serde(default, deserialize_with = "deserialize_opt_ref")]
    pub inc_sec_sub_sub_sub_category_id: Option<RawRef>,
    #[serde(default)]
    pub sec_sub_sub_sub_category_name: Option<String>,

    #[serde(default, deserialize_with = "deserialize_opt_ref")]
    pub inc_level_id: Option<RawRef>,
    #[serde(default, deserialize_with = "deserialize_opt_ref")]
    pub inc_severity: Option<RawRef>,
    #[serde(default, deserialize_with = "deserialize_opt_ref")]
    pub inc_probability: Option<RawRef>,

    #[serde(default, deserialize_with = "deserialize_opt_ref")]
    pub building_id: Option<RawRef>,

    /// Stored as `"true"`/`"false"`, occasionally as a JSON boolean
    #[serde(default)]
    pub property_damage: Option<Value>,
}

impl IncidentRecord {
    /// Stored id reference for a category slot
    pub fn category_ref(&self, slot: CategorySlot) -> Option<&RawRef> {
        match (slot.tree, slot.depth) {
            (Tree::Primary, Depth::One) => self.inc_category_id.as_ref(),
            (Tree::Primary, Depth::Two) => self.inc_sub_category_id.as_ref(),
            (Tree::Primary, Depth::Three) => self.inc_sub_sub_category_id.as_ref(),
            (Tree::Primary, Depth::Four) => self.inc_sub_sub_sub_category_id.as_ref(),
            (Tree::Secondary, Depth::One) => self.inc_sec_category_id.as_ref(),
            (Tree::Secondary, Depth::Two) => self.inc_sec_sub_category_id.as_ref(),
            (Tree::Secondary, Depth::Three) => self.inc_sec_sub_sub_category_id.as_ref(),
            (Tree::Secondary, Depth::Four) => self.inc_sec_sub_sub_sub_category_id.as_ref(),
        }
    }

    /// Stored display name for a category slot (deepest levels only)
    pub fn category_name(&self, slot: CategorySlot) -> Option<&str> {
        let name = match (slot.tree, slot.depth) {
            (Tree::Primary, Depth::Four) => self.sub_sub_sub_category_name.as_deref(),
            (Tree::Secondary, Depth::Four) => self.sec_sub_sub_sub_category_name.as_deref(),
            _ => None,
        };
        name.map(str::trim).filter(|n| !n.is_empty())
    }

    pub fn set_category_ref(&mut self, slot: CategorySlot, value: Option<RawRef>) {
        let field = match (slot.tree, slot.depth) {
            (Tree::Primary, Depth::One) => &mut self.inc_category_id,
            (Tree::Primary, Depth::Two) => &mut self.inc_sub_category_id,
            (Tree::Primary, Depth::Three) => &mut self.inc_sub_sub_category_id,
            (Tree::Primary, Depth::Four) => &mut self.inc_sub_sub_sub_category_id,
            (Tree::Secondary, Depth::One) => &mut self.inc_sec_category_id,
            (Tree::Secondary, Depth::Two) => &mut self.inc_sec_sub_category_id,
            (Tree::Secondary, Depth::Three) => &mut self.inc_sec_sub_sub_category_id,
            (Tree::Secondary, Depth::Four) => &mut self.inc_sec_sub_sub_sub_category_id,
        };
        *field = value;
    }
}

// ============================================================================
// INCIDENT UPDATE
// ============================================================================

/// Classification part of the incident update payload
///
/// Field names match [`IncidentRecord`] so a hydrated selection writes back
/// onto the columns it was read from. `None` serializes as `null`, which
/// clears the column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentUpdate {
    pub inc_category_id: Option<TagId>,
    pub inc_sub_category_id: Option<TagId>,
    pub inc_sub_sub_category_id: Option<TagId>,
    pub inc_sub_sub_sub_category_id: Option<TagId>,
    pub inc_sec_category_id: Option<TagId>,
    pub inc_sec_sub_category_id: Option<TagId>,
    pub inc_sec_sub_sub_category_id: Option<TagId>,
    pub inc_sec_sub_sub_sub_category_id: Option<TagId>,
    pub inc_level_id: Option<TagId>,
    /// Tag id, or the raw ordinal when no severity vocabulary exists
    pub inc_severity: Option<i64>,
    pub inc_probability: Option<i64>,
    pub building_id: Option<i64>,
    pub property_damage: Option<bool>,
}

impl IncidentUpdate {
    pub fn category(&self, slot: CategorySlot) -> Option<TagId> {
        match (slot.tree, slot.depth) {
            (Tree::Primary, Depth::One) => self.inc_category_id,
            (Tree::Primary, Depth::Two) => self.inc_sub_category_id,
            (Tree::Primary, Depth::Three) => self.inc_sub_sub_category_id,
            (Tree::Primary, Depth::Four) => self.inc_sub_sub_sub_category_id,
            (Tree::Secondary, Depth::One) => self.inc_sec_category_id,
            (Tree::Secondary, Depth::Two) => self.inc_sec_sub_category_id,
            (Tree::Secondary, Depth::Three) => self.inc_sec_sub_sub_category_id,
            (Tree::Secondary, Depth::Four) => self.inc_sec_sub_sub_sub_category_id,
        }
    }

    pub fn set_category(&mut self, slot: CategorySlot, id: Option<TagId>) {
        let field = match (slot.tree, slot.depth) {
            (Tree::Primary, Depth::One) => &mut self.inc_category_id,
            (Tree::Primary, Depth::Two) => &mut self.inc_sub_category_id,
            (Tree::Primary, Depth::Three) => &mut self.inc_sub_sub_category_id,
            (Tree::Primary, Depth::Four) => &mut self.inc_sub_sub_sub_category_id,
            (Tree::Secondary, Depth::One) => &mut self.inc_sec_category_id,
            (Tree::Secondary, Depth::Two) => &mut self.inc_sec_sub_category_id,
            (Tree::Secondary, Depth::Three) => &mut self.inc_sec_sub_sub_category_id,
            (Tree::Secondary, Depth::Four) => &mut self.inc_sec_sub_sub_sub_category_id,
        };
        *field = id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_raw_ref_normalizes_scalars() {
        assert_eq!(RawRef::from_value(&json!(12)), Some(RawRef::new("12")));
        assert_eq!(RawRef::from_value(&json!("12")), Some(RawRef::new("12")));
        assert_eq!(RawRef::from_value(&json!(12.0)), Some(RawRef::new("12")));
        assert_eq!(RawRef::from_value(&json!("  ")), None);
        assert_eq!(RawRef::from_value(&json!(null)), None);
        assert_eq!(RawRef::from_value(&json!({"id": 1})), None);
    }

    #[test]
    fn test_record_accepts_mixed_id_shapes() {
        let record: IncidentRecord = serde_json::from_value(json!({
            "id": 501,
            "inc_category_id": 3,
            "inc_sub_category_id": "12",
            "inc_sub_sub_category_id": "",
            "inc_sub_sub_sub_category_id": null,
            "sub_sub_sub_category_name": "Wet floor",
            "inc_sec_category_id": "Environmental",
            "property_damage": "true",
            "unrelated_column": [1, 2, 3]
        }))
        .unwrap();

        let primary = |depth| CategorySlot::of(Tree::Primary, depth);
        assert_eq!(record.category_ref(primary(Depth::One)).map(RawRef::as_str), Some("3"));
        assert_eq!(record.category_ref(primary(Depth::Two)).map(RawRef::as_str), Some("12"));
        assert_eq!(record.category_ref(primary(Depth::Three)), None);
        assert_eq!(record.category_ref(primary(Depth::Four)), None);
        assert_eq!(record.category_name(primary(Depth::Four)), Some("Wet floor"));
        assert_eq!(record.category_name(primary(Depth::Two)), None);
        assert_eq!(
            record
                .category_ref(CategorySlot::of(Tree::Secondary, Depth::One))
                .map(RawRef::as_str),
            Some("Environmental")
        );
    }

    #[test]
    fn test_update_serializes_cleared_fields_as_null() {
        let mut update = IncidentUpdate::default();
        update.set_category(CategorySlot::of(Tree::Secondary, Depth::Two), Some(TagId(40)));

        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value["inc_sec_sub_category_id"], json!(40));
        assert_eq!(value["inc_category_id"], json!(null));
        assert_eq!(value["inc_severity"], json!(null));
        assert_eq!(
            update.category(CategorySlot::of(Tree::Secondary, Depth::Two)),
            Some(TagId(40))
        );
    }
}
