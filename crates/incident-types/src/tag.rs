//! Taxonomy tags and the addressing of the two category trees

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// IDENTIFIERS
// ============================================================================

/// Identifier of a taxonomy tag, unique across the whole taxonomy collection.
///
/// Deserializes from a JSON integer or a numeric string (`12`, `"12"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TagId(pub i64);

/// Id as sent by the backend: usually a number, sometimes its string form
#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Number(i64),
    Text(String),
}

impl WireId {
    /// `None` for a blank string
    fn parse<E: serde::de::Error>(self) -> Result<Option<i64>, E> {
        match self {
            WireId::Number(id) => Ok(Some(id)),
            WireId::Text(text) => {
                let text = text.trim();
                if text.is_empty() {
                    return Ok(None);
                }
                text.parse()
                    .map(Some)
                    .map_err(|_| E::custom(format!("invalid id: {:?}", text)))
            }
        }
    }
}

/// Required id accepting a number or a numeric string
fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    WireId::deserialize(deserializer)?
        .parse::<D::Error>()?
        .ok_or_else(|| D::Error::custom("blank id"))
}

/// Optional id; `null`, a missing field and a blank string are all absent
fn deserialize_opt_tag_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<TagId>, D::Error> {
    match Option::<WireId>::deserialize(deserializer)? {
        Some(wire) => Ok(wire.parse::<D::Error>()?.map(TagId)),
        None => Ok(None),
    }
}

impl<'de> Deserialize<'de> for TagId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_id(deserializer).map(TagId)
    }
}

impl TagId {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for TagId {
    fn from(id: i64) -> Self {
        TagId(id)
    }
}

// ============================================================================
// TREE ADDRESSING
// ============================================================================

/// One of the two parallel category hierarchies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tree {
    Primary,
    Secondary,
}

impl Tree {
    pub const ALL: [Tree; 2] = [Tree::Primary, Tree::Secondary];
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tree::Primary => write!(f, "primary"),
            Tree::Secondary => write!(f, "secondary"),
        }
    }
}

/// Depth of a category level inside a tree (root is `One`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Depth {
    One,
    Two,
    Three,
    Four,
}

impl Depth {
    pub const ALL: [Depth; 4] = [Depth::One, Depth::Two, Depth::Three, Depth::Four];

    /// Zero-based position of this depth
    pub fn index(self) -> usize {
        match self {
            Depth::One => 0,
            Depth::Two => 1,
            Depth::Three => 2,
            Depth::Four => 3,
        }
    }

    /// Depth from a one-based level number; `None` outside 1..=4
    pub fn from_level(level: usize) -> Option<Self> {
        match level {
            1 => Some(Depth::One),
            2 => Some(Depth::Two),
            3 => Some(Depth::Three),
            4 => Some(Depth::Four),
            _ => None,
        }
    }

    pub fn parent(self) -> Option<Depth> {
        match self {
            Depth::One => None,
            Depth::Two => Some(Depth::One),
            Depth::Three => Some(Depth::Two),
            Depth::Four => Some(Depth::Three),
        }
    }

    pub fn child(self) -> Option<Depth> {
        match self {
            Depth::One => Some(Depth::Two),
            Depth::Two => Some(Depth::Three),
            Depth::Three => Some(Depth::Four),
            Depth::Four => None,
        }
    }

    /// All depths strictly below this one, nearest first
    pub fn descendants(self) -> &'static [Depth] {
        &Self::ALL[self.index() + 1..]
    }
}

/// Address of one of the eight category levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategorySlot {
    pub tree: Tree,
    pub depth: Depth,
}

impl CategorySlot {
    pub const ALL: [CategorySlot; 8] = [
        CategorySlot::of(Tree::Primary, Depth::One),
        CategorySlot::of(Tree::Primary, Depth::Two),
        CategorySlot::of(Tree::Primary, Depth::Three),
        CategorySlot::of(Tree::Primary, Depth::Four),
        CategorySlot::of(Tree::Secondary, Depth::One),
        CategorySlot::of(Tree::Secondary, Depth::Two),
        CategorySlot::of(Tree::Secondary, Depth::Three),
        CategorySlot::of(Tree::Secondary, Depth::Four),
    ];

    pub const fn of(tree: Tree, depth: Depth) -> Self {
        Self { tree, depth }
    }

    /// Slot from a one-based level number; `None` outside 1..=4
    pub fn new(tree: Tree, level: usize) -> Option<Self> {
        Depth::from_level(level).map(|depth| Self { tree, depth })
    }

    pub fn parent(self) -> Option<CategorySlot> {
        self.depth.parent().map(|depth| Self { depth, ..self })
    }

    pub fn child(self) -> Option<CategorySlot> {
        self.depth.child().map(|depth| Self { depth, ..self })
    }

    /// Tag kind whose tags populate this slot
    pub fn kind(self) -> TagKind {
        TagKind::for_slot(self)
    }

    /// Field name used for this slot on incident reads and updates
    pub fn record_field(self) -> &'static str {
        match (self.tree, self.depth) {
            (Tree::Primary, Depth::One) => "inc_category_id",
            (Tree::Primary, Depth::Two) => "inc_sub_category_id",
            (Tree::Primary, Depth::Three) => "inc_sub_sub_category_id",
            (Tree::Primary, Depth::Four) => "inc_sub_sub_sub_category_id",
            (Tree::Secondary, Depth::One) => "inc_sec_category_id",
            (Tree::Secondary, Depth::Two) => "inc_sec_sub_category_id",
            (Tree::Secondary, Depth::Three) => "inc_sec_sub_sub_category_id",
            (Tree::Secondary, Depth::Four) => "inc_sec_sub_sub_sub_category_id",
        }
    }
}

impl fmt::Display for CategorySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.tree, self.depth.index() + 1)
    }
}

// ============================================================================
// TAG KIND
// ============================================================================

/// Kind of a taxonomy tag, carried on the wire as an opaque `tag_type` token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagKind {
    #[serde(rename = "IncidenceCategory")]
    Category,
    #[serde(rename = "IncidenceSubCategory")]
    SubCategory,
    #[serde(rename = "IncidenceSubSubCategory")]
    SubSubCategory,
    #[serde(rename = "IncidenceSubSubSubCategory")]
    SubSubSubCategory,
    #[serde(rename = "IncidenceSecondaryCategory")]
    SecondaryCategory,
    #[serde(rename = "IncidenceSecondarySubCategory")]
    SecondarySubCategory,
    #[serde(rename = "IncidenceSecondarySubSubCategory")]
    SecondarySubSubCategory,
    #[serde(rename = "IncidenceSecondarySubSubSubCategory")]
    SecondarySubSubSubCategory,
    #[serde(rename = "IncidenceLevel")]
    IncidentLevel,
    #[serde(rename = "IncidenceSeverity")]
    Severity,
    #[serde(rename = "IncidenceProbability")]
    Probability,
    /// Any token this engine does not classify
    #[serde(other)]
    Unknown,
}

impl TagKind {
    /// Every kind the engine partitions on
    pub const KNOWN: [TagKind; 11] = [
        TagKind::Category,
        TagKind::SubCategory,
        TagKind::SubSubCategory,
        TagKind::SubSubSubCategory,
        TagKind::SecondaryCategory,
        TagKind::SecondarySubCategory,
        TagKind::SecondarySubSubCategory,
        TagKind::SecondarySubSubSubCategory,
        TagKind::IncidentLevel,
        TagKind::Severity,
        TagKind::Probability,
    ];

    /// Wire token for this kind
    pub fn as_token(self) -> &'static str {
        match self {
            TagKind::Category => "IncidenceCategory",
            TagKind::SubCategory => "IncidenceSubCategory",
            TagKind::SubSubCategory => "IncidenceSubSubCategory",
            TagKind::SubSubSubCategory => "IncidenceSubSubSubCategory",
            TagKind::SecondaryCategory => "IncidenceSecondaryCategory",
            TagKind::SecondarySubCategory => "IncidenceSecondarySubCategory",
            TagKind::SecondarySubSubCategory => "IncidenceSecondarySubSubCategory",
            TagKind::SecondarySubSubSubCategory => "IncidenceSecondarySubSubSubCategory",
            TagKind::IncidentLevel => "IncidenceLevel",
            TagKind::Severity => "IncidenceSeverity",
            TagKind::Probability => "IncidenceProbability",
            TagKind::Unknown => "Unknown",
        }
    }

    pub fn for_slot(slot: CategorySlot) -> TagKind {
        match (slot.tree, slot.depth) {
            (Tree::Primary, Depth::One) => TagKind::Category,
            (Tree::Primary, Depth::Two) => TagKind::SubCategory,
            (Tree::Primary, Depth::Three) => TagKind::SubSubCategory,
            (Tree::Primary, Depth::Four) => TagKind::SubSubSubCategory,
            (Tree::Secondary, Depth::One) => TagKind::SecondaryCategory,
            (Tree::Secondary, Depth::Two) => TagKind::SecondarySubCategory,
            (Tree::Secondary, Depth::Three) => TagKind::SecondarySubSubCategory,
            (Tree::Secondary, Depth::Four) => TagKind::SecondarySubSubSubCategory,
        }
    }

    /// Category slot for hierarchical kinds, `None` for flat vocabularies
    pub fn category_slot(self) -> Option<CategorySlot> {
        CategorySlot::ALL.into_iter().find(|slot| slot.kind() == self)
    }

    pub fn is_root(self) -> bool {
        matches!(self, TagKind::Category | TagKind::SecondaryCategory)
    }
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

/// Error returned when a `tag_type` token is not recognised
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown tag type: {0}")]
pub struct ParseTagKindError(pub String);

impl FromStr for TagKind {
    type Err = ParseTagKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TagKind::KNOWN
            .into_iter()
            .find(|kind| kind.as_token() == s)
            .ok_or_else(|| ParseTagKindError(s.to_string()))
    }
}

// ============================================================================
// RECORDS
// ============================================================================

/// A single taxonomy record as returned by the taxonomy endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    #[serde(rename = "tag_type")]
    pub kind: TagKind,
    #[serde(default, deserialize_with = "deserialize_opt_tag_id")]
    pub parent_id: Option<TagId>,
}

impl Tag {
    pub fn new(id: i64, name: impl Into<String>, kind: TagKind, parent_id: Option<i64>) -> Self {
        Self {
            id: TagId(id),
            name: name.into(),
            kind,
            parent_id: parent_id.map(TagId),
        }
    }
}

/// Flat `{ id, name }` option, e.g. a building
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupOption {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: i64,
    pub name: String,
}
