//! Indexed, immutable view of a loaded taxonomy
//!
//! Tags are kept in an arena in source order. Two side indexes are built once:
//! kind -> arena positions, and (kind, parent) -> arena positions. Every lookup
//! the selector and resolver perform is a hash probe followed by an ordered
//! walk of a short position list.

use chrono::{DateTime, Utc};
use incident_types::{CategorySlot, LookupOption, Tag, TagId, TagKind, Tree};
use std::collections::HashMap;

/// A category tag whose parent reference does not match the tree layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralIssue {
    /// Non-root category without a parent reference
    MissingParentRef { tag: TagId, kind: TagKind },
    /// Root category that carries a parent reference
    RootWithParent { tag: TagId, parent: TagId },
    /// Parent id not present in the taxonomy
    DanglingParent { tag: TagId, parent: TagId },
    /// Parent exists but is not one level above in the same tree
    ParentKindMismatch {
        tag: TagId,
        parent: TagId,
        expected: TagKind,
        found: TagKind,
    },
}

/// Taxonomy partitioned by kind with O(1) child lookup
#[derive(Debug, Clone)]
pub struct TaxonomyIndex {
    nodes: Vec<Tag>,
    by_id: HashMap<TagId, usize>,
    by_kind: HashMap<TagKind, Vec<usize>>,
    children: HashMap<(TagKind, TagId), Vec<usize>>,
    buildings: Vec<LookupOption>,
    loaded_at: DateTime<Utc>,
}

impl Default for TaxonomyIndex {
    fn default() -> Self {
        Self::empty()
    }
}

impl TaxonomyIndex {
    /// Index with no tags and no lookups
    pub fn empty() -> Self {
        Self {
            nodes: Vec::new(),
            by_id: HashMap::new(),
            by_kind: HashMap::new(),
            children: HashMap::new(),
            buildings: Vec::new(),
            loaded_at: Utc::now(),
        }
    }

    /// Build the index from fetched tags and the buildings lookup.
    ///
    /// Several fetch results may be chained into `tags`; the first occurrence
    /// of an id wins. Tags of unknown kind are dropped.
    pub fn build(tags: impl IntoIterator<Item = Tag>, buildings: Vec<LookupOption>) -> Self {
        let mut index = Self::empty();
        let mut duplicates = 0usize;
        let mut unknown = 0usize;

        for tag in tags {
            if tag.kind == TagKind::Unknown {
                unknown += 1;
                continue;
            }
            if index.by_id.contains_key(&tag.id) {
                duplicates += 1;
                tracing::debug!(id = %tag.id, name = %tag.name, "Skipping duplicate tag id");
                continue;
            }

            let pos = index.nodes.len();
            index.by_id.insert(tag.id, pos);
            index.by_kind.entry(tag.kind).or_default().push(pos);
            if let Some(parent) = tag.parent_id {
                index.children.entry((tag.kind, parent)).or_default().push(pos);
            }
            index.nodes.push(tag);
        }

        index.buildings = buildings;

        if duplicates > 0 || unknown > 0 {
            tracing::warn!(duplicates, unknown, "Taxonomy contained skipped tags");
        }

        index
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn get(&self, id: TagId) -> Option<&Tag> {
        self.by_id.get(&id).map(|&pos| &self.nodes[pos])
    }

    /// All tags of a kind, in source order
    pub fn of_kind(&self, kind: TagKind) -> Vec<&Tag> {
        self.positions(self.by_kind.get(&kind))
    }

    /// Tags of `kind` whose parent is `parent`, in source order.
    ///
    /// An absent parent yields nothing, including for root kinds.
    pub fn children_of(&self, kind: TagKind, parent: Option<TagId>) -> Vec<&Tag> {
        match parent {
            Some(parent) => self.positions(self.children.get(&(kind, parent))),
            None => Vec::new(),
        }
    }

    /// Root categories of a tree
    pub fn roots(&self, tree: Tree) -> Vec<&Tag> {
        self.of_kind(CategorySlot::of(tree, incident_types::Depth::One).kind())
    }

    pub fn incident_levels(&self) -> Vec<&Tag> {
        self.of_kind(TagKind::IncidentLevel)
    }

    pub fn severities(&self) -> Vec<&Tag> {
        self.of_kind(TagKind::Severity)
    }

    pub fn probabilities(&self) -> Vec<&Tag> {
        self.of_kind(TagKind::Probability)
    }

    pub fn buildings(&self) -> &[LookupOption] {
        &self.buildings
    }

    /// Count of tags per known kind, for load logging
    pub fn kind_counts(&self) -> Vec<(TagKind, usize)> {
        TagKind::KNOWN
            .into_iter()
            .map(|kind| (kind, self.by_kind.get(&kind).map_or(0, Vec::len)))
            .collect()
    }

    /// Category tags that break the one-level-up, same-tree parent layout.
    ///
    /// Diagnostic only; lookups never consult it.
    pub fn structural_issues(&self) -> Vec<StructuralIssue> {
        let mut issues = Vec::new();

        for tag in &self.nodes {
            let Some(slot) = tag.kind.category_slot() else {
                continue;
            };

            match (slot.parent(), tag.parent_id) {
                (None, None) => {}
                (None, Some(parent)) => issues.push(StructuralIssue::RootWithParent {
                    tag: tag.id,
                    parent,
                }),
                (Some(_), None) => issues.push(StructuralIssue::MissingParentRef {
                    tag: tag.id,
                    kind: tag.kind,
                }),
                (Some(parent_slot), Some(parent)) => match self.get(parent) {
                    None => issues.push(StructuralIssue::DanglingParent {
                        tag: tag.id,
                        parent,
                    }),
                    Some(p) if p.kind != parent_slot.kind() => {
                        issues.push(StructuralIssue::ParentKindMismatch {
                            tag: tag.id,
                            parent,
                            expected: parent_slot.kind(),
                            found: p.kind,
                        })
                    }
                    Some(_) => {}
                },
            }
        }

        issues
    }

    fn positions(&self, positions: Option<&Vec<usize>>) -> Vec<&Tag> {
        positions
            .map(|ps| ps.iter().map(|&pos| &self.nodes[pos]).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names<'a>(tags: &[&'a Tag]) -> Vec<&'a str> {
        tags.iter().map(|t| t.name.as_str()).collect()
    }

    fn sample() -> TaxonomyIndex {
        TaxonomyIndex::build(
            vec![
                Tag::new(1, "Safety", TagKind::Category, None),
                Tag::new(2, "Security", TagKind::Category, None),
                Tag::new(10, "Slip", TagKind::SubCategory, Some(1)),
                Tag::new(11, "Burglary", TagKind::SubCategory, Some(2)),
                Tag::new(12, "Fall", TagKind::SubCategory, Some(1)),
                Tag::new(30, "Spill", TagKind::SecondaryCategory, None),
                Tag::new(31, "Oil", TagKind::SecondarySubCategory, Some(30)),
                Tag::new(90, "Level 1", TagKind::IncidentLevel, None),
                Tag::new(91, "Minor", TagKind::Severity, None),
                Tag::new(92, "Rare", TagKind::Probability, None),
            ],
            vec![LookupOption {
                id: 7,
                name: "Tower A".to_string(),
            }],
        )
    }

    #[test]
    fn test_partitions_by_kind_in_source_order() {
        let index = sample();
        assert_eq!(index.len(), 10);
        assert_eq!(names(&index.roots(Tree::Primary)), vec!["Safety", "Security"]);
        assert_eq!(names(&index.roots(Tree::Secondary)), vec!["Spill"]);
        assert_eq!(names(&index.incident_levels()), vec!["Level 1"]);
        assert_eq!(names(&index.severities()), vec!["Minor"]);
        assert_eq!(names(&index.probabilities()), vec!["Rare"]);
        assert_eq!(index.buildings().len(), 1);
    }

    #[test]
    fn test_children_of_keeps_insertion_order() {
        let index = sample();
        let children = index.children_of(TagKind::SubCategory, Some(TagId(1)));
        assert_eq!(names(&children), vec!["Slip", "Fall"]);
        assert!(children.iter().all(|t| t.parent_id == Some(TagId(1))));
    }

    #[test]
    fn test_children_of_absent_parent_is_empty() {
        let index = sample();
        assert!(index.children_of(TagKind::SubCategory, None).is_empty());
        assert!(index.children_of(TagKind::Category, None).is_empty());
        assert!(index
            .children_of(TagKind::SubCategory, Some(TagId(999)))
            .is_empty());
    }

    #[test]
    fn test_children_are_scoped_by_kind() {
        let index = sample();
        // Secondary children of a primary id are not primary children
        assert!(index
            .children_of(TagKind::SecondarySubCategory, Some(TagId(1)))
            .is_empty());
        assert_eq!(
            names(&index.children_of(TagKind::SecondarySubCategory, Some(TagId(30)))),
            vec!["Oil"]
        );
    }

    #[test]
    fn test_duplicate_ids_first_wins_and_unknown_dropped() {
        let index = TaxonomyIndex::build(
            vec![
                Tag::new(1, "Safety", TagKind::Category, None),
                Tag::new(1, "Safety (copy)", TagKind::Category, None),
                Tag::new(5, "Chiller", TagKind::Unknown, None),
            ],
            Vec::new(),
        );
        assert_eq!(index.len(), 1);
        assert_eq!(index.get(TagId(1)).map(|t| t.name.as_str()), Some("Safety"));
        assert!(index.get(TagId(5)).is_none());
    }

    #[test]
    fn test_empty_index() {
        let index = TaxonomyIndex::empty();
        assert!(index.is_empty());
        assert!(index.roots(Tree::Primary).is_empty());
        assert!(index.kind_counts().iter().all(|(_, n)| *n == 0));
    }

    #[test]
    fn test_structural_issues() {
        let index = TaxonomyIndex::build(
            vec![
                Tag::new(1, "Safety", TagKind::Category, None),
                Tag::new(2, "Odd root", TagKind::Category, Some(1)),
                Tag::new(10, "Orphan", TagKind::SubCategory, None),
                Tag::new(11, "Dangling", TagKind::SubCategory, Some(77)),
                Tag::new(12, "Skips a level", TagKind::SubSubCategory, Some(1)),
                Tag::new(13, "Fine", TagKind::SubCategory, Some(1)),
            ],
            Vec::new(),
        );

        assert_eq!(
            index.structural_issues(),
            vec![
                StructuralIssue::RootWithParent {
                    tag: TagId(2),
                    parent: TagId(1)
                },
                StructuralIssue::MissingParentRef {
                    tag: TagId(10),
                    kind: TagKind::SubCategory
                },
                StructuralIssue::DanglingParent {
                    tag: TagId(11),
                    parent: TagId(77)
                },
                StructuralIssue::ParentKindMismatch {
                    tag: TagId(12),
                    parent: TagId(1),
                    expected: TagKind::SubCategory,
                    found: TagKind::Category
                },
            ]
        );
    }
}
