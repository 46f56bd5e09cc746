//! Resolution of a risk band to an incident-level vocabulary entry
//!
//! Level vocabularies are free text maintained per tenant ("Level 3",
//! "High Risk", "HIGH", "3 - Major"...). Resolution walks a fixed list of
//! match tiers; within a tier the vocabulary is scanned in source order and
//! the first hit wins. The last two tiers are positional, so any non-empty
//! vocabulary always produces a level.

use incident_types::{Tag, TagId};
use serde::Serialize;

use super::band::RiskBand;

/// How a level was matched, strongest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    /// Name equals the band label ("High Risk" / "HighRisk")
    ExactLabel,
    /// Name contains the band label
    LabelContained,
    /// Name contains the band keyword as a word ("High")
    Keyword,
    /// Name contains "level N"
    LevelCue,
    /// Name contains the bare ordinal N as a token
    OrdinalToken,
    /// Vocabulary entry at the band's position
    Position,
    /// First vocabulary entry
    FirstAvailable,
}

impl MatchTier {
    pub const ALL: [MatchTier; 7] = [
        MatchTier::ExactLabel,
        MatchTier::LabelContained,
        MatchTier::Keyword,
        MatchTier::LevelCue,
        MatchTier::OrdinalToken,
        MatchTier::Position,
        MatchTier::FirstAvailable,
    ];

    /// Tiers that inspect names rather than positions
    pub fn is_name_based(self) -> bool {
        !matches!(self, MatchTier::Position | MatchTier::FirstAvailable)
    }
}

/// Declarative matching rule for one band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelRule {
    pub band: RiskBand,
    /// Lowercase label with the internal space
    pub label: &'static str,
    /// Lowercase label without the internal space
    pub compact_label: &'static str,
    pub keyword: &'static str,
    pub ordinal: u8,
    /// Zero-based vocabulary index used by the positional tier
    pub position: usize,
}

/// One rule per band
pub const LEVEL_RULES: [LevelRule; 4] = [
    LevelRule {
        band: RiskBand::Low,
        label: "low risk",
        compact_label: "lowrisk",
        keyword: "low",
        ordinal: 1,
        position: 0,
    },
    LevelRule {
        band: RiskBand::Medium,
        label: "medium risk",
        compact_label: "mediumrisk",
        keyword: "medium",
        ordinal: 2,
        position: 1,
    },
    LevelRule {
        band: RiskBand::High,
        label: "high risk",
        compact_label: "highrisk",
        keyword: "high",
        ordinal: 3,
        position: 2,
    },
    LevelRule {
        band: RiskBand::Extreme,
        label: "extreme risk",
        compact_label: "extremerisk",
        keyword: "extreme",
        ordinal: 4,
        position: 3,
    },
];

impl LevelRule {
    pub fn for_band(band: RiskBand) -> &'static LevelRule {
        match band {
            RiskBand::Low => &LEVEL_RULES[0],
            RiskBand::Medium => &LEVEL_RULES[1],
            RiskBand::High => &LEVEL_RULES[2],
            RiskBand::Extreme => &LEVEL_RULES[3],
        }
    }

    /// Whether a level name satisfies a name-based tier
    pub fn name_matches(&self, tier: MatchTier, name: &str) -> bool {
        let lower = name.trim().to_lowercase();
        let ordinal = self.ordinal.to_string();

        match tier {
            MatchTier::ExactLabel => lower == self.label || lower == self.compact_label,
            MatchTier::LabelContained => {
                lower.contains(self.label) || lower.contains(self.compact_label)
            }
            MatchTier::Keyword => tokens(&lower).iter().any(|t| t == self.keyword),
            MatchTier::LevelCue => tokens(&lower)
                .windows(2)
                .any(|pair| pair[0] == "level" && pair[1] == ordinal),
            MatchTier::OrdinalToken => tokens(&lower).iter().any(|t| *t == ordinal),
            MatchTier::Position | MatchTier::FirstAvailable => false,
        }
    }
}

/// Incident level chosen for a band
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelMatch {
    pub tag: TagId,
    pub name: String,
    pub tier: MatchTier,
}

/// Pick the incident level for `band` from `vocabulary`.
///
/// Returns `None` only for an empty vocabulary.
pub fn resolve_incident_level(band: RiskBand, vocabulary: &[&Tag]) -> Option<LevelMatch> {
    let rule = LevelRule::for_band(band);

    for tier in MatchTier::ALL {
        let hit = match tier {
            MatchTier::Position => vocabulary.get(rule.position).copied(),
            MatchTier::FirstAvailable => vocabulary.first().copied(),
            _ => vocabulary
                .iter()
                .copied()
                .find(|tag| rule.name_matches(tier, &tag.name)),
        };

        if let Some(tag) = hit {
            return Some(LevelMatch {
                tag: tag.id,
                name: tag.name.clone(),
                tier,
            });
        }
    }

    None
}

/// Split into lowercase runs of letters and runs of digits.
///
/// "Level-3 (High)" -> ["level", "3", "high"]; "L3" -> ["l", "3"]
pub(crate) fn tokens(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut current_is_digit = false;

    for c in text.chars() {
        if c.is_alphanumeric() {
            let is_digit = c.is_ascii_digit();
            if !current.is_empty() && is_digit != current_is_digit {
                out.push(std::mem::take(&mut current));
            }
            current_is_digit = is_digit;
            current.extend(c.to_lowercase());
        } else if !current.is_empty() {
            out.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        out.push(current);
    }

    out
}
