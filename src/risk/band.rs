//! Risk score and band classification

use serde::{Deserialize, Serialize};
use std::fmt;

/// Named bucket a risk score falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskBand {
    Low,
    Medium,
    High,
    Extreme,
}

impl RiskBand {
    pub const ALL: [RiskBand; 4] = [
        RiskBand::Low,
        RiskBand::Medium,
        RiskBand::High,
        RiskBand::Extreme,
    ];

    /// Display label, e.g. "High Risk"
    pub fn label(self) -> &'static str {
        match self {
            RiskBand::Low => "Low Risk",
            RiskBand::Medium => "Medium Risk",
            RiskBand::High => "High Risk",
            RiskBand::Extreme => "Extreme Risk",
        }
    }

    /// Single-word keyword, lowercase
    pub fn keyword(self) -> &'static str {
        match self {
            RiskBand::Low => "low",
            RiskBand::Medium => "medium",
            RiskBand::High => "high",
            RiskBand::Extreme => "extreme",
        }
    }

    /// One-based ordinal (Low = 1 .. Extreme = 4)
    pub fn ordinal(self) -> u8 {
        match self {
            RiskBand::Low => 1,
            RiskBand::Medium => 2,
            RiskBand::High => 3,
            RiskBand::Extreme => 4,
        }
    }

    /// Band for a score. Scores 7, 13 and 14 are deliberately unmapped.
    pub fn for_score(score: u32) -> Option<RiskBand> {
        match score {
            1..=6 => Some(RiskBand::Low),
            8..=12 => Some(RiskBand::Medium),
            15..=20 => Some(RiskBand::High),
            21.. => Some(RiskBand::Extreme),
            _ => None,
        }
    }
}

impl fmt::Display for RiskBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Product of severity and probability ordinals; zero when either is unset
pub fn risk_score(severity: u8, probability: u8) -> u32 {
    u32::from(severity) * u32::from(probability)
}

/// Classify a severity/probability pair.
///
/// Either input at zero means "not chosen" and yields no band.
pub fn classify(severity: u8, probability: u8) -> Option<RiskBand> {
    if severity == 0 || probability == 0 {
        return None;
    }
    RiskBand::for_score(risk_score(severity, probability))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_band_table() {
        for score in 1..=6 {
            assert_eq!(RiskBand::for_score(score), Some(RiskBand::Low), "{}", score);
        }
        for score in 8..=12 {
            assert_eq!(RiskBand::for_score(score), Some(RiskBand::Medium), "{}", score);
        }
        for score in 15..=20 {
            assert_eq!(RiskBand::for_score(score), Some(RiskBand::High), "{}", score);
        }
        for score in [21, 25, 100] {
            assert_eq!(RiskBand::for_score(score), Some(RiskBand::Extreme), "{}", score);
        }
    }

    #[test]
    fn test_unmapped_scores() {
        for score in [0, 7, 13, 14] {
            assert_eq!(RiskBand::for_score(score), None, "{}", score);
        }
    }

    #[test]
    fn test_classify_five_by_five_matrix() {
        // Rows: severity 1..=5, columns: probability 1..=5
        use RiskBand::*;
        let expected = [
            [Some(Low), Some(Low), Some(Low), Some(Low), Some(Low)],
            [Some(Low), Some(Low), Some(Low), Some(Medium), Some(Medium)],
            [Some(Low), Some(Low), Some(Medium), Some(Medium), Some(High)],
            [Some(Low), Some(Medium), Some(Medium), Some(High), Some(High)],
            [Some(Low), Some(Medium), Some(High), Some(High), Some(Extreme)],
        ];

        for (s, row) in expected.iter().enumerate() {
            for (p, band) in row.iter().enumerate() {
                let (sev, prob) = (s as u8 + 1, p as u8 + 1);
                assert_eq!(classify(sev, prob), *band, "severity {} probability {}", sev, prob);
            }
        }
    }

    #[test]
    fn test_high_risk_scenario() {
        assert_eq!(risk_score(4, 5), 20);
        assert_eq!(classify(4, 5), Some(RiskBand::High));
        assert_eq!(RiskBand::High.label(), "High Risk");
    }

    #[test]
    fn test_unset_input_yields_nothing() {
        assert_eq!(classify(0, 5), None);
        assert_eq!(classify(3, 0), None);
    }

    proptest! {
        #[test]
        fn prop_classify_is_deterministic_and_symmetric(s in 0u8..=10, p in 0u8..=10) {
            prop_assert_eq!(classify(s, p), classify(s, p));
            prop_assert_eq!(classify(s, p), classify(p, s));
        }

        #[test]
        fn prop_bands_are_monotonic_in_score(a in 1u32..=40, b in 1u32..=40) {
            if let (Some(x), Some(y)) = (RiskBand::for_score(a), RiskBand::for_score(b)) {
                if a <= b {
                    prop_assert!(x <= y);
                }
            }
        }
    }
}
