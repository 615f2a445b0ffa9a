use serde::{Deserialize, Serialize};

/// Blend applied to the three component scores when building `overall`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub skill: f32,
    pub interest: f32,
    pub style: f32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            skill: 0.60,
            interest: 0.25,
            style: 0.15,
        }
    }
}

/// Lower bounds (inclusive) of the category bands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryThresholds {
    pub perfect_match: f32,
    pub growth: f32,
}

impl Default for CategoryThresholds {
    fn default() -> Self {
        Self {
            perfect_match: 85.0,
            growth: 70.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub weights: ScoringWeights,
    pub thresholds: CategoryThresholds,
}
