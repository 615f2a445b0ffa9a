mod config;
mod rules;

pub use config::{CategoryThresholds, ScoringConfig, ScoringWeights};

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::domain::{CandidateId, CandidateProfile, Opportunity, OpportunityId};

/// Stateless scorer; identical inputs always produce identical scores.
#[derive(Debug, Clone, Default)]
pub struct ScoreEngine {
    config: ScoringConfig,
}

impl ScoreEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn compute_match(
        &self,
        candidate: &CandidateProfile,
        opportunity: &Opportunity,
    ) -> MatchScore {
        let skill_match = rules::skill_match(candidate, opportunity);
        let interest_match = rules::interest_match(candidate, opportunity);
        let style_match = rules::style_match(&candidate.work_style, &opportunity.work_style);

        let weights = &self.config.weights;
        let overall = (weights.skill * skill_match
            + weights.interest * interest_match
            + weights.style * style_match)
            .clamp(0.0, 100.0);

        MatchScore {
            candidate_id: candidate.id.clone(),
            opportunity_id: opportunity.id.clone(),
            skill_match,
            interest_match,
            style_match,
            overall,
            category: MatchCategory::classify(overall, skill_match, &self.config.thresholds),
        }
    }
}

/// Composite compatibility between one candidate and one opportunity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchScore {
    pub candidate_id: CandidateId,
    pub opportunity_id: OpportunityId,
    pub skill_match: f32,
    pub interest_match: f32,
    pub style_match: f32,
    pub overall: f32,
    pub category: MatchCategory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchCategory {
    PerfectMatch,
    /// Strong fit whose skills already clear the growth band.
    Growth,
    /// Strong fit carried by interest and style while skills trail.
    Stretch,
    ComfortZone,
}

impl MatchCategory {
    pub fn classify(overall: f32, skill_match: f32, thresholds: &CategoryThresholds) -> Self {
        if overall >= thresholds.perfect_match {
            MatchCategory::PerfectMatch
        } else if overall >= thresholds.growth {
            if skill_match >= thresholds.growth {
                MatchCategory::Growth
            } else {
                MatchCategory::Stretch
            }
        } else {
            MatchCategory::ComfortZone
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            MatchCategory::PerfectMatch => "perfect_match",
            MatchCategory::Growth => "growth",
            MatchCategory::Stretch => "stretch",
            MatchCategory::ComfortZone => "comfort_zone",
        }
    }
}

/// Ordering used for candidate rankings: overall desc, skill match desc, candidate id asc.
pub fn ranking_order(left: &MatchScore, right: &MatchScore) -> Ordering {
    right
        .overall
        .total_cmp(&left.overall)
        .then_with(|| right.skill_match.total_cmp(&left.skill_match))
        .then_with(|| left.candidate_id.cmp(&right.candidate_id))
}

pub fn rank(mut scores: Vec<MatchScore>) -> Vec<MatchScore> {
    scores.sort_by(ranking_order);
    scores
}
