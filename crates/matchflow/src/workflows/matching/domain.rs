use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of axes in a work-style vector.
pub const WORK_STYLE_DIMENSIONS: usize = 7;

/// Upper bound for every vector component.
pub const MAX_VECTOR_SCORE: u8 = 100;

/// Identifier wrapper for candidates held by the profile store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CandidateId(pub String);

/// Identifier wrapper for catalog opportunities.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OpportunityId(pub String);

/// Identifier wrapper for opportunity owners.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OwnerId(pub String);

/// Identifier wrapper for submitted applications.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

macro_rules! display_id {
    ($($name:ident),+) => {
        $(impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        })+
    };
}

display_id!(CandidateId, OpportunityId, OwnerId, ApplicationId);

/// Ordered proficiency ladder; comparisons follow declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Proficiency {
    Beginner,
    Intermediate,
    Advanced,
}

impl Proficiency {
    pub const fn label(self) -> &'static str {
        match self {
            Proficiency::Beginner => "beginner",
            Proficiency::Intermediate => "intermediate",
            Proficiency::Advanced => "advanced",
        }
    }
}

/// A skill an opportunity asks for, with the minimum level and its weight in the skill score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillRequirement {
    pub skill: String,
    pub minimum: Proficiency,
    pub weight: u32,
}

/// Fixed interest areas used for both candidate tags and opportunity focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterestArea {
    Technology,
    Design,
    Business,
    Science,
    Arts,
    Community,
    Education,
    Health,
}

impl InterestArea {
    pub const ALL: [InterestArea; 8] = [
        InterestArea::Technology,
        InterestArea::Design,
        InterestArea::Business,
        InterestArea::Science,
        InterestArea::Arts,
        InterestArea::Community,
        InterestArea::Education,
        InterestArea::Health,
    ];
}

/// Seven-axis work-style vector, each axis scored 0-100.
///
/// Axes in order: collaboration, autonomy, structure, pace, communication,
/// creativity, detail orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkStyle(pub [u8; WORK_STYLE_DIMENSIONS]);

impl WorkStyle {
    pub const AXES: [&'static str; WORK_STYLE_DIMENSIONS] = [
        "collaboration",
        "autonomy",
        "structure",
        "pace",
        "communication",
        "creativity",
        "detail_orientation",
    ];

    pub fn balanced() -> Self {
        Self([50; WORK_STYLE_DIMENSIONS])
    }

    pub fn scores(&self) -> &[u8; WORK_STYLE_DIMENSIONS] {
        &self.0
    }
}

impl Default for WorkStyle {
    fn default() -> Self {
        Self::balanced()
    }
}

/// Roles a candidate account can carry; `Minor` forces guardian consent regardless of age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateRole {
    Student,
    Minor,
}

/// Skill, interest, and style snapshot owned by the external profile store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub id: CandidateId,
    pub skills: BTreeMap<String, Proficiency>,
    pub interests: BTreeSet<InterestArea>,
    pub work_style: WorkStyle,
    #[serde(default)]
    pub age: Option<u8>,
    #[serde(default)]
    pub guardian_contact: Option<String>,
    #[serde(default)]
    pub roles: BTreeSet<CandidateRole>,
}

impl CandidateProfile {
    pub fn proficiency(&self, skill: &str) -> Option<Proficiency> {
        self.skills
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(skill))
            .map(|(_, level)| *level)
    }

    pub fn has_role(&self, role: CandidateRole) -> bool {
        self.roles.contains(&role)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityStatus {
    Open,
    Closed,
}

/// Catalog entry with admission counters guarded by `version`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opportunity {
    pub id: OpportunityId,
    pub owner: OwnerId,
    pub title: String,
    pub required_skills: Vec<SkillRequirement>,
    pub interests: BTreeSet<InterestArea>,
    pub work_style: WorkStyle,
    pub capacity: u32,
    pub current_accepted: u32,
    #[serde(default)]
    pub minimum_age: Option<u8>,
    pub status: OpportunityStatus,
    #[serde(default)]
    pub xp_reward: u32,
    pub version: u64,
}

impl Opportunity {
    pub fn is_open(&self) -> bool {
        self.status == OpportunityStatus::Open
    }

    pub fn is_full(&self) -> bool {
        self.current_accepted >= self.capacity
    }

    pub fn seats_remaining(&self) -> u32 {
        self.capacity.saturating_sub(self.current_accepted)
    }
}

/// Guardian sign-off captured for a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentRecord {
    pub candidate_id: CandidateId,
    pub guardian_contact: String,
    pub verified: bool,
    #[serde(default)]
    pub verified_at: Option<DateTime<Utc>>,
}

/// Authenticated party driving a lifecycle call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Actor {
    Candidate(CandidateId),
    Guardian(String),
    Owner(OwnerId),
    System,
}

impl Actor {
    pub fn label(&self) -> String {
        match self {
            Actor::Candidate(id) => format!("candidate:{id}"),
            Actor::Guardian(contact) => format!("guardian:{contact}"),
            Actor::Owner(id) => format!("owner:{id}"),
            Actor::System => "system".to_string(),
        }
    }
}

/// Binary verdict used by guardian and owner decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approve,
    Reject,
}
