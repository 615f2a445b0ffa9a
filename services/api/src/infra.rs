use matchflow::workflows::matching::memory::{
    InMemoryApplicationRepository, InMemoryConsentRegistry, InMemoryCredentialLedger,
    InMemoryNotificationDispatcher, InMemoryOpportunityCatalog, InMemoryProfileStore,
    StaticIdentityProvider,
};
use matchflow::workflows::matching::{
    Actor, CandidateId, CandidateProfile, CandidateRole, InterestArea, MatchingPorts, Opportunity,
    OpportunityId, OpportunityStatus, OwnerId, Proficiency, SkillRequirement, WorkStyle,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) const SAMPLE_OWNER: &str = "mentor-lee";
pub(crate) const SAMPLE_OPPORTUNITY: &str = "opp-robotics";
pub(crate) const SAMPLE_MINOR: &str = "stu-ava";
pub(crate) const SAMPLE_ADULT: &str = "stu-noah";
pub(crate) const SAMPLE_GUARDIAN: &str = "guardian.ava@example.org";
pub(crate) const OWNER_TOKEN: &str = "mentor-token";
pub(crate) const GUARDIAN_TOKEN: &str = "guardian-token";
pub(crate) const CANDIDATE_TOKEN: &str = "ava-token";

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// In-memory stores backing the demo service, kept so callers can inspect sink output.
#[derive(Default, Clone)]
pub(crate) struct SeededStores {
    pub(crate) profiles: InMemoryProfileStore,
    pub(crate) opportunities: InMemoryOpportunityCatalog,
    pub(crate) consents: InMemoryConsentRegistry,
    pub(crate) applications: InMemoryApplicationRepository,
    pub(crate) notifications: InMemoryNotificationDispatcher,
    pub(crate) credentials: InMemoryCredentialLedger,
    pub(crate) identity: StaticIdentityProvider,
}

impl SeededStores {
    pub(crate) fn ports(&self) -> MatchingPorts {
        MatchingPorts {
            profiles: Arc::new(self.profiles.clone()),
            opportunities: Arc::new(self.opportunities.clone()),
            consents: Arc::new(self.consents.clone()),
            applications: Arc::new(self.applications.clone()),
            notifications: Arc::new(self.notifications.clone()),
            credentials: Arc::new(self.credentials.clone()),
            identity: Arc::new(self.identity.clone()),
        }
    }
}

/// Seed one robotics opportunity, two candidates and the tokens needed to drive them.
pub(crate) fn seeded_stores(minor_age: u8) -> SeededStores {
    let stores = SeededStores::default();

    stores.opportunities.upsert(Opportunity {
        id: OpportunityId(SAMPLE_OPPORTUNITY.to_string()),
        owner: OwnerId(SAMPLE_OWNER.to_string()),
        title: "Robotics club build season".to_string(),
        required_skills: vec![
            SkillRequirement {
                skill: "Python".to_string(),
                minimum: Proficiency::Intermediate,
                weight: 4,
            },
            SkillRequirement {
                skill: "CAD".to_string(),
                minimum: Proficiency::Beginner,
                weight: 2,
            },
            SkillRequirement {
                skill: "Soldering".to_string(),
                minimum: Proficiency::Beginner,
                weight: 1,
            },
        ],
        interests: BTreeSet::from([InterestArea::Technology, InterestArea::Science]),
        work_style: WorkStyle([80, 40, 60, 70, 65, 75, 70]),
        capacity: 2,
        current_accepted: 0,
        minimum_age: Some(13),
        status: OpportunityStatus::Open,
        xp_reward: 250,
        version: 0,
    });

    stores.profiles.upsert(CandidateProfile {
        id: CandidateId(SAMPLE_MINOR.to_string()),
        skills: BTreeMap::from([
            ("Python".to_string(), Proficiency::Advanced),
            ("CAD".to_string(), Proficiency::Beginner),
        ]),
        interests: BTreeSet::from([InterestArea::Technology, InterestArea::Arts]),
        work_style: WorkStyle([75, 50, 55, 70, 60, 85, 65]),
        age: Some(minor_age),
        guardian_contact: Some(SAMPLE_GUARDIAN.to_string()),
        roles: BTreeSet::from([CandidateRole::Student]),
    });

    stores.profiles.upsert(CandidateProfile {
        id: CandidateId(SAMPLE_ADULT.to_string()),
        skills: BTreeMap::from([
            ("Python".to_string(), Proficiency::Beginner),
            ("Soldering".to_string(), Proficiency::Advanced),
        ]),
        interests: BTreeSet::from([InterestArea::Science, InterestArea::Community]),
        work_style: WorkStyle([60, 70, 40, 50, 55, 60, 80]),
        age: Some(19),
        guardian_contact: None,
        roles: BTreeSet::from([CandidateRole::Student]),
    });

    stores
        .identity
        .issue(OWNER_TOKEN, Actor::Owner(OwnerId(SAMPLE_OWNER.to_string())));
    stores
        .identity
        .issue(GUARDIAN_TOKEN, Actor::Guardian(SAMPLE_GUARDIAN.to_string()));
    stores.identity.issue(
        CANDIDATE_TOKEN,
        Actor::Candidate(CandidateId(SAMPLE_MINOR.to_string())),
    );

    stores
}
