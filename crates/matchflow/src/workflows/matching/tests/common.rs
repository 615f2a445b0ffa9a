use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::workflows::matching::domain::{
    Actor, ApplicationId, CandidateId, CandidateProfile, CandidateRole, ConsentRecord,
    InterestArea, Opportunity, OpportunityId, OpportunityStatus, OwnerId, Proficiency,
    SkillRequirement, WorkStyle,
};
use crate::workflows::matching::identity::AccessToken;
use crate::workflows::matching::memory::{
    InMemoryApplicationRepository, InMemoryConsentRegistry, InMemoryCredentialLedger,
    InMemoryNotificationDispatcher, InMemoryOpportunityCatalog, InMemoryProfileStore,
    StaticIdentityProvider,
};
use crate::workflows::matching::repository::{
    ApplicationRecord, ApplicationRepository, ConsentRegistry, CredentialAward, CredentialLedger,
    Notification, NotificationDispatcher, OpportunityCatalog, RepositoryError, SinkError,
};
use crate::workflows::matching::{MatchingPorts, MatchingService, MatchingSettings};

pub(super) const OWNER: &str = "owner-1";
pub(super) const GUARDIAN_CONTACT: &str = "guardian@example.com";
pub(super) const OWNER_TOKEN: &str = "owner-token";
pub(super) const GUARDIAN_TOKEN: &str = "guardian-token";
pub(super) const STRANGER_TOKEN: &str = "stranger-token";

pub(super) fn owner() -> Actor {
    Actor::Owner(OwnerId(OWNER.to_string()))
}

pub(super) fn candidate_actor(id: &str) -> Actor {
    Actor::Candidate(CandidateId(id.to_string()))
}

pub(super) fn candidate_id(id: &str) -> CandidateId {
    CandidateId(id.to_string())
}

pub(super) fn opportunity_id(id: &str) -> OpportunityId {
    OpportunityId(id.to_string())
}

pub(super) fn adult_candidate(id: &str) -> CandidateProfile {
    let mut skills = BTreeMap::new();
    skills.insert("React".to_string(), Proficiency::Intermediate);
    skills.insert("CSS".to_string(), Proficiency::Beginner);

    CandidateProfile {
        id: candidate_id(id),
        skills,
        interests: BTreeSet::from([InterestArea::Technology, InterestArea::Design]),
        work_style: WorkStyle::balanced(),
        age: Some(22),
        guardian_contact: None,
        roles: BTreeSet::from([CandidateRole::Student]),
    }
}

pub(super) fn minor_candidate(id: &str) -> CandidateProfile {
    CandidateProfile {
        age: Some(16),
        guardian_contact: Some(GUARDIAN_CONTACT.to_string()),
        ..adult_candidate(id)
    }
}

pub(super) fn opportunity(id: &str, capacity: u32) -> Opportunity {
    Opportunity {
        id: opportunity_id(id),
        owner: OwnerId(OWNER.to_string()),
        title: "Front-end apprenticeship".to_string(),
        required_skills: vec![
            SkillRequirement {
                skill: "React".to_string(),
                minimum: Proficiency::Intermediate,
                weight: 5,
            },
            SkillRequirement {
                skill: "CSS".to_string(),
                minimum: Proficiency::Beginner,
                weight: 5,
            },
        ],
        interests: BTreeSet::from([InterestArea::Technology, InterestArea::Design]),
        work_style: WorkStyle::balanced(),
        capacity,
        current_accepted: 0,
        minimum_age: None,
        status: OpportunityStatus::Open,
        xp_reward: 150,
        version: 0,
    }
}

/// Service wired to in-memory adapters, with handles kept for assertions.
pub(super) struct Harness {
    pub(super) service: Arc<MatchingService>,
    pub(super) profiles: InMemoryProfileStore,
    pub(super) opportunities: InMemoryOpportunityCatalog,
    pub(super) consents: InMemoryConsentRegistry,
    pub(super) applications: InMemoryApplicationRepository,
    pub(super) notifications: InMemoryNotificationDispatcher,
    pub(super) credentials: InMemoryCredentialLedger,
    pub(super) identity: StaticIdentityProvider,
}

impl Harness {
    pub(super) fn token(&self, value: &str) -> AccessToken {
        AccessToken(value.to_string())
    }

    pub(super) fn opportunity(&self, id: &str) -> Opportunity {
        self.opportunities
            .opportunity(&opportunity_id(id))
            .expect("catalog readable")
            .expect("opportunity seeded")
    }

    pub(super) fn templates(&self) -> Vec<String> {
        self.notifications
            .events()
            .into_iter()
            .map(|event| event.template)
            .collect()
    }
}

pub(super) fn harness() -> Harness {
    harness_with(MatchingSettings::default())
}

pub(super) fn harness_with(settings: MatchingSettings) -> Harness {
    let profiles = InMemoryProfileStore::default();
    let opportunities = InMemoryOpportunityCatalog::default();
    let consents = InMemoryConsentRegistry::default();
    let applications = InMemoryApplicationRepository::default();
    let notifications = InMemoryNotificationDispatcher::default();
    let credentials = InMemoryCredentialLedger::default();
    let identity = StaticIdentityProvider::default();

    identity.issue(OWNER_TOKEN, owner());
    identity.issue(GUARDIAN_TOKEN, Actor::Guardian(GUARDIAN_CONTACT.to_string()));
    identity.issue(
        STRANGER_TOKEN,
        Actor::Guardian("someone-else@example.com".to_string()),
    );

    let ports = MatchingPorts {
        profiles: Arc::new(profiles.clone()),
        opportunities: Arc::new(opportunities.clone()),
        consents: Arc::new(consents.clone()),
        applications: Arc::new(applications.clone()),
        notifications: Arc::new(notifications.clone()),
        credentials: Arc::new(credentials.clone()),
        identity: Arc::new(identity.clone()),
    };

    Harness {
        service: Arc::new(MatchingService::new(ports, settings)),
        profiles,
        opportunities,
        consents,
        applications,
        notifications,
        credentials,
        identity,
    }
}

/// Same wiring as [`harness`] but with sinks that always fail.
pub(super) fn harness_with_failing_sinks() -> Harness {
    let base = harness();
    let ports = MatchingPorts {
        profiles: Arc::new(base.profiles.clone()),
        opportunities: Arc::new(base.opportunities.clone()),
        consents: Arc::new(base.consents.clone()),
        applications: Arc::new(base.applications.clone()),
        notifications: Arc::new(OfflineSink),
        credentials: Arc::new(OfflineSink),
        identity: Arc::new(base.identity.clone()),
    };
    Harness {
        service: Arc::new(MatchingService::new(ports, MatchingSettings::default())),
        ..base
    }
}

pub(super) struct OfflineSink;

impl NotificationDispatcher for OfflineSink {
    fn dispatch(&self, _notification: Notification) -> Result<(), SinkError> {
        Err(SinkError::Transport("smtp offline".to_string()))
    }
}

impl CredentialLedger for OfflineSink {
    fn award(&self, _award: CredentialAward) -> Result<(), SinkError> {
        Err(SinkError::Transport("ledger offline".to_string()))
    }
}

/// Write failures armed by a test. Each counter fails that many upcoming calls, then clears.
#[derive(Clone, Default)]
pub(super) struct Faults {
    pub(super) stale_seat_commits: Arc<AtomicU32>,
    pub(super) offline_seat_commits: Arc<AtomicU32>,
    pub(super) stale_application_updates: Arc<AtomicU32>,
    pub(super) taken_application_ids: Arc<AtomicU32>,
    pub(super) offline_consent_writes: Arc<AtomicU32>,
}

impl Faults {
    pub(super) fn arm(counter: &AtomicU32, calls: u32) {
        counter.store(calls, Ordering::SeqCst);
    }

    fn trip(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok()
    }
}

struct FaultyCatalog {
    inner: InMemoryOpportunityCatalog,
    faults: Faults,
}

impl OpportunityCatalog for FaultyCatalog {
    fn opportunity(&self, id: &OpportunityId) -> Result<Option<Opportunity>, RepositoryError> {
        self.inner.opportunity(id)
    }

    fn commit_accepted(
        &self,
        id: &OpportunityId,
        expected_version: u64,
        accepted: u32,
    ) -> Result<Opportunity, RepositoryError> {
        if Faults::trip(&self.faults.stale_seat_commits) {
            return Err(RepositoryError::StaleVersion {
                expected: expected_version,
                found: expected_version + 1,
            });
        }
        if Faults::trip(&self.faults.offline_seat_commits) {
            return Err(RepositoryError::Unavailable("catalog offline".to_string()));
        }
        self.inner.commit_accepted(id, expected_version, accepted)
    }

    fn close(&self, id: &OpportunityId) -> Result<Opportunity, RepositoryError> {
        self.inner.close(id)
    }
}

struct FaultyApplications {
    inner: InMemoryApplicationRepository,
    faults: Faults,
}

impl ApplicationRepository for FaultyApplications {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        if Faults::trip(&self.faults.taken_application_ids) {
            return Err(RepositoryError::DuplicateId);
        }
        self.inner.insert(record)
    }

    fn update(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        if Faults::trip(&self.faults.stale_application_updates) {
            return Err(RepositoryError::StaleVersion {
                expected: record.revision,
                found: record.revision + 1,
            });
        }
        self.inner.update(record)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn active_for_pair(
        &self,
        candidate: &CandidateId,
        opportunity: &OpportunityId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        self.inner.active_for_pair(candidate, opportunity)
    }

    fn for_opportunity(
        &self,
        opportunity: &OpportunityId,
    ) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        self.inner.for_opportunity(opportunity)
    }
}

struct FaultyConsents {
    inner: InMemoryConsentRegistry,
    faults: Faults,
}

impl ConsentRegistry for FaultyConsents {
    fn consent_for(
        &self,
        candidate: &CandidateId,
    ) -> Result<Option<ConsentRecord>, RepositoryError> {
        self.inner.consent_for(candidate)
    }

    fn record(&self, consent: ConsentRecord) -> Result<(), RepositoryError> {
        if Faults::trip(&self.faults.offline_consent_writes) {
            return Err(RepositoryError::Unavailable("consent store offline".to_string()));
        }
        self.inner.record(consent)
    }
}

/// Same wiring as [`harness`] with the catalog, repository and consent store behind [`Faults`].
pub(super) fn harness_with_faults(settings: MatchingSettings) -> (Harness, Faults) {
    let base = harness();
    let faults = Faults::default();
    let ports = MatchingPorts {
        profiles: Arc::new(base.profiles.clone()),
        opportunities: Arc::new(FaultyCatalog {
            inner: base.opportunities.clone(),
            faults: faults.clone(),
        }),
        consents: Arc::new(FaultyConsents {
            inner: base.consents.clone(),
            faults: faults.clone(),
        }),
        applications: Arc::new(FaultyApplications {
            inner: base.applications.clone(),
            faults: faults.clone(),
        }),
        notifications: Arc::new(base.notifications.clone()),
        credentials: Arc::new(base.credentials.clone()),
        identity: Arc::new(base.identity.clone()),
    };
    let harness = Harness {
        service: Arc::new(MatchingService::new(ports, settings)),
        ..base
    };
    (harness, faults)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
