use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    Actor, ApplicationId, CandidateId, CandidateProfile, ConsentRecord, Opportunity, OpportunityId,
};
use super::lifecycle::{ApplicationState, StatusReason, Transition};
use super::scoring::MatchScore;

/// One row of an application's audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub state: ApplicationState,
    pub at: DateTime<Utc>,
    pub actor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<StatusReason>,
}

/// Persisted application aggregate. Never deleted; only the lifecycle mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: ApplicationId,
    pub candidate_id: CandidateId,
    pub opportunity_id: OpportunityId,
    pub state: ApplicationState,
    pub match_score: MatchScore,
    pub consent_requested: bool,
    pub history: Vec<StatusEntry>,
    /// Bumped on every stored update; used as the conditional-write key.
    pub revision: u64,
}

impl ApplicationRecord {
    pub fn draft(
        id: ApplicationId,
        match_score: MatchScore,
        actor: &Actor,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            candidate_id: match_score.candidate_id.clone(),
            opportunity_id: match_score.opportunity_id.clone(),
            state: ApplicationState::Draft,
            match_score,
            consent_requested: false,
            history: vec![StatusEntry {
                state: ApplicationState::Draft,
                at,
                actor: actor.label(),
                reason: None,
            }],
            revision: 0,
        }
    }

    /// Fold a committed transition into the record. No-op transitions leave history untouched.
    pub fn apply(&mut self, transition: &Transition, actor: &Actor, at: DateTime<Utc>) {
        if transition.is_noop() {
            return;
        }

        self.state = transition.to;
        self.history.push(StatusEntry {
            state: transition.to,
            at,
            actor: actor.label(),
            reason: transition.reason,
        });
    }

    pub fn is_active(&self) -> bool {
        !self.state.is_terminal()
    }

    pub fn visited_states(&self) -> Vec<ApplicationState> {
        self.history.iter().map(|entry| entry.state).collect()
    }

    pub fn latest_reason(&self) -> Option<StatusReason> {
        self.history.last().and_then(|entry| entry.reason)
    }

    pub fn status_view(&self) -> ApplicationStatusView {
        ApplicationStatusView {
            application_id: self.id.clone(),
            candidate_id: self.candidate_id.clone(),
            opportunity_id: self.opportunity_id.clone(),
            state: self.state.label(),
            reason: self.latest_reason().map(StatusReason::label),
            match_score: self.match_score.clone(),
            history: self.history.clone(),
        }
    }
}

/// Sanitized representation of an application's exposed status.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationStatusView {
    pub application_id: ApplicationId,
    pub candidate_id: CandidateId,
    pub opportunity_id: OpportunityId,
    pub state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    pub match_score: MatchScore,
    pub history: Vec<StatusEntry>,
}

/// Error enumeration for store failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record id already exists")]
    DuplicateId,
    #[error("an active record already exists for this candidate and opportunity")]
    ActivePairExists,
    #[error("record not found")]
    NotFound,
    #[error("stale write: expected version {expected}, found {found}")]
    StaleVersion { expected: u64, found: u64 },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Read access to candidate profiles.
pub trait ProfileStore: Send + Sync {
    fn candidate(&self, id: &CandidateId) -> Result<Option<CandidateProfile>, RepositoryError>;
}

/// Opportunity catalog with version-keyed conditional writes for admission counters.
pub trait OpportunityCatalog: Send + Sync {
    fn opportunity(&self, id: &OpportunityId) -> Result<Option<Opportunity>, RepositoryError>;

    /// Store `current_accepted = accepted` only if the stored version still equals
    /// `expected_version`; bumps the version on success.
    fn commit_accepted(
        &self,
        id: &OpportunityId,
        expected_version: u64,
        accepted: u32,
    ) -> Result<Opportunity, RepositoryError>;

    /// Mark the opportunity closed and bump its version.
    fn close(&self, id: &OpportunityId) -> Result<Opportunity, RepositoryError>;
}

/// Guardian consent records keyed by candidate.
pub trait ConsentRegistry: Send + Sync {
    fn consent_for(
        &self,
        candidate: &CandidateId,
    ) -> Result<Option<ConsentRecord>, RepositoryError>;
    fn record(&self, consent: ConsentRecord) -> Result<(), RepositoryError>;
}

/// Application storage.
///
/// `insert` must reject a record when another non-terminal application exists for the same
/// candidate and opportunity. `update` must reject writes whose `revision` is stale.
pub trait ApplicationRepository: Send + Sync {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError>;
    fn update(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError>;
    fn active_for_pair(
        &self,
        candidate: &CandidateId,
        opportunity: &OpportunityId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError>;
    fn for_opportunity(
        &self,
        opportunity: &OpportunityId,
    ) -> Result<Vec<ApplicationRecord>, RepositoryError>;
}

/// Outbound e-mail/push hook.
pub trait NotificationDispatcher: Send + Sync {
    fn dispatch(&self, notification: Notification) -> Result<(), SinkError>;
}

/// Outbound credential/XP hook.
pub trait CredentialLedger: Send + Sync {
    fn award(&self, award: CredentialAward) -> Result<(), SinkError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub template: String,
    pub application_id: ApplicationId,
    pub recipient: String,
    pub details: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialAward {
    pub application_id: ApplicationId,
    pub candidate_id: CandidateId,
    pub opportunity_id: OpportunityId,
    pub xp: u32,
    pub awarded_at: DateTime<Utc>,
}

/// Sink dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("sink transport unavailable: {0}")]
    Transport(String),
}
