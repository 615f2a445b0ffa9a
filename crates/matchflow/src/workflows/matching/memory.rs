//! Mutex-backed adapters for every store and sink port, used by the demo service and tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::domain::{
    Actor, ApplicationId, CandidateId, CandidateProfile, ConsentRecord, Opportunity, OpportunityId,
    OpportunityStatus,
};
use super::identity::{AccessToken, IdentityError, IdentityProvider};
use super::repository::{
    ApplicationRecord, ApplicationRepository, ConsentRegistry, CredentialAward, CredentialLedger,
    Notification, NotificationDispatcher, OpportunityCatalog, ProfileStore, RepositoryError,
    SinkError,
};

#[derive(Debug, Default, Clone)]
pub struct InMemoryProfileStore {
    candidates: Arc<Mutex<HashMap<CandidateId, CandidateProfile>>>,
}

impl InMemoryProfileStore {
    pub fn upsert(&self, candidate: CandidateProfile) {
        let mut guard = self.candidates.lock().expect("profile mutex poisoned");
        guard.insert(candidate.id.clone(), candidate);
    }
}

impl ProfileStore for InMemoryProfileStore {
    fn candidate(&self, id: &CandidateId) -> Result<Option<CandidateProfile>, RepositoryError> {
        let guard = self.candidates.lock().expect("profile mutex poisoned");
        Ok(guard.get(id).cloned())
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryOpportunityCatalog {
    opportunities: Arc<Mutex<HashMap<OpportunityId, Opportunity>>>,
}

impl InMemoryOpportunityCatalog {
    pub fn upsert(&self, opportunity: Opportunity) {
        let mut guard = self.opportunities.lock().expect("catalog mutex poisoned");
        guard.insert(opportunity.id.clone(), opportunity);
    }
}

impl OpportunityCatalog for InMemoryOpportunityCatalog {
    fn opportunity(&self, id: &OpportunityId) -> Result<Option<Opportunity>, RepositoryError> {
        let guard = self.opportunities.lock().expect("catalog mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn commit_accepted(
        &self,
        id: &OpportunityId,
        expected_version: u64,
        accepted: u32,
    ) -> Result<Opportunity, RepositoryError> {
        let mut guard = self.opportunities.lock().expect("catalog mutex poisoned");
        let stored = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        if stored.version != expected_version {
            return Err(RepositoryError::StaleVersion {
                expected: expected_version,
                found: stored.version,
            });
        }
        stored.current_accepted = accepted;
        stored.version += 1;
        Ok(stored.clone())
    }

    fn close(&self, id: &OpportunityId) -> Result<Opportunity, RepositoryError> {
        let mut guard = self.opportunities.lock().expect("catalog mutex poisoned");
        let stored = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        stored.status = OpportunityStatus::Closed;
        stored.version += 1;
        Ok(stored.clone())
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryConsentRegistry {
    records: Arc<Mutex<HashMap<CandidateId, ConsentRecord>>>,
}

impl ConsentRegistry for InMemoryConsentRegistry {
    fn consent_for(
        &self,
        candidate: &CandidateId,
    ) -> Result<Option<ConsentRecord>, RepositoryError> {
        let guard = self.records.lock().expect("consent mutex poisoned");
        Ok(guard.get(candidate).cloned())
    }

    fn record(&self, consent: ConsentRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("consent mutex poisoned");
        guard.insert(consent.candidate_id.clone(), consent);
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryApplicationRepository {
    records: Arc<Mutex<HashMap<ApplicationId, ApplicationRecord>>>,
}

impl InMemoryApplicationRepository {
    pub fn len(&self) -> usize {
        self.records.lock().expect("repository mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ApplicationRepository for InMemoryApplicationRepository {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let duplicate_pair = guard.values().any(|existing| {
            existing.is_active()
                && existing.candidate_id == record.candidate_id
                && existing.opportunity_id == record.opportunity_id
        });
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::DuplicateId);
        }
        if duplicate_pair {
            return Err(RepositoryError::ActivePairExists);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, mut record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let stored = guard.get_mut(&record.id).ok_or(RepositoryError::NotFound)?;
        if stored.revision != record.revision {
            return Err(RepositoryError::StaleVersion {
                expected: record.revision,
                found: stored.revision,
            });
        }
        record.revision += 1;
        *stored = record.clone();
        Ok(record)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn active_for_pair(
        &self,
        candidate: &CandidateId,
        opportunity: &OpportunityId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .find(|record| {
                record.is_active()
                    && &record.candidate_id == candidate
                    && &record.opportunity_id == opportunity
            })
            .cloned())
    }

    fn for_opportunity(
        &self,
        opportunity: &OpportunityId,
    ) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut records: Vec<ApplicationRecord> = guard
            .values()
            .filter(|record| &record.opportunity_id == opportunity)
            .cloned()
            .collect();
        records.sort_by(|left, right| left.id.cmp(&right.id));
        Ok(records)
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryNotificationDispatcher {
    events: Arc<Mutex<Vec<Notification>>>,
}

impl InMemoryNotificationDispatcher {
    pub fn events(&self) -> Vec<Notification> {
        self.events.lock().expect("notification mutex poisoned").clone()
    }
}

impl NotificationDispatcher for InMemoryNotificationDispatcher {
    fn dispatch(&self, notification: Notification) -> Result<(), SinkError> {
        self.events
            .lock()
            .expect("notification mutex poisoned")
            .push(notification);
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryCredentialLedger {
    awards: Arc<Mutex<Vec<CredentialAward>>>,
}

impl InMemoryCredentialLedger {
    pub fn awards(&self) -> Vec<CredentialAward> {
        self.awards.lock().expect("ledger mutex poisoned").clone()
    }
}

impl CredentialLedger for InMemoryCredentialLedger {
    fn award(&self, award: CredentialAward) -> Result<(), SinkError> {
        self.awards.lock().expect("ledger mutex poisoned").push(award);
        Ok(())
    }
}

/// Fixed token table; tokens are issued explicitly, there is no fallback identity.
#[derive(Debug, Default, Clone)]
pub struct StaticIdentityProvider {
    tokens: Arc<Mutex<HashMap<AccessToken, Actor>>>,
}

impl StaticIdentityProvider {
    pub fn issue(&self, token: impl Into<String>, actor: Actor) -> AccessToken {
        let token = AccessToken(token.into());
        self.tokens
            .lock()
            .expect("identity mutex poisoned")
            .insert(token.clone(), actor);
        token
    }
}

impl IdentityProvider for StaticIdentityProvider {
    fn resolve(&self, token: &AccessToken) -> Result<Actor, IdentityError> {
        self.tokens
            .lock()
            .expect("identity mutex poisoned")
            .get(token)
            .cloned()
            .ok_or(IdentityError::UnknownToken)
    }
}
