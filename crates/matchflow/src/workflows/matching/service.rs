use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::consent::{ConsentGate, ConsentPolicy, GateReason};
use super::domain::{
    Actor, ApplicationId, CandidateId, CandidateProfile, ConsentRecord, Decision, Opportunity,
    OpportunityId,
};
use super::identity::{AccessToken, IdentityError, IdentityProvider};
use super::lifecycle::{
    transition, ApplicationState, GuardResult, LifecycleEffect, LifecycleError, LifecycleEvent,
    Transition,
};
use super::repository::{
    ApplicationRecord, ApplicationRepository, ConsentRegistry, CredentialAward, CredentialLedger,
    Notification, NotificationDispatcher, OpportunityCatalog, ProfileStore, RepositoryError,
};
use super::scoring::{rank, MatchScore, ScoreEngine, ScoringConfig};
use super::validation::{self, ValidationError};
use crate::config::MatchingConfig;

pub const DEFAULT_CAPACITY_RETRY_BUDGET: u8 = 3;

/// Store and sink adapters the service runs against.
#[derive(Clone)]
pub struct MatchingPorts {
    pub profiles: Arc<dyn ProfileStore>,
    pub opportunities: Arc<dyn OpportunityCatalog>,
    pub consents: Arc<dyn ConsentRegistry>,
    pub applications: Arc<dyn ApplicationRepository>,
    pub notifications: Arc<dyn NotificationDispatcher>,
    pub credentials: Arc<dyn CredentialLedger>,
    pub identity: Arc<dyn IdentityProvider>,
}

#[derive(Debug, Clone)]
pub struct MatchingSettings {
    pub scoring: ScoringConfig,
    pub consent: ConsentPolicy,
    pub capacity_retry_budget: u8,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            scoring: ScoringConfig::default(),
            consent: ConsentPolicy::default(),
            capacity_retry_budget: DEFAULT_CAPACITY_RETRY_BUDGET,
        }
    }
}

impl From<&MatchingConfig> for MatchingSettings {
    fn from(config: &MatchingConfig) -> Self {
        Self {
            scoring: ScoringConfig::default(),
            consent: ConsentPolicy::new(config.adult_age),
            capacity_retry_budget: config.capacity_retry_budget,
        }
    }
}

/// Events a caller may fire through the generic transition endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationEvent {
    Start,
    Complete,
    Withdraw,
}

/// Result of `apply`.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationOutcome {
    pub application_id: ApplicationId,
    pub state: ApplicationState,
    pub match_score: MatchScore,
}

/// Result of closing an opportunity.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CloseSummary {
    pub opportunity_id: Option<OpportunityId>,
    pub closed: Vec<ApplicationId>,
    /// Applications that kept changing underneath the cascade; a later sweep picks them up.
    pub deferred: Vec<ApplicationId>,
}

enum SeatReservation {
    Reserved,
    /// The counter was read at capacity.
    Full,
    /// Every attempt lost a version race; seats may still be free.
    Contended,
}

/// Facade composing the score engine, consent gate, lifecycle machine and stores.
pub struct MatchingService {
    ports: MatchingPorts,
    engine: ScoreEngine,
    gate: ConsentGate,
    retry_budget: u8,
    owed_releases: Mutex<BTreeMap<OpportunityId, u32>>,
}

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("app-{id:06}"))
}

impl MatchingService {
    pub fn new(ports: MatchingPorts, settings: MatchingSettings) -> Self {
        Self {
            ports,
            engine: ScoreEngine::new(settings.scoring),
            gate: ConsentGate::with_policy(settings.consent),
            retry_budget: settings.capacity_retry_budget.max(1),
            owed_releases: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn engine(&self) -> &ScoreEngine {
        &self.engine
    }

    pub fn gate(&self) -> &ConsentGate {
        &self.gate
    }

    pub fn resolve_actor(&self, token: &AccessToken) -> Result<Actor, MatchingServiceError> {
        Ok(self.ports.identity.resolve(token)?)
    }

    /// Fresh score for the pair; never read from an application snapshot.
    pub fn get_match_score(
        &self,
        candidate_id: &CandidateId,
        opportunity_id: &OpportunityId,
    ) -> Result<MatchScore, MatchingServiceError> {
        let candidate = self.load_candidate(candidate_id)?;
        let opportunity = self.load_opportunity(opportunity_id)?;
        Ok(self.engine.compute_match(&candidate, &opportunity))
    }

    /// Create a `Submitted` application without routing it through the consent gate.
    pub fn submit(
        &self,
        candidate_id: &CandidateId,
        opportunity_id: &OpportunityId,
    ) -> Result<ApplicationRecord, MatchingServiceError> {
        self.open_application(candidate_id, opportunity_id, false)
    }

    /// Submit and route in one commit.
    pub fn apply(
        &self,
        candidate_id: &CandidateId,
        opportunity_id: &OpportunityId,
    ) -> Result<ApplicationOutcome, MatchingServiceError> {
        let record = self.open_application(candidate_id, opportunity_id, true)?;
        Ok(ApplicationOutcome {
            application_id: record.id,
            state: record.state,
            match_score: record.match_score,
        })
    }

    /// Route a `Submitted` application to guardian consent or owner review.
    pub fn advance_after_submit(
        &self,
        application_id: &ApplicationId,
    ) -> Result<ApplicationRecord, MatchingServiceError> {
        let record = self.load_application(application_id)?;
        if record.state != ApplicationState::Submitted {
            return Err(LifecycleError::InvalidTransition {
                state: record.state,
                event: LifecycleEvent::Route,
            }
            .into());
        }
        self.route(record)
    }

    /// Re-run the consent gate for a parked application. Never re-sends the consent request.
    pub fn recheck_consent(
        &self,
        application_id: &ApplicationId,
    ) -> Result<ApplicationRecord, MatchingServiceError> {
        let record = self.load_application(application_id)?;
        if record.state != ApplicationState::PendingGuardianConsent {
            return Err(LifecycleError::InvalidTransition {
                state: record.state,
                event: LifecycleEvent::Route,
            }
            .into());
        }
        self.route(record)
    }

    pub fn guardian_decision(
        &self,
        application_id: &ApplicationId,
        token: &AccessToken,
        decision: Decision,
    ) -> Result<ApplicationRecord, MatchingServiceError> {
        let actor = self.resolve_actor(token)?;
        let record = self.load_application(application_id)?;
        let candidate = self.load_candidate(&record.candidate_id)?;

        let guardian_contact = match (&actor, &candidate.guardian_contact) {
            (Actor::Guardian(presented), Some(expected))
                if presented.eq_ignore_ascii_case(expected) =>
            {
                expected.clone()
            }
            _ => return Err(MatchingServiceError::InvalidToken),
        };

        let consent = ConsentRecord {
            candidate_id: candidate.id.clone(),
            guardian_contact,
            verified: true,
            verified_at: Some(Utc::now()),
        };

        match decision {
            // An approval whose consent write failed after the state commit may be replayed.
            Decision::Approve
                if record.state == ApplicationState::PendingOwnerReview
                    && !self.has_verified_consent(&candidate.id)? =>
            {
                self.ports.consents.record(consent)?;
                info!(application = %record.id, "guardian consent restored");
                Ok(record)
            }
            Decision::Approve => {
                let step = transition(
                    record.state,
                    LifecycleEvent::GuardianApprove,
                    GuardResult::Pass,
                )?;
                // The consent record follows the state commit so a lost race writes nothing.
                let stored = self.commit(record, &step, &actor)?;
                self.ports.consents.record(consent)?;
                Ok(stored)
            }
            Decision::Reject => {
                let step = transition(
                    record.state,
                    LifecycleEvent::GuardianReject,
                    GuardResult::Pass,
                )?;
                self.commit(record, &step, &actor)
            }
        }
    }

    pub fn owner_decision(
        &self,
        application_id: &ApplicationId,
        actor: &Actor,
        decision: Decision,
    ) -> Result<ApplicationRecord, MatchingServiceError> {
        let record = self.load_application(application_id)?;
        let opportunity = self.load_opportunity(&record.opportunity_id)?;
        authorize_owner(actor, &opportunity, false, "decide on applications")?;

        if decision == Decision::Reject {
            let step = transition(record.state, LifecycleEvent::OwnerReject, GuardResult::Pass)?;
            return self.commit(record, &step, actor);
        }

        // Validate the state before touching the opportunity counter.
        transition(record.state, LifecycleEvent::OwnerApprove, GuardResult::Pass)?;

        let candidate = self.load_candidate(&record.candidate_id)?;
        let consent = self.ports.consents.consent_for(&candidate.id)?;
        let gate = self.gate.check_gate(&candidate, &record, consent.as_ref());
        if !gate.allowed {
            return Err(MatchingServiceError::ConsentRequired(gate.reason));
        }

        match self.reserve_seat(&opportunity.id)? {
            SeatReservation::Reserved => {
                let step =
                    transition(record.state, LifecycleEvent::OwnerApprove, GuardResult::Pass)?;
                match self.commit(record, &step, actor) {
                    Ok(stored) => Ok(stored),
                    Err(err) => {
                        self.release_seat(&opportunity.id);
                        Err(err)
                    }
                }
            }
            SeatReservation::Full => {
                let step = transition(
                    record.state,
                    LifecycleEvent::OwnerApprove,
                    GuardResult::CapacityExhausted,
                )?;
                self.commit(record, &step, actor)?;
                Err(MatchingServiceError::CapacityExceeded(opportunity.id))
            }
            SeatReservation::Contended => {
                Err(MatchingServiceError::CapacityExceeded(opportunity.id))
            }
        }
    }

    pub fn transition(
        &self,
        application_id: &ApplicationId,
        actor: &Actor,
        event: ApplicationEvent,
    ) -> Result<ApplicationRecord, MatchingServiceError> {
        match event {
            ApplicationEvent::Start => self.start(application_id, actor),
            ApplicationEvent::Complete => self.complete(application_id, actor),
            ApplicationEvent::Withdraw => self.withdraw(application_id, actor),
        }
    }

    /// `Approved -> InProgress`; repeating it on an in-progress application changes nothing.
    pub fn start(
        &self,
        application_id: &ApplicationId,
        actor: &Actor,
    ) -> Result<ApplicationRecord, MatchingServiceError> {
        let record = self.load_application(application_id)?;
        let opportunity = self.load_opportunity(&record.opportunity_id)?;
        authorize_owner(actor, &opportunity, true, "start work")?;

        let step = transition(record.state, LifecycleEvent::Start, GuardResult::Pass)?;
        self.commit(record, &step, actor)
    }

    pub fn complete(
        &self,
        application_id: &ApplicationId,
        actor: &Actor,
    ) -> Result<ApplicationRecord, MatchingServiceError> {
        let record = self.load_application(application_id)?;
        let opportunity = self.load_opportunity(&record.opportunity_id)?;
        authorize_owner(actor, &opportunity, true, "complete work")?;

        let step = transition(record.state, LifecycleEvent::Complete, GuardResult::Pass)?;
        let stored = self.commit(record, &step, actor)?;
        self.release_seat(&opportunity.id);
        Ok(stored)
    }

    pub fn withdraw(
        &self,
        application_id: &ApplicationId,
        actor: &Actor,
    ) -> Result<ApplicationRecord, MatchingServiceError> {
        let record = self.load_application(application_id)?;
        match actor {
            Actor::Candidate(candidate) if *candidate == record.candidate_id => {}
            other => {
                return Err(MatchingServiceError::Forbidden {
                    actor: other.label(),
                    action: "withdraw this application",
                })
            }
        }

        let step = transition(record.state, LifecycleEvent::Withdraw, GuardResult::Pass)?;
        let opportunity_id = record.opportunity_id.clone();
        let stored = self.commit(record, &step, actor)?;
        if step.from.holds_seat() {
            self.release_seat(&opportunity_id);
        }
        Ok(stored)
    }

    /// Close the opportunity, then cascade every open application to `Closed`.
    pub fn close_opportunity(
        &self,
        opportunity_id: &OpportunityId,
        actor: &Actor,
    ) -> Result<CloseSummary, MatchingServiceError> {
        let opportunity = self.load_opportunity(opportunity_id)?;
        authorize_owner(actor, &opportunity, true, "close the opportunity")?;

        self.ports.opportunities.close(opportunity_id)?;
        info!(opportunity = %opportunity_id, "opportunity closed");

        let mut summary = CloseSummary {
            opportunity_id: Some(opportunity_id.clone()),
            ..CloseSummary::default()
        };
        let open: Vec<ApplicationId> = self
            .ports
            .applications
            .for_opportunity(opportunity_id)?
            .into_iter()
            .filter(ApplicationRecord::is_active)
            .map(|record| record.id)
            .collect();

        for application_id in open {
            match self.close_application(&application_id, actor) {
                Ok(Some(id)) => summary.closed.push(id),
                Ok(None) => {}
                Err(err) => {
                    warn!(application = %application_id, error = %err, "close cascade deferred");
                    summary.deferred.push(application_id);
                }
            }
        }

        Ok(summary)
    }

    /// Fresh scores for every open application on the opportunity, best first.
    pub fn rank_applicants(
        &self,
        opportunity_id: &OpportunityId,
    ) -> Result<Vec<MatchScore>, MatchingServiceError> {
        let opportunity = self.load_opportunity(opportunity_id)?;
        let mut scores = Vec::new();
        for record in self.ports.applications.for_opportunity(opportunity_id)? {
            if !record.is_active() {
                continue;
            }
            let candidate = self.load_candidate(&record.candidate_id)?;
            scores.push(self.engine.compute_match(&candidate, &opportunity));
        }
        Ok(rank(scores))
    }

    pub fn get(
        &self,
        application_id: &ApplicationId,
    ) -> Result<ApplicationRecord, MatchingServiceError> {
        self.load_application(application_id)
    }

    fn open_application(
        &self,
        candidate_id: &CandidateId,
        opportunity_id: &OpportunityId,
        route: bool,
    ) -> Result<ApplicationRecord, MatchingServiceError> {
        validation::require_identifier("candidate_id", &candidate_id.0)?;
        validation::require_identifier("opportunity_id", &opportunity_id.0)?;

        self.settle_releases(opportunity_id);
        let candidate = self.load_candidate(candidate_id)?;
        let opportunity = self.load_opportunity(opportunity_id)?;

        if !opportunity.is_open() {
            return Err(MatchingServiceError::OpportunityClosed(opportunity.id));
        }
        check_eligibility(&candidate, &opportunity)?;
        if self
            .ports
            .applications
            .active_for_pair(candidate_id, opportunity_id)?
            .is_some()
        {
            return Err(duplicate(candidate_id, opportunity_id));
        }
        if opportunity.is_full() {
            return Err(MatchingServiceError::CapacityExceeded(opportunity.id));
        }

        let actor = Actor::Candidate(candidate.id.clone());
        let score = self.engine.compute_match(&candidate, &opportunity);
        let mut attempt = 0;
        let (stored, effects) = loop {
            attempt += 1;
            let now = Utc::now();
            let mut record =
                ApplicationRecord::draft(next_application_id(), score.clone(), &actor, now);
            let submitted = transition(record.state, LifecycleEvent::Submit, GuardResult::Pass)?;
            record.apply(&submitted, &actor, now);

            let mut effects = Vec::new();
            if route {
                let routed = self.route_step(&candidate, &record)?;
                absorb(&mut record, &routed, &Actor::System);
                effects = routed.effects;
            }

            match self.ports.applications.insert(record) {
                Ok(stored) => break (stored, effects),
                Err(RepositoryError::ActivePairExists) => {
                    return Err(duplicate(candidate_id, opportunity_id))
                }
                Err(RepositoryError::DuplicateId) if attempt < self.retry_budget => {
                    debug!(attempt, "application id already taken, drawing another");
                }
                Err(err) => return Err(err.into()),
            }
        };

        info!(
            application = %stored.id,
            candidate = %stored.candidate_id,
            opportunity = %stored.opportunity_id,
            state = %stored.state,
            overall = stored.match_score.overall,
            "application submitted"
        );
        self.dispatch_effects(&stored, &effects);
        Ok(stored)
    }

    fn route(&self, record: ApplicationRecord) -> Result<ApplicationRecord, MatchingServiceError> {
        let candidate = self.load_candidate(&record.candidate_id)?;
        let step = self.route_step(&candidate, &record)?;
        self.commit(record, &step, &Actor::System)
    }

    fn route_step(
        &self,
        candidate: &CandidateProfile,
        record: &ApplicationRecord,
    ) -> Result<Transition, MatchingServiceError> {
        let consent = self.ports.consents.consent_for(&candidate.id)?;
        let gate = self.gate.check_gate(candidate, record, consent.as_ref());
        debug!(
            application = %record.id,
            reason = gate.reason.label(),
            allowed = gate.allowed,
            "consent gate evaluated"
        );
        Ok(transition(
            record.state,
            LifecycleEvent::Route,
            gate.as_guard(),
        )?)
    }

    fn close_application(
        &self,
        application_id: &ApplicationId,
        actor: &Actor,
    ) -> Result<Option<ApplicationId>, MatchingServiceError> {
        for _ in 0..self.retry_budget {
            let record = self.load_application(application_id)?;
            if !record.is_active() {
                return Ok(None);
            }
            let step = transition(record.state, LifecycleEvent::Close, GuardResult::Pass)?;
            match self.commit(record, &step, actor) {
                Ok(stored) => {
                    if step.from.holds_seat() {
                        self.release_seat(&stored.opportunity_id);
                    }
                    return Ok(Some(stored.id));
                }
                Err(MatchingServiceError::StaleApplication(_)) => continue,
                Err(err) => return Err(err),
            }
        }
        Err(MatchingServiceError::StaleApplication(
            application_id.clone(),
        ))
    }

    /// Optimistic admission: read version and count, write back only if the version is unchanged.
    fn reserve_seat(
        &self,
        opportunity_id: &OpportunityId,
    ) -> Result<SeatReservation, MatchingServiceError> {
        self.settle_releases(opportunity_id);
        for attempt in 1..=self.retry_budget {
            let opportunity = self.load_opportunity(opportunity_id)?;
            if !opportunity.is_open() {
                return Err(MatchingServiceError::OpportunityClosed(opportunity.id));
            }
            if opportunity.is_full() {
                return Ok(SeatReservation::Full);
            }

            match self.ports.opportunities.commit_accepted(
                opportunity_id,
                opportunity.version,
                opportunity.current_accepted + 1,
            ) {
                Ok(updated) => {
                    debug!(
                        opportunity = %opportunity_id,
                        accepted = updated.current_accepted,
                        capacity = updated.capacity,
                        attempt,
                        "seat reserved"
                    );
                    return Ok(SeatReservation::Reserved);
                }
                Err(RepositoryError::StaleVersion { expected, found }) => {
                    debug!(
                        opportunity = %opportunity_id,
                        expected,
                        found,
                        attempt,
                        "admission conflict, retrying"
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }

        if self.load_opportunity(opportunity_id)?.is_full() {
            return Ok(SeatReservation::Full);
        }
        warn!(
            opportunity = %opportunity_id,
            budget = self.retry_budget,
            "admission retry budget exhausted"
        );
        Ok(SeatReservation::Contended)
    }

    /// Owe the opportunity one seat, then try to hand every owed seat back.
    fn release_seat(&self, opportunity_id: &OpportunityId) {
        {
            let mut owed = self.owed_releases.lock().expect("release ledger mutex poisoned");
            *owed.entry(opportunity_id.clone()).or_default() += 1;
        }
        self.settle_releases(opportunity_id);
    }

    /// Apply owed seat releases. Version conflicts are retried until the write lands because a
    /// decrement can never oversell; store failures leave the debt for the next admission read.
    fn settle_releases(&self, opportunity_id: &OpportunityId) {
        loop {
            let claimed = self.claim_releases(opportunity_id);
            if claimed == 0 {
                return;
            }

            let opportunity = match self.ports.opportunities.opportunity(opportunity_id) {
                Ok(Some(opportunity)) => opportunity,
                Ok(None) => return,
                Err(err) => {
                    self.defer_releases(opportunity_id, claimed, &err);
                    return;
                }
            };
            if opportunity.current_accepted == 0 {
                return;
            }

            let released = claimed.min(opportunity.current_accepted);
            match self.ports.opportunities.commit_accepted(
                opportunity_id,
                opportunity.version,
                opportunity.current_accepted - released,
            ) {
                Ok(updated) => debug!(
                    opportunity = %opportunity_id,
                    released,
                    accepted = updated.current_accepted,
                    "seats released"
                ),
                Err(RepositoryError::StaleVersion { .. }) => {
                    self.return_claim(opportunity_id, claimed);
                }
                Err(err) => {
                    self.defer_releases(opportunity_id, claimed, &err);
                    return;
                }
            }
        }
    }

    fn claim_releases(&self, opportunity_id: &OpportunityId) -> u32 {
        self.owed_releases
            .lock()
            .expect("release ledger mutex poisoned")
            .remove(opportunity_id)
            .unwrap_or_default()
    }

    fn return_claim(&self, opportunity_id: &OpportunityId, claimed: u32) {
        let mut owed = self.owed_releases.lock().expect("release ledger mutex poisoned");
        *owed.entry(opportunity_id.clone()).or_default() += claimed;
    }

    fn defer_releases(&self, opportunity_id: &OpportunityId, claimed: u32, err: &RepositoryError) {
        self.return_claim(opportunity_id, claimed);
        warn!(
            opportunity = %opportunity_id,
            owed = claimed,
            error = %err,
            "seat release deferred"
        );
    }

    /// Seats given back by finished applications but not yet written to the catalog.
    pub fn pending_releases(&self, opportunity_id: &OpportunityId) -> u32 {
        self.owed_releases
            .lock()
            .expect("release ledger mutex poisoned")
            .get(opportunity_id)
            .copied()
            .unwrap_or_default()
    }

    /// Persist a transition and release its effects. Nothing is written or emitted on failure.
    fn commit(
        &self,
        mut record: ApplicationRecord,
        step: &Transition,
        actor: &Actor,
    ) -> Result<ApplicationRecord, MatchingServiceError> {
        if step.is_noop() && step.effects.is_empty() {
            return Ok(record);
        }

        absorb(&mut record, step, actor);
        let application_id = record.id.clone();
        let stored = self
            .ports
            .applications
            .update(record)
            .map_err(|err| match err {
                RepositoryError::StaleVersion { .. } => {
                    MatchingServiceError::StaleApplication(application_id)
                }
                other => other.into(),
            })?;

        info!(
            application = %stored.id,
            from = %step.from,
            to = %step.to,
            actor = %actor.label(),
            reason = step.reason.map(|reason| reason.label()).unwrap_or("-"),
            "application transitioned"
        );
        self.dispatch_effects(&stored, &step.effects);
        Ok(stored)
    }

    /// Fire-and-forget delivery to the notification and credential sinks.
    fn dispatch_effects(&self, record: &ApplicationRecord, effects: &[LifecycleEffect]) {
        for effect in effects {
            let delivery = match effect {
                LifecycleEffect::GuardianConsentRequested => {
                    let recipient = self
                        .ports
                        .profiles
                        .candidate(&record.candidate_id)
                        .ok()
                        .flatten()
                        .and_then(|candidate| candidate.guardian_contact);
                    let Some(recipient) = recipient else {
                        warn!(application = %record.id, "no guardian contact for consent request");
                        continue;
                    };
                    self.ports
                        .notifications
                        .dispatch(notification("guardian_consent_requested", record, recipient))
                }
                LifecycleEffect::DecisionIssued { state, reason } => {
                    let mut message =
                        notification("application_decision", record, record.candidate_id.0.clone());
                    message
                        .details
                        .insert("state".to_string(), state.label().to_string());
                    if let Some(reason) = reason {
                        message
                            .details
                            .insert("reason".to_string(), reason.label().to_string());
                    }
                    self.ports.notifications.dispatch(message)
                }
                LifecycleEffect::ApplicationClosed => self.ports.notifications.dispatch(
                    notification("application_closed", record, record.candidate_id.0.clone()),
                ),
                LifecycleEffect::CredentialAwarded => {
                    let xp = self
                        .ports
                        .opportunities
                        .opportunity(&record.opportunity_id)
                        .ok()
                        .flatten()
                        .map(|opportunity| opportunity.xp_reward)
                        .unwrap_or_default();
                    self.ports.credentials.award(CredentialAward {
                        application_id: record.id.clone(),
                        candidate_id: record.candidate_id.clone(),
                        opportunity_id: record.opportunity_id.clone(),
                        xp,
                        awarded_at: Utc::now(),
                    })
                }
            };

            if let Err(err) = delivery {
                warn!(application = %record.id, ?effect, error = %err, "side effect dropped");
            }
        }
    }

    fn has_verified_consent(&self, candidate: &CandidateId) -> Result<bool, MatchingServiceError> {
        Ok(self
            .ports
            .consents
            .consent_for(candidate)?
            .is_some_and(|consent| consent.verified))
    }

    fn load_application(
        &self,
        id: &ApplicationId,
    ) -> Result<ApplicationRecord, MatchingServiceError> {
        self.ports
            .applications
            .fetch(id)?
            .ok_or_else(|| MatchingServiceError::NotFound {
                resource: "application",
                id: id.0.clone(),
            })
    }

    fn load_candidate(&self, id: &CandidateId) -> Result<CandidateProfile, MatchingServiceError> {
        let candidate =
            self.ports
                .profiles
                .candidate(id)?
                .ok_or_else(|| MatchingServiceError::NotFound {
                    resource: "candidate",
                    id: id.0.clone(),
                })?;
        validation::validate_candidate(&candidate)?;
        Ok(candidate)
    }

    fn load_opportunity(&self, id: &OpportunityId) -> Result<Opportunity, MatchingServiceError> {
        let opportunity = self.ports.opportunities.opportunity(id)?.ok_or_else(|| {
            MatchingServiceError::NotFound {
                resource: "opportunity",
                id: id.0.clone(),
            }
        })?;
        validation::validate_opportunity(&opportunity)?;
        Ok(opportunity)
    }
}

fn absorb(record: &mut ApplicationRecord, step: &Transition, actor: &Actor) {
    record.apply(step, actor, Utc::now());
    if step
        .effects
        .contains(&LifecycleEffect::GuardianConsentRequested)
    {
        record.consent_requested = true;
    }
}

fn notification(template: &str, record: &ApplicationRecord, recipient: String) -> Notification {
    let mut details = BTreeMap::new();
    details.insert("candidate_id".to_string(), record.candidate_id.0.clone());
    details.insert("opportunity_id".to_string(), record.opportunity_id.0.clone());
    Notification {
        template: template.to_string(),
        application_id: record.id.clone(),
        recipient,
        details,
    }
}

fn duplicate(candidate: &CandidateId, opportunity: &OpportunityId) -> MatchingServiceError {
    MatchingServiceError::DuplicateApplication {
        candidate: candidate.clone(),
        opportunity: opportunity.clone(),
    }
}

fn check_eligibility(
    candidate: &CandidateProfile,
    opportunity: &Opportunity,
) -> Result<(), MatchingServiceError> {
    let Some(minimum) = opportunity.minimum_age else {
        return Ok(());
    };

    let reason = match candidate.age {
        Some(age) if age >= minimum => return Ok(()),
        Some(age) => format!("age {age} is below the minimum of {minimum}"),
        None => format!("age is unknown and the opportunity requires {minimum}+"),
    };
    Err(MatchingServiceError::CandidateIneligible {
        candidate: candidate.id.clone(),
        reason,
    })
}

fn authorize_owner(
    actor: &Actor,
    opportunity: &Opportunity,
    allow_system: bool,
    action: &'static str,
) -> Result<(), MatchingServiceError> {
    match actor {
        Actor::Owner(owner) if *owner == opportunity.owner => Ok(()),
        Actor::System if allow_system => Ok(()),
        other => Err(MatchingServiceError::Forbidden {
            actor: other.label(),
            action,
        }),
    }
}

/// Caller-facing error classes; callers render or retry based on the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Permission,
    State,
    Capacity,
    Consent,
    NotFound,
    Unavailable,
}

impl ErrorKind {
    pub const fn label(self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Permission => "permission",
            ErrorKind::State => "state",
            ErrorKind::Capacity => "capacity",
            ErrorKind::Consent => "consent",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Unavailable => "unavailable",
        }
    }

    /// State and capacity failures can be retried after reloading.
    pub const fn is_recoverable(self) -> bool {
        matches!(self, ErrorKind::State | ErrorKind::Capacity)
    }
}

/// Error raised by the matching service.
#[derive(Debug, thiserror::Error)]
pub enum MatchingServiceError {
    #[error("candidate {candidate} already has an open application for {opportunity}")]
    DuplicateApplication {
        candidate: CandidateId,
        opportunity: OpportunityId,
    },
    #[error("opportunity {0} is closed")]
    OpportunityClosed(OpportunityId),
    #[error("candidate {candidate} is ineligible: {reason}")]
    CandidateIneligible {
        candidate: CandidateId,
        reason: String,
    },
    #[error("opportunity {0} has no remaining capacity")]
    CapacityExceeded(OpportunityId),
    #[error("guardian consent required ({})", .0.label())]
    ConsentRequired(GateReason),
    #[error("access token is missing or not valid for this action")]
    InvalidToken,
    #[error("{actor} may not {action}")]
    Forbidden { actor: String, action: &'static str },
    #[error(transparent)]
    InvalidState(#[from] LifecycleError),
    #[error("application {0} changed concurrently; reload and retry")]
    StaleApplication(ApplicationId),
    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: String },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Repository(RepositoryError),
    #[error(transparent)]
    Identity(IdentityError),
}

impl MatchingServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MatchingServiceError::Validation(_) => ErrorKind::Validation,
            MatchingServiceError::CandidateIneligible { .. } => ErrorKind::Validation,
            MatchingServiceError::InvalidToken | MatchingServiceError::Forbidden { .. } => {
                ErrorKind::Permission
            }
            MatchingServiceError::DuplicateApplication { .. }
            | MatchingServiceError::OpportunityClosed(_)
            | MatchingServiceError::StaleApplication(_) => ErrorKind::State,
            MatchingServiceError::InvalidState(LifecycleError::ConsentPending) => {
                ErrorKind::Consent
            }
            MatchingServiceError::InvalidState(_) => ErrorKind::State,
            MatchingServiceError::CapacityExceeded(_) => ErrorKind::Capacity,
            MatchingServiceError::ConsentRequired(_) => ErrorKind::Consent,
            MatchingServiceError::NotFound { .. } => ErrorKind::NotFound,
            MatchingServiceError::Repository(RepositoryError::NotFound) => ErrorKind::NotFound,
            MatchingServiceError::Repository(_) | MatchingServiceError::Identity(_) => {
                ErrorKind::Unavailable
            }
        }
    }
}

impl From<RepositoryError> for MatchingServiceError {
    fn from(value: RepositoryError) -> Self {
        Self::Repository(value)
    }
}

impl From<IdentityError> for MatchingServiceError {
    fn from(value: IdentityError) -> Self {
        match value {
            IdentityError::UnknownToken => Self::InvalidToken,
            other => Self::Identity(other),
        }
    }
}
