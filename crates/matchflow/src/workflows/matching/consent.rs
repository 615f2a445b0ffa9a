use serde::{Deserialize, Serialize};

use super::domain::{CandidateProfile, CandidateRole, ConsentRecord};
use super::lifecycle::GuardResult;
use super::repository::ApplicationRecord;

pub const DEFAULT_ADULT_AGE: u8 = 18;

/// Policy dial deciding who counts as a minor.
#[derive(Debug, Clone)]
pub struct ConsentPolicy {
    adult_age: u8,
}

impl ConsentPolicy {
    pub fn new(adult_age: u8) -> Self {
        let sanitized = if adult_age == 0 {
            DEFAULT_ADULT_AGE
        } else {
            adult_age
        };

        Self {
            adult_age: sanitized,
        }
    }

    pub fn adult_age(&self) -> u8 {
        self.adult_age
    }
}

impl Default for ConsentPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ADULT_AGE)
    }
}

/// Why the gate let an application through or held it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateReason {
    NotRequired,
    ConsentVerified,
    AwaitingGuardian,
    MissingGuardianContact,
}

impl GateReason {
    pub const fn label(self) -> &'static str {
        match self {
            GateReason::NotRequired => "consent_not_required",
            GateReason::ConsentVerified => "consent_verified",
            GateReason::AwaitingGuardian => "awaiting_guardian",
            GateReason::MissingGuardianContact => "missing_guardian_contact",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateResult {
    pub allowed: bool,
    pub reason: GateReason,
    /// Set only on the first block for an application that has somewhere to send the request.
    pub request_consent: bool,
}

impl GateResult {
    fn allow(reason: GateReason) -> Self {
        Self {
            allowed: true,
            reason,
            request_consent: false,
        }
    }

    pub fn as_guard(&self) -> GuardResult {
        if self.allowed {
            GuardResult::Pass
        } else {
            GuardResult::ConsentPending {
                first_block: self.request_consent,
            }
        }
    }
}

/// Minor-safety gate consulted before an application may reach owner review.
#[derive(Debug, Clone, Default)]
pub struct ConsentGate {
    policy: ConsentPolicy,
}

impl ConsentGate {
    pub fn with_policy(policy: ConsentPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ConsentPolicy {
        &self.policy
    }

    pub fn requires_consent(&self, candidate: &CandidateProfile) -> bool {
        let under_age = candidate
            .age
            .map(|age| age < self.policy.adult_age)
            .unwrap_or(false);
        under_age || candidate.has_role(CandidateRole::Minor)
    }

    pub fn check_gate(
        &self,
        candidate: &CandidateProfile,
        application: &ApplicationRecord,
        consent: Option<&ConsentRecord>,
    ) -> GateResult {
        if !self.requires_consent(candidate) {
            return GateResult::allow(GateReason::NotRequired);
        }

        if consent.is_some_and(|record| is_verified_for(record, candidate)) {
            return GateResult::allow(GateReason::ConsentVerified);
        }

        match candidate.guardian_contact {
            Some(_) => GateResult {
                allowed: false,
                reason: GateReason::AwaitingGuardian,
                request_consent: !application.consent_requested,
            },
            None => GateResult {
                allowed: false,
                reason: GateReason::MissingGuardianContact,
                request_consent: false,
            },
        }
    }
}

fn is_verified_for(record: &ConsentRecord, candidate: &CandidateProfile) -> bool {
    if !record.verified || record.candidate_id != candidate.id {
        return false;
    }

    match &candidate.guardian_contact {
        Some(contact) => contact.eq_ignore_ascii_case(&record.guardian_contact),
        None => true,
    }
}
