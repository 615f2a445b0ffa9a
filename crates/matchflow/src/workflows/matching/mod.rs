//! Candidate-to-opportunity matching and the guarded application lifecycle.
//!
//! Reads flow from the profile store and opportunity catalog through the
//! [`ScoreEngine`]; writes flow through [`MatchingService`], which consults the
//! [`ConsentGate`] and the lifecycle transition function before committing and
//! then hands side effects to the notification and credential sinks.

pub mod consent;
pub mod domain;
pub mod identity;
pub mod lifecycle;
pub mod memory;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;
pub mod validation;

#[cfg(test)]
mod tests;

pub use consent::{ConsentGate, ConsentPolicy, GateReason, GateResult};
pub use domain::{
    Actor, ApplicationId, CandidateId, CandidateProfile, CandidateRole, ConsentRecord, Decision,
    InterestArea, Opportunity, OpportunityId, OpportunityStatus, OwnerId, Proficiency,
    SkillRequirement, WorkStyle,
};
pub use identity::{AccessToken, IdentityError, IdentityProvider};
pub use lifecycle::{ApplicationState, StatusReason};
pub use repository::{
    ApplicationRecord, ApplicationRepository, ApplicationStatusView, ConsentRegistry,
    CredentialAward, CredentialLedger, Notification, NotificationDispatcher, OpportunityCatalog,
    ProfileStore, RepositoryError, SinkError, StatusEntry,
};
pub use router::application_router;
pub use scoring::{MatchCategory, MatchScore, ScoreEngine};
pub use service::{
    ApplicationEvent, ApplicationOutcome, CloseSummary, ErrorKind, MatchingPorts,
    MatchingService, MatchingServiceError, MatchingSettings,
};
pub use validation::ValidationError;
