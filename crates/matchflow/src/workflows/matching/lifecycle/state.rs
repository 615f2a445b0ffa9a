use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle position of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationState {
    Draft,
    Submitted,
    PendingGuardianConsent,
    PendingOwnerReview,
    Approved,
    InProgress,
    Completed,
    Rejected,
    Withdrawn,
    Closed,
}

impl ApplicationState {
    pub const ALL: [ApplicationState; 10] = [
        ApplicationState::Draft,
        ApplicationState::Submitted,
        ApplicationState::PendingGuardianConsent,
        ApplicationState::PendingOwnerReview,
        ApplicationState::Approved,
        ApplicationState::InProgress,
        ApplicationState::Completed,
        ApplicationState::Rejected,
        ApplicationState::Withdrawn,
        ApplicationState::Closed,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ApplicationState::Draft => "draft",
            ApplicationState::Submitted => "submitted",
            ApplicationState::PendingGuardianConsent => "pending_guardian_consent",
            ApplicationState::PendingOwnerReview => "pending_owner_review",
            ApplicationState::Approved => "approved",
            ApplicationState::InProgress => "in_progress",
            ApplicationState::Completed => "completed",
            ApplicationState::Rejected => "rejected",
            ApplicationState::Withdrawn => "withdrawn",
            ApplicationState::Closed => "closed",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            ApplicationState::Completed
                | ApplicationState::Rejected
                | ApplicationState::Withdrawn
                | ApplicationState::Closed
        )
    }

    /// Approved and in-progress applications occupy one unit of opportunity capacity.
    pub const fn holds_seat(self) -> bool {
        matches!(self, ApplicationState::Approved | ApplicationState::InProgress)
    }

    /// Position along the happy path; every committed transition strictly increases it.
    pub const fn stage(self) -> u8 {
        match self {
            ApplicationState::Draft => 0,
            ApplicationState::Submitted => 1,
            ApplicationState::PendingGuardianConsent => 2,
            ApplicationState::PendingOwnerReview => 3,
            ApplicationState::Approved => 4,
            ApplicationState::InProgress => 5,
            ApplicationState::Completed
            | ApplicationState::Rejected
            | ApplicationState::Withdrawn
            | ApplicationState::Closed => 6,
        }
    }
}

impl fmt::Display for ApplicationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Recorded cause for side-branch transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusReason {
    GuardianDeclined,
    OwnerDeclined,
    CapacityExhausted,
    CandidateWithdrew,
    OpportunityClosed,
}

impl StatusReason {
    pub const fn label(self) -> &'static str {
        match self {
            StatusReason::GuardianDeclined => "guardian_declined",
            StatusReason::OwnerDeclined => "owner_declined",
            StatusReason::CapacityExhausted => "capacity_exhausted",
            StatusReason::CandidateWithdrew => "candidate_withdrew",
            StatusReason::OpportunityClosed => "opportunity_closed",
        }
    }
}

impl fmt::Display for StatusReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
