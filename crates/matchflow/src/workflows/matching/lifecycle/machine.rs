use std::fmt;

use serde::{Deserialize, Serialize};

use super::state::{ApplicationState, StatusReason};

/// Inputs that may move an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    Submit,
    /// Consult the consent gate after submission (or again while parked).
    Route,
    GuardianApprove,
    GuardianReject,
    OwnerApprove,
    OwnerReject,
    Start,
    Complete,
    Withdraw,
    Close,
}

impl LifecycleEvent {
    pub const ALL: [LifecycleEvent; 10] = [
        LifecycleEvent::Submit,
        LifecycleEvent::Route,
        LifecycleEvent::GuardianApprove,
        LifecycleEvent::GuardianReject,
        LifecycleEvent::OwnerApprove,
        LifecycleEvent::OwnerReject,
        LifecycleEvent::Start,
        LifecycleEvent::Complete,
        LifecycleEvent::Withdraw,
        LifecycleEvent::Close,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            LifecycleEvent::Submit => "submit",
            LifecycleEvent::Route => "route",
            LifecycleEvent::GuardianApprove => "guardian_approve",
            LifecycleEvent::GuardianReject => "guardian_reject",
            LifecycleEvent::OwnerApprove => "owner_approve",
            LifecycleEvent::OwnerReject => "owner_reject",
            LifecycleEvent::Start => "start",
            LifecycleEvent::Complete => "complete",
            LifecycleEvent::Withdraw => "withdraw",
            LifecycleEvent::Close => "close",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of the guards evaluated by the caller before asking for a transition.
///
/// Only `Route`, `GuardianApprove`, and `OwnerApprove` consult it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardResult {
    Pass,
    ConsentPending { first_block: bool },
    CapacityExhausted,
}

/// Side effects released to external sinks once a transition commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEffect {
    GuardianConsentRequested,
    DecisionIssued {
        state: ApplicationState,
        reason: Option<StatusReason>,
    },
    CredentialAwarded,
    ApplicationClosed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: ApplicationState,
    pub to: ApplicationState,
    pub reason: Option<StatusReason>,
    pub effects: Vec<LifecycleEffect>,
}

impl Transition {
    fn to(from: ApplicationState, to: ApplicationState) -> Self {
        Self {
            from,
            to,
            reason: None,
            effects: Vec::new(),
        }
    }

    fn stay(state: ApplicationState) -> Self {
        Self::to(state, state)
    }

    fn because(mut self, reason: StatusReason) -> Self {
        self.reason = Some(reason);
        self
    }

    fn emit(mut self, effect: LifecycleEffect) -> Self {
        self.effects.push(effect);
        self
    }

    fn decided(self) -> Self {
        let effect = LifecycleEffect::DecisionIssued {
            state: self.to,
            reason: self.reason,
        };
        self.emit(effect)
    }

    /// True when the transition leaves the state untouched (idempotent repeat).
    pub fn is_noop(&self) -> bool {
        self.from == self.to
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("cannot {event} an application that is {state}")]
    InvalidTransition {
        state: ApplicationState,
        event: LifecycleEvent,
    },
    #[error("guardian consent is still pending")]
    ConsentPending,
    #[error("guard {guard:?} does not apply to {event}")]
    GuardNotApplicable {
        event: LifecycleEvent,
        guard: GuardResult,
    },
}

/// Total transition function: every `(state, event, guard)` triple maps to a transition or an error.
pub fn transition(
    current: ApplicationState,
    event: LifecycleEvent,
    guard: GuardResult,
) -> Result<Transition, LifecycleError> {
    use ApplicationState as S;
    use LifecycleEvent as E;

    let invalid = || LifecycleError::InvalidTransition {
        state: current,
        event,
    };

    if current.is_terminal() {
        return Err(invalid());
    }

    match (current, event) {
        (_, E::Withdraw) => {
            Ok(Transition::to(current, S::Withdrawn).because(StatusReason::CandidateWithdrew))
        }
        (_, E::Close) => Ok(Transition::to(current, S::Closed)
            .because(StatusReason::OpportunityClosed)
            .emit(LifecycleEffect::ApplicationClosed)),

        (S::Draft, E::Submit) => Ok(Transition::to(current, S::Submitted)),

        (S::Submitted | S::PendingGuardianConsent, E::Route) => match guard {
            GuardResult::Pass => Ok(Transition::to(current, S::PendingOwnerReview)),
            GuardResult::ConsentPending { first_block } => {
                let parked = if current == S::Submitted {
                    Transition::to(current, S::PendingGuardianConsent)
                } else {
                    Transition::stay(current)
                };
                Ok(if first_block {
                    parked.emit(LifecycleEffect::GuardianConsentRequested)
                } else {
                    parked
                })
            }
            GuardResult::CapacityExhausted => {
                Err(LifecycleError::GuardNotApplicable { event, guard })
            }
        },

        (S::PendingGuardianConsent, E::GuardianApprove) => match guard {
            GuardResult::Pass => Ok(Transition::to(current, S::PendingOwnerReview)),
            GuardResult::ConsentPending { .. } => Err(LifecycleError::ConsentPending),
            GuardResult::CapacityExhausted => {
                Err(LifecycleError::GuardNotApplicable { event, guard })
            }
        },
        (S::PendingGuardianConsent, E::GuardianReject) => Ok(Transition::to(current, S::Rejected)
            .because(StatusReason::GuardianDeclined)
            .decided()),

        (S::PendingOwnerReview, E::OwnerApprove) => match guard {
            GuardResult::Pass => Ok(Transition::to(current, S::Approved).decided()),
            GuardResult::CapacityExhausted => Ok(Transition::to(current, S::Rejected)
                .because(StatusReason::CapacityExhausted)
                .decided()),
            GuardResult::ConsentPending { .. } => Err(LifecycleError::ConsentPending),
        },
        (S::PendingOwnerReview, E::OwnerReject) => Ok(Transition::to(current, S::Rejected)
            .because(StatusReason::OwnerDeclined)
            .decided()),

        (S::Approved, E::Start) => Ok(Transition::to(current, S::InProgress)),
        (S::InProgress, E::Start) => Ok(Transition::stay(current)),
        (S::InProgress, E::Complete) => {
            Ok(Transition::to(current, S::Completed).emit(LifecycleEffect::CredentialAwarded))
        }

        _ => Err(invalid()),
    }
}
