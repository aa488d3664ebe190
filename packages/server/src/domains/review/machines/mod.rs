//! Draft state machine - legal transitions and review decisions
//!
//! Transition table:
//!   DRAFT              -> SUBMITTED          (submit)
//!   CHANGES_REQUESTED  -> SUBMITTED          (resubmit: new row, version + 1)
//!   SUBMITTED          -> PUBLISHED          (approve; APPROVED collapsed in)
//!   SUBMITTED          -> CHANGES_REQUESTED  (send back, reason required)
//!   SUBMITTED          -> REJECTED           (terminal, reason required)
//!
//! Every transition is a conditional update: it executes only if the
//! persisted state still equals the expected source state, otherwise the
//! store surfaces a Conflict instead of overwriting a concurrent decision.

use crate::common::{MemberId, ReviewError};

use super::models::{DraftState, ModerationActionType};

/// An administrator's decision on a submitted draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewDecision {
    Approve,
    Reject { reason: String },
    RequestChanges { reason: String },
}

impl ReviewDecision {
    /// The ledger entry this decision produces.
    pub fn action_type(&self) -> ModerationActionType {
        match self {
            ReviewDecision::Approve => ModerationActionType::Approve,
            ReviewDecision::Reject { .. } => ModerationActionType::Reject,
            ReviewDecision::RequestChanges { .. } => ModerationActionType::RequestChanges,
        }
    }

    /// The draft state this decision commits.
    pub fn target_state(&self) -> DraftState {
        match self {
            ReviewDecision::Approve => DraftState::Published,
            ReviewDecision::Reject { .. } => DraftState::Rejected,
            ReviewDecision::RequestChanges { .. } => DraftState::ChangesRequested,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            ReviewDecision::Approve => None,
            ReviewDecision::Reject { reason } | ReviewDecision::RequestChanges { reason } => {
                Some(reason.as_str())
            }
        }
    }

    /// Reject and request-changes carry a mandatory, non-empty reason.
    /// Checked before any mutation.
    pub fn ensure_reason(&self) -> Result<(), ReviewError> {
        match self.reason() {
            Some(reason) if reason.trim().is_empty() => Err(ReviewError::Validation(format!(
                "a reason is required to {}",
                self.action_type()
            ))),
            _ => Ok(()),
        }
    }
}

/// Whether `from -> to` is a legal draft transition.
pub fn is_legal_transition(from: DraftState, to: DraftState) -> bool {
    matches!(
        (from, to),
        (DraftState::Draft, DraftState::Submitted)
            | (DraftState::ChangesRequested, DraftState::Submitted)
            | (DraftState::Submitted, DraftState::Approved)
            | (DraftState::Approved, DraftState::Published)
            // Approval commits SUBMITTED -> APPROVED -> PUBLISHED as one step.
            | (DraftState::Submitted, DraftState::Published)
            | (DraftState::Submitted, DraftState::ChangesRequested)
            | (DraftState::Submitted, DraftState::Rejected)
    )
}

/// Guard used by the stores before committing a transition.
pub fn ensure_transition(from: DraftState, to: DraftState) -> Result<(), ReviewError> {
    if is_legal_transition(from, to) {
        Ok(())
    } else {
        Err(ReviewError::Conflict(format!(
            "draft is {}, cannot move to {}",
            from, to
        )))
    }
}

/// What the review coordinator asks the store to commit, after preconditions
/// passed. Bundled so the store can write the transition, the live-entity
/// update, and the ledger entry in one atomic unit.
#[derive(Debug, Clone)]
pub struct DecisionCommit {
    pub reviewer: MemberId,
    pub decision: ReviewDecision,
}

#[cfg(test)]
mod tests {
    use super::*;
    use DraftState::*;

    const ALL: [DraftState; 6] = [Draft, Submitted, ChangesRequested, Approved, Published, Rejected];

    #[test]
    fn exactly_the_spec_transitions_are_legal() {
        let legal = [
            (Draft, Submitted),
            (ChangesRequested, Submitted),
            (Submitted, Approved),
            (Approved, Published),
            (Submitted, Published),
            (Submitted, ChangesRequested),
            (Submitted, Rejected),
        ];
        for from in ALL {
            for to in ALL {
                assert_eq!(
                    is_legal_transition(from, to),
                    legal.contains(&(from, to)),
                    "transition {:?} -> {:?}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn terminal_states_have_no_outgoing_transitions() {
        for from in [Published, Rejected] {
            for to in ALL {
                assert!(!is_legal_transition(from, to));
            }
        }
    }

    #[test]
    fn illegal_transition_is_a_conflict() {
        let err = ensure_transition(Published, Submitted).unwrap_err();
        assert!(matches!(err, ReviewError::Conflict(_)));
    }

    #[test]
    fn reject_requires_a_reason() {
        let decision = ReviewDecision::Reject { reason: "  ".to_string() };
        assert!(matches!(
            decision.ensure_reason(),
            Err(ReviewError::Validation(_))
        ));

        let decision = ReviewDecision::RequestChanges { reason: String::new() };
        assert!(decision.ensure_reason().is_err());

        assert!(ReviewDecision::Approve.ensure_reason().is_ok());
        let decision = ReviewDecision::Reject { reason: "pricing is wrong".to_string() };
        assert!(decision.ensure_reason().is_ok());
    }

    #[test]
    fn decisions_map_to_states_and_actions() {
        assert_eq!(ReviewDecision::Approve.target_state(), Published);
        let reject = ReviewDecision::Reject { reason: "no".into() };
        assert_eq!(reject.target_state(), Rejected);
        assert_eq!(reject.action_type(), ModerationActionType::Reject);
        let back = ReviewDecision::RequestChanges { reason: "fix".into() };
        assert_eq!(back.target_state(), ChangesRequested);
    }
}
