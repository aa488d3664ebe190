use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{DraftId, LineageId, MemberId};

/// Which kind of marketplace entity a draft proposes changes to.
///
/// Carried explicitly on the draft - never inferred from which identifier
/// field happens to be populated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Service,
    Vendor,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Service => write!(f, "service"),
            EntityKind::Vendor => write!(f, "vendor"),
        }
    }
}

impl std::str::FromStr for EntityKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "service" => Ok(EntityKind::Service),
            "vendor" => Ok(EntityKind::Vendor),
            _ => Err(anyhow::anyhow!("Invalid entity kind: {}", s)),
        }
    }
}

/// Draft lifecycle state.
///
/// PUBLISHED and REJECTED are terminal. REJECTED is a genuine terminal state,
/// distinct from CHANGES_REQUESTED: a rejected lineage gets no resubmission
/// of that draft, while changes-requested invites one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DraftState {
    Draft,
    Submitted,
    ChangesRequested,
    Approved,
    Published,
    Rejected,
}

impl DraftState {
    /// Terminal states have no outgoing transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DraftState::Published | DraftState::Rejected)
    }
}

impl std::fmt::Display for DraftState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DraftState::Draft => write!(f, "draft"),
            DraftState::Submitted => write!(f, "submitted"),
            DraftState::ChangesRequested => write!(f, "changes_requested"),
            DraftState::Approved => write!(f, "approved"),
            DraftState::Published => write!(f, "published"),
            DraftState::Rejected => write!(f, "rejected"),
        }
    }
}

impl std::str::FromStr for DraftState {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "draft" => Ok(DraftState::Draft),
            "submitted" => Ok(DraftState::Submitted),
            "changes_requested" => Ok(DraftState::ChangesRequested),
            "approved" => Ok(DraftState::Approved),
            "published" => Ok(DraftState::Published),
            "rejected" => Ok(DraftState::Rejected),
            _ => Err(anyhow::anyhow!("Invalid draft state: {}", s)),
        }
    }
}

/// Draft - one proposed change to exactly one marketplace entity.
///
/// `version_number` is strictly increasing within a lineage; exactly one row
/// exists per (lineage, version). Rows are never physically deleted -
/// terminal states are retained as history, and a resubmission creates a new
/// row rather than mutating the prior one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Draft {
    pub id: DraftId,
    pub entity_kind: EntityKind,
    pub lineage_id: LineageId,
    pub version_number: i32,
    /// Proposed field values; only fields the author intends to change.
    pub payload: serde_json::Value,
    pub change_summary: Option<String>,
    pub state: DraftState,
    pub rejection_reason: Option<String>,
    pub submitted_by: MemberId,
    pub created_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(DraftState::Published.is_terminal());
        assert!(DraftState::Rejected.is_terminal());
        assert!(!DraftState::Submitted.is_terminal());
        assert!(!DraftState::ChangesRequested.is_terminal());
    }
}
