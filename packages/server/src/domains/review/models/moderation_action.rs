use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::draft::EntityKind;
use crate::common::{ActionId, DraftId, LineageId, MemberId};

/// What a moderation ledger entry records.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModerationActionType {
    Submit,
    Approve,
    Reject,
    RequestChanges,
}

impl std::fmt::Display for ModerationActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModerationActionType::Submit => write!(f, "submit"),
            ModerationActionType::Approve => write!(f, "approve"),
            ModerationActionType::Reject => write!(f, "reject"),
            ModerationActionType::RequestChanges => write!(f, "request_changes"),
        }
    }
}

impl std::str::FromStr for ModerationActionType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "submit" => Ok(ModerationActionType::Submit),
            "approve" => Ok(ModerationActionType::Approve),
            "reject" => Ok(ModerationActionType::Reject),
            "request_changes" => Ok(ModerationActionType::RequestChanges),
            _ => Err(anyhow::anyhow!("Invalid moderation action type: {}", s)),
        }
    }
}

/// ModerationAction - one immutable audit record per state transition.
///
/// Written as part of the same atomic operation that performs the
/// transition; never updated or deleted afterwards. Entity kind and lineage
/// are denormalized so the ledger stays queryable by entity regardless of
/// what later happens to the draft rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationAction {
    pub id: ActionId,
    pub draft_id: DraftId,
    /// The draft's version at the moment of this action.
    pub draft_version_number: i32,
    pub entity_kind: EntityKind,
    pub lineage_id: LineageId,
    pub action_type: ModerationActionType,
    pub actor_id: MemberId,
    pub notes: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
