//! Draft storage - the atomicity boundary of the review workflow.
//!
//! Every invariant with concurrent exposure lives behind this trait: the
//! compare-and-swap on draft state, the at-most-one-pending-per-lineage
//! rule, version assignment, and the all-or-nothing coupling of "apply
//! payload", "transition draft", and "append ledger entry".

pub mod memory;
pub mod postgres;

pub use memory::MemoryDraftStore;
pub use postgres::PostgresDraftStore;

use async_trait::async_trait;
use serde_json::Value;

use crate::common::{DraftId, LineageId, MemberId, ReviewError};

use super::machines::DecisionCommit;
use super::models::{Draft, EntityKind, LiveEntity, ModerationAction};

/// A vendor's proposed change, ready to enter the review queue.
#[derive(Debug, Clone)]
pub struct NewDraft {
    pub entity_kind: EntityKind,
    pub lineage_id: LineageId,
    pub payload: Value,
    pub change_summary: Option<String>,
    pub submitted_by: MemberId,
}

/// Storage contract for drafts, the moderation ledger, and live entities.
///
/// Reads operate on a point-in-time snapshot and never block writers.
/// The two write methods are each one atomic unit; concurrent callers losing
/// the race receive `Conflict` and must refetch before retrying.
#[async_trait]
pub trait DraftStore: Send + Sync {
    /// Inserts a new draft directly into SUBMITTED, assigning the next
    /// version number in its lineage, and appends the SUBMIT ledger entry.
    ///
    /// Fails with `Conflict` if the lineage already has a draft pending
    /// review.
    async fn insert_submitted_draft(&self, new_draft: NewDraft) -> Result<Draft, ReviewError>;

    async fn find_draft(&self, id: DraftId) -> Result<Option<Draft>, ReviewError>;

    /// Drafts awaiting review for one entity kind, oldest submission first.
    async fn list_pending(
        &self,
        kind: EntityKind,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Draft>, ReviewError>;

    /// All draft versions of a lineage, newest version first.
    async fn list_versions(
        &self,
        kind: EntityKind,
        lineage_id: LineageId,
    ) -> Result<Vec<Draft>, ReviewError>;

    async fn fetch_live_entity(
        &self,
        kind: EntityKind,
        lineage_id: LineageId,
    ) -> Result<Option<LiveEntity>, ReviewError>;

    /// Moderation ledger for one entity, newest first.
    async fn list_actions(
        &self,
        kind: EntityKind,
        lineage_id: LineageId,
        limit: i64,
    ) -> Result<Vec<ModerationAction>, ReviewError>;

    /// Commits a review decision as one atomic unit: a compare-and-swap on
    /// `state == SUBMITTED`, the live-entity field application (approve
    /// only), and exactly one ledger entry. Exactly one concurrent caller
    /// commits; every other receives `Conflict`.
    ///
    /// Approval re-validates the payload against live-entity constraints
    /// inside the atomic unit; failure surfaces as `Apply` and leaves the
    /// draft SUBMITTED with nothing logged.
    async fn commit_decision(
        &self,
        draft_id: DraftId,
        commit: DecisionCommit,
    ) -> Result<Draft, ReviewError>;
}
