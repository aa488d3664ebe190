//! Review domain actions - the exposed operations
//!
//! Actions are async functions over a `ReviewKernel`. They validate, call
//! the store (which owns atomicity), and emit best-effort notifications
//! outside the transactional boundary. The acting member is always an
//! explicit parameter - no ambient session state.

use serde_json::{json, Value};

use crate::common::{Actor, AdminCapability, DraftId, LineageId, MemberId, ReviewError};
use crate::kernel::ReviewKernel;

use super::diff::{self, ChangeEntry};
use super::machines::{DecisionCommit, ReviewDecision};
use super::models::{validate_payload, Draft, EntityKind, ModerationAction};
use super::store::NewDraft;

/// A vendor's submission request.
#[derive(Debug, Clone)]
pub struct SubmitDraftInput {
    pub entity_kind: EntityKind,
    /// None starts a brand-new lineage; Some targets an existing entity.
    pub lineage_id: Option<LineageId>,
    pub payload: Value,
    pub change_summary: Option<String>,
}

/// One row of the version history, newest first; the maximum version is
/// flagged latest.
#[derive(Debug, Clone)]
pub struct VersionEntry {
    pub draft: Draft,
    pub latest: bool,
}

/// Submits a proposed change for review.
///
/// Assigns the next version number in the lineage and enters the draft into
/// SUBMITTED atomically with its SUBMIT ledger entry. Fails with `Conflict`
/// while the lineage already has a draft pending review, and with
/// `NotFound` when targeting a lineage this marketplace has never seen.
pub async fn submit_draft(
    kernel: &ReviewKernel,
    author: MemberId,
    input: SubmitDraftInput,
) -> Result<Draft, ReviewError> {
    validate_payload(input.entity_kind, &input.payload)?;

    let lineage_id = match input.lineage_id {
        Some(lineage_id) => {
            let known = kernel
                .store
                .fetch_live_entity(input.entity_kind, lineage_id)
                .await?
                .is_some()
                || !kernel
                    .store
                    .list_versions(input.entity_kind, lineage_id)
                    .await?
                    .is_empty();
            if !known {
                return Err(ReviewError::NotFound(format!(
                    "unknown {} lineage: {}",
                    input.entity_kind, lineage_id
                )));
            }
            lineage_id
        }
        None => LineageId::new(),
    };

    let draft = kernel
        .store
        .insert_submitted_draft(NewDraft {
            entity_kind: input.entity_kind,
            lineage_id,
            payload: input.payload,
            change_summary: input.change_summary,
            submitted_by: author,
        })
        .await?;

    tracing::info!(
        draft_id = %draft.id,
        lineage_id = %draft.lineage_id,
        entity_kind = %draft.entity_kind,
        version = draft.version_number,
        "draft submitted for review"
    );

    notify(
        kernel,
        "draft.submitted",
        author,
        json!({
            "draft_id": draft.id,
            "entity_kind": draft.entity_kind,
            "lineage_id": draft.lineage_id,
            "version": draft.version_number,
        }),
    )
    .await;

    Ok(draft)
}

/// Drafts awaiting review for one entity kind, oldest submission first.
pub async fn list_pending_drafts(
    kernel: &ReviewKernel,
    kind: EntityKind,
    limit: i64,
    offset: i64,
) -> Result<Vec<Draft>, ReviewError> {
    kernel.store.list_pending(kind, limit, offset).await
}

/// Field-level changeset between a draft's payload and the current live
/// entity. A lineage not yet published reads as an empty live record, so
/// every payload field shows as new.
pub async fn compute_draft_changeset(
    kernel: &ReviewKernel,
    draft_id: DraftId,
) -> Result<Vec<ChangeEntry>, ReviewError> {
    let draft = kernel
        .store
        .find_draft(draft_id)
        .await?
        .ok_or_else(|| ReviewError::NotFound(format!("draft {} does not exist", draft_id)))?;

    let live_fields = kernel
        .store
        .fetch_live_entity(draft.entity_kind, draft.lineage_id)
        .await?
        .map(|entity| entity.fields)
        .unwrap_or_else(|| json!({}));

    Ok(diff::compute_changeset(&live_fields, &draft.payload))
}

/// Version history for one lineage, newest first, with the maximum version
/// flagged latest.
pub async fn list_versions(
    kernel: &ReviewKernel,
    kind: EntityKind,
    lineage_id: LineageId,
) -> Result<Vec<VersionEntry>, ReviewError> {
    let drafts = kernel.store.list_versions(kind, lineage_id).await?;
    let max_version = drafts.iter().map(|d| d.version_number).max();
    Ok(drafts
        .into_iter()
        .map(|draft| VersionEntry {
            latest: Some(draft.version_number) == max_version,
            draft,
        })
        .collect())
}

/// Moderation ledger for one entity, newest first.
pub async fn get_audit_log(
    kernel: &ReviewKernel,
    kind: EntityKind,
    lineage_id: LineageId,
    limit: i64,
) -> Result<Vec<ModerationAction>, ReviewError> {
    kernel.store.list_actions(kind, lineage_id, limit).await
}

/// The review coordinator: executes an administrator's decision on a
/// submitted draft as one atomic unit.
///
/// Preconditions, checked before any mutation: a non-empty reason for
/// reject/request-changes, and the ADMIN claim on the reviewer. The store
/// then commits the state transition, the live-entity update (approve only),
/// and exactly one ledger entry together; a concurrent decision on the same
/// draft surfaces as `Conflict` and is never retried automatically. The
/// vendor notification afterwards is best-effort.
pub async fn review_draft(
    kernel: &ReviewKernel,
    draft_id: DraftId,
    reviewer: MemberId,
    decision: ReviewDecision,
) -> Result<Draft, ReviewError> {
    decision.ensure_reason()?;
    Actor::new(reviewer)
        .can(AdminCapability::ModerateDrafts)
        .check(kernel.identity.as_ref())
        .await?;

    let draft = kernel
        .store
        .commit_decision(
            draft_id,
            DecisionCommit {
                reviewer,
                decision: decision.clone(),
            },
        )
        .await?;

    tracing::info!(
        draft_id = %draft.id,
        lineage_id = %draft.lineage_id,
        version = draft.version_number,
        action = %decision.action_type(),
        reviewer = %reviewer,
        "review decision committed"
    );

    let event_type = match &decision {
        ReviewDecision::Approve => "draft.approved",
        ReviewDecision::Reject { .. } => "draft.rejected",
        ReviewDecision::RequestChanges { .. } => "draft.changes_requested",
    };
    notify(
        kernel,
        event_type,
        draft.submitted_by,
        json!({
            "draft_id": draft.id,
            "entity_kind": draft.entity_kind,
            "version": draft.version_number,
            "reason": decision.reason(),
        }),
    )
    .await;

    Ok(draft)
}

/// Fire-and-forget emission: failure is logged and never propagated, so a
/// committed decision can never be reverted by a notification fault.
async fn notify(kernel: &ReviewKernel, event_type: &str, recipient: MemberId, payload: Value) {
    if let Err(err) = kernel.notifications.emit(event_type, recipient, payload).await {
        tracing::warn!(
            event_type,
            recipient = %recipient,
            error = %err,
            "notification emission failed; decision stands"
        );
    }
}
