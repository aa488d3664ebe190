//! In-memory draft store.
//!
//! One mutex over all state gives the same linearizable semantics as the
//! Postgres transaction: a decision's compare-and-swap, live-entity update,
//! and ledger append commit together or not at all. Used by the test suite
//! and for embedding without a database.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::common::{ActionId, DraftId, LineageId, ReviewError};

use super::super::machines::{ensure_transition, DecisionCommit, ReviewDecision};
use super::super::models::{
    validate_payload, Draft, DraftState, EntityKind, LiveEntity, ModerationAction,
    ModerationActionType,
};
use super::{DraftStore, NewDraft};

#[derive(Default)]
struct Inner {
    drafts: Vec<Draft>,
    actions: Vec<ModerationAction>,
    live: HashMap<(EntityKind, LineageId), LiveEntity>,
}

impl Inner {
    fn append_action(
        &mut self,
        draft: &Draft,
        action_type: ModerationActionType,
        actor_id: crate::common::MemberId,
        notes: Option<String>,
    ) {
        self.actions.push(ModerationAction {
            id: ActionId::new(),
            draft_id: draft.id,
            draft_version_number: draft.version_number,
            entity_kind: draft.entity_kind,
            lineage_id: draft.lineage_id,
            action_type,
            actor_id,
            notes,
            metadata: serde_json::json!({}),
            created_at: Utc::now(),
        });
    }

    fn apply_fields(&mut self, draft: &Draft) {
        let entry = self
            .live
            .entry((draft.entity_kind, draft.lineage_id))
            .or_insert_with(|| LiveEntity {
                lineage_id: draft.lineage_id,
                entity_kind: draft.entity_kind,
                fields: Value::Object(Default::default()),
                published_version: draft.version_number,
                updated_at: Utc::now(),
            });

        if let (Some(live), Some(proposed)) =
            (entry.fields.as_object_mut(), draft.payload.as_object())
        {
            for (key, value) in proposed {
                if value.is_null() {
                    live.remove(key);
                } else {
                    live.insert(key.clone(), value.clone());
                }
            }
        }
        entry.published_version = draft.version_number;
        entry.updated_at = Utc::now();
    }
}

pub struct MemoryDraftStore {
    inner: Mutex<Inner>,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Seeds a live entity directly, bypassing the review workflow. Test and
    /// bootstrap helper for records that predate moderation.
    pub fn seed_live_entity(&self, kind: EntityKind, lineage_id: LineageId, fields: Value) {
        let mut inner = self.inner.lock().unwrap();
        inner.live.insert(
            (kind, lineage_id),
            LiveEntity {
                lineage_id,
                entity_kind: kind,
                fields,
                published_version: 0,
                updated_at: Utc::now(),
            },
        );
    }
}

impl Default for MemoryDraftStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DraftStore for MemoryDraftStore {
    async fn insert_submitted_draft(&self, new_draft: NewDraft) -> Result<Draft, ReviewError> {
        let mut inner = self.inner.lock().unwrap();

        let has_pending = inner
            .drafts
            .iter()
            .any(|d| d.lineage_id == new_draft.lineage_id && d.state == DraftState::Submitted);
        if has_pending {
            return Err(ReviewError::Conflict(
                "a draft is already pending review for this entity".to_string(),
            ));
        }

        let version_number = inner
            .drafts
            .iter()
            .filter(|d| d.lineage_id == new_draft.lineage_id)
            .map(|d| d.version_number)
            .max()
            .unwrap_or(0)
            + 1;

        let now = Utc::now();
        let draft = Draft {
            id: DraftId::new(),
            entity_kind: new_draft.entity_kind,
            lineage_id: new_draft.lineage_id,
            version_number,
            payload: new_draft.payload,
            change_summary: new_draft.change_summary.clone(),
            state: DraftState::Submitted,
            rejection_reason: None,
            submitted_by: new_draft.submitted_by,
            created_at: now,
            submitted_at: Some(now),
            approved_at: None,
        };

        inner.append_action(
            &draft,
            ModerationActionType::Submit,
            new_draft.submitted_by,
            new_draft.change_summary,
        );
        inner.drafts.push(draft.clone());
        Ok(draft)
    }

    async fn find_draft(&self, id: DraftId) -> Result<Option<Draft>, ReviewError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.drafts.iter().find(|d| d.id == id).cloned())
    }

    async fn list_pending(
        &self,
        kind: EntityKind,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Draft>, ReviewError> {
        let inner = self.inner.lock().unwrap();
        let mut pending: Vec<Draft> = inner
            .drafts
            .iter()
            .filter(|d| d.entity_kind == kind && d.state == DraftState::Submitted)
            .cloned()
            .collect();
        pending.sort_by_key(|d| d.submitted_at);
        Ok(pending
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn list_versions(
        &self,
        kind: EntityKind,
        lineage_id: LineageId,
    ) -> Result<Vec<Draft>, ReviewError> {
        let inner = self.inner.lock().unwrap();
        let mut versions: Vec<Draft> = inner
            .drafts
            .iter()
            .filter(|d| d.entity_kind == kind && d.lineage_id == lineage_id)
            .cloned()
            .collect();
        versions.sort_by(|a, b| b.version_number.cmp(&a.version_number));
        Ok(versions)
    }

    async fn fetch_live_entity(
        &self,
        kind: EntityKind,
        lineage_id: LineageId,
    ) -> Result<Option<LiveEntity>, ReviewError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.live.get(&(kind, lineage_id)).cloned())
    }

    async fn list_actions(
        &self,
        kind: EntityKind,
        lineage_id: LineageId,
        limit: i64,
    ) -> Result<Vec<ModerationAction>, ReviewError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .actions
            .iter()
            .rev()
            .filter(|a| a.entity_kind == kind && a.lineage_id == lineage_id)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn commit_decision(
        &self,
        draft_id: DraftId,
        commit: DecisionCommit,
    ) -> Result<Draft, ReviewError> {
        let mut inner = self.inner.lock().unwrap();

        let position = inner
            .drafts
            .iter()
            .position(|d| d.id == draft_id)
            .ok_or_else(|| ReviewError::NotFound(format!("draft {} does not exist", draft_id)))?;

        // CAS guard: only a SUBMITTED draft may be decided; a concurrent
        // reviewer who already committed leaves us here with a Conflict.
        let current = inner.drafts[position].state;
        if current != DraftState::Submitted {
            return Err(ReviewError::Conflict(format!(
                "draft is no longer pending review (state: {})",
                current
            )));
        }
        ensure_transition(current, commit.decision.target_state())?;

        if let ReviewDecision::Approve = commit.decision {
            let draft = inner.drafts[position].clone();
            validate_payload(draft.entity_kind, &draft.payload).map_err(|err| match err {
                ReviewError::Validation(msg) => ReviewError::Apply(msg),
                other => other,
            })?;
            inner.apply_fields(&draft);
        }

        let now = Utc::now();
        {
            let draft = &mut inner.drafts[position];
            draft.state = commit.decision.target_state();
            match &commit.decision {
                ReviewDecision::Approve => draft.approved_at = Some(now),
                ReviewDecision::Reject { reason }
                | ReviewDecision::RequestChanges { reason } => {
                    draft.rejection_reason = Some(reason.clone());
                }
            }
        }

        let decided = inner.drafts[position].clone();
        inner.append_action(
            &decided,
            commit.decision.action_type(),
            commit.reviewer,
            commit.decision.reason().map(str::to_string),
        );
        Ok(decided)
    }
}
