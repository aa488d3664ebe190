//! Postgres draft store.
//!
//! Both write paths run in a single transaction: the draft transition is a
//! conditional `UPDATE ... WHERE state = 'submitted'` compare-and-swap, and
//! the live-entity upsert and ledger insert commit with it or not at all.
//! The partial unique index on pending drafts backs the
//! one-pending-per-lineage rule against racing inserts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::common::{ActionId, DraftId, LineageId, MemberId, ReviewError};

use super::super::machines::{ensure_transition, DecisionCommit, ReviewDecision};
use super::super::models::{
    validate_payload, Draft, DraftState, EntityKind, LiveEntity, ModerationAction,
    ModerationActionType,
};
use super::{DraftStore, NewDraft};

pub struct PostgresDraftStore {
    pool: PgPool,
}

impl PostgresDraftStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs the bundled schema migrations.
    pub async fn migrate(&self) -> Result<(), ReviewError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|err| ReviewError::Storage(err.into()))
    }
}

// =============================================================================
// Row types - text columns parsed into domain enums at the boundary
// =============================================================================

#[derive(Debug, FromRow)]
struct DraftRow {
    id: Uuid,
    entity_kind: String,
    lineage_id: Uuid,
    version_number: i32,
    payload: Value,
    change_summary: Option<String>,
    state: String,
    rejection_reason: Option<String>,
    submitted_by: Uuid,
    created_at: DateTime<Utc>,
    submitted_at: Option<DateTime<Utc>>,
    approved_at: Option<DateTime<Utc>>,
}

impl TryFrom<DraftRow> for Draft {
    type Error = ReviewError;

    fn try_from(row: DraftRow) -> Result<Self, Self::Error> {
        Ok(Draft {
            id: DraftId::from_uuid(row.id),
            entity_kind: row.entity_kind.parse().map_err(ReviewError::Storage)?,
            lineage_id: LineageId::from_uuid(row.lineage_id),
            version_number: row.version_number,
            payload: row.payload,
            change_summary: row.change_summary,
            state: row.state.parse().map_err(ReviewError::Storage)?,
            rejection_reason: row.rejection_reason,
            submitted_by: MemberId::from_uuid(row.submitted_by),
            created_at: row.created_at,
            submitted_at: row.submitted_at,
            approved_at: row.approved_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ActionRow {
    id: Uuid,
    draft_id: Uuid,
    draft_version_number: i32,
    entity_kind: String,
    lineage_id: Uuid,
    action_type: String,
    actor_id: Uuid,
    notes: Option<String>,
    metadata: Value,
    created_at: DateTime<Utc>,
}

impl TryFrom<ActionRow> for ModerationAction {
    type Error = ReviewError;

    fn try_from(row: ActionRow) -> Result<Self, Self::Error> {
        Ok(ModerationAction {
            id: ActionId::from_uuid(row.id),
            draft_id: DraftId::from_uuid(row.draft_id),
            draft_version_number: row.draft_version_number,
            entity_kind: row.entity_kind.parse().map_err(ReviewError::Storage)?,
            lineage_id: LineageId::from_uuid(row.lineage_id),
            action_type: row.action_type.parse().map_err(ReviewError::Storage)?,
            actor_id: MemberId::from_uuid(row.actor_id),
            notes: row.notes,
            metadata: row.metadata,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct LiveEntityRow {
    lineage_id: Uuid,
    entity_kind: String,
    fields: Value,
    published_version: i32,
    updated_at: DateTime<Utc>,
}

impl TryFrom<LiveEntityRow> for LiveEntity {
    type Error = ReviewError;

    fn try_from(row: LiveEntityRow) -> Result<Self, Self::Error> {
        Ok(LiveEntity {
            lineage_id: LineageId::from_uuid(row.lineage_id),
            entity_kind: row.entity_kind.parse().map_err(ReviewError::Storage)?,
            fields: row.fields,
            published_version: row.published_version,
            updated_at: row.updated_at,
        })
    }
}

/// Appends one ledger entry inside the caller's transaction.
async fn insert_action(
    tx: &mut Transaction<'_, Postgres>,
    draft: &Draft,
    action_type: ModerationActionType,
    actor_id: MemberId,
    notes: Option<&str>,
) -> Result<(), ReviewError> {
    sqlx::query(
        "INSERT INTO moderation_actions
             (id, draft_id, draft_version_number, entity_kind, lineage_id,
              action_type, actor_id, notes, metadata)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, '{}'::jsonb)",
    )
    .bind(ActionId::new())
    .bind(draft.id)
    .bind(draft.version_number)
    .bind(draft.entity_kind.to_string())
    .bind(draft.lineage_id)
    .bind(action_type.to_string())
    .bind(actor_id)
    .bind(notes)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[async_trait]
impl DraftStore for PostgresDraftStore {
    async fn insert_submitted_draft(&self, new_draft: NewDraft) -> Result<Draft, ReviewError> {
        let mut tx = self.pool.begin().await?;

        // Lock the lineage's rows so version assignment and the pending
        // check cannot race a concurrent submission.
        let versions: Vec<(i32, String)> = sqlx::query_as(
            "SELECT version_number, state FROM drafts WHERE lineage_id = $1 FOR UPDATE",
        )
        .bind(new_draft.lineage_id)
        .fetch_all(&mut *tx)
        .await?;

        if versions.iter().any(|(_, state)| state == "submitted") {
            return Err(ReviewError::Conflict(
                "a draft is already pending review for this entity".to_string(),
            ));
        }
        let version_number = versions.iter().map(|(v, _)| *v).max().unwrap_or(0) + 1;

        let row: DraftRow = sqlx::query_as(
            "INSERT INTO drafts
                 (id, entity_kind, lineage_id, version_number, payload,
                  change_summary, state, submitted_by, created_at, submitted_at)
             VALUES ($1, $2, $3, $4, $5, $6, 'submitted', $7, now(), now())
             RETURNING *",
        )
        .bind(DraftId::new())
        .bind(new_draft.entity_kind.to_string())
        .bind(new_draft.lineage_id)
        .bind(version_number)
        .bind(&new_draft.payload)
        .bind(&new_draft.change_summary)
        .bind(new_draft.submitted_by)
        .fetch_one(&mut *tx)
        .await?;
        let draft: Draft = row.try_into()?;

        insert_action(
            &mut tx,
            &draft,
            ModerationActionType::Submit,
            new_draft.submitted_by,
            new_draft.change_summary.as_deref(),
        )
        .await?;

        tx.commit().await?;
        Ok(draft)
    }

    async fn find_draft(&self, id: DraftId) -> Result<Option<Draft>, ReviewError> {
        let row: Option<DraftRow> = sqlx::query_as("SELECT * FROM drafts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Draft::try_from).transpose()
    }

    async fn list_pending(
        &self,
        kind: EntityKind,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Draft>, ReviewError> {
        let rows: Vec<DraftRow> = sqlx::query_as(
            "SELECT * FROM drafts
             WHERE entity_kind = $1 AND state = 'submitted'
             ORDER BY submitted_at ASC
             LIMIT $2 OFFSET $3",
        )
        .bind(kind.to_string())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Draft::try_from).collect()
    }

    async fn list_versions(
        &self,
        kind: EntityKind,
        lineage_id: LineageId,
    ) -> Result<Vec<Draft>, ReviewError> {
        let rows: Vec<DraftRow> = sqlx::query_as(
            "SELECT * FROM drafts
             WHERE entity_kind = $1 AND lineage_id = $2
             ORDER BY version_number DESC",
        )
        .bind(kind.to_string())
        .bind(lineage_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Draft::try_from).collect()
    }

    async fn fetch_live_entity(
        &self,
        kind: EntityKind,
        lineage_id: LineageId,
    ) -> Result<Option<LiveEntity>, ReviewError> {
        let row: Option<LiveEntityRow> = sqlx::query_as(
            "SELECT * FROM live_entities WHERE entity_kind = $1 AND lineage_id = $2",
        )
        .bind(kind.to_string())
        .bind(lineage_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(LiveEntity::try_from).transpose()
    }

    async fn list_actions(
        &self,
        kind: EntityKind,
        lineage_id: LineageId,
        limit: i64,
    ) -> Result<Vec<ModerationAction>, ReviewError> {
        let rows: Vec<ActionRow> = sqlx::query_as(
            "SELECT * FROM moderation_actions
             WHERE entity_kind = $1 AND lineage_id = $2
             ORDER BY created_at DESC, id DESC
             LIMIT $3",
        )
        .bind(kind.to_string())
        .bind(lineage_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(ModerationAction::try_from).collect()
    }

    async fn commit_decision(
        &self,
        draft_id: DraftId,
        commit: DecisionCommit,
    ) -> Result<Draft, ReviewError> {
        let mut tx = self.pool.begin().await?;

        let row: Option<DraftRow> = sqlx::query_as("SELECT * FROM drafts WHERE id = $1 FOR UPDATE")
            .bind(draft_id)
            .fetch_optional(&mut *tx)
            .await?;
        let draft: Draft = row
            .ok_or_else(|| ReviewError::NotFound(format!("draft {} does not exist", draft_id)))?
            .try_into()?;

        if draft.state != DraftState::Submitted {
            return Err(ReviewError::Conflict(format!(
                "draft is no longer pending review (state: {})",
                draft.state
            )));
        }
        ensure_transition(draft.state, commit.decision.target_state())?;

        let decided: Draft = match &commit.decision {
            ReviewDecision::Approve => {
                // Re-check against live constraints inside the atomic unit;
                // a failure rolls everything back and the draft stays
                // SUBMITTED with nothing logged.
                validate_payload(draft.entity_kind, &draft.payload).map_err(|err| match err {
                    ReviewError::Validation(msg) => ReviewError::Apply(msg),
                    other => other,
                })?;

                let updated: Option<DraftRow> = sqlx::query_as(
                    "UPDATE drafts
                     SET state = 'published', approved_at = now()
                     WHERE id = $1 AND state = 'submitted'
                     RETURNING *",
                )
                .bind(draft.id)
                .fetch_optional(&mut *tx)
                .await?;
                let decided: Draft = updated
                    .ok_or_else(|| {
                        ReviewError::Conflict(
                            "another reviewer decided this draft first".to_string(),
                        )
                    })?
                    .try_into()?;

                // Null payload values clear live fields; everything else is
                // a shallow per-field replacement.
                sqlx::query(
                    "INSERT INTO live_entities
                         (entity_kind, lineage_id, fields, published_version, updated_at)
                     VALUES ($1, $2, jsonb_strip_nulls($3::jsonb), $4, now())
                     ON CONFLICT (entity_kind, lineage_id) DO UPDATE
                     SET fields = jsonb_strip_nulls(live_entities.fields || $3::jsonb),
                         published_version = $4,
                         updated_at = now()",
                )
                .bind(draft.entity_kind.to_string())
                .bind(draft.lineage_id)
                .bind(&draft.payload)
                .bind(draft.version_number)
                .execute(&mut *tx)
                .await?;

                decided
            }
            ReviewDecision::Reject { reason } | ReviewDecision::RequestChanges { reason } => {
                let updated: Option<DraftRow> = sqlx::query_as(
                    "UPDATE drafts
                     SET state = $2, rejection_reason = $3
                     WHERE id = $1 AND state = 'submitted'
                     RETURNING *",
                )
                .bind(draft.id)
                .bind(commit.decision.target_state().to_string())
                .bind(reason)
                .fetch_optional(&mut *tx)
                .await?;
                updated
                    .ok_or_else(|| {
                        ReviewError::Conflict(
                            "another reviewer decided this draft first".to_string(),
                        )
                    })?
                    .try_into()?
            }
        };

        insert_action(
            &mut tx,
            &decided,
            commit.decision.action_type(),
            commit.reviewer,
            commit.decision.reason(),
        )
        .await?;

        tx.commit().await?;
        Ok(decided)
    }
}
