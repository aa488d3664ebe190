//! Integration tests for version lineage and the audit trail.
//!
//! Covers version assignment across review cycles, the latest flag, drift
//! comparisons against the live entity, and the ledger's ordering.

use serde_json::json;
use server_core::common::MemberId;
use server_core::domains::review::machines::ReviewDecision;
use server_core::domains::review::models::{DraftState, EntityKind, ModerationActionType};
use server_core::domains::review::store::DraftStore;
use server_core::domains::review::{
    compute_draft_changeset, get_audit_log, list_versions, review_draft, submit_draft,
    SubmitDraftInput,
};
use server_core::kernel::test_dependencies::TestKernel;

async fn submit(
    t: &TestKernel,
    vendor: MemberId,
    lineage: Option<server_core::common::LineageId>,
    payload: serde_json::Value,
) -> server_core::domains::review::models::Draft {
    submit_draft(
        &t.kernel,
        vendor,
        SubmitDraftInput {
            entity_kind: EntityKind::Service,
            lineage_id: lineage,
            payload,
            change_summary: None,
        },
    )
    .await
    .expect("submission should succeed")
}

// Scenario: v1 published, v2 sent back for changes, v3 resubmitted.
#[tokio::test]
async fn resubmission_creates_a_new_version_and_keeps_history() {
    let t = TestKernel::new();
    let vendor = MemberId::new();
    let admin = t.admin();

    let v1 = submit(&t, vendor, None, json!({ "name": "Lawn Care" })).await;
    let lineage = v1.lineage_id;
    review_draft(&t.kernel, v1.id, admin, ReviewDecision::Approve)
        .await
        .unwrap();

    let v2 = submit(&t, vendor, Some(lineage), json!({ "price_cents": 9900 })).await;
    assert_eq!(v2.version_number, 2);
    review_draft(
        &t.kernel,
        v2.id,
        admin,
        ReviewDecision::RequestChanges { reason: "fix pricing".to_string() },
    )
    .await
    .unwrap();

    let v3 = submit(&t, vendor, Some(lineage), json!({ "price_cents": 12900 })).await;
    assert_eq!(v3.version_number, 3);

    // The prior row is retained, unmodified, as history.
    let versions = list_versions(&t.kernel, EntityKind::Service, lineage)
        .await
        .unwrap();
    assert_eq!(versions.len(), 3);
    let numbers: Vec<i32> = versions.iter().map(|v| v.draft.version_number).collect();
    assert_eq!(numbers, vec![3, 2, 1]);
    assert!(versions[0].latest);
    assert!(!versions[1].latest && !versions[2].latest);
    assert_eq!(versions[1].draft.state, DraftState::ChangesRequested);
    assert_eq!(versions[1].draft.rejection_reason.as_deref(), Some("fix pricing"));
    assert_eq!(versions[2].draft.state, DraftState::Published);

    // The ledger (newest first) shows SUBMIT(v3) after REQUEST_CHANGES(v2).
    let log = get_audit_log(&t.kernel, EntityKind::Service, lineage, 20)
        .await
        .unwrap();
    let summary: Vec<(ModerationActionType, i32)> = log
        .iter()
        .map(|a| (a.action_type, a.draft_version_number))
        .collect();
    assert_eq!(
        summary,
        vec![
            (ModerationActionType::Submit, 3),
            (ModerationActionType::RequestChanges, 2),
            (ModerationActionType::Submit, 2),
            (ModerationActionType::Approve, 1),
            (ModerationActionType::Submit, 1),
        ]
    );
}

#[tokio::test]
async fn version_numbers_map_to_exactly_one_draft_row() {
    let t = TestKernel::new();
    let vendor = MemberId::new();
    let admin = t.admin();

    let v1 = submit(&t, vendor, None, json!({ "name": "Snow Removal" })).await;
    let lineage = v1.lineage_id;
    for _ in 0..3 {
        let pending = server_core::domains::review::list_pending_drafts(
            &t.kernel,
            EntityKind::Service,
            10,
            0,
        )
        .await
        .unwrap();
        let draft = pending
            .iter()
            .find(|d| d.lineage_id == lineage)
            .expect("a draft should be pending");
        review_draft(
            &t.kernel,
            draft.id,
            admin,
            ReviewDecision::RequestChanges { reason: "more detail".to_string() },
        )
        .await
        .unwrap();
        submit(&t, vendor, Some(lineage), json!({ "name": "Snow Removal" })).await;
    }

    let versions = list_versions(&t.kernel, EntityKind::Service, lineage)
        .await
        .unwrap();
    let mut numbers: Vec<i32> = versions.iter().map(|v| v.draft.version_number).collect();
    assert_eq!(numbers.len(), 4);
    numbers.sort();
    numbers.dedup();
    assert_eq!(numbers, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn live_entity_reflects_the_most_recently_published_version() {
    let t = TestKernel::new();
    let vendor = MemberId::new();
    let admin = t.admin();

    let v1 = submit(
        &t,
        vendor,
        None,
        json!({ "name": "Tutoring", "category": "education", "price_cents": 5000 }),
    )
    .await;
    let lineage = v1.lineage_id;
    review_draft(&t.kernel, v1.id, admin, ReviewDecision::Approve)
        .await
        .unwrap();

    let v2 = submit(&t, vendor, Some(lineage), json!({ "price_cents": 6000 })).await;
    review_draft(&t.kernel, v2.id, admin, ReviewDecision::Approve)
        .await
        .unwrap();

    let live = t
        .store
        .fetch_live_entity(EntityKind::Service, lineage)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(live.published_version, 2);
    assert_eq!(live.fields["price_cents"], json!(6000));
    // Fields untouched by v2 survive from v1.
    assert_eq!(live.fields["name"], json!("Tutoring"));
    assert_eq!(live.fields["category"], json!("education"));
}

// Comparing a historical draft against the current live entity shows
// cumulative drift.
#[tokio::test]
async fn historical_draft_changeset_shows_drift_against_current_live() {
    let t = TestKernel::new();
    let vendor = MemberId::new();
    let admin = t.admin();

    let v1 = submit(&t, vendor, None, json!({ "name": "Catering", "price_cents": 20000 })).await;
    let lineage = v1.lineage_id;
    review_draft(&t.kernel, v1.id, admin, ReviewDecision::Approve)
        .await
        .unwrap();

    let v2 = submit(&t, vendor, Some(lineage), json!({ "price_cents": 25000 })).await;
    review_draft(&t.kernel, v2.id, admin, ReviewDecision::Approve)
        .await
        .unwrap();

    // v1's payload no longer matches the live record on price.
    let drift = compute_draft_changeset(&t.kernel, v1.id).await.unwrap();
    assert_eq!(drift.len(), 1);
    assert_eq!(drift[0].field, "price_cents");
    assert_eq!(drift[0].old_value, Some(json!(25000)));
    assert_eq!(drift[0].new_value, json!(20000));
}

#[tokio::test]
async fn audit_log_respects_the_limit() {
    let t = TestKernel::new();
    let vendor = MemberId::new();
    let admin = t.admin();

    let v1 = submit(&t, vendor, None, json!({ "name": "Painting" })).await;
    let lineage = v1.lineage_id;
    review_draft(
        &t.kernel,
        v1.id,
        admin,
        ReviewDecision::RequestChanges { reason: "photos missing".to_string() },
    )
    .await
    .unwrap();
    submit(&t, vendor, Some(lineage), json!({ "name": "Painting & Decorating" })).await;

    let log = get_audit_log(&t.kernel, EntityKind::Service, lineage, 2)
        .await
        .unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].action_type, ModerationActionType::Submit);
    assert_eq!(log[0].draft_version_number, 2);
}
