//! Diagnosis lifecycle tests at the service layer
//!
//! Exercise the state machine directly: transition preconditions, the
//! no-mutation-on-failure property, the conditional-write race handling,
//! and the mock analyzer's status guard.

use sqlx::SqlitePool;

use cropdoc_api::db;
use cropdoc_api::services::inference;
use cropdoc_api::services::lifecycle::{self, AnnotatePatch};
use cropdoc_api::services::triage::SortOrder;
use cropdoc_common::db::init::connect_memory;
use cropdoc_common::db::models::{Account, Diagnosis, DiagnosisStatus, DISEASE_ANALYZING};
use cropdoc_common::roles::Role;
use cropdoc_common::{auth, time, uuid_utils, Error};
use uuid::Uuid;

async fn seed_account(pool: &SqlitePool, role: Role, is_active: bool) -> Account {
    let account = Account {
        id: uuid_utils::generate(),
        name: format!("{} user", role),
        email: format!("{}@{}.example.com", role.as_str().to_lowercase(), Uuid::new_v4()),
        password_hash: auth::hash_password("secret").unwrap(),
        role,
        is_active,
        last_login_at: None,
        created_at: time::now(),
    };
    db::accounts::insert(pool, &account).await.unwrap();
    account
}

async fn setup() -> (SqlitePool, Account, Account) {
    let pool = connect_memory().await.unwrap();
    let farmer = seed_account(&pool, Role::Farmer, true).await;
    let agronomist = seed_account(&pool, Role::Agronomist, true).await;
    (pool, farmer, agronomist)
}

async fn reload(pool: &SqlitePool, id: Uuid) -> Diagnosis {
    db::diagnoses::get(pool, id).await.unwrap().unwrap()
}

#[tokio::test]
async fn test_submit_creates_pending_record() {
    let (pool, farmer, _) = setup().await;

    let diagnosis = lifecycle::submit(&pool, &farmer, "img://a").await.unwrap();

    assert_eq!(diagnosis.status, DiagnosisStatus::Pending);
    assert_eq!(diagnosis.disease_name.as_deref(), Some(DISEASE_ANALYZING));
    assert_eq!(diagnosis.confidence, None);
    assert_eq!(diagnosis.treatment, None);
    assert_eq!(diagnosis.agronomist_notes, None);
    assert_eq!(diagnosis.farmer_id, farmer.id);

    // Persisted identically
    assert_eq!(reload(&pool, diagnosis.id).await, diagnosis);
}

#[tokio::test]
async fn test_approved_record_has_treatment_and_notes() {
    let (pool, farmer, agronomist) = setup().await;
    let diagnosis = lifecycle::submit(&pool, &farmer, "img://a").await.unwrap();

    let approved = lifecycle::approve(
        &pool,
        &agronomist,
        diagnosis.id,
        "Apply copper fungicide",
        Some("Check weekly"),
    )
    .await
    .unwrap();

    assert_eq!(approved.status, DiagnosisStatus::Approved);
    assert_eq!(approved.treatment.as_deref(), Some("Apply copper fungicide"));
    assert_eq!(approved.agronomist_notes.as_deref(), Some("Check weekly"));

    // The submitting farmer was notified
    let notifications = db::notifications::list_active(&pool, farmer.id).await.unwrap();
    assert_eq!(notifications.len(), 1);
    assert!(notifications[0].message.contains("approved"));
}

#[tokio::test]
async fn test_rejected_record_has_reason() {
    let (pool, farmer, agronomist) = setup().await;
    let diagnosis = lifecycle::submit(&pool, &farmer, "img://a").await.unwrap();

    let rejected = lifecycle::reject(&pool, &agronomist, diagnosis.id, "Image too blurry")
        .await
        .unwrap();

    assert_eq!(rejected.status, DiagnosisStatus::Rejected);
    assert_eq!(rejected.agronomist_notes.as_deref(), Some("Image too blurry"));
    assert_eq!(rejected.treatment, None);

    let notifications = db::notifications::list_active(&pool, farmer.id).await.unwrap();
    assert_eq!(notifications.len(), 1);
    assert!(notifications[0].message.contains("rejected"));
}

#[tokio::test]
async fn test_second_transition_fails_without_mutation() {
    let (pool, farmer, agronomist) = setup().await;
    let diagnosis = lifecycle::submit(&pool, &farmer, "img://a").await.unwrap();

    lifecycle::approve(&pool, &agronomist, diagnosis.id, "T1", None)
        .await
        .unwrap();
    let after_first = reload(&pool, diagnosis.id).await;

    let err = lifecycle::reject(&pool, &agronomist, diagnosis.id, "too late")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidTransition(_)));

    // Byte-for-byte unchanged by the failed call
    assert_eq!(reload(&pool, diagnosis.id).await, after_first);

    // Re-approving is refused the same way
    let err = lifecycle::approve(&pool, &agronomist, diagnosis.id, "T2", None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidTransition(_)));
    assert_eq!(reload(&pool, diagnosis.id).await, after_first);
}

#[tokio::test]
async fn test_annotate_updates_pending_record() {
    let (pool, farmer, agronomist) = setup().await;
    let diagnosis = lifecycle::submit(&pool, &farmer, "img://a").await.unwrap();

    let annotated = lifecycle::annotate(
        &pool,
        &agronomist,
        diagnosis.id,
        AnnotatePatch {
            plant_name: Some("Cassava".to_string()),
            disease_name: Some("Mosaic Virus".to_string()),
        },
    )
    .await
    .unwrap();

    assert_eq!(annotated.status, DiagnosisStatus::Pending);
    assert_eq!(annotated.plant_name, "Cassava");
    assert_eq!(annotated.disease_name.as_deref(), Some("Mosaic Virus"));
    assert!(annotated.updated_at >= diagnosis.updated_at);
}

#[tokio::test]
async fn test_annotate_terminal_record_fails_unchanged() {
    let (pool, farmer, agronomist) = setup().await;
    let diagnosis = lifecycle::submit(&pool, &farmer, "img://a").await.unwrap();
    lifecycle::approve(&pool, &agronomist, diagnosis.id, "T", None)
        .await
        .unwrap();
    let approved = reload(&pool, diagnosis.id).await;

    let err = lifecycle::annotate(
        &pool,
        &agronomist,
        diagnosis.id,
        AnnotatePatch {
            plant_name: Some("Wheat".to_string()),
            disease_name: None,
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::InvalidTransition(_)));
    assert_eq!(reload(&pool, diagnosis.id).await, approved);
}

#[tokio::test]
async fn test_annotate_empty_patch_fails_validation() {
    let (pool, farmer, agronomist) = setup().await;
    let diagnosis = lifecycle::submit(&pool, &farmer, "img://a").await.unwrap();

    let err = lifecycle::annotate(&pool, &agronomist, diagnosis.id, AnnotatePatch::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn test_farmer_cannot_transition() {
    let (pool, farmer, _) = setup().await;
    let diagnosis = lifecycle::submit(&pool, &farmer, "img://a").await.unwrap();
    let before = reload(&pool, diagnosis.id).await;

    let err = lifecycle::approve(&pool, &farmer, diagnosis.id, "T", None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));
    assert_eq!(reload(&pool, diagnosis.id).await, before);
}

#[tokio::test]
async fn test_inactive_agronomist_cannot_reject() {
    let (pool, farmer, _) = setup().await;
    let inactive = seed_account(&pool, Role::Agronomist, false).await;
    let diagnosis = lifecycle::submit(&pool, &farmer, "img://a").await.unwrap();

    let err = lifecycle::reject(&pool, &inactive, diagnosis.id, "reason")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));
    assert_eq!(
        reload(&pool, diagnosis.id).await.status,
        DiagnosisStatus::Pending
    );
}

#[tokio::test]
async fn test_empty_treatment_fails_validation() {
    let (pool, farmer, agronomist) = setup().await;
    let diagnosis = lifecycle::submit(&pool, &farmer, "img://a").await.unwrap();

    let err = lifecycle::approve(&pool, &agronomist, diagnosis.id, "   ", None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(
        reload(&pool, diagnosis.id).await.status,
        DiagnosisStatus::Pending
    );
}

#[tokio::test]
async fn test_lost_race_detected_by_conditional_write() {
    let (pool, farmer, agronomist) = setup().await;
    let diagnosis = lifecycle::submit(&pool, &farmer, "img://a").await.unwrap();

    // A stale writer read the record as PENDING...
    let mut stale = reload(&pool, diagnosis.id).await;

    // ...but another review finalizes it first
    lifecycle::approve(&pool, &agronomist, diagnosis.id, "T1", None)
        .await
        .unwrap();

    // The stale write must not apply
    stale.status = DiagnosisStatus::Approved;
    stale.treatment = Some("T2".to_string());
    stale.updated_at = time::now();
    let applied = db::diagnoses::update_pending(&pool, &stale).await.unwrap();
    assert!(!applied);

    assert_eq!(
        reload(&pool, diagnosis.id).await.treatment.as_deref(),
        Some("T1")
    );
}

#[tokio::test]
async fn test_missing_diagnosis_is_not_found() {
    let (pool, _, agronomist) = setup().await;

    let err = lifecycle::approve(&pool, &agronomist, uuid_utils::generate(), "T", None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_list_pending_sorts_and_filters() {
    let (pool, farmer, agronomist) = setup().await;

    for _ in 0..3 {
        lifecycle::submit(&pool, &farmer, "img://x").await.unwrap();
    }
    // Give two of them analyzed confidences
    let queue = lifecycle::list_pending(&pool, &agronomist, SortOrder::Oldest, false)
        .await
        .unwrap();
    for (diagnosis, confidence) in queue.iter().zip([Some(0.9), Some(0.3), None]) {
        if let Some(confidence) = confidence {
            let mut updated = diagnosis.clone();
            updated.confidence = Some(confidence);
            updated.disease_name = Some("Early Blight".to_string());
            assert!(db::diagnoses::update_pending(&pool, &updated).await.unwrap());
        }
    }

    let by_confidence = lifecycle::list_pending(&pool, &agronomist, SortOrder::Confidence, false)
        .await
        .unwrap();
    assert_eq!(by_confidence[0].confidence, None);
    assert_eq!(by_confidence[1].confidence, Some(0.3));
    assert_eq!(by_confidence[2].confidence, Some(0.9));

    let low_only = lifecycle::list_pending(&pool, &agronomist, SortOrder::Confidence, true)
        .await
        .unwrap();
    assert_eq!(low_only.len(), 1);
    assert_eq!(low_only[0].confidence, Some(0.3));
}

#[tokio::test]
async fn test_visibility_rules() {
    let (pool, farmer, agronomist) = setup().await;
    let other_farmer = seed_account(&pool, Role::Farmer, true).await;
    let diagnosis = lifecycle::submit(&pool, &farmer, "img://a").await.unwrap();

    // Owner and reviewer may read
    assert!(lifecycle::get_visible(&pool, &farmer, diagnosis.id).await.is_ok());
    assert!(lifecycle::get_visible(&pool, &agronomist, diagnosis.id).await.is_ok());

    // Another farmer may not
    let err = lifecycle::get_visible(&pool, &other_farmer, diagnosis.id)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));

    // Own listing contains only own records
    let own = lifecycle::list_own(&pool, &other_farmer).await.unwrap();
    assert!(own.is_empty());
    let own = lifecycle::list_own(&pool, &farmer).await.unwrap();
    assert_eq!(own.len(), 1);
}

#[tokio::test]
async fn test_analyzer_fills_pending_record_once() {
    let (pool, farmer, _) = setup().await;
    let diagnosis = lifecycle::submit(&pool, &farmer, "img://field/leaf.jpg")
        .await
        .unwrap();

    assert!(inference::analyze(&pool, diagnosis.id).await.unwrap());

    let analyzed = reload(&pool, diagnosis.id).await;
    assert_eq!(analyzed.status, DiagnosisStatus::Pending);
    assert_ne!(analyzed.disease_name.as_deref(), Some(DISEASE_ANALYZING));
    let confidence = analyzed.confidence.expect("analyzer sets confidence");
    assert!((0.0..=1.0).contains(&confidence));

    // Second pass is a no-op: results are immutable once set
    assert!(!inference::analyze(&pool, diagnosis.id).await.unwrap());
}

#[tokio::test]
async fn test_analyzer_skips_finalized_record() {
    let (pool, farmer, agronomist) = setup().await;
    let diagnosis = lifecycle::submit(&pool, &farmer, "img://a").await.unwrap();
    lifecycle::reject(&pool, &agronomist, diagnosis.id, "duplicate submission")
        .await
        .unwrap();
    let rejected = reload(&pool, diagnosis.id).await;

    assert!(!inference::analyze(&pool, diagnosis.id).await.unwrap());
    assert_eq!(reload(&pool, diagnosis.id).await, rejected);
}
