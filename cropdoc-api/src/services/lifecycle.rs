//! Diagnosis lifecycle
//!
//! Owns the PENDING → APPROVED/REJECTED state machine, the fields writable
//! in each state, and the authorization checks gating every operation.
//! Every mutation validates before writing, so a failed call leaves the
//! record untouched; the write itself is conditional on the record still
//! being PENDING (`db::diagnoses::update_pending`), which turns a lost
//! approve/reject race into `Conflict` instead of double-processing.

use sqlx::SqlitePool;
use uuid::Uuid;

use cropdoc_common::db::models::{Account, Diagnosis, DiagnosisStatus, DISEASE_ANALYZING};
use cropdoc_common::roles::{can_perform, Action};
use cropdoc_common::{time, uuid_utils, Error, Result};

use crate::db;
use crate::services::notifier;
use crate::services::triage::{self, SortOrder};

/// Plant label used until inference or an agronomist supplies one
pub const PLANT_UNIDENTIFIED: &str = "Unidentified plant";

/// Fields an agronomist may correct while a record is PENDING
#[derive(Debug, Clone, Default)]
pub struct AnnotatePatch {
    pub plant_name: Option<String>,
    pub disease_name: Option<String>,
}

/// Create a new PENDING diagnosis for a submitted image
pub async fn submit(pool: &SqlitePool, caller: &Account, image_url: &str) -> Result<Diagnosis> {
    if !can_perform(Action::SubmitDiagnosis, caller) {
        return Err(Error::Forbidden(
            "Only active farmers may submit diagnoses".to_string(),
        ));
    }

    let image_url = image_url.trim();
    if image_url.is_empty() {
        return Err(Error::Validation("image_url must not be empty".to_string()));
    }

    let now = time::now();
    let diagnosis = Diagnosis {
        id: uuid_utils::generate(),
        farmer_id: caller.id,
        image_url: image_url.to_string(),
        plant_name: PLANT_UNIDENTIFIED.to_string(),
        disease_name: Some(DISEASE_ANALYZING.to_string()),
        confidence: None,
        status: DiagnosisStatus::Pending,
        treatment: None,
        agronomist_notes: None,
        created_at: now,
        updated_at: now,
    };

    db::diagnoses::insert(pool, &diagnosis).await?;
    Ok(diagnosis)
}

/// Correct plant/disease labels on a record still awaiting review
pub async fn annotate(
    pool: &SqlitePool,
    caller: &Account,
    id: Uuid,
    patch: AnnotatePatch,
) -> Result<Diagnosis> {
    if !can_perform(Action::AnnotateDiagnosis, caller) {
        return Err(Error::Forbidden(
            "Only active agronomists may annotate diagnoses".to_string(),
        ));
    }

    let mut diagnosis = load_pending(pool, id, "annotate").await?;

    if patch.plant_name.is_none() && patch.disease_name.is_none() {
        return Err(Error::Validation(
            "At least one of plant_name, disease_name is required".to_string(),
        ));
    }

    if let Some(plant_name) = patch.plant_name {
        let plant_name = plant_name.trim();
        if plant_name.is_empty() {
            return Err(Error::Validation("plant_name must not be empty".to_string()));
        }
        diagnosis.plant_name = plant_name.to_string();
    }

    if let Some(disease_name) = patch.disease_name {
        let disease_name = disease_name.trim();
        if disease_name.is_empty() {
            return Err(Error::Validation("disease_name must not be empty".to_string()));
        }
        diagnosis.disease_name = Some(disease_name.to_string());
    }

    diagnosis.updated_at = time::now();
    store_pending(pool, &diagnosis).await?;
    Ok(diagnosis)
}

/// Finalize a PENDING record as APPROVED with a treatment plan
///
/// The submitting farmer is notified best-effort.
pub async fn approve(
    pool: &SqlitePool,
    caller: &Account,
    id: Uuid,
    treatment: &str,
    notes: Option<&str>,
) -> Result<Diagnosis> {
    if !can_perform(Action::ApproveDiagnosis, caller) {
        return Err(Error::Forbidden(
            "Only active agronomists may approve diagnoses".to_string(),
        ));
    }

    let mut diagnosis = load_pending(pool, id, "approve").await?;

    let treatment = treatment.trim();
    if treatment.is_empty() {
        return Err(Error::Validation("treatment must not be empty".to_string()));
    }

    diagnosis.status = DiagnosisStatus::Approved;
    diagnosis.treatment = Some(treatment.to_string());
    // Provided notes replace existing ones; otherwise existing notes stand
    if let Some(notes) = notes {
        let notes = notes.trim();
        if !notes.is_empty() {
            diagnosis.agronomist_notes = Some(notes.to_string());
        }
    }
    diagnosis.updated_at = time::now();

    store_pending(pool, &diagnosis).await?;

    notifier::notify(
        pool,
        diagnosis.farmer_id,
        &format!(
            "Your {} diagnosis was approved with a treatment plan.",
            diagnosis.plant_name
        ),
    )
    .await;

    Ok(diagnosis)
}

/// Finalize a PENDING record as REJECTED with a reason
///
/// The submitting farmer is notified best-effort.
pub async fn reject(
    pool: &SqlitePool,
    caller: &Account,
    id: Uuid,
    reason: &str,
) -> Result<Diagnosis> {
    if !can_perform(Action::RejectDiagnosis, caller) {
        return Err(Error::Forbidden(
            "Only active agronomists may reject diagnoses".to_string(),
        ));
    }

    let mut diagnosis = load_pending(pool, id, "reject").await?;

    let reason = reason.trim();
    if reason.is_empty() {
        return Err(Error::Validation("reason must not be empty".to_string()));
    }

    diagnosis.status = DiagnosisStatus::Rejected;
    diagnosis.agronomist_notes = Some(reason.to_string());
    diagnosis.updated_at = time::now();

    store_pending(pool, &diagnosis).await?;

    notifier::notify(
        pool,
        diagnosis.farmer_id,
        &format!(
            "Your {} diagnosis was rejected: {}",
            diagnosis.plant_name, reason
        ),
    )
    .await;

    Ok(diagnosis)
}

/// Load a diagnosis, enforcing the visibility rule (farmers see only their own)
pub async fn get_visible(pool: &SqlitePool, caller: &Account, id: Uuid) -> Result<Diagnosis> {
    let diagnosis = db::diagnoses::get(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Diagnosis {} not found", id)))?;

    if !can_perform(
        Action::ViewDiagnosis {
            owner_id: diagnosis.farmer_id,
        },
        caller,
    ) {
        return Err(Error::Forbidden(
            "Not permitted to view this diagnosis".to_string(),
        ));
    }

    Ok(diagnosis)
}

/// List the caller's own submissions, newest first
pub async fn list_own(pool: &SqlitePool, caller: &Account) -> Result<Vec<Diagnosis>> {
    if !can_perform(Action::ListOwnDiagnoses, caller) {
        return Err(Error::Forbidden(
            "Only active farmers may list their diagnoses".to_string(),
        ));
    }

    db::diagnoses::list_by_farmer(pool, caller.id).await
}

/// List the pending review queue with triage ordering and filtering
pub async fn list_pending(
    pool: &SqlitePool,
    caller: &Account,
    sort: SortOrder,
    low_confidence_only: bool,
) -> Result<Vec<Diagnosis>> {
    if !can_perform(Action::ListPendingDiagnoses, caller) {
        return Err(Error::Forbidden(
            "Only active agronomists may list the pending queue".to_string(),
        ));
    }

    let queue = db::diagnoses::list_pending(pool).await?;
    Ok(triage::triage(queue, sort, low_confidence_only))
}

/// Load a record and require it to be PENDING
async fn load_pending(pool: &SqlitePool, id: Uuid, verb: &str) -> Result<Diagnosis> {
    let diagnosis = db::diagnoses::get(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Diagnosis {} not found", id)))?;

    if diagnosis.status != DiagnosisStatus::Pending {
        return Err(Error::InvalidTransition(format!(
            "Cannot {} a {} diagnosis",
            verb, diagnosis.status
        )));
    }

    Ok(diagnosis)
}

/// Write back a record read as PENDING; a failed guard is a lost race
async fn store_pending(pool: &SqlitePool, diagnosis: &Diagnosis) -> Result<()> {
    if db::diagnoses::update_pending(pool, diagnosis).await? {
        return Ok(());
    }

    match db::diagnoses::get(pool, diagnosis.id).await? {
        None => Err(Error::NotFound(format!(
            "Diagnosis {} not found",
            diagnosis.id
        ))),
        Some(_) => Err(Error::Conflict(
            "Diagnosis was finalized by a concurrent review".to_string(),
        )),
    }
}
