//! Mock inference
//!
//! There is no real model behind the platform; analysis picks from a fixed
//! catalog, keyed by a hash of the image reference so repeated submissions
//! of the same image agree. Results are applied through the same
//! status-guarded write path as every other mutation, so a record already
//! finalized by an agronomist is never overwritten.

use sqlx::SqlitePool;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

use cropdoc_common::db::models::{DiagnosisStatus, DISEASE_ANALYZING};
use cropdoc_common::{time, Result};

use crate::db;

/// Stand-in for model latency
const ANALYSIS_DELAY: Duration = Duration::from_millis(1500);

/// A catalog classification
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub plant_name: &'static str,
    pub disease_name: &'static str,
    pub confidence: f64,
}

const CATALOG: &[Classification] = &[
    Classification {
        plant_name: "Tomato",
        disease_name: "Early Blight",
        confidence: 0.87,
    },
    Classification {
        plant_name: "Corn",
        disease_name: "Leaf Rust",
        confidence: 0.72,
    },
    Classification {
        plant_name: "Apple",
        disease_name: "Powdery Mildew",
        confidence: 0.45,
    },
    Classification {
        plant_name: "Potato",
        disease_name: "Late Blight",
        confidence: 0.91,
    },
    Classification {
        plant_name: "Grape",
        disease_name: "Black Rot",
        confidence: 0.63,
    },
];

/// Deterministic catalog pick for an image reference
pub fn classify(image_url: &str) -> Classification {
    let mut hasher = DefaultHasher::new();
    image_url.hash(&mut hasher);
    CATALOG[(hasher.finish() as usize) % CATALOG.len()]
}

/// Apply the mock analysis to a record still awaiting it
///
/// Returns true when results were written; false when the record was
/// already finalized, already analyzed, or gone.
pub async fn analyze(pool: &SqlitePool, diagnosis_id: Uuid) -> Result<bool> {
    let Some(mut diagnosis) = db::diagnoses::get(pool, diagnosis_id).await? else {
        return Ok(false);
    };

    if diagnosis.status != DiagnosisStatus::Pending
        || diagnosis.disease_name.as_deref() != Some(DISEASE_ANALYZING)
    {
        return Ok(false);
    }

    let result = classify(&diagnosis.image_url);
    diagnosis.plant_name = result.plant_name.to_string();
    diagnosis.disease_name = Some(result.disease_name.to_string());
    diagnosis.confidence = Some(result.confidence);
    diagnosis.updated_at = time::now();

    if !db::diagnoses::update_pending(pool, &diagnosis).await? {
        // Finalized while we were classifying
        return Ok(false);
    }

    db::ai_models::increment_predictions(pool).await?;
    Ok(true)
}

/// Run the mock analysis in the background after submission
pub fn spawn_analysis(pool: SqlitePool, diagnosis_id: Uuid) {
    tokio::spawn(async move {
        tokio::time::sleep(ANALYSIS_DELAY).await;
        if let Err(e) = analyze(&pool, diagnosis_id).await {
            warn!("Analysis of diagnosis {} failed: {}", diagnosis_id, e);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_is_deterministic() {
        let a = classify("img://field-7/leaf.jpg");
        let b = classify("img://field-7/leaf.jpg");
        assert_eq!(a, b);
    }

    #[test]
    fn test_catalog_confidences_in_range() {
        for entry in CATALOG {
            assert!((0.0..=1.0).contains(&entry.confidence));
        }
    }
}
