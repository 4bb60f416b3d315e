//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::roles::Role;

/// Placeholder disease label set at submission, before inference completes
pub const DISEASE_ANALYZING: &str = "Analyzing...";

/// Diagnosis review status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosisStatus {
    Pending,
    Approved,
    Rejected,
}

impl DiagnosisStatus {
    /// Database/wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosisStatus::Pending => "PENDING",
            DiagnosisStatus::Approved => "APPROVED",
            DiagnosisStatus::Rejected => "REJECTED",
        }
    }

    /// Parse from the database/wire representation
    pub fn parse(s: &str) -> Option<DiagnosisStatus> {
        match s {
            "PENDING" => Some(DiagnosisStatus::Pending),
            "APPROVED" => Some(DiagnosisStatus::Approved),
            "REJECTED" => Some(DiagnosisStatus::Rejected),
            _ => None,
        }
    }

    /// APPROVED and REJECTED are terminal: no further transition is permitted
    pub fn is_terminal(&self) -> bool {
        matches!(self, DiagnosisStatus::Approved | DiagnosisStatus::Rejected)
    }
}

impl std::fmt::Display for DiagnosisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single plant-image submission and its inference/review outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub id: Uuid,
    /// Submitting farmer; the owner for listing/visibility rules
    pub farmer_id: Uuid,
    pub image_url: String,
    pub plant_name: String,
    pub disease_name: Option<String>,
    /// Inference certainty in [0.0, 1.0]; set once by the analyzer, never edited by a human
    pub confidence: Option<f64>,
    pub status: DiagnosisStatus,
    /// Non-empty exactly when status is APPROVED
    pub treatment: Option<String>,
    /// Required on REJECTED, optional on APPROVED
    pub agronomist_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User account
///
/// `password_hash` never leaves the server: it is skipped on serialization.
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Bearer session backing an issued auth token
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub account_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// User-facing notification (soft-deleted, purged after 60 days)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub account_id: Uuid,
    pub message: String,
    pub read: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Where an article came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArticleSource {
    Agronomist,
    External,
}

impl ArticleSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleSource::Agronomist => "AGRONOMIST",
            ArticleSource::External => "EXTERNAL",
        }
    }

    pub fn parse(s: &str) -> Option<ArticleSource> {
        match s {
            "AGRONOMIST" => Some(ArticleSource::Agronomist),
            "EXTERNAL" => Some(ArticleSource::External),
            _ => None,
        }
    }
}

/// Knowledge-base article authored by an agronomist or linked from outside
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: Uuid,
    pub author_id: Option<Uuid>,
    /// Denormalized for client display
    pub author_name: Option<String>,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub cover_image_url: Option<String>,
    pub source: ArticleSource,
    pub external_url: Option<String>,
    pub tags: Vec<String>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Registered AI model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiModel {
    pub id: Uuid,
    pub name: String,
    pub version: String,
    pub model_type: String,
    pub is_enabled: bool,
    /// Reported accuracy percentage in [0, 100]
    pub accuracy: Option<f64>,
    pub total_predictions: i64,
    pub last_updated: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
