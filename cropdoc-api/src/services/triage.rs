//! Confidence-based triage of the pending review queue

use serde::Deserialize;
use std::cmp::Ordering;

use cropdoc_common::db::models::Diagnosis;

/// Fixed policy threshold below which a diagnosis is flagged low-confidence
pub const LOW_CONFIDENCE_THRESHOLD: f64 = 0.7;

/// Pending-queue orderings selectable by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    Confidence,
}

/// A diagnosis is low-confidence iff its confidence is known and below the
/// threshold; records still awaiting inference are not flagged
pub fn is_low_confidence(diagnosis: &Diagnosis) -> bool {
    matches!(diagnosis.confidence, Some(c) if c < LOW_CONFIDENCE_THRESHOLD)
}

/// Filter (optionally) to low-confidence records, then sort
///
/// Unknown confidence sorts as 0, so unanalyzed records come first in
/// ascending confidence order.
pub fn triage(
    mut queue: Vec<Diagnosis>,
    sort: SortOrder,
    low_confidence_only: bool,
) -> Vec<Diagnosis> {
    if low_confidence_only {
        queue.retain(is_low_confidence);
    }

    match sort {
        SortOrder::Newest => queue.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortOrder::Oldest => queue.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        SortOrder::Confidence => queue.sort_by(|a, b| {
            let ca = a.confidence.unwrap_or(0.0);
            let cb = b.confidence.unwrap_or(0.0);
            ca.partial_cmp(&cb).unwrap_or(Ordering::Equal)
        }),
    }

    queue
}
