//! Domain services: diagnosis lifecycle, triage, mock inference, notifier

pub mod inference;
pub mod lifecycle;
pub mod notifier;
pub mod triage;
