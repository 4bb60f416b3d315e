//! Database operations, one module per table

pub mod accounts;
pub mod ai_models;
pub mod articles;
pub mod diagnoses;
pub mod notifications;
pub mod sessions;
