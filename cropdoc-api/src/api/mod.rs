//! HTTP handlers

pub mod admin;
pub mod articles;
pub mod auth;
pub mod diagnoses;
pub mod health;
pub mod notifications;
