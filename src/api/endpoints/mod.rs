//! HTTP endpoint handlers, one module per resource.

pub mod analysis;
pub mod auth;
pub mod biomarkers;
pub mod health;
pub mod profile;
