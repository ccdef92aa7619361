//! Request middleware: bearer authentication and audit logging.

pub mod audit;
pub mod auth;
