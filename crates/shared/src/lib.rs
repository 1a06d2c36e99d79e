//! Shared types, errors, and configuration for Tresor.
//!
//! This crate provides common types used across all other crates:
//! - Field value model for schema-driven master data records
//! - Typed IDs for type-safe entity references
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
