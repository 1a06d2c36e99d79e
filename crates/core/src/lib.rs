//! Core business logic for Tresor.
//!
//! This crate contains pure business logic with ZERO web or database
//! dependencies. All domain types, validation rules, and lifecycle
//! transitions live here.
//!
//! # Modules
//!
//! - `workflow` - Maker-checker record lifecycle engine

pub mod workflow;
