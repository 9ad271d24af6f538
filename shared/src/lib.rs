//! Shared types and models for the catering operations platform
//!
//! This crate contains the domain types and the pure pricing, stock and
//! settlement rules shared between the backend and the dashboard (via WASM).

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
