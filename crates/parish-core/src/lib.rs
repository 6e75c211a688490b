//! # Parish Core
//!
//! Domain entities, the obligation status engine, services, and repository
//! traits for the Parish ledger.

pub mod domain;
pub mod services;
pub mod repositories;
pub mod error;

// Re-export domain entities
pub use domain::*;
pub use error::DomainError;
