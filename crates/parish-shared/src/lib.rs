//! # Parish Shared
//!
//! Configuration, telemetry, constants and small utilities shared by every
//! Parish crate.

pub mod constants;
pub mod utils;
pub mod telemetry;
pub mod config;
pub mod error;

pub use error::AppError;
