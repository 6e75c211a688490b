//! HTTP handlers

pub mod balance;
pub mod health;
pub mod obligations;
pub mod tenants;
