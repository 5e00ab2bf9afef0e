//! Core pipeline — error taxonomy, manifest loading, Terraform overlay.

pub mod error;
pub mod loader;
