//! Kubeforge — cluster provisioning bootstrap.
//!
//! Loads a YAML cluster manifest, overlays Terraform output onto it, and
//! wraps every command with verbosity control and one-shot error reporting.

pub mod cli;
pub mod core;
pub mod manifest;
pub mod terraform;
