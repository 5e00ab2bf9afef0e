//! KF-003: Error taxonomy for the manifest pipeline and commands.
//!
//! Every variant keeps its underlying cause as a `#[source]` and is only
//! rendered to text at the reporting boundary (`cli::action::handle_errors`).
//! The message prefixes are stable and scripts match on them.

use std::io;
use std::path::PathBuf;

use crate::manifest::ValidationError;

/// Convenience alias used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Where Terraform output was being read from when a read failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerraformOrigin {
    Stdin,
    File,
}

impl std::fmt::Display for TerraformOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdin => write!(f, "stdin"),
            Self::File => write!(f, "file"),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to read file: {0}")]
    Read(#[source] io::Error),

    // The wording says JSON although manifests are YAML; kept verbatim.
    #[error("failed to decode file as JSON: {0}")]
    Decode(#[source] serde_yaml_ng::Error),

    #[error("unable to load terraform output from {origin}: {source}")]
    TerraformRead {
        origin: TerraformOrigin,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse terraform config: {0}")]
    TerraformParse(#[source] serde_json::Error),

    #[error("manifest is invalid: {}", join_errors(.0))]
    Invalid(Vec<ValidationError>),

    #[error("{} already exists", .0.display())]
    AlreadyExists(PathBuf),

    #[error("cannot write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode manifest: {0}")]
    Encode(#[source] serde_yaml_ng::Error),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    pub fn terraform_read(origin: TerraformOrigin, source: io::Error) -> Self {
        Error::TerraformRead { origin, source }
    }

    pub fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Write {
            path: path.into(),
            source,
        }
    }
}
