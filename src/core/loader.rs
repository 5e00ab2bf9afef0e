//! KF-004: Manifest load-and-overlay pipeline.
//!
//! file → YAML decode → optional Terraform overlay → `Manifest`.
//! Nothing here validates; callers decide whether a resolved manifest must be
//! complete (see `manifest::validate`).

use super::error::{Error, Result, TerraformOrigin};
use crate::manifest::Manifest;
use crate::terraform;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where Terraform output comes from, resolved once from the `--tf` flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TerraformSource {
    /// No overlay requested.
    #[default]
    Disabled,
    /// Read `terraform output -json` from standard input.
    Stdin,
    /// Read it from a file.
    File(PathBuf),
}

impl TerraformSource {
    /// `""` disables the overlay, `"-"` selects stdin, anything else is a path.
    pub fn from_flag(flag: Option<&str>) -> Self {
        match flag {
            None | Some("") => Self::Disabled,
            Some("-") => Self::Stdin,
            Some(path) => Self::File(PathBuf::from(path)),
        }
    }

    /// Read the raw document. `Ok(None)` when the overlay is disabled.
    fn read<R: Read>(&self, mut stdin: R) -> Result<Option<Vec<u8>>> {
        match self {
            Self::Disabled => Ok(None),
            Self::Stdin => {
                let mut buf = Vec::new();
                stdin
                    .read_to_end(&mut buf)
                    .map_err(|e| Error::terraform_read(TerraformOrigin::Stdin, e))?;
                Ok(Some(buf))
            }
            Self::File(path) => std::fs::read(path)
                .map(Some)
                .map_err(|e| Error::terraform_read(TerraformOrigin::File, e)),
        }
    }
}

/// Read and decode a manifest file. No manifest is returned on failure.
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let content = std::fs::read(path).map_err(Error::Read)?;
    let manifest = serde_yaml_ng::from_slice(&content).map_err(Error::Decode)?;
    debug!(path = %path.display(), "loaded manifest");
    Ok(manifest)
}

/// Overlay Terraform output onto an already-loaded manifest.
/// Consumes the process stdin when `source` is `Stdin`.
pub fn apply_terraform(source: &TerraformSource, manifest: &mut Manifest) -> Result<()> {
    apply_terraform_from(source, std::io::stdin().lock(), manifest)
}

/// Same as [`apply_terraform`], reading `Stdin` sources from `stdin`.
pub fn apply_terraform_from<R: Read>(
    source: &TerraformSource,
    stdin: R,
    manifest: &mut Manifest,
) -> Result<()> {
    let Some(raw) = source.read(stdin)? else {
        return Ok(());
    };

    let config = terraform::Config::from_json(&raw).map_err(Error::TerraformParse)?;
    config.apply(manifest);
    debug!(source = ?source, "applied terraform output");
    Ok(())
}

/// Load a manifest and apply the optional overlay in one step.
pub fn load_with_overlay(path: &Path, source: &TerraformSource) -> Result<Manifest> {
    let mut manifest = load_manifest(path)?;
    apply_terraform(source, &mut manifest)?;
    Ok(manifest)
}
