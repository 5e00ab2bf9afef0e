//! KF-007: CLI subcommands — init, validate, show, completions.

pub mod action;
pub mod logging;

use crate::core::error::{Error, Result};
use crate::core::loader::{self, TerraformSource};
use crate::manifest;
use action::{handle_errors, setup_logger, Context, ExitError};
use clap::{CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default manifest written by `init`.
const TEMPLATE: &str = r#"name: my-cluster

versions:
  kubernetes: 1.14.1

provider:
  name: aws

apiserver:
  address: ""

hosts: []

network:
  pod_subnet: 10.244.0.0/16
  service_subnet: 10.96.0.0/12

workers: []
"#;

#[derive(Parser, Debug)]
#[command(
    name = "kubeforge",
    version,
    about = "Cluster provisioning bootstrap — YAML manifests with Terraform output overlays"
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a starter kubeforge.yaml
    Init {
        /// Directory to initialize (default: current)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Load the manifest, apply Terraform output, and check it is complete
    Validate {
        /// Path to the cluster manifest
        #[arg(short, long, default_value = "kubeforge.yaml")]
        manifest: PathBuf,

        /// Terraform output JSON (`-` reads stdin)
        #[arg(short, long)]
        tf: Option<String>,
    },

    /// Print the resolved manifest after the Terraform overlay
    Show {
        /// Path to the cluster manifest
        #[arg(short, long, default_value = "kubeforge.yaml")]
        manifest: PathBuf,

        /// Terraform output JSON (`-` reads stdin)
        #[arg(short, long)]
        tf: Option<String>,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print a shell completion script
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Run a command with verbosity handling and one-shot error reporting.
pub fn run(ctx: &Context, cmd: Commands) -> std::result::Result<(), ExitError> {
    setup_logger(handle_errors(move |ctx: &Context| dispatch(ctx, cmd)))(ctx)
}

/// Dispatch a CLI command.
pub fn dispatch(_ctx: &Context, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Init { path } => cmd_init(&path),
        Commands::Validate { manifest, tf } => {
            cmd_validate(&manifest, &TerraformSource::from_flag(tf.as_deref()))
        }
        Commands::Show {
            manifest,
            tf,
            output,
        } => cmd_show(
            &manifest,
            &TerraformSource::from_flag(tf.as_deref()),
            output.as_deref(),
        ),
        Commands::Completions { shell } => {
            cmd_completions(shell, &mut std::io::stdout());
            Ok(())
        }
    }
}

fn cmd_init(path: &Path) -> Result<()> {
    let manifest_path = path.join("kubeforge.yaml");
    if manifest_path.exists() {
        return Err(Error::AlreadyExists(manifest_path));
    }

    std::fs::create_dir_all(path).map_err(|e| Error::write(path, e))?;
    std::fs::write(&manifest_path, TEMPLATE).map_err(|e| Error::write(&manifest_path, e))?;

    info!(path = %manifest_path.display(), "initialized manifest");
    println!("Created: {}", manifest_path.display());
    Ok(())
}

fn cmd_validate(path: &Path, source: &TerraformSource) -> Result<()> {
    let resolved = loader::load_with_overlay(path, source)?;
    let errors = manifest::validate(&resolved);
    if !errors.is_empty() {
        return Err(Error::Invalid(errors));
    }

    println!(
        "OK: {} ({} hosts, {} worker pools)",
        resolved.name,
        resolved.hosts.len(),
        resolved.workers.len()
    );
    Ok(())
}

fn cmd_show(path: &Path, source: &TerraformSource, output: Option<&Path>) -> Result<()> {
    let resolved = loader::load_with_overlay(path, source)?;
    let yaml = serde_yaml_ng::to_string(&resolved).map_err(Error::Encode)?;

    match output {
        Some(out) => {
            std::fs::write(out, &yaml).map_err(|e| Error::write(out, e))?;
            debug!(path = %out.display(), "wrote resolved manifest");
        }
        None => print!("{}", yaml),
    }
    Ok(())
}

fn cmd_completions(shell: clap_complete::Shell, out: &mut dyn std::io::Write) {
    clap_complete::generate(shell, &mut Cli::command(), "kubeforge", out);
}
