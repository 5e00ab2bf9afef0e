//! Kubeforge CLI — cluster manifests with Terraform output overlays.

use clap::Parser;
use kubeforge::cli::{action::Context, logging, Cli};

fn main() {
    let cli = Cli::parse();
    let ctx = Context::new(cli.verbose, logging::init());
    if let Err(e) = kubeforge::cli::run(&ctx, cli.command) {
        if !e.message.is_empty() {
            eprintln!("error: {}", e);
        }
        std::process::exit(e.code);
    }
}
