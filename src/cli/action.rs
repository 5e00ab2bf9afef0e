//! KF-006: Action decorators — verbosity and centralized error reporting.
//!
//! An action is `FnOnce(&Context) -> Result<(), E>`. Compose as
//! `setup_logger(handle_errors(action))` so the level is raised before the
//! action's first log line.

use super::logging::LogHandle;
use std::fmt::Display;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// Per-invocation context handed to every action.
#[derive(Clone)]
pub struct Context {
    /// Global `--verbose` switch
    pub verbose: bool,
    /// Shared logger whose level the verbosity decorator may raise
    pub log: LogHandle,
}

impl Context {
    pub fn new(verbose: bool, log: LogHandle) -> Self {
        Self { verbose, log }
    }
}

/// Failure signal returned once an error has already been reported.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ExitError {
    /// Empty when the cause was already logged
    pub message: String,
    pub code: i32,
}

impl ExitError {
    pub fn silent(code: i32) -> Self {
        Self {
            message: String::new(),
            code,
        }
    }
}

/// Log a failing action's error once and turn it into exit status 1.
pub fn handle_errors<F, E>(action: F) -> impl FnOnce(&Context) -> Result<(), ExitError>
where
    F: FnOnce(&Context) -> Result<(), E>,
    E: Display,
{
    move |ctx: &Context| {
        action(ctx).map_err(|err| {
            error!("{}", err);
            ExitError::silent(1)
        })
    }
}

/// Raise the shared log level to DEBUG before running the action when `--verbose` is set.
pub fn setup_logger<F, E>(action: F) -> impl FnOnce(&Context) -> Result<(), E>
where
    F: FnOnce(&Context) -> Result<(), E>,
{
    move |ctx: &Context| {
        if ctx.verbose {
            if let Err(e) = ctx.log.set_level(LevelFilter::DEBUG) {
                eprintln!("warning: cannot raise log level: {}", e);
            }
        }
        action(ctx)
    }
}
