//! KF-005: Process-wide logger with a level that can be raised at runtime.
//!
//! The level lives in a `reload` layer so that `setup_logger` can switch to
//! DEBUG after the subscriber is installed. The handle travels inside
//! [`Context`](super::action::Context) instead of a global.

use tracing::Subscriber;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{reload, Registry};

/// Shared handle to the active log level.
#[derive(Clone)]
pub struct LogHandle {
    inner: reload::Handle<LevelFilter, Registry>,
}

impl LogHandle {
    /// Current minimum level, or `None` if the subscriber has been dropped.
    pub fn level(&self) -> Option<LevelFilter> {
        self.inner.clone_current()
    }

    pub fn set_level(&self, level: LevelFilter) -> Result<(), reload::Error> {
        self.inner.modify(|filter| *filter = level)
    }
}

/// Base level from `RUST_LOG` when it names a plain level, else INFO.
pub fn base_level() -> LevelFilter {
    parse_level(std::env::var("RUST_LOG").ok().as_deref())
}

fn parse_level(value: Option<&str>) -> LevelFilter {
    value
        .and_then(|v| v.trim().parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::INFO)
}

/// Build a subscriber writing to `writer`, plus the handle controlling its level.
pub fn layered<W>(
    level: LevelFilter,
    writer: W,
    ansi: bool,
) -> (impl Subscriber + Send + Sync + 'static, LogHandle)
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let (filter, handle) = reload::Layer::new(level);
    let subscriber = tracing_subscriber::registry().with(filter).with(
        fmt::layer()
            .with_target(false)
            .with_ansi(ansi)
            .with_writer(writer),
    );
    (subscriber, LogHandle { inner: handle })
}

/// Install the stderr logger as the global default.
pub fn init() -> LogHandle {
    use std::io::IsTerminal;

    let ansi = std::io::stderr().is_terminal();
    let (subscriber, handle) = layered(base_level(), std::io::stderr, ansi);
    subscriber.init();
    handle
}
