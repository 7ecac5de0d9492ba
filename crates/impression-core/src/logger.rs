//! Stderr logger for comparison runs.
//!
//! Lines look like `[  0.153s  WARN correspond] not enough interest points`:
//! elapsed time since install, level, and the component the record came
//! from (`impression_` crate prefix and module path stripped).

use std::io::Write;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable read by [`init_from_env`].
pub const LOG_ENV: &str = "IMPRESSION_LOG";

struct RunLogger {
    level: LevelFilter,
    started: Instant,
}

/// `impression_correspond::graph` → `correspond`; foreign targets pass through.
fn component(target: &str) -> &str {
    let krate = target.split("::").next().unwrap_or(target);
    krate.strip_prefix("impression_").unwrap_or(krate)
}

impl Log for RunLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let elapsed = self.started.elapsed().as_secs_f64();
        let _ = writeln!(
            std::io::stderr().lock(),
            "[{:8.3}s {:>5} {}] {}",
            elapsed,
            record.level(),
            component(record.target()),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<RunLogger> = OnceLock::new();

/// Install the stderr logger at `level`.
///
/// Only the first call installs; later calls leave the level unchanged.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_some() {
        return Ok(());
    }
    let logger = LOGGER.get_or_init(|| RunLogger {
        level,
        started: Instant::now(),
    });
    log::set_logger(logger)?;
    log::set_max_level(level);
    Ok(())
}

/// Parse a level name (`off`, `error`, `warn`, `info`, `debug`, `trace`,
/// any case); missing or unrecognised values give `warn`.
fn level_from(value: Option<&str>) -> LevelFilter {
    value
        .and_then(|v| LevelFilter::from_str(v.trim()).ok())
        .unwrap_or(LevelFilter::Warn)
}

/// Install the stderr logger at the level named by `IMPRESSION_LOG`,
/// defaulting to `warn`.
pub fn init_from_env() -> Result<(), log::SetLoggerError> {
    let value = std::env::var(LOG_ENV).ok();
    init_with_level(level_from(value.as_deref()))
}

/// Install a `tracing` subscriber honouring `RUST_LOG` (default `info`).
///
/// Span close events carry timing for graph build, clique search and scoring.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE);
    let _ = if json {
        builder.json().flatten_event(true).finish().try_init()
    } else {
        builder
            .with_timer(fmt::time::Uptime::default())
            .with_target(false)
            .finish()
            .try_init()
    };
}
