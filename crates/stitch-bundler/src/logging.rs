//! Log levels and subscriber setup.
//!
//! [`LogLevel`] is part of [`StitchConfig`](crate::StitchConfig) and always
//! available. Installing a subscriber needs the `logging` feature; without it
//! stitch only emits `tracing` events and the application decides where they
//! go.
//!
//! Filters are scoped to stitch's own crates, so turning stitch up to
//! `debug` does not turn up every other library in the process. `RUST_LOG`
//! still wins when it is set.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Targets stitch emits events under.
const TARGETS: &[&str] = &["stitch_graph", "stitch_bundler"];

/// Verbosity of stitch's own events.
///
/// Progress lines (`Create`, `Update`, `Bundle`, ...) are `info`; graph
/// resolution details are `debug`; per-plugin and reused-entry events are
/// `trace`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[serde(alias = "off")]
    Silent,
    Error,
    #[serde(alias = "warning")]
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    const ALL: [LogLevel; 6] = [
        LogLevel::Silent,
        LogLevel::Error,
        LogLevel::Warn,
        LogLevel::Info,
        LogLevel::Debug,
        LogLevel::Trace,
    ];

    /// Name used in `stitch.toml` and `STITCH_LOG_LEVEL`.
    pub fn name(self) -> &'static str {
        match self {
            LogLevel::Silent => "silent",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    fn filter_name(self) -> &'static str {
        match self {
            LogLevel::Silent => "off",
            level => level.name(),
        }
    }

    /// `EnvFilter` directives enabling this level for stitch's targets only.
    pub fn directives(self) -> String {
        TARGETS
            .iter()
            .map(|target| format!("{}={}", target, self.filter_name()))
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.to_ascii_lowercase();
        match s.as_str() {
            "off" => Ok(LogLevel::Silent),
            "warning" => Ok(LogLevel::Warn),
            _ => Self::ALL
                .into_iter()
                .find(|level| level.name() == s)
                .ok_or_else(|| format!("Invalid log level: {}", s)),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Install a compact stderr subscriber for stitch's events at `level`.
///
/// `RUST_LOG` overrides `level` when set. Does nothing if the process
/// already has a global subscriber.
///
/// ```rust,no_run
/// use stitch_bundler::{LogLevel, init_logging};
///
/// init_logging(LogLevel::Debug);
/// ```
#[cfg(feature = "logging")]
#[cfg_attr(docsrs, doc(cfg(feature = "logging")))]
pub fn init_logging(level: LogLevel) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.directives()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .with_target(false)
        .without_time()
        .try_init();
}

/// [`init_logging`] at the level a loaded config asks for.
///
/// ```rust,no_run
/// use stitch_bundler::{StitchConfig, init_logging_from_config};
///
/// # fn main() -> stitch_bundler::Result<()> {
/// let config = StitchConfig::load(".")?;
/// init_logging_from_config(&config);
/// # Ok(()) }
/// ```
#[cfg(feature = "logging")]
#[cfg_attr(docsrs, doc(cfg(feature = "logging")))]
pub fn init_logging_from_config(config: &crate::StitchConfig) {
    init_logging(config.effective_log_level());
}
