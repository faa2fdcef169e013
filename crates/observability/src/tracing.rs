//! Subscriber installation.
//!
//! `RUST_LOG` drives filtering; `DONORHUB_LOG_FORMAT=json` switches to
//! structured JSON lines, anything else keeps the human-readable format.

use tracing_subscriber::EnvFilter;

pub const LOG_FORMAT_ENV: &str = "DONORHUB_LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }

    pub fn from_env() -> Self {
        Self::parse(std::env::var(LOG_FORMAT_ENV).ok().as_deref())
    }
}

/// Install the subscriber using `RUST_LOG` (default `info`) and the format
/// named by `DONORHUB_LOG_FORMAT`.
pub fn init() {
    init_with("info", LogFormat::from_env());
}

/// Install the subscriber with an explicit fallback directive and format.
///
/// `RUST_LOG` still wins when set. Subsequent calls are no-ops.
pub fn init_with(default_directive: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    // Logs go to stderr so command output on stdout stays machine-readable.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let _ = match format {
        LogFormat::Json => builder
            .json()
            .with_timer(tracing_subscriber::fmt::time::SystemTime)
            .try_init(),
        LogFormat::Pretty => builder.try_init(),
    };
}
