//! Log output setup
//!
//! The terminal UI owns the screen, so in that mode logs are appended to a
//! file in the cache directory. Plain mode logs to stderr. The filter is read
//! from `GHFOLIO_LOG` and defaults to `ghfolio=info`.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "GHFOLIO_LOG";

const DEFAULT_FILTER: &str = "ghfolio=info";

/// File name of the log inside the cache directory
pub const LOG_FILE: &str = "ghfolio.log";

/// Where log lines are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
    /// Logging disabled
    Off,
}

impl LogTarget {
    /// Log file target inside `cache_dir`
    pub fn in_cache_dir(cache_dir: &Path) -> Self {
        Self::File(cache_dir.join(LOG_FILE))
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global subscriber
///
/// Does nothing if a subscriber is already installed.
pub fn init_logging(target: &LogTarget) -> io::Result<()> {
    match target {
        LogTarget::Off => {}
        LogTarget::Stderr => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(io::stderr);
            let _ = tracing_subscriber::registry()
                .with(env_filter())
                .with(fmt_layer)
                .try_init();
        }
        LogTarget::File(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(Mutex::new(file));
            let _ = tracing_subscriber::registry()
                .with(env_filter())
                .with(fmt_layer)
                .try_init();
        }
    }
    Ok(())
}
