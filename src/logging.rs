//! Tracing subscriber setup.

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::domain::error::SignalbenchError;
use crate::domain::settings::LogSettings;

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
///
/// Logs go to stderr, or are appended to `settings.file` when set. A second
/// call is a no-op.
pub fn init(settings: &LogSettings) -> Result<(), SignalbenchError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.level));

    let console = settings
        .file
        .is_none()
        .then(|| fmt::layer().with_target(false).with_writer(std::io::stderr));

    let file = match &settings.file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    // Already installed (tests, repeated CLI runs in one process).
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init();
    Ok(())
}
