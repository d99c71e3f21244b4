//! Tracing subscriber setup driven by [`LoggingConfig`].

use crate::config::LoggingConfig;
use crate::error::{constants, ProtocolError, Result};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing::info;

/// Install a global `fmt` subscriber.
///
/// File output takes precedence over console output when both are enabled.
///
/// # Errors
/// `ConfigError` if the configuration is invalid, the log file cannot be
/// opened, or a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ProtocolError::ConfigError(errors.join("; ")));
    }

    let builder = tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_target(true);

    let installed = match (config.log_to_file, config.log_file_path.as_deref()) {
        (true, Some(path)) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| {
                    ProtocolError::ConfigError(format!("Failed to open log file {path}: {e}"))
                })?;
            let builder = builder.with_writer(Mutex::new(file)).with_ansi(false);
            if config.json_format {
                builder.json().try_init()
            } else {
                builder.try_init()
            }
        }
        _ => {
            if config.json_format {
                builder.json().try_init()
            } else {
                builder.try_init()
            }
        }
    };

    installed
        .map_err(|_| ProtocolError::ConfigError(constants::ERR_SUBSCRIBER_SET.to_string()))?;

    info!(
        app = %config.app_name,
        level = %config.log_level,
        json = config.json_format,
        "Logging initialized"
    );
    Ok(())
}
