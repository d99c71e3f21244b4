//! # Configuration Management
//!
//! Wire constants and the runtime configuration for the codec layer.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Direct instantiation with defaults
//! - Environment overrides via `from_env()`
//!
//! ## Notes
//! - The default compression threshold (64 bytes) keeps tiny RMC envelopes
//!   out of the compressor; they are framed raw with a zero ratio byte
//! - `max_decompressed_size` caps every decompression to prevent bombs

use crate::error::{ProtocolError, Result};
use crate::utils::compression::{
    CompressionAlgorithm, CompressionKind, DeflateCompression, Lz4Compression, NoCompression,
};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::Level;

/// Header layout version decoded by this crate
pub const PRUDP_VERSION: u8 = 1;

/// Size of the fixed header plus the two option header bytes
pub const PRUDP_V1_HEADER_SIZE: usize = 30;

/// Length of the packet signature
pub const PACKET_SIGNATURE_SIZE: usize = 16;

/// Max allowed decompressed payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: usize = 16 * 1024 * 1024;

/// Default compression level for DEFLATE
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ProtocolConfig {
    /// Payload codec configuration
    #[serde(default)]
    pub codec: CodecConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ProtocolConfig {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// `Io` if the file cannot be opened or read, `ConfigError` if it is not
    /// valid configuration TOML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables on top of the defaults
    ///
    /// Unparseable values are rejected rather than ignored.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(kind) = std::env::var("PRUDP_COMPRESSION") {
            config.codec.compression = kind.parse()?;
        }

        if let Ok(level) = std::env::var("PRUDP_COMPRESSION_LEVEL") {
            config.codec.compression_level = parse_env("PRUDP_COMPRESSION_LEVEL", &level)?;
        }

        if let Ok(threshold) = std::env::var("PRUDP_COMPRESSION_THRESHOLD") {
            config.codec.compression_threshold_bytes =
                parse_env("PRUDP_COMPRESSION_THRESHOLD", &threshold)?;
        }

        if let Ok(max) = std::env::var("PRUDP_MAX_PAYLOAD_SIZE") {
            config.codec.max_decompressed_size = parse_env("PRUDP_MAX_PAYLOAD_SIZE", &max)?;
        }

        if let Ok(level) = std::env::var("PRUDP_LOG_LEVEL") {
            config.logging.log_level = level
                .parse::<Level>()
                .map_err(|_| ProtocolError::ConfigError(format!("Invalid log level: {level}")))?;
        }

        Ok(config)
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate the configuration
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.codec.validate());
        errors.extend(self.logging.validate());
        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ProtocolError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .parse::<T>()
        .map_err(|_| ProtocolError::ConfigError(format!("Invalid value for {name}: '{value}'")))
}

/// Payload codec configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CodecConfig {
    /// Compression strategy applied to RMC payloads
    pub compression: CompressionKind,

    /// DEFLATE level (0-9); ignored by the other strategies
    pub compression_level: u32,

    /// Payloads smaller than this are framed raw (ratio byte 0)
    #[serde(default = "default_compression_threshold")]
    pub compression_threshold_bytes: usize,

    /// Upper bound on any decompressed payload
    pub max_decompressed_size: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            compression: CompressionKind::Deflate,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            compression_threshold_bytes: default_compression_threshold(),
            max_decompressed_size: MAX_PAYLOAD_SIZE,
        }
    }
}

fn default_compression_threshold() -> usize {
    64
}

impl CodecConfig {
    /// Validate codec configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.max_decompressed_size == 0 {
            errors.push("Max decompressed size cannot be 0".to_string());
        } else if self.max_decompressed_size > 100 * 1024 * 1024 {
            errors.push(format!(
                "Max decompressed size too large: {} bytes (maximum recommended: 100 MB)",
                self.max_decompressed_size
            ));
        }

        if self.compression == CompressionKind::Deflate && self.compression_level > 9 {
            errors.push(format!(
                "Invalid compression level: {} (valid range: 0-9)",
                self.compression_level
            ));
        }

        if self.compression != CompressionKind::None
            && self.compression_threshold_bytes > self.max_decompressed_size
        {
            errors
                .push("Compression threshold cannot be larger than max decompressed size".to_string());
        }

        errors
    }

    /// Build a fresh instance of the configured compression strategy
    pub fn build_algorithm(&self) -> Box<dyn CompressionAlgorithm> {
        match self.compression {
            CompressionKind::None => Box::new(NoCompression),
            CompressionKind::Deflate => Box::new(
                DeflateCompression::with_level(self.compression_level)
                    .with_max_output(self.max_decompressed_size),
            ),
            CompressionKind::Lz4 => {
                Box::new(Lz4Compression::new().with_max_output(self.max_decompressed_size))
            }
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to log to console
    pub log_to_console: bool,

    /// Whether to log to file
    pub log_to_file: bool,

    /// Path to log file (if log_to_file is true)
    pub log_file_path: Option<String>,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("prudp-protocol"),
            log_level: Level::INFO,
            log_to_console: true,
            log_to_file: false,
            log_file_path: None,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        if self.log_to_file {
            if let Some(ref path) = self.log_file_path {
                if let Some(parent) = std::path::Path::new(path).parent() {
                    if !parent.as_os_str().is_empty() && !parent.exists() {
                        errors.push(format!(
                            "Log file directory does not exist: {}",
                            parent.display()
                        ));
                    }
                }
            } else {
                errors.push("log_file_path must be specified when log_to_file is true".to_string());
            }
        }

        if !self.log_to_console && !self.log_to_file {
            errors
                .push("At least one logging output (console or file) must be enabled".to_string());
        }

        errors
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let level_str = match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        level_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}
