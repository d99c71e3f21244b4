//! Integration tests for configuration loading and validation

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use prudp_protocol::config::{CodecConfig, LoggingConfig, ProtocolConfig, MAX_PAYLOAD_SIZE};
use prudp_protocol::error::ProtocolError;
use prudp_protocol::utils::compression::{CompressionAlgorithm, CompressionKind};
use tracing::Level;

#[test]
fn test_default_config_validates() {
    let config = ProtocolConfig::default();
    let errors = config.validate();
    assert!(
        errors.is_empty(),
        "Default config should be valid, but got errors: {:?}",
        errors
    );
    assert_eq!(config.codec.compression, CompressionKind::Deflate);
    assert_eq!(config.codec.max_decompressed_size, MAX_PAYLOAD_SIZE);
}

#[test]
fn test_zero_max_decompressed_size() {
    let mut config = ProtocolConfig::default();
    config.codec.max_decompressed_size = 0;

    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("cannot be 0")));
}

#[test]
fn test_excessive_max_decompressed_size() {
    let mut config = ProtocolConfig::default();
    config.codec.max_decompressed_size = 200 * 1024 * 1024;

    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("too large")));
}

#[test]
fn test_invalid_deflate_level() {
    let config = ProtocolConfig::default_with_overrides(|c| {
        c.codec.compression_level = 12;
    });

    let errors = config.validate();
    assert!(errors
        .iter()
        .any(|e| e.contains("Invalid compression level")));
}

#[test]
fn test_level_ignored_for_lz4() {
    let codec = CodecConfig {
        compression: CompressionKind::Lz4,
        compression_level: 42,
        ..CodecConfig::default()
    };
    assert!(codec.validate().is_empty());
}

#[test]
fn test_threshold_above_max_size() {
    let codec = CodecConfig {
        compression_threshold_bytes: 2048,
        max_decompressed_size: 1024,
        ..CodecConfig::default()
    };
    let errors = codec.validate();
    assert!(errors
        .iter()
        .any(|e| e.contains("Compression threshold cannot be larger")));
}

#[test]
fn test_logging_requires_output() {
    let mut config = ProtocolConfig::default();
    config.logging.log_to_console = false;
    config.logging.log_to_file = false;

    let errors = config.validate();
    assert!(errors
        .iter()
        .any(|e| e.contains("At least one logging output")));
}

#[test]
fn test_logging_file_without_path() {
    let logging = LoggingConfig {
        log_to_file: true,
        log_file_path: None,
        ..LoggingConfig::default()
    };
    assert!(logging
        .validate()
        .iter()
        .any(|e| e.contains("log_file_path must be specified")));
}

#[test]
fn test_validate_strict_joins_errors() {
    let mut config = ProtocolConfig::default();
    config.codec.max_decompressed_size = 0;
    config.logging.app_name = String::new();

    let err = config.validate_strict().unwrap_err().to_string();
    assert!(err.contains("cannot be 0"));
    assert!(err.contains("Application name cannot be empty"));
}

#[test]
fn test_from_toml() {
    let content = r#"
        [codec]
        compression = "lz4"
        compression_level = 1
        compression_threshold_bytes = 128
        max_decompressed_size = 1048576

        [logging]
        app_name = "secure-server"
        log_level = "debug"
        log_to_console = true
        log_to_file = false
        json_format = true
    "#;

    let config = ProtocolConfig::from_toml(content).expect("Should parse TOML");
    assert_eq!(config.codec.compression, CompressionKind::Lz4);
    assert_eq!(config.codec.compression_threshold_bytes, 128);
    assert_eq!(config.codec.max_decompressed_size, 1024 * 1024);
    assert_eq!(config.logging.app_name, "secure-server");
    assert_eq!(config.logging.log_level, Level::DEBUG);
    assert!(config.logging.json_format);
    assert_eq!(config.codec.build_algorithm().kind(), CompressionKind::Lz4);
}

#[test]
fn test_from_toml_rejects_unknown_compression() {
    let content = r#"
        [codec]
        compression = "zstd"
        compression_level = 1
        max_decompressed_size = 1024
    "#;
    assert!(ProtocolConfig::from_toml(content).is_err());
}

#[test]
fn test_save_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prudp.toml");

    let config = ProtocolConfig::default_with_overrides(|c| {
        c.codec.compression = CompressionKind::None;
        c.logging.log_level = Level::WARN;
    });
    config.save_to_file(&path).unwrap();

    let reloaded = ProtocolConfig::from_file(&path).unwrap();
    assert_eq!(reloaded.codec.compression, CompressionKind::None);
    assert_eq!(reloaded.logging.log_level, Level::WARN);
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = ProtocolConfig::from_file(dir.path().join("absent.toml")).unwrap_err();
    match err {
        ProtocolError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
        other => panic!("expected an I/O error, got {other:?}"),
    }
}

#[test]
fn test_example_config_parses() {
    let example = ProtocolConfig::example_config();
    let parsed = ProtocolConfig::from_toml(&example).expect("Example config should parse");
    assert!(parsed.validate().is_empty());
}

// Environment variables are process-global; keep every env case in one test
#[test]
fn test_from_env() {
    std::env::set_var("PRUDP_COMPRESSION", "lzo");
    std::env::set_var("PRUDP_COMPRESSION_THRESHOLD", "256");
    std::env::set_var("PRUDP_LOG_LEVEL", "trace");

    let config = ProtocolConfig::from_env().unwrap();
    assert_eq!(config.codec.compression, CompressionKind::Lz4);
    assert_eq!(config.codec.compression_threshold_bytes, 256);
    assert_eq!(config.logging.log_level, Level::TRACE);

    std::env::set_var("PRUDP_COMPRESSION_LEVEL", "high");
    let err = ProtocolConfig::from_env().unwrap_err();
    assert!(err.to_string().contains("PRUDP_COMPRESSION_LEVEL"));

    for name in [
        "PRUDP_COMPRESSION",
        "PRUDP_COMPRESSION_THRESHOLD",
        "PRUDP_LOG_LEVEL",
        "PRUDP_COMPRESSION_LEVEL",
    ] {
        std::env::remove_var(name);
    }
}

#[test]
fn test_save_into_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("prudp.toml");
    assert!(matches!(
        ProtocolConfig::default().save_to_file(path),
        Err(ProtocolError::Io(_))
    ));
}
