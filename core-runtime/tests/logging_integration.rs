//! Integration tests for logging system

use bridge_traits::time::LogLevel;
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};

#[test]
fn test_logging_initializes_once() {
    // The global subscriber can only be installed once per process, so the
    // whole lifecycle lives in a single test.
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug)
        .with_env_filter(false);

    init_logging(config.clone()).expect("first initialization succeeds");
    tracing::info!(file = "clip.mp4", "logging is live");

    assert!(init_logging(config).is_err());
}

#[test]
fn test_invalid_custom_filter_is_config_error() {
    let config = LoggingConfig::default()
        .with_filter("core_auth=notalevel")
        .with_env_filter(false);

    let err = init_logging(config).unwrap_err();
    assert!(err.to_string().contains("Invalid log filter"));
}

#[test]
fn test_format_selection() {
    #[cfg(debug_assertions)]
    assert_eq!(LoggingConfig::default().format, LogFormat::Pretty);

    #[cfg(not(debug_assertions))]
    assert_eq!(LoggingConfig::default().format, LogFormat::Compact);
}
