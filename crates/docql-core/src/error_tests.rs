//! Tests for `error` module

use super::error::*;

// -------------------------------------------------------------------------
// Error code tests
// -------------------------------------------------------------------------

fn all_variants() -> Vec<Error> {
    vec![
        Error::InvalidFilter("test".into()),
        Error::UnsupportedOperation("test".into()),
        Error::DimensionMismatch {
            expected: 3,
            actual: 4,
        },
        Error::InvalidVector("test".into()),
        Error::InvalidRequest("test".into()),
        Error::InvalidDocument("test".into()),
        Error::QueryState("test".into()),
        Error::Config("test".into()),
        Error::Serialization("test".into()),
        Error::Execution("test".into()),
        Error::Internal("test".into()),
    ]
}

#[test]
fn test_error_codes_are_unique() {
    // Arrange
    let errors = all_variants();

    // Act
    let codes: Vec<&str> = errors.iter().map(Error::code).collect();

    // Assert
    let mut unique_codes = codes.clone();
    unique_codes.sort_unstable();
    unique_codes.dedup();
    assert_eq!(codes.len(), unique_codes.len(), "Error codes must be unique");

    for code in &codes {
        assert!(
            code.starts_with("DOCQL-"),
            "Code {code} should start with DOCQL-"
        );
    }
}

#[test]
fn test_error_display_includes_code() {
    // Arrange
    let err = Error::InvalidFilter("operator $foo is not known".into());

    // Act
    let display = format!("{err}");

    // Assert
    assert!(display.starts_with("[DOCQL-001]"));
    assert!(display.contains("$foo"));
}

#[test]
fn test_dimension_mismatch_names_both_lengths() {
    // Arrange
    let err = Error::DimensionMismatch {
        expected: 1536,
        actual: 768,
    };

    // Act
    let display = format!("{err}");

    // Assert
    assert!(display.contains("1536"));
    assert!(display.contains("768"));
    assert!(display.contains("DOCQL-003"));
}

// -------------------------------------------------------------------------
// Classification tests
// -------------------------------------------------------------------------

#[test]
fn test_client_errors_map_to_400() {
    assert_eq!(Error::InvalidFilter("x".into()).status_code(), 400);
    assert_eq!(Error::UnsupportedOperation("x".into()).status_code(), 400);
    assert_eq!(
        Error::DimensionMismatch {
            expected: 2,
            actual: 3
        }
        .status_code(),
        400
    );
    assert_eq!(Error::InvalidRequest("x".into()).status_code(), 400);
}

#[test]
fn test_server_errors_map_to_500() {
    assert!(!Error::QueryState("missing table".into()).is_client_error());
    assert_eq!(Error::Execution("timeout".into()).status_code(), 500);
    assert_eq!(Error::Internal("bug".into()).status_code(), 500);
}

// -------------------------------------------------------------------------
// Conversion tests
// -------------------------------------------------------------------------

#[test]
fn test_from_serde_json_error() {
    // Arrange
    let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();

    // Act
    let err: Error = json_err.into();

    // Assert
    assert_eq!(err.code(), "DOCQL-009");
}

#[test]
fn test_from_config_error() {
    // Arrange
    let config_err = crate::config::ConfigError::InvalidValue {
        key: "search.max_limit".into(),
        message: "out of range".into(),
    };

    // Act
    let err: Error = config_err.into();

    // Assert
    assert_eq!(err.code(), "DOCQL-008");
    assert!(format!("{err}").contains("search.max_limit"));
}

#[test]
fn test_error_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Error>();
}
