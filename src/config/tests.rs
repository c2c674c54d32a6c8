//! Tests for config functionality.

use crate::config::{BackendKind, LockConfig, Mode, Reentrancy, timeout_from_secs};
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_default_config() {
    let config = LockConfig::default();

    assert_eq!(config.timeout_secs, -1.0);
    assert_eq!(config.poll_interval_secs, 0.05);
    assert_eq!(config.mode, Mode::Exclusive);
    assert_eq!(config.backend, BackendKind::Auto);
    assert_eq!(config.file_mode, 0o644);
    assert_eq!(config.reentrancy, Reentrancy::PerThread);
    assert_eq!(config.timeout(), None);
    assert_eq!(config.poll_interval(), Duration::from_millis(50));
}

#[test]
fn test_parse_minimal_yaml() {
    let config = LockConfig::from_yaml("").unwrap();
    assert_eq!(config, LockConfig::default());
}

#[test]
fn test_parse_partial_yaml() {
    let yaml = r#"
timeout_secs: 2.5
mode: shared
"#;
    let config = LockConfig::from_yaml(yaml).unwrap();

    assert_eq!(config.timeout(), Some(Duration::from_millis(2500)));
    assert_eq!(config.mode, Mode::Shared);

    // Unspecified values should use defaults
    assert_eq!(config.backend, BackendKind::Auto);
    assert_eq!(config.file_mode, 0o644);
}

#[test]
fn test_parse_full_yaml() {
    let yaml = r#"
timeout_secs: 0
poll_interval_secs: 0
mode: exclusive
backend: soft
file_mode: 384 # 0o600
reentrancy: shared
"#;
    let config = LockConfig::from_yaml(yaml).unwrap();
    assert_eq!(config.timeout(), Some(Duration::ZERO));
    assert_eq!(config.poll_interval(), Duration::ZERO);
    assert_eq!(config.backend, BackendKind::Soft);
    assert_eq!(config.file_mode, 0o600);
    assert_eq!(config.reentrancy, Reentrancy::Shared);
}

#[test]
fn test_unknown_fields_are_ignored() {
    let yaml = r#"
poll_interval_secs: 0.2
some_future_option: true
"#;
    let config = LockConfig::from_yaml(yaml).unwrap();
    assert_eq!(config.poll_interval(), Duration::from_millis(200));
}

#[test]
fn test_invalid_enum_value_fails() {
    let result = LockConfig::from_yaml("mode: sideways\n");
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("failed to parse"));
}

#[test]
fn test_validate_rejects_negative_poll_interval() {
    let config = LockConfig {
        poll_interval_secs: -0.1,
        ..LockConfig::default()
    };
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("poll_interval_secs"));
}

#[test]
fn test_validate_rejects_non_finite_timeout() {
    let config = LockConfig {
        timeout_secs: f64::NAN,
        ..LockConfig::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_oversized_file_mode() {
    let config = LockConfig {
        file_mode: 0o17777,
        ..LockConfig::default()
    };
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("file_mode"));
}

#[test]
fn test_negative_timeout_means_forever() {
    assert_eq!(timeout_from_secs(-1.0), None);
    assert_eq!(timeout_from_secs(-0.001), None);
    assert_eq!(timeout_from_secs(0.0), Some(Duration::ZERO));
    assert_eq!(timeout_from_secs(1.0), Some(Duration::from_secs(1)));
}

#[test]
fn test_yaml_roundtrip_preserves_values() {
    let config = LockConfig {
        timeout_secs: 3.0,
        mode: Mode::Shared,
        backend: BackendKind::Native,
        ..LockConfig::default()
    };
    let yaml = config.to_yaml().unwrap();
    assert!(yaml.contains("mode: shared"));
    assert!(yaml.contains("backend: native"));

    let parsed = LockConfig::from_yaml(&yaml).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn test_load_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("lock.yaml");
    std::fs::write(&path, "backend: soft\ntimeout_secs: 1\n").unwrap();

    let config = LockConfig::load(&path).unwrap();
    assert_eq!(config.backend, BackendKind::Soft);
    assert_eq!(config.timeout(), Some(Duration::from_secs(1)));
}

#[test]
fn test_load_missing_file_fails() {
    let temp_dir = TempDir::new().unwrap();
    let result = LockConfig::load(temp_dir.path().join("missing.yaml"));
    assert!(result.unwrap_err().to_string().contains("failed to read config file"));
}

#[test]
fn test_auto_backend_resolves_to_native_on_desktop_platforms() {
    let resolved = BackendKind::Auto.resolve();
    if cfg!(any(unix, windows)) {
        assert_eq!(resolved, BackendKind::Native);
    } else {
        assert_eq!(resolved, BackendKind::Soft);
    }
    assert_eq!(BackendKind::Soft.resolve(), BackendKind::Soft);
}
