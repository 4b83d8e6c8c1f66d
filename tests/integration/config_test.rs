//! Vault configuration from files and the environment

use std::io::Write;
use std::time::Duration;

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use serial_test::serial;
use tempfile::NamedTempFile;

use coldvault::shared::config::ConfigError;
use coldvault::shared::{RestoreTier, VaultConfig};

const VAULT_VARS: [&str; 6] = [
    "VAULT_CONFIG",
    "VAULT_MAX_UPLOAD_BYTES",
    "VAULT_DOWNLOAD_TTL_SECS",
    "VAULT_RESTORE_RETENTION_DAYS",
    "VAULT_BACKEND_TIMEOUT_MS",
    "VAULT_KEY_PREFIX",
];

fn clear_env() {
    for key in VAULT_VARS {
        std::env::remove_var(key);
    }
}

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_from_toml_file() {
    let file = config_file(
        r#"
        max_upload_bytes = 2048
        restore_retention_days = 3
        key_prefix = "vault"
        accepted_media_prefixes = ["image/", "video/"]

        [tiers.standard]
        backend_name = "Bulk"
        "#,
    );

    let config = VaultConfig::from_toml_file(file.path()).unwrap();

    assert_eq!(config.max_upload_bytes, 2048);
    assert_eq!(config.restore_retention_days, 3);
    assert_eq!(config.key_prefix, "vault");
    assert!(config.accepts_media_type("video/mp4"));
    assert_eq!(config.tiers.get(RestoreTier::Standard).backend_name, "Bulk");
    assert_eq!(config.download_ttl, Duration::from_secs(3600));
}

#[test]
fn test_missing_file_is_io_error() {
    let err = VaultConfig::from_toml_file("/definitely/not/here.toml").unwrap_err();
    assert_matches!(err, ConfigError::Io { .. });
}

#[test]
fn test_invalid_file_values_fail_validation() {
    let file = config_file("download_ttl_secs = 0\n");
    assert_matches!(
        VaultConfig::from_toml_file(file.path()),
        Err(ConfigError::Invalid(_))
    );
}

#[test]
#[serial]
fn test_from_env_defaults() {
    clear_env();
    assert_eq!(VaultConfig::from_env().unwrap(), VaultConfig::default());
}

#[test]
#[serial]
fn test_from_env_overrides() {
    clear_env();
    std::env::set_var("VAULT_DOWNLOAD_TTL_SECS", "900");
    std::env::set_var("VAULT_BACKEND_TIMEOUT_MS", "1500");
    std::env::set_var("VAULT_KEY_PREFIX", "archive");

    let config = VaultConfig::from_env().unwrap();
    clear_env();

    assert_eq!(config.download_ttl, Duration::from_secs(900));
    assert_eq!(config.backend_timeout, Some(Duration::from_millis(1500)));
    assert_eq!(config.key_prefix, "archive");
}

#[test]
#[serial]
fn test_env_applies_on_top_of_file() {
    clear_env();
    let file = config_file("max_upload_bytes = 4096\nrestore_retention_days = 2\n");
    std::env::set_var("VAULT_CONFIG", file.path());
    std::env::set_var("VAULT_RESTORE_RETENTION_DAYS", "5");

    let config = VaultConfig::from_env().unwrap();
    clear_env();

    assert_eq!(config.max_upload_bytes, 4096);
    assert_eq!(config.restore_retention_days, 5);
}

#[test]
#[serial]
fn test_from_env_rejects_garbage() {
    clear_env();
    std::env::set_var("VAULT_MAX_UPLOAD_BYTES", "lots");

    let result = VaultConfig::from_env();
    clear_env();

    assert_matches!(
        result,
        Err(ConfigError::InvalidValue { key: "VAULT_MAX_UPLOAD_BYTES", .. })
    );
}
