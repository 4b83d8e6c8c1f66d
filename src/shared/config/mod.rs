//! Vault configuration module
//!
//! Policy values for the archive manager: upload limits, download reference
//! lifetime, restore retention, backend call timeout and the mapping from
//! abstract restore tiers to backend tier names.
//!
//! Configuration is assembled from defaults, an optional TOML file and
//! `VAULT_*` environment variables, in that order.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::shared::archive::RestoreTier;

/// Default upload ceiling: 100 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;
/// Default presigned reference lifetime
pub const DEFAULT_DOWNLOAD_TTL: Duration = Duration::from_secs(3600);
/// Default days a restored copy stays readable
pub const DEFAULT_RESTORE_RETENTION_DAYS: u32 = 7;

/// Backend name and expected duration for one restore tier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierSettings {
    /// Tier name understood by the cold storage backend
    pub backend_name: String,
    /// Documented completion window
    pub estimated_completion: Duration,
}

impl TierSettings {
    pub fn new(backend_name: impl Into<String>, estimated_completion: Duration) -> Self {
        Self {
            backend_name: backend_name.into(),
            estimated_completion,
        }
    }
}

/// Settings for each abstract tier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierTable {
    pub expedited: TierSettings,
    pub standard: TierSettings,
    pub bulk: TierSettings,
}

impl TierTable {
    pub fn get(&self, tier: RestoreTier) -> &TierSettings {
        match tier {
            RestoreTier::Expedited => &self.expedited,
            RestoreTier::Standard => &self.standard,
            RestoreTier::Bulk => &self.bulk,
        }
    }

    fn get_mut(&mut self, tier: RestoreTier) -> &mut TierSettings {
        match tier {
            RestoreTier::Expedited => &mut self.expedited,
            RestoreTier::Standard => &mut self.standard,
            RestoreTier::Bulk => &mut self.bulk,
        }
    }
}

impl Default for TierTable {
    fn default() -> Self {
        Self {
            expedited: TierSettings::new("Expedited", Duration::from_secs(5 * 60)),
            standard: TierSettings::new("Standard", Duration::from_secs(12 * 3600)),
            bulk: TierSettings::new("Bulk", Duration::from_secs(48 * 3600)),
        }
    }
}

/// Archive manager configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultConfig {
    /// Largest accepted item
    pub max_upload_bytes: u64,
    /// Lifetime of download references
    pub download_ttl: Duration,
    /// Days a restored copy stays readable
    pub restore_retention_days: u32,
    /// Applied to every backend call when set
    pub backend_timeout: Option<Duration>,
    /// First segment of every storage key
    pub key_prefix: String,
    /// Media-type prefixes the HTTP layer accepts on upload
    pub accepted_media_prefixes: Vec<String>,
    /// Parallel backend polls during a bulk reconcile
    pub reconcile_concurrency: usize,
    pub tiers: TierTable,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            download_ttl: DEFAULT_DOWNLOAD_TTL,
            restore_retention_days: DEFAULT_RESTORE_RETENTION_DAYS,
            backend_timeout: None,
            key_prefix: "photos".to_string(),
            accepted_media_prefixes: vec!["image/".to_string()],
            reconcile_concurrency: 8,
            tiers: TierTable::default(),
        }
    }
}

impl VaultConfig {
    /// Create a new VaultConfigBuilder
    pub fn builder() -> VaultConfigBuilder {
        VaultConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.download_ttl.is_zero() {
            return Err(ConfigError::Invalid("download_ttl must be positive"));
        }
        if self.restore_retention_days == 0 {
            return Err(ConfigError::Invalid("restore_retention_days must be at least 1"));
        }
        if self.reconcile_concurrency == 0 {
            return Err(ConfigError::Invalid("reconcile_concurrency must be at least 1"));
        }
        if self.key_prefix.trim_matches('/').is_empty() {
            return Err(ConfigError::MissingValue("key_prefix"));
        }
        for tier in [RestoreTier::Expedited, RestoreTier::Standard, RestoreTier::Bulk] {
            if self.tiers.get(tier).backend_name.trim().is_empty() {
                return Err(ConfigError::MissingValue("tiers.backend_name"));
            }
        }
        Ok(())
    }

    /// Whether the HTTP layer should accept this media type
    pub fn accepts_media_type(&self, content_type: &str) -> bool {
        let content_type = content_type.to_ascii_lowercase();
        self.accepted_media_prefixes
            .iter()
            .any(|prefix| content_type.starts_with(&prefix.to_ascii_lowercase()))
    }

    /// Parse a TOML document on top of the defaults
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let file: VaultConfigFile = toml::from_str(source)?;
        let mut config = VaultConfig::default();
        file.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML file on top of the defaults
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Defaults, then `VAULT_CONFIG` (a TOML path) if set, then `VAULT_*` overrides
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match std::env::var("VAULT_CONFIG") {
            Ok(path) => Self::from_toml_file(path)?,
            Err(_) => VaultConfig::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = env_parse::<u64>("VAULT_MAX_UPLOAD_BYTES")? {
            self.max_upload_bytes = value;
        }
        if let Some(secs) = env_parse::<u64>("VAULT_DOWNLOAD_TTL_SECS")? {
            self.download_ttl = Duration::from_secs(secs);
        }
        if let Some(days) = env_parse::<u32>("VAULT_RESTORE_RETENTION_DAYS")? {
            self.restore_retention_days = days;
        }
        if let Some(millis) = env_parse::<u64>("VAULT_BACKEND_TIMEOUT_MS")? {
            self.backend_timeout = (millis > 0).then(|| Duration::from_millis(millis));
        }
        if let Ok(prefix) = std::env::var("VAULT_KEY_PREFIX") {
            self.key_prefix = prefix;
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
        Err(_) => Ok(None),
    }
}

/// On-disk shape of the configuration; every field is optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct VaultConfigFile {
    max_upload_bytes: Option<u64>,
    download_ttl_secs: Option<u64>,
    restore_retention_days: Option<u32>,
    backend_timeout_ms: Option<u64>,
    key_prefix: Option<String>,
    accepted_media_prefixes: Option<Vec<String>>,
    reconcile_concurrency: Option<usize>,
    #[serde(default)]
    tiers: TierFileTable,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TierFileTable {
    expedited: Option<TierFileEntry>,
    standard: Option<TierFileEntry>,
    bulk: Option<TierFileEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TierFileEntry {
    backend_name: Option<String>,
    estimated_completion_secs: Option<u64>,
}

impl VaultConfigFile {
    fn apply(self, config: &mut VaultConfig) {
        if let Some(value) = self.max_upload_bytes {
            config.max_upload_bytes = value;
        }
        if let Some(secs) = self.download_ttl_secs {
            config.download_ttl = Duration::from_secs(secs);
        }
        if let Some(days) = self.restore_retention_days {
            config.restore_retention_days = days;
        }
        if let Some(millis) = self.backend_timeout_ms {
            config.backend_timeout = (millis > 0).then(|| Duration::from_millis(millis));
        }
        if let Some(prefix) = self.key_prefix {
            config.key_prefix = prefix;
        }
        if let Some(prefixes) = self.accepted_media_prefixes {
            config.accepted_media_prefixes = prefixes;
        }
        if let Some(concurrency) = self.reconcile_concurrency {
            config.reconcile_concurrency = concurrency;
        }
        for (tier, entry) in [
            (RestoreTier::Expedited, self.tiers.expedited),
            (RestoreTier::Standard, self.tiers.standard),
            (RestoreTier::Bulk, self.tiers.bulk),
        ] {
            let Some(entry) = entry else { continue };
            let settings = config.tiers.get_mut(tier);
            if let Some(name) = entry.backend_name {
                settings.backend_name = name;
            }
            if let Some(secs) = entry.estimated_completion_secs {
                settings.estimated_completion = Duration::from_secs(secs);
            }
        }
    }
}

/// Builder for VaultConfig
#[derive(Debug, Default)]
pub struct VaultConfigBuilder {
    config: Option<VaultConfig>,
}

impl VaultConfigBuilder {
    fn config(&mut self) -> &mut VaultConfig {
        self.config.get_or_insert_with(VaultConfig::default)
    }

    pub fn max_upload_bytes(mut self, bytes: u64) -> Self {
        self.config().max_upload_bytes = bytes;
        self
    }

    pub fn download_ttl(mut self, ttl: Duration) -> Self {
        self.config().download_ttl = ttl;
        self
    }

    pub fn restore_retention_days(mut self, days: u32) -> Self {
        self.config().restore_retention_days = days;
        self
    }

    pub fn backend_timeout(mut self, timeout: Duration) -> Self {
        self.config().backend_timeout = Some(timeout);
        self
    }

    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config().key_prefix = prefix.into();
        self
    }

    pub fn accepted_media_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.config().accepted_media_prefixes = prefixes;
        self
    }

    pub fn reconcile_concurrency(mut self, concurrency: usize) -> Self {
        self.config().reconcile_concurrency = concurrency;
        self
    }

    pub fn tier(mut self, tier: RestoreTier, settings: TierSettings) -> Self {
        *self.config().tiers.get_mut(tier) = settings;
        self
    }

    /// Build the configuration
    pub fn build(mut self) -> Result<VaultConfig, ConfigError> {
        let config = self.config().clone();
        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}
