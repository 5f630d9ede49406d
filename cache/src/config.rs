//! Declarative cache configuration.
//!
//! `CacheConfig` mirrors the builder's options with plain, serializable field
//! types so a cache can be described in a configuration file:
//!
//! ```yaml
//! evictionPolicy: LFU
//! expiryMillis: 30000
//! capacity: 4096
//! persistenceMode: WriteBack
//! laneCount: 8
//! ```

#[cfg(feature = "serde")]
use crate::error::BuildError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default number of execution lanes.
pub const DEFAULT_LANES: usize = 5;
/// Default maximum number of resident entries.
pub const DEFAULT_CAPACITY: usize = 10_000;
/// Default time-to-live, in milliseconds.
pub const DEFAULT_EXPIRY_MILLIS: u64 = 60_000;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default, deny_unknown_fields))]
pub struct CacheConfig {
  /// `LRU`/`Recency` or `LFU`/`Frequency`.
  pub eviction_policy: String,
  /// Time-to-live applied to every entry from its load time.
  pub expiry_millis: u64,
  /// Maximum number of resident entries.
  pub capacity: usize,
  /// `WriteThrough` or `WriteBack`.
  pub persistence_mode: String,
  /// Number of parallel execution lanes.
  pub lane_count: usize,
  /// Whether overwriting a key restarts its access frequency.
  pub reset_frequency_on_overwrite: bool,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      eviction_policy: "LRU".to_string(),
      expiry_millis: DEFAULT_EXPIRY_MILLIS,
      capacity: DEFAULT_CAPACITY,
      persistence_mode: "WriteThrough".to_string(),
      lane_count: DEFAULT_LANES,
      reset_frequency_on_overwrite: false,
    }
  }
}

impl CacheConfig {
  /// Parses a YAML document. Missing fields take their defaults.
  #[cfg(feature = "serde")]
  pub fn from_yaml_str(yaml: &str) -> Result<Self, BuildError> {
    serde_yaml::from_str(yaml).map_err(|err| BuildError::Config(err.to_string()))
  }

  /// Parses a YAML file. Missing fields take their defaults.
  #[cfg(feature = "serde")]
  pub fn from_yaml_file(path: impl AsRef<std::path::Path>) -> Result<Self, BuildError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
      .map_err(|err| BuildError::Config(format!("{}: {}", path.display(), err)))?;
    Self::from_yaml_str(&contents)
  }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
  use super::*;

  #[test]
  fn yaml_uses_camel_case_option_names() {
    let config = CacheConfig::from_yaml_str(
      "evictionPolicy: LFU\nexpiryMillis: 250\ncapacity: 3\npersistenceMode: WriteBack\nlaneCount: 2\n",
    )
    .unwrap();
    assert_eq!(config.eviction_policy, "LFU");
    assert_eq!(config.expiry_millis, 250);
    assert_eq!(config.capacity, 3);
    assert_eq!(config.persistence_mode, "WriteBack");
    assert_eq!(config.lane_count, 2);
    assert!(!config.reset_frequency_on_overwrite);
  }

  #[test]
  fn missing_fields_take_defaults() {
    let config = CacheConfig::from_yaml_str("capacity: 7").unwrap();
    assert_eq!(
      config,
      CacheConfig {
        capacity: 7,
        ..CacheConfig::default()
      }
    );
  }

  #[test]
  fn unknown_fields_are_rejected() {
    let err = CacheConfig::from_yaml_str("capacty: 7").unwrap_err();
    assert!(matches!(err, BuildError::Config(_)));
  }
}
