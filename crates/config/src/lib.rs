// Configuration loading

pub mod settings;

pub use settings::{AlertThresholds, CacheSettings, ConfigError, EntitySource, Settings};
