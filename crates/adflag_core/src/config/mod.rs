//! Application configuration.

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    AudioSettings, BackendSettings, PathSettings, Settings, StorageSettings, ToolSettings,
};
