//! Settings struct with TOML-based sections.
//!
//! Every section and field carries a serde default, so a partial config file
//! (or none at all) always yields a complete, usable `Settings`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Path-related settings.
    #[serde(default)]
    pub paths: PathSettings,

    /// Storage-group directory table for locating recording files.
    #[serde(default)]
    pub storage: StorageSettings,

    /// External tool binaries for the pipeline stages.
    #[serde(default)]
    pub tools: ToolSettings,

    /// Audio transcoding settings.
    #[serde(default)]
    pub audio: AudioSettings,

    /// Backend notification channel.
    #[serde(default)]
    pub backend: BackendSettings,
}

/// Log and store file locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Folder for log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,

    /// Path of the JSON record store.
    #[serde(default = "default_store_file")]
    pub store_file: String,
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

fn default_store_file() -> String {
    "store.json".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            logs_folder: default_logs_folder(),
            store_file: default_store_file(),
        }
    }
}

/// Maps each storage group name to the directories it spans.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    #[serde(default = "default_groups")]
    pub groups: HashMap<String, Vec<String>>,
}

fn default_groups() -> HashMap<String, Vec<String>> {
    HashMap::from([("Default".to_string(), vec!["recordings".to_string()])])
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            groups: default_groups(),
        }
    }
}

impl StorageSettings {
    /// Locate a recording file within its storage group.
    ///
    /// Scans the group's directories in configured order and returns the
    /// first existing path.
    pub fn find_file(&self, group: &str, basename: &str) -> Option<PathBuf> {
        self.groups.get(group)?.iter().find_map(|dir| {
            let candidate = Path::new(dir).join(basename);
            candidate.exists().then_some(candidate)
        })
    }
}

/// Binaries for the three pipeline stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSettings {
    /// Tailing reader (stage 1).
    #[serde(default = "default_reader")]
    pub reader: String,

    /// Audio transcoder (stage 2).
    #[serde(default = "default_transcoder")]
    pub transcoder: String,

    /// Silence detector (stage 3).
    #[serde(default = "default_detector")]
    pub detector: String,
}

fn default_reader() -> String {
    "tail".to_string()
}

fn default_transcoder() -> String {
    "ffmpeg".to_string()
}

fn default_detector() -> String {
    "/usr/local/bin/silence".to_string()
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            reader: default_reader(),
            transcoder: default_transcoder(),
            detector: default_detector(),
        }
    }
}

/// Audio transcoding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioSettings {
    /// Channel count the transcoder up/downmixes to. Six covers surround
    /// recordings; use 2 if no recording ever carries surround sound.
    #[serde(default = "default_channels")]
    pub channels: u32,
}

fn default_channels() -> u32 {
    6
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            channels: default_channels(),
        }
    }
}

/// Backend command channel for player update messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    6544
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl BackendSettings {
    /// Socket address string for connecting.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn empty_config_yields_full_defaults() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings.audio.channels, 6);
        assert_eq!(settings.tools.reader, "tail");
        assert_eq!(settings.backend.addr(), "127.0.0.1:6544");
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let settings: Settings = toml::from_str("[audio]\nchannels = 2\n").unwrap();
        assert_eq!(settings.audio.channels, 2);
        assert_eq!(settings.tools.transcoder, "ffmpeg");
    }

    #[test]
    fn settings_roundtrip_through_toml() {
        let settings = Settings::default();
        let text = toml::to_string_pretty(&settings).unwrap();
        let back: Settings = toml::from_str(&text).unwrap();
        assert_eq!(back.paths.store_file, settings.paths.store_file);
        assert_eq!(back.storage.groups, settings.storage.groups);
    }

    #[test]
    fn find_file_scans_group_dirs_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a");
        let second = dir.path().join("b");
        fs::create_dir_all(&first).unwrap();
        fs::create_dir_all(&second).unwrap();
        fs::write(second.join("rec.ts"), b"x").unwrap();

        let storage = StorageSettings {
            groups: HashMap::from([(
                "Default".to_string(),
                vec![
                    first.to_string_lossy().to_string(),
                    second.to_string_lossy().to_string(),
                ],
            )]),
        };

        let found = storage.find_file("Default", "rec.ts").unwrap();
        assert_eq!(found, second.join("rec.ts"));
    }

    #[test]
    fn find_file_unknown_group_is_none() {
        let storage = StorageSettings::default();
        assert!(storage.find_file("LiveTV", "rec.ts").is_none());
    }
}
