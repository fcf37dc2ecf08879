//! Daemon settings, loaded once at startup.
//!
//! The settings file is JSON; every field has a default so a missing file
//! (or a partial one) yields a working configuration. A present but
//! unparsable file is a fatal startup configuration error.

use crate::domain::functions::{FunctionConfig, FunctionKind};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Environment variable overriding the settings file path.
pub const CONFIG_ENV: &str = "HIDLINK_CONFIG";

/// Default settings file path.
pub const CONFIG_PATH: &str = "/etc/hidlink/config.json";

/// HID service class UUID from the Bluetooth assigned numbers (0x1124).
pub const HID_SERVICE_UUID: &str = "00001124-0000-1000-8000-00805f9b34fb";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    #[serde(default = "default_level")]
    pub level: String, // "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_false")]
    pub file_logging_enabled: bool,
    #[serde(default = "default_true")]
    pub console_logging_enabled: bool,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    #[serde(default = "default_prefix")]
    pub file_name_prefix: String,
    #[serde(default = "default_false")]
    pub show_file_line: bool,
    #[serde(default = "default_false")]
    pub show_thread_ids: bool,
    #[serde(default = "default_true")]
    pub show_target: bool,
    #[serde(default = "default_true")]
    pub ansi_colors: bool,
    #[serde(default = "default_rotation")]
    pub rotation: String, // "daily", "hourly", "minutely", "never"
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            file_logging_enabled: default_false(),
            console_logging_enabled: default_true(),
            log_dir: default_log_dir(),
            file_name_prefix: default_prefix(),
            show_file_line: default_false(),
            show_thread_ids: default_false(),
            show_target: default_true(),
            ansi_colors: default_true(),
            rotation: default_rotation(),
        }
    }
}

/// Loopback listener the report producers connect to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestSettings {
    #[serde(default = "default_ingest_host")]
    pub host: String,
    #[serde(default = "default_ingest_port")]
    pub port: u16,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            host: default_ingest_host(),
            port: default_ingest_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BluetoothSettings {
    /// Service UUID registered with the profile manager.
    #[serde(default = "default_service_uuid")]
    pub service_uuid: String,
    /// Listen backlog for the control and interrupt sockets.
    #[serde(default = "default_accept_backlog")]
    pub accept_backlog: u32,
    /// Per-client outbound queue depth. A client whose queue is full when a
    /// frame arrives is disconnected rather than allowed to buffer without
    /// bound.
    #[serde(default = "default_client_queue_depth")]
    pub client_queue_depth: usize,
}

impl Default for BluetoothSettings {
    fn default() -> Self {
        Self {
            service_uuid: default_service_uuid(),
            accept_backlog: default_accept_backlog(),
            client_queue_depth: default_client_queue_depth(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub ingest: IngestSettings,
    #[serde(default)]
    pub bluetooth: BluetoothSettings,
    #[serde(default = "default_functions")]
    pub functions: Vec<FunctionConfig>,
    #[serde(default)]
    pub log: LogSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ingest: IngestSettings::default(),
            bluetooth: BluetoothSettings::default(),
            functions: default_functions(),
            log: LogSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from `$HIDLINK_CONFIG` or the default path. A missing
    /// file yields defaults; a malformed one is fatal.
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path();
        if !path.is_file() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("reading settings file {}", path.display()))?;
        let settings = serde_json::from_str(&contents)
            .with_context(|| format!("parsing settings file {}", path.display()))?;
        Ok(settings)
    }

    fn config_path() -> PathBuf {
        std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CONFIG_PATH))
    }
}

fn default_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_log_dir() -> String {
    "/var/log/hidlink".to_string()
}
fn default_prefix() -> String {
    "hidlink".to_string()
}
fn default_rotation() -> String {
    "daily".to_string()
}
fn default_ingest_host() -> String {
    "127.0.0.1".to_string()
}
fn default_ingest_port() -> u16 {
    6789
}
fn default_service_uuid() -> String {
    HID_SERVICE_UUID.to_string()
}
fn default_accept_backlog() -> u32 {
    1
}
fn default_client_queue_depth() -> usize {
    64
}

fn default_functions() -> Vec<FunctionConfig> {
    vec![
        FunctionConfig {
            kind: FunctionKind::Keyboard,
            name: "kb0".to_string(),
        },
        FunctionConfig {
            kind: FunctionKind::Mouse,
            name: "mouse0".to_string(),
        },
        FunctionConfig {
            kind: FunctionKind::Touch,
            name: "touch0".to_string(),
        },
        FunctionConfig {
            kind: FunctionKind::Ethernet,
            name: "usb0".to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.ingest.host, "127.0.0.1");
        assert_eq!(settings.ingest.port, 6789);
        assert_eq!(settings.bluetooth.service_uuid, HID_SERVICE_UUID);
        assert_eq!(settings.bluetooth.accept_backlog, 1);
        assert_eq!(settings.functions.len(), 4);
    }

    #[test]
    fn test_partial_file_uses_field_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"ingest": {"port": 7000}}"#).unwrap();
        assert_eq!(settings.ingest.port, 7000);
        assert_eq!(settings.ingest.host, "127.0.0.1");
        assert_eq!(settings.bluetooth.client_queue_depth, 64);
        assert!(!settings.functions.is_empty());
    }

    #[test]
    fn test_function_list_round_trip() {
        let json = serde_json::to_string(&Settings::default()).unwrap();
        let settings: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(settings.functions[0].name, "kb0");
    }
}
