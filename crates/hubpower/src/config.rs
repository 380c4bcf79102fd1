//! Configuration management

use crate::events::NotificationNames;
use anyhow::{Context, Result, anyhow};
use common::VidPid;
use record::DEFAULT_SAVE_FILE;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PowerConfig {
    #[serde(default)]
    pub daemon: DaemonSettings,
    #[serde(default)]
    pub usb: UsbSettings,
    #[serde(default)]
    pub state: StateSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonSettings {
    #[serde(default = "DaemonSettings::default_log_level")]
    pub log_level: String,
    /// Notification names that mean "screen locked"
    #[serde(default = "DaemonSettings::default_locked")]
    pub locked_notifications: Vec<String>,
    /// Notification names that mean "screen unlocked"
    #[serde(default = "DaemonSettings::default_unlocked")]
    pub unlocked_notifications: Vec<String>,
    /// Program and arguments printing one notification per line
    #[serde(default)]
    pub watcher_command: Option<Vec<String>>,
}

impl Default for DaemonSettings {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
            locked_notifications: Self::default_locked(),
            unlocked_notifications: Self::default_unlocked(),
            watcher_command: None,
        }
    }
}

impl DaemonSettings {
    fn default_log_level() -> String {
        "info".to_string()
    }

    fn default_locked() -> Vec<String> {
        NotificationNames::default().locked
    }

    fn default_unlocked() -> Vec<String> {
        NotificationNames::default().unlocked
    }

    pub fn notification_names(&self) -> NotificationNames {
        NotificationNames {
            locked: self.locked_notifications.clone(),
            unlocked: self.unlocked_notifications.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsbSettings {
    /// Devices whose hub port is powered down on lock, as "0xVID:0xPID"
    #[serde(default = "UsbSettings::default_devices")]
    pub devices: Vec<VidPid>,
    /// Control transfer timeout in milliseconds
    #[serde(default = "UsbSettings::default_timeout_ms")]
    pub transfer_timeout_ms: u64,
}

impl Default for UsbSettings {
    fn default() -> Self {
        Self {
            devices: Self::default_devices(),
            transfer_timeout_ms: Self::default_timeout_ms(),
        }
    }
}

impl UsbSettings {
    fn default_devices() -> Vec<VidPid> {
        vec![
            VidPid::new(0x04d9, 0x0355), // keyboard
            VidPid::new(0x046d, 0xc092), // mouse
        ]
    }

    fn default_timeout_ms() -> u64 {
        1000
    }

    pub fn transfer_timeout(&self) -> Duration {
        Duration::from_millis(self.transfer_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSettings {
    /// Where powered-down ports are recorded until restored
    #[serde(default = "StateSettings::default_save_file")]
    pub save_file: PathBuf,
}

impl Default for StateSettings {
    fn default() -> Self {
        Self {
            save_file: Self::default_save_file(),
        }
    }
}

impl StateSettings {
    fn default_save_file() -> PathBuf {
        PathBuf::from(DEFAULT_SAVE_FILE)
    }
}

impl PowerConfig {
    /// Load configuration from the specified path
    ///
    /// Without a path, the first existing standard location is used.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => expand_path(&p),
            None => Self::candidate_paths()
                .into_iter()
                .find(|p| p.exists())
                .ok_or_else(|| anyhow!("No configuration file found"))?,
        };

        Self::load_file(&config_path)
    }

    /// Load the first existing file among `candidates`, or defaults if none exists
    ///
    /// A file that exists but cannot be read, parsed or validated is an error,
    /// never a reason to fall back to the built-in device list.
    pub fn load_first(candidates: &[PathBuf]) -> Result<Self> {
        match candidates.iter().find(|p| p.exists()) {
            Some(path) => Self::load_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from the standard locations, or defaults if there is none
    pub fn load_or_default() -> Result<Self> {
        Self::load_first(&Self::candidate_paths())
    }

    /// Standard configuration locations, in lookup order
    pub fn candidate_paths() -> Vec<PathBuf> {
        vec![
            Self::default_path(),
            PathBuf::from("/etc/usb-lock-power/config.toml"),
        ]
    }

    fn load_file(config_path: &Path) -> Result<Self> {
        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut config: PowerConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        config.state.save_file = expand_path(&config.state.save_file);
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", config_path.display()))?;

        tracing::info!("Loaded configuration from: {}", config_path.display());
        Ok(config)
    }

    /// Save configuration to the specified path
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::info!("Saved configuration to: {}", path.display());
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("usb-lock-power").join("config.toml")
        } else {
            PathBuf::from(".config/usb-lock-power/config.toml")
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.daemon.log_level.as_str()) {
            return Err(anyhow!(
                "Invalid log level '{}', must be one of: {}",
                self.daemon.log_level,
                valid_levels.join(", ")
            ));
        }

        if self.daemon.locked_notifications.is_empty()
            || self.daemon.unlocked_notifications.is_empty()
        {
            return Err(anyhow!("Locked and unlocked notification lists must not be empty"));
        }

        for name in self
            .daemon
            .locked_notifications
            .iter()
            .chain(&self.daemon.unlocked_notifications)
        {
            if name.split_whitespace().count() != 1 {
                return Err(anyhow!(
                    "Invalid notification name '{}', must be a single word",
                    name
                ));
            }
        }

        for name in &self.daemon.locked_notifications {
            if self.daemon.unlocked_notifications.contains(name) {
                return Err(anyhow!(
                    "Notification '{}' is listed as both locked and unlocked",
                    name
                ));
            }
        }

        if let Some(command) = &self.daemon.watcher_command
            && command.first().is_none_or(|program| program.trim().is_empty())
        {
            return Err(anyhow!("watcher_command must name a program"));
        }

        if self.usb.transfer_timeout_ms == 0 {
            return Err(anyhow!("transfer_timeout_ms must be greater than 0"));
        }

        if self.state.save_file.as_os_str().is_empty() {
            return Err(anyhow!("save_file must not be empty"));
        }

        Ok(())
    }
}

/// Expand a leading `~` and environment variables in a path
fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    match shellexpand::full(&raw) {
        Ok(expanded) => PathBuf::from(expanded.into_owned()),
        Err(_) => PathBuf::from(shellexpand::tilde(&raw).into_owned()),
    }
}
