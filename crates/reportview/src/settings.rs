use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use reportview_core::UpdaterConfig;
use reportview_release::ReleaseChannel;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub debug_logging: bool,

    #[serde(default = "default_max_log_size_bytes")]
    pub max_log_size_bytes: u64,

    #[serde(default = "default_check_interval_minutes")]
    pub check_interval_minutes: u64,

    #[serde(default = "default_true")]
    pub check_on_startup: bool,

    #[serde(default = "default_true")]
    pub reenable_menu_after_check: bool,

    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    #[serde(default)]
    pub release: ReleaseSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseSettings {
    #[serde(default = "default_owner")]
    pub owner: String,

    #[serde(default = "default_repo")]
    pub repo: String,

    #[serde(default = "default_channel")]
    pub channel: String,

    #[serde(default = "default_true")]
    pub allow_prerelease: bool,
}

fn default_true() -> bool {
    true
}

fn default_max_log_size_bytes() -> u64 {
    5 * 1024 * 1024
}

fn default_check_interval_minutes() -> u64 {
    60
}

fn default_http_timeout() -> u64 {
    10
}

fn default_owner() -> String {
    ReleaseChannel::default().owner
}

fn default_repo() -> String {
    ReleaseChannel::default().repo
}

fn default_channel() -> String {
    ReleaseChannel::default().channel
}

impl Default for ReleaseSettings {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            repo: default_repo(),
            channel: default_channel(),
            allow_prerelease: true,
        }
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            debug_logging: false,
            max_log_size_bytes: default_max_log_size_bytes(),
            check_interval_minutes: default_check_interval_minutes(),
            check_on_startup: true,
            reenable_menu_after_check: true,
            http_timeout_secs: default_http_timeout(),
            release: ReleaseSettings::default(),
        }
    }
}

impl AppSettings {
    /// Read settings from `path`, falling back to defaults when the file is
    /// missing or unreadable.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                log::warn!("Ignoring invalid settings file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) => {
                log::warn!("Failed to read settings file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
    }

    /// A zero interval would spin; it is clamped to one minute.
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_minutes.max(1) * 60)
    }

    pub fn updater_config(&self) -> UpdaterConfig {
        UpdaterConfig {
            check_interval: self.check_interval(),
            reenable_menu_after_check: self.reenable_menu_after_check,
        }
    }

    pub fn release_channel(&self) -> ReleaseChannel {
        ReleaseChannel {
            owner: self.release.owner.clone(),
            repo: self.release.repo.clone(),
            channel: self.release.channel.clone(),
            allow_prerelease: self.release.allow_prerelease,
            ..ReleaseChannel::default()
        }
    }
}
