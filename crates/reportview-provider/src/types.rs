use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ProviderError;

/// A downloadable artifact attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseFile {
    pub name: String,
    pub url: String,
    pub size: Option<u64>,
    pub sha256: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateInfo {
    pub version: String,
    pub release_name: Option<String>,
    pub release_notes: Option<String>,
    pub release_date: Option<DateTime<Utc>>,
    pub files: Vec<ReleaseFile>,
}

impl UpdateInfo {
    #[must_use]
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            release_name: None,
            release_notes: None,
            release_date: None,
            files: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressInfo {
    pub transferred: u64,
    pub total: u64,
    pub percent: f64,
    pub bytes_per_second: u64,
}

impl ProgressInfo {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn new(transferred: u64, total: u64, bytes_per_second: u64) -> Self {
        let percent = if total == 0 {
            0.0
        } else {
            transferred as f64 / total as f64 * 100.0
        };
        Self {
            transferred,
            total,
            percent,
            bytes_per_second,
        }
    }
}

/// Lifecycle events a provider emits while checking, downloading and
/// installing.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateEvent {
    Error(ProviderError),
    CheckingForUpdate,
    UpdateAvailable(UpdateInfo),
    UpdateNotAvailable(UpdateInfo),
    DownloadProgress(ProgressInfo),
    UpdateDownloaded(UpdateInfo),
}

impl UpdateEvent {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Error(_) => "error",
            Self::CheckingForUpdate => "checking-for-update",
            Self::UpdateAvailable(_) => "update-available",
            Self::UpdateNotAvailable(_) => "update-not-available",
            Self::DownloadProgress(_) => "download-progress",
            Self::UpdateDownloaded(_) => "update-downloaded",
        }
    }
}
