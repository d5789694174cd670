use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use log::{info, warn};
use reportview_provider::{
    EventHub, EventSink, ProviderConfig, ProviderError, ProviderKind, UpdateEvent, UpdateInfo,
    UpdateProvider,
};

use crate::channel::ReleaseChannel;
use crate::download::{download_file, verify_checksum};
use crate::release::{fetch_releases, select_update};

/// Invoked after the installer has been launched so the host can exit.
pub type QuitHook = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Default)]
struct ReleaseState {
    config: ProviderConfig,
    available: Option<UpdateInfo>,
    downloaded: Option<PathBuf>,
}

/// Installer-based provider backed by a GitHub release channel.
pub struct ReleaseProvider {
    client: reqwest::Client,
    channel: ReleaseChannel,
    current_version: String,
    cache_dir: PathBuf,
    hub: EventHub,
    state: Mutex<ReleaseState>,
    quit_hook: Option<QuitHook>,
}

impl ReleaseProvider {
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        channel: ReleaseChannel,
        current_version: impl Into<String>,
        cache_dir: PathBuf,
    ) -> Self {
        Self {
            client,
            channel,
            current_version: current_version.into(),
            cache_dir,
            hub: EventHub::new(),
            state: Mutex::new(ReleaseState::default()),
            quit_hook: None,
        }
    }

    #[must_use]
    pub fn with_quit_hook(mut self, hook: QuitHook) -> Self {
        self.quit_hook = Some(hook);
        self
    }

    fn lock_state(&self) -> MutexGuard<'_, ReleaseState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fail(&self, error: ProviderError) -> ProviderError {
        warn!("Update provider error: {error}");
        self.hub.emit(&UpdateEvent::Error(error.clone()));
        error
    }

    async fn run_check(&self) -> Result<Option<UpdateInfo>, ProviderError> {
        self.hub.emit(&UpdateEvent::CheckingForUpdate);

        let releases = fetch_releases(&self.client, &self.channel)
            .await
            .map_err(|error| self.fail(error))?;

        let Some(update) = select_update(&releases, &self.channel, &self.current_version) else {
            info!("No update available (current {})", self.current_version);
            self.lock_state().available = None;
            self.hub.emit(&UpdateEvent::UpdateNotAvailable(UpdateInfo::new(
                self.current_version.clone(),
            )));
            return Ok(None);
        };

        info!(
            "Update available: {} -> {}",
            self.current_version, update.version
        );
        let auto_download = {
            let mut state = self.lock_state();
            state.available = Some(update.clone());
            state.config.auto_download
        };
        self.hub.emit(&UpdateEvent::UpdateAvailable(update.clone()));

        if auto_download {
            self.download_update().await?;
        }
        Ok(Some(update))
    }

    async fn fetch_installer(&self, update: &UpdateInfo) -> Result<PathBuf, ProviderError> {
        let asset_name = self.channel.installer_asset_name(&update.version);
        let file = update
            .files
            .iter()
            .find(|file| file.name == asset_name)
            .ok_or_else(|| ProviderError::MissingAsset {
                asset: asset_name.clone(),
                version: update.version.clone(),
            })?;

        tokio::fs::create_dir_all(&self.cache_dir)
            .await
            .map_err(|error| ProviderError::io("create updater cache directory", &error))?;
        let dest = self.cache_dir.join(&asset_name);

        info!("Downloading update from {}", file.url);
        download_file(&self.client, &file.url, &dest, |progress| {
            self.hub.emit(&UpdateEvent::DownloadProgress(progress));
        })
        .await?;

        if let Some(expected) = &file.sha256
            && let Err(error) = verify_checksum(&dest, &asset_name, expected)
        {
            let _ = std::fs::remove_file(&dest);
            return Err(error);
        }

        Ok(dest)
    }
}

#[async_trait]
impl UpdateProvider for ReleaseProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Installer
    }

    fn configure(&self, config: ProviderConfig) {
        self.lock_state().config = config;
    }

    fn subscribe(&self, sink: EventSink) {
        self.hub.subscribe(sink);
    }

    fn subscriber_count(&self) -> usize {
        self.hub.len()
    }

    async fn check_for_updates(&self) -> Result<Option<UpdateInfo>, ProviderError> {
        self.run_check().await
    }

    async fn check_for_updates_and_notify(&self) -> Result<Option<UpdateInfo>, ProviderError> {
        // User-facing notification is the subscriber's job.
        self.run_check().await
    }

    async fn download_update(&self) -> Result<(), ProviderError> {
        let Some(update) = self.lock_state().available.clone() else {
            return Err(self.fail(ProviderError::NoUpdateAvailable));
        };

        let path = self
            .fetch_installer(&update)
            .await
            .map_err(|error| self.fail(error))?;

        self.lock_state().downloaded = Some(path);
        self.hub.emit(&UpdateEvent::UpdateDownloaded(update));
        Ok(())
    }

    async fn quit_and_install(&self, silent: bool, force: bool) -> Result<(), ProviderError> {
        let Some(installer) = self.lock_state().downloaded.take() else {
            return Err(self.fail(ProviderError::NoUpdateDownloaded));
        };

        if let Err(error) = launch_installer(&installer, silent, force) {
            self.lock_state().downloaded = Some(installer);
            return Err(self.fail(error));
        }

        if let Some(hook) = &self.quit_hook {
            hook();
        }
        Ok(())
    }

    fn on_app_quit(&self) {
        let installer = {
            let mut state = self.lock_state();
            if !state.config.auto_install_on_app_quit {
                return;
            }
            state.downloaded.take()
        };
        let Some(installer) = installer else {
            return;
        };

        info!("Installing downloaded update on exit");
        if let Err(error) = launch_installer(&installer, true, false) {
            warn!("Failed to install update on exit: {error}");
        }
    }
}

fn installer_args(silent: bool, force: bool) -> Vec<&'static str> {
    let mut args = Vec::new();
    if silent {
        args.push("/S");
    }
    if force {
        args.push("--force-run");
    }
    args
}

fn launch_installer(installer: &Path, silent: bool, force: bool) -> Result<(), ProviderError> {
    info!("Launching installer: {}", installer.display());
    std::process::Command::new(installer)
        .args(installer_args(silent, force))
        .spawn()
        .map_err(|error| ProviderError::InstallLaunch {
            details: error.to_string(),
        })?;
    Ok(())
}
