use std::sync::Arc;

use log::{info, warn};
use reportview_platform::Platform;
use reportview_provider::{NoopProvider, ProviderKind, UpdateProvider, provider_kind_for};

/// Builds the functional provider. Called at most once per process.
pub type InstallerFactory = Box<dyn FnOnce() -> Arc<dyn UpdateProvider> + Send>;

/// Result of [`ProviderSelector::select`].
pub struct Selection {
    pub provider: Arc<dyn UpdateProvider>,
    /// `true` only for the call that constructed the provider.
    pub fresh: bool,
}

/// Lazily constructs and memoizes the process's update provider.
pub struct ProviderSelector {
    platform: Platform,
    factory: Option<InstallerFactory>,
    provider: Option<Arc<dyn UpdateProvider>>,
}

impl ProviderSelector {
    #[must_use]
    pub fn new(platform: Platform, factory: InstallerFactory) -> Self {
        Self {
            platform,
            factory: Some(factory),
            provider: None,
        }
    }

    #[must_use]
    pub fn platform(&self) -> Platform {
        self.platform
    }

    #[must_use]
    pub fn current(&self) -> Option<Arc<dyn UpdateProvider>> {
        self.provider.clone()
    }

    pub fn select(&mut self) -> Selection {
        if let Some(provider) = &self.provider {
            return Selection {
                provider: Arc::clone(provider),
                fresh: false,
            };
        }

        let provider: Arc<dyn UpdateProvider> = match provider_kind_for(self.platform) {
            ProviderKind::Installer => {
                if let Some(factory) = self.factory.take() {
                    info!("Using installer update provider on {}", self.platform);
                    factory()
                } else {
                    warn!("Installer provider factory already consumed; updates disabled");
                    Arc::new(NoopProvider::new())
                }
            }
            ProviderKind::Unsupported => {
                info!("Self-update is not supported on {}", self.platform);
                Arc::new(NoopProvider::new())
            }
        };

        self.factory = None;
        self.provider = Some(Arc::clone(&provider));
        Selection {
            provider,
            fresh: true,
        }
    }
}
