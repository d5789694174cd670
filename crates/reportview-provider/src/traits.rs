use async_trait::async_trait;

use crate::error::ProviderError;
use crate::events::EventSink;
use crate::kind::ProviderKind;
use crate::types::UpdateInfo;

/// One-time provider configuration applied by the selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Start downloading as soon as an update is found.
    pub auto_download: bool,
    /// Run a downloaded installer silently when the host exits.
    pub auto_install_on_app_quit: bool,
}

/// Capability that performs update work against a release channel.
///
/// Operations report progress and outcome through events delivered to the
/// subscribed [`EventSink`]s. Failures are emitted as
/// [`UpdateEvent::Error`](crate::UpdateEvent::Error) and also returned, so
/// callers only need to log the returned error.
#[async_trait]
pub trait UpdateProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn is_functional(&self) -> bool {
        self.kind() != ProviderKind::Unsupported
    }

    fn configure(&self, config: ProviderConfig);

    fn subscribe(&self, sink: EventSink);

    fn subscriber_count(&self) -> usize;

    async fn check_for_updates(&self) -> Result<Option<UpdateInfo>, ProviderError>;

    async fn check_for_updates_and_notify(&self) -> Result<Option<UpdateInfo>, ProviderError>;

    async fn download_update(&self) -> Result<(), ProviderError>;

    /// Close the application and run the downloaded installer.
    ///
    /// `force` runs the installer even when some windows refuse to close.
    async fn quit_and_install(&self, silent: bool, force: bool) -> Result<(), ProviderError>;

    /// The host is exiting without having asked for an install.
    fn on_app_quit(&self) {}
}
