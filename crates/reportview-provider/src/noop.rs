use async_trait::async_trait;
use log::debug;

use crate::error::ProviderError;
use crate::events::EventSink;
use crate::kind::ProviderKind;
use crate::traits::{ProviderConfig, UpdateProvider};
use crate::types::UpdateInfo;

/// Provider for platforms without self-update. Every operation succeeds
/// without doing anything and no events are ever emitted.
#[derive(Debug, Default)]
pub struct NoopProvider;

impl NoopProvider {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl UpdateProvider for NoopProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Unsupported
    }

    fn configure(&self, _config: ProviderConfig) {}

    fn subscribe(&self, _sink: EventSink) {}

    fn subscriber_count(&self) -> usize {
        0
    }

    async fn check_for_updates(&self) -> Result<Option<UpdateInfo>, ProviderError> {
        debug!("Update check skipped: self-update is not supported on this platform");
        Ok(None)
    }

    async fn check_for_updates_and_notify(&self) -> Result<Option<UpdateInfo>, ProviderError> {
        self.check_for_updates().await
    }

    async fn download_update(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn quit_and_install(&self, _silent: bool, _force: bool) -> Result<(), ProviderError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::NoopProvider;
    use crate::events::EventSink;
    use crate::traits::UpdateProvider;

    #[tokio::test]
    async fn every_operation_is_a_silent_success() {
        let provider = NoopProvider::new();
        provider.subscribe(EventSink::new(|event| {
            panic!("no-op provider must not emit {}", event.name())
        }));

        assert!(!provider.is_functional());
        assert_eq!(provider.subscriber_count(), 0);
        assert_eq!(provider.check_for_updates().await, Ok(None));
        assert_eq!(provider.check_for_updates_and_notify().await, Ok(None));
        assert_eq!(provider.download_update().await, Ok(()));
        assert_eq!(provider.quit_and_install(false, true).await, Ok(()));
    }
}
