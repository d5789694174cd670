use std::sync::Arc;

use reportview_platform::Platform;
use reportview_provider::UpdateProvider;
use tokio::time::Instant;

use crate::machine::{Phase, PromptTicket};
use crate::menu::MenuBinding;
use crate::scheduler::IntervalScheduler;
use crate::selector::ProviderSelector;
use crate::toast::{NotificationSurface, ToastHandle};

/// Process-wide update state, owned by the orchestrator.
///
/// Holds the single provider handle, the single active toast and the single
/// polling timer, so each of those invariants can be checked by inspecting
/// one value.
pub struct UpdateSession {
    pub(crate) phase: Phase,
    pub(crate) selector: ProviderSelector,
    pub(crate) interval_triggered: bool,
    pub(crate) menu: MenuBinding,
    pub(crate) surface: NotificationSurface,
    pub(crate) scheduler: IntervalScheduler,
    /// The prompt whose outcome the session is waiting for.
    pub(crate) awaiting: Option<PromptTicket>,
    pub(crate) last_ticket: u64,
}

impl UpdateSession {
    pub(crate) fn new(
        selector: ProviderSelector,
        surface: NotificationSurface,
        scheduler: IntervalScheduler,
    ) -> Self {
        Self {
            phase: Phase::default(),
            selector,
            interval_triggered: false,
            menu: MenuBinding::new(),
            surface,
            scheduler,
            awaiting: None,
            last_ticket: 0,
        }
    }

    #[must_use]
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    #[must_use]
    pub fn platform(&self) -> Platform {
        self.selector.platform()
    }

    #[must_use]
    pub fn interval_triggered(&self) -> bool {
        self.interval_triggered
    }

    /// The provider, once the first orchestration call created it.
    #[must_use]
    pub fn provider(&self) -> Option<Arc<dyn UpdateProvider>> {
        self.selector.current()
    }

    #[must_use]
    pub fn active_toast(&self) -> Option<ToastHandle> {
        self.surface.active()
    }

    #[must_use]
    pub fn menu_bound(&self) -> bool {
        self.menu.is_bound()
    }

    #[must_use]
    pub fn next_scheduled_check(&self) -> Option<Instant> {
        self.scheduler.next_fire()
    }

    pub(crate) fn issue_ticket(&mut self) -> PromptTicket {
        self.last_ticket += 1;
        let ticket = PromptTicket(self.last_ticket);
        self.awaiting = Some(ticket);
        ticket
    }

    pub(crate) fn close(&mut self) {
        self.scheduler.cancel();
        self.surface.close_active();
    }
}
