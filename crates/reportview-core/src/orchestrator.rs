//! The update orchestrator: one task that owns the [`UpdateSession`] and
//! serializes host commands, provider events and prompt answers through the
//! [`transition`] table.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{self, BoxFuture};
use futures_util::stream::{FuturesUnordered, StreamExt};
use log::{debug, error, info, warn};
use reportview_platform::Platform;
use reportview_provider::{EventSink, ProgressInfo, ProviderConfig, UpdateEvent, UpdateProvider};
use tokio::sync::mpsc;

use crate::machine::{
    Effect, Prompt, ProviderAction, SessionFlags, ToastKind, Transition, Trigger, transition,
};
use crate::menu::MenuItemRef;
use crate::scheduler::{DEFAULT_CHECK_INTERVAL, IntervalScheduler};
use crate::selector::{InstallerFactory, ProviderSelector, Selection};
use crate::session::UpdateSession;
use crate::toast::{NotificationSurface, ToastHooks, ToastHost};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdaterConfig {
    pub check_interval: Duration,
    /// Re-enable the bound menu item when a check cycle ends.
    pub reenable_menu_after_check: bool,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            check_interval: DEFAULT_CHECK_INTERVAL,
            reenable_menu_after_check: true,
        }
    }
}

/// Operations the host application can ask for.
pub enum Command {
    CheckForUpdates { menu_item: Option<MenuItemRef> },
    CheckForUpdatesAndNotify { interval_triggered: bool },
    QuitAndInstall,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::CheckForUpdates { .. } => "check-for-updates",
            Self::CheckForUpdatesAndNotify { .. } => "check-for-updates-and-notify",
            Self::QuitAndInstall => "quit-and-install",
        }
    }
}

enum Input {
    Command(Command),
    Provider(UpdateEvent),
    Shutdown,
}

/// Cloneable sender side of a running [`Orchestrator`].
///
/// Every operation returns immediately; the outcome is reported to the user
/// through toasts, never to the caller.
#[derive(Clone)]
pub struct UpdaterHandle {
    sender: mpsc::UnboundedSender<Input>,
}

impl UpdaterHandle {
    pub fn check_for_updates(&self, menu_item: Option<MenuItemRef>) {
        self.send(Input::Command(Command::CheckForUpdates { menu_item }));
    }

    pub fn check_for_updates_and_notify(&self, interval_triggered: bool) {
        self.send(Input::Command(Command::CheckForUpdatesAndNotify {
            interval_triggered,
        }));
    }

    pub fn quit_and_install(&self) {
        self.send(Input::Command(Command::QuitAndInstall));
    }

    pub fn shutdown(&self) {
        self.send(Input::Shutdown);
    }

    fn send(&self, input: Input) {
        if self.sender.send(input).is_err() {
            warn!("Updater is no longer running");
        }
    }
}

type Pending = BoxFuture<'static, Option<Trigger>>;

pub struct Orchestrator {
    session: UpdateSession,
    config: UpdaterConfig,
    sender: mpsc::UnboundedSender<Input>,
    inputs: mpsc::UnboundedReceiver<Input>,
    pending: FuturesUnordered<Pending>,
}

impl Orchestrator {
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn new(
        config: UpdaterConfig,
        platform: Platform,
        host: Arc<dyn ToastHost>,
        factory: InstallerFactory,
    ) -> Self {
        let (sender, inputs) = mpsc::unbounded_channel();

        let timer_sender = sender.clone();
        let scheduler = IntervalScheduler::new(config.check_interval, move || {
            let _ = timer_sender.send(Input::Command(Command::CheckForUpdatesAndNotify {
                interval_triggered: true,
            }));
        });

        Self {
            session: UpdateSession::new(
                ProviderSelector::new(platform, factory),
                NotificationSurface::new(host),
                scheduler,
            ),
            config,
            sender,
            inputs,
            pending: FuturesUnordered::new(),
        }
    }

    #[must_use]
    pub fn handle(&self) -> UpdaterHandle {
        UpdaterHandle {
            sender: self.sender.clone(),
        }
    }

    #[must_use]
    pub fn session(&self) -> &UpdateSession {
        &self.session
    }

    /// Process commands, provider events and prompt answers until
    /// [`UpdaterHandle::shutdown`] is called.
    pub async fn run(mut self) {
        info!(
            "Updater started on {} (check interval {:?})",
            self.session.platform(),
            self.session.scheduler.period()
        );

        loop {
            tokio::select! {
                biased;
                input = self.inputs.recv() => match input {
                    Some(Input::Shutdown) | None => break,
                    Some(input) => self.handle_input(input),
                },
                Some(trigger) = self.pending.next(), if !self.pending.is_empty() => {
                    if let Some(trigger) = trigger {
                        self.apply(trigger);
                    }
                }
            }
        }

        if let Some(provider) = self.session.provider() {
            provider.on_app_quit();
        }
        self.session.close();
        info!("Updater stopped");
    }

    fn handle_input(&mut self, input: Input) {
        match input {
            Input::Command(command) => self.dispatch(command),
            Input::Provider(event) => self.handle_event(event),
            Input::Shutdown => {}
        }
    }

    pub fn dispatch(&mut self, command: Command) {
        debug!("Updater command: {}", command.name());
        match command {
            Command::CheckForUpdates { menu_item } => {
                self.session.menu.bind_once(menu_item);
                self.request_check(false, false);
            }
            Command::CheckForUpdatesAndNotify { interval_triggered } => {
                self.request_check(true, interval_triggered);
            }
            Command::QuitAndInstall => {
                self.ensure_provider();
                self.apply(Trigger::InstallRequested);
            }
        }
    }

    fn request_check(&mut self, notify: bool, interval_triggered: bool) {
        self.session.interval_triggered = interval_triggered;
        let provider = self.ensure_provider();
        if !provider.is_functional() {
            debug!(
                "Skipping update check, updates are not supported on {}",
                self.session.platform()
            );
            return;
        }
        self.apply(Trigger::CheckRequested { notify });
    }

    fn ensure_provider(&mut self) -> Arc<dyn UpdateProvider> {
        let Selection { provider, fresh } = self.session.selector.select();
        if fresh && provider.is_functional() {
            provider.configure(ProviderConfig {
                auto_download: false,
                auto_install_on_app_quit: true,
            });
            let sender = self.sender.clone();
            provider.subscribe(EventSink::new(move |event| {
                let _ = sender.send(Input::Provider(event));
            }));
            self.session.scheduler.rearm();
        }
        provider
    }

    fn handle_event(&mut self, event: UpdateEvent) {
        match &event {
            UpdateEvent::Error(err) => error!("Update failed: {err}"),
            UpdateEvent::UpdateAvailable(info) => info!("Update available: v{}", info.version),
            UpdateEvent::UpdateNotAvailable(info) => {
                info!("No update available (latest v{})", info.version);
            }
            UpdateEvent::UpdateDownloaded(info) => info!("Update downloaded: v{}", info.version),
            UpdateEvent::CheckingForUpdate | UpdateEvent::DownloadProgress(_) => {}
        }
        self.apply(Trigger::Provider(event));
    }

    fn apply(&mut self, trigger: Trigger) {
        if let Some(ticket) = trigger.prompt_ticket() {
            if self.session.awaiting != Some(ticket) {
                debug!("Ignoring outcome of replaced update prompt {}", ticket.0);
                return;
            }
            self.session.awaiting = None;
        }

        let flags = SessionFlags {
            interval_triggered: self.session.interval_triggered,
            reenable_menu: self.config.reenable_menu_after_check,
        };
        let Transition { next, effects } = transition(&self.session.phase, &trigger, flags);
        if next != self.session.phase {
            debug!(
                "Update phase {} -> {}",
                self.session.phase.name(),
                next.name()
            );
            self.session.phase = next;
        }
        for effect in effects {
            self.execute(effect);
        }
    }

    fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::ShowToast(kind) => self.show_toast(&kind),
            Effect::AwaitPrompt(prompt) => self.await_prompt(prompt),
            Effect::RearmScheduler => self.session.scheduler.rearm(),
            Effect::SetMenuEnabled(enabled) => self.session.menu.set_enabled(enabled),
            Effect::Invoke(action) => self.invoke(action),
            Effect::LogProgress(progress) => log_progress(&progress),
        }
    }

    fn show_toast(&self, kind: &ToastKind) {
        let hooks = if kind.shows_loading() {
            ToastHooks::show_loading()
        } else {
            ToastHooks::default()
        };
        if let Err(e) = self.session.surface.fire(&kind.options(), hooks) {
            error!("Failed to show update toast: {e}");
        }
    }

    fn await_prompt(&mut self, prompt: Prompt) {
        let ticket = self.session.issue_ticket();
        let fired = self
            .session
            .surface
            .fire(&prompt.toast().options(), ToastHooks::default());
        let pending: Pending = match fired {
            Ok((confirmation, _)) => Box::pin(async move {
                match confirmation.await {
                    Ok(result) => Some(Trigger::PromptAnswered {
                        prompt,
                        ticket,
                        result,
                    }),
                    Err(e) => {
                        warn!("Update prompt closed without an answer: {e}");
                        Some(Trigger::PromptFailed { prompt, ticket })
                    }
                }
            }),
            Err(e) => {
                error!("Failed to show update prompt: {e}");
                Box::pin(future::ready(Some(Trigger::PromptFailed {
                    prompt,
                    ticket,
                })))
            }
        };
        self.pending.push(pending);
    }

    fn invoke(&self, action: ProviderAction) {
        let Some(provider) = self.session.provider() else {
            warn!("No update provider for {}", action.name());
            return;
        };
        self.pending.push(Box::pin(call_provider(provider, action)));
    }
}

async fn call_provider(
    provider: Arc<dyn UpdateProvider>,
    action: ProviderAction,
) -> Option<Trigger> {
    let result = match action {
        ProviderAction::Check => provider.check_for_updates().await.map(|_| ()),
        ProviderAction::CheckAndNotify => {
            provider.check_for_updates_and_notify().await.map(|_| ())
        }
        ProviderAction::Download => provider.download_update().await,
        ProviderAction::QuitAndInstall { silent, force } => {
            provider.quit_and_install(silent, force).await
        }
    };
    if let Err(e) = result {
        error!("Update provider {} failed: {e}", action.name());
    }
    None
}

fn log_progress(progress: &ProgressInfo) {
    match serde_json::to_string(progress) {
        Ok(json) => info!("Download progress: {json}"),
        Err(e) => debug!("Failed to serialize download progress: {e}"),
    }
}
