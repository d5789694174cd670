//! Update lifecycle as a pure transition table.
//!
//! [`transition`] maps the current [`Phase`] and an incoming [`Trigger`] to
//! the next phase plus the [`Effect`]s the orchestrator must carry out. It
//! touches no timers, windows or providers.

use std::time::Duration;

use reportview_provider::{ProgressInfo, UpdateEvent};

use crate::toast::{ToastIcon, ToastOptions, ToastResult};

const SHORT_TOAST: Duration = Duration::from_secs(10);
const LONG_TOAST: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Checking,
    Available {
        version: String,
    },
    NotAvailable,
    Downloading {
        version: String,
    },
    Downloaded {
        version: String,
    },
    Installing,
}

impl Phase {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Checking => "checking",
            Self::Available { .. } => "available",
            Self::NotAvailable => "not-available",
            Self::Downloading { .. } => "downloading",
            Self::Downloaded { .. } => "downloaded",
            Self::Installing => "installing",
        }
    }
}

/// A confirmation the orchestrator is waiting on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    /// "An update is available"; proceeds unless explicitly dismissed.
    StartDownload { version: String },
    /// "Install now?"; proceeds only on explicit confirmation.
    InstallNow { version: String },
}

impl Prompt {
    #[must_use]
    pub fn proceeds(&self, result: ToastResult) -> bool {
        match self {
            Self::StartDownload { .. } => result.confirmed || result.is_timer_dismissal(),
            Self::InstallNow { .. } => result.confirmed,
        }
    }

    #[must_use]
    pub fn toast(&self) -> ToastKind {
        match self {
            Self::StartDownload { version } => ToastKind::Available {
                version: version.clone(),
            },
            Self::InstallNow { version } => ToastKind::Downloaded {
                version: version.clone(),
            },
        }
    }

    fn awaited_in(&self, phase: &Phase) -> bool {
        match (self, phase) {
            (Self::StartDownload { version }, Phase::Available { version: current })
            | (Self::InstallNow { version }, Phase::Downloaded { version: current }) => {
                version == current
            }
            _ => false,
        }
    }
}

/// The toasts the update flow can show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToastKind {
    Failed,
    Checking,
    Available { version: String },
    NotAvailable,
    Downloaded { version: String },
}

impl ToastKind {
    #[must_use]
    pub fn options(&self) -> ToastOptions {
        match self {
            Self::Failed => ToastOptions {
                title: "Application update failed".to_string(),
                icon: ToastIcon::Error,
                timer: Some(LONG_TOAST),
                ..ToastOptions::default()
            },
            Self::Checking => ToastOptions {
                title: "Checking for update".to_string(),
                icon: ToastIcon::Warning,
                timer: Some(SHORT_TOAST),
                timer_progress_bar: true,
                ..ToastOptions::default()
            },
            Self::Available { version } => ToastOptions {
                title: format!("An update to v{version} is available"),
                text: Some("Starting download...".to_string()),
                icon: ToastIcon::Info,
                timer: Some(SHORT_TOAST),
                timer_progress_bar: true,
                ..ToastOptions::default()
            },
            Self::NotAvailable => ToastOptions {
                title: "No updates available".to_string(),
                icon: ToastIcon::Success,
                timer: Some(SHORT_TOAST),
                ..ToastOptions::default()
            },
            Self::Downloaded { version } => ToastOptions {
                title: format!("Update v{version} downloaded"),
                text: Some("Should the app be updated right now?".to_string()),
                icon: ToastIcon::Question,
                timer: Some(LONG_TOAST),
                show_cancel_button: true,
                ..ToastOptions::default()
            },
        }
    }

    #[must_use]
    pub fn shows_loading(&self) -> bool {
        matches!(self, Self::Checking)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderAction {
    Check,
    CheckAndNotify,
    Download,
    QuitAndInstall { silent: bool, force: bool },
}

impl ProviderAction {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Check => "check",
            Self::CheckAndNotify => "check-and-notify",
            Self::Download => "download",
            Self::QuitAndInstall { .. } => "quit-and-install",
        }
    }
}

/// Identifies one shown prompt. Outcomes carrying an older ticket belong to
/// a prompt that has since been replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTicket(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    /// A host or timer asked for a check; `notify` selects check-and-notify.
    CheckRequested { notify: bool },
    InstallRequested,
    Provider(UpdateEvent),
    PromptAnswered {
        prompt: Prompt,
        ticket: PromptTicket,
        result: ToastResult,
    },
    /// The prompt closed without an answer or could not be shown.
    PromptFailed { prompt: Prompt, ticket: PromptTicket },
}

impl Trigger {
    #[must_use]
    pub fn prompt_ticket(&self) -> Option<PromptTicket> {
        match self {
            Self::PromptAnswered { ticket, .. } | Self::PromptFailed { ticket, .. } => {
                Some(*ticket)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    ShowToast(ToastKind),
    /// Show the prompt's toast and feed its answer back as a trigger.
    AwaitPrompt(Prompt),
    RearmScheduler,
    SetMenuEnabled(bool),
    Invoke(ProviderAction),
    LogProgress(ProgressInfo),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionFlags {
    pub interval_triggered: bool,
    /// Re-enable the menu item once a check cycle ends.
    pub reenable_menu: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub next: Phase,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn stay(phase: &Phase) -> Self {
        Self {
            next: phase.clone(),
            effects: Vec::new(),
        }
    }

    fn to(next: Phase, effects: Vec<Effect>) -> Self {
        Self { next, effects }
    }
}

fn cycle_finished(flags: SessionFlags, mut effects: Vec<Effect>) -> Vec<Effect> {
    if flags.reenable_menu {
        effects.push(Effect::SetMenuEnabled(true));
    }
    effects
}

#[must_use]
pub fn transition(phase: &Phase, trigger: &Trigger, flags: SessionFlags) -> Transition {
    match trigger {
        Trigger::CheckRequested { notify } => {
            let action = if *notify {
                ProviderAction::CheckAndNotify
            } else {
                ProviderAction::Check
            };
            Transition::to(
                phase.clone(),
                vec![Effect::SetMenuEnabled(false), Effect::Invoke(action)],
            )
        }
        Trigger::InstallRequested => Transition::to(
            Phase::Installing,
            vec![Effect::Invoke(ProviderAction::QuitAndInstall {
                silent: false,
                force: true,
            })],
        ),
        Trigger::Provider(event) => on_provider_event(phase, event, flags),
        Trigger::PromptAnswered { prompt, result, .. } => {
            if !prompt.awaited_in(phase) {
                return Transition::stay(phase);
            }
            on_prompt_answered(prompt, *result, flags)
        }
        Trigger::PromptFailed { prompt, .. } => {
            if !prompt.awaited_in(phase) {
                return Transition::stay(phase);
            }
            Transition::to(Phase::Idle, cycle_finished(flags, Vec::new()))
        }
    }
}

fn on_provider_event(phase: &Phase, event: &UpdateEvent, flags: SessionFlags) -> Transition {
    match event {
        UpdateEvent::Error(_) => Transition::to(
            Phase::Idle,
            cycle_finished(flags, vec![Effect::ShowToast(ToastKind::Failed)]),
        ),
        UpdateEvent::CheckingForUpdate => {
            let mut effects = Vec::new();
            if !flags.interval_triggered {
                effects.push(Effect::ShowToast(ToastKind::Checking));
            }
            effects.push(Effect::RearmScheduler);
            Transition::to(Phase::Checking, effects)
        }
        UpdateEvent::UpdateAvailable(info) => {
            let prompt = Prompt::StartDownload {
                version: info.version.clone(),
            };
            Transition::to(
                Phase::Available {
                    version: info.version.clone(),
                },
                vec![Effect::AwaitPrompt(prompt)],
            )
        }
        UpdateEvent::UpdateNotAvailable(_) => {
            let mut effects = Vec::new();
            if !flags.interval_triggered {
                effects.push(Effect::ShowToast(ToastKind::NotAvailable));
            }
            Transition::to(Phase::NotAvailable, cycle_finished(flags, effects))
        }
        UpdateEvent::DownloadProgress(progress) => Transition::to(
            phase.clone(),
            vec![Effect::LogProgress(*progress)],
        ),
        UpdateEvent::UpdateDownloaded(info) => {
            let prompt = Prompt::InstallNow {
                version: info.version.clone(),
            };
            Transition::to(
                Phase::Downloaded {
                    version: info.version.clone(),
                },
                vec![Effect::AwaitPrompt(prompt)],
            )
        }
    }
}

fn on_prompt_answered(prompt: &Prompt, result: ToastResult, flags: SessionFlags) -> Transition {
    if !prompt.proceeds(result) {
        return Transition::to(Phase::Idle, cycle_finished(flags, Vec::new()));
    }

    match prompt {
        Prompt::StartDownload { version } => Transition::to(
            Phase::Downloading {
                version: version.clone(),
            },
            vec![Effect::Invoke(ProviderAction::Download)],
        ),
        Prompt::InstallNow { .. } => Transition::to(
            Phase::Installing,
            vec![Effect::Invoke(ProviderAction::QuitAndInstall {
                silent: false,
                force: true,
            })],
        ),
    }
}

#[cfg(test)]
mod tests {
    use reportview_provider::{ProgressInfo, ProviderError, UpdateEvent, UpdateInfo};

    use super::*;
    use crate::toast::DismissReason;

    const MANUAL: SessionFlags = SessionFlags {
        interval_triggered: false,
        reenable_menu: true,
    };
    const INTERVAL: SessionFlags = SessionFlags {
        interval_triggered: true,
        reenable_menu: true,
    };
    const KEEP_MENU_DISABLED: SessionFlags = SessionFlags {
        interval_triggered: false,
        reenable_menu: false,
    };

    fn available(version: &str) -> Phase {
        Phase::Available {
            version: version.to_string(),
        }
    }

    fn downloaded(version: &str) -> Phase {
        Phase::Downloaded {
            version: version.to_string(),
        }
    }

    fn event(event: UpdateEvent) -> Trigger {
        Trigger::Provider(event)
    }

    fn answered(prompt: Prompt, result: ToastResult) -> Trigger {
        Trigger::PromptAnswered {
            prompt,
            ticket: PromptTicket(1),
            result,
        }
    }

    fn start_download(version: &str) -> Prompt {
        Prompt::StartDownload {
            version: version.to_string(),
        }
    }

    fn install_now(version: &str) -> Prompt {
        Prompt::InstallNow {
            version: version.to_string(),
        }
    }

    #[test]
    fn check_requests_disable_menu_and_invoke_provider() {
        let manual = transition(&Phase::Idle, &Trigger::CheckRequested { notify: false }, MANUAL);
        assert_eq!(manual.next, Phase::Idle);
        assert_eq!(
            manual.effects,
            vec![
                Effect::SetMenuEnabled(false),
                Effect::Invoke(ProviderAction::Check)
            ]
        );

        let notify = transition(&Phase::NotAvailable, &Trigger::CheckRequested { notify: true }, INTERVAL);
        assert_eq!(notify.next, Phase::NotAvailable);
        assert_eq!(
            notify.effects,
            vec![
                Effect::SetMenuEnabled(false),
                Effect::Invoke(ProviderAction::CheckAndNotify)
            ]
        );
    }

    #[test]
    fn checking_shows_loading_only_for_manual_checks_and_always_rearms() {
        let manual = transition(&Phase::Idle, &event(UpdateEvent::CheckingForUpdate), MANUAL);
        assert_eq!(manual.next, Phase::Checking);
        assert_eq!(
            manual.effects,
            vec![
                Effect::ShowToast(ToastKind::Checking),
                Effect::RearmScheduler
            ]
        );

        let background = transition(&Phase::Idle, &event(UpdateEvent::CheckingForUpdate), INTERVAL);
        assert_eq!(background.next, Phase::Checking);
        assert_eq!(background.effects, vec![Effect::RearmScheduler]);
    }

    #[test]
    fn not_available_toast_is_suppressed_for_interval_checks() {
        let info = UpdateInfo::new("4.0.0");

        let manual = transition(
            &Phase::Checking,
            &event(UpdateEvent::UpdateNotAvailable(info.clone())),
            MANUAL,
        );
        assert_eq!(manual.next, Phase::NotAvailable);
        assert_eq!(
            manual.effects,
            vec![
                Effect::ShowToast(ToastKind::NotAvailable),
                Effect::SetMenuEnabled(true)
            ]
        );

        let background = transition(
            &Phase::Checking,
            &event(UpdateEvent::UpdateNotAvailable(info)),
            INTERVAL,
        );
        assert_eq!(background.effects, vec![Effect::SetMenuEnabled(true)]);
    }

    #[test]
    fn error_shows_failure_toast_and_returns_to_idle() {
        let result = transition(
            &Phase::Downloading {
                version: "2.0.0".to_string(),
            },
            &event(UpdateEvent::Error(ProviderError::NoUpdateDownloaded)),
            INTERVAL,
        );
        assert_eq!(result.next, Phase::Idle);
        assert_eq!(
            result.effects,
            vec![
                Effect::ShowToast(ToastKind::Failed),
                Effect::SetMenuEnabled(true)
            ]
        );
    }

    #[test]
    fn available_prompts_before_downloading() {
        let result = transition(
            &Phase::Checking,
            &event(UpdateEvent::UpdateAvailable(UpdateInfo::new("2.0.0"))),
            MANUAL,
        );
        assert_eq!(result.next, available("2.0.0"));
        assert_eq!(
            result.effects,
            vec![Effect::AwaitPrompt(start_download("2.0.0"))]
        );
    }

    #[test]
    fn available_prompt_proceeds_on_confirm_or_timer() {
        for answer in [
            ToastResult::confirmed(),
            ToastResult::dismissed(DismissReason::Timer),
        ] {
            let result = transition(
                &available("2.0.0"),
                &answered(start_download("2.0.0"), answer),
                MANUAL,
            );
            assert_eq!(
                result.next,
                Phase::Downloading {
                    version: "2.0.0".to_string()
                }
            );
            assert_eq!(
                result.effects,
                vec![Effect::Invoke(ProviderAction::Download)]
            );
        }
    }

    #[test]
    fn available_prompt_cancels_on_explicit_dismissal() {
        for reason in [
            DismissReason::Backdrop,
            DismissReason::Cancel,
            DismissReason::Close,
        ] {
            let result = transition(
                &available("2.0.0"),
                &answered(start_download("2.0.0"), ToastResult::dismissed(reason)),
                MANUAL,
            );
            assert_eq!(result.next, Phase::Idle);
            assert_eq!(result.effects, vec![Effect::SetMenuEnabled(true)]);
        }
    }

    #[test]
    fn downloaded_prompt_installs_only_on_confirmation() {
        let confirmed = transition(
            &downloaded("2.0.0"),
            &answered(install_now("2.0.0"), ToastResult::confirmed()),
            MANUAL,
        );
        assert_eq!(confirmed.next, Phase::Installing);
        assert_eq!(
            confirmed.effects,
            vec![Effect::Invoke(ProviderAction::QuitAndInstall {
                silent: false,
                force: true
            })]
        );

        for reason in [DismissReason::Timer, DismissReason::Cancel] {
            let declined = transition(
                &downloaded("2.0.0"),
                &answered(install_now("2.0.0"), ToastResult::dismissed(reason)),
                KEEP_MENU_DISABLED,
            );
            assert_eq!(declined.next, Phase::Idle);
            assert!(declined.effects.is_empty());
        }
    }

    #[test]
    fn stale_prompt_outcomes_do_not_move_the_machine() {
        let answered_late = transition(
            &Phase::Checking,
            &answered(start_download("2.0.0"), ToastResult::confirmed()),
            MANUAL,
        );
        assert_eq!(answered_late.next, Phase::Checking);
        assert!(answered_late.effects.is_empty());

        let abandoned = transition(
            &Phase::Checking,
            &Trigger::PromptFailed {
                prompt: install_now("2.0.0"),
                ticket: PromptTicket(1),
            },
            MANUAL,
        );
        assert_eq!(abandoned.next, Phase::Checking);
        assert!(abandoned.effects.is_empty());

        let other_version = transition(
            &downloaded("2.1.0"),
            &answered(install_now("2.0.0"), ToastResult::confirmed()),
            MANUAL,
        );
        assert_eq!(other_version.next, downloaded("2.1.0"));
    }

    #[test]
    fn only_prompt_outcomes_carry_a_ticket() {
        let ticket = PromptTicket(7);
        let failed = Trigger::PromptFailed {
            prompt: start_download("2.0.0"),
            ticket,
        };
        assert_eq!(failed.prompt_ticket(), Some(ticket));
        assert_eq!(event(UpdateEvent::CheckingForUpdate).prompt_ticket(), None);
        assert_eq!(Trigger::InstallRequested.prompt_ticket(), None);
    }

    #[test]
    fn failed_prompt_ends_the_cycle() {
        let result = transition(
            &available("2.0.0"),
            &Trigger::PromptFailed {
                prompt: start_download("2.0.0"),
                ticket: PromptTicket(1),
            },
            MANUAL,
        );
        assert_eq!(result.next, Phase::Idle);
        assert_eq!(result.effects, vec![Effect::SetMenuEnabled(true)]);
    }

    #[test]
    fn progress_is_logged_without_phase_change() {
        let progress = ProgressInfo::new(10, 100, 5);
        let phase = Phase::Downloading {
            version: "2.0.0".to_string(),
        };
        let result = transition(&phase, &event(UpdateEvent::DownloadProgress(progress)), MANUAL);
        assert_eq!(result.next, phase);
        assert_eq!(result.effects, vec![Effect::LogProgress(progress)]);
    }

    #[test]
    fn install_request_is_unconditional() {
        for phase in [Phase::Idle, Phase::Checking, downloaded("2.0.0")] {
            let result = transition(&phase, &Trigger::InstallRequested, MANUAL);
            assert_eq!(result.next, Phase::Installing);
            assert_eq!(
                result.effects,
                vec![Effect::Invoke(ProviderAction::QuitAndInstall {
                    silent: false,
                    force: true
                })]
            );
        }
    }

    #[test]
    fn toast_options_carry_the_expected_timers() {
        assert_eq!(ToastKind::Failed.options().timer, Some(LONG_TOAST));
        assert_eq!(ToastKind::Checking.options().timer, Some(SHORT_TOAST));
        assert!(ToastKind::Checking.shows_loading());

        let downloaded = ToastKind::Downloaded {
            version: "2.0.0".to_string(),
        }
        .options();
        assert_eq!(downloaded.title, "Update v2.0.0 downloaded");
        assert_eq!(downloaded.timer, Some(LONG_TOAST));
        assert!(downloaded.show_cancel_button);

        let available = start_download("2.0.0").toast().options();
        assert_eq!(available.title, "An update to v2.0.0 is available");
        assert_eq!(available.text.as_deref(), Some("Starting download..."));
    }
}
