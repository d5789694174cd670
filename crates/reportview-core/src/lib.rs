//! Update orchestration engine for the report viewer shell.
//!
//! This crate drives the update dialog with the user and keeps the
//! process-wide update resources in one place:
//! - [`Orchestrator`]: the event loop owning the [`UpdateSession`].
//! - [`machine`]: the pure phase/trigger transition table.
//! - [`NotificationSurface`]: the single transient toast overlay.
//! - [`IntervalScheduler`]: the background polling timer.
//! - [`MenuBinding`]: the host's "check for updates" menu action.
//! - [`ProviderSelector`]: once-per-process provider construction.

pub mod machine;
mod menu;
mod orchestrator;
mod scheduler;
mod selector;
mod session;
pub mod toast;

#[cfg(test)]
mod test_support;

/// Host menu action contract and the session's binding to it.
pub use menu::{MenuAction, MenuBinding, MenuItemRef};
/// Event loop, host-facing handle and configuration.
pub use orchestrator::{Command, Orchestrator, UpdaterConfig, UpdaterHandle};
/// Repeating background check timer.
pub use scheduler::{DEFAULT_CHECK_INTERVAL, IntervalScheduler};
/// Memoized, platform-dispatched provider construction.
pub use selector::{InstallerFactory, ProviderSelector, Selection};
/// Process-wide update state.
pub use session::UpdateSession;
/// Toast overlay surface and its window-manager contract.
pub use toast::{
    Confirmation, DismissReason, HostError, NotificationSurface, ToastAbandoned, ToastHandle,
    ToastHooks, ToastHost, ToastOptions, ToastResponder, ToastResult,
};
