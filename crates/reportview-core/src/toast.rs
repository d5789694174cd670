//! The transient toast overlay used for update status and confirmation
//! prompts.
//!
//! At most one toast is alive at a time: [`NotificationSurface::fire`] always
//! tears the previous overlay down (hide, then destroy) before opening the new
//! one. A superseded toast's [`Confirmation`] resolves to [`ToastAbandoned`]
//! instead of a user answer, and its auto-dismiss timer is cancelled.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::task::{Context, Poll};
use std::time::Duration;

use log::debug;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlayId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ToastId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToastIcon {
    Info,
    Warning,
    Error,
    Success,
    Question,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct ToastOptions {
    pub title: String,
    pub text: Option<String>,
    pub icon: ToastIcon,
    /// Auto-dismiss after this long, resolving with [`DismissReason::Timer`].
    pub timer: Option<Duration>,
    pub timer_progress_bar: bool,
    pub show_confirm_button: bool,
    pub show_cancel_button: bool,
    pub allow_outside_click: bool,
    pub width: u32,
}

impl Default for ToastOptions {
    fn default() -> Self {
        Self {
            title: "Update".to_string(),
            text: None,
            icon: ToastIcon::Info,
            timer: None,
            timer_progress_bar: false,
            show_confirm_button: true,
            show_cancel_button: false,
            allow_outside_click: false,
            width: 400,
        }
    }
}

/// Window chrome for the overlay: a borderless, transparent, shadowless
/// window the user cannot close through the window manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct OverlayChrome {
    pub frame: bool,
    pub transparent: bool,
    pub closable: bool,
    pub has_shadow: bool,
}

pub const TOAST_CHROME: OverlayChrome = OverlayChrome {
    frame: false,
    transparent: true,
    closable: false,
    has_shadow: false,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToastSound {
    pub note: &'static str,
    pub waveform: &'static str,
    pub duration: Duration,
}

pub const TOAST_SOUND: ToastSound = ToastSound {
    note: "F2",
    waveform: "triangle",
    duration: Duration::from_millis(1500),
};

/// Everything a host needs to put a toast on screen.
#[derive(Debug, Clone, Copy)]
pub struct OverlayRequest<'a> {
    pub toast: ToastId,
    pub parent: WindowId,
    pub options: &'a ToastOptions,
    pub chrome: OverlayChrome,
    pub sound: ToastSound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DismissReason {
    Backdrop,
    Cancel,
    Close,
    Timer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToastResult {
    pub confirmed: bool,
    pub dismiss: Option<DismissReason>,
}

impl ToastResult {
    #[must_use]
    pub fn confirmed() -> Self {
        Self {
            confirmed: true,
            dismiss: None,
        }
    }

    #[must_use]
    pub fn dismissed(reason: DismissReason) -> Self {
        Self {
            confirmed: false,
            dismiss: Some(reason),
        }
    }

    #[must_use]
    pub fn is_timer_dismissal(&self) -> bool {
        self.dismiss == Some(DismissReason::Timer)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("no window available to attach the toast to")]
    NoWindow,
    #[error("failed to open toast overlay: {0}")]
    Overlay(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("toast was closed before the user answered")]
pub struct ToastAbandoned;

/// Window-manager capabilities the surface relies on.
///
/// Hosts must not hold their own locks while calling into a
/// [`ToastResponder`] or a window-closed listener.
pub trait ToastHost: Send + Sync {
    fn focused_window(&self) -> Option<WindowId>;

    fn main_window(&self) -> Option<WindowId>;

    /// Show the overlay. User answers are reported through `responder`.
    ///
    /// # Errors
    /// Returns an error when the overlay cannot be created.
    fn open_overlay(
        &self,
        request: &OverlayRequest<'_>,
        responder: ToastResponder,
    ) -> Result<OverlayId, HostError>;

    /// Replace the overlay's buttons with a spinner.
    fn show_loading(&self, overlay: OverlayId);

    fn hide_overlay(&self, overlay: OverlayId);

    fn destroy_overlay(&self, overlay: OverlayId);

    /// Run `listener` once when `window` closes.
    fn on_window_closed(&self, window: WindowId, listener: Box<dyn FnOnce() + Send>)
    -> ListenerId;

    fn remove_window_listener(&self, window: WindowId, listener: ListenerId);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToastHandle {
    pub id: ToastId,
    pub overlay: OverlayId,
    pub parent: WindowId,
}

/// A freshly opened toast, passed to [`ToastHooks::on_open`].
pub struct OpenedToast<'a> {
    handle: ToastHandle,
    host: &'a dyn ToastHost,
}

impl OpenedToast<'_> {
    #[must_use]
    pub fn handle(&self) -> ToastHandle {
        self.handle
    }

    pub fn show_loading(&self) {
        self.host.show_loading(self.handle.overlay);
    }
}

pub type OnOpen = Box<dyn FnOnce(&OpenedToast<'_>) + Send>;
pub type OnAfterClose = Box<dyn FnOnce(ToastHandle) + Send>;

#[derive(Default)]
pub struct ToastHooks {
    pub on_open: Option<OnOpen>,
    /// Runs after the toast closed because of a user answer or its timer.
    pub on_after_close: Option<OnAfterClose>,
}

impl ToastHooks {
    #[must_use]
    pub fn show_loading() -> Self {
        Self {
            on_open: Some(Box::new(|toast: &OpenedToast<'_>| toast.show_loading())),
            on_after_close: None,
        }
    }
}

/// Pending user answer for a toast.
#[derive(Debug)]
pub struct Confirmation {
    receiver: oneshot::Receiver<ToastResult>,
}

impl Future for Confirmation {
    type Output = Result<ToastResult, ToastAbandoned>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|result| result.map_err(|_| ToastAbandoned))
    }
}

/// Given to the host with every overlay; reports the user's answer.
///
/// Answers for a toast that is no longer the active one are ignored.
#[derive(Clone)]
pub struct ToastResponder {
    toast: ToastId,
    surface: Weak<SurfaceInner>,
}

impl ToastResponder {
    #[must_use]
    pub fn toast_id(&self) -> ToastId {
        self.toast
    }

    pub fn confirm(&self) {
        self.respond(ToastResult::confirmed());
    }

    pub fn dismiss(&self, reason: DismissReason) {
        self.respond(ToastResult::dismissed(reason));
    }

    pub fn respond(&self, result: ToastResult) {
        if let Some(surface) = self.surface.upgrade() {
            surface.resolve(self.toast, result);
        }
    }
}

impl std::fmt::Debug for ToastResponder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToastResponder")
            .field("toast", &self.toast)
            .finish_non_exhaustive()
    }
}

struct ActiveToast {
    handle: ToastHandle,
    sender: Option<oneshot::Sender<ToastResult>>,
    timer: Option<JoinHandle<()>>,
    listener: ListenerId,
    on_after_close: Option<OnAfterClose>,
}

struct SurfaceInner {
    host: Arc<dyn ToastHost>,
    active: Mutex<Option<ActiveToast>>,
    next_id: AtomicU64,
}

impl SurfaceInner {
    fn lock_active(&self) -> MutexGuard<'_, Option<ActiveToast>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take_if_active(&self, toast: ToastId) -> Option<ActiveToast> {
        let mut active = self.lock_active();
        if active.as_ref().is_some_and(|current| current.handle.id == toast) {
            active.take()
        } else {
            None
        }
    }

    fn resolve(&self, toast: ToastId, result: ToastResult) {
        let Some(mut closed) = self.take_if_active(toast) else {
            debug!("Ignoring answer for inactive toast {}", toast.0);
            return;
        };
        self.host
            .remove_window_listener(closed.handle.parent, closed.listener);
        self.teardown(&mut closed);
        if let Some(sender) = closed.sender.take() {
            let _ = sender.send(result);
        }
        if let Some(on_after_close) = closed.on_after_close.take() {
            on_after_close(closed.handle);
        }
    }

    fn close_for_window(&self, toast: ToastId) {
        if let Some(mut closed) = self.take_if_active(toast) {
            debug!("Parent window closed, closing toast {}", toast.0);
            self.teardown(&mut closed);
        }
    }

    fn teardown(&self, toast: &mut ActiveToast) {
        if let Some(timer) = toast.timer.take() {
            timer.abort();
        }
        self.host.hide_overlay(toast.handle.overlay);
        self.host.destroy_overlay(toast.handle.overlay);
    }
}

/// Owner of the single active toast overlay.
pub struct NotificationSurface {
    inner: Arc<SurfaceInner>,
}

impl NotificationSurface {
    #[must_use]
    pub fn new(host: Arc<dyn ToastHost>) -> Self {
        Self {
            inner: Arc::new(SurfaceInner {
                host,
                active: Mutex::new(None),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Show a toast, replacing whichever toast is currently visible.
    ///
    /// Must be called from within a Tokio runtime when `options.timer` is set.
    ///
    /// # Errors
    /// Returns an error when the host has no window to attach to or refuses
    /// to open the overlay. The previous toast is gone either way.
    pub fn fire(
        &self,
        options: &ToastOptions,
        hooks: ToastHooks,
    ) -> Result<(Confirmation, ToastHandle), HostError> {
        self.close_active();

        let host = &self.inner.host;
        let parent = host
            .focused_window()
            .or_else(|| host.main_window())
            .ok_or(HostError::NoWindow)?;
        let id = ToastId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let (sender, receiver) = oneshot::channel();

        let responder = ToastResponder {
            toast: id,
            surface: Arc::downgrade(&self.inner),
        };
        let request = OverlayRequest {
            toast: id,
            parent,
            options,
            chrome: TOAST_CHROME,
            sound: TOAST_SOUND,
        };
        let overlay = host.open_overlay(&request, responder)?;
        let handle = ToastHandle {
            id,
            overlay,
            parent,
        };

        let weak = Arc::downgrade(&self.inner);
        let listener = host.on_window_closed(
            parent,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.close_for_window(id);
                }
            }),
        );

        let timer = options.timer.map(|duration| {
            let weak = Arc::downgrade(&self.inner);
            tokio::spawn(async move {
                tokio::time::sleep(duration).await;
                if let Some(inner) = weak.upgrade() {
                    inner.resolve(id, ToastResult::dismissed(DismissReason::Timer));
                }
            })
        });

        *self.inner.lock_active() = Some(ActiveToast {
            handle,
            sender: Some(sender),
            timer,
            listener,
            on_after_close: hooks.on_after_close,
        });
        debug!("Toast {} shown: {}", id.0, options.title);

        if let Some(on_open) = hooks.on_open {
            on_open(&OpenedToast {
                handle,
                host: host.as_ref(),
            });
        }

        Ok((Confirmation { receiver }, handle))
    }

    #[must_use]
    pub fn active(&self) -> Option<ToastHandle> {
        self.inner.lock_active().as_ref().map(|toast| toast.handle)
    }

    /// Hide and destroy the active toast, abandoning its confirmation.
    pub fn close_active(&self) {
        let previous = self.inner.lock_active().take();
        if let Some(mut previous) = previous {
            self.inner
                .host
                .remove_window_listener(previous.handle.parent, previous.listener);
            self.inner.teardown(&mut previous);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::{
        DismissReason, NotificationSurface, ToastAbandoned, ToastHooks, ToastOptions, ToastResult,
    };
    use crate::test_support::RecordingHost;

    fn timed(title: &str, secs: u64) -> ToastOptions {
        ToastOptions {
            title: title.to_string(),
            timer: Some(Duration::from_secs(secs)),
            ..ToastOptions::default()
        }
    }

    #[tokio::test]
    async fn only_the_latest_toast_stays_visible() {
        let host = Arc::new(RecordingHost::new());
        let surface = NotificationSurface::new(host.clone());

        for n in 0..5 {
            surface
                .fire(&timed(&format!("toast {n}"), 10), ToastHooks::default())
                .expect("toast should open");
            assert_eq!(host.visible_count(), 1);
        }

        assert_eq!(host.opened_titles().len(), 5);
        assert_eq!(host.destroyed_count(), 4);
        assert_eq!(host.visible_titles(), vec!["toast 4".to_string()]);
    }

    #[tokio::test]
    async fn superseded_confirmation_is_abandoned() {
        let host = Arc::new(RecordingHost::new());
        let surface = NotificationSurface::new(host.clone());

        let (first, _) = surface
            .fire(&timed("first", 10), ToastHooks::default())
            .expect("toast should open");
        let (_second, handle) = surface
            .fire(&timed("second", 10), ToastHooks::default())
            .expect("toast should open");

        assert_eq!(first.await, Err(ToastAbandoned));
        assert_eq!(surface.active(), Some(handle));
    }

    #[tokio::test]
    async fn user_answer_resolves_and_closes_the_toast() {
        let host = Arc::new(RecordingHost::new());
        let surface = NotificationSurface::new(host.clone());
        let after_close = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&after_close);

        let (confirmation, _) = surface
            .fire(
                &ToastOptions::default(),
                ToastHooks {
                    on_open: None,
                    on_after_close: Some(Box::new(move |_| {
                        counter.fetch_add(1, Ordering::SeqCst);
                    })),
                },
            )
            .expect("toast should open");
        host.answer_latest(ToastResult::dismissed(DismissReason::Cancel));

        assert_eq!(
            confirmation.await,
            Ok(ToastResult::dismissed(DismissReason::Cancel))
        );
        assert_eq!(host.visible_count(), 0);
        assert!(surface.active().is_none());
        assert_eq!(after_close.load(Ordering::SeqCst), 1);
        assert_eq!(host.listener_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn timer_dismisses_with_timer_reason() {
        let host = Arc::new(RecordingHost::new());
        let surface = NotificationSurface::new(host.clone());

        let (confirmation, _) = surface
            .fire(&timed("timed", 10), ToastHooks::default())
            .expect("toast should open");

        assert_eq!(
            confirmation.await,
            Ok(ToastResult::dismissed(DismissReason::Timer))
        );
        assert_eq!(host.visible_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_timer_never_fires_into_the_new_toast() {
        let host = Arc::new(RecordingHost::new());
        let surface = NotificationSurface::new(host.clone());

        surface
            .fire(&timed("short", 1), ToastHooks::default())
            .expect("toast should open");
        let (_confirmation, handle) = surface
            .fire(&timed("long", 60), ToastHooks::default())
            .expect("toast should open");

        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(surface.active(), Some(handle));
        assert_eq!(host.visible_titles(), vec!["long".to_string()]);
    }

    #[tokio::test]
    async fn closing_the_parent_window_tears_the_toast_down() {
        let host = Arc::new(RecordingHost::new());
        let surface = NotificationSurface::new(host.clone());

        let (confirmation, handle) = surface
            .fire(&ToastOptions::default(), ToastHooks::default())
            .expect("toast should open");
        host.close_window(handle.parent);

        assert!(surface.active().is_none());
        assert_eq!(host.visible_count(), 0);
        assert_eq!(confirmation.await, Err(ToastAbandoned));
    }

    #[tokio::test]
    async fn falls_back_to_main_window_without_focus() {
        let host = Arc::new(RecordingHost::new());
        host.set_focused(None);
        let surface = NotificationSurface::new(host.clone());

        let (_confirmation, handle) = surface
            .fire(&ToastOptions::default(), ToastHooks::default())
            .expect("toast should open");

        assert_eq!(handle.parent, RecordingHost::MAIN_WINDOW);
    }

    #[tokio::test]
    async fn on_open_hook_can_switch_to_loading() {
        let host = Arc::new(RecordingHost::new());
        let surface = NotificationSurface::new(host.clone());

        let (_confirmation, handle) = surface
            .fire(&ToastOptions::default(), ToastHooks::show_loading())
            .expect("toast should open");

        assert_eq!(host.loading_overlays(), vec![handle.overlay]);
    }

    #[tokio::test]
    async fn stale_answers_are_ignored() {
        let host = Arc::new(RecordingHost::new());
        let surface = NotificationSurface::new(host.clone());

        surface
            .fire(&timed("first", 10), ToastHooks::default())
            .expect("toast should open");
        let stale = host.latest_responder().expect("responder should exist");
        let (_confirmation, handle) = surface
            .fire(&timed("second", 10), ToastHooks::default())
            .expect("toast should open");

        stale.confirm();

        assert_eq!(surface.active(), Some(handle));
        assert_eq!(host.visible_count(), 1);
    }
}
