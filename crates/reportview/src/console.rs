//! Terminal stand-ins for the desktop shell: toasts are printed, answers and
//! menu clicks are typed on stdin.

use std::io::{BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use reportview_core::toast::{ListenerId, OverlayId, OverlayRequest, ToastIcon, WindowId};
use reportview_core::{
    DismissReason, HostError, MenuAction, ToastHost, ToastOptions, ToastResponder, ToastResult,
};
use tokio::sync::mpsc;

/// The terminal plays the part of the app's only window.
pub const CONSOLE_WINDOW: WindowId = WindowId(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleInput {
    Check,
    Install,
    Quit,
    Answer(ToastResult),
}

pub fn parse_input(line: &str) -> Option<ConsoleInput> {
    match line.trim().to_ascii_lowercase().as_str() {
        "check" => Some(ConsoleInput::Check),
        "install" => Some(ConsoleInput::Install),
        "quit" | "exit" => Some(ConsoleInput::Quit),
        "y" | "yes" => Some(ConsoleInput::Answer(ToastResult::confirmed())),
        "n" | "no" => Some(ConsoleInput::Answer(ToastResult::dismissed(
            DismissReason::Cancel,
        ))),
        "close" => Some(ConsoleInput::Answer(ToastResult::dismissed(
            DismissReason::Close,
        ))),
        _ => None,
    }
}

/// Forward typed lines to `sender` until stdin closes, then ask to quit.
///
/// Runs on a plain thread; a blocking stdin read cannot be interrupted, so
/// the thread is left detached when the app exits.
pub fn spawn_stdin_worker(sender: mpsc::Sender<ConsoleInput>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        forward_inputs(stdin.lock(), &sender);
        let _ = sender.blocking_send(ConsoleInput::Quit);
    });
}

fn forward_inputs(reader: impl BufRead, sender: &mpsc::Sender<ConsoleInput>) {
    for line in reader.lines() {
        let Ok(line) = line else {
            break;
        };
        match parse_input(&line) {
            Some(input) => {
                if sender.blocking_send(input).is_err() {
                    break;
                }
            }
            None if line.trim().is_empty() => {}
            None => println!(
                "Unknown command '{}' (check, install, y, n, close, quit)",
                line.trim()
            ),
        }
    }
}

fn icon_label(icon: ToastIcon) -> &'static str {
    match icon {
        ToastIcon::Info => "info",
        ToastIcon::Warning => "wait",
        ToastIcon::Error => "error",
        ToastIcon::Success => "ok",
        ToastIcon::Question => "question",
    }
}

fn render_toast(options: &ToastOptions) -> String {
    let mut line = format!("[{}] {}", icon_label(options.icon), options.title);
    if let Some(text) = &options.text {
        line.push_str(": ");
        line.push_str(text);
    }
    if options.show_cancel_button {
        line.push_str(" (y = yes, n = no)");
    } else if options.show_confirm_button {
        line.push_str(" (y = ok, close = dismiss)");
    }
    if let Some(timer) = options.timer {
        line.push_str(&format!(" [closes in {}s]", timer.as_secs()));
    }
    line
}

type Listener = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct ConsoleState {
    next_overlay: u64,
    next_listener: u64,
    open: Option<(OverlayId, ToastResponder)>,
    listeners: Vec<(ListenerId, Listener)>,
}

pub struct ConsoleHost {
    out: Mutex<Box<dyn Write + Send>>,
    state: Mutex<ConsoleState>,
}

impl ConsoleHost {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
            state: Mutex::new(ConsoleState::default()),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    fn lock_state(&self) -> MutexGuard<'_, ConsoleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn print(&self, line: &str) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = writeln!(out, "{line}");
        let _ = out.flush();
    }

    /// Route a typed answer to the open toast. Returns false when no toast
    /// is open.
    pub fn answer(&self, result: ToastResult) -> bool {
        let responder = self
            .lock_state()
            .open
            .as_ref()
            .map(|(_, responder)| responder.clone());
        match responder {
            Some(responder) => {
                responder.respond(result);
                true
            }
            None => false,
        }
    }

    /// The terminal is going away; notify everyone watching the window.
    pub fn close_window(&self) {
        let listeners = std::mem::take(&mut self.lock_state().listeners);
        for (_, listener) in listeners {
            listener();
        }
    }
}

impl ToastHost for ConsoleHost {
    fn focused_window(&self) -> Option<WindowId> {
        Some(CONSOLE_WINDOW)
    }

    fn main_window(&self) -> Option<WindowId> {
        Some(CONSOLE_WINDOW)
    }

    fn open_overlay(
        &self,
        request: &OverlayRequest<'_>,
        responder: ToastResponder,
    ) -> Result<OverlayId, HostError> {
        let overlay = {
            let mut state = self.lock_state();
            state.next_overlay += 1;
            let overlay = OverlayId(state.next_overlay);
            state.open = Some((overlay, responder));
            overlay
        };
        self.print(&render_toast(request.options));
        Ok(overlay)
    }

    fn show_loading(&self, _overlay: OverlayId) {
        self.print("  ...");
    }

    fn hide_overlay(&self, overlay: OverlayId) {
        let mut state = self.lock_state();
        if state.open.as_ref().is_some_and(|(open, _)| *open == overlay) {
            state.open = None;
        }
    }

    fn destroy_overlay(&self, overlay: OverlayId) {
        log::debug!("Console toast {} destroyed", overlay.0);
    }

    fn on_window_closed(&self, _window: WindowId, listener: Listener) -> ListenerId {
        let mut state = self.lock_state();
        state.next_listener += 1;
        let id = ListenerId(state.next_listener);
        state.listeners.push((id, listener));
        id
    }

    fn remove_window_listener(&self, _window: WindowId, listener: ListenerId) {
        self.lock_state().listeners.retain(|(id, _)| *id != listener);
    }
}

/// The "Check for updates" menu entry; prints its state when it flips.
pub struct ConsoleMenuItem {
    label: &'static str,
    enabled: AtomicBool,
}

impl ConsoleMenuItem {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            enabled: AtomicBool::new(true),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
}

impl MenuAction for ConsoleMenuItem {
    fn set_enabled(&self, enabled: bool) {
        if self.enabled.swap(enabled, Ordering::SeqCst) != enabled {
            let state = if enabled { "enabled" } else { "disabled" };
            println!("[menu] {}: {state}", self.label);
        }
    }
}
