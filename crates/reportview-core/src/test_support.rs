use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use reportview_provider::{
    EventHub, EventSink, ProviderConfig, ProviderError, ProviderKind, UpdateEvent, UpdateInfo,
    UpdateProvider,
};

use crate::menu::MenuAction;
use crate::toast::{
    HostError, ListenerId, OverlayId, OverlayRequest, ToastHost, ToastOptions, ToastResponder,
    ToastResult, WindowId,
};

type Listener = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct HostState {
    focused: Option<WindowId>,
    next_overlay: u64,
    next_listener: u64,
    overlays: Vec<(OverlayId, ToastOptions)>,
    visible: Vec<OverlayId>,
    destroyed: Vec<OverlayId>,
    loading: Vec<OverlayId>,
    responders: Vec<ToastResponder>,
    listeners: HashMap<WindowId, Vec<(ListenerId, Listener)>>,
}

/// In-memory window manager that records every overlay operation.
pub(crate) struct RecordingHost {
    state: Mutex<HostState>,
}

impl RecordingHost {
    pub(crate) const MAIN_WINDOW: WindowId = WindowId(1);
    pub(crate) const FOCUSED_WINDOW: WindowId = WindowId(2);

    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(HostState {
                focused: Some(Self::FOCUSED_WINDOW),
                ..HostState::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().expect("host lock should not be poisoned")
    }

    pub(crate) fn set_focused(&self, window: Option<WindowId>) {
        self.lock().focused = window;
    }

    pub(crate) fn visible_count(&self) -> usize {
        self.lock().visible.len()
    }

    pub(crate) fn destroyed_count(&self) -> usize {
        self.lock().destroyed.len()
    }

    pub(crate) fn opened_titles(&self) -> Vec<String> {
        self.lock()
            .overlays
            .iter()
            .map(|(_, options)| options.title.clone())
            .collect()
    }

    pub(crate) fn opened_options(&self) -> Vec<ToastOptions> {
        self.lock()
            .overlays
            .iter()
            .map(|(_, options)| options.clone())
            .collect()
    }

    pub(crate) fn visible_titles(&self) -> Vec<String> {
        let state = self.lock();
        state
            .overlays
            .iter()
            .filter(|(id, _)| state.visible.contains(id))
            .map(|(_, options)| options.title.clone())
            .collect()
    }

    pub(crate) fn loading_overlays(&self) -> Vec<OverlayId> {
        self.lock().loading.clone()
    }

    pub(crate) fn listener_count(&self) -> usize {
        self.lock().listeners.values().map(Vec::len).sum()
    }

    pub(crate) fn latest_responder(&self) -> Option<ToastResponder> {
        self.lock().responders.last().cloned()
    }

    pub(crate) fn answer_latest(&self, result: ToastResult) {
        let responder = self.latest_responder().expect("a toast should have been opened");
        responder.respond(result);
    }

    pub(crate) fn close_window(&self, window: WindowId) {
        let listeners = self.lock().listeners.remove(&window).unwrap_or_default();
        for (_, listener) in listeners {
            listener();
        }
    }
}

impl ToastHost for RecordingHost {
    fn focused_window(&self) -> Option<WindowId> {
        self.lock().focused
    }

    fn main_window(&self) -> Option<WindowId> {
        Some(Self::MAIN_WINDOW)
    }

    fn open_overlay(
        &self,
        request: &OverlayRequest<'_>,
        responder: ToastResponder,
    ) -> Result<OverlayId, HostError> {
        let mut state = self.lock();
        state.next_overlay += 1;
        let overlay = OverlayId(state.next_overlay);
        state.overlays.push((overlay, request.options.clone()));
        state.visible.push(overlay);
        state.responders.push(responder);
        Ok(overlay)
    }

    fn show_loading(&self, overlay: OverlayId) {
        self.lock().loading.push(overlay);
    }

    fn hide_overlay(&self, overlay: OverlayId) {
        self.lock().visible.retain(|visible| *visible != overlay);
    }

    fn destroy_overlay(&self, overlay: OverlayId) {
        self.lock().destroyed.push(overlay);
    }

    fn on_window_closed(&self, window: WindowId, listener: Listener) -> ListenerId {
        let mut state = self.lock();
        state.next_listener += 1;
        let id = ListenerId(state.next_listener);
        state
            .listeners
            .entry(window)
            .or_default()
            .push((id, listener));
        id
    }

    fn remove_window_listener(&self, window: WindowId, listener: ListenerId) {
        if let Some(listeners) = self.lock().listeners.get_mut(&window) {
            listeners.retain(|(id, _)| *id != listener);
        }
    }
}

/// Provider double that records calls and lets tests emit events.
pub(crate) struct FakeProvider {
    kind: ProviderKind,
    hub: EventHub,
    calls: Mutex<Vec<String>>,
    configs: Mutex<Vec<ProviderConfig>>,
}

impl FakeProvider {
    pub(crate) fn installer() -> Arc<Self> {
        Arc::new(Self {
            kind: ProviderKind::Installer,
            hub: EventHub::new(),
            calls: Mutex::new(Vec::new()),
            configs: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub(crate) fn configs(&self) -> Vec<ProviderConfig> {
        self.configs.lock().expect("configs lock").clone()
    }

    pub(crate) fn emit(&self, event: UpdateEvent) {
        self.hub.emit(&event);
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().expect("calls lock").push(call.into());
    }
}

#[async_trait]
impl UpdateProvider for FakeProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn configure(&self, config: ProviderConfig) {
        self.configs.lock().expect("configs lock").push(config);
    }

    fn subscribe(&self, sink: EventSink) {
        self.hub.subscribe(sink);
    }

    fn subscriber_count(&self) -> usize {
        self.hub.len()
    }

    async fn check_for_updates(&self) -> Result<Option<UpdateInfo>, ProviderError> {
        self.record("check");
        Ok(None)
    }

    async fn check_for_updates_and_notify(&self) -> Result<Option<UpdateInfo>, ProviderError> {
        self.record("check_and_notify");
        Ok(None)
    }

    async fn download_update(&self) -> Result<(), ProviderError> {
        self.record("download");
        Ok(())
    }

    async fn quit_and_install(&self, silent: bool, force: bool) -> Result<(), ProviderError> {
        self.record(format!("quit_and_install(silent={silent}, force={force})"));
        Ok(())
    }

    fn on_app_quit(&self) {
        self.record("on_app_quit");
    }
}

/// Menu item double tracking every enabled-flag change.
#[derive(Default)]
pub(crate) struct RecordingMenu {
    changes: Mutex<Vec<bool>>,
}

impl RecordingMenu {
    pub(crate) fn changes(&self) -> Vec<bool> {
        self.changes.lock().expect("menu lock").clone()
    }
}

impl MenuAction for RecordingMenu {
    fn set_enabled(&self, enabled: bool) {
        self.changes.lock().expect("menu lock").push(enabled);
    }
}
