use std::sync::Arc;

use log::debug;

/// A host menu entry whose enabled flag the updater controls.
pub trait MenuAction: Send + Sync {
    fn set_enabled(&self, enabled: bool);
}

pub type MenuItemRef = Arc<dyn MenuAction>;

/// The session's reference to the "check for updates" menu action.
///
/// Only the first bound item is kept for the lifetime of the session.
#[derive(Default)]
pub struct MenuBinding {
    item: Option<MenuItemRef>,
}

impl MenuBinding {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `item` unless a menu item is already bound. Returns whether the
    /// binding changed.
    pub fn bind_once(&mut self, item: Option<MenuItemRef>) -> bool {
        if self.item.is_some() {
            return false;
        }
        let Some(item) = item else {
            return false;
        };
        self.item = Some(item);
        debug!("Bound update menu item");
        true
    }

    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.item.is_some()
    }

    pub fn set_enabled(&self, enabled: bool) {
        if let Some(item) = &self.item {
            item.set_enabled(enabled);
        }
    }
}
