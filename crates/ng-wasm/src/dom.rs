//! DOM-facing collaborators: the graph surface and the notification sink.

use crate::storage::js_error_text;
use js_sys::Function;
use ng_core::ViewTransform;
use ng_editor::{Notification, NotificationLog, Notifier, RenderSurface};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsValue;
use web_sys::Element;

const CONTAINER_SELECTOR: &str = "#workspace-container";
const GRAPH_SELECTOR: &str = "#main_graph";

/// A host callback slot shared by the bridge and the surfaces it hands out.
/// Setting it reaches every holder, including surfaces created earlier.
pub struct SharedHook<F>(Rc<RefCell<Option<F>>>);

impl<F: Clone> SharedHook<F> {
    pub fn set(&self, hook: Option<F>) {
        *self.0.borrow_mut() = hook;
    }

    pub fn get(&self) -> Option<F> {
        self.0.borrow().clone()
    }
}

impl<F> Clone for SharedHook<F> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<F> Default for SharedHook<F> {
    fn default() -> Self {
        Self(Rc::new(RefCell::new(None)))
    }
}

/// The `#workspace-container svg #main_graph` group.
///
/// The element and the zoom hook are looked up on every apply, so a
/// re-mounted graph view or a re-registered hook is picked up as is.
pub struct DomSurface {
    /// Host hook that keeps the zoom behaviour in step: `(x, y, k)`.
    zoom_sync: SharedHook<Function>,
}

impl DomSurface {
    pub fn new(zoom_sync: SharedHook<Function>) -> Self {
        Self { zoom_sync }
    }

    /// Whether the graph group exists yet.
    pub fn is_mounted() -> bool {
        main_graph().is_some()
    }
}

fn main_graph() -> Option<Element> {
    let document = web_sys::window()?.document()?;
    let container = document.query_selector(CONTAINER_SELECTOR).ok()??;
    let svg = container.query_selector("svg").ok()??;
    svg.query_selector(GRAPH_SELECTOR).ok()?
}

impl RenderSurface for DomSurface {
    fn apply_transform(&mut self, transform: ViewTransform) -> Result<(), String> {
        let graph = main_graph().ok_or_else(|| "graph surface is not mounted".to_string())?;
        if let Some(sync) = self.zoom_sync.get() {
            sync.call3(
                &JsValue::NULL,
                &JsValue::from_f64(transform.x),
                &JsValue::from_f64(transform.y),
                &JsValue::from_f64(transform.k),
            )
            .map_err(|e| js_error_text(&e))?;
        }
        graph
            .set_attribute("transform", &transform.to_string())
            .map_err(|e| js_error_text(&e))
    }
}

/// Forwards notifications to a JS `(message, severity, durationMs)` callback,
/// or queues them until the host drains them.
#[derive(Default)]
pub struct JsNotifier {
    callback: Option<Function>,
    queued: NotificationLog,
}

impl JsNotifier {
    pub fn set_callback(&mut self, callback: Option<Function>) {
        self.callback = callback;
    }

    pub fn drain(&mut self) -> Vec<Notification> {
        self.queued.drain()
    }
}

impl Notifier for JsNotifier {
    fn notify(&mut self, notification: Notification) {
        let Some(callback) = &self.callback else {
            self.queued.notify(notification);
            return;
        };
        let sent = callback.call3(
            &JsValue::NULL,
            &JsValue::from_str(&notification.message),
            &JsValue::from_str(notification.severity.as_str()),
            &JsValue::from(notification.duration_ms),
        );
        if let Err(e) = sent {
            log::warn!("notification callback failed: {}", js_error_text(&e));
            self.queued.notify(notification);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn hook_set_later_reaches_existing_holders() {
        let bridge: SharedHook<&str> = SharedHook::default();
        let surface = bridge.clone();
        assert_eq!(surface.get(), None);

        bridge.set(Some("zoom"));
        assert_eq!(surface.get(), Some("zoom"));

        bridge.set(None);
        assert_eq!(surface.get(), None);
    }
}
