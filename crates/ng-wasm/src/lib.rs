//! WASM bridge for Nodegram: exposes the workspace controller to JavaScript.
//!
//! Compiled via `wasm-pack build --target web` and loaded by the workspace
//! page. Results that can fail come back as JSON strings:
//! `{"ok":true,...}` or `{"ok":false,"error":"..."}`.

mod console;
mod dom;
mod storage;

use dom::{DomSurface, JsNotifier, SharedHook};
use js_sys::Function;
use ng_core::{Clipboard, ImportLimits, Node, NodeId, parse_import};
use ng_editor::notify::READ_FAILED;
use ng_editor::{Notification, Notifier, WorkspaceController};
use serde_json::{Value, json};
use storage::LocalStorage;
use wasm_bindgen::prelude::*;

/// The page-facing workspace handle.
///
/// Owns the controller, backed by `localStorage`, the DOM graph surface and
/// host callbacks. All workspace interaction from the page goes through it.
#[wasm_bindgen]
pub struct NgWorkspace {
    controller: WorkspaceController<LocalStorage, JsNotifier>,
    zoom_sync: SharedHook<Function>,
}

#[wasm_bindgen]
impl NgWorkspace {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        console::panic_hook_setup();
        console::init_logger(log::LevelFilter::Info);

        Self {
            controller: WorkspaceController::new(LocalStorage, JsNotifier::default()),
            zoom_sync: SharedHook::default(),
        }
    }

    /// Viewport width in CSS pixels, for placing pastes on an empty canvas.
    pub fn set_viewport_width(&mut self, width: f64) {
        self.controller.set_viewport_width(width);
    }

    /// Register the graph view's re-render hook. Exceptions it throws are
    /// logged and otherwise ignored.
    pub fn set_refresh(&mut self, refresh: Function) {
        self.controller.state_mut().set_refresh(move || {
            refresh
                .call0(&JsValue::NULL)
                .map(|_| ())
                .map_err(|e| storage::js_error_text(&e))
        });
    }

    /// Register `(message, severity, durationMs)` as the notification sink.
    /// Messages sent before this are kept for [`take_notifications`].
    ///
    /// [`take_notifications`]: NgWorkspace::take_notifications
    pub fn set_notifier(&mut self, notify: Function) {
        self.controller.notifier_mut().set_callback(Some(notify));
    }

    /// Register `(x, y, k)` to keep the host's zoom behaviour in step with
    /// transforms applied from here. Takes effect on a surface that is
    /// already mounted too.
    pub fn set_zoom_sync(&mut self, sync: Function) {
        self.zoom_sync.set(Some(sync));
    }

    /// Queued notifications as a JSON array.
    pub fn take_notifications(&mut self) -> String {
        let queued = self.controller.notifier_mut().drain();
        serde_json::to_string(&queued).unwrap_or_else(|_| "[]".to_string())
    }

    // ─── Workspaces ──────────────────────────────────────────────────────

    pub fn open_workspace(&mut self, wid: &str, shared: bool) {
        self.controller.open_workspace(wid, shared);
    }

    /// Reopen the last active workspace, or `fallback`. Returns the id opened.
    pub fn restore_active(&mut self, fallback: &str) -> String {
        self.controller.restore_active(fallback)
    }

    pub fn current_workspace(&self) -> Option<String> {
        self.controller.current_workspace().map(|a| a.wid.clone())
    }

    pub fn is_shared(&self) -> bool {
        self.controller.current_workspace().is_some_and(|a| a.shared)
    }

    /// The committed workspace as JSON.
    pub fn state_json(&self) -> String {
        serde_json::to_string(self.controller.state().current()).unwrap_or_else(|_| "{}".into())
    }

    /// Record a pan/zoom made in the graph view.
    pub fn record_transform(&mut self, transform: &str) {
        self.controller.record_transform(transform);
    }

    /// The graph view has mounted. Returns `false` if `#main_graph` is not
    /// in the document yet; call again after the next render.
    pub fn surface_ready(&mut self) -> bool {
        if !DomSurface::is_mounted() {
            return false;
        }
        let surface = DomSurface::new(self.zoom_sync.clone());
        self.controller.surface_ready(Box::new(surface));
        true
    }

    /// The graph view is unmounting; hold transforms until it is back.
    pub fn surface_lost(&mut self) {
        self.controller.surface_lost();
    }

    /// Save a node from the node editor, replacing the node with the same
    /// id or adding it. Returns `false` when `node_json` is not a node.
    pub fn update_node(&mut self, node_json: &str, color: Option<String>) -> bool {
        let node = serde_json::from_str::<Value>(node_json)
            .ok()
            .as_ref()
            .and_then(Node::from_value);
        match node {
            Some(node) => {
                self.controller.update_node(node, color);
                true
            }
            None => {
                log::warn!("ignoring node update: not a node");
                false
            }
        }
    }

    // ─── Import / export ─────────────────────────────────────────────────

    /// Import file contents into the current workspace.
    pub fn import_json(&mut self, text: &str) -> String {
        result_json(self.controller.import_text(text).map(|()| json!({})))
    }

    /// Build the export. Returns `{"ok":true,"filename":..,"contents":..}`;
    /// the page turns it into a download.
    pub fn export_json(&mut self) -> String {
        let now = js_sys::Date::now() as i64;
        result_json(
            self.controller
                .export(now)
                .map(|file| json!({"filename": file.filename, "contents": file.contents})),
        )
    }

    /// Report that the chosen file could not be read.
    pub fn import_read_failed(&mut self) {
        self.controller
            .notifier_mut()
            .notify(Notification::error(READ_FAILED));
    }

    // ─── Clipboard ───────────────────────────────────────────────────────

    /// Copy the nodes listed in `ids_json` (a JSON array of ids). Returns the
    /// number of nodes copied.
    pub fn copy_selection(&mut self, ids_json: &str) -> usize {
        let ids = parse_id_list(ids_json);
        self.controller.copy_selection(&ids)
    }

    /// Paste into the current workspace. Returns the new ids as a JSON array.
    pub fn paste(&mut self) -> String {
        let pasted = self.controller.paste().unwrap_or_default();
        serde_json::to_string(&pasted).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn clipboard_json(&self) -> String {
        serde_json::to_string(self.controller.clipboard()).unwrap_or_else(|_| "{}".into())
    }

    /// Restore a clipboard saved by the page. Returns `false` for bad input.
    pub fn set_clipboard_json(&mut self, json: &str) -> bool {
        match serde_json::from_str::<Clipboard>(json) {
            Ok(clipboard) => {
                self.controller.set_clipboard(clipboard);
                true
            }
            Err(e) => {
                log::warn!("ignoring clipboard: {e}");
                false
            }
        }
    }
}

impl Default for NgWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Standalone functions (no workspace needed) ──────────────────────────

/// Check an import file without applying it.
/// Returns `{"ok":true,"nodes":n,"links":n}` or `{"ok":false,"error":"..."}`.
#[wasm_bindgen]
pub fn validate_workspace(text: &str) -> String {
    result_json(
        parse_import(text, &ImportLimits::default())
            .map(|snap| json!({"nodes": snap.nodes.len(), "links": snap.links.len()})),
    )
}

// ─── Helpers ─────────────────────────────────────────────────────────────

fn result_json<E: std::fmt::Display>(result: Result<Value, E>) -> String {
    let body = match result {
        Ok(Value::Object(mut fields)) => {
            fields.insert("ok".into(), Value::Bool(true));
            Value::Object(fields)
        }
        Ok(other) => json!({"ok": true, "value": other}),
        Err(e) => json!({"ok": false, "error": e.to_string()}),
    };
    body.to_string()
}

/// Ids from a JSON array; entries that do not coerce are skipped.
fn parse_id_list(ids_json: &str) -> Vec<NodeId> {
    match serde_json::from_str::<Value>(ids_json) {
        Ok(Value::Array(items)) => items.iter().filter_map(NodeId::coerce).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn result_json_shapes() {
        let ok: Result<Value, String> = Ok(json!({"filename": "a.json"}));
        let ok: Value = serde_json::from_str(&result_json(ok)).unwrap();
        assert_eq!(ok, json!({"ok": true, "filename": "a.json"}));

        let err: Result<Value, String> = Err("Too many nodes (max 1000)".into());
        let err: Value = serde_json::from_str(&result_json(err)).unwrap();
        assert_eq!(err, json!({"ok": false, "error": "Too many nodes (max 1000)"}));
    }

    #[test]
    fn id_list_coerces_entries() {
        assert_eq!(
            parse_id_list(r#"[1, "2", "x", null, 3.9]"#),
            vec![NodeId(1), NodeId(2), NodeId(3)]
        );
        assert!(parse_id_list("not json").is_empty());
        assert!(parse_id_list(r#"{"id": 1}"#).is_empty());
    }

    #[test]
    fn validate_reports_errors() {
        let ok: Value =
            serde_json::from_str(&validate_workspace(r#"{"nodes":[{"id":1}]}"#)).unwrap();
        assert_eq!(ok, json!({"ok": true, "nodes": 1, "links": 0}));

        let bad: Value = serde_json::from_str(&validate_workspace(
            r#"{"nodes":[{"id":1}],"links":[{"source":1,"target":2}]}"#,
        ))
        .unwrap();
        assert_eq!(bad["ok"], json!(false));
        assert_eq!(bad["error"], json!("Invalid links found: 1->2"));
    }
}
