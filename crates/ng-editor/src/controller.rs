//! Workspace controller.
//!
//! The one owner of workspace state. It runs the import, export, copy and
//! paste flows, mirrors the state to persistence, reports to the user
//! through the notifier and hands transforms to the surface gate.
//!
//! Storage is best effort: a failed write is logged and the in-memory
//! update stands. Refresh and surface failures never reach the user.

use crate::notify::{
    EXPORT_FAILED, EXPORT_SUCCEEDED, IMPORT_STARTED, IMPORT_SUCCEEDED, NO_ACTIVE_WORKSPACE,
    Notification, Notifier,
};
use crate::persistence::{ActiveWorkspace, WorkspacePersistence};
use crate::store::KeyValueStore;
use crate::surface::{RenderSurface, SurfaceGate};
use crate::sync::StateSync;
use ng_core::{
    Clipboard, ExportDocument, ImportError, ImportLimits, Node, NodeId, PasteContext, PasteError,
    ViewTransform, WorkspaceSnapshot, export_filename, merge_clipboard, parse_import,
    validate_import,
};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("No active workspace to import into")]
    NoActiveWorkspace,
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error("Failed to export workspace: {0}")]
    Export(#[from] serde_json::Error),
    #[error(transparent)]
    Paste(#[from] PasteError),
}

/// A ready-to-download export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub filename: String,
    pub contents: String,
}

pub struct WorkspaceController<S, N> {
    persistence: WorkspacePersistence<S>,
    notifier: N,
    sync: StateSync,
    gate: SurfaceGate,
    clipboard: Clipboard,
    current: Option<ActiveWorkspace>,
    limits: ImportLimits,
    viewport_width: f64,
}

impl<S: KeyValueStore, N: Notifier> WorkspaceController<S, N> {
    pub fn new(store: S, notifier: N) -> Self {
        Self {
            persistence: WorkspacePersistence::new(store),
            notifier,
            sync: StateSync::new(),
            gate: SurfaceGate::new(),
            clipboard: Clipboard::default(),
            current: None,
            limits: ImportLimits::default(),
            viewport_width: 0.0,
        }
    }

    pub fn with_limits(mut self, limits: ImportLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Width of the graph viewport in screen pixels, used to place pastes on
    /// an empty canvas.
    pub fn set_viewport_width(&mut self, width: f64) {
        self.viewport_width = width;
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn current_workspace(&self) -> Option<&ActiveWorkspace> {
        self.current.as_ref()
    }

    pub fn state(&self) -> &StateSync {
        &self.sync
    }

    pub fn state_mut(&mut self) -> &mut StateSync {
        &mut self.sync
    }

    pub fn persistence(&self) -> &WorkspacePersistence<S> {
        &self.persistence
    }

    pub fn persistence_mut(&mut self) -> &mut WorkspacePersistence<S> {
        &mut self.persistence
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    pub fn surface(&self) -> &SurfaceGate {
        &self.gate
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    /// Replace the clipboard, e.g. with one copied in another tab.
    pub fn set_clipboard(&mut self, clipboard: Clipboard) {
        self.clipboard = clipboard;
    }

    // ─── Workspaces ──────────────────────────────────────────────────────

    /// Switch to `wid`.
    ///
    /// Marks it active, seeds an empty record if it has none, loads it and,
    /// when the clipboard holds nodes, pastes them in before the commit. A
    /// paste that cannot be placed leaves the clipboard for a later try.
    pub fn open_workspace(&mut self, wid: &str, shared: bool) {
        if let Err(e) = self.persistence.set_active(wid, shared) {
            log::warn!("could not record active workspace {wid}: {e}");
        }
        if let Err(e) = self.persistence.seed(wid, &WorkspaceSnapshot::default()) {
            log::warn!("could not seed workspace {wid}: {e}");
        }
        let mut snapshot = match self.persistence.load(wid) {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => WorkspaceSnapshot::default(),
            Err(e) => {
                log::warn!("could not load workspace {wid}, starting empty: {e}");
                WorkspaceSnapshot::default()
            }
        };
        self.current = Some(ActiveWorkspace::new(wid, shared));

        let pasted =
            !self.clipboard.is_empty() && self.merge_clipboard_into(&mut snapshot).is_ok();
        let transform = snapshot.transform.clone();
        self.sync.commit(snapshot);
        if pasted {
            self.save_current();
        }
        self.gate.request(&transform);
        log::info!("opened workspace {wid}{}", if shared { " (shared)" } else { "" });
    }

    /// Reopen the workspace named by the last-active marker, or `fallback`
    /// when there is none. Returns the identifier that was opened.
    pub fn restore_active(&mut self, fallback: &str) -> String {
        let active = self.persistence.active().unwrap_or_else(|e| {
            log::warn!("could not read active workspace marker: {e}");
            None
        });
        let target = active.unwrap_or_else(|| ActiveWorkspace::new(fallback, false));
        self.open_workspace(&target.wid, target.shared);
        target.wid
    }

    /// Record a viewport change made by the user.
    pub fn record_transform(&mut self, transform: &str) {
        self.sync.set_transform(transform);
    }

    pub fn surface_ready(&mut self, surface: Box<dyn RenderSurface>) {
        self.gate.surface_ready(surface);
    }

    pub fn surface_lost(&mut self) {
        self.gate.surface_lost();
    }

    /// Save an edited node: replace the node with the same identifier, or
    /// add it when there is none. `color` becomes its display color.
    ///
    /// Returns `true` when the node was new.
    pub fn update_node(&mut self, mut node: Node, color: Option<String>) -> bool {
        node.color = color;
        let id = node.id;
        let added = self.sync.upsert_node(node);
        self.save_current();
        log::debug!("node {id} {}", if added { "added" } else { "updated" });
        added
    }

    // ─── Import / export ─────────────────────────────────────────────────

    /// Import an exported workspace from JSON text.
    ///
    /// Nothing changes unless the whole document passes validation.
    pub fn import_text(&mut self, text: &str) -> Result<(), EditorError> {
        self.require_workspace()?;
        let result = parse_import(text, &self.limits);
        self.finish_import(result)
    }

    /// Import an already-decoded document.
    pub fn import_value(&mut self, value: &Value) -> Result<(), EditorError> {
        self.require_workspace()?;
        let result = validate_import(value, &self.limits);
        self.finish_import(result)
    }

    fn require_workspace(&mut self) -> Result<(), EditorError> {
        if self.current.is_some() {
            return Ok(());
        }
        self.notifier
            .notify(Notification::error(NO_ACTIVE_WORKSPACE).with_duration(3000));
        Err(EditorError::NoActiveWorkspace)
    }

    fn finish_import(
        &mut self,
        result: Result<WorkspaceSnapshot, ImportError>,
    ) -> Result<(), EditorError> {
        let snapshot = match result {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log::warn!("import rejected: {e}");
                self.notifier.notify(Notification::error(e.to_string()));
                return Err(e.into());
            }
        };

        self.notifier.notify(Notification::info(IMPORT_STARTED));
        let transform = snapshot.transform.clone();
        let counts = (snapshot.nodes.len(), snapshot.links.len());
        self.sync.commit(snapshot);
        self.save_current();
        self.gate.request(&transform);

        log::info!("imported workspace: {} nodes, {} links", counts.0, counts.1);
        self.notifier.notify(Notification::success(IMPORT_SUCCEEDED));
        Ok(())
    }

    /// Export the current workspace, stamped at `unix_millis`.
    pub fn export(&mut self, unix_millis: i64) -> Result<ExportFile, EditorError> {
        let doc = ExportDocument::new(self.sync.current(), unix_millis);
        match doc.to_json() {
            Ok(contents) => {
                let wid = self.current.as_ref().map(|a| a.wid.as_str());
                let filename = export_filename(wid, unix_millis);
                log::info!("exported {filename} ({} bytes)", contents.len());
                self.notifier.notify(Notification::success(EXPORT_SUCCEEDED));
                Ok(ExportFile { filename, contents })
            }
            Err(e) => {
                log::error!("export failed: {e}");
                self.notifier.notify(Notification::error(EXPORT_FAILED));
                Err(e.into())
            }
        }
    }

    // ─── Clipboard ───────────────────────────────────────────────────────

    /// Copy the nodes named by `ids`, and the links among them. Returns how
    /// many nodes were copied.
    pub fn copy_selection(&mut self, ids: &[NodeId]) -> usize {
        let current = self.sync.current();
        self.clipboard = Clipboard::copy_selection(&current.nodes, &current.links, ids);
        log::debug!(
            "copied {} nodes, {} links",
            self.clipboard.nodes.len(),
            self.clipboard.links.len()
        );
        self.clipboard.nodes.len()
    }

    /// Paste the clipboard into the current workspace and empty it.
    ///
    /// Returns the identifiers given to the pasted nodes, or `None` when the
    /// clipboard was empty or the paste was refused.
    pub fn paste(&mut self) -> Option<Vec<NodeId>> {
        if self.clipboard.is_empty() {
            return None;
        }
        let mut snapshot = self.sync.snapshot();
        let existing = snapshot.nodes.len();
        self.merge_clipboard_into(&mut snapshot).ok()?;
        let pasted: Vec<NodeId> = snapshot.nodes[existing..].iter().map(|n| n.id).collect();
        self.sync.commit(snapshot);
        self.save_current();
        log::info!("pasted {} nodes", pasted.len());
        Some(pasted)
    }

    /// On failure the user is told, and `snapshot` and the clipboard are
    /// left as they were.
    fn merge_clipboard_into(
        &mut self,
        snapshot: &mut WorkspaceSnapshot,
    ) -> Result<(), EditorError> {
        let ctx = PasteContext {
            transform: ViewTransform::parse_lenient(&snapshot.transform),
            viewport_width: self.viewport_width,
        };
        let merged = match merge_clipboard(&snapshot.nodes, &snapshot.links, &self.clipboard, &ctx)
        {
            Ok(merged) => merged,
            Err(e) => {
                log::warn!("paste refused: {e}");
                self.notifier.notify(Notification::error(e.to_string()));
                return Err(e.into());
            }
        };
        snapshot.nodes = merged.nodes;
        snapshot.links = merged.links;
        self.clipboard = Clipboard::default();
        Ok(())
    }

    fn save_current(&mut self) {
        let Some(active) = &self.current else {
            return;
        };
        if let Err(e) = self.persistence.save(&active.wid, self.sync.current()) {
            log::warn!("workspace {} kept in memory only: {e}", active.wid);
        }
    }
}
