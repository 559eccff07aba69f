//! Canonical workspace state and the render fast path.
//!
//! [`StateSync`] is the only writer of the in-memory workspace. Every commit
//! follows the same order:
//!
//! 1. replace the canonical snapshot;
//! 2. rebuild the [`RenderView`] handed to the graph view;
//! 3. fire the refresh callback, if one is registered.
//!
//! The refresh is fire-and-forget: a failing callback is logged and the
//! commit still stands.

use ng_core::{CalendarItem, Link, Node, WorkspaceSnapshot};
use std::rc::Rc;

/// Re-render hook registered by the graph view.
pub type RefreshFn = Box<dyn FnMut() -> Result<(), String>>;

/// Shared, read-only copy of the drawable parts of the workspace.
///
/// Cloning is cheap; the renderer may hold on to a view across commits and
/// it will keep showing the state it was taken from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderView {
    pub nodes: Rc<[Node]>,
    pub links: Rc<[Link]>,
    pub calendar: Rc<[CalendarItem]>,
}

impl RenderView {
    fn of(snapshot: &WorkspaceSnapshot) -> Self {
        Self {
            nodes: snapshot.nodes.as_slice().into(),
            links: snapshot.links.as_slice().into(),
            calendar: snapshot.calendar.as_slice().into(),
        }
    }
}

pub struct StateSync {
    snapshot: WorkspaceSnapshot,
    view: RenderView,
    refresh: Option<RefreshFn>,
    /// Bumped on every commit.
    revision: u64,
}

impl Default for StateSync {
    fn default() -> Self {
        Self::new()
    }
}

impl StateSync {
    pub fn new() -> Self {
        Self {
            snapshot: WorkspaceSnapshot::default(),
            view: RenderView::default(),
            refresh: None,
            revision: 0,
        }
    }

    /// Register the re-render hook, replacing any previous one.
    pub fn set_refresh(&mut self, refresh: impl FnMut() -> Result<(), String> + 'static) {
        self.refresh = Some(Box::new(refresh));
    }

    // ─── Commits ─────────────────────────────────────────────────────────

    /// Replace the whole workspace and signal a re-render.
    pub fn commit(&mut self, snapshot: WorkspaceSnapshot) {
        self.snapshot = snapshot;
        self.publish();
    }

    pub fn set_nodes(&mut self, nodes: Vec<Node>) {
        self.snapshot.nodes = nodes;
        self.publish();
    }

    /// Replace the node that has `node.id`, or append it when there is
    /// none, then re-render. Returns `true` when it was appended.
    pub fn upsert_node(&mut self, node: Node) -> bool {
        let added = match self.snapshot.nodes.iter_mut().find(|n| n.id == node.id) {
            Some(slot) => {
                *slot = node;
                false
            }
            None => {
                self.snapshot.nodes.push(node);
                true
            }
        };
        self.publish();
        added
    }

    pub fn set_links(&mut self, links: Vec<Link>) {
        self.snapshot.links = links;
        self.publish();
    }

    /// Record the viewport transform. The graph view already shows it, so
    /// this does not re-render.
    pub fn set_transform(&mut self, transform: impl Into<String>) {
        self.snapshot.transform = transform.into();
        self.revision += 1;
    }

    fn publish(&mut self) {
        self.view = RenderView::of(&self.snapshot);
        self.revision += 1;
        log::debug!(
            "state r{}: {} nodes, {} links, {} calendar items",
            self.revision,
            self.snapshot.nodes.len(),
            self.snapshot.links.len(),
            self.snapshot.calendar.len()
        );
        self.signal_refresh();
    }

    /// Fire the refresh callback. No callback means nothing to do.
    pub fn signal_refresh(&mut self) {
        let Some(refresh) = self.refresh.as_mut() else {
            return;
        };
        if let Err(e) = refresh() {
            log::warn!("graph refresh failed: {e}");
        }
    }

    // ─── Reads ───────────────────────────────────────────────────────────

    pub fn current(&self) -> &WorkspaceSnapshot {
        &self.snapshot
    }

    /// Owned copy of the current workspace.
    pub fn snapshot(&self) -> WorkspaceSnapshot {
        self.snapshot.clone()
    }

    pub fn render_view(&self) -> RenderView {
        self.view.clone()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ng_core::NodeId;
    use std::cell::Cell;

    fn two_nodes() -> WorkspaceSnapshot {
        WorkspaceSnapshot::new(
            vec![
                Node::new(NodeId(1), 0.0, 0.0),
                Node::new(NodeId(2), 5.0, 5.0),
            ],
            vec![Link::new(NodeId(1), NodeId(2))],
        )
    }

    #[test]
    fn commit_without_callback_is_fine() {
        let mut sync = StateSync::new();
        sync.commit(two_nodes());
        assert_eq!(sync.current().nodes.len(), 2);
        assert_eq!(sync.render_view().links.len(), 1);
        assert_eq!(sync.revision(), 1);
    }

    #[test]
    fn commit_updates_view_before_refresh() {
        let seen = Rc::new(Cell::new(0usize));
        let mut sync = StateSync::new();
        let hits = Rc::clone(&seen);
        sync.set_refresh(move || {
            hits.set(hits.get() + 1);
            Ok(())
        });
        sync.commit(two_nodes());
        sync.set_links(Vec::new());
        assert_eq!(seen.get(), 2);
        assert!(sync.render_view().links.is_empty());
    }

    #[test]
    fn failing_refresh_does_not_undo_commit() {
        let mut sync = StateSync::new();
        sync.set_refresh(|| Err("graph view detached".into()));
        sync.commit(two_nodes());
        assert_eq!(sync.snapshot(), two_nodes());
    }

    #[test]
    fn old_views_keep_their_state() {
        let mut sync = StateSync::new();
        sync.commit(two_nodes());
        let before = sync.render_view();
        sync.set_nodes(vec![Node::new(NodeId(9), 1.0, 1.0)]);
        assert_eq!(before.nodes.len(), 2);
        assert_eq!(sync.render_view().nodes[0].id, NodeId(9));
    }

    #[test]
    fn upsert_replaces_in_place_or_appends() {
        let calls = Rc::new(Cell::new(0usize));
        let hits = Rc::clone(&calls);
        let mut sync = StateSync::new();
        sync.commit(two_nodes());
        sync.set_refresh(move || {
            hits.set(hits.get() + 1);
            Ok(())
        });

        let edited = Node::new(NodeId(2), 9.0, 9.0).with_color("#2383ed");
        assert!(!sync.upsert_node(edited.clone()));
        assert_eq!(sync.current().nodes.len(), 2);
        assert_eq!(sync.current().nodes[1], edited);

        assert!(sync.upsert_node(Node::new(NodeId(7), 0.0, 0.0)));
        let ids: Vec<NodeId> = sync.render_view().nodes.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![NodeId(1), NodeId(2), NodeId(7)]);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn transform_does_not_refresh() {
        let calls = Rc::new(Cell::new(0usize));
        let hits = Rc::clone(&calls);
        let mut sync = StateSync::new();
        sync.set_refresh(move || {
            hits.set(hits.get() + 1);
            Ok(())
        });
        sync.set_transform("translate(1,1) scale(1)");
        assert_eq!(calls.get(), 0);
        assert_eq!(sync.current().transform, "translate(1,1) scale(1)");
    }
}
