//! Clipboard paste merge.
//!
//! Pasting a copied subgraph re-keys every copied node past the largest
//! existing identifier and moves the group so it cannot land on top of the
//! existing content: horizontally centered on it, vertically stacked above
//! it with a fixed gap. With nothing on the canvas the group goes near the
//! top of the current viewport instead.

use crate::id::NodeId;
use crate::model::{Bounds, Link, Node, max_id};
use crate::transform::ViewTransform;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Vertical distance kept between pasted content and what is already there.
pub const PASTE_GAP: f64 = 500.0;

/// Left margin used by the viewport fallback placement.
const VIEW_MARGIN: f64 = 20.0;

// ─── Clipboard ───────────────────────────────────────────────────────────

/// A copied subgraph waiting to be pasted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Clipboard {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl Clipboard {
    /// Copy the selected nodes and the links running between them.
    ///
    /// Nodes keep the order of `nodes`, not the order of `ids`.
    pub fn copy_selection(nodes: &[Node], links: &[Link], ids: &[NodeId]) -> Self {
        let selected: HashSet<NodeId> = ids.iter().copied().collect();
        Self {
            nodes: nodes
                .iter()
                .filter(|n| selected.contains(&n.id))
                .cloned()
                .collect(),
            links: links
                .iter()
                .filter(|l| selected.contains(&l.source) && selected.contains(&l.target))
                .copied()
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

// ─── Merge ───────────────────────────────────────────────────────────────

/// Where the user is looking when the paste happens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PasteContext {
    /// Saved viewport transform of the target workspace.
    pub transform: ViewTransform,
    /// Viewport width in screen pixels.
    pub viewport_width: f64,
}

impl Default for PasteContext {
    fn default() -> Self {
        Self {
            transform: ViewTransform::IDENTITY,
            viewport_width: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PasteError {
    /// The largest existing identifier leaves no room for the copies.
    #[error("Cannot paste {count} nodes: no identifiers left after {after}")]
    IdsExhausted { count: usize, after: NodeId },
}

/// Outcome of [`merge_clipboard`]. The input slices are left untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeResult {
    /// Existing nodes followed by the re-keyed, translated copies.
    pub nodes: Vec<Node>,
    /// Existing links followed by the remapped copied links.
    pub links: Vec<Link>,
    /// Old clipboard identifier → fresh identifier.
    pub id_map: HashMap<NodeId, NodeId>,
    /// Translation applied to every copied node.
    pub offset: (f64, f64),
}

impl MergeResult {
    /// Identifiers assigned to the pasted nodes, in paste order.
    pub fn pasted_ids(&self, existing: usize) -> Vec<NodeId> {
        self.nodes[existing.min(self.nodes.len())..]
            .iter()
            .map(|n| n.id)
            .collect()
    }
}

/// Merge a clipboard into an existing node/link set.
///
/// Fresh identifiers start one past the largest existing identifier and are
/// handed out in clipboard order. Copied links survive only when both
/// endpoints were copied.
///
/// Fails without touching anything when the fresh identifiers would run past
/// `i64::MAX`.
pub fn merge_clipboard(
    existing_nodes: &[Node],
    existing_links: &[Link],
    clipboard: &Clipboard,
    ctx: &PasteContext,
) -> Result<MergeResult, PasteError> {
    let Some(copied) = Bounds::of(&clipboard.nodes) else {
        return Ok(MergeResult {
            nodes: existing_nodes.to_vec(),
            links: existing_links.to_vec(),
            id_map: HashMap::new(),
            offset: (0.0, 0.0),
        });
    };

    let largest = max_id(existing_nodes);
    let exhausted = || PasteError::IdsExhausted {
        count: clipboard.nodes.len(),
        after: largest.unwrap_or(NodeId(0)),
    };
    let mut next_id = match largest {
        Some(id) => id.next(),
        None => Some(NodeId(1)),
    };

    let (dx, dy) = placement_offset(Bounds::of(existing_nodes), copied, ctx);
    let mut id_map = HashMap::with_capacity(clipboard.nodes.len());

    let mut nodes = Vec::with_capacity(existing_nodes.len() + clipboard.nodes.len());
    nodes.extend_from_slice(existing_nodes);
    for src in &clipboard.nodes {
        let fresh = next_id.ok_or_else(exhausted)?;
        next_id = fresh.next();
        id_map.insert(src.id, fresh);

        let mut node = src.clone();
        node.id = fresh;
        node.x += dx;
        node.y += dy;
        nodes.push(node);
    }

    let mut links = existing_links.to_vec();
    links.extend(clipboard.links.iter().filter_map(|l| {
        Some(Link::new(*id_map.get(&l.source)?, *id_map.get(&l.target)?))
    }));

    log::debug!(
        "paste merge: {} nodes, {} links, offset ({dx}, {dy})",
        clipboard.nodes.len(),
        links.len() - existing_links.len()
    );

    Ok(MergeResult {
        nodes,
        links,
        id_map,
        offset: (dx, dy),
    })
}

/// Translation that moves the copied group into place.
fn placement_offset(existing: Option<Bounds>, copied: Bounds, ctx: &PasteContext) -> (f64, f64) {
    let view = ctx.transform;
    let (base_x, base_y) = match existing {
        Some(ex) => (
            ex.center_x() - copied.width() / 2.0 - copied.min_x,
            ex.min_y - copied.height() - PASTE_GAP - copied.min_y,
        ),
        None => (
            view.view_center_x(ctx.viewport_width) - copied.width() / 2.0 - copied.min_x,
            view.view_top() + PASTE_GAP - copied.min_y,
        ),
    };

    let dx = if base_x.is_finite() {
        base_x
    } else {
        (view.view_left() + VIEW_MARGIN).max(0.0) - copied.min_x
    };
    let dy = if base_y.is_finite() {
        base_y
    } else {
        view.view_top() + PASTE_GAP - copied.min_y
    };

    (finite_or_zero(dx), finite_or_zero(dy))
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: i64, x: f64, y: f64) -> Node {
        Node::new(NodeId(id), x, y)
    }

    fn link(s: i64, t: i64) -> Link {
        Link::new(NodeId(s), NodeId(t))
    }

    #[test]
    fn paste_scenario() {
        let existing = vec![node(1, 0.0, 0.0)];
        let clipboard = Clipboard {
            nodes: vec![node(1, 0.0, 0.0), node(2, 10.0, 0.0)],
            links: vec![link(1, 2)],
        };
        let merged =
            merge_clipboard(&existing, &[], &clipboard, &PasteContext::default()).unwrap();

        let ids: Vec<i64> = merged.nodes.iter().map(|n| n.id.get()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(merged.links, vec![link(2, 3)]);
        for pasted in &merged.nodes[1..] {
            assert!(pasted.y <= -PASTE_GAP, "pasted y = {}", pasted.y);
        }
        // Centered on the existing group: copy spans 10 units around x = 0.
        assert_eq!(merged.nodes[1].x, -5.0);
        assert_eq!(merged.nodes[2].x, 5.0);
    }

    #[test]
    fn fresh_ids_follow_the_largest_existing_id() {
        let existing = vec![node(4, 0.0, 0.0), node(17, 50.0, 50.0)];
        let clipboard = Clipboard {
            nodes: vec![node(4, 0.0, 0.0), node(100, 0.0, 0.0)],
            links: vec![],
        };
        let merged =
            merge_clipboard(&existing, &[], &clipboard, &PasteContext::default()).unwrap();
        assert_eq!(merged.pasted_ids(existing.len()), vec![NodeId(18), NodeId(19)]);
        assert_eq!(merged.id_map[&NodeId(100)], NodeId(19));
    }

    #[test]
    fn copied_group_sits_above_existing_group() {
        let existing = vec![node(1, 0.0, 100.0), node(2, 300.0, 400.0)];
        let clipboard = Clipboard {
            nodes: vec![node(1, 0.0, 0.0), node(2, 0.0, 250.0)],
            links: vec![],
        };
        let merged =
            merge_clipboard(&existing, &[], &clipboard, &PasteContext::default()).unwrap();
        let pasted = Bounds::of(&merged.nodes[2..]).unwrap();
        assert_eq!(pasted.max_y, 100.0 - PASTE_GAP);
        assert_eq!(pasted.center_x(), 150.0);
    }

    #[test]
    fn empty_canvas_uses_viewport() {
        let ctx = PasteContext {
            transform: ViewTransform::new(-100.0, -40.0, 2.0),
            viewport_width: 800.0,
        };
        let clipboard = Clipboard {
            nodes: vec![node(7, 10.0, 10.0), node(8, 30.0, 20.0)],
            links: vec![link(7, 8)],
        };
        let merged = merge_clipboard(&[], &[], &clipboard, &ctx).unwrap();

        assert_eq!(merged.nodes[0].id, NodeId(1));
        assert_eq!(merged.nodes[1].id, NodeId(2));
        // view top = 20, so the group's top edge lands at 20 + gap.
        assert_eq!(merged.nodes[0].y, 20.0 + PASTE_GAP);
        // view center x = (100 + 400) / 2 = 250, group is 20 wide.
        assert_eq!(merged.nodes[0].x, 240.0);
        assert_eq!(merged.nodes[1].x, 260.0);
        assert_eq!(merged.links, vec![link(1, 2)]);
    }

    #[test]
    fn links_to_uncopied_nodes_are_dropped() {
        let clipboard = Clipboard {
            nodes: vec![node(1, 0.0, 0.0), node(2, 0.0, 0.0)],
            links: vec![link(1, 2), link(2, 9), link(9, 1)],
        };
        let existing_links = vec![link(5, 6)];
        let merged = merge_clipboard(
            &[node(5, 0.0, 0.0), node(6, 0.0, 0.0)],
            &existing_links,
            &clipboard,
            &PasteContext::default(),
        )
        .unwrap();
        assert_eq!(merged.links, vec![link(5, 6), link(7, 8)]);
    }

    #[test]
    fn inputs_are_not_mutated() {
        let existing = vec![node(1, 3.0, 4.0)];
        let existing_links = vec![link(1, 1)];
        let clipboard = Clipboard {
            nodes: vec![node(1, 0.0, 0.0)],
            links: vec![link(1, 1)],
        };
        let before = (existing.clone(), existing_links.clone(), clipboard.clone());
        let _ = merge_clipboard(
            &existing,
            &existing_links,
            &clipboard,
            &PasteContext::default(),
        )
        .unwrap();
        assert_eq!((existing, existing_links, clipboard), before);
    }

    #[test]
    fn empty_clipboard_is_a_noop() {
        let existing = vec![node(1, 0.0, 0.0)];
        let merged = merge_clipboard(
            &existing,
            &[],
            &Clipboard::default(),
            &PasteContext::default(),
        )
        .unwrap();
        assert_eq!(merged.nodes, existing);
        assert!(merged.id_map.is_empty());
    }

    #[test]
    fn non_finite_offsets_fall_back_to_viewport() {
        // Extreme coordinates overflow both the center and the stacking math.
        let existing = vec![node(1, f64::MAX, -f64::MAX), node(2, f64::MAX, 0.0)];
        let clipboard = Clipboard {
            nodes: vec![node(1, 0.0, 0.0), node(2, 0.0, f64::MAX)],
            links: vec![],
        };
        let ctx = PasteContext {
            transform: ViewTransform::new(-60.0, -80.0, 1.0),
            viewport_width: 400.0,
        };
        let merged = merge_clipboard(&existing, &[], &clipboard, &ctx).unwrap();
        assert_eq!(merged.offset, (80.0, 80.0 + PASTE_GAP));
        assert_eq!(merged.nodes[2].x, 80.0);
        assert_eq!(merged.nodes[2].y, 80.0 + PASTE_GAP);
    }

    #[test]
    fn paste_fails_when_ids_run_out() {
        let existing = vec![node(i64::MAX, 0.0, 0.0)];
        let clipboard = Clipboard {
            nodes: vec![node(1, 0.0, 0.0)],
            links: vec![],
        };
        let err = merge_clipboard(&existing, &[], &clipboard, &PasteContext::default())
            .unwrap_err();
        assert_eq!(
            err,
            PasteError::IdsExhausted {
                count: 1,
                after: NodeId(i64::MAX)
            }
        );

        // One slot left: the first copy fits, the second does not.
        let existing = vec![node(i64::MAX - 1, 0.0, 0.0)];
        let clipboard = Clipboard {
            nodes: vec![node(1, 0.0, 0.0), node(2, 0.0, 0.0)],
            links: vec![link(1, 2)],
        };
        assert!(merge_clipboard(&existing, &[], &clipboard, &PasteContext::default()).is_err());
        let single = Clipboard {
            nodes: vec![node(1, 0.0, 0.0)],
            links: vec![],
        };
        let merged =
            merge_clipboard(&existing, &[], &single, &PasteContext::default()).unwrap();
        assert_eq!(merged.nodes[1].id, NodeId(i64::MAX));
    }

    #[test]
    fn copy_selection_keeps_internal_links() {
        let nodes = vec![node(1, 0.0, 0.0), node(2, 1.0, 1.0), node(3, 2.0, 2.0)];
        let links = vec![link(1, 2), link(2, 3), link(3, 1)];
        let clip = Clipboard::copy_selection(&nodes, &links, &[NodeId(3), NodeId(1)]);
        let ids: Vec<NodeId> = clip.nodes.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![NodeId(1), NodeId(3)]);
        assert_eq!(clip.links, vec![link(3, 1)]);
    }
}
