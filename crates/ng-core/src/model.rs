//! Workspace data model.
//!
//! A workspace is a flat node-graph: positioned nodes, directed links between
//! node identifiers, an opaque calendar, and the serialized viewport
//! transform. Nodes keep any JSON fields the editor does not know about in
//! `extra` so documents survive an import → export cycle untouched.

use crate::id::NodeId;
use crate::transform::IDENTITY_TRANSFORM;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ─── Nodes ───────────────────────────────────────────────────────────────

/// A positioned node on the graph canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    /// Type tag (`"task"`, `"note"`, ...). Drives default color and width
    /// in the rendering collaborator.
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    /// Free-form content, shape depends on `kind`.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub content: Value,
    /// Display color override, e.g. `#2383ed`.
    #[serde(rename = "nodeColor", default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Fields not modelled above, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Node {
    pub fn new(id: NodeId, x: f64, y: f64) -> Self {
        Self {
            id,
            x,
            y,
            kind: String::new(),
            content: Value::Null,
            color: None,
            extra: Map::new(),
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn with_content(mut self, content: Value) -> Self {
        self.content = content;
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Build a node from an untrusted JSON record.
    ///
    /// Returns `None` unless the value is an object whose `id` is a number
    /// or string that coerces to an integer. Non-numeric `x`/`y` become 0.
    /// A `type` or `nodeColor` that is not a string is kept in `extra`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let raw_id = obj.get("id")?;
        if !(raw_id.is_number() || raw_id.is_string()) {
            return None;
        }
        let id = NodeId::coerce(raw_id)?;

        let mut node = Node::new(id, coord(obj.get("x")), coord(obj.get("y")));
        for (key, field) in obj {
            match (key.as_str(), field) {
                ("id" | "x" | "y", _) => {}
                ("type", Value::String(s)) => node.kind = s.clone(),
                ("content", v) => node.content = v.clone(),
                ("nodeColor", Value::String(s)) => node.color = Some(s.clone()),
                _ => {
                    node.extra.insert(key.clone(), field.clone());
                }
            }
        }
        Some(node)
    }
}

fn coord(value: Option<&Value>) -> f64 {
    value.and_then(Value::as_f64).unwrap_or(0.0)
}

// ─── Links ───────────────────────────────────────────────────────────────

/// A directed connection between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    pub source: NodeId,
    pub target: NodeId,
}

impl Link {
    pub const fn new(source: NodeId, target: NodeId) -> Self {
        Self { source, target }
    }
}

// ─── Calendar ────────────────────────────────────────────────────────────

/// Opaque calendar record. The calendar widget owns its shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalendarItem(pub Value);

// ─── Snapshot ────────────────────────────────────────────────────────────

/// Full workspace state at a point in time.
///
/// This is also the record layout written to local persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceSnapshot {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub calendar: Vec<CalendarItem>,
    #[serde(default = "identity_string")]
    pub transform: String,
}

fn identity_string() -> String {
    IDENTITY_TRANSFORM.to_string()
}

impl Default for WorkspaceSnapshot {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            links: Vec::new(),
            calendar: Vec::new(),
            transform: identity_string(),
        }
    }
}

impl WorkspaceSnapshot {
    pub fn new(nodes: Vec<Node>, links: Vec<Link>) -> Self {
        Self {
            nodes,
            links,
            ..Default::default()
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.links.is_empty() && self.calendar.is_empty()
    }
}

/// Largest identifier in `nodes`, or `None` for an empty slice.
pub fn max_id(nodes: &[Node]) -> Option<NodeId> {
    nodes.iter().map(|n| n.id).max()
}

// ─── Geometry ────────────────────────────────────────────────────────────

/// Axis-aligned bounding box over node positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Bounding box of the node positions, `None` when `nodes` is empty.
    pub fn of(nodes: &[Node]) -> Option<Self> {
        let mut iter = nodes.iter();
        let first = iter.next()?;
        let mut b = Bounds {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        for n in iter {
            b.min_x = b.min_x.min(n.x);
            b.min_y = b.min_y.min(n.y);
            b.max_x = b.max_x.max(n.x);
            b.max_y = b.max_y.max(n.y);
        }
        Some(b)
    }

    pub fn width(&self) -> f64 {
        (self.max_x - self.min_x).max(0.0)
    }

    pub fn height(&self) -> f64 {
        (self.max_y - self.min_y).max(0.0)
    }

    pub fn center_x(&self) -> f64 {
        (self.min_x + self.max_x) / 2.0
    }
}
