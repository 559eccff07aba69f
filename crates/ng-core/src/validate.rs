//! Import validation for workspace documents.
//!
//! Imported files are untrusted. [`validate_import`] runs the whole
//! fail-closed pipeline: shape check, size/count policy, normalization,
//! identifier uniqueness and link integrity. Either the full document is
//! accepted or nothing is. [`normalize_workspace`] is the lenient half on
//! its own, used for records the editor wrote itself.

use crate::id::NodeId;
use crate::model::{CalendarItem, Link, Node, WorkspaceSnapshot};
use crate::transform::IDENTITY_TRANSFORM;
use serde_json::{Map, Value};
use smallvec::SmallVec;
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// How many offending entries an error message lists.
pub const MAX_REPORTED: usize = 5;

// ─── Limits ──────────────────────────────────────────────────────────────

/// Size and count policy for imported documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportLimits {
    /// Maximum length of the compact JSON encoding, in bytes.
    pub max_bytes: usize,
    pub max_nodes: usize,
    pub max_links: usize,
    pub max_calendar: usize,
}

impl Default for ImportLimits {
    fn default() -> Self {
        Self {
            max_bytes: 5 * 1024 * 1024,
            max_nodes: 1000,
            max_links: 2000,
            max_calendar: 500,
        }
    }
}

// ─── Errors ──────────────────────────────────────────────────────────────

/// A bounded sample of offending entries plus how many were left out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample<T> {
    pub items: SmallVec<[T; MAX_REPORTED]>,
    pub omitted: usize,
}

impl<T> Sample<T> {
    fn from_all(all: Vec<T>) -> Self {
        let omitted = all.len().saturating_sub(MAX_REPORTED);
        Self {
            items: all.into_iter().take(MAX_REPORTED).collect(),
            omitted,
        }
    }

    pub fn total(&self) -> usize {
        self.items.len() + self.omitted
    }
}

impl<T: fmt::Display> fmt::Display for Sample<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{item}")?;
        }
        if self.omitted > 0 {
            f.write_str("...")?;
        }
        Ok(())
    }
}

/// Why an import was refused. No variant leaves partial state behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    #[error("Invalid file format: {0}")]
    Malformed(String),
    #[error("Import data too large (max {}MB)", .max / (1024 * 1024))]
    TooLarge { size: usize, max: usize },
    #[error("Too many {what} (max {max})")]
    TooMany {
        what: &'static str,
        count: usize,
        max: usize,
    },
    #[error("Duplicate node IDs found: {0}")]
    DuplicateIds(Sample<NodeId>),
    #[error("Invalid links found: {0}")]
    InvalidLinks(Sample<String>),
}

// ─── Lenient normalization ───────────────────────────────────────────────

/// Normalize an untrusted JSON value into a snapshot.
///
/// - non-object input is `Malformed`;
/// - nodes need an object with a number/string `id` that coerces;
/// - links need number/string endpoints (ones that do not coerce are dropped);
/// - `calendar` passes through only when it is an array;
/// - `transform` passes through only when it is a string.
pub fn normalize_workspace(value: &Value) -> Result<WorkspaceSnapshot, ImportError> {
    let obj = as_document(value)?;
    let links = raw_links(obj)
        .filter_map(|(s, t)| Some(Link::new(NodeId::coerce(s)?, NodeId::coerce(t)?)))
        .collect();
    Ok(WorkspaceSnapshot {
        nodes: normalize_nodes(obj),
        links,
        calendar: normalize_calendar(obj),
        transform: normalize_transform(obj),
    })
}

fn as_document(value: &Value) -> Result<&Map<String, Value>, ImportError> {
    value
        .as_object()
        .ok_or_else(|| ImportError::Malformed("expected a JSON object".into()))
}

fn array<'a>(obj: &'a Map<String, Value>, key: &str) -> &'a [Value] {
    obj.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn normalize_nodes(obj: &Map<String, Value>) -> Vec<Node> {
    array(obj, "nodes")
        .iter()
        .filter_map(Node::from_value)
        .collect()
}

/// Link records whose endpoints are both numbers or strings.
fn raw_links(obj: &Map<String, Value>) -> impl Iterator<Item = (&Value, &Value)> {
    array(obj, "links").iter().filter_map(|link| {
        let link = link.as_object()?;
        let source = link.get("source").filter(|v| is_key(v))?;
        let target = link.get("target").filter(|v| is_key(v))?;
        Some((source, target))
    })
}

fn is_key(value: &Value) -> bool {
    value.is_number() || value.is_string()
}

fn normalize_calendar(obj: &Map<String, Value>) -> Vec<CalendarItem> {
    array(obj, "calendar")
        .iter()
        .cloned()
        .map(CalendarItem)
        .collect()
}

fn normalize_transform(obj: &Map<String, Value>) -> String {
    match obj.get("transform") {
        Some(Value::String(s)) => s.clone(),
        _ => IDENTITY_TRANSFORM.to_string(),
    }
}

// ─── Policy ──────────────────────────────────────────────────────────────

/// Enforce the size and count policy on the raw document.
///
/// Counts are taken on the raw arrays, before any entry is filtered out.
pub fn check_limits(value: &Value, limits: &ImportLimits) -> Result<(), ImportError> {
    let obj = as_document(value)?;

    let size = serde_json::to_string(value)
        .map_err(|e| ImportError::Malformed(e.to_string()))?
        .len();
    if size > limits.max_bytes {
        return Err(ImportError::TooLarge {
            size,
            max: limits.max_bytes,
        });
    }

    for (key, what, max) in [
        ("nodes", "nodes", limits.max_nodes),
        ("links", "links", limits.max_links),
        ("calendar", "calendar events", limits.max_calendar),
    ] {
        let count = array(obj, key).len();
        if count > max {
            return Err(ImportError::TooMany { what, count, max });
        }
    }
    Ok(())
}

// ─── Strict import ───────────────────────────────────────────────────────

/// Validate an imported document end to end.
///
/// Unlike [`normalize_workspace`], a link whose endpoint does not coerce or
/// does not name an accepted node fails the whole import.
pub fn validate_import(
    value: &Value,
    limits: &ImportLimits,
) -> Result<WorkspaceSnapshot, ImportError> {
    let obj = as_document(value)?;
    check_limits(value, limits)?;

    let nodes = normalize_nodes(obj);

    let mut seen = HashSet::with_capacity(nodes.len());
    let duplicates: Vec<NodeId> = nodes
        .iter()
        .filter(|n| !seen.insert(n.id))
        .map(|n| n.id)
        .collect();
    if !duplicates.is_empty() {
        log::debug!("import rejected: {} duplicate node ids", duplicates.len());
        return Err(ImportError::DuplicateIds(Sample::from_all(duplicates)));
    }

    let mut links = Vec::new();
    let mut invalid = Vec::new();
    for (source, target) in raw_links(obj) {
        let resolved = NodeId::coerce(source)
            .zip(NodeId::coerce(target))
            .filter(|(s, t)| seen.contains(s) && seen.contains(t));
        match resolved {
            Some((s, t)) => links.push(Link::new(s, t)),
            None => invalid.push(format!("{}->{}", endpoint(source), endpoint(target))),
        }
    }
    if !invalid.is_empty() {
        log::debug!("import rejected: {} dangling links", invalid.len());
        return Err(ImportError::InvalidLinks(Sample::from_all(invalid)));
    }

    Ok(WorkspaceSnapshot {
        nodes,
        links,
        calendar: normalize_calendar(obj),
        transform: normalize_transform(obj),
    })
}

/// Decode JSON text and validate it with [`validate_import`].
pub fn parse_import(text: &str, limits: &ImportLimits) -> Result<WorkspaceSnapshot, ImportError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| ImportError::Malformed(e.to_string()))?;
    validate_import(&value, limits)
}

/// Render a raw endpoint the way it appeared in the file.
fn endpoint(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
