//! Workspace export documents.
//!
//! The exported file is the snapshot plus an `exportedAt` timestamp and the
//! format `version`, pretty-printed with two-space indentation. Importing
//! it back through [`crate::validate::parse_import`] yields the same nodes,
//! links and calendar.

use crate::model::{CalendarItem, Link, Node, WorkspaceSnapshot};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::macros::format_description;

/// Version written into every export.
pub const FORMAT_VERSION: &str = "1.0.0";

/// The on-disk export format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
    pub calendar: Vec<CalendarItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<String>,
    pub exported_at: String,
    pub version: String,
}

impl ExportDocument {
    /// Build an export of `snapshot` stamped at `unix_millis`.
    ///
    /// An empty transform string is left out of the document.
    pub fn new(snapshot: &WorkspaceSnapshot, unix_millis: i64) -> Self {
        Self {
            nodes: snapshot.nodes.clone(),
            links: snapshot.links.clone(),
            calendar: snapshot.calendar.clone(),
            transform: Some(snapshot.transform.clone()).filter(|t| !t.is_empty()),
            exported_at: iso_timestamp(unix_millis),
            version: FORMAT_VERSION.to_string(),
        }
    }

    /// Pretty-printed JSON, two-space indentation.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// `nodegram-workspace-<id or "export">-<unixMillis>.json`
pub fn export_filename(workspace_id: Option<&str>, unix_millis: i64) -> String {
    let id = workspace_id.filter(|id| !id.is_empty()).unwrap_or("export");
    format!("nodegram-workspace-{id}-{unix_millis}.json")
}

/// ISO-8601 UTC timestamp with millisecond precision, e.g.
/// `2024-03-09T14:05:00.250Z`.
///
/// Out-of-range inputs clamp to the Unix epoch.
pub fn iso_timestamp(unix_millis: i64) -> String {
    let format =
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z");
    let at = OffsetDateTime::from_unix_timestamp_nanos(i128::from(unix_millis) * 1_000_000)
        .unwrap_or(OffsetDateTime::UNIX_EPOCH);
    at.format(format)
        .unwrap_or_else(|_| "1970-01-01T00:00:00.000Z".to_string())
}
