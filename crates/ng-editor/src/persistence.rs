//! Workspace snapshots in a key-value store.
//!
//! Each workspace is one JSON record under `_ng_workspace_<wid>`. The
//! last-active marker `_sn_c` remembers which workspace to reopen and
//! whether it was an own (`<wid>_ng_hwl`) or shared (`<wid>_ng_hwli`) one.
//! Writes are last-writer-wins; there is no cross-key transaction.

use crate::store::{KeyValueStore, StoreError};
use ng_core::{WorkspaceSnapshot, normalize_workspace};
use serde_json::Value;

pub const WORKSPACE_KEY_PREFIX: &str = "_ng_workspace_";
pub const ACTIVE_KEY: &str = "_sn_c";

const ACTIVE_SEPARATOR: &str = "_ng_";
const OWN_MARKER: &str = "hwl";
const SHARED_MARKER: &str = "hwli";

/// The workspace recorded by the last-active marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveWorkspace {
    pub wid: String,
    pub shared: bool,
}

impl ActiveWorkspace {
    pub fn new(wid: impl Into<String>, shared: bool) -> Self {
        Self {
            wid: wid.into(),
            shared,
        }
    }

    fn encode(&self) -> String {
        let marker = if self.shared { SHARED_MARKER } else { OWN_MARKER };
        format!("{}{ACTIVE_SEPARATOR}{marker}", self.wid)
    }

    /// Everything before the first `_ng_` is the identifier. A blank
    /// identifier means no usable marker.
    fn decode(raw: &str) -> Option<Self> {
        let (wid, marker) = raw.split_once(ACTIVE_SEPARATOR).unwrap_or((raw, ""));
        if wid.is_empty() {
            return None;
        }
        Some(Self::new(wid, marker == SHARED_MARKER))
    }
}

/// Serializes workspace snapshots to and from a [`KeyValueStore`].
#[derive(Debug)]
pub struct WorkspacePersistence<S> {
    store: S,
}

impl<S: KeyValueStore> WorkspacePersistence<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn workspace_key(wid: &str) -> String {
        format!("{WORKSPACE_KEY_PREFIX}{wid}")
    }

    /// Write `snapshot` as the stored record of `wid`.
    pub fn save(&mut self, wid: &str, snapshot: &WorkspaceSnapshot) -> Result<(), StoreError> {
        let key = Self::workspace_key(wid);
        let json = serde_json::to_string(snapshot).map_err(|e| StoreError::WriteFailed {
            key: key.clone(),
            reason: e.to_string(),
        })?;
        self.store.set(&key, &json)?;
        log::debug!(
            "saved workspace {wid}: {} nodes, {} links, {} bytes",
            snapshot.nodes.len(),
            snapshot.links.len(),
            json.len()
        );
        Ok(())
    }

    /// Last saved snapshot of `wid`, or `None` when nothing is stored.
    ///
    /// Records go through the lenient normalization, so hand-edited or older
    /// records load as long as they are JSON objects.
    pub fn load(&self, wid: &str) -> Result<Option<WorkspaceSnapshot>, StoreError> {
        let key = Self::workspace_key(wid);
        let Some(raw) = self.store.get(&key)? else {
            return Ok(None);
        };
        let corrupt = |reason: String| StoreError::Corrupt {
            key: key.clone(),
            reason,
        };
        let value: Value = serde_json::from_str(&raw).map_err(|e| corrupt(e.to_string()))?;
        let snapshot = normalize_workspace(&value).map_err(|e| corrupt(e.to_string()))?;
        Ok(Some(snapshot))
    }

    /// Save `snapshot` only if `wid` has no record yet. Returns whether it
    /// wrote.
    pub fn seed(&mut self, wid: &str, snapshot: &WorkspaceSnapshot) -> Result<bool, StoreError> {
        if self.store.get(&Self::workspace_key(wid))?.is_some() {
            return Ok(false);
        }
        self.save(wid, snapshot)?;
        Ok(true)
    }

    /// Record `wid` as the workspace to reopen next time.
    pub fn set_active(&mut self, wid: &str, shared: bool) -> Result<(), StoreError> {
        self.store
            .set(ACTIVE_KEY, &ActiveWorkspace::new(wid, shared).encode())
    }

    pub fn active(&self) -> Result<Option<ActiveWorkspace>, StoreError> {
        Ok(self
            .store
            .get(ACTIVE_KEY)?
            .as_deref()
            .and_then(ActiveWorkspace::decode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use ng_core::{Link, Node, NodeId};
    use pretty_assertions::assert_eq;

    fn sample() -> WorkspaceSnapshot {
        let mut snap = WorkspaceSnapshot::new(
            vec![
                Node::new(NodeId(1), 0.0, 0.0).with_kind("task"),
                Node::new(NodeId(2), 40.0, 10.0),
            ],
            vec![Link::new(NodeId(1), NodeId(2))],
        );
        snap.transform = "translate(5,5) scale(2)".into();
        snap
    }

    #[test]
    fn save_then_load() {
        let mut p = WorkspacePersistence::new(MemoryStore::new());
        assert_eq!(p.load("w1"), Ok(None));
        p.save("w1", &sample()).unwrap();
        assert_eq!(p.load("w1"), Ok(Some(sample())));
        assert!(p.store().get("_ng_workspace_w1").unwrap().is_some());
    }

    #[test]
    fn load_normalizes_legacy_records() {
        let mut store = MemoryStore::new();
        store
            .set(
                "_ng_workspace_old",
                r#"{"nodes":[{"id":"7","x":"?"},{"name":"orphan"}],"links":[{"source":7,"target":"7"}]}"#,
            )
            .unwrap();
        let p = WorkspacePersistence::new(store);
        let snap = p.load("old").unwrap().unwrap();
        assert_eq!(snap.nodes, vec![Node::new(NodeId(7), 0.0, 0.0)]);
        assert_eq!(snap.links, vec![Link::new(NodeId(7), NodeId(7))]);
        assert_eq!(snap.transform, ng_core::IDENTITY_TRANSFORM);
    }

    #[test]
    fn load_reports_corrupt_records() {
        let mut store = MemoryStore::new();
        store.set("_ng_workspace_bad", "{not json").unwrap();
        store.set("_ng_workspace_arr", "[1,2]").unwrap();
        let p = WorkspacePersistence::new(store);
        assert!(matches!(p.load("bad"), Err(StoreError::Corrupt { .. })));
        assert!(matches!(p.load("arr"), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn seed_does_not_overwrite() {
        let mut p = WorkspacePersistence::new(MemoryStore::new());
        assert_eq!(p.seed("w", &sample()), Ok(true));
        assert_eq!(p.seed("w", &WorkspaceSnapshot::default()), Ok(false));
        assert_eq!(p.load("w").unwrap(), Some(sample()));
    }

    #[test]
    fn active_marker_encoding() {
        let mut p = WorkspacePersistence::new(MemoryStore::new());
        assert_eq!(p.active(), Ok(None));

        p.set_active("abc123", false).unwrap();
        assert_eq!(
            p.store().get(ACTIVE_KEY).unwrap().as_deref(),
            Some("abc123_ng_hwl")
        );
        assert_eq!(p.active(), Ok(Some(ActiveWorkspace::new("abc123", false))));

        p.set_active("abc123", true).unwrap();
        assert_eq!(
            p.store().get(ACTIVE_KEY).unwrap().as_deref(),
            Some("abc123_ng_hwli")
        );
        assert_eq!(p.active(), Ok(Some(ActiveWorkspace::new("abc123", true))));
    }

    #[test]
    fn active_marker_without_suffix_or_id() {
        let mut p = WorkspacePersistence::new(MemoryStore::new());
        p.store_mut().set(ACTIVE_KEY, "plainwid").unwrap();
        assert_eq!(p.active(), Ok(Some(ActiveWorkspace::new("plainwid", false))));
        p.store_mut().set(ACTIVE_KEY, "_ng_hwl").unwrap();
        assert_eq!(p.active(), Ok(None));
    }

    #[test]
    fn failed_write_surfaces_error() {
        let mut p = WorkspacePersistence::new(MemoryStore::with_quota(16));
        let err = p.save("w", &sample()).unwrap_err();
        assert!(matches!(err, StoreError::WriteFailed { .. }));
        assert_eq!(p.load("w"), Ok(None));
    }
}
