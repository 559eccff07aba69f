//! `window.localStorage` as a [`KeyValueStore`].

use ng_editor::{KeyValueStore, StoreError};
use wasm_bindgen::JsValue;
use web_sys::Storage;

/// Looks up `localStorage` on every call; private browsing and sandboxed
/// frames can make it disappear or throw.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStorage;

impl LocalStorage {
    fn storage() -> Result<Storage, StoreError> {
        web_sys::window()
            .ok_or(StoreError::Unavailable)?
            .local_storage()
            .map_err(|_| StoreError::Unavailable)?
            .ok_or(StoreError::Unavailable)
    }
}

pub(crate) fn js_error_text(err: &JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{err:?}"))
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Self::storage()?
            .get_item(key)
            .map_err(|_| StoreError::Unavailable)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|e| StoreError::WriteFailed {
                key: key.to_string(),
                reason: js_error_text(&e),
            })
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        Self::storage()?
            .remove_item(key)
            .map_err(|e| StoreError::WriteFailed {
                key: key.to_string(),
                reason: js_error_text(&e),
            })
    }
}
