use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{error::Result, store::SessionData};

fn flash_key(name: &str) -> String {
    format!("__flash_{name}__")
}

#[derive(Debug, Default)]
struct Inner {
    id: String,
    data: SessionData,
    modified: bool,
}

/// Session state for a single request.
///
/// Clones share the same state, so the copy placed in request extensions and the one kept by
/// the middleware observe each other's changes.
#[derive(Debug, Clone, Default)]
pub struct Session {
    inner: Arc<Mutex<Inner>>,
}

impl Session {
    /// A session that has not been persisted yet.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(id: String, data: SessionData) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                id,
                data,
                modified: false,
            })),
        }
    }

    /// Storage ID, empty until the session is first committed to a store.
    pub fn id(&self) -> String {
        self.inner.lock().id.clone()
    }

    pub(crate) fn set_id(&self, id: String) {
        self.inner.lock().id = id;
    }

    pub fn data(&self) -> SessionData {
        self.inner.lock().data.clone()
    }

    pub fn has(&self, name: &str) -> bool {
        let inner = self.inner.lock();
        inner.data.contains_key(name) || inner.data.contains_key(&flash_key(name))
    }

    /// Reads `name`, falling back to a flashed value. Reading a flashed value removes it.
    pub fn get_value(&self, name: &str) -> Option<Value> {
        let mut inner = self.inner.lock();
        if let Some(value) = inner.data.get(name) {
            return Some(value.clone());
        }

        let flashed = inner.data.remove(&flash_key(name));
        if flashed.is_some() {
            inner.modified = true;
        }
        flashed
    }

    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        self.get_value(name)
            .map(serde_json::from_value)
            .transpose()
            .map_err(Into::into)
    }

    pub fn set<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        let mut inner = self.inner.lock();
        if inner.data.get(name) != Some(&value) {
            inner.data.insert(name.to_owned(), value);
            inner.modified = true;
        }
        Ok(())
    }

    /// Stores a value that is readable exactly once through [`Session::get`].
    pub fn flash<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<()> {
        self.set(&flash_key(name), value)
    }

    pub fn unset(&self, name: &str) -> Option<Value> {
        let mut inner = self.inner.lock();
        let removed = inner.data.remove(name);
        if removed.is_some() {
            inner.modified = true;
        }
        removed
    }

    /// Removes every value. A cleared session is destroyed by the middleware.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        if !inner.data.is_empty() {
            inner.data.clear();
            inner.modified = true;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().data.is_empty()
    }

    pub fn is_modified(&self) -> bool {
        self.inner.lock().modified
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn set_get_unset() {
        let session = Session::new();
        assert!(session.is_empty());
        assert!(!session.is_modified());

        session.set("n", &1).expect("set succeeds");
        assert_eq!(session.get::<usize>("n").expect("get succeeds"), Some(1));
        assert!(session.has("n"));
        assert!(session.is_modified());

        assert_eq!(session.unset("n"), Some(json!(1)));
        assert!(session.is_empty());
    }

    #[test]
    fn flash_is_read_once() {
        let session = Session::from_parts("id".into(), SessionData::new());
        session.flash("notice", "saved").expect("flash succeeds");

        assert!(session.has("notice"));
        assert_eq!(
            session.get::<String>("notice").expect("get succeeds"),
            Some("saved".into())
        );
        assert_eq!(session.get_value("notice"), None);
        assert!(!session.has("notice"));
    }

    #[test]
    fn reading_flash_marks_modified() {
        let mut data = SessionData::new();
        data.insert(flash_key("notice"), json!("hi"));
        let session = Session::from_parts("id".into(), data);
        assert!(!session.is_modified());

        assert_eq!(session.get_value("notice"), Some(json!("hi")));
        assert!(session.is_modified());
    }

    #[test]
    fn rewriting_the_same_value_is_not_a_modification() {
        let mut data = SessionData::new();
        data.insert("n".into(), json!(1));
        let session = Session::from_parts("id".into(), data);

        session.set("n", &1).expect("set succeeds");
        assert!(!session.is_modified());

        session.set("n", &2).expect("set succeeds");
        assert!(session.is_modified());
    }

    #[test]
    fn clones_share_state() {
        let session = Session::new();
        let clone = session.clone();
        clone.set("k", "v").expect("set succeeds");

        assert_eq!(session.get_value("k"), Some(json!("v")));
        session.clear();
        assert!(clone.is_empty());
    }

    #[test]
    fn wrong_type_is_an_error() {
        let session = Session::new();
        session.set("n", "not a number").expect("set succeeds");

        assert!(session.get::<u32>("n").is_err());
    }
}
