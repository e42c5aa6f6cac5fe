//! Typed field access on top of the mapping interface.
//!
//! Any `serde` type can be stored under a key and read back. Conversion goes
//! through `serde_json::Value`, so the stored form is exactly what the
//! journal would write for the equivalent tree.

use docjournal_core::Value;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::document::DocumentStore;
use crate::error::{Error, Result};
use crate::proxy::MapMut;

/// Named-field access to a mapping.
pub trait Fields {
    /// Raw value of a field.
    fn field(&self, name: &str) -> Result<&Value>;

    /// Set a field from a tree value, returning the previous value.
    fn set_field(&mut self, name: &str, value: Value) -> Result<Option<Value>>;

    /// Read a field as `T`.
    fn get_as<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let json = serde_json::Value::from(self.field(name)?.clone());
        serde_json::from_value(json).map_err(|e| Error::Conversion(format!("{}: {}", name, e)))
    }

    /// Store `value` under a field.
    fn set_as<T: Serialize + ?Sized>(&mut self, name: &str, value: &T) -> Result<Option<Value>> {
        let json =
            serde_json::to_value(value).map_err(|e| Error::Conversion(format!("{}: {}", name, e)))?;
        self.set_field(name, Value::from(json))
    }
}

impl Fields for DocumentStore {
    fn field(&self, name: &str) -> Result<&Value> {
        self.get(name)
    }

    fn set_field(&mut self, name: &str, value: Value) -> Result<Option<Value>> {
        self.set(name, value)
    }
}

impl Fields for MapMut<'_> {
    fn field(&self, name: &str) -> Result<&Value> {
        self.get(name)
    }

    fn set_field(&mut self, name: &str, value: Value) -> Result<Option<Value>> {
        self.set(name, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Window {
        title: String,
        size: (u32, u32),
        maximized: bool,
    }

    #[test]
    fn test_typed_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("typed.state");
        let window = Window {
            title: "main".into(),
            size: (800, 600),
            maximized: false,
        };

        {
            let mut store = DocumentStore::open(&path).unwrap();
            store.set_as("window", &window).unwrap();
            store.set_as("volume", &0.75).unwrap();
            store.close().unwrap();
        }

        let store = DocumentStore::open(&path).unwrap();
        assert_eq!(store.get_as::<Window>("window").unwrap(), window);
        assert_eq!(store.get_as::<f64>("volume").unwrap(), 0.75);
    }

    #[test]
    fn test_typed_nested_field() {
        let dir = TempDir::new().unwrap();
        let mut store = DocumentStore::open(dir.path().join("nested.state")).unwrap();
        store.set("prefs", docjournal_core::Map::new()).unwrap();

        let mut prefs = store.map("prefs").unwrap();
        prefs.set_as("recent", &["a.txt", "b.txt"]).unwrap();
        assert_eq!(
            prefs.get_as::<Vec<String>>("recent").unwrap(),
            vec!["a.txt".to_string(), "b.txt".to_string()]
        );
    }

    #[test]
    fn test_conversion_error() {
        let dir = TempDir::new().unwrap();
        let mut store = DocumentStore::open(dir.path().join("bad.state")).unwrap();
        store.set("count", "many").unwrap();
        assert!(matches!(store.get_as::<i64>("count"), Err(Error::Conversion(_))));
        assert!(matches!(store.get_as::<i64>("absent"), Err(Error::MissingKey(_))));
    }
}
