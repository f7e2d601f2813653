//! Ordered, keyed extension registry.

use crate::error::{CoreError, CoreResult};
use crate::extension::ClientTransactionExtension;
use std::fmt;
use std::sync::Arc;

/// Extensions of a transaction in registration order.
///
/// Notifications iterate over a snapshot taken when the notification starts,
/// so extensions added or removed by a hook take part from the next
/// notification on.
#[derive(Clone, Default)]
pub struct ExtensionCollection {
    extensions: Vec<Arc<dyn ClientTransactionExtension>>,
}

impl ExtensionCollection {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an extension; fails if the key is already registered.
    pub fn add(&mut self, extension: Arc<dyn ClientTransactionExtension>) -> CoreResult<()> {
        if self.contains(extension.key()) {
            return Err(CoreError::invalid_operation(format!(
                "an extension with key '{}' is already registered",
                extension.key()
            )));
        }
        self.extensions.push(extension);
        Ok(())
    }

    /// Removes the extension with the key.
    pub fn remove(&mut self, key: &str) -> Option<Arc<dyn ClientTransactionExtension>> {
        let pos = self.extensions.iter().position(|e| e.key() == key)?;
        Some(self.extensions.remove(pos))
    }

    /// Returns the extension with the key.
    pub fn get(&self, key: &str) -> Option<&Arc<dyn ClientTransactionExtension>> {
        self.extensions.iter().find(|e| e.key() == key)
    }

    /// Returns true if an extension with the key is registered.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Keys in registration order.
    pub fn keys(&self) -> Vec<String> {
        self.extensions.iter().map(|e| e.key().to_string()).collect()
    }

    /// Returns the number of extensions.
    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    /// Returns true if no extension is registered.
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    pub(crate) fn snapshot(&self) -> Vec<Arc<dyn ClientTransactionExtension>> {
        self.extensions.clone()
    }
}

impl fmt::Debug for ExtensionCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);

    impl ClientTransactionExtension for Named {
        fn key(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn keeps_registration_order() {
        let mut extensions = ExtensionCollection::new();
        extensions.add(Arc::new(Named("b"))).unwrap();
        extensions.add(Arc::new(Named("a"))).unwrap();
        assert_eq!(extensions.keys(), vec!["b", "a"]);
    }

    #[test]
    fn rejects_duplicate_keys() {
        let mut extensions = ExtensionCollection::new();
        extensions.add(Arc::new(Named("a"))).unwrap();
        let err = extensions.add(Arc::new(Named("a"))).unwrap_err();
        assert!(matches!(err, CoreError::InvalidOperation { .. }));
        assert_eq!(extensions.len(), 1);
    }

    #[test]
    fn remove_by_key() {
        let mut extensions = ExtensionCollection::new();
        extensions.add(Arc::new(Named("a"))).unwrap();
        extensions.add(Arc::new(Named("b"))).unwrap();
        assert!(extensions.remove("a").is_some());
        assert!(extensions.remove("a").is_none());
        assert_eq!(extensions.keys(), vec!["b"]);
    }

    #[test]
    fn snapshot_is_independent() {
        let mut extensions = ExtensionCollection::new();
        extensions.add(Arc::new(Named("a"))).unwrap();
        let snapshot = extensions.snapshot();
        extensions.remove("a");
        assert_eq!(snapshot.len(), 1);
        assert!(extensions.is_empty());
    }
}
