//! Client transactions.
//!
//! A [`ClientTransaction`] owns the in-memory state of every domain object it
//! loads or creates. Changes stay local until [`ClientTransaction::commit`]
//! validates them and writes them to the data source in one batch.
//!
//! ```rust,ignore
//! let mut tx = ClientTransaction::builder(mapping)
//!     .storage(storage)
//!     .build()?;
//!
//! let order = tx.get_object(&order_id)?.id().clone();
//! tx.set_value(&order, "OrderNumber", 42)?;
//! tx.set_related_object(&order, "Customer", Some(&customer_id))?;
//! tx.commit()?;
//! ```

mod command;
mod commit;
mod objects;
mod properties;
mod queries;
mod relations;
mod source;
mod sub;

pub use sub::SubTransactionRejected;

use crate::config::Config;
use crate::data::{DataContainer, DataManager};
use crate::error::{CoreError, CoreResult};
use crate::extension::{ClientTransactionExtension, ExtensionCollection};
use crate::mapping::MappingConfiguration;
use crate::object::ObjectId;
use crate::stats::TransactionStats;
use crate::storage::StorageProvider;
use crate::types::{ObjectState, TransactionId};
use crate::validation::{CommitValidator, PersistableDataValidator};
use source::DataSource;
use std::fmt;
use std::sync::Arc;

/// Unit of work over a graph of domain objects.
///
/// Every operation takes `&mut self`; a transaction is used by one thread at a
/// time. Sub-transactions take ownership of their parent until discarded.
pub struct ClientTransaction {
    id: TransactionId,
    config: Config,
    mapping: Arc<MappingConfiguration>,
    source: DataSource,
    data: DataManager,
    extensions: ExtensionCollection,
    validator: CommitValidator,
    stats: TransactionStats,
    depth: usize,
}

impl ClientTransaction {
    /// Starts building a root transaction.
    pub fn builder(mapping: Arc<MappingConfiguration>) -> TransactionBuilder {
        TransactionBuilder::new(mapping)
    }

    /// Creates a root transaction with the default configuration and no extensions.
    pub fn new(mapping: Arc<MappingConfiguration>, storage: Arc<dyn StorageProvider>) -> Self {
        let tx = Self::with_source(
            mapping,
            DataSource::Storage(storage),
            Config::default(),
            ExtensionCollection::new(),
            None,
            0,
        );
        tx.initialized();
        tx
    }

    fn with_source(
        mapping: Arc<MappingConfiguration>,
        source: DataSource,
        config: Config,
        extensions: ExtensionCollection,
        validator: Option<CommitValidator>,
        depth: usize,
    ) -> Self {
        let validator = validator.unwrap_or_else(|| CommitValidator::from_config(&config));
        Self {
            id: TransactionId::next(),
            config,
            mapping,
            source,
            data: DataManager::new(),
            extensions,
            validator,
            stats: TransactionStats::new(),
            depth,
        }
    }

    fn initialized(&self) {
        tracing::debug!(transaction = %self.id, depth = self.depth, "client transaction started");
        self.notify(|extension, tx| extension.transaction_initialize(tx));
    }

    /// Returns the transaction ID.
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the mapping.
    pub fn mapping(&self) -> &Arc<MappingConfiguration> {
        &self.mapping
    }

    /// Returns the transaction statistics.
    pub fn stats(&self) -> &TransactionStats {
        &self.stats
    }

    /// Returns the registered extensions.
    pub fn extensions(&self) -> &ExtensionCollection {
        &self.extensions
    }

    /// Registers an extension; it receives every later notification.
    pub fn add_extension(&mut self, extension: Arc<dyn ClientTransactionExtension>) -> CoreResult<()> {
        self.extensions.add(extension)
    }

    /// Removes an extension by key.
    pub fn remove_extension(&mut self, key: &str) -> Option<Arc<dyn ClientTransactionExtension>> {
        self.extensions.remove(key)
    }

    /// Returns the state of an object in this transaction.
    pub fn state(&self, id: &ObjectId) -> ObjectState {
        self.data.state(id)
    }

    /// Returns true if the object is loaded or was created in this transaction.
    pub fn is_loaded(&self, id: &ObjectId) -> bool {
        self.data.contains(id)
    }

    /// Returns true if the object was discarded or its deletion committed.
    pub fn is_invalid(&self, id: &ObjectId) -> bool {
        self.data.is_invalid(id)
    }

    /// Returns the data of a loaded object without loading it.
    pub fn data_container(&self, id: &ObjectId) -> Option<&DataContainer> {
        self.data.container(id)
    }

    /// Loaded objects in registration order.
    pub fn loaded_object_ids(&self) -> Vec<ObjectId> {
        self.data.loaded_ids()
    }

    /// New, Changed and Deleted objects in registration order.
    pub fn changed_object_ids(&self) -> Vec<ObjectId> {
        self.data.changed_ids()
    }

    /// Returns true if a commit would write anything.
    pub fn has_changed(&self) -> bool {
        !self.data.changed_ids().is_empty()
    }

    /// Returns the parent of a sub-transaction.
    pub fn parent(&self) -> Option<&ClientTransaction> {
        self.source.parent()
    }

    /// Returns true for sub-transactions.
    pub fn is_sub_transaction(&self) -> bool {
        self.depth > 0
    }

    /// Nesting depth; 0 for root transactions.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Calls an after-hook on a snapshot of the extensions.
    pub(crate) fn notify(&self, hook: impl Fn(&dyn ClientTransactionExtension, &ClientTransaction)) {
        for extension in self.extensions.snapshot() {
            hook(extension.as_ref(), self);
        }
    }

    /// Calls a before-hook on a snapshot of the extensions; the first error cancels.
    pub(crate) fn notify_before(
        &self,
        hook: impl Fn(&dyn ClientTransactionExtension, &ClientTransaction) -> CoreResult<()>,
    ) -> CoreResult<()> {
        for extension in self.extensions.snapshot() {
            hook(extension.as_ref(), self)?;
        }
        Ok(())
    }

    /// Calls a before-hook that may modify the transaction.
    pub(crate) fn notify_before_mut(
        &mut self,
        hook: impl Fn(&dyn ClientTransactionExtension, &mut ClientTransaction) -> CoreResult<()>,
    ) -> CoreResult<()> {
        for extension in self.extensions.snapshot() {
            hook(extension.as_ref(), self)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ClientTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientTransaction")
            .field("id", &self.id)
            .field("depth", &self.depth)
            .field("loaded", &self.data.loaded_ids().len())
            .field("extensions", &self.extensions)
            .finish_non_exhaustive()
    }
}

/// Builder for root [`ClientTransaction`]s.
pub struct TransactionBuilder {
    mapping: Arc<MappingConfiguration>,
    storage: Option<Arc<dyn StorageProvider>>,
    config: Config,
    extensions: Vec<Arc<dyn ClientTransactionExtension>>,
    validators: Vec<Arc<dyn PersistableDataValidator>>,
}

impl TransactionBuilder {
    fn new(mapping: Arc<MappingConfiguration>) -> Self {
        Self {
            mapping,
            storage: None,
            config: Config::default(),
            extensions: Vec::new(),
            validators: Vec::new(),
        }
    }

    /// Sets the storage provider.
    #[must_use]
    pub fn storage(mut self, storage: Arc<dyn StorageProvider>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Registers an extension.
    #[must_use]
    pub fn extension(mut self, extension: Arc<dyn ClientTransactionExtension>) -> Self {
        self.extensions.push(extension);
        self
    }

    /// Adds a commit validator after the built-in ones.
    #[must_use]
    pub fn validator(mut self, validator: Arc<dyn PersistableDataValidator>) -> Self {
        self.validators.push(validator);
        self
    }

    /// Builds the transaction and notifies `transaction_initialize`.
    pub fn build(self) -> CoreResult<ClientTransaction> {
        let storage = self
            .storage
            .ok_or_else(|| CoreError::invalid_operation("a root transaction needs a storage provider"))?;
        let mut extensions = ExtensionCollection::new();
        for extension in self.extensions {
            extensions.add(extension)?;
        }
        let mut validator = CommitValidator::from_config(&self.config);
        for extra in self.validators {
            validator = validator.with_shared(extra);
        }
        let tx = ClientTransaction::with_source(
            self.mapping,
            DataSource::Storage(storage),
            self.config,
            extensions,
            Some(validator),
            0,
        );
        tx.initialized();
        Ok(tx)
    }
}

impl fmt::Debug for TransactionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionBuilder")
            .field("config", &self.config)
            .field("extensions", &self.extensions.len())
            .finish_non_exhaustive()
    }
}
