//! Loading, creating, deleting and unloading objects.

use crate::data::{DataContainer, EndPointData};
use crate::error::{CoreError, CoreResult};
use crate::object::{DomainObject, ObjectId};
use crate::transaction::source::SourceObject;
use crate::transaction::ClientTransaction;
use crate::types::ObjectState;
use std::collections::HashSet;
use std::sync::Arc;

impl ClientTransaction {
    /// Returns a loaded object, loading it from the data source if necessary.
    ///
    /// Fails with [`CoreError::ObjectNotFound`] if the data source does not
    /// know the object and with [`CoreError::ObjectInvalid`] if it was
    /// discarded or its deletion committed.
    pub fn get_object(&mut self, id: &ObjectId) -> CoreResult<&DataContainer> {
        self.ensure_loaded(id)?;
        self.data
            .container(id)
            .ok_or_else(|| CoreError::object_not_found(id))
    }

    /// Like [`get_object`](Self::get_object), but returns `Ok(None)` for unknown objects.
    pub fn try_get_object(&mut self, id: &ObjectId) -> CoreResult<Option<&DataContainer>> {
        if self.data.is_invalid(id) {
            return Err(CoreError::object_invalid(id));
        }
        if !self.data.contains(id) {
            self.load_objects(std::slice::from_ref(id), false)?;
        }
        Ok(self.data.container(id))
    }

    /// Loads several objects with one pair of load notifications.
    pub fn get_objects(&mut self, ids: &[ObjectId]) -> CoreResult<Vec<&DataContainer>> {
        self.load_objects(ids, true)?;
        ids.iter()
            .map(|id| {
                self.data
                    .container(id)
                    .ok_or_else(|| CoreError::object_not_found(id))
            })
            .collect()
    }

    /// Returns a typed handle, loading the object if necessary.
    pub fn get<T: DomainObject>(&mut self, id: &ObjectId) -> CoreResult<T> {
        if id.class_id() != T::CLASS_ID {
            return Err(CoreError::invalid_operation(format!(
                "object '{id}' is not of class '{}'",
                T::CLASS_ID
            )));
        }
        self.ensure_loaded(id)?;
        Ok(T::from_id(id.clone()))
    }

    /// Creates a new object of the class with default values and empty relations.
    pub fn new_object(&mut self, class_id: &str) -> CoreResult<ObjectId> {
        let mapping = Arc::clone(&self.mapping);
        let class = mapping.class(class_id)?;
        self.notify_before(|extension, tx| extension.new_object_creating(tx, class_id))?;

        let id = ObjectId::new(class_id);
        self.data.register(DataContainer::new_object(id.clone(), class));
        for end_point in class.virtual_end_points() {
            self.data.insert_end_point(
                &id,
                end_point.property_name(),
                EndPointData::empty(end_point.is_collection()),
            );
        }
        self.stats.record_created();
        tracing::trace!(transaction = %self.id, object = %id, "new object created");
        Ok(id)
    }

    /// Creates a new object and returns its typed handle.
    pub fn create<T: DomainObject>(&mut self) -> CoreResult<T> {
        self.new_object(T::CLASS_ID).map(T::from_id)
    }

    /// Marks an object as deleted.
    ///
    /// Deleting does not touch related objects; references to the deleted
    /// object must be removed by the caller. Deleting a deleted object does
    /// nothing.
    pub fn delete(&mut self, id: &ObjectId) -> CoreResult<()> {
        self.ensure_loaded(id)?;
        if self.data.state(id) == ObjectState::Deleted {
            return Ok(());
        }
        self.notify_before(|extension, tx| extension.object_deleting(tx, id))?;
        if let Some(container) = self.data.container_mut(id) {
            container.mark_deleted();
        }
        tracing::trace!(transaction = %self.id, object = %id, "object deleted");
        self.notify(|extension, tx| extension.object_deleted(tx, id));
        Ok(())
    }

    /// Removes an unchanged object from the transaction.
    ///
    /// Returns `false` if the object was not loaded. The next access loads
    /// it again from the data source.
    pub fn unload_object(&mut self, id: &ObjectId) -> CoreResult<bool> {
        match self.data.state(id) {
            ObjectState::Invalid => return Err(CoreError::object_invalid(id)),
            ObjectState::NotLoadedYet => return Ok(false),
            ObjectState::Unchanged => {}
            state => {
                return Err(CoreError::invalid_operation(format!(
                    "object '{id}' cannot be unloaded in state {state}"
                )));
            }
        }
        let ids = [id.clone()];
        self.notify_before(|extension, tx| extension.objects_unloading(tx, &ids))?;
        self.data.unload(id);
        tracing::trace!(transaction = %self.id, object = %id, "object unloaded");
        self.notify(|extension, tx| extension.objects_unloaded(tx, &ids));
        Ok(true)
    }

    pub(crate) fn ensure_loaded(&mut self, id: &ObjectId) -> CoreResult<()> {
        if self.data.is_invalid(id) {
            return Err(CoreError::object_invalid(id));
        }
        if self.data.contains(id) {
            return Ok(());
        }
        self.load_objects(std::slice::from_ref(id), true)
    }

    /// Loads an object that takes part in a relation change on the opposite side.
    ///
    /// Returns `false` if the object is invalid or does not exist; stale
    /// references to such objects are dropped without touching them.
    pub(crate) fn load_partner(&mut self, id: &ObjectId) -> CoreResult<bool> {
        if self.data.is_invalid(id) {
            return Ok(false);
        }
        if !self.data.contains(id) {
            self.load_objects(std::slice::from_ref(id), false)?;
        }
        Ok(self.data.contains(id))
    }

    /// Fails unless the object is loaded and not deleted.
    pub(crate) fn ensure_writable(&mut self, id: &ObjectId) -> CoreResult<()> {
        self.ensure_loaded(id)?;
        if self.data.state(id) == ObjectState::Deleted {
            return Err(CoreError::object_deleted(id));
        }
        Ok(())
    }

    fn load_objects(&mut self, ids: &[ObjectId], fail_if_missing: bool) -> CoreResult<()> {
        let mut seen = HashSet::new();
        let mut pending = Vec::new();
        for id in ids {
            if self.data.is_invalid(id) {
                return Err(CoreError::object_invalid(id));
            }
            if !self.data.contains(id) && seen.insert(id) {
                self.mapping.class(id.class_id())?;
                pending.push(id.clone());
            }
        }
        if pending.is_empty() {
            return Ok(());
        }

        self.notify_before(|extension, tx| extension.objects_loading(tx, &pending))?;
        let mut containers = Vec::with_capacity(pending.len());
        for id in &pending {
            match self.source.load(id)? {
                SourceObject::Found(container) => containers.push(container),
                SourceObject::NotFound if fail_if_missing => {
                    return Err(CoreError::object_not_found(id));
                }
                SourceObject::NotFound => {}
                SourceObject::Invalid => {
                    self.data.invalidate(id);
                    return Err(CoreError::object_invalid(id));
                }
            }
        }
        self.finish_load(containers);
        Ok(())
    }

    /// Registers containers fetched by a query or relation load.
    ///
    /// Objects that are already loaded keep their in-transaction state.
    pub(crate) fn register_loaded(&mut self, containers: Vec<DataContainer>) -> CoreResult<()> {
        let mut seen = HashSet::new();
        let containers: Vec<DataContainer> = containers
            .into_iter()
            .filter(|c| {
                !self.data.contains(c.id())
                    && !self.data.is_invalid(c.id())
                    && seen.insert(c.id().clone())
            })
            .collect();
        if containers.is_empty() {
            return Ok(());
        }
        let ids: Vec<ObjectId> = containers.iter().map(|c| c.id().clone()).collect();
        self.notify_before(|extension, tx| extension.objects_loading(tx, &ids))?;
        self.finish_load(containers);
        Ok(())
    }

    fn finish_load(&mut self, containers: Vec<DataContainer>) {
        if containers.is_empty() {
            return;
        }
        let ids: Vec<ObjectId> = containers.iter().map(|c| c.id().clone()).collect();
        for container in containers {
            self.data.register(container);
        }
        self.stats.record_loaded(ids.len());
        tracing::debug!(transaction = %self.id, count = ids.len(), "objects loaded");
        self.notify(|extension, tx| extension.objects_loaded(tx, &ids));
    }
}
