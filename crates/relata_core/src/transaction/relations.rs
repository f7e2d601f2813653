//! Reading relation end-points and lazy loading of virtual end-points.

use crate::data::{EndPointData, RelationValue};
use crate::error::{CoreError, CoreResult};
use crate::mapping::{MappingConfiguration, RelationEndPointDefinition};
use crate::object::{ObjectId, Value};
use crate::transaction::ClientTransaction;
use crate::types::ValueAccess;
use std::sync::Arc;

impl ClientTransaction {
    /// Returns the object currently related through a single-valued end-point.
    pub fn get_related_object(
        &mut self,
        id: &ObjectId,
        property: &str,
    ) -> CoreResult<Option<ObjectId>> {
        self.read_related_object(id, property, ValueAccess::Current)
    }

    /// Returns the object related through a single-valued end-point when loaded or last committed.
    pub fn get_original_related_object(
        &mut self,
        id: &ObjectId,
        property: &str,
    ) -> CoreResult<Option<ObjectId>> {
        self.read_related_object(id, property, ValueAccess::Original)
    }

    /// Returns the objects currently in a collection end-point.
    pub fn get_related_objects(&mut self, id: &ObjectId, property: &str) -> CoreResult<Vec<ObjectId>> {
        self.read_related_objects(id, property, ValueAccess::Current)
    }

    /// Returns the objects a collection end-point held when loaded or last committed.
    pub fn get_original_related_objects(
        &mut self,
        id: &ObjectId,
        property: &str,
    ) -> CoreResult<Vec<ObjectId>> {
        self.read_related_objects(id, property, ValueAccess::Original)
    }

    fn read_related_object(
        &mut self,
        id: &ObjectId,
        property: &str,
        access: ValueAccess,
    ) -> CoreResult<Option<ObjectId>> {
        self.ensure_loaded(id)?;
        let mapping = Arc::clone(&self.mapping);
        let definition = single_end_point(&mapping, id, property)?;
        self.notify_before(|extension, tx| extension.relation_reading(tx, id, property, access))?;
        let related = self.related_object(id, definition, access)?;
        self.notify(|extension, tx| {
            extension.relation_read_object(tx, id, property, related.as_ref(), access)
        });
        Ok(related)
    }

    fn read_related_objects(
        &mut self,
        id: &ObjectId,
        property: &str,
        access: ValueAccess,
    ) -> CoreResult<Vec<ObjectId>> {
        self.ensure_loaded(id)?;
        let mapping = Arc::clone(&self.mapping);
        let definition = collection_end_point(&mapping, id, property)?;
        self.notify_before(|extension, tx| extension.relation_reading(tx, id, property, access))?;
        let related = self.related_objects(id, definition, access)?;
        self.notify(|extension, tx| {
            extension.relation_read_collection(tx, id, property, &related, access)
        });
        Ok(related)
    }

    /// Resolves a single-valued end-point without notifications.
    pub(crate) fn related_object(
        &mut self,
        id: &ObjectId,
        definition: &RelationEndPointDefinition,
        access: ValueAccess,
    ) -> CoreResult<Option<ObjectId>> {
        self.ensure_loaded(id)?;
        if definition.is_virtual() {
            self.ensure_end_point_loaded(id, definition)?;
            return Ok(match self.end_point_value(id, definition, access) {
                Some(RelationValue::Object(related)) => related,
                _ => None,
            });
        }
        Ok(self
            .data
            .container(id)
            .and_then(|c| c.value(definition.property_name(), access))
            .and_then(Value::as_reference)
            .cloned())
    }

    /// Resolves a collection end-point without notifications.
    pub(crate) fn related_objects(
        &mut self,
        id: &ObjectId,
        definition: &RelationEndPointDefinition,
        access: ValueAccess,
    ) -> CoreResult<Vec<ObjectId>> {
        self.ensure_loaded(id)?;
        self.ensure_end_point_loaded(id, definition)?;
        Ok(match self.end_point_value(id, definition, access) {
            Some(RelationValue::Collection(related)) => related,
            _ => Vec::new(),
        })
    }

    fn end_point_value(
        &self,
        id: &ObjectId,
        definition: &RelationEndPointDefinition,
        access: ValueAccess,
    ) -> Option<RelationValue> {
        self.data
            .end_point(id, definition.property_name())
            .map(|data| data.value(access))
    }

    /// Loads a virtual end-point on first access.
    ///
    /// The related objects are fetched from the data source and registered;
    /// the end-point's current and original contents follow from the current
    /// and original foreign keys of all registered objects.
    pub(crate) fn ensure_end_point_loaded(
        &mut self,
        id: &ObjectId,
        definition: &RelationEndPointDefinition,
    ) -> CoreResult<()> {
        if !definition.is_virtual() || self.data.end_point(id, definition.property_name()).is_some() {
            return Ok(());
        }
        self.ensure_loaded(id)?;
        let mapping = Arc::clone(&self.mapping);
        let opposite = mapping.opposite(definition).ok_or_else(|| {
            CoreError::mapping(format!(
                "virtual end-point '{}' has no opposite",
                definition.fully_qualified_name()
            ))
        })?;

        let containers = self.source.load_related(definition, opposite, id)?;
        self.register_loaded(containers)?;

        let target = Value::Reference(id.clone());
        let foreign_key = opposite.property_name();
        let mut current = Vec::new();
        let mut original = Vec::new();
        for container in self.data.containers_of_class(definition.related_class_id()) {
            if container.value(foreign_key, ValueAccess::Current) == Some(&target) {
                current.push(container.id().clone());
            }
            if container.value(foreign_key, ValueAccess::Original) == Some(&target) {
                original.push(container.id().clone());
            }
        }
        let data = if definition.is_collection() {
            EndPointData::Collection { current, original }
        } else {
            EndPointData::Object {
                current: current.into_iter().next(),
                original: original.into_iter().next(),
            }
        };
        self.data.insert_end_point(id, definition.property_name(), data);
        self.stats.record_end_point_loaded();
        tracing::trace!(
            transaction = %self.id,
            object = %id,
            end_point = definition.fully_qualified_name(),
            "relation end-point loaded"
        );
        Ok(())
    }
}

pub(crate) fn single_end_point<'a>(
    mapping: &'a MappingConfiguration,
    id: &ObjectId,
    property: &str,
) -> CoreResult<&'a RelationEndPointDefinition> {
    let definition = mapping.end_point(id.class_id(), property)?;
    if definition.is_collection() {
        return Err(CoreError::invalid_operation(format!(
            "'{}' is a collection end-point",
            definition.fully_qualified_name()
        )));
    }
    Ok(definition)
}

pub(crate) fn collection_end_point<'a>(
    mapping: &'a MappingConfiguration,
    id: &ObjectId,
    property: &str,
) -> CoreResult<&'a RelationEndPointDefinition> {
    let definition = mapping.end_point(id.class_id(), property)?;
    if !definition.is_collection() {
        return Err(CoreError::invalid_operation(format!(
            "'{}' is a single-valued end-point",
            definition.fully_qualified_name()
        )));
    }
    Ok(definition)
}
