//! Property value access.

use crate::error::{CoreError, CoreResult};
use crate::mapping::{MappingConfiguration, PropertyDefinition};
use crate::object::{ObjectId, Value};
use crate::transaction::ClientTransaction;
use crate::types::ValueAccess;
use std::sync::Arc;

impl ClientTransaction {
    /// Reads the current value of a property.
    pub fn get_value(&mut self, id: &ObjectId, property: &str) -> CoreResult<Value> {
        self.read_value(id, property, ValueAccess::Current)
    }

    /// Reads the value a property had when loaded or last committed.
    pub fn get_original_value(&mut self, id: &ObjectId, property: &str) -> CoreResult<Value> {
        self.read_value(id, property, ValueAccess::Original)
    }

    /// Writes a property value.
    ///
    /// The value must match the property type; `Null` is accepted for every
    /// property and checked against nullability at commit. Writing the
    /// current value again does nothing.
    pub fn set_value(
        &mut self,
        id: &ObjectId,
        property: &str,
        value: impl Into<Value>,
    ) -> CoreResult<()> {
        let value = value.into();
        self.ensure_writable(id)?;
        let mapping = Arc::clone(&self.mapping);
        let definition = value_property(&mapping, id, property)?;
        if !value.fits(definition.property_type()) {
            return Err(CoreError::TypeMismatch {
                property_name: mapping.class(id.class_id())?.fully_qualified_name(property),
                expected: definition.property_type().to_string(),
                actual: value.type_name().to_string(),
            });
        }

        let old = self.current_value(id, property);
        if old == value {
            return Ok(());
        }
        self.notify_before(|extension, tx| {
            extension.property_value_changing(tx, id, property, &old, &value)
        })?;
        if let Some(container) = self.data.container_mut(id) {
            container.set_value(property, value.clone());
        }
        self.notify(|extension, tx| extension.property_value_changed(tx, id, property, &old, &value));
        Ok(())
    }

    fn read_value(&mut self, id: &ObjectId, property: &str, access: ValueAccess) -> CoreResult<Value> {
        self.ensure_loaded(id)?;
        let mapping = Arc::clone(&self.mapping);
        value_property(&mapping, id, property)?;
        self.notify_before(|extension, tx| extension.property_value_reading(tx, id, property, access))?;
        let value = self
            .data
            .container(id)
            .and_then(|c| c.value(property, access))
            .cloned()
            .unwrap_or(Value::Null);
        self.notify(|extension, tx| extension.property_value_read(tx, id, property, &value, access));
        Ok(value)
    }

    fn current_value(&self, id: &ObjectId, property: &str) -> Value {
        self.data
            .container(id)
            .and_then(|c| c.value(property, ValueAccess::Current))
            .cloned()
            .unwrap_or(Value::Null)
    }
}

/// Looks up a value property; relation end-points are only reachable through the relation API.
fn value_property<'a>(
    mapping: &'a MappingConfiguration,
    id: &ObjectId,
    property: &str,
) -> CoreResult<&'a PropertyDefinition> {
    let class = mapping.class(id.class_id())?;
    if let Some(end_point) = class.get_end_point(property) {
        return Err(CoreError::invalid_operation(format!(
            "'{}' is a relation property; use the relation API",
            end_point.fully_qualified_name()
        )));
    }
    class
        .get_property(property)
        .ok_or_else(|| CoreError::unknown_property(id.class_id(), property))
}
