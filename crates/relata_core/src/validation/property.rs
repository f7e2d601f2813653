//! Nullability and length checks on property values.

use crate::data::PersistableData;
use crate::error::{CoreError, CoreResult};
use crate::mapping::MappingConfiguration;
use crate::object::Value;
use crate::types::{ObjectState, ValueAccess};
use crate::validation::PersistableDataValidator;

/// Rejects null in non-nullable properties and text over its maximum length.
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertyConstraintValidator;

impl PersistableDataValidator for PropertyConstraintValidator {
    fn validate(&self, mapping: &MappingConfiguration, data: &PersistableData) -> CoreResult<()> {
        if data.state() == ObjectState::Deleted {
            return Ok(());
        }
        let class = mapping.class(data.id().class_id())?;
        for property in class.properties() {
            if property.is_foreign_key() {
                continue;
            }
            let value = data
                .container()
                .value(property.name(), ValueAccess::Current)
                .unwrap_or(&Value::Null);
            if value.is_null() && !property.is_nullable() {
                return Err(CoreError::PropertyValueNotNullable {
                    property_name: class.fully_qualified_name(property.name()),
                    object_id: data.id().clone(),
                });
            }
            if let (Some(max_length), Value::Text(text)) = (property.max_length_limit(), value) {
                let actual_length = text.chars().count();
                if actual_length > max_length {
                    return Err(CoreError::PropertyValueTooLong {
                        property_name: class.fully_qualified_name(property.name()),
                        object_id: data.id().clone(),
                        max_length,
                        actual_length,
                    });
                }
            }
        }
        Ok(())
    }
}
