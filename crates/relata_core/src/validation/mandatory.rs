//! Mandatory relation checks.

use crate::data::{PersistableData, RelationValue};
use crate::error::{CoreError, CoreResult};
use crate::mapping::MappingConfiguration;
use crate::types::ObjectState;
use crate::validation::PersistableDataValidator;

/// Rejects empty mandatory end-points.
///
/// Deleted objects are exempt. End-points the transaction never loaded are
/// skipped; their stored state was valid when it was committed.
#[derive(Debug, Clone, Copy, Default)]
pub struct MandatoryRelationValidator;

impl PersistableDataValidator for MandatoryRelationValidator {
    fn validate(&self, mapping: &MappingConfiguration, data: &PersistableData) -> CoreResult<()> {
        if data.state() == ObjectState::Deleted {
            return Ok(());
        }
        let class = mapping.class(data.id().class_id())?;
        for definition in class.end_points().iter().filter(|e| e.is_mandatory()) {
            match data.end_point(definition.property_name()) {
                Some(RelationValue::Object(None)) => {
                    return Err(CoreError::mandatory_relation_null(
                        definition.fully_qualified_name(),
                        data.id(),
                    ));
                }
                Some(RelationValue::Collection(items)) if items.is_empty() => {
                    return Err(CoreError::mandatory_relation_empty(
                        definition.fully_qualified_name(),
                        data.id(),
                    ));
                }
                _ => {}
            }
        }
        Ok(())
    }
}
