//! Mapping metadata: classes, properties and relation end-points.

mod class;
mod configuration;
mod relation;

pub use class::{ClassDefinition, PropertyDefinition, PropertyType};
pub use configuration::{MappingBuilder, MappingConfiguration};
pub use relation::{Cardinality, EndPoint, EndPointRef, RelationEndPointDefinition};
