//! Change tracking: data containers, end-point state and persistable snapshots.

mod container;
mod end_point;
mod manager;
mod persistable;

pub use container::{ContainerState, DataContainer, PropertyValue};
pub use end_point::RelationValue;
pub use persistable::PersistableData;

pub(crate) use end_point::EndPointData;
pub(crate) use manager::DataManager;
