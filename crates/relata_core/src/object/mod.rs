//! Domain object identity, values and typed handles.

mod domain;
mod id;
mod value;

pub use domain::DomainObject;
pub use id::ObjectId;
pub use value::Value;
