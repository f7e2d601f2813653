//! Commit-time validation of persistable data.

mod mandatory;
mod property;

pub use mandatory::MandatoryRelationValidator;
pub use property::PropertyConstraintValidator;

use crate::config::Config;
use crate::data::PersistableData;
use crate::error::CoreResult;
use crate::mapping::MappingConfiguration;
use std::fmt;
use std::sync::Arc;

/// A check applied to every persistable object before it is written.
pub trait PersistableDataValidator: Send + Sync {
    /// Validates one object; the first error aborts the commit.
    fn validate(&self, mapping: &MappingConfiguration, data: &PersistableData) -> CoreResult<()>;
}

/// Runs the configured validators over the persistable data, failing fast.
#[derive(Clone, Default)]
pub struct CommitValidator {
    validators: Vec<Arc<dyn PersistableDataValidator>>,
}

impl CommitValidator {
    /// Creates a validator without checks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the validators enabled by the configuration.
    pub fn from_config(config: &Config) -> Self {
        let mut validator = Self::new();
        if config.validate_mandatory_relations {
            validator = validator.with(MandatoryRelationValidator);
        }
        if config.validate_property_constraints {
            validator = validator.with(PropertyConstraintValidator);
        }
        validator
    }

    /// Adds a validator.
    #[must_use]
    pub fn with(mut self, validator: impl PersistableDataValidator + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    /// Adds a shared validator.
    #[must_use]
    pub fn with_shared(mut self, validator: Arc<dyn PersistableDataValidator>) -> Self {
        self.validators.push(validator);
        self
    }

    /// Returns the number of validators.
    pub fn len(&self) -> usize {
        self.validators.len()
    }

    /// Returns true if no validator is configured.
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Validates the objects in order.
    pub fn validate(&self, mapping: &MappingConfiguration, data: &[PersistableData]) -> CoreResult<()> {
        for item in data {
            for validator in &self.validators {
                validator.validate(mapping, item)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for CommitValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommitValidator")
            .field("validators", &self.validators.len())
            .finish()
    }
}
