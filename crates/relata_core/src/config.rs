//! Client transaction configuration.

/// Configuration for creating client transactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Whether commits check mandatory relation end-points.
    pub validate_mandatory_relations: bool,

    /// Whether commits check nullability and maximum length of properties.
    pub validate_property_constraints: bool,

    /// Maximum nesting of sub-transactions below a root transaction.
    pub max_sub_transaction_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            validate_mandatory_relations: true,
            validate_property_constraints: true,
            max_sub_transaction_depth: 8,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether mandatory relations are validated on commit.
    #[must_use]
    pub const fn validate_mandatory_relations(mut self, value: bool) -> Self {
        self.validate_mandatory_relations = value;
        self
    }

    /// Sets whether property constraints are validated on commit.
    #[must_use]
    pub const fn validate_property_constraints(mut self, value: bool) -> Self {
        self.validate_property_constraints = value;
        self
    }

    /// Sets the maximum sub-transaction depth.
    #[must_use]
    pub const fn max_sub_transaction_depth(mut self, depth: usize) -> Self {
        self.max_sub_transaction_depth = depth;
        self
    }
}
