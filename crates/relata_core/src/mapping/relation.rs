//! Relation end-point definitions.

/// Number of objects an end-point can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    /// At most one related object.
    Single,
    /// An ordered collection of related objects.
    Collection,
}

/// Reference to an end-point by class and property.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EndPointRef {
    /// Owning class.
    pub class_id: String,
    /// Property name on the owning class.
    pub property_name: String,
}

/// One end of a relation.
///
/// Non-virtual end-points are single-valued and store the foreign key as a
/// property of the owning object. Virtual end-points hold no data of their
/// own in storage; their contents follow from the opposite foreign keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationEndPointDefinition {
    class_id: String,
    property_name: String,
    fully_qualified_name: String,
    related_class_id: String,
    cardinality: Cardinality,
    mandatory: bool,
    is_virtual: bool,
    opposite: Option<EndPointRef>,
}

impl RelationEndPointDefinition {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        class_id: &str,
        property_name: &str,
        fully_qualified_name: String,
        related_class_id: &str,
        cardinality: Cardinality,
        mandatory: bool,
        is_virtual: bool,
        opposite: Option<EndPointRef>,
    ) -> Self {
        Self {
            class_id: class_id.to_string(),
            property_name: property_name.to_string(),
            fully_qualified_name,
            related_class_id: related_class_id.to_string(),
            cardinality,
            mandatory,
            is_virtual,
            opposite,
        }
    }

    /// Returns the owning class.
    pub fn class_id(&self) -> &str {
        &self.class_id
    }

    /// Returns the property name.
    pub fn property_name(&self) -> &str {
        &self.property_name
    }

    /// Returns `<Namespace>.<Class>.<Property>`.
    pub fn fully_qualified_name(&self) -> &str {
        &self.fully_qualified_name
    }

    /// Returns the class of related objects.
    pub fn related_class_id(&self) -> &str {
        &self.related_class_id
    }

    /// Returns the cardinality.
    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    /// Returns true for collection end-points.
    pub fn is_collection(&self) -> bool {
        self.cardinality == Cardinality::Collection
    }

    /// Returns true if the end-point must be populated at commit.
    pub fn is_mandatory(&self) -> bool {
        self.mandatory
    }

    /// Returns true if the opposite end-point holds the foreign key.
    pub fn is_virtual(&self) -> bool {
        self.is_virtual
    }

    /// Returns the opposite end-point, `None` for unidirectional relations.
    pub fn opposite(&self) -> Option<&EndPointRef> {
        self.opposite.as_ref()
    }
}

/// End-point description passed to the mapping builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndPoint {
    pub(crate) class_id: String,
    pub(crate) property_name: String,
    pub(crate) mandatory: bool,
}

impl EndPoint {
    /// Describes an optional end-point.
    pub fn new(class_id: impl Into<String>, property_name: impl Into<String>) -> Self {
        Self {
            class_id: class_id.into(),
            property_name: property_name.into(),
            mandatory: false,
        }
    }

    /// Marks the end-point as mandatory.
    #[must_use]
    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    pub(crate) fn to_ref(&self) -> EndPointRef {
        EndPointRef {
            class_id: self.class_id.clone(),
            property_name: self.property_name.clone(),
        }
    }
}
