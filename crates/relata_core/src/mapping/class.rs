//! Class and property definitions.

use crate::mapping::RelationEndPointDefinition;
use crate::object::Value;
use std::fmt;

/// Storage type of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyType {
    /// Boolean.
    Bool,
    /// Signed 64-bit integer.
    Integer,
    /// UTF-8 text.
    Text,
    /// Byte string.
    Bytes,
    /// Foreign key of a relation end-point.
    Reference,
}

impl PropertyType {
    /// Value used for non-nullable properties without an explicit default.
    #[must_use]
    pub fn default_value(self) -> Value {
        match self {
            PropertyType::Bool => Value::Bool(false),
            PropertyType::Integer => Value::Integer(0),
            PropertyType::Text => Value::Text(String::new()),
            PropertyType::Bytes => Value::Bytes(Vec::new()),
            PropertyType::Reference => Value::Null,
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PropertyType::Bool => "bool",
            PropertyType::Integer => "integer",
            PropertyType::Text => "text",
            PropertyType::Bytes => "bytes",
            PropertyType::Reference => "reference",
        };
        f.write_str(name)
    }
}

/// Definition of a persistent property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDefinition {
    name: String,
    property_type: PropertyType,
    nullable: bool,
    max_length: Option<usize>,
    default_value: Option<Value>,
}

impl PropertyDefinition {
    /// Creates a nullable property.
    pub fn new(name: impl Into<String>, property_type: PropertyType) -> Self {
        Self {
            name: name.into(),
            property_type,
            nullable: true,
            max_length: None,
            default_value: None,
        }
    }

    /// Creates a nullable text property.
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, PropertyType::Text)
    }

    /// Creates a nullable integer property.
    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, PropertyType::Integer)
    }

    /// Creates a nullable boolean property.
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, PropertyType::Bool)
    }

    /// Creates a nullable byte-string property.
    pub fn bytes(name: impl Into<String>) -> Self {
        Self::new(name, PropertyType::Bytes)
    }

    pub(crate) fn foreign_key(name: impl Into<String>) -> Self {
        Self::new(name, PropertyType::Reference)
    }

    /// Disallows null at commit.
    #[must_use]
    pub fn not_nullable(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Limits the length of a text value, checked at commit.
    #[must_use]
    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Sets the value given to new objects.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Returns the property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the property type.
    pub fn property_type(&self) -> PropertyType {
        self.property_type
    }

    /// Returns true if null is allowed.
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Returns the maximum text length, if limited.
    pub fn max_length_limit(&self) -> Option<usize> {
        self.max_length
    }

    /// Returns true for foreign-key properties of relation end-points.
    pub fn is_foreign_key(&self) -> bool {
        self.property_type == PropertyType::Reference
    }

    /// Value a new object starts with.
    pub fn initial_value(&self) -> Value {
        match &self.default_value {
            Some(value) => value.clone(),
            None if self.nullable => Value::Null,
            None => self.property_type.default_value(),
        }
    }
}

/// Definition of a mapped class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDefinition {
    id: String,
    namespace: String,
    properties: Vec<PropertyDefinition>,
    end_points: Vec<RelationEndPointDefinition>,
}

impl ClassDefinition {
    /// Creates a class definition without properties.
    pub fn new(namespace: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            namespace: namespace.into(),
            properties: Vec::new(),
            end_points: Vec::new(),
        }
    }

    /// Adds a value property.
    #[must_use]
    pub fn property(mut self, property: PropertyDefinition) -> Self {
        self.properties.push(property);
        self
    }

    /// Returns the class id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns `<Namespace>.<Class>.<Property>`.
    pub fn fully_qualified_name(&self, property_name: &str) -> String {
        if self.namespace.is_empty() {
            format!("{}.{}", self.id, property_name)
        } else {
            format!("{}.{}.{}", self.namespace, self.id, property_name)
        }
    }

    /// Returns all persistent properties, foreign keys included.
    pub fn properties(&self) -> &[PropertyDefinition] {
        &self.properties
    }

    /// Looks up a persistent property.
    pub fn get_property(&self, name: &str) -> Option<&PropertyDefinition> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Returns the relation end-points in definition order.
    pub fn end_points(&self) -> &[RelationEndPointDefinition] {
        &self.end_points
    }

    /// Looks up a relation end-point.
    pub fn get_end_point(&self, property_name: &str) -> Option<&RelationEndPointDefinition> {
        self.end_points
            .iter()
            .find(|e| e.property_name() == property_name)
    }

    /// Returns the end-points that do not hold a foreign key.
    pub fn virtual_end_points(&self) -> impl Iterator<Item = &RelationEndPointDefinition> {
        self.end_points.iter().filter(|e| e.is_virtual())
    }

    pub(crate) fn has_member(&self, name: &str) -> bool {
        self.get_property(name).is_some() || self.get_end_point(name).is_some()
    }

    pub(crate) fn push_end_point(&mut self, end_point: RelationEndPointDefinition) {
        if !end_point.is_virtual() {
            self.properties
                .push(PropertyDefinition::foreign_key(end_point.property_name()));
        }
        self.end_points.push(end_point);
    }
}
