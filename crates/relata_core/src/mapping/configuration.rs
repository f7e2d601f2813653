//! Validated mapping configuration and its builder.

use crate::error::{CoreError, CoreResult};
use crate::mapping::{
    Cardinality, ClassDefinition, EndPoint, EndPointRef, PropertyDefinition,
    RelationEndPointDefinition,
};
use std::collections::HashMap;

/// Mapping metadata for all persistent classes.
///
/// Built once through [`MappingBuilder`] and shared by every transaction.
#[derive(Debug, Clone)]
pub struct MappingConfiguration {
    classes: Vec<ClassDefinition>,
    index: HashMap<String, usize>,
}

impl MappingConfiguration {
    /// Starts a new builder.
    pub fn builder() -> MappingBuilder {
        MappingBuilder::default()
    }

    /// Returns all classes in definition order.
    pub fn classes(&self) -> &[ClassDefinition] {
        &self.classes
    }

    /// Looks up a class.
    pub fn get_class(&self, class_id: &str) -> Option<&ClassDefinition> {
        self.index.get(class_id).map(|&i| &self.classes[i])
    }

    /// Looks up a class or fails with [`CoreError::UnknownClass`].
    pub fn class(&self, class_id: &str) -> CoreResult<&ClassDefinition> {
        self.get_class(class_id)
            .ok_or_else(|| CoreError::unknown_class(class_id))
    }

    /// Looks up a persistent property or fails with [`CoreError::UnknownProperty`].
    pub fn property(&self, class_id: &str, property_name: &str) -> CoreResult<&PropertyDefinition> {
        self.class(class_id)?
            .get_property(property_name)
            .ok_or_else(|| CoreError::unknown_property(class_id, property_name))
    }

    /// Looks up a relation end-point or fails with [`CoreError::UnknownProperty`].
    pub fn end_point(
        &self,
        class_id: &str,
        property_name: &str,
    ) -> CoreResult<&RelationEndPointDefinition> {
        self.class(class_id)?
            .get_end_point(property_name)
            .ok_or_else(|| CoreError::unknown_property(class_id, property_name))
    }

    /// Returns the opposite of an end-point, if the relation is bidirectional.
    pub fn opposite(
        &self,
        end_point: &RelationEndPointDefinition,
    ) -> Option<&RelationEndPointDefinition> {
        let opposite = end_point.opposite()?;
        self.get_class(&opposite.class_id)?
            .get_end_point(&opposite.property_name)
    }
}

#[derive(Debug, Clone)]
enum RelationShape {
    OneToMany { one: EndPoint, many: EndPoint },
    OneToOne { virtual_side: EndPoint, foreign_key_side: EndPoint },
    Unidirectional { foreign_key_side: EndPoint, related_class_id: String },
}

/// Builder for [`MappingConfiguration`].
///
/// ```rust,ignore
/// let mapping = MappingConfiguration::builder()
///     .class(ClassDefinition::new("Shop", "Customer").property(PropertyDefinition::text("Name")))
///     .class(ClassDefinition::new("Shop", "Order").property(PropertyDefinition::integer("OrderNumber")))
///     .one_to_many(
///         EndPoint::new("Customer", "Orders").mandatory(),
///         EndPoint::new("Order", "Customer").mandatory(),
///     )
///     .build()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct MappingBuilder {
    classes: Vec<ClassDefinition>,
    relations: Vec<RelationShape>,
}

impl MappingBuilder {
    /// Adds a class.
    #[must_use]
    pub fn class(mut self, class: ClassDefinition) -> Self {
        self.classes.push(class);
        self
    }

    /// Adds a one-to-many relation.
    ///
    /// `one` becomes a virtual collection end-point, `many` a foreign-key end-point.
    #[must_use]
    pub fn one_to_many(mut self, one: EndPoint, many: EndPoint) -> Self {
        self.relations.push(RelationShape::OneToMany { one, many });
        self
    }

    /// Adds a one-to-one relation; `foreign_key_side` stores the key.
    #[must_use]
    pub fn one_to_one(mut self, virtual_side: EndPoint, foreign_key_side: EndPoint) -> Self {
        self.relations.push(RelationShape::OneToOne {
            virtual_side,
            foreign_key_side,
        });
        self
    }

    /// Adds a foreign-key end-point without an opposite.
    #[must_use]
    pub fn unidirectional(
        mut self,
        foreign_key_side: EndPoint,
        related_class_id: impl Into<String>,
    ) -> Self {
        self.relations.push(RelationShape::Unidirectional {
            foreign_key_side,
            related_class_id: related_class_id.into(),
        });
        self
    }

    /// Validates the definitions and builds the configuration.
    pub fn build(self) -> CoreResult<MappingConfiguration> {
        let mut classes = self.classes;
        let mut index = HashMap::new();
        for (i, class) in classes.iter().enumerate() {
            if index.insert(class.id().to_string(), i).is_some() {
                return Err(CoreError::mapping(format!(
                    "class '{}' is defined twice",
                    class.id()
                )));
            }
            let mut seen = std::collections::HashSet::new();
            for property in class.properties() {
                if !seen.insert(property.name()) {
                    return Err(CoreError::mapping(format!(
                        "property '{}' is defined twice on class '{}'",
                        property.name(),
                        class.id()
                    )));
                }
            }
        }

        for relation in self.relations {
            match relation {
                RelationShape::OneToMany { one, many } => {
                    add_end_point(
                        &mut classes,
                        &index,
                        &one,
                        &many.class_id,
                        Cardinality::Collection,
                        true,
                        Some(many.to_ref()),
                    )?;
                    add_end_point(
                        &mut classes,
                        &index,
                        &many,
                        &one.class_id,
                        Cardinality::Single,
                        false,
                        Some(one.to_ref()),
                    )?;
                }
                RelationShape::OneToOne {
                    virtual_side,
                    foreign_key_side,
                } => {
                    add_end_point(
                        &mut classes,
                        &index,
                        &virtual_side,
                        &foreign_key_side.class_id,
                        Cardinality::Single,
                        true,
                        Some(foreign_key_side.to_ref()),
                    )?;
                    add_end_point(
                        &mut classes,
                        &index,
                        &foreign_key_side,
                        &virtual_side.class_id,
                        Cardinality::Single,
                        false,
                        Some(virtual_side.to_ref()),
                    )?;
                }
                RelationShape::Unidirectional {
                    foreign_key_side,
                    related_class_id,
                } => {
                    if !index.contains_key(&related_class_id) {
                        return Err(CoreError::mapping(format!(
                            "relation '{}.{}' refers to unknown class '{related_class_id}'",
                            foreign_key_side.class_id, foreign_key_side.property_name
                        )));
                    }
                    add_end_point(
                        &mut classes,
                        &index,
                        &foreign_key_side,
                        &related_class_id,
                        Cardinality::Single,
                        false,
                        None,
                    )?;
                }
            }
        }

        Ok(MappingConfiguration { classes, index })
    }
}

fn add_end_point(
    classes: &mut [ClassDefinition],
    index: &HashMap<String, usize>,
    end_point: &EndPoint,
    related_class_id: &str,
    cardinality: Cardinality,
    is_virtual: bool,
    opposite: Option<EndPointRef>,
) -> CoreResult<()> {
    let Some(&i) = index.get(&end_point.class_id) else {
        return Err(CoreError::mapping(format!(
            "relation end-point '{}.{}' refers to unknown class '{}'",
            end_point.class_id, end_point.property_name, end_point.class_id
        )));
    };
    let class = &mut classes[i];
    if class.has_member(&end_point.property_name) {
        return Err(CoreError::mapping(format!(
            "property '{}' is defined twice on class '{}'",
            end_point.property_name, end_point.class_id
        )));
    }
    let definition = RelationEndPointDefinition::new(
        &end_point.class_id,
        &end_point.property_name,
        class.fully_qualified_name(&end_point.property_name),
        related_class_id,
        cardinality,
        end_point.mandatory,
        is_virtual,
        opposite,
    );
    class.push_end_point(definition);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shop() -> MappingBuilder {
        MappingConfiguration::builder()
            .class(ClassDefinition::new("Shop", "Customer").property(PropertyDefinition::text("Name")))
            .class(ClassDefinition::new("Shop", "Order").property(PropertyDefinition::integer("OrderNumber")))
            .class(ClassDefinition::new("Shop", "OrderTicket"))
    }

    #[test]
    fn one_to_many_creates_both_ends() {
        let mapping = shop()
            .one_to_many(
                EndPoint::new("Customer", "Orders").mandatory(),
                EndPoint::new("Order", "Customer"),
            )
            .build()
            .unwrap();

        let orders = mapping.end_point("Customer", "Orders").unwrap();
        assert!(orders.is_virtual());
        assert!(orders.is_collection());
        assert!(orders.is_mandatory());
        assert_eq!(orders.related_class_id(), "Order");
        assert_eq!(orders.fully_qualified_name(), "Shop.Customer.Orders");

        let customer = mapping.end_point("Order", "Customer").unwrap();
        assert!(!customer.is_virtual());
        assert!(!customer.is_mandatory());
        assert_eq!(mapping.opposite(customer).unwrap(), orders);

        let fk = mapping.property("Order", "Customer").unwrap();
        assert!(fk.is_foreign_key());
        assert!(mapping.get_class("Customer").unwrap().get_property("Orders").is_none());
    }

    #[test]
    fn one_to_one_and_unidirectional() {
        let mapping = shop()
            .one_to_one(
                EndPoint::new("Order", "OrderTicket").mandatory(),
                EndPoint::new("OrderTicket", "Order").mandatory(),
            )
            .unidirectional(EndPoint::new("Customer", "Favourite"), "Order")
            .build()
            .unwrap();

        let ticket = mapping.end_point("Order", "OrderTicket").unwrap();
        assert!(ticket.is_virtual());
        assert_eq!(ticket.cardinality(), Cardinality::Single);

        let favourite = mapping.end_point("Customer", "Favourite").unwrap();
        assert!(favourite.opposite().is_none());
        assert!(mapping.opposite(favourite).is_none());
        assert!(mapping.property("Customer", "Favourite").unwrap().is_foreign_key());
    }

    #[test]
    fn unknown_class_is_rejected() {
        let err = shop()
            .one_to_many(EndPoint::new("Customer", "Orders"), EndPoint::new("Invoice", "Customer"))
            .build()
            .unwrap_err();
        assert!(matches!(err, CoreError::Mapping { .. }));
    }

    #[test]
    fn duplicate_members_are_rejected() {
        let err = shop()
            .one_to_many(EndPoint::new("Customer", "Name"), EndPoint::new("Order", "Customer"))
            .build()
            .unwrap_err();
        assert!(matches!(err, CoreError::Mapping { .. }));

        let err = MappingConfiguration::builder()
            .class(ClassDefinition::new("Shop", "Customer"))
            .class(ClassDefinition::new("Shop", "Customer"))
            .build()
            .unwrap_err();
        assert!(matches!(err, CoreError::Mapping { .. }));
    }

    #[test]
    fn lookups_report_unknown_names() {
        let mapping = shop().build().unwrap();
        assert!(matches!(
            mapping.class("Invoice"),
            Err(CoreError::UnknownClass { .. })
        ));
        assert!(matches!(
            mapping.property("Customer", "Age"),
            Err(CoreError::UnknownProperty { .. })
        ));
        assert!(matches!(
            mapping.end_point("Customer", "Name"),
            Err(CoreError::UnknownProperty { .. })
        ));
    }
}
