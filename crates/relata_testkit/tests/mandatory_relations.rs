//! Commit-time validation of mandatory relations and property constraints.

use relata_core::{Config, CoreError, ObjectId, ObjectState, Value};
use relata_storage::RecordStore;
use relata_testkit::prelude::*;

fn mandatory_violation(err: CoreError) -> (String, ObjectId, String) {
    match err {
        CoreError::MandatoryRelationNotSet {
            property_name,
            object_id,
            message,
        } => (property_name, object_id, message),
        other => panic!("expected a mandatory relation violation, got {other:?}"),
    }
}

#[test]
fn clearing_a_mandatory_collection_fails() {
    let world = ShopWorld::seeded();
    let mut tx = world.transaction();
    let customer = &world.data.customer2;

    tx.clear_related_objects(customer, "Orders").unwrap();
    let err = tx.commit().unwrap_err();

    let (property_name, object_id, message) = mandatory_violation(err);
    assert_eq!(property_name, "Shop.Customer.Orders");
    assert_eq!(&object_id, customer);
    assert_eq!(
        message,
        format!(
            "Mandatory relation property 'Shop.Customer.Orders' of domain object '{customer}' contains no items."
        )
    );

    // The failed commit keeps the modification in memory and writes nothing.
    assert!(tx.get_related_objects(customer, "Orders").unwrap().is_empty());
    assert_eq!(tx.state(customer), ObjectState::Changed);
    assert_eq!(tx.stats().failed_commits(), 1);
    let stored = stored_record(world.store(), &world.data.order3).unwrap();
    assert_eq!(
        stored.values.get("Customer"),
        Some(&Value::Reference(customer.clone()))
    );
}

#[test]
fn restoring_a_cleared_collection_commits() {
    let world = ShopWorld::seeded();
    let mut tx = world.transaction();
    let customer = &world.data.customer2;
    tx.clear_related_objects(customer, "Orders").unwrap();
    assert!(tx.commit().is_err());

    tx.add_related_object(customer, "Orders", &world.data.order3)
        .unwrap();

    assert!(!tx.has_changed());
    tx.commit().unwrap();
}

#[test]
fn nulling_a_mandatory_one_to_one_fails_and_resetting_succeeds() {
    let world = ShopWorld::seeded();
    let mut tx = world.transaction();
    let ticket = &world.data.order_ticket1;
    tx.get_object(ticket).unwrap();

    tx.set_related_object(ticket, "Order", None).unwrap();
    let err = tx.commit().unwrap_err();

    let (property_name, object_id, message) = mandatory_violation(err);
    assert_eq!(property_name, "Shop.OrderTicket.Order");
    assert_eq!(&object_id, ticket);
    assert!(message.ends_with("cannot be null."));

    tx.set_related_object(ticket, "Order", Some(&world.data.order1))
        .unwrap();
    assert_eq!(tx.state(ticket), ObjectState::Unchanged);
    assert_eq!(tx.state(&world.data.order1), ObjectState::Unchanged);
    tx.commit().unwrap();
}

#[test]
fn replaced_ticket_must_be_deleted() {
    let world = ShopWorld::seeded();
    let mut tx = world.transaction();
    let order = &world.data.order1;
    let old_ticket = &world.data.order_ticket1;
    let new_ticket = tx.new_object("OrderTicket").unwrap();

    tx.set_related_object(order, "OrderTicket", Some(&new_ticket))
        .unwrap();
    assert_eq!(tx.get_related_object(old_ticket, "Order").unwrap(), None);
    let (property_name, object_id, _) = mandatory_violation(tx.commit().unwrap_err());
    assert_eq!(property_name, "Shop.OrderTicket.Order");
    assert_eq!(&object_id, old_ticket);

    tx.delete(old_ticket).unwrap();
    tx.commit().unwrap();

    assert!(stored_record(world.store(), old_ticket).is_none());
    let stored = stored_record(world.store(), &new_ticket).unwrap();
    assert_eq!(stored.values.get("Order"), Some(&Value::Reference(order.clone())));
}

#[test]
fn new_object_commit_fails_naming_the_mandatory_property() {
    let world = ShopWorld::seeded();
    let mut tx = world.transaction();
    let order = tx.new_object("Order").unwrap();

    let (property_name, object_id, message) = mandatory_violation(tx.commit().unwrap_err());

    assert_eq!(property_name, "Shop.Order.Customer");
    assert_eq!(object_id, order);
    assert_eq!(
        message,
        format!("Mandatory relation property 'Shop.Order.Customer' of domain object '{order}' cannot be null.")
    );
    assert_eq!(tx.state(&order), ObjectState::New);
    assert_eq!(world.store().len(), 18);
}

#[test]
fn complete_new_order_commits() {
    let world = ShopWorld::seeded();
    let mut tx = world.transaction();
    let order = new_complete_order(&mut tx, &world.data.customer1, 4);

    tx.commit().unwrap();

    assert_eq!(tx.state(&order), ObjectState::Unchanged);
    assert_eq!(world.store().len(), 21);
    let stored = stored_record(world.store(), &order).unwrap();
    assert_eq!(stored.values.get("OrderNumber"), Some(&Value::Integer(4)));
}

#[test]
fn removing_optional_relations_commits() {
    let world = ShopWorld::seeded();
    let mut tx = world.transaction();

    tx.set_related_object(&world.data.location1, "Client", None)
        .unwrap();
    tx.set_related_object(&world.data.company1, "Ceo", None)
        .unwrap();
    // The CEO's own end-point is mandatory, so the CEO goes as well.
    tx.delete(&world.data.ceo1).unwrap();
    let company = tx.new_object("Company").unwrap();

    tx.commit().unwrap();

    let location = stored_record(world.store(), &world.data.location1).unwrap();
    assert_eq!(location.values.get("Client"), Some(&Value::Null));
    assert!(stored_record(world.store(), &world.data.ceo1).is_none());
    assert_eq!(tx.get_related_object(&company, "Ceo").unwrap(), None);
    assert_eq!(tx.get_related_object(&world.data.company1, "Ceo").unwrap(), None);
}

#[test]
fn deleted_objects_are_not_validated() {
    let world = ShopWorld::seeded();
    let mut tx = world.transaction();
    let order = tx.new_object("Order").unwrap();
    tx.delete(&order).unwrap();
    tx.commit().unwrap();
    assert_eq!(tx.state(&order), ObjectState::Invalid);
}

#[test]
fn property_constraints_are_checked() {
    let world = ShopWorld::seeded();
    let mut tx = world.transaction();
    let customer = &world.data.customer1;

    tx.set_value(customer, "Name", Value::Null).unwrap();
    assert!(matches!(
        tx.commit(),
        Err(CoreError::PropertyValueNotNullable { property_name, object_id })
            if property_name == "Shop.Customer.Name" && &object_id == customer
    ));

    tx.set_value(customer, "Name", "K".repeat(101)).unwrap();
    assert!(matches!(
        tx.commit(),
        Err(CoreError::PropertyValueTooLong { max_length: 100, actual_length: 101, .. })
    ));

    tx.set_value(customer, "Name", "K".repeat(100)).unwrap();
    tx.commit().unwrap();
}

#[test]
fn validation_can_be_disabled() {
    let world = ShopWorld::seeded();
    let config = Config::default()
        .validate_mandatory_relations(false)
        .validate_property_constraints(false);
    let mut tx = world.transaction_with(config);

    let order = tx.new_object("Order").unwrap();
    tx.set_value(&world.data.customer1, "Name", Value::Null).unwrap();
    tx.commit().unwrap();

    assert!(stored_record(world.store(), &order).is_some());
}

#[test]
fn custom_validators_run_after_built_in_ones() {
    use relata_core::{MappingConfiguration, PersistableData, PersistableDataValidator};
    use std::sync::Arc;

    struct NoDeliveries;

    impl PersistableDataValidator for NoDeliveries {
        fn validate(&self, _mapping: &MappingConfiguration, data: &PersistableData) -> relata_core::CoreResult<()> {
            let date = data
                .container()
                .value("DeliveryDate", relata_core::ValueAccess::Current);
            match date {
                Some(Value::Text(_)) => Err(CoreError::invalid_operation("deliveries are closed")),
                _ => Ok(()),
            }
        }
    }

    let world = ShopWorld::seeded();
    let mut tx = world.builder().validator(Arc::new(NoDeliveries)).build().unwrap();
    tx.set_value(&world.data.order1, "DeliveryDate", "2024-05-01")
        .unwrap();
    assert!(matches!(tx.commit(), Err(CoreError::InvalidOperation { .. })));

    tx.set_value(&world.data.order1, "DeliveryDate", Value::Null)
        .unwrap();
    tx.commit().unwrap();
}
