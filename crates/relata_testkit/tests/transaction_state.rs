//! Object state tracking, property access and object lifecycle.

use proptest::prelude::*;
use relata_core::{CoreError, DomainObject, ObjectId, ObjectState, Value};
use relata_storage::RecordStore;
use relata_testkit::prelude::*;

#[test]
fn unchanged_objects_commit_without_transition() {
    let world = ShopWorld::seeded();
    let mut tx = world.transaction();
    tx.get_object(&world.data.order1).unwrap();
    tx.get_related_objects(&world.data.order1, "OrderItems").unwrap();
    assert!(!tx.has_changed());

    tx.commit().unwrap();

    assert_eq!(tx.state(&world.data.order1), ObjectState::Unchanged);
    assert_eq!(tx.stats().commits(), 1);
    assert_eq!(
        stored_record(world.store(), &world.data.order1).unwrap().timestamp,
        1
    );
}

#[test]
fn property_change_keeps_original_value() {
    let world = ShopWorld::seeded();
    let mut tx = world.transaction();
    let customer = &world.data.customer1;

    tx.set_value(customer, "Name", "Ada").unwrap();

    assert_eq!(tx.state(customer), ObjectState::Changed);
    assert_eq!(tx.get_value(customer, "Name").unwrap(), Value::from("Ada"));
    assert_eq!(tx.get_original_value(customer, "Name").unwrap(), Value::from("Kim"));
    assert_eq!(tx.changed_object_ids(), vec![customer.clone()]);
}

#[test]
fn reverting_a_change_returns_to_unchanged() {
    let world = ShopWorld::seeded();
    let mut tx = world.transaction();
    let customer = &world.data.customer1;

    tx.set_value(customer, "Name", "Ada").unwrap();
    tx.set_value(customer, "Name", "Kim").unwrap();

    assert_eq!(tx.state(customer), ObjectState::Unchanged);
    assert!(!tx.has_changed());
}

#[test]
fn commit_makes_changes_original_and_bumps_timestamp() {
    let world = ShopWorld::seeded();
    let mut tx = world.transaction();
    let customer = &world.data.customer1;
    tx.set_value(customer, "Name", "Ada").unwrap();

    tx.commit().unwrap();

    assert_eq!(tx.state(customer), ObjectState::Unchanged);
    assert_eq!(tx.get_original_value(customer, "Name").unwrap(), Value::from("Ada"));
    assert_eq!(tx.data_container(customer).unwrap().timestamp(), Some(2));
    let stored = stored_record(world.store(), customer).unwrap();
    assert_eq!(stored.timestamp, 2);
    assert_eq!(stored.values.get("Name"), Some(&Value::from("Ada")));
}

#[test]
fn new_objects_start_with_defaults_and_empty_relations() {
    let world = ShopWorld::seeded();
    let mut tx = world.transaction();

    let order = tx.new_object("Order").unwrap();

    assert_eq!(tx.state(&order), ObjectState::New);
    assert_eq!(tx.get_value(&order, "OrderNumber").unwrap(), Value::Integer(0));
    assert_eq!(tx.get_value(&order, "DeliveryDate").unwrap(), Value::Null);
    assert!(tx.get_related_objects(&order, "OrderItems").unwrap().is_empty());
    assert_eq!(tx.get_related_object(&order, "OrderTicket").unwrap(), None);
    assert_eq!(tx.get_related_object(&order, "Customer").unwrap(), None);
    assert_eq!(tx.stats().objects_created(), 1);
    assert_eq!(tx.stats().objects_loaded(), 0);
}

#[test]
fn new_objects_stay_new_when_modified() {
    let world = ShopWorld::seeded();
    let mut tx = world.transaction();
    let company = tx.create::<Company>().unwrap();

    company.set_value(&mut tx, "Name", "Umbrella").unwrap();

    assert_eq!(company.state(&tx), ObjectState::New);
}

#[test]
fn typed_create_in_root_and_sub_transactions() {
    let world = ShopWorld::seeded();
    let mut root = world.transaction();
    let first = root.create::<Company>().unwrap();

    let mut child = root.create_sub_transaction().unwrap();
    let second = child.create::<Company>().unwrap();
    assert_eq!(child.depth(), 1);
    assert_eq!(second.state(&child), ObjectState::New);
    assert_ne!(first.id(), second.id());

    let root = child.discard().unwrap();
    assert_eq!(first.state(&root), ObjectState::New);
    assert!(!root.is_loaded(second.id()));
}

#[test]
fn delete_then_read_before_and_after_commit() {
    let world = ShopWorld::seeded();
    let mut tx = world.transaction();
    let location = &world.data.location2;

    tx.delete(location).unwrap();
    assert_eq!(tx.state(location), ObjectState::Deleted);
    assert_eq!(tx.get_value(location, "City").unwrap(), Value::from("Graz"));

    tx.commit().unwrap();

    assert_eq!(tx.state(location), ObjectState::Invalid);
    assert!(tx.is_invalid(location));
    assert!(matches!(
        tx.get_value(location, "City"),
        Err(CoreError::ObjectInvalid { id }) if &id == location
    ));
    assert!(matches!(tx.delete(location), Err(CoreError::ObjectInvalid { .. })));
    assert!(stored_record(world.store(), location).is_none());
}

#[test]
fn deleted_objects_reject_modification() {
    let world = ShopWorld::seeded();
    let mut tx = world.transaction();
    let location = &world.data.location1;
    tx.delete(location).unwrap();

    assert!(matches!(
        tx.set_value(location, "City", "Linz"),
        Err(CoreError::ObjectDeleted { .. })
    ));
    assert!(matches!(
        tx.set_related_object(location, "Client", None),
        Err(CoreError::ObjectDeleted { .. })
    ));
    // Deleting again is a no-op.
    tx.delete(location).unwrap();
    assert_eq!(tx.state(location), ObjectState::Deleted);
}

#[test]
fn deleted_objects_cannot_be_related() {
    let world = ShopWorld::seeded();
    let mut tx = world.transaction();
    tx.delete(&world.data.client1).unwrap();

    let err = tx
        .set_related_object(&world.data.location2, "Client", Some(&world.data.client1))
        .unwrap_err();
    assert!(matches!(err, CoreError::ObjectDeleted { id } if id == world.data.client1));
}

#[test]
fn deleting_a_new_object_writes_nothing() {
    let world = ShopWorld::seeded();
    let mut tx = world.transaction();
    let client = tx.new_object("Client").unwrap();
    tx.delete(&client).unwrap();
    assert_eq!(tx.state(&client), ObjectState::Deleted);

    tx.commit().unwrap();

    assert_eq!(tx.state(&client), ObjectState::Invalid);
    assert!(stored_record(world.store(), &client).is_none());
    assert_eq!(world.store().len(), 18);
}

#[test]
fn rollback_restores_originals_and_discards_new_objects() {
    let world = ShopWorld::seeded();
    let mut tx = world.transaction();
    let customer = &world.data.customer1;
    let location = &world.data.location2;
    tx.set_value(customer, "Name", "Ada").unwrap();
    tx.delete(location).unwrap();
    let client = tx.new_object("Client").unwrap();

    tx.rollback().unwrap();

    assert_eq!(tx.get_value(customer, "Name").unwrap(), Value::from("Kim"));
    assert_eq!(tx.state(customer), ObjectState::Unchanged);
    assert_eq!(tx.state(location), ObjectState::Unchanged);
    assert_eq!(tx.state(&client), ObjectState::Invalid);
    assert!(!tx.has_changed());
    assert_eq!(tx.stats().snapshot().rollbacks, 1);
}

#[test]
fn missing_and_unknown_objects() {
    let world = ShopWorld::seeded();
    let mut tx = world.transaction();
    let missing = ObjectId::new("Customer");

    assert!(matches!(
        tx.get_object(&missing),
        Err(CoreError::ObjectNotFound { id }) if id == missing
    ));
    assert!(tx.try_get_object(&missing).unwrap().is_none());
    assert_eq!(tx.state(&missing), ObjectState::NotLoadedYet);
    assert!(matches!(
        tx.get_object(&ObjectId::new("Spaceship")),
        Err(CoreError::UnknownClass { .. })
    ));
    assert!(matches!(
        tx.new_object("Spaceship"),
        Err(CoreError::UnknownClass { .. })
    ));
}

#[test]
fn get_objects_loads_in_request_order() {
    let world = ShopWorld::seeded();
    let mut tx = world.transaction();
    let ids = vec![
        world.data.order2.clone(),
        world.data.customer1.clone(),
        world.data.order1.clone(),
    ];

    let containers = tx.get_objects(&ids).unwrap();
    let loaded: Vec<ObjectId> = containers.iter().map(|c| c.id().clone()).collect();

    assert_eq!(loaded, ids);
    assert_eq!(tx.loaded_object_ids(), ids);
    assert!(matches!(
        tx.get_objects(&[world.data.order1.clone(), ObjectId::new("Order")]),
        Err(CoreError::ObjectNotFound { .. })
    ));
}

#[test]
fn value_access_is_type_checked() {
    let world = ShopWorld::seeded();
    let mut tx = world.transaction();
    let customer = &world.data.customer1;

    let err = tx.set_value(customer, "Name", 42).unwrap_err();
    match err {
        CoreError::TypeMismatch {
            property_name,
            expected,
            actual,
        } => {
            assert_eq!(property_name, "Shop.Customer.Name");
            assert_eq!(expected, "text");
            assert_eq!(actual, "integer");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(matches!(
        tx.set_value(customer, "Nickname", "K"),
        Err(CoreError::UnknownProperty { .. })
    ));
    assert!(matches!(
        tx.get_value(&world.data.order1, "Customer"),
        Err(CoreError::InvalidOperation { .. })
    ));
    assert!(matches!(
        tx.set_value(&world.data.order1, "Customer", customer.clone()),
        Err(CoreError::InvalidOperation { .. })
    ));
    assert_eq!(tx.state(customer), ObjectState::Unchanged);
}

#[test]
fn unload_only_unchanged_objects() {
    let world = ShopWorld::seeded();
    let mut tx = world.transaction();
    let customer = &world.data.customer1;

    assert!(!tx.unload_object(customer).unwrap());
    tx.get_object(customer).unwrap();
    assert!(tx.unload_object(customer).unwrap());
    assert!(!tx.is_loaded(customer));
    assert_eq!(tx.state(customer), ObjectState::NotLoadedYet);

    // Reloads on next access.
    assert_eq!(tx.get_value(customer, "Name").unwrap(), Value::from("Kim"));
    assert_eq!(tx.stats().objects_loaded(), 2);

    tx.set_value(customer, "Name", "Ada").unwrap();
    assert!(matches!(
        tx.unload_object(customer),
        Err(CoreError::InvalidOperation { .. })
    ));
    let client = tx.new_object("Client").unwrap();
    assert!(matches!(
        tx.unload_object(&client),
        Err(CoreError::InvalidOperation { .. })
    ));
}

#[test]
fn typed_handles() {
    let world = ShopWorld::seeded();
    let mut tx = world.transaction();

    let order: Order = tx.get(&world.data.order1).unwrap();
    assert_eq!(order.number(&mut tx).unwrap(), 1);
    assert_eq!(
        order.customer(&mut tx).unwrap(),
        Some(Customer::from_id(world.data.customer1.clone()))
    );
    assert_eq!(
        order.ticket(&mut tx).unwrap(),
        Some(OrderTicket::from_id(world.data.order_ticket1.clone()))
    );
    assert_eq!(order.items(&mut tx).unwrap().len(), 2);

    let customer: Customer = tx.get(&world.data.customer2).unwrap();
    assert_eq!(customer.name(&mut tx).unwrap().as_deref(), Some("Lee"));
    assert!(matches!(
        tx.get::<Customer>(&world.data.order1),
        Err(CoreError::InvalidOperation { .. })
    ));

    order.delete(&mut tx).unwrap();
    assert_eq!(order.state(&tx), ObjectState::Deleted);
}

proptest! {
    #[test]
    fn state_follows_values(edits in customer_edits_strategy(8)) {
        let world = ShopWorld::seeded();
        let mut tx = world.transaction();
        let id = world.data.customer1.clone();

        for edit in &edits {
            tx.set_value(&id, edit.property(), edit.value()).unwrap();
        }
        let changed = tx.get_value(&id, "Name").unwrap() != Value::from("Kim")
            || tx.get_value(&id, "CustomerSince").unwrap() != Value::from(2001);
        let expected = if changed { ObjectState::Changed } else { ObjectState::Unchanged };
        prop_assert_eq!(tx.state(&id), expected);

        tx.set_value(&id, "Name", "Kim").unwrap();
        tx.set_value(&id, "CustomerSince", 2001).unwrap();
        prop_assert_eq!(tx.state(&id), ObjectState::Unchanged);
    }

    #[test]
    fn only_matching_types_are_accepted(value in scalar_value_strategy()) {
        let world = ShopWorld::seeded();
        let mut tx = world.transaction();
        let id = world.data.customer1.clone();

        let accepted = tx.set_value(&id, "CustomerSince", value.clone()).is_ok();
        prop_assert_eq!(accepted, matches!(value, Value::Null | Value::Integer(_)));
        if accepted {
            prop_assert_eq!(tx.get_value(&id, "CustomerSince").unwrap(), value);
        }
    }
}
