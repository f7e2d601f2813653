//! Extension notifications: ordering, batching and cancellation.

use parking_lot::Mutex;
use relata_core::{ClientTransaction, ClientTransactionExtension, CoreError, CoreResult, ObjectId, ObjectState, Value};
use relata_testkit::prelude::*;
use std::sync::Arc;

/// Appends its key to a log shared with other instances.
struct SharedLog {
    key: &'static str,
    log: Arc<Mutex<Vec<String>>>,
}

impl ClientTransactionExtension for SharedLog {
    fn key(&self) -> &str {
        self.key
    }

    fn transaction_initialize(&self, _tx: &ClientTransaction) {
        self.log.lock().push(format!("{} initialize", self.key));
    }

    fn object_deleting(&self, _tx: &ClientTransaction, _id: &ObjectId) -> CoreResult<()> {
        self.log.lock().push(format!("{} deleting", self.key));
        Ok(())
    }

    fn object_deleted(&self, _tx: &ClientTransaction, _id: &ObjectId) {
        self.log.lock().push(format!("{} deleted", self.key));
    }
}

fn recording(world: &ShopWorld) -> (ClientTransaction, Arc<RecordingExtension>) {
    let recorder = Arc::new(RecordingExtension::new("rec"));
    let tx = world.builder().extension(recorder.clone()).build().unwrap();
    (tx, recorder)
}

#[test]
fn extensions_are_notified_in_registration_order() {
    let world = ShopWorld::seeded();
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut tx = world
        .builder()
        .extension(Arc::new(SharedLog { key: "b", log: log.clone() }))
        .extension(Arc::new(SharedLog { key: "a", log: log.clone() }))
        .build()
        .unwrap();

    tx.delete(&world.data.client1).unwrap();

    assert_eq!(
        *log.lock(),
        vec!["b initialize", "a initialize", "b deleting", "a deleting", "b deleted", "a deleted"]
    );
    assert_eq!(tx.extensions().keys(), vec!["b", "a"]);
}

#[test]
fn duplicate_keys_are_rejected() {
    let world = ShopWorld::seeded();
    let (mut tx, _) = recording(&world);

    let err = tx
        .add_extension(Arc::new(RecordingExtension::new("rec")))
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidOperation { .. }));

    let built = world
        .builder()
        .extension(Arc::new(RecordingExtension::new("x")))
        .extension(Arc::new(RecordingExtension::new("x")))
        .build();
    assert!(matches!(built, Err(CoreError::InvalidOperation { .. })));
}

#[test]
fn removed_extensions_stop_receiving_events() {
    let world = ShopWorld::seeded();
    let (mut tx, recorder) = recording(&world);

    assert!(tx.remove_extension("rec").is_some());
    assert!(tx.remove_extension("rec").is_none());
    tx.get_object(&world.data.customer1).unwrap();

    assert_eq!(recorder.events(), vec!["transaction_initialize"]);
}

#[test]
fn extensions_added_later_miss_initialization() {
    let world = ShopWorld::seeded();
    let mut tx = world.transaction();
    let recorder = Arc::new(RecordingExtension::new("rec"));
    tx.add_extension(recorder.clone()).unwrap();

    tx.new_object("Order").unwrap();

    assert_eq!(recorder.events(), vec!["new_object_creating Order"]);
}

#[test]
fn property_access_is_reported() {
    let world = ShopWorld::seeded();
    let (mut tx, recorder) = recording(&world);
    let customer = &world.data.customer1;

    tx.get_value(customer, "Name").unwrap();
    tx.get_original_value(customer, "Name").unwrap();
    tx.set_value(customer, "Name", "Kim").unwrap();
    tx.set_value(customer, "Name", "Ann").unwrap();

    assert_eq!(
        recorder.events(),
        vec![
            "transaction_initialize",
            "objects_loading 1",
            "objects_loaded 1",
            "property_value_reading Customer.Name",
            "property_value_read Customer.Name",
            "property_value_reading Customer.Name (original)",
            "property_value_read Customer.Name (original)",
            "property_value_changing Customer.Name",
            "property_value_changed Customer.Name",
        ]
    );
}

#[test]
fn relation_reads_are_reported() {
    let world = ShopWorld::seeded();
    let (mut tx, recorder) = recording(&world);

    tx.get_related_objects(&world.data.customer1, "Orders").unwrap();
    tx.get_original_related_object(&world.data.order1, "Customer")
        .unwrap();

    assert_eq!(
        recorder.events_matching("relation_read"),
        vec![
            "relation_reading Customer.Orders",
            "relation_read Customer.Orders [2]",
            "relation_reading Order.Customer (original)",
            "relation_read Order.Customer (original)",
        ]
    );
    // The customer, then both orders of its end-point in one batch.
    assert_eq!(
        recorder.events_matching("objects_loading"),
        vec!["objects_loading 1", "objects_loading 2"]
    );
}

#[test]
fn relation_changes_notify_all_end_points_before_applying() {
    let world = ShopWorld::seeded();
    let (mut tx, recorder) = recording(&world);

    tx.set_related_object(&world.data.order1, "Customer", Some(&world.data.customer2))
        .unwrap();

    assert_eq!(
        recorder.events_matching("relation_chang"),
        vec![
            "relation_changing Order.Customer",
            "relation_changing Customer.Orders",
            "relation_changing Customer.Orders",
            "relation_changed Order.Customer",
            "relation_changed Customer.Orders",
            "relation_changed Customer.Orders",
        ]
    );
}

#[test]
fn one_to_one_steal_touches_four_end_points() {
    let world = ShopWorld::seeded();
    let (mut tx, recorder) = recording(&world);

    tx.set_related_object(&world.data.order1, "OrderTicket", Some(&world.data.order_ticket2))
        .unwrap();

    let events = recorder.events_matching("relation_chang");
    assert_eq!(events.len(), 8);
    assert!(events[..4].iter().all(|e| e.starts_with("relation_changing")));
    assert_eq!(
        events[4..],
        [
            "relation_changed Order.OrderTicket",
            "relation_changed OrderTicket.Order",
            "relation_changed Order.OrderTicket",
            "relation_changed OrderTicket.Order",
        ]
    );
}

#[test]
fn vetoed_relation_change_leaves_every_end_point_untouched() {
    let world = ShopWorld::seeded();
    let (mut tx, recorder) = recording(&world);
    tx.add_extension(Arc::new(VetoExtension::new(VetoPoint::RelationChanging)))
        .unwrap();
    let d = &world.data;

    let err = tx
        .set_related_object(&d.order1, "Customer", Some(&d.customer2))
        .unwrap_err();

    assert!(matches!(err, CoreError::InvalidOperation { .. }));
    assert_eq!(recorder.events_matching("relation_chang"), vec!["relation_changing Order.Customer"]);
    assert_eq!(tx.get_related_object(&d.order1, "Customer").unwrap(), Some(d.customer1.clone()));
    assert_eq!(tx.get_related_objects(&d.customer2, "Orders").unwrap(), vec![d.order3.clone()]);
    assert!(!tx.has_changed());
}

#[test]
fn vetoes_cancel_before_anything_changes() {
    let world = ShopWorld::seeded();
    let d = &world.data;

    let mut tx = world.transaction();
    tx.add_extension(Arc::new(VetoExtension::new(VetoPoint::NewObject)))
        .unwrap();
    assert!(tx.new_object("Order").is_err());
    assert!(tx.loaded_object_ids().is_empty());
    assert_eq!(tx.stats().objects_created(), 0);

    let mut tx = world.transaction();
    tx.add_extension(Arc::new(VetoExtension::new(VetoPoint::Loading)))
        .unwrap();
    assert!(tx.get_object(&d.customer1).is_err());
    assert!(!tx.is_loaded(&d.customer1));

    let mut tx = world.transaction();
    tx.add_extension(Arc::new(VetoExtension::new(VetoPoint::Deleting)))
        .unwrap();
    assert!(tx.delete(&d.client1).is_err());
    assert_eq!(tx.state(&d.client1), ObjectState::Unchanged);

    let mut tx = world.transaction();
    tx.add_extension(Arc::new(VetoExtension::new(VetoPoint::PropertyChanging)))
        .unwrap();
    assert!(tx.set_value(&d.customer1, "Name", "Ann").is_err());
    assert_eq!(tx.get_value(&d.customer1, "Name").unwrap(), Value::from("Kim"));
}

#[test]
fn deletes_and_unloads_are_reported() {
    let world = ShopWorld::seeded();
    let (mut tx, recorder) = recording(&world);
    tx.get_object(&world.data.customer1).unwrap();
    recorder.clear();

    assert!(tx.unload_object(&world.data.customer1).unwrap());
    tx.delete(&world.data.order3).unwrap();
    tx.delete(&world.data.order3).unwrap();

    assert_eq!(
        recorder.events(),
        vec![
            "objects_unloading 1",
            "objects_unloaded 1",
            "objects_loading 1",
            "objects_loaded 1",
            "object_deleting Order",
            "object_deleted Order",
        ]
    );
}

#[test]
fn get_objects_loads_in_one_batch() {
    let world = ShopWorld::seeded();
    let (mut tx, recorder) = recording(&world);
    let d = &world.data;
    tx.get_object(&d.customer1).unwrap();
    recorder.clear();

    tx.get_objects(&[d.customer1.clone(), d.customer2.clone(), d.order1.clone(), d.customer2.clone()])
        .unwrap();

    assert_eq!(recorder.events(), vec!["objects_loading 2", "objects_loaded 2"]);
}

#[test]
fn commit_notifies_in_sequence() {
    let world = ShopWorld::seeded();
    let (mut tx, recorder) = recording(&world);
    tx.set_value(&world.data.customer1, "Name", "Ann").unwrap();
    recorder.clear();

    tx.commit().unwrap();

    assert_eq!(recorder.events(), vec!["committing 1", "commit_validate 1", "committed 1"]);
}

#[test]
fn vetoed_commit_writes_nothing() {
    for point in [VetoPoint::Committing, VetoPoint::CommitValidate] {
        let world = ShopWorld::seeded();
        let (mut tx, recorder) = recording(&world);
        tx.add_extension(Arc::new(VetoExtension::new(point))).unwrap();
        tx.set_value(&world.data.customer1, "Name", "Ann").unwrap();

        assert!(matches!(tx.commit(), Err(CoreError::InvalidOperation { .. })));

        assert!(recorder.events_matching("committed").is_empty());
        assert_eq!(tx.state(&world.data.customer1), ObjectState::Changed);
        assert_eq!(tx.stats().failed_commits(), 1);
        let stored = stored_record(world.store(), &world.data.customer1).unwrap();
        assert_eq!(stored.values.get("Name"), Some(&Value::from("Kim")));
    }
}

#[test]
fn committing_hooks_may_change_the_commit_set() {
    let world = ShopWorld::seeded();
    let recorder = Arc::new(RecordingExtension::new("rec"));
    let mut tx = world
        .builder()
        .extension(Arc::new(SetOnCommitExtension::new(
            world.data.customer1.clone(),
            "CustomerSince",
            1999,
        )))
        .extension(recorder.clone())
        .build()
        .unwrap();
    tx.set_value(&world.data.customer2, "Name", "Lea").unwrap();

    tx.commit().unwrap();

    assert_eq!(
        recorder.events_matching("commit"),
        vec!["committing 1", "commit_validate 2", "committed 2"]
    );
    let stored = stored_record(world.store(), &world.data.customer1).unwrap();
    assert_eq!(stored.values.get("CustomerSince"), Some(&Value::Integer(1999)));
    assert!(!tx.has_changed());
}

#[test]
fn extensions_added_while_committing_join_from_the_next_hook() {
    struct AddRecorder(Arc<RecordingExtension>);

    impl ClientTransactionExtension for AddRecorder {
        fn key(&self) -> &str {
            "add-recorder"
        }

        fn committing(&self, tx: &mut ClientTransaction, _ids: &[ObjectId]) -> CoreResult<()> {
            tx.add_extension(self.0.clone())
        }
    }

    let world = ShopWorld::seeded();
    let recorder = Arc::new(RecordingExtension::new("late"));
    let mut tx = world
        .builder()
        .extension(Arc::new(AddRecorder(recorder.clone())))
        .build()
        .unwrap();
    tx.set_value(&world.data.customer1, "Name", "Ann").unwrap();

    tx.commit().unwrap();

    assert_eq!(recorder.events(), vec!["commit_validate 1", "committed 1"]);
}

#[test]
fn rollback_notifies_and_can_be_vetoed() {
    let world = ShopWorld::seeded();
    let (mut tx, recorder) = recording(&world);
    tx.set_value(&world.data.customer1, "Name", "Ann").unwrap();
    tx.new_object("Order").unwrap();
    recorder.clear();

    tx.rollback().unwrap();
    assert_eq!(recorder.events(), vec!["rolling_back 2", "rolled_back 2"]);

    tx.add_extension(Arc::new(VetoExtension::new(VetoPoint::RollingBack)))
        .unwrap();
    tx.set_value(&world.data.customer1, "Name", "Ann").unwrap();
    assert!(tx.rollback().is_err());
    assert_eq!(tx.state(&world.data.customer1), ObjectState::Changed);
}

#[test]
fn discarding_a_root_transaction_is_reported() {
    let world = ShopWorld::seeded();
    let (tx, recorder) = recording(&world);

    assert!(tx.discard().is_none());
    assert_eq!(recorder.events(), vec!["transaction_initialize", "transaction_discard"]);
}
