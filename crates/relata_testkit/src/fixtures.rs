//! Test fixtures and seeded stores.
//!
//! The shop domain used throughout the test suite:
//!
//! | class | relations |
//! |---|---|
//! | Customer | `Orders` (mandatory collection) |
//! | Order | `Customer` (mandatory), `OrderItems` (mandatory collection), `OrderTicket` (mandatory) |
//! | OrderItem | `Order` (mandatory) |
//! | OrderTicket | `Order` (mandatory) |
//! | Company | `Ceo` (optional) |
//! | Ceo | `Company` (mandatory) |
//! | Location | `Client` (optional, unidirectional) |
//! | Client | none |

use relata_core::{
    ClassDefinition, ClientTransaction, Config, EndPoint, MappingConfiguration, ObjectId,
    PropertyDefinition, RecordStorageProvider, StoredRecord, TransactionBuilder, Value,
};
use relata_storage::{InMemoryRecordStore, RecordKey, RecordStore, RecordWrite};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Namespace of the shop classes.
pub const SHOP_NAMESPACE: &str = "Shop";

/// Builds the shop mapping.
pub fn shop_mapping() -> Arc<MappingConfiguration> {
    let mapping = MappingConfiguration::builder()
        .class(
            ClassDefinition::new(SHOP_NAMESPACE, "Customer")
                .property(PropertyDefinition::text("Name").not_nullable().max_length(100))
                .property(PropertyDefinition::integer("CustomerSince")),
        )
        .class(
            ClassDefinition::new(SHOP_NAMESPACE, "Order")
                .property(PropertyDefinition::integer("OrderNumber").not_nullable())
                .property(PropertyDefinition::text("DeliveryDate")),
        )
        .class(
            ClassDefinition::new(SHOP_NAMESPACE, "OrderItem")
                .property(PropertyDefinition::integer("Position").not_nullable())
                .property(PropertyDefinition::text("Product").max_length(100)),
        )
        .class(
            ClassDefinition::new(SHOP_NAMESPACE, "OrderTicket")
                .property(PropertyDefinition::text("FileName").max_length(255)),
        )
        .class(
            ClassDefinition::new(SHOP_NAMESPACE, "Company")
                .property(PropertyDefinition::text("Name")),
        )
        .class(ClassDefinition::new(SHOP_NAMESPACE, "Ceo").property(PropertyDefinition::text("Name")))
        .class(ClassDefinition::new(SHOP_NAMESPACE, "Location").property(PropertyDefinition::text("City")))
        .class(ClassDefinition::new(SHOP_NAMESPACE, "Client").property(PropertyDefinition::text("Name")))
        .one_to_many(
            EndPoint::new("Customer", "Orders").mandatory(),
            EndPoint::new("Order", "Customer").mandatory(),
        )
        .one_to_many(
            EndPoint::new("Order", "OrderItems").mandatory(),
            EndPoint::new("OrderItem", "Order").mandatory(),
        )
        .one_to_one(
            EndPoint::new("Order", "OrderTicket").mandatory(),
            EndPoint::new("OrderTicket", "Order").mandatory(),
        )
        .one_to_one(EndPoint::new("Company", "Ceo"), EndPoint::new("Ceo", "Company").mandatory())
        .unidirectional(EndPoint::new("Location", "Client"), "Client")
        .build()
        .expect("shop mapping is valid");
    Arc::new(mapping)
}

/// Ids of the objects written by [`seed_shop`].
///
/// - customer1 owns order1 (items 1 and 2, ticket 1) and order2 (item 3, ticket 2)
/// - customer2 owns order3 (item 4, ticket 3)
/// - company1 is led by ceo1, company2 has no CEO
/// - location1 points at client1, location2 at nothing
#[derive(Debug, Clone)]
pub struct ShopData {
    /// "Kim", customer since 2001.
    pub customer1: ObjectId,
    /// "Lee", customer since 2015.
    pub customer2: ObjectId,
    /// Order number 1.
    pub order1: ObjectId,
    /// Order number 2.
    pub order2: ObjectId,
    /// Order number 3.
    pub order3: ObjectId,
    /// First item of order1.
    pub order_item1: ObjectId,
    /// Second item of order1.
    pub order_item2: ObjectId,
    /// Only item of order2.
    pub order_item3: ObjectId,
    /// Only item of order3.
    pub order_item4: ObjectId,
    /// Ticket of order1.
    pub order_ticket1: ObjectId,
    /// Ticket of order2.
    pub order_ticket2: ObjectId,
    /// Ticket of order3.
    pub order_ticket3: ObjectId,
    /// Company with a CEO.
    pub company1: ObjectId,
    /// Company without a CEO.
    pub company2: ObjectId,
    /// CEO of company1.
    pub ceo1: ObjectId,
    /// Location pointing at client1.
    pub location1: ObjectId,
    /// Location without a client.
    pub location2: ObjectId,
    /// Client referenced by location1.
    pub client1: ObjectId,
}

/// Writes one object record with timestamp 1.
pub fn put_record<S: RecordStore>(store: &S, id: &ObjectId, values: Vec<(&str, Value)>) {
    let values: BTreeMap<String, Value> = values
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect();
    let payload = StoredRecord::new(1, values)
        .encode()
        .expect("Failed to encode record");
    store
        .apply(&[RecordWrite::put(
            RecordKey::new(id.class_id(), *id.as_bytes()),
            payload,
        )])
        .expect("Failed to write record");
}

/// Reads the stored record of an object, bypassing every transaction.
pub fn stored_record<S: RecordStore>(store: &S, id: &ObjectId) -> Option<StoredRecord> {
    store
        .get(&RecordKey::new(id.class_id(), *id.as_bytes()))
        .expect("Failed to read record")
        .map(|bytes| StoredRecord::decode(&bytes).expect("Failed to decode record"))
}

/// Seeds a store with a consistent shop object graph.
pub fn seed_shop<S: RecordStore>(store: &S) -> ShopData {
    let data = ShopData {
        customer1: ObjectId::new("Customer"),
        customer2: ObjectId::new("Customer"),
        order1: ObjectId::new("Order"),
        order2: ObjectId::new("Order"),
        order3: ObjectId::new("Order"),
        order_item1: ObjectId::new("OrderItem"),
        order_item2: ObjectId::new("OrderItem"),
        order_item3: ObjectId::new("OrderItem"),
        order_item4: ObjectId::new("OrderItem"),
        order_ticket1: ObjectId::new("OrderTicket"),
        order_ticket2: ObjectId::new("OrderTicket"),
        order_ticket3: ObjectId::new("OrderTicket"),
        company1: ObjectId::new("Company"),
        company2: ObjectId::new("Company"),
        ceo1: ObjectId::new("Ceo"),
        location1: ObjectId::new("Location"),
        location2: ObjectId::new("Location"),
        client1: ObjectId::new("Client"),
    };
    let r = |id: &ObjectId| Value::Reference(id.clone());

    put_record(
        store,
        &data.customer1,
        vec![("Name", "Kim".into()), ("CustomerSince", 2001.into())],
    );
    put_record(
        store,
        &data.customer2,
        vec![("Name", "Lee".into()), ("CustomerSince", 2015.into())],
    );
    for (order, number, customer) in [
        (&data.order1, 1, &data.customer1),
        (&data.order2, 2, &data.customer1),
        (&data.order3, 3, &data.customer2),
    ] {
        put_record(
            store,
            order,
            vec![("OrderNumber", number.into()), ("Customer", r(customer))],
        );
    }
    for (item, position, product, order) in [
        (&data.order_item1, 1, "Mainboard", &data.order1),
        (&data.order_item2, 2, "CPU Fan", &data.order1),
        (&data.order_item3, 1, "Harddisk", &data.order2),
        (&data.order_item4, 1, "Keyboard", &data.order3),
    ] {
        put_record(
            store,
            item,
            vec![
                ("Position", position.into()),
                ("Product", product.into()),
                ("Order", r(order)),
            ],
        );
    }
    for (ticket, file, order) in [
        (&data.order_ticket1, "ticket1.txt", &data.order1),
        (&data.order_ticket2, "ticket2.txt", &data.order2),
        (&data.order_ticket3, "ticket3.txt", &data.order3),
    ] {
        put_record(
            store,
            ticket,
            vec![("FileName", file.into()), ("Order", r(order))],
        );
    }
    put_record(store, &data.company1, vec![("Name", "Acme".into())]);
    put_record(store, &data.company2, vec![("Name", "Initech".into())]);
    put_record(
        store,
        &data.ceo1,
        vec![("Name", "Ada".into()), ("Company", r(&data.company1))],
    );
    put_record(store, &data.client1, vec![("Name", "Globex".into())]);
    put_record(
        store,
        &data.location1,
        vec![("City", "Vienna".into()), ("Client", r(&data.client1))],
    );
    put_record(store, &data.location2, vec![("City", "Graz".into())]);
    data
}

/// A seeded shop store shared by any number of transactions.
pub struct ShopWorld<S: RecordStore = Arc<InMemoryRecordStore>> {
    /// The shop mapping.
    pub mapping: Arc<MappingConfiguration>,
    /// Storage provider over the seeded store.
    pub storage: Arc<RecordStorageProvider<S>>,
    /// Ids of the seeded objects.
    pub data: ShopData,
}

impl ShopWorld {
    /// Creates an in-memory store seeded with [`seed_shop`].
    pub fn seeded() -> Self {
        Self::with_store(Arc::new(InMemoryRecordStore::new()))
    }
}

impl<S: RecordStore + 'static> ShopWorld<S> {
    /// Seeds the given store.
    pub fn with_store(store: S) -> Self {
        let data = seed_shop(&store);
        let mapping = shop_mapping();
        let storage = Arc::new(RecordStorageProvider::new(store, Arc::clone(&mapping)));
        Self {
            mapping,
            storage,
            data,
        }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        self.storage.store()
    }

    /// Starts a root transaction with the default configuration.
    pub fn transaction(&self) -> ClientTransaction {
        ClientTransaction::new(Arc::clone(&self.mapping), self.storage.clone())
    }

    /// Starts building a root transaction over the store.
    pub fn builder(&self) -> TransactionBuilder {
        ClientTransaction::builder(Arc::clone(&self.mapping)).storage(self.storage.clone())
    }

    /// Starts a root transaction with the given configuration.
    pub fn transaction_with(&self, config: Config) -> ClientTransaction {
        self.builder()
            .config(config)
            .build()
            .expect("Failed to build transaction")
    }
}

/// Creates a complete new order for `customer`: one item and one ticket.
pub fn new_complete_order(tx: &mut ClientTransaction, customer: &ObjectId, number: i64) -> ObjectId {
    let order = tx.new_object("Order").expect("Failed to create order");
    tx.set_value(&order, "OrderNumber", number)
        .expect("Failed to set order number");
    tx.set_related_object(&order, "Customer", Some(customer))
        .expect("Failed to set customer");

    let item = tx.new_object("OrderItem").expect("Failed to create item");
    tx.set_value(&item, "Product", "Monitor")
        .expect("Failed to set product");
    tx.add_related_object(&order, "OrderItems", &item)
        .expect("Failed to add item");

    let ticket = tx.new_object("OrderTicket").expect("Failed to create ticket");
    tx.set_related_object(&order, "OrderTicket", Some(&ticket))
        .expect("Failed to set ticket");
    order
}
