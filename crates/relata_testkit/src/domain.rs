//! Typed handles for the shop fixture classes.

use relata_core::{ClientTransaction, CoreResult, DomainObject, ObjectId};

macro_rules! domain_object {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(ObjectId);

        impl DomainObject for $name {
            const CLASS_ID: &'static str = stringify!($name);

            fn from_id(id: ObjectId) -> Self {
                Self(id)
            }

            fn id(&self) -> &ObjectId {
                &self.0
            }
        }
    };
}

domain_object!(
    /// A customer; owns at least one order.
    Customer
);
domain_object!(
    /// An order of one customer with at least one item and exactly one ticket.
    Order
);
domain_object!(
    /// One position of an order.
    OrderItem
);
domain_object!(
    /// The ticket printed for an order.
    OrderTicket
);
domain_object!(
    /// A location, optionally pointing at a client.
    Location
);
domain_object!(
    /// A client without relations of its own.
    Client
);
domain_object!(
    /// A company, optionally led by a CEO.
    Company
);
domain_object!(
    /// The CEO of exactly one company.
    Ceo
);

impl Customer {
    /// Returns the customer's name.
    pub fn name(&self, tx: &mut ClientTransaction) -> CoreResult<Option<String>> {
        Ok(self.value(tx, "Name")?.as_text().map(str::to_string))
    }

    /// Returns the customer's orders.
    pub fn orders(&self, tx: &mut ClientTransaction) -> CoreResult<Vec<Order>> {
        self.related_all(tx, "Orders")
    }
}

impl Order {
    /// Returns the order number.
    pub fn number(&self, tx: &mut ClientTransaction) -> CoreResult<i64> {
        Ok(self.value(tx, "OrderNumber")?.as_integer().unwrap_or_default())
    }

    /// Returns the ordering customer.
    pub fn customer(&self, tx: &mut ClientTransaction) -> CoreResult<Option<Customer>> {
        self.related(tx, "Customer")
    }

    /// Moves the order to another customer.
    pub fn set_customer(&self, tx: &mut ClientTransaction, customer: Option<&Customer>) -> CoreResult<()> {
        tx.set_related_object(self.id(), "Customer", customer.map(DomainObject::id))
    }

    /// Returns the order items.
    pub fn items(&self, tx: &mut ClientTransaction) -> CoreResult<Vec<OrderItem>> {
        self.related_all(tx, "OrderItems")
    }

    /// Returns the order ticket.
    pub fn ticket(&self, tx: &mut ClientTransaction) -> CoreResult<Option<OrderTicket>> {
        self.related(tx, "OrderTicket")
    }
}

impl OrderItem {
    /// Returns the product name.
    pub fn product(&self, tx: &mut ClientTransaction) -> CoreResult<Option<String>> {
        Ok(self.value(tx, "Product")?.as_text().map(str::to_string))
    }

    /// Returns the order the item belongs to.
    pub fn order(&self, tx: &mut ClientTransaction) -> CoreResult<Option<Order>> {
        self.related(tx, "Order")
    }
}

impl OrderTicket {
    /// Returns the order the ticket was printed for.
    pub fn order(&self, tx: &mut ClientTransaction) -> CoreResult<Option<Order>> {
        self.related(tx, "Order")
    }
}

impl Company {
    /// Returns the CEO.
    pub fn ceo(&self, tx: &mut ClientTransaction) -> CoreResult<Option<Ceo>> {
        self.related(tx, "Ceo")
    }
}

impl Ceo {
    /// Returns the company.
    pub fn company(&self, tx: &mut ClientTransaction) -> CoreResult<Option<Company>> {
        self.related(tx, "Company")
    }
}
