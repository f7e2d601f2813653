//! Property-based test generators using proptest.

use proptest::prelude::*;
use relata_core::{ObjectId, Value};

/// Strategy for generating object ids of one class.
pub fn object_id_strategy(class_id: &'static str) -> impl Strategy<Value = ObjectId> {
    prop::array::uniform16(any::<u8>()).prop_map(move |bytes| ObjectId::from_bytes(class_id, bytes))
}

/// Strategy for generating customer names that satisfy the mapping's length limit.
pub fn name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z][A-Za-z ]{0,40}").expect("Invalid regex")
}

/// Strategy for generating non-reference property values.
pub fn scalar_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Integer),
        ".{0,32}".prop_map(Value::Text),
        prop::collection::vec(any::<u8>(), 0..32).prop_map(Value::Bytes),
    ]
}

/// One edit of a customer's value properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomerEdit {
    /// Set `Name`.
    Name(String),
    /// Set `CustomerSince`.
    Since(i64),
    /// Set `CustomerSince` to null.
    ClearSince,
}

impl CustomerEdit {
    /// Property the edit writes.
    pub fn property(&self) -> &'static str {
        match self {
            CustomerEdit::Name(_) => "Name",
            CustomerEdit::Since(_) | CustomerEdit::ClearSince => "CustomerSince",
        }
    }

    /// Value the edit writes.
    pub fn value(&self) -> Value {
        match self {
            CustomerEdit::Name(name) => Value::from(name.as_str()),
            CustomerEdit::Since(year) => Value::from(*year),
            CustomerEdit::ClearSince => Value::Null,
        }
    }
}

/// Strategy for generating a customer edit.
pub fn customer_edit_strategy() -> impl Strategy<Value = CustomerEdit> {
    prop_oneof![
        name_strategy().prop_map(CustomerEdit::Name),
        (1900i64..2100).prop_map(CustomerEdit::Since),
        Just(CustomerEdit::ClearSince),
    ]
}

/// Strategy for generating a sequence of customer edits.
pub fn customer_edits_strategy(max: usize) -> impl Strategy<Value = Vec<CustomerEdit>> {
    prop::collection::vec(customer_edit_strategy(), 1..=max)
}

/// Strategy for generating a sequence of target indices below `targets`,
/// e.g. the customers an order is moved between.
pub fn move_sequence_strategy(targets: usize, max: usize) -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(0..targets, 1..=max)
}
