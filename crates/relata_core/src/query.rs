//! Object queries and projections.

use crate::object::{ObjectId, Value};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Sort direction of an ordering clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Smallest first.
    Ascending,
    /// Largest first.
    Descending,
}

/// Query over the stored objects of one class.
///
/// ```rust,ignore
/// let query = Query::new("Order")
///     .where_eq("Customer", customer_id.clone())
///     .order_by("OrderNumber", SortOrder::Ascending)
///     .limit(10);
/// let orders = tx.query(&query)?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    class_id: String,
    conditions: Vec<(String, Value)>,
    ordering: Vec<(String, SortOrder)>,
    limit: Option<usize>,
}

impl Query {
    /// Creates a query returning every object of the class.
    pub fn new(class_id: impl Into<String>) -> Self {
        Self {
            class_id: class_id.into(),
            conditions: Vec::new(),
            ordering: Vec::new(),
            limit: None,
        }
    }

    /// Adds an equality condition.
    #[must_use]
    pub fn where_eq(mut self, property: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((property.into(), value.into()));
        self
    }

    /// Adds an ordering clause; earlier clauses take precedence.
    #[must_use]
    pub fn order_by(mut self, property: impl Into<String>, order: SortOrder) -> Self {
        self.ordering.push((property.into(), order));
        self
    }

    /// Limits the number of results.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns the queried class.
    pub fn class_id(&self) -> &str {
        &self.class_id
    }

    /// Returns the equality conditions.
    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    /// Returns the ordering clauses.
    pub fn ordering(&self) -> &[(String, SortOrder)] {
        &self.ordering
    }

    /// Returns the result limit.
    pub fn max_results(&self) -> Option<usize> {
        self.limit
    }

    /// Names of all properties the query refers to.
    pub fn referenced_properties(&self) -> impl Iterator<Item = &str> {
        self.conditions
            .iter()
            .map(|(p, _)| p.as_str())
            .chain(self.ordering.iter().map(|(p, _)| p.as_str()))
    }

    /// Returns true if the values satisfy every condition. Missing values count as null.
    pub fn matches(&self, values: &BTreeMap<String, Value>) -> bool {
        self.conditions
            .iter()
            .all(|(property, expected)| values.get(property).unwrap_or(&Value::Null) == expected)
    }

    /// Compares two value sets according to the ordering clauses.
    pub fn compare(&self, a: &BTreeMap<String, Value>, b: &BTreeMap<String, Value>) -> Ordering {
        for (property, order) in &self.ordering {
            let left = a.get(property).unwrap_or(&Value::Null);
            let right = b.get(property).unwrap_or(&Value::Null);
            let ordering = match order {
                SortOrder::Ascending => left.sort_cmp(right),
                SortOrder::Descending => right.sort_cmp(left),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

/// Result of an object query: object IDs in result order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    class_id: String,
    ids: Vec<ObjectId>,
}

impl QueryResult {
    /// Creates a result.
    pub fn new(class_id: impl Into<String>, ids: Vec<ObjectId>) -> Self {
        Self {
            class_id: class_id.into(),
            ids,
        }
    }

    /// Returns the queried class.
    pub fn class_id(&self) -> &str {
        &self.class_id
    }

    /// Returns the object IDs.
    pub fn ids(&self) -> &[ObjectId] {
        &self.ids
    }

    /// Returns the number of objects.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns true if nothing matched.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Returns true if the object is part of the result.
    pub fn contains(&self, id: &ObjectId) -> bool {
        self.ids.contains(id)
    }

    /// Consumes the result, returning the object IDs.
    pub fn into_ids(self) -> Vec<ObjectId> {
        self.ids
    }

    /// Keeps only the objects for which the predicate returns true.
    #[must_use]
    pub fn filter(mut self, predicate: impl Fn(&ObjectId) -> bool) -> Self {
        self.ids.retain(|id| predicate(id));
        self
    }
}

/// Query projecting selected columns instead of loading objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomQuery {
    query: Query,
    columns: Vec<String>,
}

impl CustomQuery {
    /// Creates a projection of the query. Without columns every property is returned.
    pub fn new(query: Query) -> Self {
        Self {
            query,
            columns: Vec::new(),
        }
    }

    /// Adds a column.
    #[must_use]
    pub fn column(mut self, name: impl Into<String>) -> Self {
        self.columns.push(name.into());
        self
    }

    /// Returns the underlying query.
    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Returns the selected columns.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

/// One row of a custom query.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryRow {
    values: Vec<(String, Value)>,
}

impl QueryRow {
    /// Creates a row from column/value pairs.
    pub fn new(values: Vec<(String, Value)>) -> Self {
        Self { values }
    }

    /// Returns the value of a column.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| v)
    }

    /// Returns all columns in projection order.
    pub fn values(&self) -> &[(String, Value)] {
        &self.values
    }
}
