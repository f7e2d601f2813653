//! Query execution.

use crate::error::{CoreError, CoreResult};
use crate::object::{DomainObject, ObjectId};
use crate::query::{CustomQuery, Query, QueryResult, QueryRow};
use crate::transaction::ClientTransaction;

impl ClientTransaction {
    /// Executes an object query.
    ///
    /// Objects that are already loaded keep their in-transaction state and
    /// invalid objects are left out. The result passes through every
    /// extension's `filter_query_result` in registration order.
    pub fn query(&mut self, query: &Query) -> CoreResult<QueryResult> {
        let ids = self.execute_query(query)?;
        self.stats.record_query();
        let mut result = QueryResult::new(query.class_id(), ids);
        for extension in self.extensions.snapshot() {
            result = extension.filter_query_result(self, result);
        }
        tracing::trace!(transaction = %self.id, class = query.class_id(), results = result.len(), "query executed");
        Ok(result)
    }

    /// Executes an object query and returns typed handles.
    pub fn query_typed<T: DomainObject>(&mut self, query: &Query) -> CoreResult<Vec<T>> {
        if query.class_id() != T::CLASS_ID {
            return Err(CoreError::invalid_operation(format!(
                "query for class '{}' cannot return '{}' objects",
                query.class_id(),
                T::CLASS_ID
            )));
        }
        Ok(self
            .query(query)?
            .into_ids()
            .into_iter()
            .map(T::from_id)
            .collect())
    }

    /// Executes a projection without loading objects.
    pub fn custom_query(&mut self, query: &CustomQuery) -> CoreResult<Vec<QueryRow>> {
        let mut rows = self.execute_custom_query(query)?;
        self.stats.record_query();
        for extension in self.extensions.snapshot() {
            rows = extension.filter_custom_query_result(self, query, rows);
        }
        tracing::trace!(transaction = %self.id, class = query.query().class_id(), rows = rows.len(), "custom query executed");
        Ok(rows)
    }

    pub(crate) fn execute_query(&mut self, query: &Query) -> CoreResult<Vec<ObjectId>> {
        self.check_query(query)?;
        let containers = self.source.query(query)?;
        let ids: Vec<ObjectId> = containers
            .iter()
            .map(|c| c.id().clone())
            .filter(|id| !self.data.is_invalid(id))
            .collect();
        self.register_loaded(containers)?;
        Ok(ids)
    }

    pub(crate) fn execute_custom_query(&mut self, query: &CustomQuery) -> CoreResult<Vec<QueryRow>> {
        self.check_query(query.query())?;
        let class = self.mapping.class(query.query().class_id())?;
        for column in query.columns() {
            if class.get_property(column).is_none() {
                return Err(CoreError::unknown_property(class.id(), column.as_str()));
            }
        }
        self.source.custom_query(query)
    }

    fn check_query(&self, query: &Query) -> CoreResult<()> {
        let class = self.mapping.class(query.class_id())?;
        for property in query.referenced_properties() {
            if class.get_property(property).is_none() {
                return Err(CoreError::unknown_property(class.id(), property));
            }
        }
        Ok(())
    }
}
