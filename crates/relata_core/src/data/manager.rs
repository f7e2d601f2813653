//! In-memory object graph of one client transaction.

use crate::data::{ContainerState, DataContainer, EndPointData, PersistableData, RelationValue};
use crate::error::CoreResult;
use crate::mapping::MappingConfiguration;
use crate::object::ObjectId;
use crate::types::{ObjectState, ValueAccess};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Owns the data containers, loaded virtual end-points and invalid objects.
///
/// Object state is derived from the stored values on every query, so reverting
/// a change returns an object to `Unchanged`.
#[derive(Debug, Clone, Default)]
pub(crate) struct DataManager {
    containers: HashMap<ObjectId, DataContainer>,
    order: Vec<ObjectId>,
    end_points: HashMap<ObjectId, BTreeMap<String, EndPointData>>,
    invalid: HashSet<ObjectId>,
}

impl DataManager {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register(&mut self, container: DataContainer) {
        let id = container.id().clone();
        if self.containers.insert(id.clone(), container).is_none() {
            self.order.push(id);
        }
    }

    pub(crate) fn contains(&self, id: &ObjectId) -> bool {
        self.containers.contains_key(id)
    }

    pub(crate) fn container(&self, id: &ObjectId) -> Option<&DataContainer> {
        self.containers.get(id)
    }

    pub(crate) fn container_mut(&mut self, id: &ObjectId) -> Option<&mut DataContainer> {
        self.containers.get_mut(id)
    }

    pub(crate) fn is_invalid(&self, id: &ObjectId) -> bool {
        self.invalid.contains(id)
    }

    pub(crate) fn state(&self, id: &ObjectId) -> ObjectState {
        if self.invalid.contains(id) {
            return ObjectState::Invalid;
        }
        let Some(container) = self.containers.get(id) else {
            return ObjectState::NotLoadedYet;
        };
        match container.state() {
            ContainerState::New => ObjectState::New,
            ContainerState::Deleted => ObjectState::Deleted,
            ContainerState::Existing => {
                let end_point_changed = self
                    .end_points
                    .get(id)
                    .is_some_and(|eps| eps.values().any(EndPointData::has_changed));
                if container.has_changed_values() || end_point_changed {
                    ObjectState::Changed
                } else {
                    ObjectState::Unchanged
                }
            }
        }
    }

    /// Loaded objects in registration order.
    pub(crate) fn loaded_ids(&self) -> Vec<ObjectId> {
        self.order.clone()
    }

    /// New, Changed and Deleted objects in registration order.
    pub(crate) fn changed_ids(&self) -> Vec<ObjectId> {
        self.order
            .iter()
            .filter(|id| self.state(id).is_changed())
            .cloned()
            .collect()
    }

    pub(crate) fn containers_of_class<'a>(
        &'a self,
        class_id: &'a str,
    ) -> impl Iterator<Item = &'a DataContainer> + 'a {
        self.order
            .iter()
            .filter(move |id| id.class_id() == class_id)
            .filter_map(|id| self.containers.get(id))
    }

    pub(crate) fn end_point(&self, id: &ObjectId, property_name: &str) -> Option<&EndPointData> {
        self.end_points.get(id)?.get(property_name)
    }

    pub(crate) fn end_point_mut(
        &mut self,
        id: &ObjectId,
        property_name: &str,
    ) -> Option<&mut EndPointData> {
        self.end_points.get_mut(id)?.get_mut(property_name)
    }

    pub(crate) fn insert_end_point(&mut self, id: &ObjectId, property_name: &str, data: EndPointData) {
        self.end_points
            .entry(id.clone())
            .or_default()
            .insert(property_name.to_string(), data);
    }

    /// Discards an object; every later access reports it as invalid.
    pub(crate) fn invalidate(&mut self, id: &ObjectId) {
        self.remove(id);
        self.invalid.insert(id.clone());
        for end_points in self.end_points.values_mut() {
            for data in end_points.values_mut() {
                data.forget(id);
            }
        }
    }

    /// Forgets an object so that the next access loads it again.
    pub(crate) fn unload(&mut self, id: &ObjectId) {
        self.remove(id);
    }

    fn remove(&mut self, id: &ObjectId) {
        self.containers.remove(id);
        self.end_points.remove(id);
        self.order.retain(|i| i != id);
    }

    /// Builds the persistable snapshots of all changed objects.
    pub(crate) fn persistable_data(
        &self,
        mapping: &MappingConfiguration,
    ) -> CoreResult<Vec<PersistableData>> {
        let mut result = Vec::new();
        for id in &self.order {
            let state = self.state(id);
            if !state.is_changed() {
                continue;
            }
            let Some(container) = self.containers.get(id) else {
                continue;
            };
            let class = mapping.class(id.class_id())?;
            let mut end_points = BTreeMap::new();
            for definition in class.end_points() {
                let name = definition.property_name();
                if definition.is_virtual() {
                    if let Some(data) = self.end_point(id, name) {
                        end_points.insert(name.to_string(), data.value(ValueAccess::Current));
                    }
                } else {
                    let related = container
                        .value(name, ValueAccess::Current)
                        .and_then(|v| v.as_reference())
                        .cloned();
                    end_points.insert(name.to_string(), RelationValue::Object(related));
                }
            }
            result.push(PersistableData::new(state, container.clone(), end_points));
        }
        Ok(result)
    }

    /// Accepts all changes. Returns the objects that became invalid.
    ///
    /// With `bump_timestamps` the changed objects take the timestamp written
    /// to storage.
    pub(crate) fn commit(&mut self, bump_timestamps: bool) -> Vec<ObjectId> {
        let mut invalidated = Vec::new();
        for id in self.changed_ids() {
            match self.state(&id) {
                ObjectState::Deleted => invalidated.push(id),
                ObjectState::New | ObjectState::Changed => {
                    if let Some(container) = self.containers.get_mut(&id) {
                        let timestamp = bump_timestamps
                            .then(|| container.timestamp().unwrap_or(0) + 1);
                        container.commit(timestamp);
                    }
                }
                _ => {}
            }
        }
        for id in &invalidated {
            self.invalidate(id);
        }
        for end_points in self.end_points.values_mut() {
            for data in end_points.values_mut() {
                data.commit();
            }
        }
        invalidated
    }

    /// Restores originals. Returns the new objects that were discarded.
    pub(crate) fn rollback(&mut self) -> Vec<ObjectId> {
        let discarded: Vec<ObjectId> = self
            .order
            .iter()
            .filter(|id| {
                self.containers
                    .get(id)
                    .is_some_and(DataContainer::is_created_in_transaction)
            })
            .cloned()
            .collect();
        for id in &discarded {
            self.invalidate(id);
        }
        for container in self.containers.values_mut() {
            container.rollback();
        }
        for end_points in self.end_points.values_mut() {
            for data in end_points.values_mut() {
                data.rollback();
            }
        }
        discarded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{ClassDefinition, EndPoint, PropertyDefinition};
    use crate::object::Value;

    fn mapping() -> MappingConfiguration {
        MappingConfiguration::builder()
            .class(ClassDefinition::new("Shop", "Customer").property(PropertyDefinition::text("Name")))
            .class(ClassDefinition::new("Shop", "Order"))
            .one_to_many(
                EndPoint::new("Customer", "Orders").mandatory(),
                EndPoint::new("Order", "Customer"),
            )
            .build()
            .unwrap()
    }

    fn existing_customer(name: &str) -> DataContainer {
        let mut values = BTreeMap::new();
        values.insert("Name".to_string(), Value::from(name));
        DataContainer::existing(ObjectId::new("Customer"), 1, values)
    }

    #[test]
    fn unknown_ids_are_not_loaded_yet() {
        let data = DataManager::new();
        assert_eq!(data.state(&ObjectId::new("Customer")), ObjectState::NotLoadedYet);
    }

    #[test]
    fn state_follows_values() {
        let mut data = DataManager::new();
        let container = existing_customer("A");
        let id = container.id().clone();
        data.register(container);
        assert_eq!(data.state(&id), ObjectState::Unchanged);

        data.container_mut(&id).unwrap().set_value("Name", Value::from("B"));
        assert_eq!(data.state(&id), ObjectState::Changed);
        assert_eq!(data.changed_ids(), vec![id.clone()]);

        data.container_mut(&id).unwrap().set_value("Name", Value::from("A"));
        assert_eq!(data.state(&id), ObjectState::Unchanged);
    }

    #[test]
    fn end_point_change_marks_owner_changed() {
        let mut data = DataManager::new();
        let container = existing_customer("A");
        let id = container.id().clone();
        data.register(container);
        data.insert_end_point(&id, "Orders", EndPointData::empty(true));
        data.end_point_mut(&id, "Orders")
            .unwrap()
            .insert(0, ObjectId::new("Order"));
        assert_eq!(data.state(&id), ObjectState::Changed);
    }

    #[test]
    fn commit_invalidates_deleted_and_bumps_timestamps() {
        let mapping = mapping();
        let mut data = DataManager::new();
        let keep = existing_customer("A");
        let keep_id = keep.id().clone();
        let gone = existing_customer("B");
        let gone_id = gone.id().clone();
        data.register(keep);
        data.register(gone);
        data.container_mut(&keep_id).unwrap().set_value("Name", Value::from("C"));
        data.container_mut(&gone_id).unwrap().mark_deleted();

        let persistable = data.persistable_data(&mapping).unwrap();
        assert_eq!(persistable.len(), 2);
        assert_eq!(persistable[0].state(), ObjectState::Changed);
        assert_eq!(persistable[1].state(), ObjectState::Deleted);

        let invalidated = data.commit(true);
        assert_eq!(invalidated, vec![gone_id.clone()]);
        assert_eq!(data.state(&gone_id), ObjectState::Invalid);
        assert_eq!(data.state(&keep_id), ObjectState::Unchanged);
        assert_eq!(data.container(&keep_id).unwrap().timestamp(), Some(2));
    }

    #[test]
    fn rollback_discards_new_objects() {
        let mapping = mapping();
        let mut data = DataManager::new();
        let class = mapping.class("Order").unwrap();
        let order = DataContainer::new_object(ObjectId::new("Order"), class);
        let order_id = order.id().clone();
        data.register(order);
        let customer = existing_customer("A");
        let customer_id = customer.id().clone();
        data.register(customer);
        data.insert_end_point(&customer_id, "Orders", EndPointData::empty(true));
        data.end_point_mut(&customer_id, "Orders")
            .unwrap()
            .insert(0, order_id.clone());

        assert_eq!(data.rollback(), vec![order_id.clone()]);
        assert_eq!(data.state(&order_id), ObjectState::Invalid);
        assert_eq!(data.state(&customer_id), ObjectState::Unchanged);
        assert_eq!(data.loaded_ids(), vec![customer_id]);
    }

    #[test]
    fn persistable_contains_foreign_keys_and_loaded_end_points() {
        let mapping = mapping();
        let mut data = DataManager::new();
        let class = mapping.class("Order").unwrap();
        let order = DataContainer::new_object(ObjectId::new("Order"), class);
        let order_id = order.id().clone();
        data.register(order);

        let persistable = data.persistable_data(&mapping).unwrap();
        assert_eq!(
            persistable[0].end_point("Customer"),
            Some(&RelationValue::Object(None))
        );
        assert_eq!(persistable[0].id(), &order_id);
    }
}
