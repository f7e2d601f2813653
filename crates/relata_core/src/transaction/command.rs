//! Relation changes.
//!
//! Changing one end of a bidirectional relation changes up to four
//! end-points: the addressed one, its opposite on the old and new related
//! objects, and the end-point of the object the new related object was
//! previously attached to. All of them are collected into one
//! [`RelationChangeCommand`] that notifies every `relation_changing` hook,
//! applies every modification and then notifies every `relation_changed` hook.

use crate::error::{CoreError, CoreResult};
use crate::mapping::RelationEndPointDefinition;
use crate::object::{ObjectId, Value};
use crate::transaction::relations::{collection_end_point, single_end_point};
use crate::transaction::ClientTransaction;
use crate::types::{ObjectState, ValueAccess};
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
enum EndPointModification {
    SetObject {
        id: ObjectId,
        property: String,
        old: Option<ObjectId>,
        new: Option<ObjectId>,
    },
    Insert {
        id: ObjectId,
        property: String,
        index: usize,
        item: ObjectId,
    },
    Remove {
        id: ObjectId,
        property: String,
        item: ObjectId,
    },
}

impl EndPointModification {
    fn id(&self) -> &ObjectId {
        match self {
            Self::SetObject { id, .. } | Self::Insert { id, .. } | Self::Remove { id, .. } => id,
        }
    }

    fn property(&self) -> &str {
        match self {
            Self::SetObject { property, .. }
            | Self::Insert { property, .. }
            | Self::Remove { property, .. } => property,
        }
    }

    fn old_related(&self) -> Option<&ObjectId> {
        match self {
            Self::SetObject { old, .. } => old.as_ref(),
            Self::Insert { .. } => None,
            Self::Remove { item, .. } => Some(item),
        }
    }

    fn new_related(&self) -> Option<&ObjectId> {
        match self {
            Self::SetObject { new, .. } => new.as_ref(),
            Self::Insert { item, .. } => Some(item),
            Self::Remove { .. } => None,
        }
    }
}

#[derive(Debug, Default)]
struct RelationChangeCommand {
    modifications: Vec<EndPointModification>,
}

impl RelationChangeCommand {
    fn set_object(&mut self, id: &ObjectId, property: &str, old: Option<ObjectId>, new: Option<ObjectId>) {
        self.modifications.push(EndPointModification::SetObject {
            id: id.clone(),
            property: property.to_string(),
            old,
            new,
        });
    }

    fn insert(&mut self, id: &ObjectId, property: &str, index: usize, item: &ObjectId) {
        self.modifications.push(EndPointModification::Insert {
            id: id.clone(),
            property: property.to_string(),
            index,
            item: item.clone(),
        });
    }

    fn remove(&mut self, id: &ObjectId, property: &str, item: &ObjectId) {
        self.modifications.push(EndPointModification::Remove {
            id: id.clone(),
            property: property.to_string(),
            item: item.clone(),
        });
    }

    fn execute(self, tx: &mut ClientTransaction) -> CoreResult<()> {
        let extensions = tx.extensions.snapshot();
        for modification in &self.modifications {
            for extension in &extensions {
                extension.relation_changing(
                    tx,
                    modification.id(),
                    modification.property(),
                    modification.old_related(),
                    modification.new_related(),
                )?;
            }
        }
        for modification in &self.modifications {
            tx.apply_modification(modification)?;
        }
        for modification in &self.modifications {
            for extension in &extensions {
                extension.relation_changed(
                    tx,
                    modification.id(),
                    modification.property(),
                    modification.old_related(),
                    modification.new_related(),
                );
            }
        }
        tracing::trace!(
            transaction = %tx.id,
            modifications = self.modifications.len(),
            "relation changed"
        );
        Ok(())
    }
}

impl ClientTransaction {
    /// Sets a single-valued end-point.
    ///
    /// For bidirectional relations the opposite end-points of the old and new
    /// related objects are updated as well.
    pub fn set_related_object(
        &mut self,
        id: &ObjectId,
        property: &str,
        related: Option<&ObjectId>,
    ) -> CoreResult<()> {
        self.ensure_writable(id)?;
        let mapping = Arc::clone(&self.mapping);
        let definition = single_end_point(&mapping, id, property)?;
        if let Some(new) = related {
            self.ensure_relatable(definition, new)?;
        }
        let old = self.related_object(id, definition, ValueAccess::Current)?;
        if old.as_ref() == related {
            return Ok(());
        }

        let mut command = RelationChangeCommand::default();
        command.set_object(id, property, old.clone(), related.cloned());
        if let Some(opposite) = mapping.opposite(definition) {
            if let Some(old) = &old {
                if self.load_partner(old)? {
                    self.unlink(&mut command, opposite, old, id)?;
                }
            }
            if let Some(new) = related {
                self.link(&mut command, definition, opposite, new, id)?;
            }
        }
        command.execute(self)
    }

    /// Appends an object to a collection end-point.
    pub fn add_related_object(&mut self, id: &ObjectId, property: &str, item: &ObjectId) -> CoreResult<()> {
        self.insert_related(id, property, None, item)
    }

    /// Inserts an object into a collection end-point at `index`.
    pub fn insert_related_object(
        &mut self,
        id: &ObjectId,
        property: &str,
        index: usize,
        item: &ObjectId,
    ) -> CoreResult<()> {
        self.insert_related(id, property, Some(index), item)
    }

    /// Removes an object from a collection end-point.
    ///
    /// Returns `false` if the object was not part of the collection.
    pub fn remove_related_object(
        &mut self,
        id: &ObjectId,
        property: &str,
        item: &ObjectId,
    ) -> CoreResult<bool> {
        self.ensure_writable(id)?;
        let mapping = Arc::clone(&self.mapping);
        let definition = collection_end_point(&mapping, id, property)?;
        let current = self.related_objects(id, definition, ValueAccess::Current)?;
        if !current.contains(item) {
            return Ok(false);
        }

        let mut command = RelationChangeCommand::default();
        command.remove(id, property, item);
        if let Some(opposite) = mapping.opposite(definition) {
            self.detach_item(&mut command, opposite, item)?;
        }
        command.execute(self)?;
        Ok(true)
    }

    /// Replaces the contents of a collection end-point.
    ///
    /// Objects present before and after keep their position; new objects
    /// are appended in the given order.
    pub fn set_related_objects(
        &mut self,
        id: &ObjectId,
        property: &str,
        items: &[ObjectId],
    ) -> CoreResult<()> {
        self.ensure_writable(id)?;
        let mapping = Arc::clone(&self.mapping);
        let definition = collection_end_point(&mapping, id, property)?;
        let mut seen = HashSet::new();
        for item in items {
            if !seen.insert(item) {
                return Err(CoreError::invalid_operation(format!(
                    "object '{item}' appears more than once in '{}'",
                    definition.fully_qualified_name()
                )));
            }
            self.ensure_relatable(definition, item)?;
        }

        let current = self.related_objects(id, definition, ValueAccess::Current)?;
        let removed: Vec<&ObjectId> = current.iter().filter(|c| !items.contains(c)).collect();
        let added: Vec<&ObjectId> = items.iter().filter(|i| !current.contains(i)).collect();
        if removed.is_empty() && added.is_empty() {
            return Ok(());
        }

        let opposite = mapping.opposite(definition);
        let mut command = RelationChangeCommand::default();
        for item in &removed {
            command.remove(id, property, item);
            if let Some(opposite) = opposite {
                self.detach_item(&mut command, opposite, item)?;
            }
        }
        let mut index = current.len() - removed.len();
        for item in &added {
            command.insert(id, property, index, item);
            index += 1;
            if let Some(opposite) = opposite {
                self.attach_item(&mut command, definition, opposite, item, id)?;
            }
        }
        command.execute(self)
    }

    /// Removes every object from a collection end-point.
    pub fn clear_related_objects(&mut self, id: &ObjectId, property: &str) -> CoreResult<()> {
        self.set_related_objects(id, property, &[])
    }

    fn insert_related(
        &mut self,
        id: &ObjectId,
        property: &str,
        index: Option<usize>,
        item: &ObjectId,
    ) -> CoreResult<()> {
        self.ensure_writable(id)?;
        let mapping = Arc::clone(&self.mapping);
        let definition = collection_end_point(&mapping, id, property)?;
        self.ensure_relatable(definition, item)?;
        let current = self.related_objects(id, definition, ValueAccess::Current)?;
        if current.contains(item) {
            return Err(CoreError::invalid_operation(format!(
                "object '{item}' is already part of '{}' of '{id}'",
                definition.fully_qualified_name()
            )));
        }
        let index = match index {
            Some(index) if index > current.len() => {
                return Err(CoreError::invalid_operation(format!(
                    "index {index} is out of range for '{}' with {} items",
                    definition.fully_qualified_name(),
                    current.len()
                )));
            }
            Some(index) => index,
            None => current.len(),
        };

        let mut command = RelationChangeCommand::default();
        command.insert(id, property, index, item);
        if let Some(opposite) = mapping.opposite(definition) {
            self.attach_item(&mut command, definition, opposite, item, id)?;
        }
        command.execute(self)
    }

    /// Checks that `related` may be assigned to the end-point.
    fn ensure_relatable(
        &mut self,
        definition: &RelationEndPointDefinition,
        related: &ObjectId,
    ) -> CoreResult<()> {
        if related.class_id() != definition.related_class_id() {
            return Err(CoreError::invalid_operation(format!(
                "'{}' relates to '{}' objects, not to '{related}'",
                definition.fully_qualified_name(),
                definition.related_class_id()
            )));
        }
        self.ensure_loaded(related)?;
        if self.data.state(related) == ObjectState::Deleted {
            return Err(CoreError::object_deleted(related));
        }
        Ok(())
    }

    /// Removes `id` from the opposite end-point of `partner`.
    fn unlink(
        &mut self,
        command: &mut RelationChangeCommand,
        opposite: &RelationEndPointDefinition,
        partner: &ObjectId,
        id: &ObjectId,
    ) -> CoreResult<()> {
        if opposite.is_collection() {
            if self
                .related_objects(partner, opposite, ValueAccess::Current)?
                .contains(id)
            {
                command.remove(partner, opposite.property_name(), id);
            }
        } else {
            let current = self.related_object(partner, opposite, ValueAccess::Current)?;
            if current.as_ref() == Some(id) {
                command.set_object(partner, opposite.property_name(), current, None);
            }
        }
        Ok(())
    }

    /// Makes `id` the partner of `new` on the opposite end-point.
    ///
    /// A single-valued opposite end-point releases its previous partner.
    fn link(
        &mut self,
        command: &mut RelationChangeCommand,
        definition: &RelationEndPointDefinition,
        opposite: &RelationEndPointDefinition,
        new: &ObjectId,
        id: &ObjectId,
    ) -> CoreResult<()> {
        if opposite.is_collection() {
            let len = self.related_objects(new, opposite, ValueAccess::Current)?.len();
            command.insert(new, opposite.property_name(), len, id);
            return Ok(());
        }
        let previous = self.related_object(new, opposite, ValueAccess::Current)?;
        if previous.as_ref() == Some(id) {
            return Ok(());
        }
        if let Some(previous) = &previous {
            if self.load_partner(previous)? {
                self.unlink(command, definition, previous, new)?;
            }
        }
        command.set_object(new, opposite.property_name(), previous, Some(id.clone()));
        Ok(())
    }

    /// Clears the foreign key of an item leaving a collection.
    fn detach_item(
        &mut self,
        command: &mut RelationChangeCommand,
        opposite: &RelationEndPointDefinition,
        item: &ObjectId,
    ) -> CoreResult<()> {
        if !self.load_partner(item)? {
            return Ok(());
        }
        let previous = self.related_object(item, opposite, ValueAccess::Current)?;
        if previous.is_some() {
            command.set_object(item, opposite.property_name(), previous, None);
        }
        Ok(())
    }

    /// Points the foreign key of an item entering a collection at `owner`,
    /// removing the item from its previous owner's collection.
    fn attach_item(
        &mut self,
        command: &mut RelationChangeCommand,
        definition: &RelationEndPointDefinition,
        opposite: &RelationEndPointDefinition,
        item: &ObjectId,
        owner: &ObjectId,
    ) -> CoreResult<()> {
        let previous = self.related_object(item, opposite, ValueAccess::Current)?;
        if let Some(previous) = &previous {
            if previous != owner && self.load_partner(previous)? {
                self.unlink(command, definition, previous, item)?;
            }
        }
        command.set_object(item, opposite.property_name(), previous, Some(owner.clone()));
        Ok(())
    }

    fn apply_modification(&mut self, modification: &EndPointModification) -> CoreResult<()> {
        let mapping = Arc::clone(&self.mapping);
        let definition = mapping.end_point(modification.id().class_id(), modification.property())?;
        match modification {
            EndPointModification::SetObject { id, property, new, .. } => {
                if definition.is_virtual() {
                    if let Some(data) = self.data.end_point_mut(id, property) {
                        data.set_object(new.clone());
                    }
                } else if let Some(container) = self.data.container_mut(id) {
                    container.set_value(property, Value::from(new.clone()));
                }
            }
            EndPointModification::Insert { id, property, index, item } => {
                if let Some(data) = self.data.end_point_mut(id, property) {
                    data.insert(*index, item.clone());
                }
            }
            EndPointModification::Remove { id, property, item } => {
                if let Some(data) = self.data.end_point_mut(id, property) {
                    data.remove(item);
                }
            }
        }
        Ok(())
    }
}
