//! Commit and rollback.

use crate::error::CoreResult;
use crate::object::ObjectId;
use crate::transaction::ClientTransaction;

impl ClientTransaction {
    /// Validates and writes all changes.
    ///
    /// 1. `committing` hooks run and may still change the transaction.
    /// 2. The changed objects are frozen into persistable data.
    /// 3. The commit validators and `commit_validate` hooks check the data.
    /// 4. The data is written to storage, or into the parent of a sub-transaction.
    /// 5. New and changed objects become unchanged, deleted objects invalid.
    ///
    /// If any step fails, the in-memory state is restored to what it was
    /// before step 1 and the error is returned.
    pub fn commit(&mut self) -> CoreResult<()> {
        let snapshot = self.data.clone();
        match self.commit_changes() {
            Ok(committed) => {
                self.stats.record_commit();
                tracing::debug!(transaction = %self.id, objects = committed.len(), "commit completed");
                self.notify(|extension, tx| extension.committed(tx, &committed));
                Ok(())
            }
            Err(err) => {
                self.data = snapshot;
                self.stats.record_failed_commit();
                tracing::warn!(transaction = %self.id, error = %err, "commit failed");
                Err(err)
            }
        }
    }

    fn commit_changes(&mut self) -> CoreResult<Vec<ObjectId>> {
        let ids = self.data.changed_ids();
        self.notify_before_mut(|extension, tx| extension.committing(tx, &ids))?;

        let persistable = self.data.persistable_data(&self.mapping)?;
        self.validator.validate(&self.mapping, &persistable)?;
        self.notify_before(|extension, tx| extension.commit_validate(tx, &persistable))?;

        self.source.persist(&persistable)?;
        let invalidated = self.data.commit(self.source.is_storage());
        if !invalidated.is_empty() {
            tracing::trace!(transaction = %self.id, count = invalidated.len(), "deleted objects invalidated");
        }
        Ok(persistable.iter().map(|data| data.id().clone()).collect())
    }

    /// Discards all changes.
    ///
    /// Changed and deleted objects return to their original values, new
    /// objects become invalid.
    pub fn rollback(&mut self) -> CoreResult<()> {
        let ids = self.data.changed_ids();
        self.notify_before_mut(|extension, tx| extension.rolling_back(tx, &ids))?;
        let discarded = self.data.rollback();
        self.stats.record_rollback();
        tracing::debug!(
            transaction = %self.id,
            objects = ids.len(),
            discarded = discarded.len(),
            "rollback completed"
        );
        self.notify(|extension, tx| extension.rolled_back(tx, &ids));
        Ok(())
    }
}
