use std::sync::Arc;

use tracing::debug;

use crate::{
    domain::{
        command::{Command, NewCommand},
        errors::StoreError,
    },
    infrastructure::{CommandStore, CommitReceipt, PendingChange},
};

/// Per-request unit of work over a shared [`CommandStore`].
///
/// Reads go straight to the store. Writes are staged with `add`, `remove`
/// and `mark_modified` and only reach the store on `commit`.
pub struct CommandContext {
    store: Arc<dyn CommandStore>,
    pending: Vec<PendingChange>,
}

impl CommandContext {
    pub fn new(store: Arc<dyn CommandStore>) -> Self {
        Self {
            store,
            pending: Vec::new(),
        }
    }

    pub async fn list(&self) -> Result<Vec<Command>, StoreError> {
        self.store.list().await
    }

    pub async fn find(&self, id: i32) -> Result<Option<Command>, StoreError> {
        self.store.find(id).await
    }

    /// Stages an insert. The command's `id` is ignored.
    pub fn add(&mut self, command: Command) {
        self.pending.push(PendingChange::Insert(NewCommand::from(command)));
    }

    pub fn remove(&mut self, command: &Command) {
        self.pending.push(PendingChange::Delete(command.id));
    }

    /// Stages a full replacement of the row whose id equals `command.id`.
    pub fn mark_modified(&mut self, command: Command) {
        self.pending.push(PendingChange::Replace(command));
    }

    pub fn has_pending_changes(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Applies every staged change atomically. The staged set is cleared
    /// whether or not the store accepts it.
    pub async fn commit(&mut self) -> Result<CommitReceipt, StoreError> {
        let changes = std::mem::take(&mut self.pending);
        if changes.is_empty() {
            return Ok(CommitReceipt::default());
        }

        let staged = changes.len();
        let receipt = self.store.apply(changes).await?;
        debug!(
            staged,
            inserted = receipt.inserted.len(),
            rows_affected = receipt.rows_affected,
            "commit applied"
        );

        Ok(receipt)
    }
}
