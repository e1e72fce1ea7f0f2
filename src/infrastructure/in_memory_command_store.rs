use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::{
    domain::{command::Command, errors::StoreError},
    infrastructure::{CommandStore, CommitReceipt, PendingChange},
};

#[derive(Debug, Clone, Default)]
struct CommandTable {
    rows: BTreeMap<i32, Command>,
    last_id: i32,
}

impl CommandTable {
    fn next_id(&mut self) -> Result<i32, StoreError> {
        let next = self
            .last_id
            .checked_add(1)
            .ok_or_else(|| StoreError::constraint("id sequence exhausted"))?;
        self.last_id = next;
        Ok(next)
    }

    fn apply(
        &mut self,
        change: PendingChange,
        receipt: &mut CommitReceipt,
    ) -> Result<(), StoreError> {
        match change {
            PendingChange::Insert(new_command) => {
                let id = self.next_id()?;
                let created = new_command.with_id(id);
                self.rows.insert(id, created.clone());
                receipt.inserted.push(created);
                receipt.rows_affected += 1;
            }
            PendingChange::Replace(command) => {
                if let Some(row) = self.rows.get_mut(&command.id) {
                    *row = command;
                    receipt.rows_affected += 1;
                }
            }
            PendingChange::Delete(id) => {
                if self.rows.remove(&id).is_some() {
                    receipt.rows_affected += 1;
                }
            }
        }
        Ok(())
    }
}

#[derive(Default)]
struct InMemoryState {
    table: CommandTable,
    injected_failure: Option<String>,
}

/// Process-local command store with the same observable semantics as the
/// Postgres store: sequential ids that are never reused, atomic batches,
/// zero-row updates and deletes for unknown ids.
#[derive(Default)]
pub struct InMemoryCommandStore {
    state: RwLock<InMemoryState>,
    read_failure: Mutex<Option<String>>,
}

impl InMemoryCommandStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next non-empty `apply` fail with a storage error and leave
    /// the table untouched.
    pub async fn fail_next_commit(&self, message: impl Into<String>) {
        self.state.write().await.injected_failure = Some(message.into());
    }

    /// Makes the next `list` or `find` fail with a storage error.
    pub async fn fail_next_read(&self, message: impl Into<String>) {
        *self.read_failure.lock().await = Some(message.into());
    }

    async fn check_read(&self) -> Result<(), StoreError> {
        match self.read_failure.lock().await.take() {
            Some(message) => Err(StoreError::storage(message)),
            None => Ok(()),
        }
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.table.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CommandStore for InMemoryCommandStore {
    async fn list(&self) -> Result<Vec<Command>, StoreError> {
        self.check_read().await?;
        Ok(self.state.read().await.table.rows.values().cloned().collect())
    }

    async fn find(&self, id: i32) -> Result<Option<Command>, StoreError> {
        self.check_read().await?;
        Ok(self.state.read().await.table.rows.get(&id).cloned())
    }

    async fn apply(&self, changes: Vec<PendingChange>) -> Result<CommitReceipt, StoreError> {
        let mut state = self.state.write().await;
        if let Some(message) = state.injected_failure.take() {
            return Err(StoreError::storage(message));
        }

        let mut staged = state.table.clone();
        let mut receipt = CommitReceipt::default();
        for change in changes {
            staged.apply(change, &mut receipt)?;
        }

        state.table = staged;
        Ok(receipt)
    }
}
