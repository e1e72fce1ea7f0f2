use async_trait::async_trait;

use crate::domain::{
    command::{Command, NewCommand},
    errors::StoreError,
};

pub mod context;
pub mod in_memory_command_store;
pub mod postgres_command_store;

pub use context::CommandContext;

/// A change staged on a [`CommandContext`] and applied by [`CommandStore::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingChange {
    Insert(NewCommand),
    Replace(Command),
    Delete(i32),
}

/// Outcome of applying one batch of changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReceipt {
    /// Inserted rows with their assigned ids, in staging order.
    pub inserted: Vec<Command>,
    pub rows_affected: u64,
}

/// Backing store for commands.
///
/// `apply` must be atomic: either every change in the batch is visible
/// afterwards, or none is. Replacing or deleting an id that does not exist
/// affects zero rows and is not an error.
#[async_trait]
pub trait CommandStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Command>, StoreError>;
    async fn find(&self, id: i32) -> Result<Option<Command>, StoreError>;
    async fn apply(&self, changes: Vec<PendingChange>) -> Result<CommitReceipt, StoreError>;
}
