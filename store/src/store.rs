use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;

use probot_core::types::{Turn, TurnDraft};

use crate::errors::StoreResult;

/// Buffered turns per live feed before slow subscribers start lagging
pub(crate) const SUBSCRIPTION_BUFFER: usize = 64;

/// Trait defining the interface for conversation stores.
///
/// Turns are append-only and scoped to one owner identity; ordering is by
/// `created_at` ascending, which every adapter realizes by preserving append
/// order. Nothing here edits or deletes individual turns.
#[async_trait]
pub trait ConversationStore: Send + Sync + Debug {
    /// Append one turn, assigning its id and server-side timestamp
    async fn append(&self, owner: &str, draft: TurnDraft) -> StoreResult<Turn>;

    /// All turns for the owner, oldest first
    async fn list(&self, owner: &str) -> StoreResult<Vec<Turn>>;

    /// Live feed of turns appended for the owner after this call
    async fn subscribe(&self, owner: &str) -> StoreResult<broadcast::Receiver<Turn>>;

    /// Drop the owner's conversation entirely (the "new chat" operation)
    async fn clear(&self, owner: &str) -> StoreResult<()>;
}

/// Type alias for Arc-wrapped ConversationStore trait objects
pub type ConversationStoreRef = Arc<dyn ConversationStore>;
