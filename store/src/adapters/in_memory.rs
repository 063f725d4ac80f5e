use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::debug;

use probot_core::types::{Turn, TurnDraft};

use crate::errors::{StoreError, StoreResult};
use crate::store::{ConversationStore, SUBSCRIPTION_BUFFER};

/// In-memory implementation of ConversationStore
#[derive(Debug, Default)]
pub struct InMemoryStore {
    /// Thread-safe storage of conversations keyed by owner
    turns: RwLock<HashMap<String, Vec<Turn>>>,
    /// Live feeds, created lazily per owner
    feeds: Mutex<HashMap<String, broadcast::Sender<Turn>>>,
}

impl InMemoryStore {
    /// Create a new InMemoryStore
    pub fn new() -> Self {
        Self::default()
    }

    fn feed(&self, owner: &str) -> StoreResult<broadcast::Sender<Turn>> {
        let mut feeds = self
            .feeds
            .lock()
            .map_err(|e| StoreError::Storage(format!("Failed to acquire feed lock: {}", e)))?;

        Ok(feeds
            .entry(owner.to_string())
            .or_insert_with(|| broadcast::channel(SUBSCRIPTION_BUFFER).0)
            .clone())
    }
}

#[async_trait]
impl ConversationStore for InMemoryStore {
    async fn append(&self, owner: &str, draft: TurnDraft) -> StoreResult<Turn> {
        let turn = Turn::from_draft(draft);

        {
            let mut turns = self.turns.write().map_err(|e| {
                StoreError::Storage(format!("Failed to acquire write lock: {}", e))
            })?;

            turns.entry(owner.to_string()).or_default().push(turn.clone());
        }

        debug!(owner, turn_id = %turn.id, "Appended turn");

        // A feed with no subscribers drops the turn, which is fine
        let _ = self.feed(owner)?.send(turn.clone());

        Ok(turn)
    }

    async fn list(&self, owner: &str) -> StoreResult<Vec<Turn>> {
        let turns = self
            .turns
            .read()
            .map_err(|e| StoreError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(turns.get(owner).cloned().unwrap_or_default())
    }

    async fn subscribe(&self, owner: &str) -> StoreResult<broadcast::Receiver<Turn>> {
        Ok(self.feed(owner)?.subscribe())
    }

    async fn clear(&self, owner: &str) -> StoreResult<()> {
        let mut turns = self
            .turns
            .write()
            .map_err(|e| StoreError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        turns.remove(owner);
        debug!(owner, "Cleared conversation");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use probot_core::types::TurnRole;
    use tokio::test;

    #[test]
    async fn test_append_and_list_preserve_order() {
        let store = InMemoryStore::new();

        store.append("alice", TurnDraft::user("first")).await.unwrap();
        store
            .append("alice", TurnDraft::assistant("second"))
            .await
            .unwrap();
        store.append("alice", TurnDraft::user("third")).await.unwrap();

        let turns = store.list("alice").await.unwrap();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].content, "first");
        assert_eq!(turns[1].content, "second");
        assert_eq!(turns[2].content, "third");
        assert_eq!(turns[1].role, TurnRole::Assistant);

        // Server-assigned timestamps are non-decreasing in append order
        assert!(turns[0].created_at <= turns[1].created_at);
        assert!(turns[1].created_at <= turns[2].created_at);
    }

    #[test]
    async fn test_owners_are_isolated() {
        let store = InMemoryStore::new();

        store.append("alice", TurnDraft::user("hers")).await.unwrap();
        store.append("bob", TurnDraft::user("his")).await.unwrap();

        let alice = store.list("alice").await.unwrap();
        let bob = store.list("bob").await.unwrap();
        assert_eq!(alice.len(), 1);
        assert_eq!(bob.len(), 1);
        assert_eq!(alice[0].content, "hers");
        assert_eq!(bob[0].content, "his");
    }

    #[test]
    async fn test_subscribers_observe_appends_in_order() {
        let store = InMemoryStore::new();
        let mut feed = store.subscribe("alice").await.unwrap();

        store.append("alice", TurnDraft::user("one")).await.unwrap();
        store
            .append("alice", TurnDraft::assistant("two"))
            .await
            .unwrap();

        assert_eq!(feed.recv().await.unwrap().content, "one");
        assert_eq!(feed.recv().await.unwrap().content, "two");
    }

    #[test]
    async fn test_subscriber_does_not_see_other_owners() {
        let store = InMemoryStore::new();
        let mut feed = store.subscribe("alice").await.unwrap();

        store.append("bob", TurnDraft::user("not hers")).await.unwrap();
        store.append("alice", TurnDraft::user("hers")).await.unwrap();

        assert_eq!(feed.recv().await.unwrap().content, "hers");
    }

    #[test]
    async fn test_clear_empties_the_conversation() {
        let store = InMemoryStore::new();

        store.append("alice", TurnDraft::user("gone")).await.unwrap();
        store.clear("alice").await.unwrap();

        assert!(store.list("alice").await.unwrap().is_empty());
    }
}
