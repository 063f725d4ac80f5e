use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use probot_core::types::{ImagePayload, Turn, TurnDraft, TurnRole};

use crate::errors::{StoreError, StoreResult};
use crate::store::{ConversationStore, SUBSCRIPTION_BUFFER};

/// On-disk record for one turn.
///
/// The role is kept as a raw string so a record written by another producer
/// still loads; unrecognized roles are coerced on the way in.
#[derive(Debug, Serialize, Deserialize)]
struct TurnRecord {
    id: String,
    role: String,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    attachment: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<&Turn> for TurnRecord {
    fn from(turn: &Turn) -> Self {
        Self {
            id: turn.id.clone(),
            role: turn.role.as_str().to_string(),
            content: turn.content.clone(),
            attachment: turn.attachment.as_ref().map(|image| image.data.clone()),
            created_at: turn.created_at,
        }
    }
}

impl TurnRecord {
    fn into_turn(self) -> Turn {
        Turn {
            id: self.id,
            role: TurnRole::parse_lossy(&self.role),
            content: self.content,
            attachment: self.attachment.map(ImagePayload::from_base64),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Conversation {
    owner: String,
    turns: Vec<TurnRecord>,
}

/// JSON-file implementation of ConversationStore, one file per owner
#[derive(Debug)]
pub struct JsonFileStore {
    data_dir: PathBuf,
    /// Serializes the load-append-save cycle per store
    io_lock: Mutex<()>,
    feeds: Mutex<HashMap<String, broadcast::Sender<Turn>>>,
}

impl JsonFileStore {
    /// Create a store rooted at the given data directory
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            io_lock: Mutex::new(()),
            feeds: Mutex::new(HashMap::new()),
        }
    }

    /// Get the path for an owner's conversation file
    fn conversation_file_path(&self, owner: &str) -> PathBuf {
        // Sanitize owner for filename
        let sanitized_owner =
            owner.replace(|c: char| !c.is_alphanumeric() && c != '-' && c != '_', "_");
        self.data_dir.join(format!("conversation_{}.json", sanitized_owner))
    }

    /// Load an owner's conversation, tolerating a missing or damaged file
    fn load_conversation(&self, owner: &str) -> Conversation {
        let path = self.conversation_file_path(owner);

        match fs::read_to_string(&path) {
            Ok(json_str) => match serde_json::from_str::<Conversation>(&json_str) {
                Ok(conversation) => conversation,
                Err(e) => {
                    warn!(
                        owner,
                        error = %e,
                        "Failed to parse conversation file, starting a new conversation"
                    );
                    Conversation {
                        owner: owner.to_string(),
                        turns: Vec::new(),
                    }
                }
            },
            // File likely doesn't exist yet
            Err(_) => Conversation {
                owner: owner.to_string(),
                turns: Vec::new(),
            },
        }
    }

    fn save_conversation(&self, owner: &str, conversation: &Conversation) -> StoreResult<()> {
        fs::create_dir_all(&self.data_dir)?;

        let path = self.conversation_file_path(owner);
        let json_str = serde_json::to_string_pretty(conversation)?;
        fs::write(&path, json_str)?;

        debug!(owner, path = %path.display(), "Saved conversation");
        Ok(())
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
impl ConversationStore for JsonFileStore {
    async fn append(&self, owner: &str, draft: TurnDraft) -> StoreResult<Turn> {
        let turn = Turn::from_draft(draft);

        {
            let _guard = self
                .io_lock
                .lock()
                .map_err(|e| StoreError::Storage(format!("Failed to acquire io lock: {}", e)))?;

            let mut conversation = self.load_conversation(owner);
            conversation.turns.push(TurnRecord::from(&turn));
            self.save_conversation(owner, &conversation)?;
        }

        let _ = self.feed(owner)?.send(turn.clone());

        Ok(turn)
    }

    async fn list(&self, owner: &str) -> StoreResult<Vec<Turn>> {
        let _guard = self
            .io_lock
            .lock()
            .map_err(|e| StoreError::Storage(format!("Failed to acquire io lock: {}", e)))?;

        let conversation = self.load_conversation(owner);
        Ok(conversation
            .turns
            .into_iter()
            .map(TurnRecord::into_turn)
            .collect())
    }

    async fn subscribe(&self, owner: &str) -> StoreResult<broadcast::Receiver<Turn>> {
        Ok(self.feed(owner)?.subscribe())
    }

    async fn clear(&self, owner: &str) -> StoreResult<()> {
        let _guard = self
            .io_lock
            .lock()
            .map_err(|e| StoreError::Storage(format!("Failed to acquire io lock: {}", e)))?;

        let path = self.conversation_file_path(owner);
        if path.exists() {
            fs::remove_file(&path)?;
            debug!(owner, "Removed conversation file");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use probot_core::types::TurnRole;
    use tokio::test;

    #[test]
    async fn test_turns_survive_a_store_restart() {
        let dir = tempfile::tempdir().unwrap();

        {
            let store = JsonFileStore::new(dir.path().to_path_buf());
            store.append("alice", TurnDraft::user("hello")).await.unwrap();
            store
                .append("alice", TurnDraft::assistant("hi there"))
                .await
                .unwrap();
        }

        let store = JsonFileStore::new(dir.path().to_path_buf());
        let turns = store.list("alice").await.unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].content, "hello");
        assert_eq!(turns[0].role, TurnRole::User);
        assert_eq!(turns[1].content, "hi there");
        assert_eq!(turns[1].role, TurnRole::Assistant);
    }

    #[test]
    async fn test_attachments_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().to_path_buf());

        let draft =
            TurnDraft::user("look at this").with_attachment(ImagePayload::from_base64("Zm9v"));
        store.append("alice", draft).await.unwrap();

        let turns = store.list("alice").await.unwrap();
        assert_eq!(turns[0].attachment.as_ref().unwrap().data, "Zm9v");
    }

    #[test]
    async fn test_unknown_roles_are_coerced_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().to_path_buf());

        let path = store.conversation_file_path("alice");
        fs::create_dir_all(dir.path()).unwrap();
        fs::write(
            &path,
            r#"{
  "owner": "alice",
  "turns": [
    {
      "id": "t-1",
      "role": "system",
      "content": "written by someone else",
      "created_at": "2024-01-01T00:00:00Z"
    }
  ]
}"#,
        )
        .unwrap();

        let turns = store.list("alice").await.unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].role, TurnRole::User);
    }

    #[test]
    async fn test_damaged_file_yields_an_empty_conversation() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().to_path_buf());

        let path = store.conversation_file_path("alice");
        fs::create_dir_all(dir.path()).unwrap();
        fs::write(&path, "not json at all").unwrap();

        assert!(store.list("alice").await.unwrap().is_empty());

        // A fresh append starts the conversation over
        store.append("alice", TurnDraft::user("recovered")).await.unwrap();
        assert_eq!(store.list("alice").await.unwrap().len(), 1);
    }

    #[test]
    async fn test_clear_removes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().to_path_buf());

        store.append("alice", TurnDraft::user("gone")).await.unwrap();
        store.clear("alice").await.unwrap();

        assert!(!store.conversation_file_path("alice").exists());
        assert!(store.list("alice").await.unwrap().is_empty());
    }

    #[test]
    async fn test_owner_names_are_sanitized_for_filenames() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().to_path_buf());

        store
            .append("alice@example.com", TurnDraft::user("hello"))
            .await
            .unwrap();

        let turns = store.list("alice@example.com").await.unwrap();
        assert_eq!(turns.len(), 1);

        let path = store.conversation_file_path("alice@example.com");
        assert!(path.ends_with("conversation_alice_example_com.json"));
        assert!(path.exists());
    }
}
