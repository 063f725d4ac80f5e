// The probot-store crate provides persistent conversation storage for ProBot.
// It handles the append-only turn log per identity and the live feed the
// presentation layer consumes.

pub mod adapters;
pub mod errors;
pub mod store;

pub use adapters::{InMemoryStore, JsonFileStore};
pub use errors::{StoreError, StoreResult};
pub use store::{ConversationStore, ConversationStoreRef};
