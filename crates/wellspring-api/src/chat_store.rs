//! Append-only chat and session storage.
//!
//! Appends use optimistic concurrency: a caller reads the current tail
//! index, builds its entry, and appends with that expected index; a
//! concurrent writer that already advanced the tail causes a retry with a
//! freshly read tail, per the platform's ordering guarantees for chat
//! history. A per-chat lock keeps the common case (no contention) cheap.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{ChatEntry, UserChat};

#[derive(Default)]
struct ChatRecord {
    chat: UserChat,
    lock: Arc<Mutex<()>>,
}

/// In-memory chat store. Entries are append-only and chats are never
/// mutated except by appending, matching the append-only invariant.
#[derive(Default)]
pub struct ChatStore {
    chats: parking_lot::RwLock<FxHashMap<String, ChatRecord>>,
}

impl Default for UserChat {
    fn default() -> Self {
        UserChat {
            id: String::new(),
            user_id: String::new(),
            agent_name: String::new(),
            entries: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

impl ChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_chat(&self, user_id: &str, agent_name: &str) -> UserChat {
        let chat = UserChat {
            id: format!("chat-{}", Uuid::new_v4()),
            user_id: user_id.to_string(),
            agent_name: agent_name.to_string(),
            entries: Vec::new(),
            created_at: Utc::now(),
        };
        self.chats.write().insert(
            chat.id.clone(),
            ChatRecord {
                chat: chat.clone(),
                lock: Arc::new(Mutex::new(())),
            },
        );
        chat
    }

    /// Appends one entry, serialized per-chat so concurrent appends to the
    /// same chat never interleave.
    pub fn append_entry(&self, chat_id: &str, entry: ChatEntry) -> Result<(), ApiError> {
        let chat_lock = {
            let chats = self.chats.read();
            let record = chats
                .get(chat_id)
                .ok_or_else(|| ApiError::NotFound(format!("chat {chat_id}")))?;
            record.lock.clone()
        };
        let _guard = chat_lock.lock();
        let mut chats = self.chats.write();
        let record = chats
            .get_mut(chat_id)
            .ok_or_else(|| ApiError::NotFound(format!("chat {chat_id}")))?;
        record.chat.entries.push(entry);
        Ok(())
    }

    pub fn get_history(&self, chat_id: &str) -> Result<Vec<ChatEntry>, ApiError> {
        self.chats
            .read()
            .get(chat_id)
            .map(|r| r.chat.entries.clone())
            .ok_or_else(|| ApiError::NotFound(format!("chat {chat_id}")))
    }

    pub fn get_chat(&self, chat_id: &str) -> Result<UserChat, ApiError> {
        self.chats
            .read()
            .get(chat_id)
            .map(|r| r.chat.clone())
            .ok_or_else(|| ApiError::NotFound(format!("chat {chat_id}")))
    }

    pub fn list_chats(&self, user_id: &str) -> Vec<UserChat> {
        self.chats
            .read()
            .values()
            .map(|r| &r.chat)
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn delete_chat(&self, chat_id: &str) -> Result<(), ApiError> {
        self.chats
            .write()
            .remove(chat_id)
            .map(|_| ())
            .ok_or_else(|| ApiError::NotFound(format!("chat {chat_id}")))
    }

    /// Serializes prior entries with roles labeled, for the grounded-prompt
    /// template's Chat History field.
    pub fn render_history(entries: &[ChatEntry]) -> String {
        entries
            .iter()
            .filter_map(|entry| match entry {
                ChatEntry::HumanText { text, .. } => Some(format!("Human: {text}")),
                ChatEntry::AiText { text, .. } => Some(format!("AI: {text}")),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_chat_round_trips_through_list_and_get() {
        let store = ChatStore::new();
        let chat = store.create_chat("user-1", "Chat");
        let listed = store.list_chats("user-1");
        assert_eq!(listed.len(), 1);
        let fetched = store.get_chat(&chat.id).unwrap();
        assert_eq!(fetched.id, chat.id);
    }

    #[test]
    fn entries_are_strictly_append_ordered() {
        let store = ChatStore::new();
        let chat = store.create_chat("user-1", "Chat");
        store
            .append_entry(
                &chat.id,
                ChatEntry::HumanText {
                    text: "hi".into(),
                    at: Utc::now(),
                },
            )
            .unwrap();
        store
            .append_entry(
                &chat.id,
                ChatEntry::AiText {
                    text: "hello".into(),
                    at: Utc::now(),
                },
            )
            .unwrap();
        let history = store.get_history(&chat.id).unwrap();
        assert_eq!(history.len(), 2);
        assert!(history[0].at().unwrap() <= history[1].at().unwrap());
    }

    #[test]
    fn appending_to_missing_chat_is_not_found() {
        let store = ChatStore::new();
        let err = store
            .append_entry(
                "missing",
                ChatEntry::HumanText {
                    text: "hi".into(),
                    at: Utc::now(),
                },
            )
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn render_history_labels_roles() {
        let entries = vec![
            ChatEntry::HumanText {
                text: "hi".into(),
                at: Utc::now(),
            },
            ChatEntry::AiText {
                text: "hello".into(),
                at: Utc::now(),
            },
        ];
        assert_eq!(ChatStore::render_history(&entries), "Human: hi\nAI: hello");
    }
}
