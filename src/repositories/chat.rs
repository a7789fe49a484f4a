use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use uuid::Uuid;

use crate::models::chat::{AdminChatEntry, ChatMessage, SENDER_ADMIN, SENDER_USER};

pub const WELCOME_MESSAGE: &str =
    "Hello! Welcome to MXTM Investment support. How can we help you today?";

/// File-backed message store for the support chat. One JSON file per
/// conversation plus an `admin_chats.json` index, all keyed by a generated
/// chat id. Local storage only; there is no cross-device transport.
#[derive(Clone)]
pub struct ChatStore {
    dir: PathBuf,
}

impl ChatStore {
    pub fn new(dir: PathBuf) -> Result<Self, anyhow::Error> {
        fs::create_dir_all(&dir)?;
        Ok(ChatStore { dir })
    }

    pub fn default_dir() -> PathBuf {
        directories::ProjectDirs::from("app", "mxtm", "mxtm-platform")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("chat_data"))
    }

    pub fn new_chat_id(&self) -> String {
        format!("user_{}", Uuid::new_v4().simple())
    }

    fn messages_path(&self, chat_id: &str) -> PathBuf {
        self.dir.join(format!("chat_messages_{}.json", chat_id))
    }

    fn index_path(&self) -> PathBuf {
        self.dir.join("admin_chats.json")
    }

    pub fn messages(&self, chat_id: &str) -> Result<Vec<ChatMessage>, anyhow::Error> {
        let path = self.messages_path(chat_id);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn write_messages(
        &self,
        chat_id: &str,
        messages: &[ChatMessage],
    ) -> Result<(), anyhow::Error> {
        fs::write(
            self.messages_path(chat_id),
            serde_json::to_string(messages)?,
        )?;
        Ok(())
    }

    /// Seeds the admin welcome message into an empty conversation.
    pub fn ensure_welcome(&self, chat_id: &str) -> Result<(), anyhow::Error> {
        let messages = self.messages(chat_id)?;
        if !messages.is_empty() {
            return Ok(());
        }

        let welcome = ChatMessage {
            id: Uuid::new_v4().hyphenated().to_string(),
            content: WELCOME_MESSAGE.to_string(),
            sender: SENDER_ADMIN.to_string(),
            timestamp: chrono::Utc::now(),
            read: false,
        };
        self.write_messages(chat_id, &[welcome])
    }

    /// Opening the widget: marks every admin message read, so the unread
    /// count drops to zero, and returns the full conversation.
    pub fn open(&self, chat_id: &str) -> Result<Vec<ChatMessage>, anyhow::Error> {
        self.ensure_welcome(chat_id)?;

        let mut messages = self.messages(chat_id)?;
        let mut changed = false;
        for message in &mut messages {
            if message.sender == SENDER_ADMIN && !message.read {
                message.read = true;
                changed = true;
            }
        }
        if changed {
            self.write_messages(chat_id, &messages)?;
        }

        Ok(messages)
    }

    pub fn unread_count(&self, chat_id: &str) -> Result<usize, anyhow::Error> {
        let messages = self.messages(chat_id)?;
        Ok(messages
            .iter()
            .filter(|m| m.sender == SENDER_ADMIN && !m.read)
            .count())
    }

    /// Appends a user message. Empty or whitespace-only content is a no-op
    /// and leaves the conversation unchanged.
    pub fn append(
        &self,
        chat_id: &str,
        user_name: &str,
        content: &str,
    ) -> Result<Option<ChatMessage>, anyhow::Error> {
        let content = content.trim();
        if content.is_empty() {
            return Ok(None);
        }

        let message = ChatMessage {
            id: Uuid::new_v4().hyphenated().to_string(),
            content: content.to_string(),
            sender: SENDER_USER.to_string(),
            timestamp: chrono::Utc::now(),
            read: true,
        };

        let mut messages = self.messages(chat_id)?;
        messages.push(message.clone());
        self.write_messages(chat_id, &messages)?;

        let mut index = self.admin_index()?;
        index.insert(
            chat_id.to_string(),
            AdminChatEntry {
                last_message: message.content.clone(),
                timestamp: message.timestamp,
                unread: true,
                user_name: user_name.to_string(),
            },
        );
        fs::write(self.index_path(), serde_json::to_string(&index)?)?;

        Ok(Some(message))
    }

    pub fn admin_index(&self) -> Result<HashMap<String, AdminChatEntry>, anyhow::Error> {
        let path = self.index_path();
        if !path.exists() {
            return Ok(HashMap::new());
        }

        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}
