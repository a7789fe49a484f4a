use serde::{Deserialize, Serialize};

pub const SENDER_USER: &str = "user";
pub const SENDER_ADMIN: &str = "admin";

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ChatMessage {
    pub id: String,
    pub content: String,
    pub sender: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub read: bool,
}

/// Entry in the `admin_chats.json` index, keyed by chat id.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AdminChatEntry {
    pub last_message: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub unread: bool,
    pub user_name: String,
}
