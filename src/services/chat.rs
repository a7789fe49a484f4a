use async_trait::async_trait;
use tokio::sync::oneshot;

use super::{RequestHandler, Service, ServiceError};
use crate::models::chat::ChatMessage;
use crate::repositories::chat::ChatStore;

pub enum ChatRequest {
    NewSession {
        response: oneshot::Sender<Result<String, ServiceError>>,
    },
    Open {
        chat_id: String,
        response: oneshot::Sender<Result<Vec<ChatMessage>, ServiceError>>,
    },
    Send {
        chat_id: String,
        user_name: String,
        content: String,
        response: oneshot::Sender<Result<Option<ChatMessage>, ServiceError>>,
    },
    Poll {
        chat_id: String,
        known_count: usize,
        response: oneshot::Sender<Result<(Vec<ChatMessage>, usize), ServiceError>>,
    },
}

#[derive(Clone)]
pub struct ChatRequestHandler {
    store: ChatStore,
}

impl ChatRequestHandler {
    pub fn new(store: ChatStore) -> Self {
        ChatRequestHandler { store }
    }

    fn new_session(&self) -> Result<String, ServiceError> {
        let chat_id = self.store.new_chat_id();
        self.store
            .ensure_welcome(&chat_id)
            .map_err(|e| ServiceError::Repository("ChatService".to_string(), e.to_string()))?;

        Ok(chat_id)
    }

    fn open(&self, chat_id: &str) -> Result<Vec<ChatMessage>, ServiceError> {
        self.store
            .open(chat_id)
            .map_err(|e| ServiceError::Repository("ChatService".to_string(), e.to_string()))
    }

    fn send(
        &self,
        chat_id: &str,
        user_name: &str,
        content: &str,
    ) -> Result<Option<ChatMessage>, ServiceError> {
        self.store
            .append(chat_id, user_name, content)
            .map_err(|e| ServiceError::Repository("ChatService".to_string(), e.to_string()))
    }

    /// One tick of the widget's fixed-interval polling: messages past what
    /// the client already has, plus the current unread-admin count.
    fn poll(
        &self,
        chat_id: &str,
        known_count: usize,
    ) -> Result<(Vec<ChatMessage>, usize), ServiceError> {
        let messages = self
            .store
            .messages(chat_id)
            .map_err(|e| ServiceError::Repository("ChatService".to_string(), e.to_string()))?;
        let unread = self
            .store
            .unread_count(chat_id)
            .map_err(|e| ServiceError::Repository("ChatService".to_string(), e.to_string()))?;

        let fresh = if known_count < messages.len() {
            messages[known_count..].to_vec()
        } else {
            Vec::new()
        };

        Ok((fresh, unread))
    }
}

#[async_trait]
impl RequestHandler<ChatRequest> for ChatRequestHandler {
    async fn handle_request(&self, request: ChatRequest) {
        match request {
            ChatRequest::NewSession { response } => {
                let _ = response.send(self.new_session());
            }
            ChatRequest::Open { chat_id, response } => {
                let _ = response.send(self.open(&chat_id));
            }
            ChatRequest::Send {
                chat_id,
                user_name,
                content,
                response,
            } => {
                let _ = response.send(self.send(&chat_id, &user_name, &content));
            }
            ChatRequest::Poll {
                chat_id,
                known_count,
                response,
            } => {
                let _ = response.send(self.poll(&chat_id, known_count));
            }
        }
    }
}

pub struct ChatService;

impl ChatService {
    pub fn new() -> Self {
        ChatService {}
    }
}

#[async_trait]
impl Service<ChatRequest, ChatRequestHandler> for ChatService {}
