use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use sqlx::PgPool;
use tokio::sync::mpsc;

use crate::repositories::chat::ChatStore;
use crate::repositories::identity::{AuthError, IdentityApi};
use crate::settings::Settings;

pub mod accounts;
pub mod chat;
pub mod http;
pub mod ledger;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Internal error: {0}")]
    Internal(String),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Repository error: {0} - {1}")]
    Repository(String, String),
    #[error("Communication error: {0} - {1}")]
    Communication(String, String),
    #[error("{0}")]
    Auth(#[from] AuthError),
    #[error("User profile not found")]
    ProfileNotFound,
}

/// Active session, keyed by the provider token in a shared map. The
/// accounts service inserts and removes entries; the HTTP layer reads them.
#[derive(Clone, Debug)]
pub struct Session {
    pub user_id: String,
    pub email: String,
}

pub type SessionMap = Arc<DashMap<String, Session>>;

#[async_trait]
pub trait RequestHandler<T>: Send + Sync + 'static
where
    T: Send + 'static,
{
    async fn handle_request(&self, request: T);
}

#[async_trait]
pub trait Service<T, H>: Send + Sync + 'static
where
    T: Send + 'static,
    H: RequestHandler<T> + Clone + Send,
{
    async fn run(&mut self, handler: H, receiver: &mut mpsc::Receiver<T>) {
        while let Some(request) = receiver.recv().await {
            let handler = handler.clone();

            tokio::spawn(async move {
                handler.handle_request(request).await;
            });
        }
    }
}

pub async fn start_services(pool: PgPool, settings: Settings) -> Result<(), anyhow::Error> {
    let (account_tx, mut account_rx) = mpsc::channel(512);
    let (ledger_tx, mut ledger_rx) = mpsc::channel(512);
    let (chat_tx, mut chat_rx) = mpsc::channel(512);

    let sessions: SessionMap = Arc::new(DashMap::new());

    let mut account_service = accounts::AccountService::new();
    let mut ledger_service = ledger::LedgerService::new();
    let mut chat_service = chat::ChatService::new();

    log::info!("Starting accounts service.");
    let identity = IdentityApi::new(settings.identity.api_key, settings.identity.url);
    let account_pool = pool.clone();
    let account_sessions = sessions.clone();
    tokio::spawn(async move {
        account_service
            .run(
                accounts::AccountRequestHandler::new(account_pool, identity, account_sessions),
                &mut account_rx,
            )
            .await;
    });

    log::info!("Starting ledger service.");
    let ledger_pool = pool.clone();
    tokio::spawn(async move {
        ledger_service
            .run(ledger::LedgerRequestHandler::new(ledger_pool), &mut ledger_rx)
            .await;
    });

    log::info!("Starting chat service.");
    let chat_dir = settings
        .chat
        .storage_dir
        .map(PathBuf::from)
        .unwrap_or_else(ChatStore::default_dir);
    let chat_store = ChatStore::new(chat_dir)?;
    tokio::spawn(async move {
        chat_service
            .run(chat::ChatRequestHandler::new(chat_store), &mut chat_rx)
            .await;
    });

    log::info!("Starting HTTP server.");
    http::start_http_server(&settings.http.listen, account_tx, ledger_tx, chat_tx, sessions)
        .await?;

    Ok(())
}
