//! End-to-end account flows against a real Postgres plus a stub identity
//! provider. These need a database, so they are ignored by default:
//!
//!     DATABASE_URL=postgres://... cargo test --test e2e_db -- --ignored

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use dashmap::DashMap;
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use mxtm_platform::models::transactions::{NewTransaction, Transaction};
use mxtm_platform::models::users::RegisterData;
use mxtm_platform::repositories::identity::{AuthError, IdentityApi};
use mxtm_platform::services::accounts::{AccountRequest, AccountRequestHandler, AccountService};
use mxtm_platform::services::ledger::{LedgerRequest, LedgerRequestHandler, LedgerService};
use mxtm_platform::services::{Service, ServiceError, SessionMap};

type ProviderAccounts = Arc<DashMap<String, String>>;

async fn create_account(
    State(accounts): State<ProviderAccounts>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let email = body["email"].as_str().unwrap_or_default().to_string();
    let password = body["password"].as_str().unwrap_or_default().to_string();

    if accounts.contains_key(&email) {
        return Json(json!({ "error": { "code": "auth/email-already-in-use" } }));
    }
    accounts.insert(email.clone(), password);

    Json(json!({ "session": {
        "uid": format!("uid-{}", email),
        "token": format!("token-{}", Uuid::new_v4())
    }}))
}

async fn create_session(
    State(accounts): State<ProviderAccounts>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let email = body["email"].as_str().unwrap_or_default().to_string();
    let password = body["password"].as_str().unwrap_or_default();

    match accounts.get(&email) {
        None => Json(json!({ "error": { "code": "auth/user-not-found" } })),
        Some(stored) if stored.value() == password => Json(json!({ "session": {
            "uid": format!("uid-{}", email),
            "token": format!("token-{}", Uuid::new_v4())
        }})),
        Some(_) => Json(json!({ "error": { "code": "auth/wrong-password" } })),
    }
}

async fn ok_body() -> Json<Value> {
    Json(json!({ "ok": true }))
}

async fn start_provider_stub() -> String {
    let accounts: ProviderAccounts = Arc::new(DashMap::new());
    let app = Router::new()
        .route("/v1/accounts", post(create_account))
        .route("/v1/sessions", post(create_session))
        .route("/v1/sessions/revoke", post(ok_body))
        .with_state(accounts);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

async fn start_platform(
    pool: PgPool,
    provider_url: String,
) -> (mpsc::Sender<AccountRequest>, mpsc::Sender<LedgerRequest>) {
    let sessions: SessionMap = Arc::new(DashMap::new());

    let (account_tx, mut account_rx) = mpsc::channel(64);
    let identity = IdentityApi::new("test-key".to_string(), provider_url);
    let account_handler = AccountRequestHandler::new(pool.clone(), identity, sessions);
    tokio::spawn(async move {
        AccountService::new()
            .run(account_handler, &mut account_rx)
            .await;
    });

    let (ledger_tx, mut ledger_rx) = mpsc::channel(64);
    let ledger_handler = LedgerRequestHandler::new(pool);
    tokio::spawn(async move {
        LedgerService::new().run(ledger_handler, &mut ledger_rx).await;
    });

    (account_tx, ledger_tx)
}

async fn connect() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for e2e tests");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("Could not connect to database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Could not run migrations");
    pool
}

fn register_data(email: &str) -> RegisterData {
    RegisterData {
        email: email.to_string(),
        password: "secret1".to_string(),
        first_name: "Ana".to_string(),
        last_name: "Souza".to_string(),
        phone: "+55 11 99999-0000".to_string(),
        country: "BR".to_string(),
    }
}

fn unique_email() -> String {
    format!("user-{}@example.com", Uuid::new_v4().simple())
}

async fn register(
    account_tx: &mpsc::Sender<AccountRequest>,
    email: &str,
) -> Result<(String, mxtm_platform::models::users::UserProfile), ServiceError> {
    let (tx, rx) = oneshot::channel();
    account_tx
        .send(AccountRequest::Register {
            data: register_data(email),
            response: tx,
        })
        .await
        .unwrap();
    rx.await.unwrap()
}

async fn current_user(
    account_tx: &mpsc::Sender<AccountRequest>,
    token: &str,
) -> Option<mxtm_platform::models::users::UserProfile> {
    let (tx, rx) = oneshot::channel();
    account_tx
        .send(AccountRequest::CurrentUser {
            token: token.to_string(),
            response: tx,
        })
        .await
        .unwrap();
    rx.await.unwrap()
}

async fn deposit(
    ledger_tx: &mpsc::Sender<LedgerRequest>,
    user_id: &str,
    amount_in_cents: i64,
) -> Transaction {
    let (tx, rx) = oneshot::channel();
    ledger_tx
        .send(LedgerRequest::AddTransaction {
            transaction: NewTransaction {
                user_id: user_id.to_string(),
                tx_type: "deposit".to_string(),
                amount_in_cents,
                currency: "BRL".to_string(),
                status: "completed".to_string(),
                description: "Account deposit".to_string(),
                metadata: None,
            },
            response: tx,
        })
        .await
        .unwrap();
    rx.await.unwrap().unwrap()
}

#[tokio::test]
#[ignore]
async fn register_login_deposit_shows_the_new_balance() {
    let pool = connect().await;
    let provider = start_provider_stub().await;
    let (account_tx, ledger_tx) = start_platform(pool, provider).await;

    let email = unique_email();
    let (_, registered) = register(&account_tx, &email).await.unwrap();
    assert_eq!(registered.balance_in_cents, 0);
    assert_eq!(registered.verification_status, "none");

    let (tx, rx) = oneshot::channel();
    account_tx
        .send(AccountRequest::Login {
            email: email.clone(),
            password: "secret1".to_string(),
            response: tx,
        })
        .await
        .unwrap();
    let (token, logged_in) = rx.await.unwrap().unwrap();
    assert_eq!(logged_in.balance_in_cents, 0);

    deposit(&ledger_tx, &registered.id, 100_00).await;

    let user = current_user(&account_tx, &token).await.unwrap();
    assert_eq!(user.balance_in_cents, 100_00);
}

#[tokio::test]
#[ignore]
async fn duplicate_registration_fails_and_leaves_the_profile_alone() {
    let pool = connect().await;
    let provider = start_provider_stub().await;
    let (account_tx, ledger_tx) = start_platform(pool, provider).await;

    let email = unique_email();
    let (token, first) = register(&account_tx, &email).await.unwrap();
    deposit(&ledger_tx, &first.id, 50_00).await;

    let err = register(&account_tx, &email).await.unwrap_err();
    match &err {
        ServiceError::Auth(AuthError::DuplicateEmail) => {
            assert_eq!(err.to_string(), "Email is already registered");
        }
        other => panic!("unexpected error: {}", other),
    }

    let user = current_user(&account_tx, &token).await.unwrap();
    assert_eq!(user.balance_in_cents, 50_00);
}

#[tokio::test]
#[ignore]
async fn withdrawal_past_zero_drives_the_balance_negative() {
    let pool = connect().await;
    let provider = start_provider_stub().await;
    let (account_tx, ledger_tx) = start_platform(pool, provider).await;

    let email = unique_email();
    let (token, user) = register(&account_tx, &email).await.unwrap();
    deposit(&ledger_tx, &user.id, 10_00).await;

    // The mutator applies the signed delta with no sufficiency check.
    let (tx, rx) = oneshot::channel();
    ledger_tx
        .send(LedgerRequest::AddTransaction {
            transaction: NewTransaction {
                user_id: user.id.clone(),
                tx_type: "withdrawal".to_string(),
                amount_in_cents: 50_00,
                currency: "BRL".to_string(),
                status: "completed".to_string(),
                description: "PayPal: payee@example.com".to_string(),
                metadata: None,
            },
            response: tx,
        })
        .await
        .unwrap();
    rx.await.unwrap().unwrap();

    let user = current_user(&account_tx, &token).await.unwrap();
    assert_eq!(user.balance_in_cents, -40_00);
}

#[tokio::test]
#[ignore]
async fn transactions_list_newest_first_and_respect_the_limit() {
    let pool = connect().await;
    let provider = start_provider_stub().await;
    let (account_tx, ledger_tx) = start_platform(pool, provider).await;

    let email = unique_email();
    let (_, user) = register(&account_tx, &email).await.unwrap();

    for amount in [1_00, 2_00, 3_00, 4_00, 5_00] {
        deposit(&ledger_tx, &user.id, amount).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let (tx, rx) = oneshot::channel();
    ledger_tx
        .send(LedgerRequest::ListTransactions {
            user_id: user.id.clone(),
            limit: 3,
            response: tx,
        })
        .await
        .unwrap();
    let transactions = rx.await.unwrap().unwrap();

    assert_eq!(transactions.len(), 3);
    assert!(transactions
        .windows(2)
        .all(|pair| pair[0].created_at >= pair[1].created_at));
    assert_eq!(transactions[0].amount_in_cents, 5_00);
}
