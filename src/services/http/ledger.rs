use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::oneshot;

use super::{receive_failed, require_session, send_failed, service_error, AppState};
use crate::models::investments::NewInvestment;
use crate::models::transactions::{self, NewTransaction, TransactionType};
use crate::models::users::UserProfile;
use crate::models::withdrawals::{self, WithdrawForm};
use crate::services::accounts::AccountRequest;
use crate::services::ledger::{LedgerRequest, DEFAULT_TRANSACTION_LIMIT};

#[derive(Clone, Debug, Deserialize)]
pub struct DepositForm {
    #[serde(default)]
    pub amount_in_cents: i64,
    pub method: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct InvestForm {
    pub plan_id: String,
    pub plan_name: String,
    #[serde(default)]
    pub amount_in_cents: i64,
    pub duration_days: i32,
    pub interest_rate: f64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TransactionsQuery {
    pub limit: Option<i64>,
}

/// Fetches the profile for the session's bearer token through the accounts
/// service. The balance it carries is whatever the row held at read time;
/// nothing prevents it from going stale before a later write.
async fn fetch_current_user(
    state: &AppState,
    token: String,
) -> Result<UserProfile, (StatusCode, Json<Value>)> {
    let (account_tx, account_rx) = oneshot::channel();
    state
        .account_channel
        .send(AccountRequest::CurrentUser {
            token,
            response: account_tx,
        })
        .await
        .map_err(send_failed)?;

    match account_rx.await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Not authenticated" })),
        )),
        Err(e) => Err(receive_failed(e)),
    }
}

async fn submit_transaction(
    state: &AppState,
    transaction: NewTransaction,
) -> (StatusCode, Json<Value>) {
    let (ledger_tx, ledger_rx) = oneshot::channel();
    let send_result = state
        .ledger_channel
        .send(LedgerRequest::AddTransaction {
            transaction,
            response: ledger_tx,
        })
        .await;
    if let Err(e) = send_result {
        return send_failed(e);
    }

    match ledger_rx.await {
        Ok(Ok(transaction)) => (StatusCode::CREATED, Json(json!({ "transaction": transaction }))),
        Ok(Err(error)) => service_error(error),
        Err(e) => receive_failed(e),
    }
}

pub async fn deposit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(form): Json<DepositForm>,
) -> (StatusCode, Json<Value>) {
    let (_, session) = match require_session(&state, &headers) {
        Ok(session) => session,
        Err(response) => return response,
    };

    if form.amount_in_cents <= 0 {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Please enter a valid amount" })),
        );
    }

    let transaction = NewTransaction {
        user_id: session.user_id,
        tx_type: TransactionType::Deposit.as_str().to_string(),
        amount_in_cents: form.amount_in_cents,
        currency: "BRL".to_string(),
        status: transactions::STATUS_COMPLETED.to_string(),
        description: "Account deposit".to_string(),
        metadata: form.method.map(|method| json!({ "method": method })),
    };

    submit_transaction(&state, transaction).await
}

pub async fn withdraw(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(form): Json<WithdrawForm>,
) -> (StatusCode, Json<Value>) {
    let (token, session) = match require_session(&state, &headers) {
        Ok(session) => session,
        Err(response) => return response,
    };

    let user = match fetch_current_user(&state, token).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let details = match withdrawals::validate(&form, user.balance_in_cents) {
        Ok(details) => details,
        Err(error) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "message": error.to_string() })),
            )
        }
    };

    let transaction = NewTransaction {
        user_id: session.user_id,
        tx_type: TransactionType::Withdrawal.as_str().to_string(),
        amount_in_cents: form.amount_in_cents,
        currency: "BRL".to_string(),
        status: transactions::STATUS_COMPLETED.to_string(),
        description: details,
        metadata: Some(json!({ "method": form.method })),
    };

    submit_transaction(&state, transaction).await
}

pub async fn create_investment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(form): Json<InvestForm>,
) -> (StatusCode, Json<Value>) {
    let (token, session) = match require_session(&state, &headers) {
        Ok(session) => session,
        Err(response) => return response,
    };

    if form.amount_in_cents <= 0 {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Please enter a valid amount" })),
        );
    }

    let user = match fetch_current_user(&state, token).await {
        Ok(user) => user,
        Err(response) => return response,
    };
    if form.amount_in_cents > user.balance_in_cents {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Insufficient balance" })),
        );
    }

    let (ledger_tx, ledger_rx) = oneshot::channel();
    let send_result = state
        .ledger_channel
        .send(LedgerRequest::AddInvestment {
            investment: NewInvestment {
                user_id: session.user_id,
                plan_id: form.plan_id,
                plan_name: form.plan_name,
                amount_in_cents: form.amount_in_cents,
                duration_days: form.duration_days,
                interest_rate: form.interest_rate,
            },
            response: ledger_tx,
        })
        .await;
    if let Err(e) = send_result {
        return send_failed(e);
    }

    match ledger_rx.await {
        Ok(Ok(investment)) => (StatusCode::CREATED, Json(json!({ "investment": investment }))),
        Ok(Err(error)) => service_error(error),
        Err(e) => receive_failed(e),
    }
}

pub async fn list_transactions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<TransactionsQuery>,
) -> (StatusCode, Json<Value>) {
    let (_, session) = match require_session(&state, &headers) {
        Ok(session) => session,
        Err(response) => return response,
    };

    let (ledger_tx, ledger_rx) = oneshot::channel();
    let send_result = state
        .ledger_channel
        .send(LedgerRequest::ListTransactions {
            user_id: session.user_id,
            limit: query.limit.unwrap_or(DEFAULT_TRANSACTION_LIMIT),
            response: ledger_tx,
        })
        .await;
    if let Err(e) = send_result {
        return send_failed(e);
    }

    match ledger_rx.await {
        Ok(Ok(transactions)) => (
            StatusCode::OK,
            Json(json!({ "transactions": transactions })),
        ),
        Ok(Err(error)) => service_error(error),
        Err(e) => receive_failed(e),
    }
}

pub async fn list_investments(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    let (_, session) = match require_session(&state, &headers) {
        Ok(session) => session,
        Err(response) => return response,
    };

    let (ledger_tx, ledger_rx) = oneshot::channel();
    let send_result = state
        .ledger_channel
        .send(LedgerRequest::ListInvestments {
            user_id: session.user_id,
            response: ledger_tx,
        })
        .await;
    if let Err(e) = send_result {
        return send_failed(e);
    }

    match ledger_rx.await {
        Ok(Ok(investments)) => (StatusCode::OK, Json(json!({ "investments": investments }))),
        Ok(Err(error)) => service_error(error),
        Err(e) => receive_failed(e),
    }
}

pub async fn dashboard(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    let (token, session) = match require_session(&state, &headers) {
        Ok(session) => session,
        Err(response) => return response,
    };

    let user = match fetch_current_user(&state, token).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let (transactions_tx, transactions_rx) = oneshot::channel();
    let send_result = state
        .ledger_channel
        .send(LedgerRequest::ListTransactions {
            user_id: session.user_id.clone(),
            limit: 5,
            response: transactions_tx,
        })
        .await;
    if let Err(e) = send_result {
        return send_failed(e);
    }

    let (investments_tx, investments_rx) = oneshot::channel();
    let send_result = state
        .ledger_channel
        .send(LedgerRequest::ListInvestments {
            user_id: session.user_id,
            response: investments_tx,
        })
        .await;
    if let Err(e) = send_result {
        return send_failed(e);
    }

    let recent_transactions = match transactions_rx.await {
        Ok(Ok(transactions)) => transactions,
        Ok(Err(error)) => return service_error(error),
        Err(e) => return receive_failed(e),
    };
    let investments = match investments_rx.await {
        Ok(Ok(investments)) => investments,
        Ok(Err(error)) => return service_error(error),
        Err(e) => return receive_failed(e),
    };

    (
        StatusCode::OK,
        Json(json!({
            "user": user,
            "recent_transactions": recent_transactions,
            "investments": investments
        })),
    )
}
