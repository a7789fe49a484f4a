use async_trait::async_trait;
use serde_json::json;
use sqlx::PgPool;
use tokio::sync::oneshot;

use super::{RequestHandler, Service, ServiceError};
use crate::models::investments::{Investment, NewInvestment};
use crate::models::transactions::{
    self, BalanceDeltas, NewTransaction, Transaction, TransactionType,
};
use crate::repositories::investments::InvestmentRepository;
use crate::repositories::transactions::TransactionRepository;
use crate::repositories::users::UserRepository;

pub const DEFAULT_TRANSACTION_LIMIT: i64 = 50;

pub enum LedgerRequest {
    AddTransaction {
        transaction: NewTransaction,
        response: oneshot::Sender<Result<Transaction, ServiceError>>,
    },
    ListTransactions {
        user_id: String,
        limit: i64,
        response: oneshot::Sender<Result<Vec<Transaction>, ServiceError>>,
    },
    AddInvestment {
        investment: NewInvestment,
        response: oneshot::Sender<Result<Investment, ServiceError>>,
    },
    ListInvestments {
        user_id: String,
        response: oneshot::Sender<Result<Vec<Investment>, ServiceError>>,
    },
}

#[derive(Clone)]
pub struct LedgerRequestHandler {
    transactions: TransactionRepository,
    investments: InvestmentRepository,
    users: UserRepository,
}

impl LedgerRequestHandler {
    pub fn new(sql_conn: PgPool) -> Self {
        LedgerRequestHandler {
            transactions: TransactionRepository::new(sql_conn.clone()),
            investments: InvestmentRepository::new(sql_conn.clone()),
            users: UserRepository::new(sql_conn),
        }
    }

    async fn add_transaction(&self, new: NewTransaction) -> Result<Transaction, ServiceError> {
        let Some(tx_type) = TransactionType::parse(&new.tx_type) else {
            return Err(ServiceError::Internal(format!(
                "Unknown transaction type: {}",
                new.tx_type
            )));
        };

        let transaction = self
            .transactions
            .insert_transaction(&new)
            .await
            .map_err(|e| ServiceError::Repository("LedgerService".to_string(), e.to_string()))?;

        if transaction.status == transactions::STATUS_COMPLETED {
            let deltas = BalanceDeltas::for_transaction(tx_type, transaction.amount_in_cents);

            // Separate write from the insert above. A failure here leaves a
            // completed transaction with no matching balance change, and the
            // operation still reports success.
            if let Err(e) = self
                .users
                .apply_balance_deltas(&transaction.user_id, deltas)
                .await
            {
                log::error!(
                    "Could not apply balance change for transaction {}: {}",
                    transaction.id,
                    e
                );
            }
        }

        Ok(transaction)
    }

    async fn list_transactions(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<Transaction>, ServiceError> {
        self.transactions
            .user_transactions(user_id, limit)
            .await
            .map_err(|e| ServiceError::Repository("LedgerService".to_string(), e.to_string()))
    }

    async fn add_investment(&self, new: NewInvestment) -> Result<Investment, ServiceError> {
        let investment = self
            .investments
            .insert_investment(&new)
            .await
            .map_err(|e| ServiceError::Repository("LedgerService".to_string(), e.to_string()))?;

        let linked = NewTransaction {
            user_id: investment.user_id.clone(),
            tx_type: TransactionType::Investment.as_str().to_string(),
            amount_in_cents: investment.amount_in_cents,
            currency: "BRL".to_string(),
            status: transactions::STATUS_COMPLETED.to_string(),
            description: format!("Investment in {}", investment.plan_name),
            metadata: Some(json!({ "investment_id": investment.id })),
        };
        self.add_transaction(linked).await?;

        Ok(investment)
    }

    async fn list_investments(&self, user_id: &str) -> Result<Vec<Investment>, ServiceError> {
        self.investments
            .user_investments(user_id)
            .await
            .map_err(|e| ServiceError::Repository("LedgerService".to_string(), e.to_string()))
    }
}

#[async_trait]
impl RequestHandler<LedgerRequest> for LedgerRequestHandler {
    async fn handle_request(&self, request: LedgerRequest) {
        match request {
            LedgerRequest::AddTransaction {
                transaction,
                response,
            } => {
                let result = self.add_transaction(transaction).await;
                let _ = response.send(result);
            }
            LedgerRequest::ListTransactions {
                user_id,
                limit,
                response,
            } => {
                let result = self.list_transactions(&user_id, limit).await;
                let _ = response.send(result);
            }
            LedgerRequest::AddInvestment {
                investment,
                response,
            } => {
                let result = self.add_investment(investment).await;
                let _ = response.send(result);
            }
            LedgerRequest::ListInvestments { user_id, response } => {
                let result = self.list_investments(&user_id).await;
                let _ = response.send(result);
            }
        }
    }
}

pub struct LedgerService;

impl LedgerService {
    pub fn new() -> Self {
        LedgerService {}
    }
}

#[async_trait]
impl Service<LedgerRequest, LedgerRequestHandler> for LedgerService {}
