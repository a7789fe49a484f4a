use sqlx::PgPool;
use uuid::Uuid;

use crate::models::transactions::{NewTransaction, Transaction};

#[derive(Clone)]
pub struct TransactionRepository {
    conn: PgPool,
}

impl TransactionRepository {
    pub fn new(conn: PgPool) -> Self {
        TransactionRepository { conn }
    }

    pub async fn insert_transaction(
        &self,
        new: &NewTransaction,
    ) -> Result<Transaction, anyhow::Error> {
        let transaction_id = Uuid::new_v4().hyphenated().to_string();

        let transaction = sqlx::query_as::<_, Transaction>(
            r#"
                INSERT INTO transactions
                (id, user_id, tx_type, amount_in_cents, currency, status, description, metadata)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING *
            "#,
        )
        .bind(&transaction_id)
        .bind(&new.user_id)
        .bind(&new.tx_type)
        .bind(new.amount_in_cents)
        .bind(&new.currency)
        .bind(&new.status)
        .bind(&new.description)
        .bind(&new.metadata)
        .fetch_one(&self.conn)
        .await?;

        Ok(transaction)
    }

    pub async fn user_transactions(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<Transaction>, anyhow::Error> {
        let transactions = sqlx::query_as::<_, Transaction>(
            r#"
                SELECT * FROM transactions
                WHERE user_id = $1
                ORDER BY created_at DESC
                LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.conn)
        .await?;

        Ok(transactions)
    }
}
