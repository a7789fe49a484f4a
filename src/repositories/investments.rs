use sqlx::PgPool;
use uuid::Uuid;

use crate::models::investments::{self, Investment, NewInvestment};

#[derive(Clone)]
pub struct InvestmentRepository {
    conn: PgPool,
}

impl InvestmentRepository {
    pub fn new(conn: PgPool) -> Self {
        InvestmentRepository { conn }
    }

    pub async fn insert_investment(
        &self,
        new: &NewInvestment,
    ) -> Result<Investment, anyhow::Error> {
        let investment_id = Uuid::new_v4().hyphenated().to_string();
        let start_date = chrono::Utc::now().naive_utc();
        let end_date = start_date + chrono::Duration::days(new.duration_days as i64);

        let investment = sqlx::query_as::<_, Investment>(
            r#"
                INSERT INTO investments
                (id, user_id, plan_id, plan_name, amount_in_cents, duration_days,
                 interest_rate, expected_return_in_cents, status, start_date, end_date)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                RETURNING *
            "#,
        )
        .bind(&investment_id)
        .bind(&new.user_id)
        .bind(&new.plan_id)
        .bind(&new.plan_name)
        .bind(new.amount_in_cents)
        .bind(new.duration_days)
        .bind(new.interest_rate)
        .bind(new.expected_return_in_cents())
        .bind(investments::STATUS_ACTIVE)
        .bind(start_date)
        .bind(end_date)
        .fetch_one(&self.conn)
        .await?;

        Ok(investment)
    }

    pub async fn user_investments(&self, user_id: &str) -> Result<Vec<Investment>, anyhow::Error> {
        let investments = sqlx::query_as::<_, Investment>(
            r#"
                SELECT * FROM investments
                WHERE user_id = $1
                ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.conn)
        .await?;

        Ok(investments)
    }
}
