use sqlx::PgPool;

use crate::models::transactions::BalanceDeltas;
use crate::models::users::{NewProfile, ProfileUpdate, UserProfile};

#[derive(Clone)]
pub struct UserRepository {
    conn: PgPool,
}

impl UserRepository {
    pub fn new(conn: PgPool) -> Self {
        UserRepository { conn }
    }

    pub async fn insert_profile(&self, profile: &NewProfile) -> Result<UserProfile, anyhow::Error> {
        let user = sqlx::query_as::<_, UserProfile>(
            r#"
                INSERT INTO users (id, email, first_name, last_name, phone, country)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
            "#,
        )
        .bind(&profile.id)
        .bind(&profile.email)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.phone)
        .bind(&profile.country)
        .fetch_one(&self.conn)
        .await?;

        Ok(user)
    }

    pub async fn get_profile(&self, id: &str) -> Result<Option<UserProfile>, anyhow::Error> {
        let user = sqlx::query_as::<_, UserProfile>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.conn)
            .await?;

        Ok(user)
    }

    /// Merges the provided fields into the stored row. Unset fields keep
    /// their current value; set fields are written as-is, balance included.
    pub async fn update_profile(
        &self,
        id: &str,
        update: &ProfileUpdate,
    ) -> Result<(), anyhow::Error> {
        sqlx::query(
            r#"
                UPDATE users SET
                    first_name = COALESCE($2, first_name),
                    last_name = COALESCE($3, last_name),
                    phone = COALESCE($4, phone),
                    country = COALESCE($5, country),
                    balance_in_cents = COALESCE($6, balance_in_cents),
                    total_invested_in_cents = COALESCE($7, total_invested_in_cents),
                    total_earnings_in_cents = COALESCE($8, total_earnings_in_cents),
                    is_verified = COALESCE($9, is_verified),
                    verification_status = COALESCE($10, verification_status)
                WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&update.first_name)
        .bind(&update.last_name)
        .bind(&update.phone)
        .bind(&update.country)
        .bind(update.balance_in_cents)
        .bind(update.total_invested_in_cents)
        .bind(update.total_earnings_in_cents)
        .bind(update.is_verified)
        .bind(&update.verification_status)
        .execute(&self.conn)
        .await?;

        Ok(())
    }

    pub async fn touch_last_login(&self, id: &str) -> Result<(), anyhow::Error> {
        sqlx::query("UPDATE users SET last_login = CURRENT_TIMESTAMP WHERE id = $1")
            .bind(id)
            .execute(&self.conn)
            .await?;

        Ok(())
    }

    /// Field-level increment of the profile's numeric fields. Sent as a
    /// single UPDATE, independent of whatever balance the caller last read.
    pub async fn apply_balance_deltas(
        &self,
        id: &str,
        deltas: BalanceDeltas,
    ) -> Result<(), anyhow::Error> {
        sqlx::query(
            r#"
                UPDATE users SET
                    balance_in_cents = balance_in_cents + $2,
                    total_invested_in_cents = total_invested_in_cents + $3,
                    total_earnings_in_cents = total_earnings_in_cents + $4
                WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(deltas.balance_in_cents)
        .bind(deltas.total_invested_in_cents)
        .bind(deltas.total_earnings_in_cents)
        .execute(&self.conn)
        .await?;

        Ok(())
    }
}
