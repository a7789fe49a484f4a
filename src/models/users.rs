use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize, sqlx::FromRow)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub country: String,
    pub balance_in_cents: i64,
    pub total_invested_in_cents: i64,
    pub total_earnings_in_cents: i64,
    pub is_verified: bool,
    pub verification_status: String,
    pub role: String,
    pub created_at: chrono::NaiveDateTime,
    pub last_login: chrono::NaiveDateTime,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RegisterData {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub country: String,
}

/// Profile row seeded at registration. Balances start at zero and
/// `verification_status` at `none`; the database fills the rest.
#[derive(Clone, Debug)]
pub struct NewProfile {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub country: String,
}

/// Partial profile update. Every field is optional and merged as-is;
/// there is no field-level validation, so a caller can set the balance
/// directly.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub balance_in_cents: Option<i64>,
    pub total_invested_in_cents: Option<i64>,
    pub total_earnings_in_cents: Option<i64>,
    pub is_verified: Option<bool>,
    pub verification_status: Option<String>,
}
