use serde::{Deserialize, Serialize};

pub const STATUS_ACTIVE: &str = "active";
// `completed` and `cancelled` exist in the schema; no state transition
// logic drives an investment out of `active`.

#[derive(Clone, Debug, Deserialize, Serialize, sqlx::FromRow)]
pub struct Investment {
    pub id: String,
    pub user_id: String,
    pub plan_id: String,
    pub plan_name: String,
    pub amount_in_cents: i64,
    pub duration_days: i32,
    pub interest_rate: f64,
    pub expected_return_in_cents: i64,
    pub status: String,
    pub start_date: chrono::NaiveDateTime,
    pub end_date: chrono::NaiveDateTime,
    pub created_at: chrono::NaiveDateTime,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewInvestment {
    pub user_id: String,
    pub plan_id: String,
    pub plan_name: String,
    pub amount_in_cents: i64,
    pub duration_days: i32,
    /// Plan interest rate in percent over the full duration.
    pub interest_rate: f64,
}

impl NewInvestment {
    pub fn expected_return_in_cents(&self) -> i64 {
        let interest = (self.amount_in_cents as f64 * self.interest_rate / 100.0).round() as i64;
        self.amount_in_cents + interest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(amount_in_cents: i64, interest_rate: f64) -> NewInvestment {
        NewInvestment {
            user_id: "user-1".to_string(),
            plan_id: "starter".to_string(),
            plan_name: "Starter Plan".to_string(),
            amount_in_cents,
            duration_days: 30,
            interest_rate,
        }
    }

    #[test]
    fn expected_return_adds_interest_on_top_of_principal() {
        assert_eq!(plan(100_000, 15.0).expected_return_in_cents(), 115_000);
    }

    #[test]
    fn expected_return_rounds_to_whole_cents() {
        // 12.5% of 333 cents is 41.625, rounded to 42.
        assert_eq!(plan(333, 12.5).expected_return_in_cents(), 375);
    }
}
