use serde::{Deserialize, Serialize};

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_COMPLETED: &str = "completed";
// `failed` and `cancelled` exist in the schema but nothing transitions
// a transaction into them.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionType {
    Deposit,
    Withdrawal,
    Investment,
    Earnings,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Deposit => "deposit",
            TransactionType::Withdrawal => "withdrawal",
            TransactionType::Investment => "investment",
            TransactionType::Earnings => "earnings",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "deposit" => Some(TransactionType::Deposit),
            "withdrawal" => Some(TransactionType::Withdrawal),
            "investment" => Some(TransactionType::Investment),
            "earnings" => Some(TransactionType::Earnings),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, sqlx::FromRow)]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    pub tx_type: String,
    pub amount_in_cents: i64,
    pub currency: String,
    pub status: String,
    pub description: String,
    pub metadata: Option<serde_json::Value>,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewTransaction {
    pub user_id: String,
    pub tx_type: String,
    pub amount_in_cents: i64,
    pub currency: String,
    pub status: String,
    pub description: String,
    pub metadata: Option<serde_json::Value>,
}

/// Signed increments applied to a profile when a transaction completes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BalanceDeltas {
    pub balance_in_cents: i64,
    pub total_invested_in_cents: i64,
    pub total_earnings_in_cents: i64,
}

impl BalanceDeltas {
    /// Delta table keyed purely on transaction type. Performs no bounds
    /// checking: a withdrawal larger than the current balance still yields
    /// a negative increment past zero. Sufficiency checks live in the
    /// page-level form handlers only.
    pub fn for_transaction(tx_type: TransactionType, amount_in_cents: i64) -> Self {
        match tx_type {
            TransactionType::Deposit => BalanceDeltas {
                balance_in_cents: amount_in_cents,
                ..Default::default()
            },
            TransactionType::Withdrawal => BalanceDeltas {
                balance_in_cents: -amount_in_cents,
                ..Default::default()
            },
            TransactionType::Investment => BalanceDeltas {
                balance_in_cents: -amount_in_cents,
                total_invested_in_cents: amount_in_cents,
                ..Default::default()
            },
            TransactionType::Earnings => BalanceDeltas {
                balance_in_cents: amount_in_cents,
                total_earnings_in_cents: amount_in_cents,
                ..Default::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deposit_increments_balance_only() {
        let deltas = BalanceDeltas::for_transaction(TransactionType::Deposit, 10_000);
        assert_eq!(deltas.balance_in_cents, 10_000);
        assert_eq!(deltas.total_invested_in_cents, 0);
        assert_eq!(deltas.total_earnings_in_cents, 0);
    }

    #[test]
    fn withdrawal_decrements_balance_only() {
        let deltas = BalanceDeltas::for_transaction(TransactionType::Withdrawal, 2_500);
        assert_eq!(deltas.balance_in_cents, -2_500);
        assert_eq!(deltas.total_invested_in_cents, 0);
        assert_eq!(deltas.total_earnings_in_cents, 0);
    }

    #[test]
    fn investment_moves_balance_into_invested_total() {
        let deltas = BalanceDeltas::for_transaction(TransactionType::Investment, 50_000);
        assert_eq!(deltas.balance_in_cents, -50_000);
        assert_eq!(deltas.total_invested_in_cents, 50_000);
        assert_eq!(deltas.total_earnings_in_cents, 0);
    }

    #[test]
    fn earnings_increment_balance_and_earnings_total() {
        let deltas = BalanceDeltas::for_transaction(TransactionType::Earnings, 1_234);
        assert_eq!(deltas.balance_in_cents, 1_234);
        assert_eq!(deltas.total_invested_in_cents, 0);
        assert_eq!(deltas.total_earnings_in_cents, 1_234);
    }

    // Documents current behavior: the mutator applies a negative delta even
    // when it would drive the balance past zero.
    #[test]
    fn withdrawal_delta_is_unchecked_past_zero() {
        let balance_before = 1_000_i64;
        let deltas = BalanceDeltas::for_transaction(TransactionType::Withdrawal, 5_000);
        assert_eq!(balance_before + deltas.balance_in_cents, -4_000);
    }

    #[test]
    fn type_round_trips_through_strings() {
        for tx_type in [
            TransactionType::Deposit,
            TransactionType::Withdrawal,
            TransactionType::Investment,
            TransactionType::Earnings,
        ] {
            assert_eq!(TransactionType::parse(tx_type.as_str()), Some(tx_type));
        }
        assert_eq!(TransactionType::parse("refund"), None);
    }
}
