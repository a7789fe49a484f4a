pub mod chat;
pub mod investments;
pub mod transactions;
pub mod users;
pub mod withdrawals;
