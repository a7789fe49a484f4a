pub mod chat;
pub mod identity;
pub mod investments;
pub mod transactions;
pub mod users;
