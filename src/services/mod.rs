//! Business logic services.
//!
//! Services contain core business logic separated from HTTP handlers.
//! Expenses go through [`ExpenseService`](expense_service::ExpenseService),
//! which owns the filter builder, aggregator and summary cache; budgets, goals
//! and wallets are plain functions over the connection pool.

pub mod aggregator;
pub mod budget_service;
pub mod cache;
pub mod expense_service;
pub mod filter;
pub mod goal_service;
pub mod wallet_service;
