//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Extracts and validates path, query and JSON input
//! 2. Calls into a service
//! 3. Returns JSON with the matching status code
//!
//! Extractor rejections are taken as `Result`s and converted into
//! validation errors, so malformed input gets the same error body as
//! invalid input.

/// Budget endpoints
pub mod budgets;
/// Expense endpoints, including the summary
pub mod expenses;
/// Savings goal endpoints
pub mod goals;
/// Health check endpoint
pub mod health;
/// Wallet endpoints
pub mod wallets;
