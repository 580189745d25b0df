//! Finance tracker backend.
//!
//! A REST API over expenses, budgets, savings goals and shared wallets. The
//! centerpiece is the expense summary engine: filter criteria become a single
//! predicate, the store aggregates matching expenses, and results are cached
//! per criteria until the next expense write.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod store;
pub mod validation;

use axum::{
    Router,
    extract::FromRef,
    http::{HeaderValue, header::InvalidHeaderValue},
    routing::{delete, get, patch, post},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{db::DbPool, services::expense_service::ExpenseService};

/// Shared state for all handlers.
///
/// Handlers extract only the part they need through [`FromRef`].
#[derive(Clone)]
pub struct AppState {
    /// Connection pool for budgets, goals and wallets
    pub pool: DbPool,
    /// Expense operations, wired to a store and a summary cache
    pub expenses: ExpenseService,
}

impl FromRef<AppState> for DbPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for ExpenseService {
    fn from_ref(state: &AppState) -> Self {
        state.expenses.clone()
    }
}

/// CORS for the browser dashboard: only `allowed_origin` when given, any
/// origin otherwise.
pub fn cors_layer(allowed_origin: Option<&str>) -> Result<CorsLayer, InvalidHeaderValue> {
    let origin = match allowed_origin {
        Some(origin) => CorsLayer::new().allow_origin(origin.parse::<HeaderValue>()?),
        None => CorsLayer::new().allow_origin(Any),
    };
    Ok(origin.allow_methods(Any).allow_headers(Any))
}

/// Build the application router with all routes and middleware.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    use handlers::{budgets, expenses, goals, health, wallets};

    Router::new()
        .route("/health", get(health::health_check))
        // Expenses
        .route(
            "/api/expenses",
            get(expenses::list_expenses).post(expenses::create_expense),
        )
        .route("/api/expenses/summary", get(expenses::expense_summary))
        .route(
            "/api/expenses/{id}",
            get(expenses::get_expense)
                .put(expenses::update_expense)
                .delete(expenses::delete_expense),
        )
        // Budgets
        .route(
            "/api/budgets",
            get(budgets::list_budgets).post(budgets::create_budget),
        )
        .route(
            "/api/budgets/{id}",
            get(budgets::get_budget)
                .put(budgets::update_budget)
                .delete(budgets::delete_budget),
        )
        // Goals
        .route("/api/goals", get(goals::list_goals).post(goals::create_goal))
        .route(
            "/api/goals/{id}",
            get(goals::get_goal)
                .put(goals::update_goal)
                .delete(goals::delete_goal),
        )
        .route("/api/goals/{id}/progress", patch(goals::adjust_progress))
        // Wallets
        .route(
            "/api/wallets",
            get(wallets::list_wallets).post(wallets::create_wallet),
        )
        .route(
            "/api/wallets/{id}",
            get(wallets::get_wallet)
                .put(wallets::update_wallet)
                .delete(wallets::delete_wallet),
        )
        .route("/api/wallets/{id}/members", post(wallets::add_member))
        .route(
            "/api/wallets/{id}/members/{user_id}",
            delete(wallets::remove_member),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
