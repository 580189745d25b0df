//! Data models representing database entities and API payloads.
//!
//! Entities map to database tables and serialize with camelCase keys and the
//! identifier under `_id`. Request types accept loosely typed input and
//! validate it into the `New*`/`*Patch` values the services work with.

/// Expense entity, requests and listing options
pub mod expense;
/// Budget entity and usage
pub mod budget;
/// Savings goal entity
pub mod goal;
/// Record identifiers
pub mod object_id;
/// Expense summary payload
pub mod summary;
/// Shared wallet entity
pub mod wallet;

pub use budget::{
    Budget, BudgetFilter, BudgetListing, BudgetPatch, BudgetQueryParams, BudgetUsage,
    CreateBudgetRequest, NewBudget, UpdateBudgetRequest,
};
pub use expense::{
    CreateExpenseRequest, DEFAULT_CURRENCY, Expense, ExpensePatch, ExpenseQueryParams,
    ListOptions, MAX_LIST_LIMIT, NewExpense, SortDirection, UpdateExpenseRequest,
};
pub use goal::{
    AdjustProgressRequest, CreateGoalRequest, Goal, GoalFilter, GoalPatch, GoalQueryParams,
    NewGoal, UpdateGoalRequest,
};
pub use object_id::{InvalidObjectId, ObjectId};
pub use summary::{
    Anomaly, CategoryBreakdown, ExpenseSummary, TopCategory, TopExpense, TrendPoint,
};
pub use wallet::{
    CreateWalletRequest, InvalidWalletRole, MemberRequest, NewWallet, UpdateWalletRequest, Wallet,
    WalletMember, WalletPatch, WalletQueryParams, WalletRole,
};
