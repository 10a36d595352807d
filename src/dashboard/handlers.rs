//! HTTP handler for the dashboard totals.

use axum::{Json, extract::State};

use crate::{
    AppState, Error,
    category::BudgetCategory,
    dashboard::aggregation::{DashboardView, dashboard_summary},
    store::{Query, Store, fetch_records},
    transaction::Transaction,
};

/// A route handler for the budget totals across every category and
/// transaction.
pub async fn dashboard_endpoint<S: Store>(
    State(state): State<AppState<S>>,
) -> Result<Json<DashboardView>, Error> {
    let categories: Vec<BudgetCategory> = fetch_records(&state.store, &Query::all()).await?;
    let transactions: Vec<Transaction> = fetch_records(&state.store, &Query::all()).await?;

    dashboard_summary(&categories, &transactions).map(Json)
}
