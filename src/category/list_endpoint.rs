//! Defines the endpoint for listing categories with their spending.

use axum::{Json, extract::State};

use crate::{
    AppState, Error,
    category::{BudgetCategory, CREATED_AT_FIELD},
    dashboard::{CategoryView, category_with_spending, group_by_category},
    store::{Query, SortOrder, Store, fetch_records},
    transaction::Transaction,
};

/// A route handler for listing every category, oldest first, along with how
/// much of each budget has been spent.
pub async fn list_categories_endpoint<S: Store>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<CategoryView>>, Error> {
    list_categories(&state.store).await.map(Json)
}

/// Get every category in creation order with its spending totals.
///
/// Reads the categories and all transactions once each, rather than once
/// per category.
pub async fn list_categories<S: Store>(store: &S) -> Result<Vec<CategoryView>, Error> {
    let categories: Vec<BudgetCategory> = fetch_records(
        store,
        &Query::all().sort_by(CREATED_AT_FIELD, SortOrder::Ascending),
    )
    .await?;
    let transactions: Vec<Transaction> = fetch_records(store, &Query::all()).await?;

    let mut transactions_by_category = group_by_category(&transactions);

    categories
        .into_iter()
        .map(|category| {
            let category_transactions = transactions_by_category
                .remove(&category.id)
                .unwrap_or_default();
            category_with_spending(category, category_transactions)
        })
        .collect()
}
