//! Defines the endpoint for creating a new transaction.

use axum::{Json, extract::State};

use crate::{
    AppState, Error,
    response::{ApiJson, CreatedResponse},
    store::{Store, insert_record},
    transaction::{Transaction, TransactionForm},
};

/// A route handler for creating a new transaction, responds with the new
/// transaction's ID.
///
/// The category ID is stored as given, it is not checked against the
/// existing categories.
pub async fn create_transaction_endpoint<S: Store>(
    State(state): State<AppState<S>>,
    ApiJson(form): ApiJson<TransactionForm>,
) -> Result<Json<CreatedResponse>, Error> {
    let transaction = insert_record(&state.store, &Transaction::new(form))
        .await
        .inspect_err(|error| tracing::error!("Could not create transaction: {error}"))?;

    Ok(Json(CreatedResponse {
        id: transaction.id,
        message: "Transaction created successfully".to_owned(),
    }))
}
