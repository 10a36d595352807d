//! Defines the endpoint for updating a transaction.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    AppState, Error,
    response::{ApiJson, MessageResponse},
    store::{Store, update_record},
    transaction::{Transaction, TransactionForm, TransactionId},
};

/// A route handler for replacing the fields of a transaction.
pub async fn edit_transaction_endpoint<S: Store>(
    State(state): State<AppState<S>>,
    Path(transaction_id): Path<TransactionId>,
    ApiJson(form): ApiJson<TransactionForm>,
) -> Result<Json<MessageResponse>, Error> {
    update_transaction(&transaction_id, &form, &state.store).await?;

    Ok(Json(MessageResponse::new("Transaction updated successfully")))
}

/// Replace the category, amount, description and date of the transaction
/// with `id`. The ID and `created_at` are kept.
///
/// # Errors
/// Returns [Error::TransactionNotFound] if there is no transaction with `id`.
pub async fn update_transaction<S: Store>(
    id: &TransactionId,
    form: &TransactionForm,
    store: &S,
) -> Result<Transaction, Error> {
    update_record(store, id, form)
        .await
        .map_err(|error| match error {
            Error::NotFound => Error::TransactionNotFound,
            error => {
                tracing::error!("Could not update transaction {id}: {error}");
                error
            }
        })
}
