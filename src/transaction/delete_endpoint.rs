//! Defines the endpoint for deleting a transaction.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    AppState, Error,
    response::MessageResponse,
    store::{Store, delete_record},
    transaction::{Transaction, TransactionId},
};

/// A route handler for deleting a transaction.
pub async fn delete_transaction_endpoint<S: Store>(
    State(state): State<AppState<S>>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Json<MessageResponse>, Error> {
    delete_record::<_, Transaction>(&state.store, &transaction_id)
        .await
        .map_err(|error| match error {
            Error::NotFound => Error::TransactionNotFound,
            error => {
                tracing::error!("Could not delete transaction {transaction_id}: {error}");
                error
            }
        })?;

    Ok(Json(MessageResponse::new("Transaction deleted successfully")))
}

#[cfg(test)]
mod tests {
    use axum::{Router, routing::delete};
    use axum_test::TestServer;
    use serde_json::{Value, json};
    use time::macros::datetime;

    use crate::{
        AppState,
        category::CategoryId,
        endpoints::{self, format_endpoint},
        store::{DocumentStore, Query, fetch_records, insert_record},
        transaction::{Transaction, TransactionForm, delete_transaction_endpoint},
    };

    fn get_test_server(store: DocumentStore) -> TestServer {
        let app = Router::new()
            .route(endpoints::TRANSACTION, delete(delete_transaction_endpoint))
            .with_state(AppState::new(store));

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn deletes_transaction() {
        let store = DocumentStore::in_memory();
        let transaction = insert_record(
            &store,
            &Transaction::new(TransactionForm {
                category_id: CategoryId::from("c1"),
                amount: 75.0,
                description: "Weekly shopping".to_owned(),
                date: datetime!(2024-01-15 10:30:00 UTC),
            }),
        )
        .await
        .unwrap();
        let server = get_test_server(store.clone());

        let response = server
            .delete(&format_endpoint(endpoints::TRANSACTION, &transaction.id))
            .await;

        response.assert_status_ok();
        assert_eq!(
            response.json::<Value>(),
            json!({"message": "Transaction deleted successfully"})
        );
        let transactions: Vec<Transaction> =
            fetch_records(&store, &Query::all()).await.unwrap();
        assert!(transactions.is_empty());
    }

    #[tokio::test]
    async fn missing_transaction_is_not_found() {
        let server = get_test_server(DocumentStore::in_memory());

        let response = server
            .delete(&format_endpoint(endpoints::TRANSACTION, "nonexistent-id"))
            .await;

        response.assert_status_not_found();
        assert_eq!(
            response.json::<Value>(),
            json!({"detail": "Transaction not found"})
        );
    }
}
