//! Defines the endpoint for deleting a category and its transactions.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    AppState, Error,
    category::{BudgetCategory, CategoryId},
    response::MessageResponse,
    store::{Filter, Store, delete_record, delete_records},
    transaction::{CATEGORY_ID_FIELD, Transaction},
};

/// A route handler for deleting a category along with its transactions.
pub async fn delete_category_endpoint<S: Store>(
    State(state): State<AppState<S>>,
    Path(category_id): Path<CategoryId>,
) -> Result<Json<MessageResponse>, Error> {
    delete_category(&category_id, &state.store).await?;

    Ok(Json(MessageResponse::new("Category deleted successfully")))
}

/// What happened to the transactions of a deleted category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionCleanup {
    /// The category's transactions were deleted.
    Removed(usize),
    /// The transactions could not be deleted and still reference the
    /// deleted category.
    Orphaned,
}

/// Delete the transactions of the category with `id`, then the category.
///
/// The two deletes are not atomic. If the transactions cannot be deleted a
/// warning is logged and the category is deleted anyway, leaving orphaned
/// transactions behind.
///
/// # Errors
/// Returns [Error::CategoryNotFound] if there is no category with `id`, or a
/// storage error if the category could not be deleted.
pub async fn delete_category<S: Store>(
    id: &CategoryId,
    store: &S,
) -> Result<TransactionCleanup, Error> {
    let filter = Filter::eq(CATEGORY_ID_FIELD, id.as_str());

    let cleanup = match delete_records::<_, Transaction>(store, &filter).await {
        Ok(count) => TransactionCleanup::Removed(count),
        Err(error) => {
            tracing::warn!(
                "Could not delete the transactions for category {id}, \
                they will be orphaned: {error}"
            );
            TransactionCleanup::Orphaned
        }
    };

    delete_record::<_, BudgetCategory>(store, id)
        .await
        .map_err(|error| match error {
            Error::NotFound => Error::CategoryNotFound,
            error => {
                tracing::error!("Could not delete category {id}: {error}");
                error
            }
        })?;

    Ok(cleanup)
}

#[cfg(test)]
mod tests {
    use axum::{Router, routing::delete};
    use axum_test::TestServer;
    use serde_json::{Value, json};
    use time::macros::datetime;

    use crate::{
        AppState, Error,
        category::{
            BudgetCategory, CategoryForm, TransactionCleanup, delete_category,
            delete_category_endpoint,
        },
        endpoints::{self, format_endpoint},
        store::{
            Document, DocumentStore, Filter, Query, RecordId, Store, fetch_records,
            insert_record,
        },
        transaction::{Transaction, TransactionForm},
    };

    fn get_test_server(store: DocumentStore) -> TestServer {
        let app = Router::new()
            .route(endpoints::CATEGORY, delete(delete_category_endpoint))
            .with_state(AppState::new(store));

        TestServer::try_new(app).expect("Could not create test server.")
    }

    async fn create_test_category<S: Store>(store: &S, name: &str) -> BudgetCategory {
        insert_record(
            store,
            &BudgetCategory::new(CategoryForm {
                name: name.to_owned(),
                budget_amount: 100.0,
                color: "#10B981".to_owned(),
            }),
        )
        .await
        .expect("Could not create test category")
    }

    async fn create_test_transaction<S: Store>(store: &S, category: &BudgetCategory) {
        insert_record(
            store,
            &Transaction::new(TransactionForm {
                category_id: category.id.clone(),
                amount: 10.0,
                description: "test".to_owned(),
                date: datetime!(2024-01-15 00:00:00 UTC),
            }),
        )
        .await
        .expect("Could not create test transaction");
    }

    #[tokio::test]
    async fn deletes_category_and_its_transactions() {
        let store = DocumentStore::in_memory();
        let doomed = create_test_category(&store, "Doomed").await;
        let kept = create_test_category(&store, "Kept").await;
        create_test_transaction(&store, &doomed).await;
        create_test_transaction(&store, &doomed).await;
        create_test_transaction(&store, &kept).await;
        let server = get_test_server(store.clone());

        let response = server
            .delete(&format_endpoint(endpoints::CATEGORY, &doomed.id))
            .await;

        response.assert_status_ok();
        assert_eq!(
            response.json::<Value>(),
            json!({"message": "Category deleted successfully"})
        );
        let categories: Vec<BudgetCategory> =
            fetch_records(&store, &Query::all()).await.unwrap();
        assert_eq!(categories, vec![kept.clone()]);
        let transactions: Vec<Transaction> =
            fetch_records(&store, &Query::all()).await.unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].category_id, kept.id);
    }

    #[tokio::test]
    async fn missing_category_is_not_found() {
        let server = get_test_server(DocumentStore::in_memory());

        let response = server
            .delete(&format_endpoint(endpoints::CATEGORY, "nonexistent-id"))
            .await;

        response.assert_status_not_found();
        assert_eq!(
            response.json::<Value>(),
            json!({"detail": "Category not found"})
        );
    }

    #[tokio::test]
    async fn reports_number_of_transactions_removed() {
        let store = DocumentStore::in_memory();
        let category = create_test_category(&store, "Groceries").await;
        create_test_transaction(&store, &category).await;

        let got = delete_category(&category.id, &store).await;

        assert_eq!(got, Ok(TransactionCleanup::Removed(1)));
    }

    /// Wraps a [DocumentStore] but fails every bulk delete.
    #[derive(Debug, Clone)]
    struct FailingBulkDeleteStore(DocumentStore);

    impl Store for FailingBulkDeleteStore {
        async fn ensure_collections(&self) -> Result<(), Error> {
            self.0.ensure_collections().await
        }

        async fn insert(
            &self,
            collection: &'static str,
            document: Document,
        ) -> Result<Document, Error> {
            self.0.insert(collection, document).await
        }

        async fn fetch_all(
            &self,
            collection: &'static str,
            query: &Query,
        ) -> Result<Vec<Document>, Error> {
            self.0.fetch_all(collection, query).await
        }

        async fn update(
            &self,
            collection: &'static str,
            id: &RecordId,
            changes: Document,
        ) -> Result<Document, Error> {
            self.0.update(collection, id, changes).await
        }

        async fn delete(&self, collection: &'static str, id: &RecordId) -> Result<(), Error> {
            self.0.delete(collection, id).await
        }

        async fn delete_where(
            &self,
            _collection: &'static str,
            _filter: &Filter,
        ) -> Result<usize, Error> {
            Err(Error::Storage("connection reset".to_owned()))
        }

        async fn close(self) -> Result<(), Error> {
            self.0.close().await
        }
    }

    #[tokio::test]
    async fn failed_transaction_cleanup_still_deletes_category() {
        let store = FailingBulkDeleteStore(DocumentStore::in_memory());
        let category = create_test_category(&store, "Groceries").await;
        create_test_transaction(&store, &category).await;

        let got = delete_category(&category.id, &store).await;

        assert_eq!(got, Ok(TransactionCleanup::Orphaned));
        let categories: Vec<BudgetCategory> =
            fetch_records(&store, &Query::all()).await.unwrap();
        assert!(categories.is_empty());
        let transactions: Vec<Transaction> =
            fetch_records(&store, &Query::all()).await.unwrap();
        assert_eq!(transactions.len(), 1, "want the orphaned transaction kept");
    }

    #[tokio::test]
    async fn failed_transaction_cleanup_on_missing_category_is_not_found() {
        let store = FailingBulkDeleteStore(DocumentStore::in_memory());

        let got = delete_category(&RecordId::from("nonexistent-id"), &store).await;

        assert_eq!(got, Err(Error::CategoryNotFound));
    }
}
