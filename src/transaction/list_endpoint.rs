//! Defines the endpoint for listing transactions.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::{
    AppState, Error,
    store::{self, Filter, SortOrder, Store, fetch_records},
    transaction::{CATEGORY_ID_FIELD, DATE_FIELD, Transaction},
};

/// The query parameters for listing transactions.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionFilter {
    /// Only list the transactions of this category. An empty string lists
    /// every transaction.
    pub category_id: Option<String>,
}

/// A route handler for listing transactions, newest first.
pub async fn list_transactions_endpoint<S: Store>(
    State(state): State<AppState<S>>,
    Query(filter): Query<TransactionFilter>,
) -> Result<Json<Vec<Transaction>>, Error> {
    list_transactions(&filter, &state.store).await.map(Json)
}

/// Get the transactions selected by `filter`, sorted by date with the most
/// recent first.
pub async fn list_transactions<S: Store>(
    filter: &TransactionFilter,
    store: &S,
) -> Result<Vec<Transaction>, Error> {
    let mut query = store::Query::all().sort_by(DATE_FIELD, SortOrder::Descending);

    if let Some(category_id) = filter.category_id.as_deref().filter(|id| !id.is_empty()) {
        query = query.filter(Filter::eq(CATEGORY_ID_FIELD, category_id));
    }

    fetch_records(store, &query).await
}

#[cfg(test)]
mod tests {
    use axum::{Router, routing::get};
    use axum_test::TestServer;
    use time::{OffsetDateTime, macros::datetime};

    use crate::{
        AppState,
        category::CategoryId,
        endpoints,
        store::{DocumentStore, insert_record},
        transaction::{Transaction, TransactionForm, list_transactions_endpoint},
    };

    fn get_test_server(store: DocumentStore) -> TestServer {
        let app = Router::new()
            .route(endpoints::TRANSACTIONS, get(list_transactions_endpoint))
            .with_state(AppState::new(store));

        TestServer::try_new(app).expect("Could not create test server.")
    }

    async fn create_test_transaction(
        store: &DocumentStore,
        category_id: &str,
        date: OffsetDateTime,
    ) -> Transaction {
        insert_record(
            store,
            &Transaction::new(TransactionForm {
                category_id: CategoryId::from(category_id),
                amount: 12.5,
                description: "test".to_owned(),
                date,
            }),
        )
        .await
        .expect("Could not create test transaction")
    }

    #[tokio::test]
    async fn lists_transactions_newest_first() {
        let store = DocumentStore::in_memory();
        let oldest = create_test_transaction(&store, "c1", datetime!(2024-01-01 00:00 UTC)).await;
        let newest = create_test_transaction(&store, "c2", datetime!(2024-03-01 00:00 UTC)).await;
        let middle = create_test_transaction(&store, "c1", datetime!(2024-02-01 00:00 UTC)).await;
        let server = get_test_server(store);

        let response = server.get(endpoints::TRANSACTIONS).await;

        response.assert_status_ok();
        assert_eq!(
            response.json::<Vec<Transaction>>(),
            vec![newest, middle, oldest]
        );
    }

    #[tokio::test]
    async fn filters_by_category() {
        let store = DocumentStore::in_memory();
        let first = create_test_transaction(&store, "c1", datetime!(2024-01-01 00:00 UTC)).await;
        create_test_transaction(&store, "c2", datetime!(2024-03-01 00:00 UTC)).await;
        let second = create_test_transaction(&store, "c1", datetime!(2024-02-01 00:00 UTC)).await;
        let server = get_test_server(store);

        let response = server
            .get(endpoints::TRANSACTIONS)
            .add_query_param("category_id", "c1")
            .await;

        assert_eq!(response.json::<Vec<Transaction>>(), vec![second, first]);
    }

    #[tokio::test]
    async fn empty_category_filter_lists_everything() {
        let store = DocumentStore::in_memory();
        create_test_transaction(&store, "c1", datetime!(2024-01-01 00:00 UTC)).await;
        create_test_transaction(&store, "c2", datetime!(2024-03-01 00:00 UTC)).await;
        let server = get_test_server(store);

        let response = server
            .get(endpoints::TRANSACTIONS)
            .add_query_param("category_id", "")
            .await;

        assert_eq!(response.json::<Vec<Transaction>>().len(), 2);
    }

    #[tokio::test]
    async fn unknown_category_lists_nothing() {
        let store = DocumentStore::in_memory();
        create_test_transaction(&store, "c1", datetime!(2024-01-01 00:00 UTC)).await;
        let server = get_test_server(store);

        let response = server
            .get(endpoints::TRANSACTIONS)
            .add_query_param("category_id", "nonexistent-id")
            .await;

        response.assert_status_ok();
        assert!(response.json::<Vec<Transaction>>().is_empty());
    }
}
