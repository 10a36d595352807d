//! Application router configuration.

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::{
    AppState,
    category::{
        create_category_endpoint, delete_category_endpoint, edit_category_endpoint,
        list_categories_endpoint,
    },
    dashboard::dashboard_endpoint,
    endpoints,
    error::ErrorBody,
    store::Store,
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, edit_transaction_endpoint,
        list_transactions_endpoint,
    },
};

/// Return a router with all the app's routes.
///
/// Browsers on any origin may call the API.
pub fn build_router<S: Store>(state: AppState<S>) -> Router {
    Router::new()
        .route(endpoints::ROOT, get(get_health_check))
        .route(
            endpoints::CATEGORIES,
            get(list_categories_endpoint::<S>).post(create_category_endpoint::<S>),
        )
        .route(
            endpoints::CATEGORY,
            put(edit_category_endpoint::<S>).delete(delete_category_endpoint::<S>),
        )
        .route(
            endpoints::TRANSACTIONS,
            get(list_transactions_endpoint::<S>).post(create_transaction_endpoint::<S>),
        )
        .route(
            endpoints::TRANSACTION,
            put(edit_transaction_endpoint::<S>).delete(delete_transaction_endpoint::<S>),
        )
        .route(endpoints::DASHBOARD, get(dashboard_endpoint::<S>))
        .fallback(get_404_not_found)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// The response to the health check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheck {
    /// Always "healthy" while the server is answering requests.
    pub status: String,
    /// The name of the service.
    pub service: String,
}

async fn get_health_check() -> Json<HealthCheck> {
    Json(HealthCheck {
        status: "healthy".to_owned(),
        service: "Budget Bubbles API".to_owned(),
    })
}

async fn get_404_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            detail: "Not Found".to_owned(),
        }),
    )
        .into_response()
}
