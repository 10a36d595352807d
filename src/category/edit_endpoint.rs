//! Defines the endpoint for updating a category.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    AppState, Error,
    category::{BudgetCategory, CategoryChanges, CategoryId},
    response::{ApiJson, MessageResponse},
    store::{Store, update_record},
};

/// A route handler for changing some or all of a category's fields.
pub async fn edit_category_endpoint<S: Store>(
    State(state): State<AppState<S>>,
    Path(category_id): Path<CategoryId>,
    ApiJson(changes): ApiJson<CategoryChanges>,
) -> Result<Json<MessageResponse>, Error> {
    update_category(&category_id, &changes, &state.store).await?;

    Ok(Json(MessageResponse::new("Category updated successfully")))
}

/// Apply `changes` to the category with `id`, refreshing its `updated_at`.
///
/// # Errors
/// Returns [Error::CategoryNotFound] if there is no category with `id`, or
/// an [Error::Validation] if `changes` breaks the category rules.
pub async fn update_category<S: Store>(
    id: &CategoryId,
    changes: &CategoryChanges,
    store: &S,
) -> Result<BudgetCategory, Error> {
    changes.validate()?;

    update_record(store, id, changes)
        .await
        .map_err(|error| match error {
            Error::NotFound => Error::CategoryNotFound,
            error => {
                tracing::error!("Could not update category {id}: {error}");
                error
            }
        })
}
