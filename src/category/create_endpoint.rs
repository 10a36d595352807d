//! Defines the endpoint for creating a new category.

use axum::{Json, extract::State};

use crate::{
    AppState, Error,
    category::{BudgetCategory, CategoryForm},
    response::{ApiJson, CreatedResponse},
    store::{Store, insert_record},
};

/// A route handler for creating a new category, responds with the new
/// category's ID.
pub async fn create_category_endpoint<S: Store>(
    State(state): State<AppState<S>>,
    ApiJson(form): ApiJson<CategoryForm>,
) -> Result<Json<CreatedResponse>, Error> {
    let category = create_category(form, &state.store).await?;

    Ok(Json(CreatedResponse {
        id: category.id,
        message: "Category created successfully".to_owned(),
    }))
}

/// Validate `form` and store it as a new category.
///
/// # Errors
/// Returns an [Error::Validation] if the name is empty or the budget is
/// negative, or a storage error if the category could not be saved.
pub async fn create_category<S: Store>(
    form: CategoryForm,
    store: &S,
) -> Result<BudgetCategory, Error> {
    form.validate()?;

    insert_record(store, &BudgetCategory::new(form))
        .await
        .inspect_err(|error| tracing::error!("Could not create category: {error}"))
}
