use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    store::{Record, RecordId},
    timestamp,
};

/// The ID of a [BudgetCategory].
pub type CategoryId = RecordId;

/// The field categories are listed by.
pub const CREATED_AT_FIELD: &str = "created_at";

/// A named budget bucket with an allocated amount, e.g., 'Groceries'.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetCategory {
    /// The id for the category.
    pub id: CategoryId,
    /// The display name, never empty.
    pub name: String,
    /// The amount allocated to the category, never negative.
    pub budget_amount: f64,
    /// The color used to display the category, by convention a hex code.
    pub color: String,
    /// When the category was created.
    #[serde(with = "timestamp")]
    pub created_at: OffsetDateTime,
    /// When the category was last changed.
    #[serde(with = "timestamp")]
    pub updated_at: OffsetDateTime,
}

impl BudgetCategory {
    /// Create a category with a new ID from a validated `form`.
    pub fn new(form: CategoryForm) -> Self {
        let now = timestamp::now();

        Self {
            id: CategoryId::generate(),
            name: form.name,
            budget_amount: form.budget_amount,
            color: form.color,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Record for BudgetCategory {
    const COLLECTION: &'static str = "budget_categories";
    const UPDATED_AT_FIELD: Option<&'static str> = Some("updated_at");

    type Changes = CategoryChanges;
}

/// The fields needed to create a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryForm {
    /// The display name for the category.
    pub name: String,
    /// The amount to allocate to the category.
    pub budget_amount: f64,
    /// The color to display the category with.
    pub color: String,
}

impl CategoryForm {
    /// Check the name is not empty and the budget is not negative.
    ///
    /// # Errors
    /// Returns an [Error::Validation] describing the first invalid field.
    pub fn validate(&self) -> Result<(), Error> {
        validate_name(&self.name)?;
        validate_budget_amount(self.budget_amount)
    }
}

/// The fields of a category to change. Missing fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryChanges {
    /// The new display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The new amount allocated to the category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_amount: Option<f64>,
    /// The new display color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl CategoryChanges {
    /// Check the given fields follow the same rules as [CategoryForm::validate].
    ///
    /// # Errors
    /// Returns an [Error::Validation] describing the first invalid field.
    pub fn validate(&self) -> Result<(), Error> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }

        if let Some(budget_amount) = self.budget_amount {
            validate_budget_amount(budget_amount)?;
        }

        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), Error> {
    if name.trim().is_empty() {
        Err(Error::Validation("category name cannot be empty".to_owned()))
    } else {
        Ok(())
    }
}

fn validate_budget_amount(budget_amount: f64) -> Result<(), Error> {
    if budget_amount < 0.0 {
        Err(Error::Validation(format!(
            "budget amount cannot be negative, got {budget_amount}"
        )))
    } else {
        Ok(())
    }
}

/// Create the table for [BudgetCategory] if it does not exist yet.
///
/// # Errors
/// Returns an error if the SQL query fails.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS budget_categories (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            budget_amount REAL NOT NULL,
            color TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}
