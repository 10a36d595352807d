//! Budget categories: the named buckets that money is allocated to.

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod list_endpoint;

pub use core::{
    BudgetCategory, CREATED_AT_FIELD, CategoryChanges, CategoryForm, CategoryId,
    create_category_table,
};
pub use create_endpoint::{create_category, create_category_endpoint};
pub use delete_endpoint::{TransactionCleanup, delete_category, delete_category_endpoint};
pub use edit_endpoint::{edit_category_endpoint, update_category};
pub use list_endpoint::{list_categories, list_categories_endpoint};
