//! Transactions: dated amounts of money that count towards a category.

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod list_endpoint;

pub use core::{
    CATEGORY_ID_FIELD, DATE_FIELD, Transaction, TransactionForm, TransactionId,
    create_transaction_table,
};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::{edit_transaction_endpoint, update_transaction};
pub use list_endpoint::{TransactionFilter, list_transactions, list_transactions_endpoint};
