use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    category::CategoryId,
    store::{Record, RecordId},
    timestamp,
};

/// The ID of a [Transaction].
pub type TransactionId = RecordId;

/// The field that links a transaction to its category.
pub const CATEGORY_ID_FIELD: &str = "category_id";
/// The field transactions are listed by, newest first.
pub const DATE_FIELD: &str = "date";

/// A dated amount of money attributed to a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The id for the transaction.
    pub id: TransactionId,
    /// The category the amount counts towards.
    ///
    /// This is not checked against the stored categories.
    pub category_id: CategoryId,
    /// The amount of money, positive for spending. Negative amounts are
    /// allowed and act as refunds or adjustments.
    pub amount: f64,
    /// A free text note, e.g., "Weekly shopping".
    pub description: String,
    /// When the transaction took place.
    #[serde(with = "timestamp")]
    pub date: OffsetDateTime,
    /// When the transaction was recorded.
    #[serde(with = "timestamp")]
    pub created_at: OffsetDateTime,
}

impl Transaction {
    /// Create a transaction with a new ID from `form`.
    pub fn new(form: TransactionForm) -> Self {
        Self {
            id: TransactionId::generate(),
            category_id: form.category_id,
            amount: form.amount,
            description: form.description,
            date: form.date,
            created_at: timestamp::now(),
        }
    }
}

impl Record for Transaction {
    const COLLECTION: &'static str = "transactions";

    type Changes = TransactionForm;
}

/// The fields needed to create a transaction, also used to replace all the
/// editable fields of an existing transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionForm {
    /// The category the amount counts towards.
    pub category_id: CategoryId,
    /// The amount of money spent, or refunded if negative.
    pub amount: f64,
    /// A free text note.
    pub description: String,
    /// When the transaction took place. Dates without an offset are taken
    /// to be UTC.
    #[serde(with = "timestamp")]
    pub date: OffsetDateTime,
}

/// Create the table for [Transaction] if it does not exist yet.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS transactions (
            id TEXT PRIMARY KEY,
            category_id TEXT NOT NULL,
            amount REAL NOT NULL,
            description TEXT NOT NULL,
            date TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transactions_category_id ON transactions(category_id)",
        (),
    )?;

    Ok(())
}
