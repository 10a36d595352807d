//! Storage for the domain records and the backends that implement it.
//!
//! Every backend implements [Store], which works on backend-neutral JSON
//! [Document]s grouped into named collections. Route handlers use the typed
//! functions in this module ([insert_record], [fetch_records], etc.) which
//! convert between [Record]s and documents, so they never need to know which
//! backend is active.

mod document;
mod rest;
mod sqlite;

pub use document::DocumentStore;
pub use rest::RestTableStore;
pub use sqlite::SQLiteStore;

#[cfg(test)]
pub(crate) use rest::fake_table_api;

use std::{fmt::Display, future::Future};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{Error, timestamp};

/// A record as it is stored: a JSON object keyed by field name.
pub type Document = Map<String, Value>;

/// The name of the field that holds the ID of every document.
pub const ID_FIELD: &str = "id";

/// The server generated ID of a category or transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Create a new, random ID.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Selects documents whose `field` is equal to `value`.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// The name of the field to compare.
    pub field: &'static str,
    /// The value the field must have.
    pub value: String,
}

impl Filter {
    /// Create a filter for documents where `field` equals `value`.
    pub fn eq(field: &'static str, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }
}

/// The order to sort documents in a [Query].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Sort in order of increasing value.
    Ascending,
    /// Sort in order of decreasing value.
    Descending,
}

/// Sort documents by the value of `field`.
#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    /// The name of the field to sort by.
    pub field: &'static str,
    /// The direction to sort in.
    pub order: SortOrder,
}

/// Defines how documents should be fetched from [Store::fetch_all].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Query {
    /// Only include documents that match the filter.
    pub filter: Option<Filter>,
    /// Sort the documents. None returns documents in the order they were
    /// inserted.
    pub sort: Option<Sort>,
}

impl Query {
    /// A query that selects every document in insertion order.
    pub fn all() -> Self {
        Self::default()
    }

    /// Only include documents that match `filter`.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Sort the documents by `field` in `order`.
    pub fn sort_by(mut self, field: &'static str, order: SortOrder) -> Self {
        self.sort = Some(Sort { field, order });
        self
    }
}

/// A datastore that holds collections of documents.
///
/// Implementations are cheap to clone and share one underlying connection,
/// client or in-memory database between clones.
pub trait Store: Clone + Send + Sync + 'static {
    /// Prepare the collections used by the app. Called once at startup.
    fn ensure_collections(&self) -> impl Future<Output = Result<(), Error>> + Send;

    /// Add `document` to `collection` and return the document as stored.
    fn insert(
        &self,
        collection: &'static str,
        document: Document,
    ) -> impl Future<Output = Result<Document, Error>> + Send;

    /// Get the documents in `collection` selected by `query`.
    ///
    /// Returns an empty vector when no documents match.
    fn fetch_all(
        &self,
        collection: &'static str,
        query: &Query,
    ) -> impl Future<Output = Result<Vec<Document>, Error>> + Send;

    /// Replace the fields in `changes` on the document with `id` and return
    /// the updated document.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if no document has the ID `id`.
    fn update(
        &self,
        collection: &'static str,
        id: &RecordId,
        changes: Document,
    ) -> impl Future<Output = Result<Document, Error>> + Send;

    /// Remove the document with `id`.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if no document has the ID `id`.
    fn delete(
        &self,
        collection: &'static str,
        id: &RecordId,
    ) -> impl Future<Output = Result<(), Error>> + Send;

    /// Remove every document matching `filter` and return how many were
    /// removed.
    fn delete_where(
        &self,
        collection: &'static str,
        filter: &Filter,
    ) -> impl Future<Output = Result<usize, Error>> + Send;

    /// Release the store. Called once after the server has stopped.
    fn close(self) -> impl Future<Output = Result<(), Error>> + Send;
}

/// A domain type that is kept in a [Store].
pub trait Record: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The collection (table) the record is stored in.
    const COLLECTION: &'static str;

    /// The field that [update_record] sets to the current time, if any.
    const UPDATED_AT_FIELD: Option<&'static str> = None;

    /// The fields that may be changed by [update_record]. Fields that
    /// serialize to nothing are left untouched.
    type Changes: Serialize + Send + Sync;
}

/// Convert any serializable value into a [Document].
pub(crate) fn to_document<T: Serialize>(value: &T) -> Result<Document, Error> {
    match serde_json::to_value(value)? {
        Value::Object(document) => Ok(document),
        other => Err(Error::Serialization(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

/// Convert a stored [Document] back into a record.
pub(crate) fn from_document<R: DeserializeOwned>(document: Document) -> Result<R, Error> {
    serde_json::from_value(Value::Object(document)).map_err(Error::from)
}

/// The ID of a stored document.
pub(crate) fn document_id(document: &Document) -> Option<&str> {
    document.get(ID_FIELD).and_then(Value::as_str)
}

/// Insert `record` into its collection and return the stored record.
pub async fn insert_record<S: Store, R: Record>(store: &S, record: &R) -> Result<R, Error> {
    let document = to_document(record)?;
    let stored = store.insert(R::COLLECTION, document).await?;

    from_document(stored)
}

/// Fetch the records selected by `query`.
pub async fn fetch_records<S: Store, R: Record>(store: &S, query: &Query) -> Result<Vec<R>, Error> {
    store
        .fetch_all(R::COLLECTION, query)
        .await?
        .into_iter()
        .map(from_document)
        .collect()
}

/// Apply `changes` to the record with `id`, refreshing its
/// [Record::UPDATED_AT_FIELD] if it has one.
///
/// # Errors
/// Returns [Error::NotFound] if there is no record with the ID `id`.
pub async fn update_record<S: Store, R: Record>(
    store: &S,
    id: &RecordId,
    changes: &R::Changes,
) -> Result<R, Error> {
    let mut changes = to_document(changes)?;

    if let Some(field) = R::UPDATED_AT_FIELD {
        let now = timestamp::format(&timestamp::now())
            .map_err(|error| Error::Serialization(error.to_string()))?;
        changes.insert(field.to_owned(), Value::String(now));
    }

    let updated = store.update(R::COLLECTION, id, changes).await?;

    from_document(updated)
}

/// Delete the record with `id`.
///
/// # Errors
/// Returns [Error::NotFound] if there is no record with the ID `id`.
pub async fn delete_record<S: Store, R: Record>(store: &S, id: &RecordId) -> Result<(), Error> {
    store.delete(R::COLLECTION, id).await
}

/// Delete every record matching `filter` and return how many were deleted.
pub async fn delete_records<S: Store, R: Record>(
    store: &S,
    filter: &Filter,
) -> Result<usize, Error> {
    store.delete_where(R::COLLECTION, filter).await
}
