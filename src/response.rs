//! JSON request extractor and the confirmation bodies shared by the endpoints.

use axum::extract::FromRequest;
use serde::{Deserialize, Serialize};

use crate::{Error, store::RecordId};

/// Extracts a JSON request body, answering with a JSON [Error] instead of
/// axum's plain text rejection when the body is missing fields or malformed.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct ApiJson<T>(pub T);

/// The response to creating a category or transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedResponse {
    /// The ID assigned to the new record.
    pub id: RecordId,
    /// A confirmation for the client.
    pub message: String,
}

/// The response to updating or deleting a category or transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    /// A confirmation for the client.
    pub message: String,
}

impl MessageResponse {
    /// Create a response carrying `message`.
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_owned(),
        }
    }
}
