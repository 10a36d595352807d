//! Implements a struct that holds the state of the REST server.

use crate::store::Store;

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState<S: Store> {
    /// The datastore for categories and transactions.
    pub store: S,
}

impl<S: Store> AppState<S> {
    /// Create a new [AppState] backed by `store`.
    ///
    /// The store should already have had its collections prepared with
    /// [Store::ensure_collections].
    pub fn new(store: S) -> Self {
        Self { store }
    }
}
