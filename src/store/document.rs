//! Implements an in-process document store.
//!
//! Documents are kept in memory, grouped by collection in insertion order.
//! When the store is opened with a snapshot path, every change is written to
//! that file as JSON and the file is read back the next time the store is
//! opened.

use std::{
    cmp::Ordering,
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
};

use serde_json::Value;

use crate::{
    Error,
    store::{Document, Filter, Query, RecordId, SortOrder, Store, document_id},
};

type Collections = BTreeMap<String, Vec<Document>>;

/// Stores documents in memory, optionally backed by a JSON snapshot file.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    collections: Arc<Mutex<Collections>>,
    snapshot_path: Option<PathBuf>,
}

impl DocumentStore {
    /// Create an empty store that is never written to disk.
    pub fn in_memory() -> Self {
        Self {
            collections: Arc::default(),
            snapshot_path: None,
        }
    }

    /// Open a store that is saved to `path`, loading any documents already
    /// saved there. `:memory:` opens a store that is never written to disk.
    ///
    /// A new, empty snapshot is written straight away when `path` does not
    /// exist yet, so an unwritable location is caught here rather than on
    /// the first change.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or is not a
    /// valid snapshot, or if a new snapshot cannot be written to `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();

        if path == Path::new(":memory:") {
            return Ok(Self::in_memory());
        }

        let store = Self {
            collections: Arc::default(),
            snapshot_path: Some(path.to_owned()),
        };

        if path.exists() {
            let contents = fs::read(path)?;
            let collections: Collections = serde_json::from_slice(&contents)?;
            *store.lock()? = collections;
        } else {
            store.save(&Collections::new()).inspect_err(|error| {
                tracing::error!("Could not create snapshot at {}: {error}", path.display())
            })?;
        }

        Ok(store)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Collections>, Error> {
        self.collections.lock().map_err(|error| {
            tracing::error!("could not acquire document store lock: {error}");
            Error::DatabaseLockError
        })
    }

    /// Apply `change` to a copy of the collections and keep the copy only
    /// once it has been saved. A failed change or save leaves the store as
    /// it was.
    fn modify<T>(
        &self,
        change: impl FnOnce(&mut Collections) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let mut collections = self.lock()?;

        let mut staged = collections.clone();
        let output = change(&mut staged)?;
        self.save(&staged)?;
        *collections = staged;

        Ok(output)
    }

    /// Write `collections` to the snapshot file, if there is one.
    ///
    /// The snapshot is written to a sibling file first and then renamed
    /// over the old one, so the file on disk is always a complete snapshot.
    fn save(&self, collections: &Collections) -> Result<(), Error> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };

        let mut staging_path = path.clone().into_os_string();
        staging_path.push(".tmp");
        let staging_path = PathBuf::from(staging_path);

        let contents = serde_json::to_vec_pretty(collections)?;
        fs::write(&staging_path, contents)?;
        fs::rename(&staging_path, path)?;

        Ok(())
    }
}

fn matches(document: &Document, filter: &Filter) -> bool {
    document.get(filter.field).and_then(Value::as_str) == Some(filter.value.as_str())
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
        // Missing and null values sort first.
        (None | Some(Value::Null), Some(_)) => Ordering::Less,
        (Some(_), None | Some(Value::Null)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

impl Store for DocumentStore {
    async fn ensure_collections(&self) -> Result<(), Error> {
        Ok(())
    }

    async fn insert(
        &self,
        collection: &'static str,
        document: Document,
    ) -> Result<Document, Error> {
        self.modify(|collections| {
            collections
                .entry(collection.to_owned())
                .or_default()
                .push(document.clone());

            Ok(document)
        })
    }

    async fn fetch_all(
        &self,
        collection: &'static str,
        query: &Query,
    ) -> Result<Vec<Document>, Error> {
        let collections = self.lock()?;

        let mut documents: Vec<Document> = collections
            .get(collection)
            .map(|documents| {
                documents
                    .iter()
                    .filter(|document| {
                        query
                            .filter
                            .as_ref()
                            .is_none_or(|filter| matches(document, filter))
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(sort) = &query.sort {
            // `sort_by` is stable, so ties keep their insertion order.
            documents.sort_by(|a, b| {
                let ordering = compare_values(a.get(sort.field), b.get(sort.field));
                match sort.order {
                    SortOrder::Ascending => ordering,
                    SortOrder::Descending => ordering.reverse(),
                }
            });
        }

        Ok(documents)
    }

    async fn update(
        &self,
        collection: &'static str,
        id: &RecordId,
        changes: Document,
    ) -> Result<Document, Error> {
        self.modify(|collections| {
            let document = collections
                .get_mut(collection)
                .and_then(|documents| {
                    documents
                        .iter_mut()
                        .find(|document| document_id(document) == Some(id.as_str()))
                })
                .ok_or(Error::NotFound)?;
            document.extend(changes);

            Ok(document.clone())
        })
    }

    async fn delete(&self, collection: &'static str, id: &RecordId) -> Result<(), Error> {
        self.modify(|collections| {
            let documents = collections.get_mut(collection).ok_or(Error::NotFound)?;
            let position = documents
                .iter()
                .position(|document| document_id(document) == Some(id.as_str()))
                .ok_or(Error::NotFound)?;
            documents.remove(position);

            Ok(())
        })
    }

    async fn delete_where(
        &self,
        collection: &'static str,
        filter: &Filter,
    ) -> Result<usize, Error> {
        let has_matches = self.lock()?.get(collection).is_some_and(|documents| {
            documents.iter().any(|document| matches(document, filter))
        });
        if !has_matches {
            return Ok(0);
        }

        self.modify(|collections| {
            let Some(documents) = collections.get_mut(collection) else {
                return Ok(0);
            };
            let count_before = documents.len();
            documents.retain(|document| !matches(document, filter));

            Ok(count_before - documents.len())
        })
    }

    async fn close(self) -> Result<(), Error> {
        let collections = self.lock()?;

        self.save(&collections)
    }
}
