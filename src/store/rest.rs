//! Implements a store backed by a PostgREST style table API, e.g. Supabase.
//!
//! Each collection is a table reached at `{base_url}/rest/v1/{collection}`.
//! Filters use the `field=eq.value` syntax, ordering uses
//! `order=field.asc|desc`, and write requests ask for the affected rows with
//! `Prefer: return=representation` so that an empty response means no row
//! matched.

use reqwest::{
    Client, RequestBuilder, Response,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};

use crate::{
    Error,
    category::BudgetCategory,
    store::{Document, Filter, ID_FIELD, Query, Record, RecordId, SortOrder, Store},
    transaction::Transaction,
};

const PREFER: &str = "Prefer";
const RETURN_REPRESENTATION: &str = "return=representation";

/// Stores documents as rows of tables behind a PostgREST style HTTP API.
#[derive(Debug, Clone)]
pub struct RestTableStore {
    client: Client,
    base_url: String,
}

impl RestTableStore {
    /// Create a store for the API at `base_url` that authenticates with the
    /// service key `api_key`.
    ///
    /// # Errors
    /// Returns an [Error::Config] if `api_key` cannot be sent as a header, or
    /// an [Error::Storage] if the HTTP client cannot be created.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        headers.insert("apikey", header_value(api_key)?);
        headers.insert(AUTHORIZATION, header_value(&format!("Bearer {api_key}"))?);

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    fn table_url(&self, collection: &str) -> String {
        format!("{}/rest/v1/{collection}", self.base_url)
    }

    async fn probe(&self, collection: &str) -> Result<(), Error> {
        let request = self
            .client
            .get(self.table_url(collection))
            .query(&[("select", ID_FIELD), ("limit", "1")]);

        send(request).await.map(|_| ())
    }
}

fn header_value(value: &str) -> Result<HeaderValue, Error> {
    HeaderValue::from_str(value)
        .map_err(|_| Error::Config("the datastore key contains invalid characters".to_owned()))
}

fn eq(value: &str) -> String {
    format!("eq.{value}")
}

/// Send `request` and parse the rows in the response body.
///
/// # Errors
/// Returns an [Error::Storage] if the request fails, the API responds with
/// an error status, or the body is not a list of JSON objects.
async fn send(request: RequestBuilder) -> Result<Vec<Document>, Error> {
    let response = request.send().await?;

    read_rows(response).await
}

async fn read_rows(response: Response) -> Result<Vec<Document>, Error> {
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::error!("the datastore responded with {status}: {body}");
        return Err(Error::Storage(format!(
            "datastore responded with {status}: {body}"
        )));
    }

    let body = response.text().await?;
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    serde_json::from_str(&body)
        .map_err(|error| Error::Storage(format!("unexpected datastore response: {error}")))
}

impl Store for RestTableStore {
    /// Check that the tables can be reached.
    ///
    /// The tables are not created by the app, so a missing table is logged
    /// and startup continues.
    async fn ensure_collections(&self) -> Result<(), Error> {
        for collection in [BudgetCategory::COLLECTION, Transaction::COLLECTION] {
            match self.probe(collection).await {
                Ok(()) => tracing::info!("table {collection} is available"),
                Err(error) => tracing::warn!(
                    "table {collection} might not exist, create it in the datastore before use: {error}"
                ),
            }
        }

        Ok(())
    }

    async fn insert(
        &self,
        collection: &'static str,
        document: Document,
    ) -> Result<Document, Error> {
        let request = self
            .client
            .post(self.table_url(collection))
            .header(PREFER, RETURN_REPRESENTATION)
            .json(&document);

        // Some deployments do not echo the row back, in which case the
        // document that was sent is what was stored.
        Ok(send(request).await?.into_iter().next().unwrap_or(document))
    }

    async fn fetch_all(
        &self,
        collection: &'static str,
        query: &Query,
    ) -> Result<Vec<Document>, Error> {
        let mut parameters = vec![("select".to_owned(), "*".to_owned())];

        if let Some(filter) = &query.filter {
            parameters.push((filter.field.to_owned(), eq(&filter.value)));
        }

        if let Some(sort) = &query.sort {
            let direction = match sort.order {
                SortOrder::Ascending => "asc",
                SortOrder::Descending => "desc",
            };
            parameters.push(("order".to_owned(), format!("{}.{direction}", sort.field)));
        }

        let request = self
            .client
            .get(self.table_url(collection))
            .query(&parameters);

        send(request).await
    }

    async fn update(
        &self,
        collection: &'static str,
        id: &RecordId,
        changes: Document,
    ) -> Result<Document, Error> {
        let request = self
            .client
            .patch(self.table_url(collection))
            .query(&[(ID_FIELD, eq(id.as_str()))])
            .header(PREFER, RETURN_REPRESENTATION)
            .json(&changes);

        send(request).await?.into_iter().next().ok_or(Error::NotFound)
    }

    async fn delete(&self, collection: &'static str, id: &RecordId) -> Result<(), Error> {
        let request = self
            .client
            .delete(self.table_url(collection))
            .query(&[(ID_FIELD, eq(id.as_str()))])
            .header(PREFER, RETURN_REPRESENTATION);

        if send(request).await?.is_empty() {
            Err(Error::NotFound)
        } else {
            Ok(())
        }
    }

    async fn delete_where(
        &self,
        collection: &'static str,
        filter: &Filter,
    ) -> Result<usize, Error> {
        let request = self
            .client
            .delete(self.table_url(collection))
            .query(&[(filter.field, eq(&filter.value))])
            .header(PREFER, RETURN_REPRESENTATION);

        Ok(send(request).await?.len())
    }

    async fn close(self) -> Result<(), Error> {
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fake_table_api {
    //! An in-memory table API that understands the requests sent by
    //! [RestTableStore], so the store can be tested end to end.

    use std::{
        cmp::Ordering,
        collections::BTreeMap,
        sync::{Arc, Mutex},
    };

    use axum::{
        Json, Router,
        extract::{Path, Query, State},
        http::StatusCode,
        routing::get,
    };
    use serde_json::Value;
    use tokio::net::TcpListener;

    use crate::store::Document;

    use super::RestTableStore;

    type Tables = Arc<Mutex<BTreeMap<String, Vec<Document>>>>;

    type Parameters = Query<Vec<(String, String)>>;

    /// The `field=eq.value` filters in `parameters`.
    fn filters(parameters: &[(String, String)]) -> Vec<(&str, &str)> {
        parameters
            .iter()
            .filter(|(name, _)| !matches!(name.as_str(), "select" | "order" | "limit"))
            .filter_map(|(name, value)| Some((name.as_str(), value.strip_prefix("eq.")?)))
            .collect()
    }

    fn is_match(row: &Document, filters: &[(&str, &str)]) -> bool {
        filters
            .iter()
            .all(|(field, value)| row.get(*field).and_then(Value::as_str) == Some(*value))
    }

    fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
        match (a, b) {
            (Some(Value::Number(a)), Some(Value::Number(b))) => a
                .as_f64()
                .partial_cmp(&b.as_f64())
                .unwrap_or(Ordering::Equal),
            _ => a.and_then(Value::as_str).cmp(&b.and_then(Value::as_str)),
        }
    }

    fn parameter<'a>(parameters: &'a [(String, String)], name: &str) -> Option<&'a str> {
        parameters
            .iter()
            .find(|(parameter, _)| parameter == name)
            .map(|(_, value)| value.as_str())
    }

    async fn select(
        State(tables): State<Tables>,
        Path(table): Path<String>,
        Query(parameters): Parameters,
    ) -> Json<Vec<Document>> {
        let tables = tables.lock().unwrap();
        let filters = filters(&parameters);

        let mut rows: Vec<Document> = tables
            .get(&table)
            .into_iter()
            .flatten()
            .filter(|row| is_match(row, &filters))
            .cloned()
            .collect();

        if let Some((field, direction)) =
            parameter(&parameters, "order").and_then(|order| order.rsplit_once('.'))
        {
            rows.sort_by(|a, b| {
                let ordering = compare(a.get(field), b.get(field));
                if direction == "desc" {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }

        if let Some(limit) = parameter(&parameters, "limit").and_then(|limit| limit.parse().ok()) {
            rows.truncate(limit);
        }

        Json(rows)
    }

    async fn insert(
        State(tables): State<Tables>,
        Path(table): Path<String>,
        Json(row): Json<Document>,
    ) -> (StatusCode, Json<Vec<Document>>) {
        tables
            .lock()
            .unwrap()
            .entry(table)
            .or_default()
            .push(row.clone());

        (StatusCode::CREATED, Json(vec![row]))
    }

    async fn update(
        State(tables): State<Tables>,
        Path(table): Path<String>,
        Query(parameters): Parameters,
        Json(changes): Json<Document>,
    ) -> Json<Vec<Document>> {
        let mut tables = tables.lock().unwrap();
        let filters = filters(&parameters);

        let updated: Vec<Document> = tables
            .get_mut(&table)
            .into_iter()
            .flatten()
            .filter(|row| is_match(row, &filters))
            .map(|row| {
                row.extend(changes.clone());
                row.clone()
            })
            .collect();

        Json(updated)
    }

    async fn remove(
        State(tables): State<Tables>,
        Path(table): Path<String>,
        Query(parameters): Parameters,
    ) -> Json<Vec<Document>> {
        let mut tables = tables.lock().unwrap();
        let filters = filters(&parameters);

        let Some(rows) = tables.get_mut(&table) else {
            return Json(Vec::new());
        };
        let (removed, kept): (Vec<Document>, Vec<Document>) =
            rows.drain(..).partition(|row| is_match(row, &filters));
        *rows = kept;

        Json(removed)
    }

    /// Serve an empty table API on a free local port and return a store
    /// that talks to it.
    pub(crate) async fn serve_table_api() -> RestTableStore {
        let app = Router::new()
            .route(
                "/rest/v1/{table}",
                get(select).post(insert).patch(update).delete(remove),
            )
            .with_state(Tables::default());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("could not bind fake table API");
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });

        RestTableStore::new(&format!("http://{address}"), "service-key")
            .expect("could not create store")
    }
}
