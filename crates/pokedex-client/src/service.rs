//! The query-service contract as the client consumes it.
//!
//! [`HttpQueryService`] talks to `pokedex serve`; [`LocalQueryService`]
//! answers from an in-process catalog (offline browsing and tests).

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use pokedex_catalog::{Catalog, Record};
use rand::thread_rng;
use reqwest::StatusCode;
use url::Url;

use crate::error::ClientError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub trait QueryService {
    /// Every record, ascending id.
    fn list_all(&self) -> Result<Vec<Record>, ClientError>;

    /// Name substring or exact id match. No matches is `Ok(vec![])`.
    fn search(&self, query: &str) -> Result<Vec<Record>, ClientError>;

    fn get_by_id(&self, id: u32) -> Result<Record, ClientError>;

    fn random(&self, count: usize) -> Result<Vec<Record>, ClientError>;
}

#[derive(Debug, Clone)]
pub struct LocalQueryService {
    catalog: Arc<Catalog>,
}

impl LocalQueryService {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }
}

impl QueryService for LocalQueryService {
    fn list_all(&self) -> Result<Vec<Record>, ClientError> {
        Ok(self.catalog.list_all().to_vec())
    }

    fn search(&self, query: &str) -> Result<Vec<Record>, ClientError> {
        Ok(self.catalog.search(query).into_iter().cloned().collect())
    }

    fn get_by_id(&self, id: u32) -> Result<Record, ClientError> {
        self.catalog
            .get(id)
            .cloned()
            .ok_or(ClientError::NotFound(id))
    }

    fn random(&self, count: usize) -> Result<Vec<Record>, ClientError> {
        Ok(self
            .catalog
            .random_sample(count, &mut thread_rng())
            .into_iter()
            .cloned()
            .collect())
    }
}

/// Blocking HTTP client for the `/collection` endpoints.
#[derive(Debug, Clone)]
pub struct HttpQueryService {
    base: Url,
    client: reqwest::blocking::Client,
}

impl HttpQueryService {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ClientError> {
        let mut base = Url::parse(base_url)
            .map_err(|e| ClientError::network(base_url, format!("invalid server url: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::network(base_url, "server url cannot be a base"));
        }
        // Keep a trailing slash off so segment pushes land where expected.
        if base.path() == "/" {
            base.set_path("");
        }

        let mut builder = reqwest::blocking::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ClientError::network(base_url, format!("failed to build http client: {e}")))?;

        Ok(Self { base, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// `base/collection/<segments...>`, each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("collection");
            for s in segments {
                path.push(s);
            }
        }
        url
    }

    fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: Url,
        not_found: Option<u32>,
    ) -> Result<T, ClientError> {
        let resp = self.client.get(url.clone()).send().map_err(|e| {
            tracing::warn!(url = %url, error = %e, "query service request failed");
            ClientError::network(url.as_str(), e.to_string())
        })?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            if let Some(id) = not_found {
                return Err(ClientError::NotFound(id));
            }
        }
        if !status.is_success() {
            let text = resp.text().unwrap_or_default();
            tracing::warn!(url = %url, %status, "query service returned an error");
            return Err(ClientError::network(
                url.as_str(),
                format!("status {status}: {}", text.trim()),
            ));
        }

        resp.json::<T>()
            .map_err(|e| ClientError::network(url.as_str(), format!("failed to decode response: {e}")))
    }
}

/// Path segment for a trimmed search query. URL building drops `.` and `..`
/// as dot segments; the server trims queries, so a trailing space keeps them.
fn search_segment(query: &str) -> Cow<'_, str> {
    match query {
        "." | ".." => Cow::Owned(format!("{query} ")),
        _ => Cow::Borrowed(query),
    }
}

impl QueryService for HttpQueryService {
    fn list_all(&self) -> Result<Vec<Record>, ClientError> {
        self.get_json(self.endpoint(&[]), None)
    }

    fn search(&self, query: &str) -> Result<Vec<Record>, ClientError> {
        let q = query.trim();
        if q.is_empty() {
            return Ok(Vec::new());
        }
        self.get_json(self.endpoint(&["search", &search_segment(q)]), None)
    }

    fn get_by_id(&self, id: u32) -> Result<Record, ClientError> {
        self.get_json(self.endpoint(&[&id.to_string()]), Some(id))
    }

    fn random(&self, count: usize) -> Result<Vec<Record>, ClientError> {
        self.get_json(self.endpoint(&["random", &count.to_string()]), None)
    }
}
