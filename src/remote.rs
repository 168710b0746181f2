//! HTTP client for the Endee vector service.
//!
//! All paths are relative to `remote.url` (default
//! `http://localhost:8080/api/v1`):
//!
//! | Call | Endpoint |
//! |------|----------|
//! | [`RemoteIndex::probe`] | `GET /health` |
//! | [`RemoteIndex::ensure_index`] | `POST /index/create` |
//! | [`RemoteIndex::insert`] | `POST /index/{name}/vector/insert` |
//! | [`RemoteIndex::search`] | `POST /index/{name}/search` |
//!
//! Requests are bounded by the configured timeout and never retried.

use anyhow::Result;
use reqwest::StatusCode;
use serde::Serialize;
use std::time::Duration;

use crate::config::RemoteConfig;
use crate::error::{status_message, EndeeError};
use crate::models::{EnsureOutcome, IndexDescriptor, VectorRecord};

#[derive(Debug, Serialize)]
struct CreateIndexRequest<'a> {
    index_name: &'a str,
    dim: usize,
    space_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    precision: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    vector: &'a [f32],
    k: usize,
    include_vectors: bool,
}

pub struct RemoteIndex {
    client: reqwest::Client,
    base_url: String,
    health_timeout: Duration,
}

impl RemoteIndex {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            health_timeout: Duration::from_secs(config.health_timeout_secs),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Check that the service is up.
    ///
    /// Returns `true` only for a success status. Transport failures and
    /// other statuses return `false`; the cause is logged, never raised.
    pub async fn probe(&self) -> bool {
        let url = self.endpoint("/health");
        let resp = self
            .client
            .get(&url)
            .timeout(self.health_timeout)
            .send()
            .await;

        match resp {
            Ok(response) if response.status().is_success() => {
                tracing::debug!(%url, "vector service healthy");
                true
            }
            Ok(response) => {
                tracing::warn!(%url, status = %response.status(), "health check returned non-success status");
                false
            }
            Err(e) if e.is_timeout() => {
                tracing::warn!(%url, "health check timed out after {:?}", self.health_timeout);
                false
            }
            Err(e) if e.is_connect() => {
                tracing::warn!(%url, error = %e, "could not connect to vector service");
                false
            }
            Err(e) => {
                tracing::warn!(%url, error = %e, "health check failed");
                false
            }
        }
    }

    /// Create the index, treating "already exists" as success.
    ///
    /// A `409 Conflict` maps to [`EnsureOutcome::AlreadyExists`]. So does
    /// an error body that says the index exists; see
    /// [`reports_existing_index`].
    pub async fn ensure_index(
        &self,
        descriptor: &IndexDescriptor,
    ) -> Result<EnsureOutcome, EndeeError> {
        let payload = CreateIndexRequest {
            index_name: &descriptor.name,
            dim: descriptor.dim,
            space_type: descriptor.space_type.as_str(),
            precision: descriptor.precision.as_deref(),
        };

        let provisioning = |message: String| EndeeError::Provisioning {
            index: descriptor.name.clone(),
            message,
        };

        let response = self
            .client
            .post(self.endpoint("/index/create"))
            .json(&payload)
            .send()
            .await
            .map_err(|e| provisioning(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(EnsureOutcome::Created);
        }
        if status == StatusCode::CONFLICT {
            return Ok(EnsureOutcome::AlreadyExists);
        }

        let body = response.text().await.unwrap_or_default();
        if reports_existing_index(status, &body, &descriptor.name) {
            tracing::debug!(%status, "index create reported existing index");
            return Ok(EnsureOutcome::AlreadyExists);
        }

        Err(provisioning(status_message(status, &body)))
    }

    /// Insert one batch of records.
    ///
    /// `range` is the position of the batch within the run and only
    /// labels the error.
    pub async fn insert(
        &self,
        index_name: &str,
        records: &[VectorRecord],
        range: std::ops::Range<usize>,
    ) -> Result<(), EndeeError> {
        let chunk_error = |message: String| EndeeError::ChunkInsert {
            start: range.start,
            end: range.end,
            message,
        };

        let response = self
            .client
            .post(self.endpoint(&format!("/index/{}/vector/insert", index_name)))
            .json(records)
            .send()
            .await
            .map_err(|e| chunk_error(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(chunk_error(status_message(status, &body)))
    }

    /// Run a nearest-neighbour query and return the raw response body.
    pub async fn search(
        &self,
        index_name: &str,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<u8>, EndeeError> {
        let payload = SearchRequest {
            vector,
            k,
            include_vectors: false,
        };

        let response = self
            .client
            .post(self.endpoint(&format!("/index/{}/search", index_name)))
            .json(&payload)
            .send()
            .await
            .map_err(|e| EndeeError::SearchRequest {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EndeeError::SearchRequest {
                message: status_message(status, &body),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| EndeeError::SearchRequest {
                message: format!("failed to read response body: {}", e),
            })?;
        Ok(bytes.to_vec())
    }
}

/// Whether a failed create response means the index is already there.
///
/// Any body containing "already exist" counts. A 4xx body that names the
/// index and says it "exists" counts too, unless it is a "does not exist"
/// or "not exist" reply.
fn reports_existing_index(status: StatusCode, body: &str, index_name: &str) -> bool {
    let body = body.to_ascii_lowercase();
    if body.contains("already exist") {
        return true;
    }
    status.is_client_error()
        && body.contains(&index_name.to_ascii_lowercase())
        && body.contains("exist")
        && !body.contains("not exist")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SpaceType;
    use httpmock::prelude::*;
    use serde_json::json;

    fn remote_for(server: &MockServer) -> RemoteIndex {
        RemoteIndex::new(&RemoteConfig {
            url: server.url("/api/v1"),
            timeout_secs: 5,
            health_timeout_secs: 2,
        })
        .unwrap()
    }

    fn descriptor() -> IndexDescriptor {
        IndexDescriptor {
            name: "docs_index".to_string(),
            dim: 3,
            space_type: SpaceType::Cosine,
            precision: None,
        }
    }

    #[tokio::test]
    async fn test_probe_healthy() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v1/health");
                then.status(200).body("ok");
            })
            .await;

        assert!(remote_for(&server).probe().await);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_probe_non_success_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v1/health");
                then.status(503);
            })
            .await;

        assert!(!remote_for(&server).probe().await);
    }

    #[tokio::test]
    async fn test_probe_connection_refused() {
        let remote = RemoteIndex::new(&RemoteConfig {
            url: "http://127.0.0.1:1/api/v1".to_string(),
            timeout_secs: 2,
            health_timeout_secs: 1,
        })
        .unwrap();
        assert!(!remote.probe().await);
    }

    #[tokio::test]
    async fn test_ensure_index_created() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/api/v1/index/create").json_body(json!({
                    "index_name": "docs_index",
                    "dim": 3,
                    "space_type": "cosine"
                }));
                then.status(200);
            })
            .await;

        let outcome = remote_for(&server).ensure_index(&descriptor()).await.unwrap();
        mock.assert_async().await;
        assert_eq!(outcome, EnsureOutcome::Created);
    }

    #[tokio::test]
    async fn test_ensure_index_forwards_precision() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/api/v1/index/create").json_body(json!({
                    "index_name": "docs_index",
                    "dim": 3,
                    "space_type": "l2",
                    "precision": "INT8"
                }));
                then.status(200);
            })
            .await;

        let mut desc = descriptor();
        desc.space_type = SpaceType::L2;
        desc.precision = Some("INT8".to_string());
        remote_for(&server).ensure_index(&desc).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_ensure_index_conflict_is_success() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/v1/index/create");
                then.status(409).body("conflict");
            })
            .await;

        let outcome = remote_for(&server).ensure_index(&descriptor()).await.unwrap();
        assert_eq!(outcome, EnsureOutcome::AlreadyExists);
    }

    #[tokio::test]
    async fn test_ensure_index_already_exists_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/v1/index/create");
                then.status(400).body("Index docs_index already exists");
            })
            .await;

        let outcome = remote_for(&server).ensure_index(&descriptor()).await.unwrap();
        assert_eq!(outcome, EnsureOutcome::AlreadyExists);
    }

    #[tokio::test]
    async fn test_ensure_index_named_exists_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/v1/index/create");
                then.status(400).body("Index with name docs_index exists");
            })
            .await;

        let outcome = remote_for(&server).ensure_index(&descriptor()).await.unwrap();
        assert_eq!(outcome, EnsureOutcome::AlreadyExists);
    }

    #[test]
    fn test_reports_existing_index_rules() {
        let bad_request = StatusCode::BAD_REQUEST;
        assert!(reports_existing_index(bad_request, "Index with name docs_index exists", "docs_index"));
        assert!(reports_existing_index(StatusCode::INTERNAL_SERVER_ERROR, "index already exists", "docs_index"));
        assert!(!reports_existing_index(bad_request, "Index docs_index does not exist", "docs_index"));
        assert!(!reports_existing_index(bad_request, "Index other_index exists", "docs_index"));
        assert!(!reports_existing_index(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Index with name docs_index exists",
            "docs_index"
        ));
    }

    #[tokio::test]
    async fn test_probe_timeout() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v1/health");
                then.status(200).delay(std::time::Duration::from_secs(3));
            })
            .await;

        let remote = RemoteIndex::new(&RemoteConfig {
            url: server.url("/api/v1"),
            timeout_secs: 10,
            health_timeout_secs: 1,
        })
        .unwrap();
        let started = std::time::Instant::now();
        assert!(!remote.probe().await);
        assert!(started.elapsed() < std::time::Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_ensure_index_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/v1/index/create");
                then.status(500).body("out of memory");
            })
            .await;

        let err = remote_for(&server)
            .ensure_index(&descriptor())
            .await
            .unwrap_err();
        match err {
            EndeeError::Provisioning { index, message } => {
                assert_eq!(index, "docs_index");
                assert!(message.contains("500"));
                assert!(message.contains("out of memory"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_insert_posts_record_array() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/v1/index/docs_index/vector/insert")
                    .json_body(json!([
                        {"id": "0", "vector": [1.0, 0.0, 0.0]},
                        {"id": "1", "vector": [0.0, 1.0, 0.0]}
                    ]));
                then.status(200);
            })
            .await;

        let records = vec![
            VectorRecord {
                id: "0".to_string(),
                vector: vec![1.0, 0.0, 0.0],
            },
            VectorRecord {
                id: "1".to_string(),
                vector: vec![0.0, 1.0, 0.0],
            },
        ];
        remote_for(&server)
            .insert("docs_index", &records, 0..2)
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_insert_failure_names_range() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/v1/index/docs_index/vector/insert");
                then.status(500).body("dimension mismatch");
            })
            .await;

        let err = remote_for(&server)
            .insert("docs_index", &[], 100..200)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "failed to insert chunk 100-200: HTTP 500 Internal Server Error: dimension mismatch"
        );
    }

    #[tokio::test]
    async fn test_search_sends_query_and_returns_bytes() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/v1/index/docs_index/search")
                    .json_body(json!({
                        "vector": [0.5, 0.5, 0.0],
                        "k": 5,
                        "include_vectors": false
                    }));
                then.status(200)
                    .header("content-type", "application/msgpack")
                    .body([0x90u8]);
            })
            .await;

        let body = remote_for(&server)
            .search("docs_index", &[0.5, 0.5, 0.0], 5)
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(body, vec![0x90]);
    }

    #[tokio::test]
    async fn test_search_non_success_includes_server_text() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/v1/index/docs_index/search");
                then.status(404).body("index not found");
            })
            .await;

        let err = remote_for(&server)
            .search("docs_index", &[0.0, 0.0, 1.0], 5)
            .await
            .unwrap_err();
        assert!(matches!(err, EndeeError::SearchRequest { .. }));
        assert!(err.to_string().contains("index not found"));
    }
}
