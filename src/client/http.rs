//! HTTP implementation of the backend client.

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use url::Url;

use super::{
    ApiError, CollectionList, CollectionStatus, DocumentContent, DocumentInfo, DocumentInfoPage,
    PagesResponse, ParseResult, QueryResponse, RerankResponse, SearchApi, UpdateDocumentResult,
};
use crate::models::LatencyMode;
use async_trait::async_trait;
use std::time::Duration;

/// reqwest-backed client for the search backend's JSON API.
///
/// Every operation is a single POST of a JSON body to
/// `{base_url}/<area>/<operation>` authenticated with a bearer API key.
/// Timeouts are whatever the shared client enforces; there is no retry.
#[derive(Debug, Clone)]
pub struct HttpSearchApi {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl HttpSearchApi {
    /// Create a client for the given base URL.
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, api_key, Duration::from_secs(30))
    }

    /// Create a client with a custom request timeout.
    pub fn with_timeout(
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        // Url::join treats a base without a trailing slash as a file path
        // and would drop its last segment.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };

        let base_url = Url::parse(&normalized)
            .map_err(|e| ApiError::Network(format!("Invalid base URL '{}': {}", normalized, e)))?;

        let client = Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    async fn send(&self, path: &str, body: &Value) -> Result<reqwest::Response, ApiError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| ApiError::Network(format!("Invalid endpoint '{}': {}", path, e)))?;

        tracing::debug!(endpoint = path, "calling search backend");

        let mut request = self.client.post(url).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::CONFLICT {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Conflict(message));
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T, ApiError> {
        self.send(path, body)
            .await?
            .json::<T>()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// POST discarding the response body (some mutation endpoints return
    /// nothing useful, or nothing at all).
    async fn post_unit(&self, path: &str, body: &Value) -> Result<(), ApiError> {
        self.send(path, body).await.map(|_| ())
    }
}

#[async_trait]
impl SearchApi for HttpSearchApi {
    async fn top_snippets(
        &self,
        collection: &str,
        query: &str,
        k: i64,
        precise: bool,
        reranker: Option<&str>,
        filter: Option<&Value>,
    ) -> Result<QueryResponse, ApiError> {
        self.post(
            "queries/top-snippets",
            &json!({
                "collection_name": collection,
                "query": query,
                "k": k,
                "precise_responses": precise,
                "reranker": reranker,
                "filter": filter,
            }),
        )
        .await
    }

    async fn top_documents(
        &self,
        collection: &str,
        query: &str,
        k: i64,
        include_metadata: bool,
        filter: Option<&Value>,
    ) -> Result<QueryResponse, ApiError> {
        self.post(
            "queries/top-documents",
            &json!({
                "collection_name": collection,
                "query": query,
                "k": k,
                "include_metadata": include_metadata,
                "filter": filter,
            }),
        )
        .await
    }

    async fn top_pages(
        &self,
        collection: &str,
        query: &str,
        k: i64,
        include_content: bool,
        latency_mode: LatencyMode,
        filter: Option<&Value>,
    ) -> Result<PagesResponse, ApiError> {
        self.post(
            "queries/top-pages",
            &json!({
                "collection_name": collection,
                "query": query,
                "k": k,
                "include_content": include_content,
                "latency_mode": latency_mode.as_str(),
                "filter": filter,
            }),
        )
        .await
    }

    async fn add_collection(&self, name: &str) -> Result<(), ApiError> {
        self.post_unit(
            "collections/add-collection",
            &json!({ "collection_name": name }),
        )
        .await
    }

    async fn list_collections(&self) -> Result<CollectionList, ApiError> {
        self.post("collections/get-collection-list", &json!({})).await
    }

    async fn delete_collection(&self, name: &str) -> Result<(), ApiError> {
        self.post_unit(
            "collections/delete-collection",
            &json!({ "collection_name": name }),
        )
        .await
    }

    async fn collection_status(&self, name: &str) -> Result<CollectionStatus, ApiError> {
        self.post("status/get-status", &json!({ "collection_name": name }))
            .await
    }

    async fn add_document(
        &self,
        collection: &str,
        path: &str,
        content: &DocumentContent,
        metadata: &Value,
    ) -> Result<(), ApiError> {
        self.post_unit(
            "documents/add-document",
            &json!({
                "collection_name": collection,
                "path": path,
                "content": content,
                "metadata": metadata,
            }),
        )
        .await
    }

    async fn document_info(
        &self,
        collection: &str,
        path: &str,
        include_content: bool,
    ) -> Result<DocumentInfo, ApiError> {
        self.post(
            "documents/get-document-info",
            &json!({
                "collection_name": collection,
                "path": path,
                "include_content": include_content,
            }),
        )
        .await
    }

    async fn list_documents(
        &self,
        collection: &str,
        limit: i64,
        path_gt: Option<&str>,
    ) -> Result<DocumentInfoPage, ApiError> {
        self.post(
            "documents/get-document-info-list",
            &json!({
                "collection_name": collection,
                "limit": limit,
                "path_gt": path_gt,
            }),
        )
        .await
    }

    async fn update_document_metadata(
        &self,
        collection: &str,
        path: &str,
        metadata: &Value,
    ) -> Result<UpdateDocumentResult, ApiError> {
        self.post(
            "documents/update-document",
            &json!({
                "collection_name": collection,
                "path": path,
                "metadata": metadata,
            }),
        )
        .await
    }

    async fn delete_document(&self, collection: &str, path: &str) -> Result<(), ApiError> {
        self.post_unit(
            "documents/delete-document",
            &json!({
                "collection_name": collection,
                "path": path,
            }),
        )
        .await
    }

    async fn parse_document(&self, base64_data: &str) -> Result<ParseResult, ApiError> {
        self.post(
            "parsers/parse-document",
            &json!({ "base64_data": base64_data }),
        )
        .await
    }

    async fn rerank(
        &self,
        query: &str,
        documents: &[String],
        model: &str,
        top_n: usize,
    ) -> Result<RerankResponse, ApiError> {
        self.post(
            "models/rerank",
            &json!({
                "query": query,
                "documents": documents,
                "model": model,
                "top_n": top_n,
            }),
        )
        .await
    }
}
