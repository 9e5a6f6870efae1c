//! Remote search/indexing backend client.
//!
//! The backend is treated as a black box reached over HTTP. [`SearchApi`]
//! defines the operations the tools need; [`HttpSearchApi`] is the reqwest
//! implementation and [`MockSearchApi`] a recording stand-in for tests.

mod http;
pub mod mock;

pub use http::HttpSearchApi;
pub use mock::MockSearchApi;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::LatencyMode;

/// Errors surfaced by the remote backend.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Network or transport error
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success response from the backend
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The target resource already exists (HTTP 409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Response body could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Parse(err.to_string())
    }
}

/// Response from snippet and document search operations.
///
/// Result records are opaque to this crate and passed through unmodified.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResponse {
    pub results: Vec<Value>,
}

/// A single page search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    pub path: String,
    pub page_index: u64,
    pub score: f64,
    pub content: Option<String>,
}

/// Response from page search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PagesResponse {
    pub results: Vec<PageResult>,
}

/// Response listing collection names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionList {
    pub collection_names: Vec<String>,
}

/// Indexing status of a collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionStatus {
    pub num_documents: u64,
    pub num_indexed_documents: u64,
    pub num_indexing_documents: u64,
    pub num_parsing_documents: u64,
    pub num_failed_documents: u64,
}

/// Content payload for document ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DocumentContent {
    /// Raw text
    #[serde(rename = "text")]
    Text { text: String },

    /// Pre-split pages
    #[serde(rename = "text-pages")]
    TextPages { pages: Vec<String> },

    /// Base64-encoded binary handed to the backend's own parser
    #[serde(rename = "auto")]
    Auto { base64_data: String },
}

impl DocumentContent {
    /// Build content from a type tag and raw payload.
    ///
    /// `text-pages` splits the payload on the `\n---\n` page separator;
    /// `auto` passes the base64 payload through verbatim; anything else is
    /// treated as plain text.
    pub fn from_parts(content_type: &str, content: &str) -> Self {
        match content_type {
            "text-pages" => DocumentContent::TextPages {
                pages: content.split("\n---\n").map(|p| p.to_string()).collect(),
            },
            "auto" => DocumentContent::Auto {
                base64_data: content.to_string(),
            },
            _ => DocumentContent::Text {
                text: content.to_string(),
            },
        }
    }
}

/// Metadata and indexing state of a single document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub id: String,
    pub path: String,
    #[serde(default)]
    pub metadata: Value,
    pub index_status: String,
    pub num_pages: Option<u64>,
    pub content: Option<String>,
}

/// One page of a document listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentInfoPage {
    #[serde(default)]
    pub documents: Vec<DocumentInfo>,

    /// Cursor for the next page, if more documents exist.
    pub path_gt: Option<String>,
}

/// Result of a metadata update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateDocumentResult {
    pub previous_id: String,
    pub new_id: String,
}

/// Result of a standalone parse.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParseResult {
    pub pages: Vec<String>,
}

/// A single rerank entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankResult {
    pub index: usize,
    pub relevance_score: f64,
}

/// Response from the rerank model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RerankResponse {
    pub results: Vec<RerankResult>,
}

/// Operations exposed by the remote search/indexing backend.
///
/// Every method is a single round trip with no retries; callers convert any
/// [`ApiError`] into a textual failure at the tool boundary.
#[async_trait]
pub trait SearchApi: Send + Sync + std::fmt::Debug {
    // ========== QUERY OPERATIONS ==========

    /// Snippet-level search.
    async fn top_snippets(
        &self,
        collection: &str,
        query: &str,
        k: i64,
        precise: bool,
        reranker: Option<&str>,
        filter: Option<&Value>,
    ) -> Result<QueryResponse, ApiError>;

    /// Document-level search.
    async fn top_documents(
        &self,
        collection: &str,
        query: &str,
        k: i64,
        include_metadata: bool,
        filter: Option<&Value>,
    ) -> Result<QueryResponse, ApiError>;

    /// Page-level search.
    async fn top_pages(
        &self,
        collection: &str,
        query: &str,
        k: i64,
        include_content: bool,
        latency_mode: LatencyMode,
        filter: Option<&Value>,
    ) -> Result<PagesResponse, ApiError>;

    // ========== COLLECTION OPERATIONS ==========

    /// Create a collection.
    async fn add_collection(&self, name: &str) -> Result<(), ApiError>;

    /// List all collections.
    async fn list_collections(&self) -> Result<CollectionList, ApiError>;

    /// Delete a collection and its documents.
    async fn delete_collection(&self, name: &str) -> Result<(), ApiError>;

    /// Get indexing status for a collection.
    async fn collection_status(&self, name: &str) -> Result<CollectionStatus, ApiError>;

    // ========== DOCUMENT OPERATIONS ==========

    /// Add a document to a collection.
    async fn add_document(
        &self,
        collection: &str,
        path: &str,
        content: &DocumentContent,
        metadata: &Value,
    ) -> Result<(), ApiError>;

    /// Get info for a single document.
    async fn document_info(
        &self,
        collection: &str,
        path: &str,
        include_content: bool,
    ) -> Result<DocumentInfo, ApiError>;

    /// List documents with cursor pagination.
    async fn list_documents(
        &self,
        collection: &str,
        limit: i64,
        path_gt: Option<&str>,
    ) -> Result<DocumentInfoPage, ApiError>;

    /// Replace a document's metadata.
    async fn update_document_metadata(
        &self,
        collection: &str,
        path: &str,
        metadata: &Value,
    ) -> Result<UpdateDocumentResult, ApiError>;

    /// Delete a document.
    async fn delete_document(&self, collection: &str, path: &str) -> Result<(), ApiError>;

    // ========== MODEL OPERATIONS ==========

    /// Parse a base64-encoded document without indexing it.
    async fn parse_document(&self, base64_data: &str) -> Result<ParseResult, ApiError>;

    /// Rerank documents against a query.
    async fn rerank(
        &self,
        query: &str,
        documents: &[String],
        model: &str,
        top_n: usize,
    ) -> Result<RerankResponse, ApiError>;
}
