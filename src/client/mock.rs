//! Mock backend client for testing purposes.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{
    ApiError, CollectionList, CollectionStatus, DocumentContent, DocumentInfo, DocumentInfoPage,
    PageResult, PagesResponse, ParseResult, QueryResponse, RerankResponse, RerankResult, SearchApi,
    UpdateDocumentResult,
};
use crate::models::LatencyMode;

/// A query operation recorded by the mock.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedQuery {
    /// Backend operation name ("top_snippets", "top_documents", "top_pages").
    pub operation: &'static str,
    pub collection: String,
    pub query: String,
    pub k: i64,
    pub filter: Option<Value>,
}

/// A mock backend that records query calls and returns canned responses.
#[derive(Debug, Default)]
pub struct MockSearchApi {
    queries: Mutex<Vec<RecordedQuery>>,
    results: Mutex<Vec<Value>>,
    pages: Mutex<Vec<PageResult>>,
    collections: Mutex<Vec<String>>,
    list_limits: Mutex<Vec<i64>>,
    fail_message: Mutex<Option<String>>,
    conflict: Mutex<bool>,
}

impl MockSearchApi {
    /// Create a new mock with empty responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the result records returned by snippet and document search.
    pub fn set_results(&self, results: Vec<Value>) {
        *self.results.lock().unwrap() = results;
    }

    /// Set the page records returned by page search.
    pub fn set_pages(&self, pages: Vec<PageResult>) {
        *self.pages.lock().unwrap() = pages;
    }

    /// Set the collection names returned by list_collections.
    pub fn set_collections(&self, names: Vec<String>) {
        *self.collections.lock().unwrap() = names;
    }

    /// Make every query operation fail with the given message.
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.fail_message.lock().unwrap() = Some(message.into());
    }

    /// Make creation operations fail with a conflict.
    pub fn set_conflict(&self, conflict: bool) {
        *self.conflict.lock().unwrap() = conflict;
    }

    /// All query calls recorded so far.
    pub fn recorded_queries(&self) -> Vec<RecordedQuery> {
        self.queries.lock().unwrap().clone()
    }

    /// The most recent query call, if any.
    pub fn last_query(&self) -> Option<RecordedQuery> {
        self.queries.lock().unwrap().last().cloned()
    }

    /// Limits passed to list_documents so far.
    pub fn recorded_list_limits(&self) -> Vec<i64> {
        self.list_limits.lock().unwrap().clone()
    }

    fn record(
        &self,
        operation: &'static str,
        collection: &str,
        query: &str,
        k: i64,
        filter: Option<&Value>,
    ) {
        self.queries.lock().unwrap().push(RecordedQuery {
            operation,
            collection: collection.to_string(),
            query: query.to_string(),
            k,
            filter: filter.cloned(),
        });
    }

    fn check_failure(&self) -> Result<(), ApiError> {
        match &*self.fail_message.lock().unwrap() {
            Some(message) => Err(ApiError::Api {
                status: 500,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn check_conflict(&self, what: &str) -> Result<(), ApiError> {
        if *self.conflict.lock().unwrap() {
            Err(ApiError::Conflict(what.to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SearchApi for MockSearchApi {
    async fn top_snippets(
        &self,
        collection: &str,
        query: &str,
        k: i64,
        _precise: bool,
        _reranker: Option<&str>,
        filter: Option<&Value>,
    ) -> Result<QueryResponse, ApiError> {
        self.record("top_snippets", collection, query, k, filter);
        self.check_failure()?;
        Ok(QueryResponse {
            results: self.results.lock().unwrap().clone(),
        })
    }

    async fn top_documents(
        &self,
        collection: &str,
        query: &str,
        k: i64,
        _include_metadata: bool,
        filter: Option<&Value>,
    ) -> Result<QueryResponse, ApiError> {
        self.record("top_documents", collection, query, k, filter);
        self.check_failure()?;
        Ok(QueryResponse {
            results: self.results.lock().unwrap().clone(),
        })
    }

    async fn top_pages(
        &self,
        collection: &str,
        query: &str,
        k: i64,
        _include_content: bool,
        _latency_mode: LatencyMode,
        filter: Option<&Value>,
    ) -> Result<PagesResponse, ApiError> {
        self.record("top_pages", collection, query, k, filter);
        self.check_failure()?;
        Ok(PagesResponse {
            results: self.pages.lock().unwrap().clone(),
        })
    }

    async fn add_collection(&self, name: &str) -> Result<(), ApiError> {
        self.check_failure()?;
        self.check_conflict(name)
    }

    async fn list_collections(&self) -> Result<CollectionList, ApiError> {
        self.check_failure()?;
        Ok(CollectionList {
            collection_names: self.collections.lock().unwrap().clone(),
        })
    }

    async fn delete_collection(&self, _name: &str) -> Result<(), ApiError> {
        self.check_failure()
    }

    async fn collection_status(&self, _name: &str) -> Result<CollectionStatus, ApiError> {
        self.check_failure()?;
        Ok(CollectionStatus {
            num_documents: 3,
            num_indexed_documents: 2,
            num_indexing_documents: 1,
            ..CollectionStatus::default()
        })
    }

    async fn add_document(
        &self,
        _collection: &str,
        path: &str,
        _content: &DocumentContent,
        _metadata: &Value,
    ) -> Result<(), ApiError> {
        self.check_failure()?;
        self.check_conflict(path)
    }

    async fn document_info(
        &self,
        _collection: &str,
        path: &str,
        include_content: bool,
    ) -> Result<DocumentInfo, ApiError> {
        self.check_failure()?;
        Ok(DocumentInfo {
            id: format!("doc-{}", path),
            path: path.to_string(),
            metadata: json!({}),
            index_status: "indexed".to_string(),
            num_pages: Some(1),
            content: include_content.then(|| "mock content".to_string()),
        })
    }

    async fn list_documents(
        &self,
        _collection: &str,
        limit: i64,
        _path_gt: Option<&str>,
    ) -> Result<DocumentInfoPage, ApiError> {
        self.list_limits.lock().unwrap().push(limit);
        self.check_failure()?;
        Ok(DocumentInfoPage::default())
    }

    async fn update_document_metadata(
        &self,
        _collection: &str,
        path: &str,
        _metadata: &Value,
    ) -> Result<UpdateDocumentResult, ApiError> {
        self.check_failure()?;
        Ok(UpdateDocumentResult {
            previous_id: format!("doc-{}-v1", path),
            new_id: format!("doc-{}-v2", path),
        })
    }

    async fn delete_document(&self, _collection: &str, _path: &str) -> Result<(), ApiError> {
        self.check_failure()
    }

    async fn parse_document(&self, _base64_data: &str) -> Result<ParseResult, ApiError> {
        self.check_failure()?;
        Ok(ParseResult {
            pages: vec!["parsed page".to_string()],
        })
    }

    async fn rerank(
        &self,
        _query: &str,
        documents: &[String],
        _model: &str,
        top_n: usize,
    ) -> Result<RerankResponse, ApiError> {
        self.check_failure()?;
        let results = (0..documents.len().min(top_n))
            .map(|index| RerankResult {
                index,
                relevance_score: 1.0 - index as f64 * 0.1,
            })
            .collect();
        Ok(RerankResponse { results })
    }
}
