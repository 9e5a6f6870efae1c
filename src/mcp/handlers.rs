//! Tool handlers bridging MCP arguments to the backend client.
//!
//! Every handler follows the same contract: missing or malformed required
//! arguments are protocol errors (`Err(String)`), while remote failures are
//! converted into the tool's textual "Error …" payload so the transport
//! never observes a raised fault from this layer.

use std::sync::Arc;

use serde_json::{json, Value};

use super::tools::ToolHandler;
use crate::client::{ApiError, DocumentContent, SearchApi};
use crate::models::{LatencyMode, MetadataFilter, SearchOptions, SearchRequest, SearchVariant};
use crate::search::SearchDispatcher;

/// Default reranker model for snippet search.
pub const DEFAULT_RERANKER: &str = "rerank-1";

/// Default model for standalone reranking.
pub const DEFAULT_RERANK_MODEL: &str = "rerank-1-small";

fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str, String> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("Missing '{}' parameter", key))
}

fn optional_str<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(|v| v.as_str())
}

fn optional_i64(args: &Value, key: &str, default: i64) -> i64 {
    args.get(key).and_then(|v| v.as_i64()).unwrap_or(default)
}

fn optional_bool(args: &Value, key: &str, default: bool) -> bool {
    args.get(key).and_then(|v| v.as_bool()).unwrap_or(default)
}

fn text(payload: impl Into<String>) -> Value {
    Value::String(payload.into())
}

fn results_text(results: Vec<Value>) -> Value {
    text(Value::Array(results).to_string())
}

/// Handler for snippet search over a collection.
#[derive(Debug)]
pub struct SearchCollectionHandler {
    pub api: Arc<dyn SearchApi>,
}

#[async_trait::async_trait]
impl ToolHandler for SearchCollectionHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let collection = required_str(&args, "collection_name")?;
        let query = required_str(&args, "query")?;
        let k = optional_i64(&args, "k", 21);
        let reranker = optional_str(&args, "reranker").unwrap_or(DEFAULT_RERANKER);
        let filter = args.get("filter").filter(|v| !v.is_null());

        match self
            .api
            .top_snippets(collection, query, k, true, Some(reranker), filter)
            .await
        {
            Ok(response) => Ok(results_text(response.results)),
            Err(e) => Ok(text(format!("Error performing search: {}", e))),
        }
    }
}

/// Handler for creating a collection.
#[derive(Debug)]
pub struct CreateCollectionHandler {
    pub api: Arc<dyn SearchApi>,
}

#[async_trait::async_trait]
impl ToolHandler for CreateCollectionHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let collection = required_str(&args, "collection_name")?;

        match self.api.add_collection(collection).await {
            Ok(()) => Ok(text(format!(
                "Collection '{}' created successfully",
                collection
            ))),
            Err(ApiError::Conflict(_)) => Ok(text(format!(
                "Collection '{}' already exists",
                collection
            ))),
            Err(e) => Ok(text(format!("Error creating collection: {}", e))),
        }
    }
}

/// Handler for adding a document to a collection.
#[derive(Debug)]
pub struct AddDocumentHandler {
    pub api: Arc<dyn SearchApi>,
}

#[async_trait::async_trait]
impl ToolHandler for AddDocumentHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let collection = required_str(&args, "collection_name")?;
        let path = required_str(&args, "path")?;
        let content_type = optional_str(&args, "content_type").unwrap_or("text");
        let content = required_str(&args, "content")?;
        let metadata = args.get("metadata").cloned().unwrap_or_else(|| json!({}));

        let content = DocumentContent::from_parts(content_type, content);

        match self
            .api
            .add_document(collection, path, &content, &metadata)
            .await
        {
            Ok(()) => Ok(text(format!(
                "Document '{}' added to collection '{}'",
                path, collection
            ))),
            Err(ApiError::Conflict(_)) => Ok(text(format!(
                "Document '{}' already exists in collection '{}'",
                path, collection
            ))),
            Err(e) => Ok(text(format!("Error adding document: {}", e))),
        }
    }
}

/// Handler for listing all collections.
#[derive(Debug)]
pub struct ListCollectionsHandler {
    pub api: Arc<dyn SearchApi>,
}

#[async_trait::async_trait]
impl ToolHandler for ListCollectionsHandler {
    async fn execute(&self, _args: Value) -> Result<Value, String> {
        match self.api.list_collections().await {
            Ok(list) => Ok(text(json!(list.collection_names).to_string())),
            Err(e) => Ok(text(format!("Error listing collections: {}", e))),
        }
    }
}

/// Handler for fetching a collection's indexing status.
#[derive(Debug)]
pub struct GetCollectionStatusHandler {
    pub api: Arc<dyn SearchApi>,
}

#[async_trait::async_trait]
impl ToolHandler for GetCollectionStatusHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let collection = required_str(&args, "collection_name")?;

        match self.api.collection_status(collection).await {
            Ok(status) => Ok(text(
                json!({
                    "collection": collection,
                    "num_documents": status.num_documents,
                    "num_indexed": status.num_indexed_documents,
                    "num_indexing": status.num_indexing_documents,
                    "num_parsing": status.num_parsing_documents,
                    "num_failed": status.num_failed_documents,
                })
                .to_string(),
            )),
            Err(e) => Ok(text(format!("Error getting status: {}", e))),
        }
    }
}

/// Handler for document-level search.
#[derive(Debug)]
pub struct SearchDocumentsHandler {
    pub api: Arc<dyn SearchApi>,
}

#[async_trait::async_trait]
impl ToolHandler for SearchDocumentsHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let collection = required_str(&args, "collection_name")?;
        let query = required_str(&args, "query")?;
        let k = optional_i64(&args, "k", 5);
        let include_metadata = optional_bool(&args, "include_metadata", true);
        let filter = args.get("filter").filter(|v| !v.is_null());

        match self
            .api
            .top_documents(collection, query, k, include_metadata, filter)
            .await
        {
            Ok(response) => Ok(results_text(response.results)),
            Err(e) => Ok(text(format!("Error searching documents: {}", e))),
        }
    }
}

/// Handler for snippet search with structured metadata criteria.
///
/// Compiles the provided criteria with [`MetadataFilter::compile`] and runs
/// a precise snippet search with the resulting filter (or none at all when
/// no criteria are set).
#[derive(Debug)]
pub struct FilterDocumentsHandler {
    pub api: Arc<dyn SearchApi>,
}

#[async_trait::async_trait]
impl ToolHandler for FilterDocumentsHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let collection = required_str(&args, "collection_name")?;
        let query = required_str(&args, "query")?;
        let k = optional_i64(&args, "k", 5);

        let mut criteria = MetadataFilter::new();
        if let Some(author) = optional_str(&args, "author") {
            criteria = criteria.author(author);
        }
        if let Some(language) = optional_str(&args, "language") {
            criteria = criteria.language(language);
        }
        if let Some(tags) = args.get("tags").and_then(|v| v.as_array()) {
            criteria = criteria.tags(
                tags.iter()
                    .filter_map(|t| t.as_str())
                    .map(|t| t.to_string())
                    .collect(),
            );
        }
        if let Some(after) = optional_str(&args, "timestamp_after") {
            criteria = criteria.timestamp_after(after);
        }
        if let Some(before) = optional_str(&args, "timestamp_before") {
            criteria = criteria.timestamp_before(before);
        }

        let filter = criteria.compile().map(|expr| expr.to_query());

        match self
            .api
            .top_snippets(collection, query, k, true, None, filter.as_ref())
            .await
        {
            Ok(response) => Ok(results_text(response.results)),
            Err(e) => Ok(text(format!("Error filtering documents: {}", e))),
        }
    }
}

/// Handler for advanced filtering with a caller-supplied filter query.
///
/// Routes to snippet, document, or page search via [`SearchDispatcher`];
/// unknown search types fall back to snippets.
#[derive(Debug)]
pub struct AdvancedFilterHandler {
    pub dispatcher: SearchDispatcher,
}

#[async_trait::async_trait]
impl ToolHandler for AdvancedFilterHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let collection = required_str(&args, "collection_name")?;
        let query = required_str(&args, "query")?;
        let filter_query = args
            .get("filter_query")
            .cloned()
            .ok_or("Missing 'filter_query' parameter")?;
        let k = optional_i64(&args, "k", 5);
        let variant = SearchVariant::parse(optional_str(&args, "search_type").unwrap_or(""));

        let request = SearchRequest::new(collection, query, variant)
            .k(k)
            .filter(filter_query)
            .options(SearchOptions {
                include_content: true,
                latency_mode: LatencyMode::Low,
                reranker: None,
            });

        Ok(text(self.dispatcher.dispatch(&request).await.into_text()))
    }
}

/// Handler for deleting a collection.
#[derive(Debug)]
pub struct DeleteCollectionHandler {
    pub api: Arc<dyn SearchApi>,
}

#[async_trait::async_trait]
impl ToolHandler for DeleteCollectionHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let collection = required_str(&args, "collection_name")?;

        match self.api.delete_collection(collection).await {
            Ok(()) => Ok(text(format!(
                "Collection '{}' deleted successfully",
                collection
            ))),
            Err(e) => Ok(text(format!("Error deleting collection: {}", e))),
        }
    }
}

/// Handler for fetching a single document's info.
#[derive(Debug)]
pub struct GetDocumentInfoHandler {
    pub api: Arc<dyn SearchApi>,
}

#[async_trait::async_trait]
impl ToolHandler for GetDocumentInfoHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let collection = required_str(&args, "collection_name")?;
        let path = required_str(&args, "path")?;
        let include_content = optional_bool(&args, "include_content", false);

        match self
            .api
            .document_info(collection, path, include_content)
            .await
        {
            Ok(doc) => Ok(text(
                json!({
                    "id": doc.id,
                    "path": doc.path,
                    "metadata": doc.metadata,
                    "index_status": doc.index_status,
                    "num_pages": doc.num_pages,
                    "content": include_content.then_some(doc.content).flatten(),
                })
                .to_string(),
            )),
            Err(e) => Ok(text(format!("Error getting document info: {}", e))),
        }
    }
}

/// Handler for listing documents with pagination.
#[derive(Debug)]
pub struct ListDocumentsHandler {
    pub api: Arc<dyn SearchApi>,
}

/// Ceiling on the per-page document listing size.
const MAX_LIST_LIMIT: i64 = 1024;

#[async_trait::async_trait]
impl ToolHandler for ListDocumentsHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let collection = required_str(&args, "collection_name")?;
        let limit = optional_i64(&args, "limit", 100).min(MAX_LIST_LIMIT);
        let path_gt = optional_str(&args, "path_gt");

        match self.api.list_documents(collection, limit, path_gt).await {
            Ok(page) => {
                let documents: Vec<Value> = page
                    .documents
                    .iter()
                    .map(|doc| {
                        json!({
                            "id": doc.id,
                            "path": doc.path,
                            "metadata": doc.metadata,
                            "index_status": doc.index_status,
                            "num_pages": doc.num_pages,
                        })
                    })
                    .collect();

                Ok(text(
                    json!({
                        "documents": documents,
                        "count": documents.len(),
                        "next_page": page.path_gt,
                    })
                    .to_string(),
                ))
            }
            Err(e) => Ok(text(format!("Error listing documents: {}", e))),
        }
    }
}

/// Handler for replacing a document's metadata.
#[derive(Debug)]
pub struct UpdateDocumentMetadataHandler {
    pub api: Arc<dyn SearchApi>,
}

#[async_trait::async_trait]
impl ToolHandler for UpdateDocumentMetadataHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let collection = required_str(&args, "collection_name")?;
        let path = required_str(&args, "path")?;
        let metadata = args
            .get("metadata")
            .cloned()
            .ok_or("Missing 'metadata' parameter")?;

        match self
            .api
            .update_document_metadata(collection, path, &metadata)
            .await
        {
            Ok(result) => Ok(text(
                json!({
                    "status": "success",
                    "previous_id": result.previous_id,
                    "new_id": result.new_id,
                })
                .to_string(),
            )),
            Err(e) => Ok(text(format!("Error updating metadata: {}", e))),
        }
    }
}

/// Handler for deleting a document.
#[derive(Debug)]
pub struct DeleteDocumentHandler {
    pub api: Arc<dyn SearchApi>,
}

#[async_trait::async_trait]
impl ToolHandler for DeleteDocumentHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let collection = required_str(&args, "collection_name")?;
        let path = required_str(&args, "path")?;

        match self.api.delete_document(collection, path).await {
            Ok(()) => Ok(text(format!(
                "Document '{}' deleted from collection '{}'",
                path, collection
            ))),
            Err(e) => Ok(text(format!("Error deleting document: {}", e))),
        }
    }
}

/// Handler for page-level search.
#[derive(Debug)]
pub struct SearchPagesHandler {
    pub api: Arc<dyn SearchApi>,
}

#[async_trait::async_trait]
impl ToolHandler for SearchPagesHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let collection = required_str(&args, "collection_name")?;
        let query = required_str(&args, "query")?;
        let k = SearchVariant::Pages.clamp_k(optional_i64(&args, "k", 5));
        let include_content = optional_bool(&args, "include_content", true);
        let latency_mode = LatencyMode::parse(optional_str(&args, "latency_mode").unwrap_or("low"));
        let filter = args.get("filter").filter(|v| !v.is_null());

        match self
            .api
            .top_pages(collection, query, k, include_content, latency_mode, filter)
            .await
        {
            Ok(response) => {
                let pages: Vec<Value> = response
                    .results
                    .iter()
                    .map(|page| {
                        json!({
                            "path": page.path,
                            "page_index": page.page_index,
                            "score": page.score,
                            "content": if include_content { page.content.clone() } else { None },
                        })
                    })
                    .collect();

                Ok(text(
                    json!({ "pages": pages, "count": pages.len() }).to_string(),
                ))
            }
            Err(e) => Ok(text(format!("Error searching pages: {}", e))),
        }
    }
}

/// Handler for parsing a document without indexing it.
#[derive(Debug)]
pub struct ParseDocumentHandler {
    pub api: Arc<dyn SearchApi>,
}

#[async_trait::async_trait]
impl ToolHandler for ParseDocumentHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let base64_data = required_str(&args, "base64_data")?;

        match self.api.parse_document(base64_data).await {
            Ok(result) => Ok(text(
                json!({
                    "pages": result.pages,
                    "num_pages": result.pages.len(),
                })
                .to_string(),
            )),
            Err(e) => Ok(text(format!("Error parsing document: {}", e))),
        }
    }
}

/// Handler for reranking documents against a query.
#[derive(Debug)]
pub struct RerankDocumentsHandler {
    pub api: Arc<dyn SearchApi>,
}

#[async_trait::async_trait]
impl ToolHandler for RerankDocumentsHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let query = required_str(&args, "query")?;
        let documents: Vec<String> = args
            .get("documents")
            .and_then(|v| v.as_array())
            .ok_or("Missing 'documents' parameter")?
            .iter()
            .filter_map(|d| d.as_str())
            .map(|d| d.to_string())
            .collect();
        let model = optional_str(&args, "model").unwrap_or(DEFAULT_RERANK_MODEL);
        let top_n = args
            .get("top_n")
            .and_then(|v| v.as_u64())
            .map(|n| n as usize)
            .unwrap_or(documents.len());

        match self.api.rerank(query, &documents, model, top_n).await {
            Ok(response) => {
                let reranked: Vec<Value> = response
                    .results
                    .iter()
                    .map(|item| {
                        json!({
                            "index": item.index,
                            "relevance_score": item.relevance_score,
                            "document": documents.get(item.index),
                        })
                    })
                    .collect();

                Ok(text(json!({ "reranked": reranked }).to_string()))
            }
            Err(e) => Ok(text(format!("Error reranking: {}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockSearchApi;

    #[tokio::test]
    async fn test_missing_required_arg_is_protocol_error() {
        let handler = SearchCollectionHandler {
            api: Arc::new(MockSearchApi::new()),
        };

        let err = handler
            .execute(json!({"collection_name": "docs"}))
            .await
            .unwrap_err();

        assert!(err.contains("'query'"));
    }

    #[tokio::test]
    async fn test_remote_failure_becomes_text_payload() {
        let api = Arc::new(MockSearchApi::new());
        api.fail_with("timeout");
        let handler = SearchDocumentsHandler { api };

        let value = handler
            .execute(json!({"collection_name": "docs", "query": "jazz"}))
            .await
            .unwrap();

        let payload = value.as_str().unwrap();
        assert!(payload.starts_with("Error searching documents:"));
        assert!(payload.contains("timeout"));
    }

    #[tokio::test]
    async fn test_create_collection_conflict_is_friendly() {
        let api = Arc::new(MockSearchApi::new());
        api.set_conflict(true);
        let handler = CreateCollectionHandler { api };

        let value = handler
            .execute(json!({"collection_name": "docs"}))
            .await
            .unwrap();

        assert_eq!(value.as_str().unwrap(), "Collection 'docs' already exists");
    }

    #[tokio::test]
    async fn test_filter_documents_compiles_criteria() {
        let api = Arc::new(MockSearchApi::new());
        let handler = FilterDocumentsHandler { api: api.clone() };

        handler
            .execute(json!({
                "collection_name": "docs",
                "query": "jazz",
                "author": "A",
                "language": "en",
            }))
            .await
            .unwrap();

        let recorded = api.last_query().unwrap();
        assert_eq!(recorded.operation, "top_snippets");
        assert_eq!(
            recorded.filter,
            Some(json!({"$and": [
                {"author": {"$eq": "A"}},
                {"language": {"$eq": "en"}},
            ]}))
        );
    }

    #[tokio::test]
    async fn test_filter_documents_without_criteria_sends_no_filter() {
        let api = Arc::new(MockSearchApi::new());
        let handler = FilterDocumentsHandler { api: api.clone() };

        handler
            .execute(json!({"collection_name": "docs", "query": "jazz", "tags": []}))
            .await
            .unwrap();

        assert_eq!(api.last_query().unwrap().filter, None);
    }

    #[tokio::test]
    async fn test_advanced_filter_unknown_type_uses_snippets() {
        let api = Arc::new(MockSearchApi::new());
        let handler = AdvancedFilterHandler {
            dispatcher: SearchDispatcher::new(api.clone()),
        };

        handler
            .execute(json!({
                "collection_name": "docs",
                "query": "jazz",
                "filter_query": {"language": {"$eq": "en"}},
                "k": 500,
                "search_type": "bogus",
            }))
            .await
            .unwrap();

        let recorded = api.last_query().unwrap();
        assert_eq!(recorded.operation, "top_snippets");
        assert_eq!(recorded.k, 128);
    }

    #[tokio::test]
    async fn test_list_documents_clamps_limit() {
        let api = Arc::new(MockSearchApi::new());
        let handler = ListDocumentsHandler { api: api.clone() };

        handler
            .execute(json!({"collection_name": "docs", "limit": 5000}))
            .await
            .unwrap();

        assert_eq!(api.recorded_list_limits(), vec![1024]);
    }

    #[tokio::test]
    async fn test_rerank_shapes_output() {
        let api = Arc::new(MockSearchApi::new());
        let handler = RerankDocumentsHandler { api };

        let value = handler
            .execute(json!({
                "query": "jazz",
                "documents": ["first doc", "second doc"],
                "top_n": 1,
            }))
            .await
            .unwrap();

        let payload: Value = serde_json::from_str(value.as_str().unwrap()).unwrap();
        assert_eq!(payload["reranked"].as_array().unwrap().len(), 1);
        assert_eq!(payload["reranked"][0]["document"], "first doc");
    }
}
