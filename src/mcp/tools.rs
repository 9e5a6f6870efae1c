//! Tool registry for MCP tools.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use super::handlers::{
    AddDocumentHandler, AdvancedFilterHandler, CreateCollectionHandler, DeleteCollectionHandler,
    DeleteDocumentHandler, FilterDocumentsHandler, GetCollectionStatusHandler,
    GetDocumentInfoHandler, ListCollectionsHandler, ListDocumentsHandler, ParseDocumentHandler,
    RerankDocumentsHandler, SearchCollectionHandler, SearchDocumentsHandler, SearchPagesHandler,
    UpdateDocumentMetadataHandler, DEFAULT_RERANKER, DEFAULT_RERANK_MODEL,
};
use crate::client::SearchApi;
use crate::search::SearchDispatcher;

/// An MCP tool that can be called by the client
#[derive(Clone)]
pub struct Tool {
    /// Tool name (e.g., "search_collection")
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// JSON Schema for input parameters
    pub input_schema: serde_json::Value,

    /// Handler function to execute the tool
    pub handler: Arc<dyn ToolHandler>,
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("input_schema", &self.input_schema)
            .finish()
    }
}

/// Handler for executing a tool
#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync + std::fmt::Debug {
    /// Execute the tool with the given arguments
    async fn execute(&self, args: Value) -> Result<Value, String>;
}

/// Registry for all MCP tools
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Tool>,
}

impl ToolRegistry {
    /// Create a new registry exposing the full tool surface over the given
    /// backend client.
    pub fn new(api: Arc<dyn SearchApi>) -> Self {
        let mut registry = Self {
            tools: HashMap::new(),
        };

        registry.register_search_tools(&api);
        registry.register_collection_tools(&api);
        registry.register_document_tools(&api);
        registry.register_model_tools(&api);

        registry
    }

    fn register_search_tools(&mut self, api: &Arc<dyn SearchApi>) {
        self.register(Tool {
            name: "search_collection".to_string(),
            description: "Search a collection for precise snippets".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "collection_name": {
                        "type": "string",
                        "description": "The name of the collection"
                    },
                    "query": {
                        "type": "string",
                        "description": "The search query"
                    },
                    "k": {
                        "type": "integer",
                        "description": "The number of top results to return",
                        "default": 21
                    },
                    "reranker": {
                        "type": "string",
                        "description": "The reranker model to use",
                        "default": DEFAULT_RERANKER
                    },
                    "filter": {
                        "type": "object",
                        "description": "Metadata filter query in the backend query language"
                    }
                },
                "required": ["collection_name", "query"]
            }),
            handler: Arc::new(SearchCollectionHandler { api: api.clone() }),
        });

        self.register(Tool {
            name: "search_documents".to_string(),
            description: "Search for whole documents in a collection".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "collection_name": {
                        "type": "string",
                        "description": "Collection to search"
                    },
                    "query": {
                        "type": "string",
                        "description": "Search query"
                    },
                    "k": {
                        "type": "integer",
                        "description": "Number of results",
                        "default": 5
                    },
                    "include_metadata": {
                        "type": "boolean",
                        "description": "Include document metadata in results",
                        "default": true
                    },
                    "filter": {
                        "type": "object",
                        "description": "Metadata filter query in the backend query language"
                    }
                },
                "required": ["collection_name", "query"]
            }),
            handler: Arc::new(SearchDocumentsHandler { api: api.clone() }),
        });

        self.register(Tool {
            name: "search_pages".to_string(),
            description: "Search for relevant pages across documents".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "collection_name": {
                        "type": "string",
                        "description": "Collection to search"
                    },
                    "query": {
                        "type": "string",
                        "description": "Search query"
                    },
                    "k": {
                        "type": "integer",
                        "description": "Number of results (max 1024)",
                        "default": 5
                    },
                    "include_content": {
                        "type": "boolean",
                        "description": "Include page content",
                        "default": true
                    },
                    "latency_mode": {
                        "type": "string",
                        "description": "Latency mode",
                        "enum": ["low", "medium", "high"],
                        "default": "low"
                    },
                    "filter": {
                        "type": "object",
                        "description": "Metadata filter query in the backend query language"
                    }
                },
                "required": ["collection_name", "query"]
            }),
            handler: Arc::new(SearchPagesHandler { api: api.clone() }),
        });

        self.register(Tool {
            name: "filter_documents_by_metadata".to_string(),
            description:
                "Filter documents based on common metadata criteria (author, language, tags, timestamps)"
                    .to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "collection_name": {
                        "type": "string",
                        "description": "Collection to search"
                    },
                    "query": {
                        "type": "string",
                        "description": "Search query"
                    },
                    "author": {
                        "type": "string",
                        "description": "Filter by author"
                    },
                    "language": {
                        "type": "string",
                        "description": "Filter by language"
                    },
                    "tags": {
                        "type": "array",
                        "description": "Filter by tags (list intersection)",
                        "items": { "type": "string" }
                    },
                    "timestamp_after": {
                        "type": "string",
                        "description": "Filter by timestamp after (ISO format)"
                    },
                    "timestamp_before": {
                        "type": "string",
                        "description": "Filter by timestamp before (ISO format)"
                    },
                    "k": {
                        "type": "integer",
                        "description": "Number of results",
                        "default": 5
                    }
                },
                "required": ["collection_name", "query"]
            }),
            handler: Arc::new(FilterDocumentsHandler { api: api.clone() }),
        });

        self.register(Tool {
            name: "advanced_metadata_filter".to_string(),
            description:
                "Apply a custom metadata filter query, routed to snippet, document, or page search"
                    .to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "collection_name": {
                        "type": "string",
                        "description": "Collection to search"
                    },
                    "query": {
                        "type": "string",
                        "description": "Search query"
                    },
                    "filter_query": {
                        "type": "object",
                        "description": "Custom metadata filter in the backend query language, e.g. {\"$and\": [{\"author\": {\"$eq\": \"John\"}}, {\"language\": {\"$eq\": \"en\"}}]}"
                    },
                    "k": {
                        "type": "integer",
                        "description": "Number of results (clamped per search type: snippets 128, documents 2048, pages 1024)",
                        "default": 5
                    },
                    "search_type": {
                        "type": "string",
                        "description": "Search type: 'snippets', 'documents', or 'pages'",
                        "default": "snippets"
                    }
                },
                "required": ["collection_name", "query", "filter_query"]
            }),
            handler: Arc::new(AdvancedFilterHandler {
                dispatcher: SearchDispatcher::new(api.clone()),
            }),
        });
    }

    fn register_collection_tools(&mut self, api: &Arc<dyn SearchApi>) {
        self.register(Tool {
            name: "create_collection".to_string(),
            description: "Create a new collection for document storage".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "collection_name": {
                        "type": "string",
                        "description": "Collection name"
                    }
                },
                "required": ["collection_name"]
            }),
            handler: Arc::new(CreateCollectionHandler { api: api.clone() }),
        });

        self.register(Tool {
            name: "list_collections".to_string(),
            description: "List all available collections".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {}
            }),
            handler: Arc::new(ListCollectionsHandler { api: api.clone() }),
        });

        self.register(Tool {
            name: "get_collection_status".to_string(),
            description: "Get indexing status information for a collection".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "collection_name": {
                        "type": "string",
                        "description": "Collection name"
                    }
                },
                "required": ["collection_name"]
            }),
            handler: Arc::new(GetCollectionStatusHandler { api: api.clone() }),
        });

        self.register(Tool {
            name: "delete_collection".to_string(),
            description: "Delete a collection and all its documents".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "collection_name": {
                        "type": "string",
                        "description": "Collection name to delete"
                    }
                },
                "required": ["collection_name"]
            }),
            handler: Arc::new(DeleteCollectionHandler { api: api.clone() }),
        });
    }

    fn register_document_tools(&mut self, api: &Arc<dyn SearchApi>) {
        self.register(Tool {
            name: "add_document".to_string(),
            description: "Add a document to a collection".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "collection_name": {
                        "type": "string",
                        "description": "Target collection name"
                    },
                    "path": {
                        "type": "string",
                        "description": "Document path/identifier"
                    },
                    "content_type": {
                        "type": "string",
                        "description": "Type: 'text', 'auto', or 'text-pages'",
                        "default": "text"
                    },
                    "content": {
                        "type": "string",
                        "description": "Document content or base64 data"
                    },
                    "metadata": {
                        "type": "object",
                        "description": "Optional metadata"
                    }
                },
                "required": ["collection_name", "path", "content"]
            }),
            handler: Arc::new(AddDocumentHandler { api: api.clone() }),
        });

        self.register(Tool {
            name: "get_document_info".to_string(),
            description: "Get information about a specific document".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "collection_name": {
                        "type": "string",
                        "description": "Collection name"
                    },
                    "path": {
                        "type": "string",
                        "description": "Document path/identifier"
                    },
                    "include_content": {
                        "type": "boolean",
                        "description": "Include document content",
                        "default": false
                    }
                },
                "required": ["collection_name", "path"]
            }),
            handler: Arc::new(GetDocumentInfoHandler { api: api.clone() }),
        });

        self.register(Tool {
            name: "list_documents".to_string(),
            description: "List documents in a collection with pagination".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "collection_name": {
                        "type": "string",
                        "description": "Collection name"
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number to return (max 1024)",
                        "default": 100
                    },
                    "path_gt": {
                        "type": "string",
                        "description": "Path to start from (for pagination)"
                    }
                },
                "required": ["collection_name"]
            }),
            handler: Arc::new(ListDocumentsHandler { api: api.clone() }),
        });

        self.register(Tool {
            name: "update_document_metadata".to_string(),
            description: "Update metadata for an existing document".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "collection_name": {
                        "type": "string",
                        "description": "Collection name"
                    },
                    "path": {
                        "type": "string",
                        "description": "Document path/identifier"
                    },
                    "metadata": {
                        "type": "object",
                        "description": "New metadata to set"
                    }
                },
                "required": ["collection_name", "path", "metadata"]
            }),
            handler: Arc::new(UpdateDocumentMetadataHandler { api: api.clone() }),
        });

        self.register(Tool {
            name: "delete_document".to_string(),
            description: "Delete a document from a collection".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "collection_name": {
                        "type": "string",
                        "description": "Collection name"
                    },
                    "path": {
                        "type": "string",
                        "description": "Document path/identifier to delete"
                    }
                },
                "required": ["collection_name", "path"]
            }),
            handler: Arc::new(DeleteDocumentHandler { api: api.clone() }),
        });
    }

    fn register_model_tools(&mut self, api: &Arc<dyn SearchApi>) {
        self.register(Tool {
            name: "parse_document".to_string(),
            description: "Parse a document (PDF, etc.) without indexing it".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "base64_data": {
                        "type": "string",
                        "description": "Base64-encoded document data"
                    }
                },
                "required": ["base64_data"]
            }),
            handler: Arc::new(ParseDocumentHandler { api: api.clone() }),
        });

        self.register(Tool {
            name: "rerank_documents".to_string(),
            description: "Rerank documents based on relevance to a query".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Query to rank against"
                    },
                    "documents": {
                        "type": "array",
                        "description": "List of document texts",
                        "items": { "type": "string" }
                    },
                    "model": {
                        "type": "string",
                        "description": "Reranking model",
                        "default": DEFAULT_RERANK_MODEL
                    },
                    "top_n": {
                        "type": "integer",
                        "description": "Number of top results"
                    }
                },
                "required": ["query", "documents"]
            }),
            handler: Arc::new(RerankDocumentsHandler { api: api.clone() }),
        });
    }

    /// Register a tool
    pub fn register(&mut self, tool: Tool) {
        self.tools.insert(tool.name.clone(), tool);
    }

    /// Get all tools
    pub fn all(&self) -> Vec<&Tool> {
        self.tools.values().collect()
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.get(name)
    }

    /// Get the number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a tool by name
    pub async fn execute(&self, name: &str, args: Value) -> Result<Value, String> {
        let tool = self
            .get(name)
            .ok_or_else(|| format!("Tool '{}' not found", name))?;

        tool.handler.execute(args).await
    }
}
