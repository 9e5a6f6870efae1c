//! Integration tests for Docsearch MCP
//!
//! These tests exercise the MCP server, tool registry, filter compilation,
//! and dispatch clamping against the mock backend client.

use docsearch_mcp::client::{MockSearchApi, PageResult};
use docsearch_mcp::mcp::{McpServer, ToolRegistry};
use docsearch_mcp::models::{MetadataFilter, SearchRequest, SearchVariant};
use docsearch_mcp::search::{SearchDispatcher, DISPATCH_ERROR_PREFIX};
use serde_json::json;
use std::sync::Arc;

fn registry_with_mock() -> (Arc<MockSearchApi>, ToolRegistry) {
    let api = Arc::new(MockSearchApi::new());
    let registry = ToolRegistry::new(api.clone());
    (api, registry)
}

/// Test that the server can be created successfully
#[tokio::test]
async fn test_server_initialization() {
    let api = Arc::new(MockSearchApi::new());
    let server = McpServer::new(api);
    assert!(server.is_ok());
}

/// Test that the full tool surface is registered
#[tokio::test]
async fn test_tool_surface() {
    let (_, registry) = registry_with_mock();

    assert_eq!(registry.len(), 16);
    assert!(registry.get("search_collection").is_some());
    assert!(registry.get("advanced_metadata_filter").is_some());
    assert!(registry.get("filter_documents_by_metadata").is_some());
    assert!(registry.get("rerank_documents").is_some());
    assert!(registry.get("nonexistent").is_none());
}

/// Compiling an empty criteria set yields no filter
#[test]
fn test_compile_empty_is_none() {
    assert_eq!(MetadataFilter::new().compile(), None);
}

/// A single criterion compiles to a bare leaf, not a singleton And
#[test]
fn test_compile_single_criterion() {
    let expr = MetadataFilter::new().author("A").compile().unwrap();
    assert_eq!(expr.to_query(), json!({"author": {"$eq": "A"}}));
}

/// Multiple criteria join under And in fixed field order
#[test]
fn test_compile_multiple_criteria_order() {
    let expr = MetadataFilter::new()
        .language("en")
        .author("A")
        .compile()
        .unwrap();

    assert_eq!(
        expr.to_query(),
        json!({"$and": [
            {"author": {"$eq": "A"}},
            {"language": {"$eq": "en"}},
        ]})
    );
}

/// Tag lists compile to a list intersection predicate; empty lists vanish
#[test]
fn test_compile_tags() {
    let expr = MetadataFilter::new()
        .tags(vec!["ai".to_string(), "tech".to_string()])
        .compile()
        .unwrap();
    assert_eq!(expr.to_query(), json!({"list:tags": {"$in": ["ai", "tech"]}}));

    assert_eq!(MetadataFilter::new().tags(vec![]).compile(), None);
}

/// Compilation is a pure function of its input
#[test]
fn test_compile_idempotent() {
    let criteria = MetadataFilter::new()
        .author("A")
        .tags(vec!["ai".to_string()])
        .timestamp_after("2024-01-01T00:00:00");

    assert_eq!(criteria.compile(), criteria.compile());
}

/// For every variant, k above the ceiling is clamped and k below passes
/// through unchanged
#[tokio::test]
async fn test_dispatch_clamping_per_variant() {
    for (variant, ceiling) in [
        (SearchVariant::Snippets, 128),
        (SearchVariant::Documents, 2048),
        (SearchVariant::Pages, 1024),
    ] {
        let api = Arc::new(MockSearchApi::new());
        let dispatcher = SearchDispatcher::new(api.clone());

        dispatcher
            .dispatch(&SearchRequest::new("docs", "q", variant).k(ceiling * 2))
            .await;
        assert_eq!(api.last_query().unwrap().k, ceiling);

        dispatcher
            .dispatch(&SearchRequest::new("docs", "q", variant).k(3))
            .await;
        assert_eq!(api.last_query().unwrap().k, 3);
    }
}

/// Remote failures surface as a prefixed failure outcome, never a fault
#[tokio::test]
async fn test_dispatch_failure_mapping() {
    let api = Arc::new(MockSearchApi::new());
    api.fail_with("timeout");
    let dispatcher = SearchDispatcher::new(api);

    let outcome = dispatcher
        .dispatch(&SearchRequest::new("docs", "q", SearchVariant::Documents))
        .await;

    let message = outcome.into_text();
    assert!(message.starts_with(DISPATCH_ERROR_PREFIX));
    assert!(message.contains("timeout"));
}

/// An unknown search type string dispatches as snippets with the 128 ceiling
#[tokio::test]
async fn test_advanced_filter_unknown_variant() {
    let (api, registry) = registry_with_mock();

    registry
        .execute(
            "advanced_metadata_filter",
            json!({
                "collection_name": "docs",
                "query": "jazz",
                "filter_query": {"language": {"$eq": "en"}},
                "k": 999,
                "search_type": "bogus",
            }),
        )
        .await
        .unwrap();

    let recorded = api.last_query().unwrap();
    assert_eq!(recorded.operation, "top_snippets");
    assert_eq!(recorded.k, 128);
    assert_eq!(recorded.filter, Some(json!({"language": {"$eq": "en"}})));
}

/// The advanced filter tool routes documents and pages to their operations
#[tokio::test]
async fn test_advanced_filter_routing() {
    for (search_type, operation) in [("documents", "top_documents"), ("pages", "top_pages")] {
        let (api, registry) = registry_with_mock();

        registry
            .execute(
                "advanced_metadata_filter",
                json!({
                    "collection_name": "docs",
                    "query": "jazz",
                    "filter_query": {},
                    "search_type": search_type,
                }),
            )
            .await
            .unwrap();

        assert_eq!(api.last_query().unwrap().operation, operation);
    }
}

/// The metadata filter tool compiles its criteria before searching
#[tokio::test]
async fn test_filter_documents_by_metadata_wire_form() {
    let (api, registry) = registry_with_mock();

    registry
        .execute(
            "filter_documents_by_metadata",
            json!({
                "collection_name": "docs",
                "query": "jazz",
                "author": "A",
                "tags": ["ai", "tech"],
                "timestamp_after": "2024-01-01T00:00:00",
            }),
        )
        .await
        .unwrap();

    let recorded = api.last_query().unwrap();
    assert_eq!(recorded.operation, "top_snippets");
    assert_eq!(
        recorded.filter,
        Some(json!({"$and": [
            {"author": {"$eq": "A"}},
            {"list:tags": {"$in": ["ai", "tech"]}},
            {"timestamp": {"$gt": "2024-01-01T00:00:00"}},
        ]}))
    );
}

/// Search results pass through to the tool payload unmodified
#[tokio::test]
async fn test_search_collection_passthrough() {
    let (api, registry) = registry_with_mock();
    api.set_results(vec![json!({"path": "a.txt", "score": 0.9})]);

    let value = registry
        .execute(
            "search_collection",
            json!({"collection_name": "docs", "query": "jazz"}),
        )
        .await
        .unwrap();

    assert_eq!(
        value.as_str().unwrap(),
        r#"[{"path":"a.txt","score":0.9}]"#
    );
    // Default k for this tool is 21.
    assert_eq!(api.last_query().unwrap().k, 21);
}

/// Remote errors on every tool become textual payloads with the tool's
/// fixed prefix
#[tokio::test]
async fn test_tool_failures_are_textual() {
    let (api, registry) = registry_with_mock();
    api.fail_with("connection reset");

    let cases = [
        ("search_collection", json!({"collection_name": "c", "query": "q"}), "Error performing search:"),
        ("search_documents", json!({"collection_name": "c", "query": "q"}), "Error searching documents:"),
        ("search_pages", json!({"collection_name": "c", "query": "q"}), "Error searching pages:"),
        ("filter_documents_by_metadata", json!({"collection_name": "c", "query": "q"}), "Error filtering documents:"),
        ("list_collections", json!({}), "Error listing collections:"),
        ("get_collection_status", json!({"collection_name": "c"}), "Error getting status:"),
    ];

    for (tool, args, prefix) in cases {
        let value = registry.execute(tool, args).await.unwrap();
        let payload = value.as_str().unwrap();
        assert!(
            payload.starts_with(prefix),
            "tool '{}' payload '{}' should start with '{}'",
            tool,
            payload,
            prefix
        );
        assert!(payload.contains("connection reset"));
    }
}

/// Page search results are reshaped with a count
#[tokio::test]
async fn test_search_pages_shape() {
    let (api, registry) = registry_with_mock();
    api.set_pages(vec![PageResult {
        path: "book.pdf".to_string(),
        page_index: 3,
        score: 0.7,
        content: Some("page text".to_string()),
    }]);

    let value = registry
        .execute(
            "search_pages",
            json!({"collection_name": "docs", "query": "jazz"}),
        )
        .await
        .unwrap();

    let payload: serde_json::Value = serde_json::from_str(value.as_str().unwrap()).unwrap();
    assert_eq!(payload["count"], 1);
    assert_eq!(payload["pages"][0]["path"], "book.pdf");
    assert_eq!(payload["pages"][0]["page_index"], 3);
}

/// Document creation conflicts map to friendly text, not errors
#[tokio::test]
async fn test_add_document_conflict() {
    let (api, registry) = registry_with_mock();
    api.set_conflict(true);

    let value = registry
        .execute(
            "add_document",
            json!({
                "collection_name": "docs",
                "path": "a.txt",
                "content": "hello",
            }),
        )
        .await
        .unwrap();

    assert_eq!(
        value.as_str().unwrap(),
        "Document 'a.txt' already exists in collection 'docs'"
    );
}

/// Collection listing is rendered as a JSON array payload
#[tokio::test]
async fn test_list_collections_payload() {
    let (api, registry) = registry_with_mock();
    api.set_collections(vec!["alpha".to_string(), "beta".to_string()]);

    let value = registry
        .execute("list_collections", json!({}))
        .await
        .unwrap();

    assert_eq!(value.as_str().unwrap(), r#"["alpha","beta"]"#);
}
