//! Search variant dispatch.
//!
//! [`SearchDispatcher`] routes a single filtered search request to one of the
//! backend's search operations, clamps the requested result count to the
//! variant's ceiling, and converts the response (or any remote error) into a
//! [`SearchOutcome`]. It holds no state between calls.

use std::sync::Arc;

use serde_json::Value;

use crate::client::SearchApi;
use crate::models::{SearchOutcome, SearchRequest, SearchVariant};

/// Fixed prefix for failure outcomes produced by [`SearchDispatcher::dispatch`].
pub const DISPATCH_ERROR_PREFIX: &str = "Error applying advanced filter";

/// Routes search requests to the appropriate backend operation.
#[derive(Debug, Clone)]
pub struct SearchDispatcher {
    api: Arc<dyn SearchApi>,
}

impl SearchDispatcher {
    /// Create a dispatcher over the given backend client.
    pub fn new(api: Arc<dyn SearchApi>) -> Self {
        Self { api }
    }

    /// The underlying backend client.
    pub fn api(&self) -> &Arc<dyn SearchApi> {
        &self.api
    }

    /// Issue a single search against the variant's backend operation.
    ///
    /// The requested count is clamped silently to the variant ceiling
    /// (snippets 128, documents 2048, pages 1024); non-positive counts pass
    /// through for the backend to judge. Exactly one remote call is made,
    /// with no retry. Success carries the backend's result records
    /// unmodified; any remote error becomes a failure outcome prefixed with
    /// [`DISPATCH_ERROR_PREFIX`].
    pub async fn dispatch(&self, request: &SearchRequest) -> SearchOutcome {
        let k = request.variant.clamp_k(request.k);
        let filter = request.filter.as_ref();

        tracing::debug!(
            operation = request.variant.operation(),
            collection = %request.collection,
            requested_k = request.k,
            effective_k = k,
            "dispatching search"
        );

        let result = match request.variant {
            SearchVariant::Snippets => {
                self.api
                    .top_snippets(
                        &request.collection,
                        &request.query,
                        k,
                        true,
                        request.options.reranker.as_deref(),
                        filter,
                    )
                    .await
                    .map(|response| response.results)
            }
            SearchVariant::Documents => {
                self.api
                    .top_documents(&request.collection, &request.query, k, true, filter)
                    .await
                    .map(|response| response.results)
            }
            SearchVariant::Pages => {
                self.api
                    .top_pages(
                        &request.collection,
                        &request.query,
                        k,
                        request.options.include_content,
                        request.options.latency_mode,
                        filter,
                    )
                    .await
                    .map(|response| {
                        response
                            .results
                            .into_iter()
                            .map(|page| serde_json::to_value(page).unwrap_or(Value::Null))
                            .collect()
                    })
            }
        };

        match result {
            Ok(results) => SearchOutcome::Success(results),
            Err(e) => SearchOutcome::Failure(format!("{}: {}", DISPATCH_ERROR_PREFIX, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockSearchApi;
    use serde_json::json;

    fn dispatcher() -> (Arc<MockSearchApi>, SearchDispatcher) {
        let api = Arc::new(MockSearchApi::new());
        let dispatcher = SearchDispatcher::new(api.clone());
        (api, dispatcher)
    }

    #[tokio::test]
    async fn test_clamps_each_variant_to_its_ceiling() {
        for (variant, ceiling) in [
            (SearchVariant::Snippets, 128),
            (SearchVariant::Documents, 2048),
            (SearchVariant::Pages, 1024),
        ] {
            let (api, dispatcher) = dispatcher();
            let request = SearchRequest::new("docs", "q", variant).k(ceiling + 1);

            let outcome = dispatcher.dispatch(&request).await;

            assert!(outcome.is_success());
            let recorded = api.last_query().unwrap();
            assert_eq!(recorded.k, ceiling);
            assert_eq!(recorded.operation, variant.operation());
        }
    }

    #[tokio::test]
    async fn test_k_below_ceiling_passes_unchanged() {
        let (api, dispatcher) = dispatcher();
        let request = SearchRequest::new("docs", "q", SearchVariant::Documents).k(7);

        dispatcher.dispatch(&request).await;

        assert_eq!(api.last_query().unwrap().k, 7);
    }

    #[tokio::test]
    async fn test_non_positive_k_passes_through() {
        let (api, dispatcher) = dispatcher();
        let request = SearchRequest::new("docs", "q", SearchVariant::Snippets).k(0);

        dispatcher.dispatch(&request).await;

        assert_eq!(api.last_query().unwrap().k, 0);
    }

    #[tokio::test]
    async fn test_results_pass_through_unmodified() {
        let (api, dispatcher) = dispatcher();
        api.set_results(vec![json!({"path": "b.txt"}), json!({"path": "a.txt"})]);
        let request = SearchRequest::new("docs", "q", SearchVariant::Snippets);

        let outcome = dispatcher.dispatch(&request).await;

        // No local re-ranking or reformatting.
        assert_eq!(
            outcome,
            SearchOutcome::Success(vec![json!({"path": "b.txt"}), json!({"path": "a.txt"})])
        );
    }

    #[tokio::test]
    async fn test_remote_failure_maps_to_prefixed_outcome() {
        let (api, dispatcher) = dispatcher();
        api.fail_with("timeout");
        let request = SearchRequest::new("docs", "q", SearchVariant::Documents);

        let outcome = dispatcher.dispatch(&request).await;

        match outcome {
            SearchOutcome::Failure(message) => {
                assert!(message.starts_with(DISPATCH_ERROR_PREFIX));
                assert!(message.contains("timeout"));
            }
            other => panic!("Expected failure outcome, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_filter_is_forwarded() {
        let (api, dispatcher) = dispatcher();
        let filter = json!({"author": {"$eq": "A"}});
        let request =
            SearchRequest::new("docs", "q", SearchVariant::Snippets).filter(filter.clone());

        dispatcher.dispatch(&request).await;

        assert_eq!(api.last_query().unwrap().filter, Some(filter));
    }

    #[tokio::test]
    async fn test_single_remote_call_per_dispatch() {
        let (api, dispatcher) = dispatcher();
        api.fail_with("boom");
        let request = SearchRequest::new("docs", "q", SearchVariant::Pages);

        dispatcher.dispatch(&request).await;

        // No retry on failure.
        assert_eq!(api.recorded_queries().len(), 1);
    }
}
