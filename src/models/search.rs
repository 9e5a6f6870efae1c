//! Search request and outcome models.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::FilterExpression;

/// Which backend search operation a request targets.
///
/// Each variant carries a fixed result-count ceiling that the dispatcher
/// clamps to before calling the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchVariant {
    /// Precise snippet-level search.
    Snippets,
    /// Document-level search.
    Documents,
    /// Page-level search.
    Pages,
}

impl SearchVariant {
    /// Maximum permissible result count for this variant.
    pub fn max_k(&self) -> i64 {
        match self {
            SearchVariant::Snippets => 128,
            SearchVariant::Documents => 2048,
            SearchVariant::Pages => 1024,
        }
    }

    /// Backend operation name for this variant.
    pub fn operation(&self) -> &'static str {
        match self {
            SearchVariant::Snippets => "top_snippets",
            SearchVariant::Documents => "top_documents",
            SearchVariant::Pages => "top_pages",
        }
    }

    /// Clamp a requested result count to this variant's ceiling.
    ///
    /// Clamping is silent. Non-positive values pass through unchanged; the
    /// backend's own rejection, if any, surfaces as a failure outcome.
    pub fn clamp_k(&self, requested: i64) -> i64 {
        requested.min(self.max_k())
    }

    /// Parse a variant selector, falling back to [`Snippets`] for anything
    /// unrecognized. The fallback is deliberate: the endpoint stays
    /// permissive instead of rejecting the call.
    ///
    /// [`Snippets`]: SearchVariant::Snippets
    pub fn parse(s: &str) -> Self {
        match s {
            "documents" => SearchVariant::Documents,
            "pages" => SearchVariant::Pages,
            _ => SearchVariant::Snippets,
        }
    }
}

/// Latency/quality trade-off for page search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LatencyMode {
    #[default]
    Low,
    Medium,
    High,
}

impl LatencyMode {
    /// Wire form of the latency mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            LatencyMode::Low => "low",
            LatencyMode::Medium => "medium",
            LatencyMode::High => "high",
        }
    }

    /// Parse a latency mode, defaulting to `low`.
    pub fn parse(s: &str) -> Self {
        match s {
            "medium" => LatencyMode::Medium,
            "high" => LatencyMode::High,
            _ => LatencyMode::Low,
        }
    }
}

/// Variant-specific knobs for a search request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Include page content in page search results.
    pub include_content: bool,

    /// Latency mode for page search.
    pub latency_mode: LatencyMode,

    /// Reranker model for snippet search, if any.
    pub reranker: Option<String>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            include_content: true,
            latency_mode: LatencyMode::Low,
            reranker: None,
        }
    }
}

/// A single search request, constructed fresh per call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Target collection name.
    pub collection: String,

    /// Free-text query.
    pub query: String,

    /// Requested result count (clamped per variant at dispatch time).
    pub k: i64,

    /// Which backend operation to use.
    pub variant: SearchVariant,

    /// Compiled metadata filter in the backend's wire form, if any.
    pub filter: Option<Value>,

    /// Variant-specific options.
    #[serde(default)]
    pub options: SearchOptions,
}

impl SearchRequest {
    /// Create a new request for the given variant.
    pub fn new(
        collection: impl Into<String>,
        query: impl Into<String>,
        variant: SearchVariant,
    ) -> Self {
        Self {
            collection: collection.into(),
            query: query.into(),
            k: 5,
            variant,
            filter: None,
            options: SearchOptions::default(),
        }
    }

    /// Set the requested result count.
    pub fn k(mut self, k: i64) -> Self {
        self.k = k;
        self
    }

    /// Attach a pre-rendered filter query.
    pub fn filter(mut self, filter: Value) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Compile and attach a filter expression.
    pub fn filter_expression(mut self, expr: &FilterExpression) -> Self {
        self.filter = Some(expr.to_query());
        self
    }

    /// Set variant-specific options.
    pub fn options(mut self, options: SearchOptions) -> Self {
        self.options = options;
        self
    }
}

/// Result of a dispatched search: the backend's raw result records passed
/// through unmodified, or a human-readable failure message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SearchOutcome {
    Success(Vec<Value>),
    Failure(String),
}

impl SearchOutcome {
    /// Whether the outcome is a success.
    pub fn is_success(&self) -> bool {
        matches!(self, SearchOutcome::Success(_))
    }

    /// Render the outcome as the tool's textual payload.
    pub fn into_text(self) -> String {
        match self {
            SearchOutcome::Success(results) => Value::Array(results).to_string(),
            SearchOutcome::Failure(message) => message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_variant_ceilings() {
        assert_eq!(SearchVariant::Snippets.max_k(), 128);
        assert_eq!(SearchVariant::Documents.max_k(), 2048);
        assert_eq!(SearchVariant::Pages.max_k(), 1024);
    }

    #[test]
    fn test_clamp_above_ceiling() {
        assert_eq!(SearchVariant::Snippets.clamp_k(129), 128);
        assert_eq!(SearchVariant::Documents.clamp_k(1_000_000), 2048);
        assert_eq!(SearchVariant::Pages.clamp_k(1025), 1024);
    }

    #[test]
    fn test_clamp_identity_below_ceiling() {
        assert_eq!(SearchVariant::Snippets.clamp_k(128), 128);
        assert_eq!(SearchVariant::Documents.clamp_k(5), 5);
        assert_eq!(SearchVariant::Pages.clamp_k(1), 1);
    }

    #[test]
    fn test_clamp_passes_non_positive_through() {
        assert_eq!(SearchVariant::Snippets.clamp_k(0), 0);
        assert_eq!(SearchVariant::Pages.clamp_k(-7), -7);
    }

    #[test]
    fn test_variant_parse_fallback() {
        assert_eq!(SearchVariant::parse("documents"), SearchVariant::Documents);
        assert_eq!(SearchVariant::parse("pages"), SearchVariant::Pages);
        assert_eq!(SearchVariant::parse("snippets"), SearchVariant::Snippets);
        assert_eq!(SearchVariant::parse("bogus"), SearchVariant::Snippets);
        assert_eq!(SearchVariant::parse(""), SearchVariant::Snippets);
    }

    #[test]
    fn test_latency_mode_parse() {
        assert_eq!(LatencyMode::parse("medium"), LatencyMode::Medium);
        assert_eq!(LatencyMode::parse("high"), LatencyMode::High);
        assert_eq!(LatencyMode::parse("low"), LatencyMode::Low);
        assert_eq!(LatencyMode::parse("weird"), LatencyMode::Low);
    }

    #[test]
    fn test_request_builder() {
        let request = SearchRequest::new("docs", "history of jazz", SearchVariant::Documents)
            .k(40)
            .filter(json!({"language": {"$eq": "en"}}));

        assert_eq!(request.collection, "docs");
        assert_eq!(request.k, 40);
        assert_eq!(request.variant, SearchVariant::Documents);
        assert_eq!(request.filter, Some(json!({"language": {"$eq": "en"}})));
    }

    #[test]
    fn test_outcome_text() {
        let success = SearchOutcome::Success(vec![json!({"path": "a.txt"})]);
        assert_eq!(success.into_text(), r#"[{"path":"a.txt"}]"#);

        let failure = SearchOutcome::Failure("Error applying advanced filter: boom".to_string());
        assert!(failure.into_text().contains("boom"));
    }
}
