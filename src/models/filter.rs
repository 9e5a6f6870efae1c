//! Metadata filter expressions and their compilation.
//!
//! The backend accepts a small boolean query language over document metadata:
//! a leaf predicate is `{"field": {"$op": value}}` and composites are
//! `{"$and": [...]}` / `{"$or": [...]}`. [`FilterExpression`] models that
//! language, and [`MetadataFilter`] compiles the common user-facing criteria
//! (author, language, tags, timestamp bounds) into an expression.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Comparison operator for a single metadata predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOp {
    Equals,
    GreaterThan,
    LessThan,
    In,
}

impl FilterOp {
    /// Operator keyword in the backend query language.
    pub fn keyword(&self) -> &'static str {
        match self {
            FilterOp::Equals => "$eq",
            FilterOp::GreaterThan => "$gt",
            FilterOp::LessThan => "$lt",
            FilterOp::In => "$in",
        }
    }
}

/// A single field predicate: `field <op> value`.
///
/// Values are carried verbatim; the backend is responsible for validating
/// their contents (date formats, tag strings, and so on).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCriterion {
    /// Metadata field name (e.g., "author", "list:tags").
    pub field: String,

    /// Comparison operator.
    pub op: FilterOp,

    /// Scalar or list value to compare against.
    pub value: Value,
}

impl FilterCriterion {
    /// Create a new criterion.
    pub fn new(field: impl Into<String>, op: FilterOp, value: Value) -> Self {
        Self {
            field: field.into(),
            op,
            value,
        }
    }
}

/// A boolean tree of metadata predicates.
///
/// `And`/`Or` nodes always carry at least one child; compilation never emits
/// an empty composite, and a single criterion stays a bare [`Leaf`] rather
/// than being wrapped in a singleton `And`.
///
/// [`Leaf`]: FilterExpression::Leaf
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterExpression {
    /// A single predicate.
    Leaf(FilterCriterion),

    /// All children must match.
    And(Vec<FilterExpression>),

    /// At least one child must match.
    Or(Vec<FilterExpression>),
}

impl FilterExpression {
    /// Leaf shorthand: `field == value`.
    pub fn equals(field: impl Into<String>, value: Value) -> Self {
        FilterExpression::Leaf(FilterCriterion::new(field, FilterOp::Equals, value))
    }

    /// Leaf shorthand: `field > value`.
    pub fn greater_than(field: impl Into<String>, value: Value) -> Self {
        FilterExpression::Leaf(FilterCriterion::new(field, FilterOp::GreaterThan, value))
    }

    /// Leaf shorthand: `field < value`.
    pub fn less_than(field: impl Into<String>, value: Value) -> Self {
        FilterExpression::Leaf(FilterCriterion::new(field, FilterOp::LessThan, value))
    }

    /// Leaf shorthand: `field` intersects `values`.
    pub fn is_in(field: impl Into<String>, values: Vec<Value>) -> Self {
        FilterExpression::Leaf(FilterCriterion::new(
            field,
            FilterOp::In,
            Value::Array(values),
        ))
    }

    /// Render the expression in the backend's wire form.
    pub fn to_query(&self) -> Value {
        match self {
            FilterExpression::Leaf(criterion) => json!({
                (criterion.field.clone()): { (criterion.op.keyword()): criterion.value.clone() }
            }),
            FilterExpression::And(children) => json!({
                "$and": children.iter().map(|c| c.to_query()).collect::<Vec<_>>()
            }),
            FilterExpression::Or(children) => json!({
                "$or": children.iter().map(|c| c.to_query()).collect::<Vec<_>>()
            }),
        }
    }
}

/// Structured, user-facing filter criteria.
///
/// Each present, non-empty field compiles to exactly one leaf predicate.
/// Field order in the compiled `And` is fixed: author, language, tags,
/// timestamp_after, timestamp_before.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataFilter {
    /// Exact author match.
    pub author: Option<String>,

    /// Exact language match.
    pub language: Option<String>,

    /// Tag intersection (empty list contributes no predicate).
    #[serde(default)]
    pub tags: Vec<String>,

    /// Lower timestamp bound (exclusive), passed through verbatim.
    pub timestamp_after: Option<String>,

    /// Upper timestamp bound (exclusive), passed through verbatim.
    pub timestamp_before: Option<String>,
}

impl MetadataFilter {
    /// Create an empty filter (compiles to `None`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the author criterion.
    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Set the language criterion.
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Set the tags criterion.
    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Set the lower timestamp bound.
    pub fn timestamp_after(mut self, after: impl Into<String>) -> Self {
        self.timestamp_after = Some(after.into());
        self
    }

    /// Set the upper timestamp bound.
    pub fn timestamp_before(mut self, before: impl Into<String>) -> Self {
        self.timestamp_before = Some(before.into());
        self
    }

    /// Compile the criteria into a filter expression.
    ///
    /// Returns `None` when no criteria are set. A single criterion compiles
    /// to a bare leaf; two or more are joined under a single `And` in fixed
    /// field order, so identical inputs always produce structurally equal
    /// expressions.
    pub fn compile(&self) -> Option<FilterExpression> {
        let mut leaves = Vec::new();

        if let Some(author) = &self.author {
            leaves.push(FilterExpression::equals("author", json!(author)));
        }

        if let Some(language) = &self.language {
            leaves.push(FilterExpression::equals("language", json!(language)));
        }

        if !self.tags.is_empty() {
            leaves.push(FilterExpression::is_in(
                "list:tags",
                self.tags.iter().map(|t| json!(t)).collect(),
            ));
        }

        if let Some(after) = &self.timestamp_after {
            leaves.push(FilterExpression::greater_than("timestamp", json!(after)));
        }

        if let Some(before) = &self.timestamp_before {
            leaves.push(FilterExpression::less_than("timestamp", json!(before)));
        }

        match leaves.len() {
            0 => None,
            1 => leaves.pop(),
            _ => Some(FilterExpression::And(leaves)),
        }
    }
}
