//! Core data models for filters and search operations.

mod filter;
mod search;

pub use filter::{FilterCriterion, FilterExpression, FilterOp, MetadataFilter};
pub use search::{LatencyMode, SearchOptions, SearchOutcome, SearchRequest, SearchVariant};
