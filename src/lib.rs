//! # Docsearch MCP
//!
//! A Model Context Protocol (MCP) server exposing a remote document search
//! and indexing backend as callable tools.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Filter expressions, compilation of structured criteria, and
//!   search request/outcome types
//! - [`client`]: The remote backend abstraction ([`client::SearchApi`]) with
//!   an HTTP implementation and a mock for tests
//! - [`search`]: The [`search::SearchDispatcher`] routing requests to the
//!   backend's search variants with per-variant result-count clamping
//! - [`mcp`]: MCP protocol implementation and server
//! - [`config`]: Configuration management

pub mod client;
pub mod config;
pub mod mcp;
pub mod models;
pub mod search;

// Re-export commonly used types
pub use client::{ApiError, HttpSearchApi, SearchApi};
pub use models::{FilterExpression, MetadataFilter, SearchOutcome, SearchRequest, SearchVariant};
pub use search::SearchDispatcher;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
