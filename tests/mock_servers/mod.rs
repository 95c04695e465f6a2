//! Mock servers for integration testing
//!
//! These stand in for the analytics API so the client, the query cache, auth
//! and the live visitor socket can be exercised over real HTTP/WebSocket.

pub mod analytics_api;

pub use analytics_api::MockAnalyticsApi;
