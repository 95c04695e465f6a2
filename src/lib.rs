//! Analytics Dashboard
//!
//! Browser front end for a project analytics API: traffic, revenue and LLM
//! cost views, payment / LLM provider integrations, live visitor counts.
//!
//! The orchestration core has no UI types and is tested on the host:
//! - `config`: build/env configuration and auth-mode selection
//! - `auth`: session state machine over hosted or self-hosted (JWT) auth
//! - `client`: typed API client and per-token client factory
//! - `query`: deduplicating, stale-while-revalidate query cache
//! - `live`: reconnecting live-visitor subscription
//! - `state`: persisted project / time-range selection
//! - `routes`: route table and access guards
//!
//! `app` is the Dioxus UI composed on top.

pub mod app;
pub mod auth;
pub mod client;
pub mod config;
pub mod format;
pub mod live;
pub mod query;
pub mod routes;
pub mod state;
pub mod storage;
pub mod time;
