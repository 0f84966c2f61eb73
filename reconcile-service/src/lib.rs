//! HTTP surface for the payment reconciliation service.
//!
//! Authenticates inbound webhooks, stores the new payment or transaction
//! via the core engine, and invokes the matching reconciler of the
//! opposite kind. Also serves the read-only `/payments` endpoints.
//!
//! # Modules
//!
//! - [`routes`] — HTTP endpoints (health, webhooks, payments)
//! - [`state`] — shared [`AppState`](state::AppState)
//! - [`webhook`] — inbound webhook payload shapes and ingest
//! - [`pagination`] — offset/limit pagination for `GET /payments/`
//! - [`metrics`] — Prometheus metrics for ingest and matching outcomes

pub mod metrics;
pub mod pagination;
pub mod routes;
pub mod state;
pub mod webhook;
