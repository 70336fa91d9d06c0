//! Herald HTTP ingress.
//!
//! - POST /        — Submit an event for validation and dispatch
//! - GET  /health  — Liveness plus delivery counters

pub mod logging;
pub mod routes;
pub mod state;
