#![deny(missing_docs)]

//! Core library for the docqa document question-answering backend.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Upload, question-answering, and summary orchestration.
pub mod documents;
/// Structured logging and tracing setup.
pub mod logging;
/// Request counters exposed over HTTP.
pub mod metrics;
/// Generative model client abstraction and the Gemini adapter.
pub mod model;
/// Summary PDF rendering.
pub mod pdf;
/// Document persistence with an in-memory fallback.
pub mod store;
