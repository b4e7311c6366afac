//! modelgate - OpenAI-compatible LLM gateway
//!
//! The binary's building blocks, exposed as a library so the server can
//! be assembled (and exercised in integration tests) without a socket.

#![forbid(unsafe_code)]

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod server;
pub mod upstream;
pub mod validation;
