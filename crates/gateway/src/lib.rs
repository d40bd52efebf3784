//! HTTP surface of the revq admin gateway.
//!
//! Thin JSON routes over the queue state machine: the console UI renders
//! what these endpoints return and never talks to the RAG backend
//! directly.

pub mod config;
pub mod error;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
