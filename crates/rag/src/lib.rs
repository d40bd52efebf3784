//! HTTP client for the RAG backend's review endpoints.

pub mod api;

pub use api::RagApi;
