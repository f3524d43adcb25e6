//! MCP (Model Context Protocol) server adapter.
//!
//! Exposes the RAG service as tools over stdio so an agent host can ingest,
//! query and reset the store.

pub mod stdio_server;

pub use stdio_server::{StdioServer, PROTOCOL_VERSION};
