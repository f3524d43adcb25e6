//! Adapters for external systems: SQLite storage and the MCP stdio surface.

pub mod mcp;
pub mod sqlite;
