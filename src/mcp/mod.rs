//! MCP (Model Context Protocol) server for cineload.
//!
//! Lets an agent upsert, search and inspect the index through tools.
//! Implements JSON-RPC 2.0 over stdio.

mod protocol;
mod server;
mod tools;

pub use server::McpServer;
