//! Google Tag Manager MCP Server
//!
//! Exposes Tag Manager tag administration to Claude and other AI assistants
//! via the Model Context Protocol (MCP). Implements MCP over stdio using
//! JSON-RPC 2.0.

pub mod handler;
pub mod protocol;
pub mod server;
pub mod tools;

pub use server::McpServer;
