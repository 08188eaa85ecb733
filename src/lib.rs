//! codemenu-mcp: MCP server for CodeMenu snippets
//!
//! This library exposes a CodeMenu snippet library to AI assistants as MCP
//! tools. Each tool call is forwarded to CodeMenu's HTTP API and the JSON
//! response is handed back as tool text.
//!
//! # Architecture
//!
//! The server holds no state of its own. CodeMenu owns the data:
//!
//! - **Listing**: snippets (with code summarised), tags, groups
//! - **Lookup**: a single snippet with its full code
//! - **Editing** (opt-in): create, update, delete snippets
//!
//! # Modules
//!
//! - [`config`]: Configuration loading and validation
//! - [`error`]: Configuration error types
//! - [`codemenu`]: CodeMenu HTTP API client
//! - [`tools`]: Tool registry and dispatcher
//! - [`mcp`]: MCP protocol implementation

pub mod codemenu;
pub mod config;
pub mod error;
pub mod mcp;
pub mod tools;
