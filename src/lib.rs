//! smartbear-mcp: one MCP server for every configured SmartBear product

pub mod config;
pub mod core;
pub mod integrations;
pub mod transport;
pub mod utils;

pub use config::{ResolvedCredentials, Settings};
pub use utils::{McpError, McpResult};
