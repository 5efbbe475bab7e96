//! HTTP surface: the `/mcp` JSON-RPC endpoint plus health and discovery routes.

pub mod handlers;
