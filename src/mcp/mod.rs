//! MCP over JSON-RPC 2.0
//!
//! `rpc` builds response and error envelopes; `server` validates incoming
//! messages and routes each method to the dispatcher.

pub mod rpc;
pub mod server;
