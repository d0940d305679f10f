//! JSON-RPC API Layer
//!
//! Exposes the ticket distribution core over JSON-RPC 2.0.
//! Adheres to ADR-020 (API Contract).

pub mod error;
pub mod handler;
pub mod server;
pub mod types;

pub use handler::RpcHandler;
pub use server::{RpcServer, RpcServerConfig};
