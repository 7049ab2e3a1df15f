//! JSON-RPC API Layer
//!
//! JSON-RPC 2.0 ingress and admin surface for the Dispatch engine.

pub mod error;
pub mod handler;
pub mod server;
pub mod types;

pub use handler::RpcHandler;
pub use server::{RpcServer, RpcServerConfig};
