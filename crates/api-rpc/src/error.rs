//! RPC Error Types
//!
//! Maps application errors to JSON-RPC error codes.

use dispatch_core::error::AppError;
use jsonrpsee::types::ErrorObjectOwned;

pub use dispatch_core::error::code;

/// Convert AppError to JSON-RPC ErrorObject
pub fn to_rpc_error(err: AppError) -> ErrorObjectOwned {
    ErrorObjectOwned::owned(err.code(), err.to_string(), None::<()>)
}
