//! Line-delimited JSON-RPC 2.0 client for the patient records service.
//!
//! The records backend is a separate process speaking newline-delimited
//! JSON-RPC over stdio. This crate owns the wire codec, the request/response
//! correlation, and typed wrappers for every records method.

pub mod client;
pub mod codec;
pub mod records;

pub use client::{spawn_records_process, RpcClient};
pub use codec::{RpcError, RpcRequest, RpcResponse, JSONRPC_VERSION};
pub use records::{NoopRecordsStore, RecordsClient, RecordsStore};
