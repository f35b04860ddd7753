//! Adapters for the parent chain port.

mod json_rpc;
mod mock;

pub use json_rpc::JsonRpcParentChainClient;
pub use mock::MockParentChainClient;
