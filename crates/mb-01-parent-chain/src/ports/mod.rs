//! Ports for the parent chain client.

pub mod outbound;

pub use outbound::ParentChainClient;
