//! Ports for the nullifier registry.

pub mod outbound;

pub use outbound::NullifierStore;
