//! Target comparison and header layout.

mod header;
mod target;

pub use header::serialize_header;
pub use target::{leading_value, meets_target};
