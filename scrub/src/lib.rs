pub mod error;
pub mod fetch;
pub mod filter;
mod macros;
pub mod pipeline;
pub mod store;
#[cfg(feature = "test-utils")]
pub mod test_utils;
pub mod types;
