pub mod base;
pub mod memory;
pub mod sqlite;

pub use base::RecordStore;
