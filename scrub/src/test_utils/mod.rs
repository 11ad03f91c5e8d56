//! Helpers for integration tests: throwaway SQLite databases, canned
//! datasets, and a store wrapper that records calls and injects faults.

pub mod database;
pub mod store;
