//! Storage backend implementations.

#[cfg(feature = "local")]
pub mod local;
pub mod memory;
