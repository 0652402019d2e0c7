//! Integration tests for lastnext-storages backends.

mod fixtures;
mod local_tests;
mod memory_tests;
mod utils;
