//! Shared test utilities for async-snmp-agent integration tests.

// Allow dead code and unused imports since not all test files use all utilities
#![allow(dead_code)]
#![allow(unused_imports)]

mod fixtures;
mod manager;

pub use fixtures::*;
pub use manager::Manager;
