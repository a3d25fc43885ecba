//! Utility modules

pub mod memory_remote;

pub use memory_remote::*;
