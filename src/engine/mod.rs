//! Engine module containing classification, merging, and the run orchestrator

pub mod classify;
pub mod core;
pub mod merge;

pub use classify::*;
pub use core::*;
pub use merge::*;
