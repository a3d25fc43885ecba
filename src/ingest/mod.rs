//! Ingest module containing the vendor ledger parser

pub mod parser;

pub use parser::*;
