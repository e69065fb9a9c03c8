//! Input/output helpers.
//!
//! - request payload normalization (`ingest`)
//! - `.pptx` package writing (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
