//! Network data sources.

pub mod images;

pub use images::*;
