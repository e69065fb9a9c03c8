//! Domain types used throughout the render pipeline.
//!
//! This module defines:
//!
//! - the normalized report model (`Report`, `ChannelData`, `Story`, `FieldValue`)
//! - chart references and their classification (`ChartReference`, `ChartKind`)
//! - the immutable render configuration (`DeckConfig`, `Theme`)

pub mod config;
pub mod types;

pub use config::*;
pub use types::*;
