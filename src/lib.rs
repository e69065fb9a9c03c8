//! `media-deck` library crate.
//!
//! The binary (`media-deck`) is a thin wrapper around this library so that
//! the render pipeline is testable without spawning processes or servers.
//!
//! - `io::ingest` normalizes the request JSON into a `domain::Report`
//! - `report` plans and builds slides into a `deck::Deck`
//! - `data` fetches chart and logo images
//! - `io::export` writes the `.pptx` package
//! - `server` and `cli` are the two front-ends

pub mod app;
pub mod cli;
pub mod data;
pub mod deck;
pub mod domain;
pub mod error;
pub mod io;
pub mod report;
pub mod server;
