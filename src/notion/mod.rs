//! Notion collaborators.
//!
//! - [`NotionClient`] pages databases and exports page bodies over the REST API
//! - [`blocks`] converts block trees to Markdown

pub mod blocks;
mod client;

pub use client::{DEFAULT_API_BASE, NOTION_VERSION, NotionClient, NotionError};
