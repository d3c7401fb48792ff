//! nsync - incremental Notion database to Markdown sync
//!
//! This crate provides the core functionality for the `nsync` CLI tool.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`model`] - Record and metadata types
//! - [`sync`] - Offsets, change detection, extraction, rendering, the run driver
//! - [`notion`] - Notion API client and block-to-Markdown export
//! - [`config`] - Configuration management
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod notion;
pub mod sync;

pub use error::{Error, Result};
