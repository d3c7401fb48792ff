//! Data models for notionsync.
//!
//! This module contains the domain models shared by the sync engine and the
//! Notion collaborators:
//! - RawRecord (a database page as returned by the API)
//! - PropertyValue, Cover, RichText (typed property bag)
//! - NormalizedMetadata (front-matter fields)

pub mod metadata;
pub mod record;

pub use metadata::NormalizedMetadata;
pub use record::{
    Annotations, Cover, DateValue, PropertyKind, PropertyValue, RawRecord, RichText, SelectOption,
};
