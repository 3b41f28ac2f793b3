//! carve core library: manifest types and files.
//!
//! - [`types`]: entries, categories, amalgamation settings
//! - [`manifest`]: built-in default, load / save / discover
//! - [`error`]: [`ManifestError`]

pub mod error;
pub mod manifest;
pub mod types;

pub use error::ManifestError;
pub use types::{
    AmalgamationSettings, Category, CategoryKind, CategoryLayout, Manifest, ManifestEntry,
};
