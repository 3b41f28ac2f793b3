//! # carve-renderer
//!
//! Tera-based rendering of carve's generated files.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use carve_core::types::{AmalgamationSettings, ManifestEntry};
//! use carve_renderer::{AggregateContext, Renderer};
//!
//! fn render(entries: &[ManifestEntry]) {
//!     let ctx = AggregateContext::new(entries, &AmalgamationSettings::default());
//!     if let Ok(renderer) = Renderer::new() {
//!         if let Ok(unit) = renderer.render_aggregate(&ctx) {
//!             print!("{unit}");
//!         }
//!     }
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;

pub use context::AggregateContext;
pub use engine::Renderer;
pub use error::RenderError;
