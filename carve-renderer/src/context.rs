//! Serializable payload for the aggregate unit.

use serde::{Deserialize, Serialize};

use carve_core::types::{AmalgamationSettings, ManifestEntry};

use crate::error::RenderError;

/// Rendering payload for `amalgamation/unit.cpp.tera`.
///
/// `includes` is already filtered and ordered; the template emits exactly
/// one `#include` + `#undef` pair per element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateContext {
    /// Include paths, relative to the sources destination root, `/`-separated.
    pub includes: Vec<String>,
    /// Macro undefined after every inclusion.
    pub undef_macro: String,
}

impl AggregateContext {
    /// Build a context from entries that have already passed fragment
    /// filtering.
    pub fn new<'a, I>(included: I, settings: &AmalgamationSettings) -> Self
    where
        I: IntoIterator<Item = &'a ManifestEntry>,
    {
        Self {
            includes: included.into_iter().map(|e| e.0.clone()).collect(),
            undef_macro: settings.undef_macro.clone(),
        }
    }

    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        tera::Context::from_serialize(self).map_err(RenderError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_keeps_order_and_macro() {
        let entries = [ManifestEntry::from("b.cpp"), ManifestEntry::from("a.cpp")];
        let settings = AmalgamationSettings {
            undef_macro: "LOG_TAG".to_string(),
            ..AmalgamationSettings::default()
        };
        let ctx = AggregateContext::new(&entries, &settings);
        assert_eq!(ctx.includes, vec!["b.cpp", "a.cpp"]);
        assert_eq!(ctx.undef_macro, "LOG_TAG");
    }

    #[test]
    fn to_tera_context_succeeds() {
        let none: [ManifestEntry; 0] = [];
        let ctx = AggregateContext::new(&none, &AmalgamationSettings::default());
        let tera_ctx = ctx.to_tera_context().expect("context conversion");
        assert!(tera_ctx.contains_key("includes"));
    }
}
