//! Tera rendering engine for generated files.
//!
//! | Template                     | Output                                    |
//! |------------------------------|-------------------------------------------|
//! | `amalgamation/unit.cpp.tera` | aggregate unit under the sources root     |

use tera::Tera;

use crate::context::AggregateContext;
use crate::error::RenderError;

// ---------------------------------------------------------------------------
// Embedded templates
// ---------------------------------------------------------------------------

/// Template name of the aggregate translation unit.
pub const AGGREGATE_TEMPLATE: &str = "amalgamation/unit.cpp.tera";

const TPLS: &[(&str, &str)] = &[(
    AGGREGATE_TEMPLATE,
    include_str!("templates/amalgamation.cpp.tera"),
)];

fn build_tera() -> Result<Tera, RenderError> {
    let mut tera = Tera::default();
    // Generated C++ must never be HTML-escaped, whatever the template name.
    tera.autoescape_on(vec![]);
    tera.add_raw_templates(TPLS.iter().copied())?;
    Ok(tera)
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Tera-based renderer with embedded templates.
///
/// Create once with [`Renderer::new`] and reuse.
pub struct Renderer {
    tera: Tera,
}

impl Renderer {
    pub fn new() -> Result<Self, RenderError> {
        Ok(Renderer { tera: build_tera()? })
    }

    /// Render the aggregate unit: one `#include` line followed by one
    /// `#undef` line per element of `ctx.includes`, and nothing else.
    pub fn render_aggregate(&self, ctx: &AggregateContext) -> Result<String, RenderError> {
        let tera_ctx = ctx.to_tera_context()?;
        Ok(self.tera.render(AGGREGATE_TEMPLATE, &tera_ctx)?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(includes: &[&str]) -> AggregateContext {
        AggregateContext {
            includes: includes.iter().map(|s| s.to_string()).collect(),
            undef_macro: "DEBUG_TYPE".to_string(),
        }
    }

    #[test]
    fn renderer_new_succeeds() {
        Renderer::new().expect("Renderer::new should succeed with embedded templates");
    }

    #[test]
    fn renders_include_undef_pairs_in_order() {
        let renderer = Renderer::new().unwrap();
        let out = renderer
            .render_aggregate(&ctx(&["Support/APInt.cpp", "Support/Path.cpp"]))
            .unwrap();
        assert_eq!(
            out,
            "#include \"Support/APInt.cpp\"\n#undef DEBUG_TYPE\n\
             #include \"Support/Path.cpp\"\n#undef DEBUG_TYPE\n"
        );
    }

    #[test]
    fn empty_include_list_renders_empty_file() {
        let renderer = Renderer::new().unwrap();
        assert_eq!(renderer.render_aggregate(&ctx(&[])).unwrap(), "");
    }

    #[test]
    fn paths_are_not_html_escaped() {
        let renderer = Renderer::new().unwrap();
        let out = renderer.render_aggregate(&ctx(&["a&b/<x>.cpp"])).unwrap();
        assert!(out.starts_with("#include \"a&b/<x>.cpp\"\n"), "got: {out}");
    }
}
