use handlebars::Handlebars;
use once_cell::sync::Lazy;
use serde_json::Value;

static REGISTRY: Lazy<Handlebars<'static>> = Lazy::new(|| {
    let mut hb = Handlebars::new();
    hb.set_strict_mode(true); // fail if a variable is missing
    hb.register_template_string("generate", include_str!("generate.hbs"))
        .expect("generate template is valid");
    hb.register_template_string("content_adoption", include_str!("content_adoption.hbs"))
        .expect("content_adoption template is valid");
    hb.register_template_string("refine", include_str!("refine.hbs"))
        .expect("refine template is valid");
    hb
});

/// Render a prompt by name using Handlebars.
///
/// Usage:
///     render("generate", &json!({"source": "UI design image", ...}))
///
pub fn render(name: &str, ctx: &Value) -> anyhow::Result<String> {
    REGISTRY
        .render(name, ctx)
        .map_err(|e| anyhow::anyhow!("rendering prompt '{name}' failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_template_is_an_error() {
        assert!(render("nope", &json!({})).is_err());
    }

    #[test]
    fn strict_mode_rejects_missing_variables() {
        assert!(render("refine", &json!({})).is_err());
    }
}
