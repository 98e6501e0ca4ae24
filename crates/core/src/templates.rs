//! Tag template rendering.
//!
//! The tracker hands a template name and a JSON context to a [`Renderer`]
//! and treats the result as opaque markup. [`TemplateRenderer`] is the
//! built-in registry renderer with a small `{{variable}}` syntax:
//!
//! - `{{path}}`: dotted lookup; strings are written raw, anything else as
//!   compact JSON. Unresolved paths render nothing.
//! - `{{path|json}}`: always JSON-encoded (strings are quoted and escaped).
//! - `{{#each path}}...{{/each}}`: repeats the body for every array
//!   element, with `{{this}}` / `{{this.field}}` bound to the element.
//!
//! JSON output is made safe for inline `<script>` blocks: `<`, `>` and `&`
//! are written as `\u` escapes so a value cannot close the tag.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::{TrackingError, TrackingResult};

/// Rendering capability consumed by trackers.
pub trait Renderer: Send + Sync {
    fn render(&self, template: &str, context: &Value) -> TrackingResult<String>;
}

/// Registry of named templates.
pub struct TemplateRenderer {
    templates: HashMap<String, String>,
}

impl TemplateRenderer {
    pub fn new() -> Self {
        Self {
            templates: HashMap::new(),
        }
    }

    /// Renderer preloaded with analytics.js Enhanced Ecommerce templates,
    /// registered as `{prefix}/{name}.js`.
    pub fn enhanced_ecommerce(prefix: &str) -> Self {
        let mut renderer = Self::new();
        for (name, body) in ENHANCED_ECOMMERCE_TEMPLATES {
            renderer.register_template(format!("{prefix}/{name}.js"), *body);
        }
        renderer
    }

    pub fn register_template(&mut self, name: impl Into<String>, body: impl Into<String>) {
        self.templates.insert(name.into(), body.into());
    }

    pub fn with_template(mut self, name: impl Into<String>, body: impl Into<String>) -> Self {
        self.register_template(name, body);
        self
    }

    pub fn get_template(&self, name: &str) -> Option<&str> {
        self.templates.get(name).map(String::as_str)
    }

    pub fn list_templates(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn render_segment<'a>(
        name: &str,
        source: &str,
        scopes: &mut Vec<&'a Value>,
        out: &mut String,
    ) -> TrackingResult<()> {
        let mut rest = source;
        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after
                .find("}}")
                .ok_or_else(|| template_error(name, "unterminated tag"))?;
            let tag = after[..end].trim();
            rest = &after[end + 2..];

            if let Some(path) = tag.strip_prefix("#each ") {
                let (body, remainder) = split_each_block(rest)
                    .ok_or_else(|| template_error(name, "missing {{/each}}"))?;
                rest = remainder;
                if let Some(Value::Array(items)) = lookup(scopes, path.trim()) {
                    for item in items {
                        scopes.push(item);
                        Self::render_segment(name, body, scopes, out)?;
                        scopes.pop();
                    }
                }
            } else if tag == "/each" {
                return Err(template_error(name, "unexpected {{/each}}"));
            } else {
                let (path, as_json) = match tag.strip_suffix("|json") {
                    Some(path) => (path.trim(), true),
                    None => (tag, false),
                };
                if let Some(value) = lookup(scopes, path) {
                    write_value(value, as_json, out)?;
                }
            }
        }
        out.push_str(rest);
        Ok(())
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for TemplateRenderer {
    fn render(&self, template: &str, context: &Value) -> TrackingResult<String> {
        let source = self
            .templates
            .get(template)
            .ok_or_else(|| TrackingError::TemplateNotFound(template.to_string()))?;

        let mut out = String::with_capacity(source.len());
        let mut scopes = vec![context];
        Self::render_segment(template, source, &mut scopes, &mut out)?;
        Ok(out)
    }
}

const ENHANCED_ECOMMERCE_TEMPLATES: &[(&str, &str)] = &[
    (
        "dependencies",
        "{{#each dependencies}}ga('require', {{this|json}});\n{{/each}}ga('set', 'currencyCode', {{currency|json}});\n",
    ),
    (
        "product_view",
        "ga('ec:addProduct', {{productData|json}});\nga('ec:setAction', 'detail');\n",
    ),
    (
        "product_impression",
        "ga('ec:addImpression', {{productData|json}});\n",
    ),
    (
        "product_action",
        "ga('ec:addProduct', {{productData|json}});\nga('ec:setAction', {{action|json}});\n",
    ),
    (
        "checkout",
        "{{#each items}}ga('ec:addProduct', {{this|json}});\n{{/each}}ga('ec:setAction', 'checkout', {{actionData|json}});\n",
    ),
    (
        "checkout_complete",
        "{{#each calls}}ga('ec:addProduct', {{this|json}});\n{{/each}}ga('ec:setAction', 'purchase', {{order|json}});\n",
    ),
];

fn template_error(template: &str, message: &str) -> TrackingError {
    TrackingError::Template {
        template: template.to_string(),
        message: message.to_string(),
    }
}

/// Find the body of an `{{#each}}` block and the text after its closing tag.
fn split_each_block(source: &str) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    let mut offset = 0;
    while let Some(rel) = source[offset..].find("{{") {
        let start = offset + rel;
        let close = source[start + 2..].find("}}")? + start + 2;
        let tag = source[start + 2..close].trim();
        offset = close + 2;

        if tag.starts_with("#each ") {
            depth += 1;
        } else if tag == "/each" {
            if depth == 0 {
                return Some((&source[..start], &source[offset..]));
            }
            depth -= 1;
        }
    }
    None
}

fn lookup<'a>(scopes: &[&'a Value], path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let head = segments.next()?;
    let base: &'a Value = if head == "this" {
        scopes.last().copied()?
    } else {
        scopes.iter().rev().find_map(|scope| {
            let scope: &'a Value = *scope;
            scope.get(head)
        })?
    };
    segments.try_fold(base, |value, key| match value {
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => value.get(key),
    })
}

fn write_value(value: &Value, as_json: bool, out: &mut String) -> TrackingResult<()> {
    match value {
        Value::String(s) if !as_json => out.push_str(s),
        Value::Null if !as_json => {}
        _ => out.push_str(&escape_script_json(&serde_json::to_string(value)?)),
    }
    Ok(())
}

/// Escape serialized JSON for embedding in an inline `<script>`. The
/// replaced characters only occur inside string literals, where the `\u`
/// forms decode to the same value.
pub fn escape_script_json(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        match c {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_substitution() {
        let renderer = TemplateRenderer::new().with_template("greet", "Hello {{ name }}, {{count}}!");
        let out = renderer
            .render("greet", &json!({"name": "Ada", "count": 3}))
            .unwrap();
        assert_eq!(out, "Hello Ada, 3!");
    }

    #[test]
    fn test_json_filter_and_missing_values() {
        let renderer = TemplateRenderer::new().with_template("t", "[{{label|json}}][{{absent}}][{{obj}}]");
        let out = renderer
            .render("t", &json!({"label": "it's", "obj": {"a": 1}}))
            .unwrap();
        assert_eq!(out, r#"["it's"][][{"a":1}]"#);
    }

    #[test]
    fn test_json_output_cannot_close_script_tag() {
        let renderer = TemplateRenderer::enhanced_ecommerce("analytics/enhanced");
        let name = "</script><script>alert(1)</script>";
        let out = renderer
            .render(
                "analytics/enhanced/product_impression.js",
                &json!({"productData": {"id": 1, "name": name, "brand": "Tom & Jerry"}}),
            )
            .unwrap();

        assert!(!out.contains('<'));
        assert!(!out.contains('>'));
        assert!(out.contains(r#""name":"\u003c/script\u003e\u003cscript\u003ealert(1)\u003c/script\u003e""#));

        let payload = out
            .trim_end()
            .strip_prefix("ga('ec:addImpression', ")
            .and_then(|rest| rest.strip_suffix(");"))
            .unwrap();
        let decoded: Value = serde_json::from_str(payload).unwrap();
        assert_eq!(decoded["name"], name);
        assert_eq!(decoded["brand"], "Tom & Jerry");
    }

    #[test]
    fn test_escape_script_json() {
        assert_eq!(escape_script_json(r#"{"a":"x"}"#), r#"{"a":"x"}"#);
        assert_eq!(escape_script_json(r#""<b>&""#), r#""\u003cb\u003e\u0026""#);
        assert_eq!(escape_script_json("\"\u{2028}\""), r#""\u2028""#);
    }

    #[test]
    fn test_each_block() {
        let renderer = TemplateRenderer::new()
            .with_template("list", "{{#each items}}<{{this.id}}:{{currency}}>{{/each}}done");
        let out = renderer
            .render(
                "list",
                &json!({"currency": "EUR", "items": [{"id": 1}, {"id": 2, "currency": "USD"}]}),
            )
            .unwrap();
        assert_eq!(out, "<1:EUR><2:USD>done");
    }

    #[test]
    fn test_nested_each_block() {
        let renderer = TemplateRenderer::new()
            .with_template("grid", "{{#each rows}}[{{#each this}}{{this}}{{/each}}]{{/each}}");
        let out = renderer
            .render("grid", &json!({"rows": [[1, 2], [3]]}))
            .unwrap();
        assert_eq!(out, "[12][3]");
    }

    #[test]
    fn test_unknown_template() {
        let renderer = TemplateRenderer::new();
        let err = renderer.render("missing.js", &json!({})).unwrap_err();
        assert!(matches!(err, TrackingError::TemplateNotFound(name) if name == "missing.js"));
    }

    #[test]
    fn test_unbalanced_blocks() {
        let renderer = TemplateRenderer::new()
            .with_template("open", "{{#each items}}x")
            .with_template("close", "x{{/each}}")
            .with_template("tag", "x{{oops");
        for name in ["open", "close", "tag"] {
            let err = renderer.render(name, &json!({"items": []})).unwrap_err();
            assert!(matches!(err, TrackingError::Template { .. }), "{name}");
        }
    }

    #[test]
    fn test_enhanced_ecommerce_defaults() {
        let renderer = TemplateRenderer::enhanced_ecommerce("analytics/enhanced");
        assert_eq!(renderer.list_templates().len(), 6);
        assert!(renderer
            .get_template("analytics/enhanced/checkout_complete.js")
            .is_some());

        let out = renderer
            .render(
                "analytics/enhanced/dependencies.js",
                &json!({"dependencies": ["ec"], "currency": "EUR"}),
            )
            .unwrap();
        assert_eq!(
            out,
            "ga('require', \"ec\");\nga('set', 'currencyCode', \"EUR\");\n"
        );
    }
}
