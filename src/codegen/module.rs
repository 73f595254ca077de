use handlebars::Handlebars;
use serde_json::json;

use crate::error::Error;
use crate::model::IconEntry;

const MODULE_TEMPLATE: &str = include_str!("../../templates/icons.rs.hbs");

#[derive(Debug, Clone)]
pub struct ModuleParams<'a> {
    pub class_name: &'a str,
    pub font_name: &'a str,
    /// Indentation width in spaces.
    pub indent: usize,
    /// Icon-set digest recorded for the up-to-date check.
    pub hash: &'a str,
}

/// Render the companion Rust module declaring one constant per icon.
pub fn render_module(params: &ModuleParams, entries: &[IconEntry]) -> Result<String, Error> {
    let icons = entries
        .iter()
        .map(|entry| {
            json!({
                "name": entry.name,
                "codepoint": format!("\\u{{{:04X}}}", entry.codepoint),
            })
        })
        .collect::<Vec<_>>();

    let data = json!({
        "class_name": params.class_name,
        "font_name": params.font_name,
        "icon_hash": params.hash,
        "indent": " ".repeat(params.indent),
        "icons": icons,
    });

    let handlebars = Handlebars::new();
    Ok(handlebars.render_template(MODULE_TEMPLATE, &data)?)
}
