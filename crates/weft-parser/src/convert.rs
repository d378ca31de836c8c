//! Structural-tree converter.
//!
//! Builds an [`Ast`] from a pre-built [`StructuralSchema`] instead of source
//! text. There is no document to point into, so every node it creates spans
//! `0, 0`. Embedded code and styles still go through the script and
//! stylesheet parsers, and their failures are reported against the snippet
//! that failed.

use serde::Deserialize;
use tracing::{debug, instrument};

use crate::ast::{
    AttributeNode, AttributeValue, Ast, Element, Fragment, MustacheTag, OptionsNode, Script,
    ScriptContext, Style, StyleContent, TemplateNode, Text, ValuePart,
};
use crate::error::ParseError;
use crate::options::ParseOptions;
use crate::read::flatten;
use crate::state::OPTIONS_TAG;

/// Input to [`convert`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StructuralSchema {
    pub root: StructuralNode,
    #[serde(default)]
    pub css: Option<String>,
    #[serde(default)]
    pub js: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StructuralNode {
    Element {
        name: String,
        #[serde(default)]
        attributes: Vec<StructuralAttribute>,
        #[serde(default)]
        children: Vec<StructuralNode>,
    },
    /// Expression source, e.g. `count + 1`.
    Expr { value: String },
    Text { value: String },
    /// Control flow. Not converted yet; yields no node.
    Logic {
        #[serde(default)]
        children: Vec<StructuralNode>,
    },
    Options {
        #[serde(default)]
        attributes: Vec<StructuralAttribute>,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StructuralAttribute {
    /// `value` is the handler's expression source.
    Event {
        name: String,
        value: String,
        #[serde(default)]
        modifiers: Vec<String>,
    },
    Attribute { name: String, value: String },
    Binding { name: String, value: String },
}

/// Convert a structural schema into the same tree [`crate::parse`] produces.
///
/// The root fragment always holds an options node first, carrying a `tag`
/// attribute when `options.custom_element` is set and `tag` is given. The
/// stylesheet is always parsed, even when empty, so `css` is always present.
///
/// Element attributes other than event handlers are not converted.
#[instrument(level = "debug", skip_all, fields(tag = ?tag))]
pub fn convert(
    schema: &StructuralSchema,
    tag: Option<&str>,
    options: &ParseOptions,
) -> Result<Ast, ParseError> {
    let converter = Converter {
        filename: options.filename.as_deref(),
    };

    let custom_tag = tag.filter(|_| options.custom_element);
    let mut children = vec![TemplateNode::Options(options_node(custom_tag))];
    if let Some(root) = converter.node(&schema.root)? {
        children.push(root);
    }

    let css = converter.style(schema.css.as_deref().unwrap_or_default())?;
    let module = schema
        .js
        .as_deref()
        .map(|js| converter.script(js))
        .transpose()?;

    debug!(
        children = children.len(),
        module = module.is_some(),
        "converted schema"
    );

    Ok(Ast {
        html: Fragment {
            start: Some(0),
            end: Some(0),
            children,
        },
        css: Some(css),
        instance: None,
        module,
    })
}

fn options_node(tag: Option<&str>) -> OptionsNode {
    let attributes = tag
        .map(|tag| static_attribute("tag", tag))
        .into_iter()
        .collect();

    OptionsNode {
        start: 0,
        end: 0,
        name: OPTIONS_TAG.to_string(),
        attributes,
        children: Vec::new(),
    }
}

fn static_attribute(name: &str, value: &str) -> AttributeNode {
    AttributeNode::Attribute {
        start: 0,
        end: 0,
        name: name.to_string(),
        value: AttributeValue::Parts(vec![ValuePart::Text(text(value))]),
    }
}

fn text(value: &str) -> Text {
    Text {
        start: 0,
        end: 0,
        raw: value.to_string(),
        data: value.to_string(),
    }
}

struct Converter<'a> {
    filename: Option<&'a str>,
}

impl Converter<'_> {
    fn node(&self, node: &StructuralNode) -> Result<Option<TemplateNode>, ParseError> {
        let converted = match node {
            StructuralNode::Element {
                name,
                attributes,
                children,
            } => {
                let attributes = attributes
                    .iter()
                    .filter_map(|attribute| self.attribute(attribute).transpose())
                    .collect::<Result<Vec<_>, _>>()?;

                let mut converted = Vec::with_capacity(children.len());
                for child in children {
                    if let Some(child) = self.node(child)? {
                        converted.push(child);
                    }
                }

                TemplateNode::Element(Element {
                    start: 0,
                    end: 0,
                    name: name.clone(),
                    attributes,
                    children: converted,
                })
            }
            StructuralNode::Expr { value } => TemplateNode::MustacheTag(MustacheTag {
                start: 0,
                end: 0,
                expression: self.expression(value)?,
            }),
            StructuralNode::Text { value } => TemplateNode::Text(text(value)),
            StructuralNode::Options { attributes } => TemplateNode::Options(OptionsNode {
                start: 0,
                end: 0,
                name: OPTIONS_TAG.to_string(),
                attributes: attributes
                    .iter()
                    .filter_map(|attribute| match attribute {
                        StructuralAttribute::Attribute { name, value } => {
                            Some(static_attribute(name, value))
                        }
                        _ => None,
                    })
                    .collect(),
                children: Vec::new(),
            }),
            StructuralNode::Logic { .. } => return Ok(None),
        };

        Ok(Some(converted))
    }

    fn attribute(
        &self,
        attribute: &StructuralAttribute,
    ) -> Result<Option<AttributeNode>, ParseError> {
        match attribute {
            StructuralAttribute::Event {
                name,
                value,
                modifiers,
            } => Ok(Some(AttributeNode::EventHandler {
                start: 0,
                end: 0,
                name: name.clone(),
                modifiers: modifiers.clone(),
                expression: Some(self.expression(value)?),
            })),
            StructuralAttribute::Attribute { .. } | StructuralAttribute::Binding { .. } => Ok(None),
        }
    }

    fn expression(&self, source: &str) -> Result<weft_script::Expression, ParseError> {
        weft_script::parse_expression_at(source, 0)
            .map(|(expression, _)| expression)
            .map_err(|err| ParseError::from_script(&err, source, self.filename))
    }

    fn style(&self, styles: &str) -> Result<Style, ParseError> {
        let sheet = weft_style::parse_stylesheet(styles, 0)
            .map_err(|err| ParseError::from_style(&err, styles, self.filename))?;

        Ok(Style {
            start: 0,
            end: 0,
            attributes: Vec::new(),
            children: flatten(sheet.children),
            content: StyleContent {
                start: 0,
                end: styles.len(),
                styles: styles.to_string(),
            },
        })
    }

    fn script(&self, js: &str) -> Result<Script, ParseError> {
        let content = weft_script::parse_program(js)
            .map_err(|err| ParseError::from_script(&err, js, self.filename))?;

        Ok(Script {
            start: 0,
            end: 0,
            context: ScriptContext::Module,
            content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::StyleNode;
    use crate::error::ErrorCode;
    use pretty_assertions::assert_eq;

    fn schema(json: serde_json::Value) -> StructuralSchema {
        serde_json::from_value(json).unwrap()
    }

    fn custom_element() -> ParseOptions {
        ParseOptions {
            custom_element: true,
            ..ParseOptions::default()
        }
    }

    // =========================================================================
    // Fragment shape
    // =========================================================================

    #[test]
    fn test_text_root_with_custom_tag() {
        let schema = schema(serde_json::json!({
            "root": { "type": "text", "value": "Hello" }
        }));
        let ast = convert(&schema, Some("my-el"), &custom_element()).unwrap();

        assert_eq!(ast.html.start, Some(0));
        assert_eq!(ast.html.children.len(), 2);

        let TemplateNode::Options(options) = &ast.html.children[0] else {
            panic!("Expected Options, got {:?}", ast.html.children[0]);
        };
        assert_eq!(options.attributes, vec![static_attribute("tag", "my-el")]);

        let TemplateNode::Text(text) = &ast.html.children[1] else {
            panic!("Expected Text, got {:?}", ast.html.children[1]);
        };
        assert_eq!(text.data, "Hello");

        let css = ast.css.unwrap();
        assert!(css.children.is_empty());
        assert_eq!(css.content.styles, "");
        assert!(ast.instance.is_none());
        assert!(ast.module.is_none());
    }

    #[test]
    fn test_tag_ignored_without_custom_element() {
        let schema = schema(serde_json::json!({
            "root": { "type": "text", "value": "Hello" }
        }));
        let ast = convert(&schema, Some("my-el"), &ParseOptions::default()).unwrap();
        let TemplateNode::Options(options) = &ast.html.children[0] else {
            panic!("Expected Options");
        };
        assert!(options.attributes.is_empty());
    }

    #[test]
    fn test_logic_root_yields_only_options() {
        let schema = schema(serde_json::json!({
            "root": { "type": "logic", "children": [] }
        }));
        let ast = convert(&schema, None, &ParseOptions::default()).unwrap();
        assert_eq!(ast.html.children.len(), 1);
    }

    // =========================================================================
    // Elements
    // =========================================================================

    #[test]
    fn test_element_keeps_only_event_handlers() {
        let schema = schema(serde_json::json!({
            "root": {
                "type": "element",
                "name": "button",
                "attributes": [
                    { "type": "attribute", "name": "class", "value": "primary" },
                    { "type": "event", "name": "click", "value": "count += 1", "modifiers": ["once"] },
                    { "type": "binding", "name": "value", "value": "name" }
                ],
                "children": [
                    { "type": "expr", "value": "count" },
                    { "type": "logic" },
                    { "type": "text", "value": " clicks" }
                ]
            }
        }));
        let ast = convert(&schema, None, &ParseOptions::default()).unwrap();

        let TemplateNode::Element(button) = &ast.html.children[1] else {
            panic!("Expected Element, got {:?}", ast.html.children[1]);
        };
        assert_eq!(button.name, "button");
        assert_eq!(button.attributes.len(), 1);
        let AttributeNode::EventHandler { name, modifiers, expression, .. } = &button.attributes[0]
        else {
            panic!("Expected EventHandler, got {:?}", button.attributes[0]);
        };
        assert_eq!(name, "click");
        assert_eq!(modifiers, &vec!["once".to_string()]);
        assert_eq!(expression.as_ref().map(|e| e.span.end), Some(10));

        assert_eq!(button.children.len(), 2);
        assert!(matches!(&button.children[0], TemplateNode::MustacheTag(_)));
        assert!(matches!(&button.children[1], TemplateNode::Text(t) if t.data == " clicks"));
    }

    #[test]
    fn test_options_node_keeps_static_attributes() {
        let schema = schema(serde_json::json!({
            "root": {
                "type": "options",
                "attributes": [{ "type": "attribute", "name": "immutable", "value": "true" }]
            }
        }));
        let ast = convert(&schema, None, &ParseOptions::default()).unwrap();
        let TemplateNode::Options(options) = &ast.html.children[1] else {
            panic!("Expected Options, got {:?}", ast.html.children[1]);
        };
        assert_eq!(options.attributes[0].name(), Some("immutable"));
    }

    // =========================================================================
    // Embedded code and styles
    // =========================================================================

    #[test]
    fn test_styles_and_module_script() {
        let schema = schema(serde_json::json!({
            "root": { "type": "text", "value": "x" },
            "css": "p { color: red }",
            "js": "export let count = 0;"
        }));
        let ast = convert(&schema, None, &ParseOptions::default()).unwrap();

        let css = ast.css.unwrap();
        assert_eq!(css.content.end, 16);
        assert!(matches!(
            &css.children[0],
            StyleNode::Rule { prelude, start: 0, end: 16, .. } if prelude == "p"
        ));

        let module = ast.module.unwrap();
        assert_eq!(module.context, ScriptContext::Module);
        assert_eq!(module.content.body.len(), 1);
    }

    #[test]
    fn test_malformed_handler() {
        let schema = schema(serde_json::json!({
            "root": {
                "type": "element",
                "name": "button",
                "attributes": [{ "type": "event", "name": "click", "value": "count +" }]
            }
        }));
        let options = ParseOptions {
            filename: Some("App.weft".into()),
            ..ParseOptions::default()
        };
        let err = convert(&schema, None, &options).unwrap_err();
        assert_eq!(err.code, ErrorCode::ParseError);
        assert_eq!(err.source_text, "count +");
        assert_eq!(err.start, 7);
        assert_eq!(err.filename.as_deref(), Some("App.weft"));
    }

    #[test]
    fn test_malformed_program() {
        let schema = schema(serde_json::json!({
            "root": { "type": "text", "value": "x" },
            "js": "let = 1;"
        }));
        let err = convert(&schema, None, &ParseOptions::default()).unwrap_err();
        assert_eq!(err.code, ErrorCode::ParseError);
    }

    #[test]
    fn test_malformed_stylesheet() {
        let schema = schema(serde_json::json!({
            "root": { "type": "text", "value": "x" },
            "css": "{ color: red }"
        }));
        let err = convert(&schema, None, &ParseOptions::default()).unwrap_err();
        assert_eq!(err.code, ErrorCode::CssSyntaxError);
    }
}
