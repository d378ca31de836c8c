use memchr::memchr2;

use crate::ast::{TemplateNode, Text};
use crate::entities::decode_character_references;
use crate::parser::Parser;

/// Read literal text up to the next tag or mustache.
pub fn text(parser: &mut Parser<'_>) {
    let start = parser.index;
    let rest = parser.rest();
    let len = memchr2(b'<', b'{', rest.as_bytes()).unwrap_or(rest.len());
    let raw = &rest[..len];
    parser.index += len;

    parser.stack.push(TemplateNode::Text(Text {
        start,
        end: parser.index,
        raw: raw.to_string(),
        data: decode_character_references(raw).into_owned(),
    }));
}

#[cfg(test)]
mod tests {
    use crate::ast::TemplateNode;
    use crate::options::ParseOptions;
    use crate::parse;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_text_span_and_decoding() {
        let ast = parse("Tom &amp; Jerry", &ParseOptions::default()).unwrap();
        let TemplateNode::Text(text) = &ast.html.children[0] else {
            panic!("Expected Text, got {:?}", ast.html.children[0]);
        };
        assert_eq!((text.start, text.end), (0, 15));
        assert_eq!(text.raw, "Tom &amp; Jerry");
        assert_eq!(text.data, "Tom & Jerry");
    }

    #[test]
    fn test_text_stops_at_tag_and_mustache() {
        let ast = parse("a<b>c</b>d{e}", &ParseOptions::default()).unwrap();
        let kinds: Vec<_> = ast
            .html
            .children
            .iter()
            .map(|node| match node {
                TemplateNode::Text(_) => "Text",
                TemplateNode::Element(_) => "Element",
                TemplateNode::MustacheTag(_) => "MustacheTag",
                _ => "other",
            })
            .collect();
        assert_eq!(kinds, ["Text", "Element", "Text", "MustacheTag"]);
    }
}
