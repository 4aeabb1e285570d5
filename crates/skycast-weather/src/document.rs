//! XML tree building that keeps qualified attribute names.
//!
//! `xmltree` keys attributes by local name only, which turns met.no's
//! `xsi:noNamespaceSchemaLocation` into a bare `noNamespaceSchemaLocation`
//! and lets same-named attributes under different prefixes collide. Here the
//! tree is built straight from `xml-rs` events with each attribute keyed by
//! its `prefix:local` form, which `Element::write` emits verbatim.

use xml::attribute::OwnedAttribute;
use xml::name::OwnedName;
use xml::namespace::Namespace;
use xml::reader::{EventReader, ParserConfig, XmlEvent};
use xmltree::{Element, XMLNode};

/// Parse `xml` into its root element.
pub(crate) fn parse_document(xml: &str) -> Result<Element, String> {
    let config = ParserConfig::new().ignore_comments(false);
    let mut reader = EventReader::new_with_config(xml.as_bytes(), config);
    let mut open: Vec<Element> = Vec::new();

    loop {
        match reader.next().map_err(|e| e.to_string())? {
            XmlEvent::StartElement {
                name,
                attributes,
                namespace,
            } => open.push(element(name, attributes, namespace)),
            XmlEvent::EndElement { .. } => {
                let done = open.pop().ok_or("Unbalanced closing tag")?;
                match open.last_mut() {
                    Some(parent) => parent.children.push(XMLNode::Element(done)),
                    None => return Ok(done),
                }
            }
            XmlEvent::Characters(text) => push_child(&mut open, XMLNode::Text(text)),
            XmlEvent::CData(text) => push_child(&mut open, XMLNode::CData(text)),
            XmlEvent::Comment(text) => push_child(&mut open, XMLNode::Comment(text)),
            XmlEvent::ProcessingInstruction { name, data } => {
                push_child(&mut open, XMLNode::ProcessingInstruction(name, data))
            }
            XmlEvent::EndDocument => return Err("Document has no root element".to_string()),
            XmlEvent::StartDocument { .. } | XmlEvent::Whitespace(_) => {}
        }
    }
}

fn element(name: OwnedName, attributes: Vec<OwnedAttribute>, namespace: Namespace) -> Element {
    let mut elem = Element::new(&name.local_name);
    elem.prefix = name.prefix;
    elem.namespace = name.namespace;
    if !namespace.is_essentially_empty() {
        elem.namespaces = Some(namespace);
    }
    for attr in attributes {
        elem.attributes.insert(attr.name.borrow().to_repr(), attr.value);
    }
    elem
}

// Prolog comments and processing instructions have no parent and are dropped.
fn push_child(open: &mut [Element], node: XMLNode) {
    if let Some(parent) = open.last_mut() {
        parent.children.push(node);
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_prefixed_attribute_keeps_prefix() {
        let root = parse_document(
            r#"<weatherdata xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:noNamespaceSchemaLocation="http://schema.api.met.no/schemas/weatherapi-0.4.xsd" created="2026-10-19T10:00:00Z"/>"#,
        )
        .unwrap();
        assert_eq!(
            root.attributes.get("xsi:noNamespaceSchemaLocation").map(String::as_str),
            Some("http://schema.api.met.no/schemas/weatherapi-0.4.xsd")
        );
        assert!(!root.attributes.contains_key("noNamespaceSchemaLocation"));
        assert_eq!(root.attributes.get("created").map(String::as_str), Some("2026-10-19T10:00:00Z"));
    }

    #[test]
    fn test_same_local_name_under_two_prefixes() {
        let root = parse_document(
            r#"<root xmlns:a="urn:a" xmlns:b="urn:b" a:id="1" b:id="2"/>"#,
        )
        .unwrap();
        assert_eq!(root.attributes.get("a:id").map(String::as_str), Some("1"));
        assert_eq!(root.attributes.get("b:id").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_nested_content() {
        let root = parse_document(
            "<weatherdata><!-- note --><product class=\"pointData\">text<time/></product></weatherdata>",
        )
        .unwrap();
        assert_eq!(root.name, "weatherdata");
        assert!(matches!(&root.children[0], XMLNode::Comment(c) if c == " note "));
        let product = root.get_child("product").unwrap();
        assert_eq!(product.attributes.get("class").map(String::as_str), Some("pointData"));
        assert!(matches!(&product.children[0], XMLNode::Text(t) if t == "text"));
        assert!(product.get_child("time").is_some());
    }

    #[test]
    fn test_malformed_is_error() {
        assert!(parse_document("<weatherdata><product>").is_err());
        assert!(parse_document("").is_err());
    }
}
