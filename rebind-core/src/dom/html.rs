//! Markup parsing and serialization.
//!
//! Parsing goes through `tl`; its node handles are converted into owned
//! `Node` trees. Comments are dropped. Text and attribute values have their
//! character references decoded and whitespace kept, so the tree matches
//! what a browser would build; serialization escapes them again.

use html_escape::{decode_html_entities, encode_double_quoted_attribute, encode_text};
use tracing::trace;

use super::node::{Node, NodeKind};
use crate::error::{ReactiveError, Result};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Parse `markup` into its top-level nodes.
pub fn parse_html(markup: &str) -> Result<Vec<Node>> {
    let dom = tl::parse(markup, tl::ParserOptions::default())
        .map_err(|e| ReactiveError::Parse(format!("{e:?}")))?;
    let parser = dom.parser();

    let nodes: Vec<Node> = dom
        .children()
        .iter()
        .filter_map(|handle| convert(*handle, parser))
        .collect();
    trace!(target: "rebind", count = nodes.len(), "parsed markup");
    Ok(nodes)
}

/// Parse `markup` into a fragment holding its top-level nodes.
pub fn parse_fragment(markup: &str) -> Result<Node> {
    let fragment = Node::fragment();
    for node in parse_html(markup)? {
        fragment.append_child(&node);
    }
    Ok(fragment)
}

fn convert(handle: tl::NodeHandle, parser: &tl::Parser) -> Option<Node> {
    match handle.get(parser)? {
        tl::Node::Tag(tag) => {
            let el = Node::element(&tag.name().as_utf8_str());
            for (key, value) in tag.attributes().iter() {
                let key: &str = key.as_ref();
                let value = value
                    .map(|v| decode_html_entities(&v).into_owned())
                    .unwrap_or_default();
                el.set_attribute(key, value);
            }
            for child in tag.children().top().iter() {
                if let Some(node) = convert(*child, parser) {
                    el.append_child(&node);
                }
            }
            Some(el)
        }
        tl::Node::Raw(bytes) => Some(Node::text(
            decode_html_entities(&bytes.as_utf8_str()).into_owned(),
        )),
        tl::Node::Comment(_) => None,
    }
}

fn write_node(node: &Node, out: &mut String) {
    match node.kind() {
        NodeKind::Text => out.push_str(&encode_text(&node.data())),
        NodeKind::Fragment => {
            for child in node.children() {
                write_node(&child, out);
            }
        }
        NodeKind::Element(tag) => {
            out.push('<');
            out.push_str(tag);
            for (name, value) in node.attributes() {
                out.push(' ');
                out.push_str(&name);
                out.push_str("=\"");
                out.push_str(&encode_double_quoted_attribute(&value));
                out.push('"');
            }
            out.push('>');
            if VOID_ELEMENTS.contains(&tag.as_str()) {
                return;
            }
            for child in node.children() {
                write_node(&child, out);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
}

impl Node {
    /// Serialize this node and its subtree.
    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        write_node(self, &mut out);
        out
    }

    /// Serialize the children of this node.
    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        for child in self.children() {
            write_node(&child, &mut out);
        }
        out
    }

    /// Replace the children of this node with the parsed `markup`.
    pub fn set_inner_html(&self, markup: &str) -> Result<()> {
        let fragment = parse_fragment(markup)?;
        self.clear_children();
        self.append_child(&fragment);
        Ok(())
    }
}
