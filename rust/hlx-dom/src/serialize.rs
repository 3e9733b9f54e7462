//! HTML serialization
//!
//! Writes the arena tree back to markup. Text and attribute values are
//! escaped with `html-escape`; the contents of raw text elements such as
//! `script` and `style` are written as they are.

use std::fmt::Write;

use crate::node::{is_void_element, Document, NodeId, NodeKind};

const RAW_TEXT_ELEMENTS: &[&str] = &["iframe", "noembed", "noframes", "script", "style", "xmp"];

impl Document {
    /// Serialize `id` including its own tag (`Element.outerHTML`)
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, false, &mut out);
        out
    }

    /// Serialize the children of `id` (`Element.innerHTML`)
    pub fn inner_html(&self, id: NodeId) -> String {
        let raw = self
            .tag_name(id)
            .is_some_and(|tag| RAW_TEXT_ELEMENTS.contains(&tag));
        let mut out = String::new();
        for &child in self.children(id) {
            self.write_node(child, raw, &mut out);
        }
        out
    }

    /// Serialize the whole document
    pub fn to_html(&self) -> String {
        self.inner_html(self.root())
    }

    fn write_node(&self, id: NodeId, raw_text: bool, out: &mut String) {
        match self.kind(id) {
            Some(NodeKind::Document) => out.push_str(&self.inner_html(id)),
            Some(NodeKind::Text) => {
                let text = self.data(id).unwrap_or_default();
                if raw_text {
                    out.push_str(text);
                } else {
                    out.push_str(&html_escape::encode_text(text));
                }
            }
            Some(NodeKind::Comment) => {
                let _ = write!(out, "<!--{}-->", self.data(id).unwrap_or_default());
            }
            Some(NodeKind::Doctype) => {
                let _ = write!(out, "<!DOCTYPE {}>", self.doctype_name(id).unwrap_or_default());
            }
            Some(NodeKind::Element) => {
                let tag = self.tag_name(id).unwrap_or_default();
                out.push('<');
                out.push_str(tag);
                for attr in self.attributes(id) {
                    let _ = write!(
                        out,
                        " {}=\"{}\"",
                        attr.name,
                        html_escape::encode_double_quoted_attribute(&attr.value)
                    );
                }
                out.push('>');
                if is_void_element(tag) {
                    return;
                }
                out.push_str(&self.inner_html(id));
                let _ = write!(out, "</{}>", tag);
            }
            None => {}
        }
    }
}
