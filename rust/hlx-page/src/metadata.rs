//! Document metadata
//!
//! Reads `<meta>` tags from the head. Names containing `:` (Open Graph style)
//! are looked up by `property`, everything else by `name`.

use hlx_dom::{Document, NodeId};

use crate::block::to_class_name;

/// Content of the `<meta>` tag for `name`
pub fn get_metadata(doc: &Document, name: &str) -> Option<String> {
    if name.is_empty() {
        return None;
    }
    let attr = if name.contains(':') { "property" } else { "name" };
    let head = doc.head()?;
    doc.descendants(head)
        .into_iter()
        .find(|&node| doc.is_tag(node, "meta") && doc.attribute(node, attr) == Some(name))
        .and_then(|meta| doc.attribute(meta, "content"))
        .map(str::to_string)
}

/// Add `<template>-template` to the body when the page declares a template
pub fn set_template(doc: &mut Document) -> Option<NodeId> {
    let template = get_metadata(doc, "template")?;
    let class = to_class_name(&template);
    if class.is_empty() {
        return None;
    }
    let body = doc.ensure_body();
    doc.add_class(body, &format!("{class}-template"));
    Some(body)
}
