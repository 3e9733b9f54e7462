//! Arena DOM primitives
//!
//! This module defines the node table backing a [`Document`]:
//! - Nodes are stored in Structure of Arrays (SoA) form
//! - Nodes are addressed by 1-indexed [`NodeId`]s (0 = none)
//! - The document node is always `NodeId(1)`
//!
//! Nodes are never freed. Removing a node detaches it from its parent and
//! leaves it in the table, so stale ids stay valid for the lifetime of the
//! document.

use crate::error::DomError;

/// Node identifier (1-indexed, 0 = invalid/none)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const NONE: NodeId = NodeId(0);

    pub fn is_valid(self) -> bool {
        self.0 != 0
    }

    fn index(self) -> usize {
        self.0 as usize - 1
    }
}

/// Node kind
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element,
    Text,
    Comment,
    Doctype,
}

/// A single element attribute
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// Elements that never have children or an end tag
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// Document tree stored as a node table
#[derive(Clone, Debug)]
pub struct Document {
    /// Node kinds
    kinds: Vec<NodeKind>,
    /// Lowercase tag names, doctype names for doctype nodes
    names: Vec<String>,
    /// Element attributes in source order
    attrs: Vec<Vec<Attribute>>,
    /// Character data for text and comment nodes
    texts: Vec<String>,
    /// Parent node ids (NONE = detached or document)
    parents: Vec<NodeId>,
    /// Ordered child ids
    children: Vec<Vec<NodeId>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document containing only the document node
    pub fn new() -> Self {
        let mut doc = Self {
            kinds: Vec::new(),
            names: Vec::new(),
            attrs: Vec::new(),
            texts: Vec::new(),
            parents: Vec::new(),
            children: Vec::new(),
        };
        doc.push_node(NodeKind::Document, String::new(), String::new());
        doc
    }

    /// The document node
    pub fn root(&self) -> NodeId {
        NodeId(1)
    }

    fn push_node(&mut self, kind: NodeKind, name: String, text: String) -> NodeId {
        let id = NodeId(self.kinds.len() as u32 + 1);
        self.kinds.push(kind);
        self.names.push(name);
        self.attrs.push(Vec::new());
        self.texts.push(text);
        self.parents.push(NodeId::NONE);
        self.children.push(Vec::new());
        id
    }

    fn contains(&self, id: NodeId) -> bool {
        id.is_valid() && id.index() < self.kinds.len()
    }

    fn check(&self, id: NodeId) -> Result<(), DomError> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(DomError::InvalidNode(id))
        }
    }

    // ------------------------------------------------------------------
    // Creation
    // ------------------------------------------------------------------

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push_node(NodeKind::Element, tag.to_ascii_lowercase(), String::new())
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push_node(NodeKind::Text, String::new(), text.to_string())
    }

    /// Create a detached comment node
    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push_node(NodeKind::Comment, String::new(), text.to_string())
    }

    /// Create a detached `<!DOCTYPE name>` node
    pub fn create_doctype(&mut self, name: &str) -> NodeId {
        self.push_node(NodeKind::Doctype, name.to_ascii_lowercase(), String::new())
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.contains(id).then(|| self.kinds[id.index()])
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.kind(id) == Some(NodeKind::Element)
    }

    /// Lowercase tag name of an element
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        if self.is_element(id) {
            Some(&self.names[id.index()])
        } else {
            None
        }
    }

    /// Check whether `id` is an element with the given tag
    pub fn is_tag(&self, id: NodeId, tag: &str) -> bool {
        self.tag_name(id).is_some_and(|name| name.eq_ignore_ascii_case(tag))
    }

    pub fn doctype_name(&self, id: NodeId) -> Option<&str> {
        (self.kind(id)? == NodeKind::Doctype).then(|| self.names[id.index()].as_str())
    }

    /// Character data of a text or comment node
    pub fn data(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Text | NodeKind::Comment => Some(&self.texts[id.index()]),
            _ => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        if !self.contains(id) {
            return None;
        }
        let parent = self.parents[id.index()];
        parent.is_valid().then_some(parent)
    }

    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|&parent| self.is_element(parent))
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        if self.contains(id) {
            &self.children[id.index()]
        } else {
            &[]
        }
    }

    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&child| self.is_element(child))
            .collect()
    }

    pub fn first_element_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).iter().copied().find(|&child| self.is_element(child))
    }

    pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let position = siblings.iter().position(|&sibling| sibling == id)?;
        siblings[position + 1..]
            .iter()
            .copied()
            .find(|&sibling| self.is_element(sibling))
    }

    pub fn previous_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let position = siblings.iter().position(|&sibling| sibling == id)?;
        siblings[..position]
            .iter()
            .rev()
            .copied()
            .find(|&sibling| self.is_element(sibling))
    }

    /// Iterate over the ancestors of `id`, nearest first
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.parent(id),
        }
    }

    /// All descendants of `id` in document order, excluding `id`
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// True if `ancestor` is `node` or one of its ancestors
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        node == ancestor || self.ancestors(node).any(|a| a == ancestor)
    }

    /// True if `id` is reachable from the document node
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.is_inclusive_ancestor(self.root(), id)
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    pub fn attributes(&self, id: NodeId) -> &[Attribute] {
        if self.contains(id) {
            &self.attrs[id.index()]
        } else {
            &[]
        }
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|attr| attr.name.eq_ignore_ascii_case(name))
            .map(|attr| attr.value.as_str())
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.attribute(id, name).is_some()
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        if !self.is_element(id) {
            return;
        }
        let attrs = &mut self.attrs[id.index()];
        match attrs.iter_mut().find(|attr| attr.name.eq_ignore_ascii_case(name)) {
            Some(attr) => attr.value = value.to_string(),
            None => attrs.push(Attribute {
                name: name.to_ascii_lowercase(),
                value: value.to_string(),
            }),
        }
    }

    // ------------------------------------------------------------------
    // Class list
    // ------------------------------------------------------------------

    /// Class tokens in attribute order
    pub fn classes(&self, id: NodeId) -> Vec<&str> {
        self.attribute(id, "class")
            .map(|value| value.split_ascii_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.classes(id).contains(&class)
    }

    /// Append class tokens that are not present yet
    pub fn add_classes<I, S>(&mut self, id: NodeId, classes: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tokens: Vec<String> = self.classes(id).into_iter().map(str::to_string).collect();
        for class in classes {
            for token in class.as_ref().split_ascii_whitespace() {
                if !tokens.iter().any(|existing| existing == token) {
                    tokens.push(token.to_string());
                }
            }
        }
        self.set_attribute(id, "class", &tokens.join(" "));
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        self.add_classes(id, [class]);
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        if !self.has_class(id, class) {
            return;
        }
        let remaining: Vec<&str> = self
            .classes(id)
            .into_iter()
            .filter(|token| *token != class)
            .collect();
        let value = remaining.join(" ");
        self.set_attribute(id, "class", &value);
    }

    /// Replace the whole class attribute
    pub fn set_class_name(&mut self, id: NodeId, class_name: &str) {
        self.set_attribute(id, "class", class_name);
    }

    // ------------------------------------------------------------------
    // Text
    // ------------------------------------------------------------------

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(NodeKind::Text | NodeKind::Comment) = self.kind(id) {
            return self.texts[id.index()].clone();
        }
        self.descendants(id)
            .into_iter()
            .filter(|&node| self.kind(node) == Some(NodeKind::Text))
            .map(|node| self.texts[node.index()].as_str())
            .collect()
    }

    /// Replace all children with a single text node (none for empty text)
    pub fn set_text_content(&mut self, id: NodeId, text: &str) {
        match self.kind(id) {
            Some(NodeKind::Text | NodeKind::Comment) => {
                self.texts[id.index()] = text.to_string();
            }
            Some(NodeKind::Document | NodeKind::Element) => {
                for child in std::mem::take(&mut self.children[id.index()]) {
                    self.parents[child.index()] = NodeId::NONE;
                }
                if !text.is_empty() {
                    let node = self.create_text(text);
                    self.attach(id, node, None);
                }
            }
            Some(NodeKind::Doctype) | None => {}
        }
    }

    /// Append to the last child if it is a text node, else add a new one
    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        if !self.contains(parent) {
            return;
        }
        if let Some(&last) = self.children[parent.index()].last() {
            if self.kinds[last.index()] == NodeKind::Text {
                self.texts[last.index()].push_str(text);
                return;
            }
        }
        let node = self.create_text(text);
        self.attach(parent, node, None);
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    fn check_insert(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.check(parent)?;
        self.check(child)?;
        if matches!(self.kinds[parent.index()], NodeKind::Text | NodeKind::Comment) {
            return Err(DomError::HierarchyRequest {
                parent,
                child,
                reason: "character data cannot have children",
            });
        }
        if self.kinds[parent.index()] == NodeKind::Doctype {
            return Err(DomError::HierarchyRequest {
                parent,
                child,
                reason: "a doctype cannot have children",
            });
        }
        if child == self.root() {
            return Err(DomError::HierarchyRequest {
                parent,
                child,
                reason: "the document node cannot be moved",
            });
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest {
                parent,
                child,
                reason: "a node cannot be inserted into itself",
            });
        }
        Ok(())
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.parent(id) {
            self.children[parent.index()].retain(|&child| child != id);
            self.parents[id.index()] = NodeId::NONE;
        }
    }

    fn attach(&mut self, parent: NodeId, child: NodeId, position: Option<usize>) {
        let siblings = &mut self.children[parent.index()];
        match position {
            Some(position) if position <= siblings.len() => siblings.insert(position, child),
            _ => siblings.push(child),
        }
        self.parents[child.index()] = parent;
    }

    /// Append `child` as the last child of `parent`, moving it if attached
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.check_insert(parent, child)?;
        self.detach(child);
        self.attach(parent, child, None);
        Ok(())
    }

    /// Insert `child` into `parent` right before `reference`
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: NodeId,
    ) -> Result<(), DomError> {
        self.check_insert(parent, child)?;
        if self.parent(reference) != Some(parent) {
            return Err(DomError::HierarchyRequest {
                parent,
                child,
                reason: "reference node is not a child of parent",
            });
        }
        if child == reference {
            return Ok(());
        }
        self.detach(child);
        let position = self.children[parent.index()]
            .iter()
            .position(|&sibling| sibling == reference);
        self.attach(parent, child, position);
        Ok(())
    }

    /// Insert `node` right after `reference` (`insertAdjacentElement('afterend')`)
    pub fn insert_after(&mut self, reference: NodeId, node: NodeId) -> Result<(), DomError> {
        let parent = self.parent(reference).ok_or(DomError::HierarchyRequest {
            parent: NodeId::NONE,
            child: node,
            reason: "reference node is detached",
        })?;
        self.check_insert(parent, node)?;
        if node == reference {
            return Ok(());
        }
        self.detach(node);
        let position = self.children[parent.index()]
            .iter()
            .position(|&sibling| sibling == reference)
            .map(|position| position + 1);
        self.attach(parent, node, position);
        Ok(())
    }

    /// Put `replacement` where `old` is and detach `old`
    pub fn replace_with(&mut self, old: NodeId, replacement: NodeId) -> Result<(), DomError> {
        if old == replacement {
            return Ok(());
        }
        let parent = self.parent(old).ok_or(DomError::HierarchyRequest {
            parent: NodeId::NONE,
            child: replacement,
            reason: "replaced node is detached",
        })?;
        self.insert_before(parent, replacement, old)?;
        self.detach(old);
        Ok(())
    }

    /// Detach `id` from its parent; no-op for detached nodes
    pub fn remove(&mut self, id: NodeId) {
        if self.contains(id) {
            self.detach(id);
        }
    }

    // ------------------------------------------------------------------
    // Document structure
    // ------------------------------------------------------------------

    /// First element in document order with the given tag
    pub fn find_first_tag(&self, tag: &str) -> Option<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .find(|&node| self.is_tag(node, tag))
    }

    /// The root element (usually `<html>`)
    pub fn document_element(&self) -> Option<NodeId> {
        self.first_element_child(self.root())
    }

    pub fn head(&self) -> Option<NodeId> {
        self.find_first_tag("head")
    }

    pub fn body(&self) -> Option<NodeId> {
        self.find_first_tag("body")
    }

    /// Return `<head>`, creating it when the source markup had none
    pub fn ensure_head(&mut self) -> NodeId {
        if let Some(head) = self.head() {
            return head;
        }
        let head = self.create_element("head");
        let parent = self
            .document_element()
            .filter(|&html| self.is_tag(html, "html"))
            .unwrap_or(self.root());
        self.attach(parent, head, Some(0));
        head
    }

    /// Return `<body>`, creating it when the source markup had none
    pub fn ensure_body(&mut self) -> NodeId {
        if let Some(body) = self.body() {
            return body;
        }
        let body = self.create_element("body");
        let parent = self
            .document_element()
            .filter(|&html| self.is_tag(html, "html"))
            .unwrap_or(self.root());
        self.attach(parent, body, None);
        body
    }
}

/// Iterator over a node's ancestors, nearest first
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.parent(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tree() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let main = doc.create_element("MAIN");
        let a = doc.create_element("div");
        let b = doc.create_element("div");
        doc.append_child(doc.root(), main).unwrap();
        doc.append_child(main, a).unwrap();
        doc.append_child(main, b).unwrap();
        (doc, main, a, b)
    }

    #[test]
    fn test_create_and_append() {
        let (doc, main, a, b) = tree();
        assert_eq!(doc.tag_name(main), Some("main"));
        assert_eq!(doc.children(main), &[a, b]);
        assert_eq!(doc.parent(a), Some(main));
        assert_eq!(doc.next_element_sibling(a), Some(b));
        assert_eq!(doc.previous_element_sibling(a), None);
    }

    #[test]
    fn test_insert_after_and_replace() {
        let (mut doc, main, a, b) = tree();
        let c = doc.create_element("p");
        doc.insert_after(a, c).unwrap();
        assert_eq!(doc.children(main), &[a, c, b]);

        let d = doc.create_element("span");
        doc.replace_with(c, d).unwrap();
        assert_eq!(doc.children(main), &[a, d, b]);
        assert_eq!(doc.parent(c), None);
    }

    #[test]
    fn test_cycles_rejected() {
        let (mut doc, main, a, _) = tree();
        assert!(matches!(
            doc.append_child(a, main),
            Err(DomError::HierarchyRequest { .. })
        ));
        assert!(doc.append_child(a, a).is_err());
    }

    #[test]
    fn test_insert_after_detached_reference() {
        let mut doc = Document::new();
        let lonely = doc.create_element("strong");
        let link = doc.create_element("a");
        assert!(doc.insert_after(lonely, link).is_err());
    }

    #[test]
    fn test_class_list() {
        let (mut doc, _, a, _) = tree();
        doc.add_classes(a, ["marquee", "dark", "marquee"]);
        assert_eq!(doc.attribute(a, "class"), Some("marquee dark"));
        doc.add_class(a, "block");
        doc.remove_class(a, "dark");
        assert_eq!(doc.classes(a), vec!["marquee", "block"]);
        assert!(doc.has_class(a, "block"));
        assert!(!doc.has_class(a, "dark"));
    }

    #[test]
    fn test_text_content() {
        let (mut doc, main, a, b) = tree();
        let t1 = doc.create_text("Hello ");
        let t2 = doc.create_text("world");
        doc.append_child(a, t1).unwrap();
        doc.append_child(b, t2).unwrap();
        assert_eq!(doc.text_content(main), "Hello world");

        doc.set_text_content(a, "");
        assert!(doc.children(a).is_empty());
        assert_eq!(doc.text_content(main), "world");
    }

    #[test]
    fn test_descendants_in_document_order() {
        let (mut doc, main, a, b) = tree();
        let inner = doc.create_element("span");
        doc.append_child(a, inner).unwrap();
        assert_eq!(doc.descendants(main), vec![a, inner, b]);
        assert_eq!(doc.ancestors(inner).collect::<Vec<_>>(), vec![a, main, doc.root()]);
    }

    #[test]
    fn test_ensure_head_without_markup() {
        let mut doc = Document::new();
        assert_eq!(doc.head(), None);
        let head = doc.ensure_head();
        assert_eq!(doc.head(), Some(head));
        assert_eq!(doc.ensure_head(), head);
    }

    #[test]
    fn test_doctype_node() {
        let mut doc = Document::new();
        let doctype = doc.create_doctype("HTML");
        doc.append_child(doc.root(), doctype).unwrap();
        assert_eq!(doc.doctype_name(doctype), Some("html"));
        assert_eq!(doc.tag_name(doctype), None);
        assert_eq!(doc.document_element(), None);

        let text = doc.create_text("x");
        assert!(matches!(
            doc.append_child(doctype, text),
            Err(DomError::HierarchyRequest { .. })
        ));
        doc.set_text_content(doctype, "ignored");
        assert!(doc.children(doctype).is_empty());
    }

    #[test]
    fn test_invalid_ids_are_harmless() {
        let doc = Document::new();
        assert_eq!(doc.kind(NodeId::NONE), None);
        assert_eq!(doc.children(NodeId(99)), &[] as &[NodeId]);
        assert_eq!(doc.attribute(NodeId(99), "class"), None);
    }
}
