//! HTML Parser using html5ever
//!
//! Runs the html5ever tokenizer and builds the arena tree directly from the
//! token stream. Tree construction is deliberately small:
//! - void elements and self-closing tags never become open elements
//! - end tags pop back to the matching open element, stray end tags are ignored
//! - an open `<p>` is closed by block-level start tags and an open `<li>` by a
//!   new `<li>`, both only within their scope so nested lists survive
//! - `script`, `style`, `title` and friends switch the tokenizer to raw text
//! - adjacent character tokens merge into one text node

use std::cell::RefCell;

use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use markup5ever::Attribute;
use tendril::StrTendril;

use crate::node::{is_void_element, Document, NodeId, NodeKind};

/// Start tags that implicitly close an open `<p>`
const CLOSES_PARAGRAPH: &[&str] = &[
    "address", "article", "aside", "blockquote", "details", "div", "dl", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hr", "main", "nav", "ol", "p", "pre", "section", "table", "ul",
];

/// Open elements that hide a `<p>` from implicit closing
const BUTTON_SCOPE: &[&str] = &[
    "applet", "button", "caption", "html", "marquee", "object", "table", "td", "template",
    "th",
];

/// Open elements that hide an `<li>` from implicit closing
const LIST_ITEM_SCOPE: &[&str] = &[
    "applet", "caption", "html", "marquee", "object", "ol", "table", "td", "template", "th",
    "ul",
];

/// Tokenizer state for the content of `tag`, if it is not parsed as markup
fn raw_text_kind(tag: &str) -> Option<RawKind> {
    match tag {
        "script" => Some(RawKind::ScriptData),
        "style" | "xmp" | "iframe" | "noembed" | "noframes" => Some(RawKind::Rawtext),
        "title" | "textarea" => Some(RawKind::Rcdata),
        _ => None,
    }
}

/// Tree construction state shared with the token sink
struct TreeBuilder<'d> {
    doc: &'d mut Document,
    /// Open elements; the first entry is the insertion root and is never popped
    open: Vec<NodeId>,
}

impl TreeBuilder<'_> {
    fn current(&self) -> NodeId {
        self.open.last().copied().unwrap_or(self.open[0])
    }

    fn is_open(&self, tag: &str) -> bool {
        self.open[1..].iter().any(|&node| self.doc.is_tag(node, tag))
    }

    /// Whether `tag` is open above the nearest `boundary` element
    fn in_scope(&self, tag: &str, boundary: &[&str]) -> bool {
        for &node in self.open[1..].iter().rev() {
            if self.doc.is_tag(node, tag) {
                return true;
            }
            if self.doc.tag_name(node).is_some_and(|name| boundary.contains(&name)) {
                return false;
            }
        }
        false
    }

    /// Pop open elements up to and including the nearest `tag`
    fn close(&mut self, tag: &str) {
        if let Some(position) = self.open[1..]
            .iter()
            .rposition(|&node| self.doc.is_tag(node, tag))
        {
            self.open.truncate(position + 1);
        }
    }

    fn start_tag(&mut self, tag: Tag) {
        let name = tag.name.as_ref().to_ascii_lowercase();

        if CLOSES_PARAGRAPH.contains(&name.as_str()) && self.in_scope("p", BUTTON_SCOPE) {
            self.close("p");
        }
        if name == "li" && self.in_scope("li", LIST_ITEM_SCOPE) {
            self.close("li");
        }

        let element = self.doc.create_element(&name);
        for attr in tag.attrs {
            self.attribute(element, attr);
        }
        let parent = self.current();
        if let Err(err) = self.doc.append_child(parent, element) {
            log::warn!("Dropping <{}>: {}", name, err);
            return;
        }

        if !tag.self_closing && !is_void_element(&name) {
            self.open.push(element);
        }
    }

    fn end_tag(&mut self, tag: Tag) {
        let name = tag.name.as_ref().to_ascii_lowercase();
        if self.is_open(&name) {
            self.close(&name);
        }
    }

    fn attribute(&mut self, element: NodeId, attr: Attribute) {
        let name = attr.name.local.as_ref().to_ascii_lowercase();
        // Duplicate attributes keep the first value, like browsers do
        if !self.doc.has_attribute(element, &name) {
            self.doc.set_attribute(element, &name, &attr.value);
        }
    }

    fn text(&mut self, text: &str) {
        let parent = self.current();
        self.doc.append_text(parent, text);
    }

    fn comment(&mut self, text: &str) {
        let comment = self.doc.create_comment(text);
        let parent = self.current();
        let _ = self.doc.append_child(parent, comment);
    }

    /// Doctypes only count at the top of a document
    fn doctype(&mut self, name: &str) {
        let parent = self.current();
        if self.doc.kind(parent) != Some(NodeKind::Document) {
            return;
        }
        let doctype = self.doc.create_doctype(name);
        let _ = self.doc.append_child(parent, doctype);
    }
}

/// Wrapper to implement TokenSink trait
struct TokenSinkWrapper<'a, 'd> {
    builder: &'a RefCell<TreeBuilder<'d>>,
}

impl TokenSink for TokenSinkWrapper<'_, '_> {
    type Handle = ();

    fn process_token(&self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        let mut builder = self.builder.borrow_mut();
        match token {
            Token::TagToken(tag) => match tag.kind {
                TagKind::StartTag => {
                    let raw = if tag.self_closing {
                        None
                    } else {
                        raw_text_kind(&tag.name.as_ref().to_ascii_lowercase())
                    };
                    builder.start_tag(tag);
                    if let Some(kind) = raw {
                        return TokenSinkResult::RawData(kind);
                    }
                }
                TagKind::EndTag => builder.end_tag(tag),
            },
            Token::CharacterTokens(text) => builder.text(&text),
            Token::CommentToken(comment) => builder.comment(&comment),
            Token::DoctypeToken(doctype) => builder.doctype(doctype.name.as_deref().unwrap_or("")),
            Token::NullCharacterToken | Token::EOFToken => {}
            Token::ParseError(err) => log::trace!("html parse error: {}", err),
        }
        TokenSinkResult::Continue
    }
}

/// Tokenize `html` and append the resulting nodes under `parent`
fn build_into(doc: &mut Document, parent: NodeId, html: &str) {
    let builder = RefCell::new(TreeBuilder {
        doc,
        open: vec![parent],
    });

    {
        let sink = TokenSinkWrapper { builder: &builder };
        let tok = Tokenizer::new(sink, TokenizerOpts::default());
        let mut buffer = BufferQueue::default();
        buffer.push_back(StrTendril::from(html));
        let _ = tok.feed(&mut buffer);
        tok.end();
    }
}

impl Document {
    /// Parse an HTML document or fragment into a new document
    pub fn parse(html: &str) -> Self {
        let mut doc = Document::new();
        let root = doc.root();
        build_into(&mut doc, root, html);
        doc
    }

    /// Parse `html` and append the resulting nodes to `parent` (`innerHTML +=`)
    pub fn append_html(&mut self, parent: NodeId, html: &str) {
        if self.kind(parent).is_none() {
            return;
        }
        build_into(self, parent, html);
    }
}
