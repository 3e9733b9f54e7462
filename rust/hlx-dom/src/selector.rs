//! CSS selector engine using cssparser
//!
//! Supports the subset of Selectors Level 4 that page decoration relies on:
//! - type, universal, `.class` and `#id` selectors
//! - attribute selectors: `[a]`, `[a=v]`, `[a^=v]`, `[a$=v]`, `[a*=v]`, `[a~=v]`
//! - `:scope` and `:not(...)`
//! - descendant and child combinators, comma-separated lists
//!
//! Matching follows `Element.querySelectorAll`: a selector is matched against
//! the whole document and the results are limited to descendants of the scope.

use cssparser::{ParseError, Parser, ParserInput, Token as CssToken};

use crate::error::DomError;
use crate::node::{Document, NodeId};

/// Attribute comparison
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttrOp {
    Exists,
    Equals(String),
    Prefix(String),
    Suffix(String),
    Contains(String),
    Includes(String),
}

/// A single simple selector inside a compound
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Filter {
    Class(String),
    Id(String),
    Attr { name: String, op: AttrOp },
    Scope,
    Not(SelectorList),
}

/// Compound selector: optional type plus filters, e.g. `div.block[data-x]`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Compound {
    pub tag: Option<String>,
    pub universal: bool,
    pub filters: Vec<Filter>,
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none() && !self.universal && self.filters.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
}

/// Compounds joined by combinators; `combinators[i]` sits between
/// `compounds[i]` and `compounds[i + 1]`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComplexSelector {
    pub compounds: Vec<Compound>,
    pub combinators: Vec<Combinator>,
}

/// Comma-separated selector list
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectorList(pub Vec<ComplexSelector>);

type SelectorResult<'i, T> = Result<T, ParseError<'i, ()>>;

impl SelectorList {
    /// Parse a selector list
    pub fn parse(selector: &str) -> Result<Self, DomError> {
        let mut input = ParserInput::new(selector);
        let mut parser = Parser::new(&mut input);
        parse_list(&mut parser).map_err(|err| DomError::InvalidSelector {
            selector: selector.to_string(),
            column: err.location.column,
        })
    }

    /// Check whether `element` matches any selector in the list
    pub fn matches(&self, doc: &Document, element: NodeId, scope: Option<NodeId>) -> bool {
        self.0
            .iter()
            .any(|complex| matches_complex(doc, complex, complex.compounds.len() - 1, element, scope))
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Builder state for one complex selector
#[derive(Default)]
struct ComplexBuilder {
    current: ComplexSelector,
    compound: Compound,
    pending: Option<Combinator>,
}

impl ComplexBuilder {
    fn flush(&mut self) {
        if self.compound.is_empty() {
            return;
        }
        if !self.current.compounds.is_empty() {
            let combinator = self.pending.take().unwrap_or(Combinator::Descendant);
            self.current.combinators.push(combinator);
        }
        self.current.compounds.push(std::mem::take(&mut self.compound));
        self.pending = None;
    }

    fn finish(&mut self) -> Option<ComplexSelector> {
        self.flush();
        let dangling = self.pending.take().is_some();
        let complex = std::mem::take(&mut self.current);
        (!complex.compounds.is_empty() && !dangling).then_some(complex)
    }
}

fn parse_list<'i, 't>(parser: &mut Parser<'i, 't>) -> SelectorResult<'i, SelectorList> {
    let mut list = Vec::new();
    let mut builder = ComplexBuilder::default();

    loop {
        let token = match parser.next_including_whitespace() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };

        match token {
            CssToken::WhiteSpace(_) => builder.flush(),
            CssToken::Delim('>') => {
                builder.flush();
                if builder.current.compounds.is_empty() {
                    return Err(parser.new_custom_error(()));
                }
                builder.pending = Some(Combinator::Child);
            }
            CssToken::Comma => match builder.finish() {
                Some(complex) => list.push(complex),
                None => return Err(parser.new_custom_error(())),
            },
            CssToken::Ident(name) => {
                if !builder.compound.is_empty() {
                    return Err(parser.new_custom_error(()));
                }
                builder.compound.tag = Some(name.to_ascii_lowercase());
            }
            CssToken::Delim('*') => builder.compound.universal = true,
            CssToken::Delim('.') => {
                let class = match parser.next_including_whitespace() {
                    Ok(CssToken::Ident(class)) => class.to_string(),
                    _ => return Err(parser.new_custom_error(())),
                };
                builder.compound.filters.push(Filter::Class(class));
            }
            CssToken::IDHash(id) | CssToken::Hash(id) => {
                builder.compound.filters.push(Filter::Id(id.to_string()));
            }
            CssToken::SquareBracketBlock => {
                let filter = parser.parse_nested_block(parse_attribute)?;
                builder.compound.filters.push(filter);
            }
            CssToken::Colon => {
                let pseudo = match parser.next_including_whitespace() {
                    Ok(token) => token.clone(),
                    Err(_) => return Err(parser.new_custom_error(())),
                };
                match pseudo {
                    CssToken::Ident(name) if name.eq_ignore_ascii_case("scope") => {
                        builder.compound.filters.push(Filter::Scope);
                    }
                    CssToken::Function(name) if name.eq_ignore_ascii_case("not") => {
                        let inner = parser.parse_nested_block(parse_list)?;
                        builder.compound.filters.push(Filter::Not(inner));
                    }
                    _ => return Err(parser.new_custom_error(())),
                }
            }
            _ => return Err(parser.new_custom_error(())),
        }
    }

    match builder.finish() {
        Some(complex) => list.push(complex),
        None => return Err(parser.new_custom_error(())),
    }
    Ok(SelectorList(list))
}

fn parse_attribute<'i, 't>(parser: &mut Parser<'i, 't>) -> SelectorResult<'i, Filter> {
    let name = parser.expect_ident()?.to_ascii_lowercase();

    let op = match parser.next() {
        Err(_) => return Ok(Filter::Attr { name, op: AttrOp::Exists }),
        Ok(token) => token.clone(),
    };

    let value = match parser.next()? {
        CssToken::QuotedString(value) | CssToken::Ident(value) => value.to_string(),
        _ => return Err(parser.new_custom_error(())),
    };

    let op = match op {
        CssToken::Delim('=') => AttrOp::Equals(value),
        CssToken::PrefixMatch => AttrOp::Prefix(value),
        CssToken::SuffixMatch => AttrOp::Suffix(value),
        CssToken::SubstringMatch => AttrOp::Contains(value),
        CssToken::IncludeMatch => AttrOp::Includes(value),
        _ => return Err(parser.new_custom_error(())),
    };

    parser.expect_exhausted()?;
    Ok(Filter::Attr { name, op })
}

// ============================================================================
// Matching
// ============================================================================

fn matches_complex(
    doc: &Document,
    complex: &ComplexSelector,
    index: usize,
    element: NodeId,
    scope: Option<NodeId>,
) -> bool {
    if !matches_compound(doc, &complex.compounds[index], element, scope) {
        return false;
    }
    if index == 0 {
        return true;
    }

    match complex.combinators[index - 1] {
        Combinator::Child => doc
            .parent_element(element)
            .is_some_and(|parent| matches_complex(doc, complex, index - 1, parent, scope)),
        Combinator::Descendant => doc
            .ancestors(element)
            .filter(|&ancestor| doc.is_element(ancestor))
            .any(|ancestor| matches_complex(doc, complex, index - 1, ancestor, scope)),
    }
}

fn matches_compound(doc: &Document, compound: &Compound, element: NodeId, scope: Option<NodeId>) -> bool {
    let Some(tag) = doc.tag_name(element) else {
        return false;
    };
    if compound.tag.as_deref().is_some_and(|wanted| wanted != tag) {
        return false;
    }

    compound.filters.iter().all(|filter| match filter {
        Filter::Class(class) => doc.has_class(element, class),
        Filter::Id(id) => doc.attribute(element, "id") == Some(id.as_str()),
        Filter::Attr { name, op } => match doc.attribute(element, name) {
            None => false,
            Some(value) => match op {
                AttrOp::Exists => true,
                AttrOp::Equals(wanted) => value == wanted,
                AttrOp::Prefix(wanted) => !wanted.is_empty() && value.starts_with(wanted.as_str()),
                AttrOp::Suffix(wanted) => !wanted.is_empty() && value.ends_with(wanted.as_str()),
                AttrOp::Contains(wanted) => !wanted.is_empty() && value.contains(wanted.as_str()),
                AttrOp::Includes(wanted) => value.split_ascii_whitespace().any(|token| token == wanted),
            },
        },
        Filter::Scope => match scope {
            Some(scope) => scope == element,
            None => doc.document_element() == Some(element),
        },
        Filter::Not(inner) => !inner.matches(doc, element, scope),
    })
}

// ============================================================================
// Document queries
// ============================================================================

impl Document {
    /// All elements below `scope` matching `selectors`, in document order
    pub fn query_selector_all(&self, scope: NodeId, selectors: &str) -> Result<Vec<NodeId>, DomError> {
        let list = SelectorList::parse(selectors)?;
        Ok(self.select_all(scope, &list))
    }

    /// First element below `scope` matching `selectors`
    pub fn query_selector(&self, scope: NodeId, selectors: &str) -> Result<Option<NodeId>, DomError> {
        let list = SelectorList::parse(selectors)?;
        Ok(self
            .descendants(scope)
            .into_iter()
            .find(|&node| list.matches(self, node, Some(scope))))
    }

    /// Like [`Document::query_selector_all`] with a pre-parsed list
    pub fn select_all(&self, scope: NodeId, list: &SelectorList) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|&node| list.matches(self, node, Some(scope)))
            .collect()
    }

    /// Nearest inclusive ancestor of `element` matching `selectors`
    pub fn closest(&self, element: NodeId, selectors: &str) -> Result<Option<NodeId>, DomError> {
        let list = SelectorList::parse(selectors)?;
        if list.matches(self, element, None) {
            return Ok(Some(element));
        }
        Ok(self
            .ancestors(element)
            .find(|&ancestor| list.matches(self, ancestor, None)))
    }

    /// `Element.matches`
    pub fn matches(&self, element: NodeId, selectors: &str) -> Result<bool, DomError> {
        let list = SelectorList::parse(selectors)?;
        Ok(list.matches(self, element, None))
    }
}
