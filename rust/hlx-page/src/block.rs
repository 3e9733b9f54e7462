//! Block classification
//!
//! Authored blocks arrive as classed `div`s whose first class token is the
//! block name, optionally followed by `--`-separated variants:
//!
//! - `marquee` → name `marquee`
//! - `marquee--dark--small` → name `marquee`, variants `dark`, `small`
//! - `marquee--light-` → name `marquee`, variant `light`
//!
//! Decoration adds the name, variants and the `block` marker as classes and
//! records `data-block-name` / `data-block-status` on the element.

use std::fmt;

use hlx_dom::{Document, DomError, NodeId, SelectorList};

use crate::section::SECTION_CLASS;

pub const BLOCK_CLASS: &str = "block";
pub const BLOCK_NAME_ATTR: &str = "data-block-name";
pub const BLOCK_STATUS_ATTR: &str = "data-block-status";

/// Elements decorated as blocks: any `div` nested below a section's direct child
const BLOCK_SELECTOR: &str = "div.section-wrapper > div div";

// ============================================================================
// Status
// ============================================================================

/// Loading status shared by blocks and sections
///
/// Ordered so that a status write can be checked for regression with `<`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BlockStatus {
    Initialized,
    Loading,
    Loaded,
}

impl BlockStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BlockStatus::Initialized => "initialized",
            BlockStatus::Loading => "loading",
            BlockStatus::Loaded => "loaded",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "initialized" => Some(BlockStatus::Initialized),
            "loading" => Some(BlockStatus::Loading),
            "loaded" => Some(BlockStatus::Loaded),
            _ => None,
        }
    }
}

impl fmt::Display for BlockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read a status attribute; unknown values count as absent
pub(crate) fn read_status(doc: &Document, el: NodeId, attr: &str) -> Option<BlockStatus> {
    doc.attribute(el, attr).and_then(BlockStatus::parse)
}

/// Write a status attribute unless it would move backwards
pub(crate) fn write_status(doc: &mut Document, el: NodeId, attr: &str, status: BlockStatus) -> bool {
    if read_status(doc, el, attr).is_some_and(|current| current >= status) {
        return false;
    }
    doc.set_attribute(el, attr, status.as_str());
    true
}

pub fn block_status(doc: &Document, block: NodeId) -> Option<BlockStatus> {
    read_status(doc, block, BLOCK_STATUS_ATTR)
}

/// Advance the block status; returns false when `status` is not ahead of the current one
pub fn set_block_status(doc: &mut Document, block: NodeId, status: BlockStatus) -> bool {
    write_status(doc, block, BLOCK_STATUS_ATTR, status)
}

// ============================================================================
// Names
// ============================================================================

/// Strip surrounding whitespace and hyphens from a name segment
pub fn trim_dashes(segment: &str) -> &str {
    segment.trim().trim_matches('-').trim()
}

/// Lowercase `name` and replace every non-alphanumeric character with `-`
pub fn to_class_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}

/// Canonical block name with its variants
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockName {
    pub name: String,
    pub variants: Vec<String>,
}

impl BlockName {
    /// Split a raw class token on `--`; `None` when no name survives trimming
    pub fn parse(raw: &str) -> Option<Self> {
        let mut segments = raw.split("--").map(trim_dashes);
        let name = segments.next().filter(|name| !name.is_empty())?;
        let variants = segments
            .filter(|variant| !variant.is_empty())
            .map(str::to_string)
            .collect();
        Some(Self {
            name: name.to_string(),
            variants,
        })
    }
}

impl fmt::Display for BlockName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for variant in &self.variants {
            write!(f, "--{variant}")?;
        }
        Ok(())
    }
}

// ============================================================================
// Decoration
// ============================================================================

/// Rewrite class attributes ending in `-` into separate tokens
///
/// `marquee--small--contained-` becomes `marquee small contained`.
pub fn clean_variations(doc: &mut Document, parent: NodeId) -> Result<Vec<NodeId>, DomError> {
    let variants = doc.query_selector_all(parent, r#"[class$="-"]"#)?;
    for &el in &variants {
        let class_name = doc.attribute(el, "class").unwrap_or_default().to_string();
        let clipped = class_name.strip_suffix('-').unwrap_or(&class_name);
        let tokens: Vec<&str> = clipped
            .split("--")
            .map(trim_dashes)
            .filter(|token| !token.is_empty())
            .collect();
        doc.set_class_name(el, "");
        doc.add_classes(el, tokens);
    }
    Ok(variants)
}

/// Classify one block element
///
/// Returns `None` for an element without classes. Safe to repeat: tokens
/// are only added once and an existing status is left alone.
pub fn decorate_block(doc: &mut Document, block: NodeId) -> Result<Option<BlockName>, DomError> {
    let Some(raw) = doc.classes(block).first().map(|token| token.to_string()) else {
        return Ok(None);
    };
    let Some(block_name) = BlockName::parse(&raw) else {
        log::debug!("class '{}' has no block name", raw);
        return Ok(None);
    };

    if let Some(section) = doc.closest(block, &format!(".{SECTION_CLASS}"))? {
        doc.add_class(section, &format!("{raw}-container").replace("--", "-"));
    }

    doc.add_class(block, &block_name.name);
    doc.add_classes(block, &block_name.variants);
    doc.add_class(block, BLOCK_CLASS);
    doc.set_attribute(block, BLOCK_NAME_ATTR, &block_name.name);
    if block_status(doc, block).is_none() {
        set_block_status(doc, block, BlockStatus::Initialized);
    }
    Ok(Some(block_name))
}

/// Classify every block inside the sections of `main`
pub fn decorate_blocks(doc: &mut Document, main: NodeId) -> Result<Vec<NodeId>, DomError> {
    let selector = SelectorList::parse(BLOCK_SELECTOR)?;
    let mut blocks = Vec::new();
    for candidate in doc.select_all(main, &selector) {
        if decorate_block(doc, candidate)?.is_some() {
            blocks.push(candidate);
        }
    }
    log::debug!("decorated {} blocks", blocks.len());
    Ok(blocks)
}

// ============================================================================
// Synthetic blocks
// ============================================================================

/// Content of one block cell
#[derive(Clone, Debug, PartialEq)]
pub enum CellContent {
    Html(String),
    Node(NodeId),
    Nodes(Vec<NodeId>),
}

impl From<&str> for CellContent {
    fn from(html: &str) -> Self {
        CellContent::Html(html.to_string())
    }
}

impl From<NodeId> for CellContent {
    fn from(node: NodeId) -> Self {
        CellContent::Node(node)
    }
}

/// Build a detached `div.<name>` with one `div` per row and per cell
pub fn build_block(doc: &mut Document, name: &str, rows: Vec<Vec<CellContent>>) -> Result<NodeId, DomError> {
    let block = doc.create_element("div");
    doc.add_class(block, name);
    for row in rows {
        let row_el = doc.create_element("div");
        for cell in row {
            let col = doc.create_element("div");
            match cell {
                CellContent::Html(html) => doc.append_html(col, &html),
                CellContent::Node(node) => doc.append_child(col, node)?,
                CellContent::Nodes(nodes) => {
                    for node in nodes {
                        doc.append_child(col, node)?;
                    }
                }
            }
            doc.append_child(row_el, col)?;
        }
        doc.append_child(block, row_el)?;
    }
    Ok(block)
}
