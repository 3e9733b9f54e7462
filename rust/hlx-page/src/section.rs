//! Sections
//!
//! Every direct child `div` of `main` is a section. Sections are wrapped in a
//! `div.section-wrapper` which carries `data-section-status`. A section only
//! becomes `loaded` once all earlier sections are loaded and none of its own
//! blocks is still pending.

use hlx_dom::{Document, DomError, NodeId, SelectorList};

use crate::block::{read_status, write_status, BlockStatus, BLOCK_CLASS, BLOCK_STATUS_ATTR};

pub use crate::block::BlockStatus as SectionStatus;

pub const SECTION_CLASS: &str = "section-wrapper";
pub const SECTION_STATUS_ATTR: &str = "data-section-status";

const SECTIONS: &str = ":scope > div.section-wrapper";

/// Wrap each direct child `div` of `main` in a section wrapper
///
/// Empty divs are removed. Divs with an `id` and existing wrappers are left
/// as they are, so running this twice changes nothing.
pub fn wrap_sections(doc: &mut Document, main: NodeId) -> Result<Vec<NodeId>, DomError> {
    let mut wrappers = Vec::new();
    for div in doc.query_selector_all(main, ":scope > div")? {
        if doc.children(div).is_empty() {
            doc.remove(div);
        } else if doc.has_class(div, SECTION_CLASS) {
            wrappers.push(div);
        } else if !doc.attribute(div, "id").is_some_and(|id| !id.is_empty()) {
            let wrapper = doc.create_element("div");
            doc.set_class_name(wrapper, SECTION_CLASS);
            doc.replace_with(div, wrapper)?;
            doc.append_child(wrapper, div)?;
            wrappers.push(wrapper);
        }
    }
    Ok(wrappers)
}

/// Wrap sections and mark the fresh ones `initialized`
pub fn decorate_sections(doc: &mut Document, main: NodeId) -> Result<Vec<NodeId>, DomError> {
    wrap_sections(doc, main)?;
    let sections = doc.query_selector_all(main, SECTIONS)?;
    for &section in &sections {
        if section_status(doc, section).is_none() {
            write_status(doc, section, SECTION_STATUS_ATTR, SectionStatus::Initialized);
        }
    }
    Ok(sections)
}

pub fn section_status(doc: &Document, section: NodeId) -> Option<SectionStatus> {
    read_status(doc, section, SECTION_STATUS_ATTR)
}

fn has_pending_block(doc: &Document, section: NodeId) -> bool {
    doc.descendants(section).into_iter().any(|node| {
        doc.has_class(node, BLOCK_CLASS)
            && matches!(
                read_status(doc, node, BLOCK_STATUS_ATTR),
                Some(BlockStatus::Initialized | BlockStatus::Loading)
            )
    })
}

/// Recompute section statuses after a block status change
///
/// Sections are walked in document order. The first one still holding an
/// initialized or loading block becomes `loading` and stops the walk.
pub fn update_sections_status(doc: &mut Document, main: NodeId) -> Result<(), DomError> {
    let selector = SelectorList::parse(SECTIONS)?;
    for section in doc.select_all(main, &selector) {
        if section_status(doc, section) == Some(SectionStatus::Loaded) {
            continue;
        }
        if has_pending_block(doc, section) {
            write_status(doc, section, SECTION_STATUS_ATTR, SectionStatus::Loading);
            break;
        }
        write_status(doc, section, SECTION_STATUS_ATTR, SectionStatus::Loaded);
    }
    Ok(())
}
