//! Marquee block
//!
//! Authored shape:
//!
//! ```text
//! div.marquee
//!   div            background (only with two rows)
//!   div            foreground
//!     div          text: detail? heading body buttons?
//!     div          image
//! ```
//!
//! Text and image order inside the foreground is kept, so authors choose the
//! side the image sits on.

use hlx_dom::{Document, DomError, NodeId};

use crate::error::BlockError;
use crate::registry::{BlockContext, BlockDecorator};

const HEADINGS: &str = "h1, h2, h3, h4, h5, h6";
const BUTTONS: &str = "em a, strong a";

pub struct Marquee;

fn missing(cx: &BlockContext<'_>, element: &'static str) -> BlockError {
    BlockError::MissingElement {
        block: cx.name.to_string(),
        element,
    }
}

impl BlockDecorator for Marquee {
    fn decorate(&self, doc: &mut Document, block: NodeId, cx: &BlockContext<'_>) -> Result<(), BlockError> {
        let rows = doc.query_selector_all(block, ":scope > div")?;
        let foreground = *rows.last().ok_or_else(|| missing(cx, "foreground"))?;
        if rows.len() > 1 {
            doc.add_class(rows[0], "background");
        }
        doc.add_classes(foreground, ["foreground", "container"]);

        let heading = doc
            .query_selector(foreground, HEADINGS)?
            .ok_or_else(|| missing(cx, "heading"))?;
        let text = doc
            .closest(heading, "div")?
            .ok_or_else(|| missing(cx, "text"))?;
        doc.add_class(text, "text");

        if let Some(image) = doc.query_selector(foreground, ":scope > div:not([class])")? {
            doc.add_class(image, "image");
        }

        decorate_buttons(doc, text)?;
        decorate_text(doc, heading);
        Ok(())
    }
}

/// Turn emphasized links into buttons
///
/// `<strong><a>` becomes a `blue` button, `<em><a>` an `outline` one. The
/// link replaces its wrapper and the paragraph of the first button is marked
/// as the action area.
pub fn decorate_buttons(doc: &mut Document, text: NodeId) -> Result<Vec<NodeId>, DomError> {
    let buttons = doc.query_selector_all(text, BUTTONS)?;
    for &button in &buttons {
        let Some(wrapper) = doc.parent_element(button) else {
            continue;
        };
        let kind = if doc.is_tag(wrapper, "strong") { "blue" } else { "outline" };
        doc.add_classes(button, ["con-button", kind]);
        // wrapper already dropped with an outer button wrapper
        if doc.parent(wrapper).is_none() {
            continue;
        }
        doc.insert_after(wrapper, button)?;
        doc.remove(wrapper);
    }

    if let Some(&first) = buttons.first() {
        if let Some(area) = doc.closest(first, "p")? {
            doc.add_class(area, "action-area");
        }
    }
    Ok(buttons)
}

/// Typography classes around the heading
pub fn decorate_text(doc: &mut Document, heading: NodeId) {
    doc.add_class(heading, "heading-XL");
    if let Some(body) = doc.next_element_sibling(heading) {
        doc.add_class(body, "body-M");
    }
    if let Some(detail) = doc.previous_element_sibling(heading) {
        doc.add_class(detail, "detail-M");
    }
}
