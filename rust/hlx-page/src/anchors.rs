//! Anchor normalization and synthetic blocks
//!
//! Links authored against the live site become relative, external links open
//! in a new tab, `.svg` links turn into images and extension downloads get a
//! `download` attribute. Embeddable links and the page header are turned into
//! blocks before block decoration runs.

use hlx_dom::{Document, DomError, NodeId};
use url::Url;

use crate::block::{build_block, CellContent};
use crate::context::PageContext;
use crate::error::PageError;

fn resolve(ctx: &PageContext, href: &str) -> Option<Url> {
    match ctx.location().join(href) {
        Ok(url) => Some(url),
        Err(err) => {
            log::debug!("cannot resolve link {}: {}", href, err);
            None
        }
    }
}

/// Rewrite live-site links to path-only; mark everything else external
///
/// Returns the resulting link, or `None` when the anchor has no usable `href`.
pub fn make_relative(doc: &mut Document, ctx: &PageContext, anchor: NodeId) -> Option<String> {
    let href = doc.attribute(anchor, "href")?.to_string();
    let url = resolve(ctx, &href)?;
    let host = url.host_str().unwrap_or_default();

    if ctx.config().is_live_host(host) {
        let mut relative = url.path().to_string();
        if let Some(query) = url.query().filter(|query| !query.is_empty()) {
            relative.push('?');
            relative.push_str(query);
        }
        if let Some(fragment) = url.fragment().filter(|fragment| !fragment.is_empty()) {
            relative.push('#');
            relative.push_str(fragment);
        }
        doc.set_attribute(anchor, "href", &relative);
        return Some(relative);
    }

    doc.set_attribute(anchor, "target", "_blank");
    Some(url.into())
}

/// Turn a link whose text is an `.svg` URL into an image
pub fn set_svg(doc: &mut Document, anchor: NodeId) -> Result<Option<NodeId>, DomError> {
    let text = doc.text_content(anchor);
    let ext = text.rsplit('.').next().unwrap_or_default();
    if ext != "svg" {
        return Ok(None);
    }

    let img = doc.create_element("img");
    doc.set_attribute(img, "src", &text);
    if doc.attribute(anchor, "href") == Some(text.as_str()) {
        if let Some(parent) = doc.parent(anchor) {
            doc.append_child(parent, img)?;
            doc.remove(anchor);
        }
    } else {
        doc.set_text_content(anchor, "");
        doc.append_child(anchor, img)?;
    }
    Ok(Some(img))
}

/// Add `download=<file name>` to links to downloadable extensions
pub fn force_download(doc: &mut Document, ctx: &PageContext, anchor: NodeId) -> bool {
    let Some(href) = doc.attribute(anchor, "href") else {
        return false;
    };
    let href = resolve(ctx, href).map_or_else(|| href.to_string(), String::from);
    let filename = href.rsplit('/').next().unwrap_or_default();
    let Some(ext) = filename.split('.').nth(1) else {
        return false;
    };
    if !ctx.config().download_extensions.iter().any(|allowed| allowed == ext) {
        return false;
    }
    let filename = filename.to_string();
    doc.set_attribute(anchor, "download", &filename);
    true
}

/// Normalize every link below `element`
pub fn decorate_anchors(doc: &mut Document, ctx: &PageContext, element: NodeId) -> Result<Vec<NodeId>, DomError> {
    let anchors: Vec<NodeId> = doc
        .descendants(element)
        .into_iter()
        .filter(|&node| doc.is_tag(node, "a"))
        .collect();
    for &anchor in &anchors {
        make_relative(doc, ctx, anchor);
        set_svg(doc, anchor)?;
        force_download(doc, ctx, anchor);
    }
    Ok(anchors)
}

/// Replace embeddable links in `main` with `embed` blocks wrapping the link
pub fn build_embeds(doc: &mut Document, ctx: &PageContext, main: NodeId) -> Result<Vec<NodeId>, DomError> {
    let prefixes = &ctx.config().embed_prefixes;
    if prefixes.is_empty() {
        return Ok(Vec::new());
    }
    let selector = prefixes
        .iter()
        .map(|prefix| format!("a[href^=\"{}\"]", prefix.replace('"', "\\\"")))
        .collect::<Vec<_>>()
        .join(", ");

    let mut embeds = Vec::new();
    for anchor in doc.query_selector_all(main, &selector)? {
        let html = doc.outer_html(anchor);
        let embed = build_block(doc, "embed", vec![vec![CellContent::Html(html)]])?;
        doc.replace_with(anchor, embed)?;
        embeds.push(embed);
    }
    Ok(embeds)
}

/// Append an empty `header` block to the page `<header>`
pub fn build_header(doc: &mut Document) -> Result<NodeId, PageError> {
    let header = doc
        .find_first_tag("header")
        .ok_or(PageError::MissingElement("header"))?;
    let block = build_block(doc, "header", vec![vec![CellContent::Html(String::new())]])?;
    doc.append_child(header, block)?;
    Ok(block)
}

/// Build the header block and embed blocks; failures are logged, not returned
pub fn build_auto_blocks(doc: &mut Document, ctx: &PageContext, main: NodeId) {
    let result = build_header(doc).and_then(|_| build_embeds(doc, ctx, main).map_err(PageError::from));
    if let Err(err) = result {
        log::error!("Auto blocking failed: {}", err);
    }
}
