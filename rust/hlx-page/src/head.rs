//! Head helpers: stylesheets, favicon and scripts
//!
//! `load_style` inserts the `<link>` synchronously and hands back a future for
//! the host's load event, so the document is free for other mutations while
//! the stylesheet is in flight.

use futures::future::{self, FutureExt, LocalBoxFuture};
use hlx_dom::{Document, NodeId};

use crate::host::{Host, StyleEvent};

fn find_head_link(doc: &Document, head: NodeId, rel: Option<&str>, href: Option<&str>) -> Option<NodeId> {
    doc.descendants(head).into_iter().find(|&node| {
        doc.is_tag(node, "link")
            && rel.map_or(true, |rel| doc.attribute(node, "rel") == Some(rel))
            && href.map_or(true, |href| doc.attribute(node, "href") == Some(href))
    })
}

/// Attach a stylesheet once; later calls for the same `href` resolve to `Noop`
pub fn load_style<'h>(doc: &mut Document, host: &'h dyn Host, href: &str) -> LocalBoxFuture<'h, StyleEvent> {
    let head = doc.ensure_head();
    if find_head_link(doc, head, None, Some(href)).is_some() {
        return future::ready(StyleEvent::Noop).boxed_local();
    }

    let link = doc.create_element("link");
    doc.set_attribute(link, "rel", "stylesheet");
    doc.set_attribute(link, "href", href);
    if let Err(err) = doc.append_child(head, link) {
        log::warn!("cannot attach stylesheet {}: {}", href, err);
        return future::ready(StyleEvent::Error).boxed_local();
    }
    host.stylesheet_settled(href)
}

/// Point the page favicon at `href`, replacing an existing icon link
pub fn add_fav_icon(doc: &mut Document, href: &str) -> NodeId {
    let link = doc.create_element("link");
    doc.set_attribute(link, "rel", "icon");
    doc.set_attribute(link, "type", "image/svg+xml");
    doc.set_attribute(link, "href", href);

    let head = doc.ensure_head();
    let attached = match find_head_link(doc, head, Some("icon"), None) {
        Some(existing) => doc.replace_with(existing, link),
        None => doc.append_child(head, link),
    };
    if let Err(err) = attached {
        log::warn!("cannot set favicon {}: {}", href, err);
    }
    link
}

/// Append a `<script src>` to the head
pub fn load_script(doc: &mut Document, url: &str, script_type: Option<&str>) -> NodeId {
    let script = doc.create_element("script");
    doc.set_attribute(script, "src", url);
    if let Some(script_type) = script_type {
        doc.set_attribute(script, "type", script_type);
    }
    let head = doc.ensure_head();
    if let Err(err) = doc.append_child(head, script) {
        log::warn!("cannot attach script {}: {}", url, err);
    }
    script
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeHost;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_same_stylesheet_inserted_once() {
        let host = FakeHost::new();
        let mut doc = Document::parse("<html><head></head><body></body></html>");

        let first = pollster::block_on(load_style(&mut doc, &host, "/blocks/marquee/marquee.css"));
        let second = pollster::block_on(load_style(&mut doc, &host, "/blocks/marquee/marquee.css"));

        assert_eq!(first, StyleEvent::Load);
        assert_eq!(second, StyleEvent::Noop);
        let head = doc.head().unwrap();
        let links = doc.query_selector_all(head, "link").unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(host.stylesheets(), vec!["/blocks/marquee/marquee.css"]);
    }

    #[test]
    fn test_stylesheet_error_is_reported() {
        let host = FakeHost::new().failing_stylesheet("/fonts/fonts.css");
        let mut doc = Document::new();
        let event = pollster::block_on(load_style(&mut doc, &host, "/fonts/fonts.css"));
        assert_eq!(event, StyleEvent::Error);
        // link stays in place so a second call is a no-op
        assert!(doc.head().is_some());
        let event = pollster::block_on(load_style(&mut doc, &host, "/fonts/fonts.css"));
        assert_eq!(event, StyleEvent::Noop);
    }

    #[test]
    fn test_fav_icon_replaces_existing() {
        let mut doc = Document::parse(r#"<html><head><link rel="icon" href="/old.png"></head></html>"#);
        add_fav_icon(&mut doc, "/img/icon.svg");
        add_fav_icon(&mut doc, "/img/icon.svg");

        let head = doc.head().unwrap();
        let icons = doc.query_selector_all(head, r#"link[rel="icon"]"#).unwrap();
        assert_eq!(icons.len(), 1);
        assert_eq!(doc.attribute(icons[0], "href"), Some("/img/icon.svg"));
        assert_eq!(doc.attribute(icons[0], "type"), Some("image/svg+xml"));
    }

    #[test]
    fn test_load_script() {
        let mut doc = Document::parse("<html><head></head></html>");
        let script = load_script(&mut doc, "/scripts/delayed.js", Some("module"));
        assert_eq!(doc.parent(script), doc.head());
        assert_eq!(
            doc.outer_html(script),
            r#"<script src="/scripts/delayed.js" type="module"></script>"#
        );
    }
}
