//! Page sequencer
//!
//! A page boots in three phases:
//!
//! - **eager**: decorate `main`, load the LCP block, reveal the body and
//!   wait for the first image of `main`
//! - **lazy**: load the remaining blocks, the header block, fonts and favicon
//! - **delayed**: run registered hooks that must not affect the first render
//!
//! Each phase finishes before the next one starts.

use std::cell::Cell;
use std::fmt;

use hlx_dom::{Document, NodeId};
use serde_json::Map;

use crate::anchors::{build_auto_blocks, decorate_anchors};
use crate::block::{clean_variations, decorate_block, decorate_blocks, BLOCK_NAME_ATTR};
use crate::context::PageContext;
use crate::error::PageError;
use crate::head::{add_fav_icon, load_style};
use crate::host::{Host, StyleEvent};
use crate::loader::Loader;
use crate::metadata::set_template;
use crate::registry::BlockRegistry;
use crate::rum::sample_rum;
use crate::section::decorate_sections;

/// Class that makes the body visible once the LCP content is in place
pub const APPEAR_CLASS: &str = "appear";

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum PagePhase {
    Pending,
    Eager,
    Lazy,
    Delayed,
    Booted,
}

impl fmt::Display for PagePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PagePhase::Pending => "pending",
            PagePhase::Eager => "eager",
            PagePhase::Lazy => "lazy",
            PagePhase::Delayed => "delayed",
            PagePhase::Booted => "booted",
        };
        f.write_str(name)
    }
}

/// Work run in the delayed phase
pub type DelayedHook = Box<dyn Fn(&mut Document, &PageContext)>;

pub struct Page<'a> {
    host: &'a dyn Host,
    context: &'a PageContext,
    registry: &'a BlockRegistry,
    phase: Cell<PagePhase>,
    delayed: Vec<DelayedHook>,
}

impl<'a> Page<'a> {
    pub fn new(host: &'a dyn Host, context: &'a PageContext, registry: &'a BlockRegistry) -> Self {
        Self {
            host,
            context,
            registry,
            phase: Cell::new(PagePhase::Pending),
            delayed: Vec::new(),
        }
    }

    /// Add a hook to the delayed phase
    pub fn with_delayed<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Document, &PageContext) + 'static,
    {
        self.delayed.push(Box::new(hook));
        self
    }

    pub fn phase(&self) -> PagePhase {
        self.phase.get()
    }

    pub fn loader(&self) -> Loader<'a> {
        Loader::new(self.host, self.context, self.registry)
    }

    fn enter(&self, phase: PagePhase) {
        log::debug!("page phase {} -> {}", self.phase.get(), phase);
        self.phase.set(phase);
    }

    /// Run all phases in order
    pub async fn load_page(&self, doc: &mut Document) -> Result<(), PageError> {
        sample_rum(self.context, self.host, "top", Map::new());

        self.enter(PagePhase::Eager);
        self.load_eager(doc).await?;
        self.enter(PagePhase::Lazy);
        self.load_lazy(doc).await?;
        self.enter(PagePhase::Delayed);
        self.load_delayed(doc);
        self.enter(PagePhase::Booted);
        Ok(())
    }

    /// Decorate `main` and get the largest contentful paint on screen
    pub async fn load_eager(&self, doc: &mut Document) -> Result<(), PageError> {
        let Some(main) = doc.find_first_tag("main") else {
            log::info!("page has no main element");
            return Ok(());
        };
        set_template(doc);
        self.decorate_main(doc, main)?;
        self.wait_for_lcp(doc, main).await
    }

    /// Anchors, synthetic blocks, variant cleanup, sections and blocks
    pub fn decorate_main(&self, doc: &mut Document, main: NodeId) -> Result<(), PageError> {
        decorate_anchors(doc, self.context, main)?;
        build_auto_blocks(doc, self.context, main);
        clean_variations(doc, main)?;
        decorate_sections(doc, main)?;
        decorate_blocks(doc, main)?;
        Ok(())
    }

    /// Load the first block eagerly if it is an LCP block, then reveal the
    /// body and wait for the first image of `main`
    pub async fn wait_for_lcp(&self, doc: &mut Document, main: NodeId) -> Result<(), PageError> {
        let first = doc.query_selector(doc.root(), ".block")?;
        let lcp_block = first.filter(|&block| {
            doc.attribute(block, BLOCK_NAME_ATTR)
                .is_some_and(|name| self.context.config().is_lcp_block(name))
        });
        if let Some(block) = lcp_block {
            self.loader().load_block(doc, block, true).await;
        }

        if let Some(body) = doc.body() {
            doc.add_class(body, APPEAR_CLASS);
        }

        let candidate = doc.query_selector(main, "img")?;
        if let Some(src) = candidate.and_then(|img| doc.attribute(img, "src")) {
            self.host.image_settled(src).await;
        }
        Ok(())
    }

    /// Everything below the fold: remaining blocks, header, fonts, favicon
    pub async fn load_lazy(&self, doc: &mut Document) -> Result<(), PageError> {
        let loader = self.loader();
        if let Some(main) = doc.find_first_tag("main") {
            loader.load_blocks(doc, main).await?;
        }

        match doc.query_selector(doc.root(), "header > div")? {
            Some(header) => {
                decorate_block(doc, header)?;
                loader.load_block(doc, header, false).await;
            }
            None => log::debug!("page has no header block"),
        }

        let fonts = self.context.config().fonts_href.clone();
        if load_style(doc, self.host, &fonts).await == StyleEvent::Error {
            log::warn!("failed to load fonts from {}", fonts);
        }

        let icon = format!(
            "{}{}",
            self.context.code_base_path(),
            self.context.config().favicon_path
        );
        add_fav_icon(doc, &icon);
        Ok(())
    }

    /// Run the delayed hooks
    pub fn load_delayed(&self, doc: &mut Document) {
        for hook in &self.delayed {
            hook(doc, self.context);
        }
    }

    /// The host saw the window `load` event
    pub fn on_load(&self) {
        sample_rum(self.context, self.host, "load", Map::new());
    }

    /// The host saw a click anywhere in the document
    pub fn on_click(&self) {
        sample_rum(self.context, self.host, "click", Map::new());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{block_status, BlockStatus};
    use crate::config::SiteConfig;
    use crate::section::{section_status, SectionStatus};
    use crate::testing::{init_logger, poll_once, FakeHost, GatedHost};
    use pretty_assertions::assert_eq;
    use std::task::Poll;

    const PAGE: &str = r#"<html><head>
<meta name="template" content="Landing">
<script src="/scripts/scripts.js" type="module"></script>
</head><body>
<header></header>
<main>
<div><div class="marquee--dark-"><div><div><h1>Welcome</h1><p>Intro</p><p><strong><a href="/buy">Buy</a></strong></p></div><div><img src="/hero.png"></div></div></div></div>
<div><p><a href="https://www.youtube.com/watch?v=42">Watch</a></p></div>
<div></div>
<div><div class="columns"><div><div>one</div><div>two</div></div></div></div>
</main>
</body></html>"#;

    fn boot(host: &FakeHost, registry: &BlockRegistry) -> (Document, PageContext) {
        init_logger();
        let mut doc = Document::parse(PAGE);
        let ctx = PageContext::new(&doc, "https://example.com/landing", SiteConfig::default()).unwrap();
        {
            let page = Page::new(host, &ctx, registry);
            pollster::block_on(page.load_page(&mut doc)).unwrap();
            assert_eq!(page.phase(), PagePhase::Booted);
        }
        (doc, ctx)
    }

    #[test]
    fn test_load_page() {
        let host = FakeHost::new();
        let registry = BlockRegistry::with_builtin();
        let (doc, _) = boot(&host, &registry);

        let body = doc.body().unwrap();
        assert!(doc.has_class(body, "landing-template"));
        assert!(doc.has_class(body, APPEAR_CLASS));

        let main = doc.find_first_tag("main").unwrap();
        let sections = doc.query_selector_all(main, ":scope > div.section-wrapper").unwrap();
        assert_eq!(sections.len(), 3);
        for &section in &sections {
            assert_eq!(section_status(&doc, section), Some(SectionStatus::Loaded));
        }
        assert!(doc.has_class(sections[0], "marquee-container"));

        let blocks = doc.query_selector_all(doc.root(), ".block").unwrap();
        let names: Vec<&str> = blocks
            .iter()
            .map(|&block| doc.attribute(block, BLOCK_NAME_ATTR).unwrap())
            .collect();
        assert_eq!(names, vec!["header", "marquee", "embed", "columns"]);
        for &block in &blocks {
            assert_eq!(block_status(&doc, block), Some(BlockStatus::Loaded));
        }

        let marquee = blocks[1];
        assert!(doc.query_selector(marquee, ".foreground .heading-XL").unwrap().is_some());
        assert!(doc.query_selector(marquee, "a.con-button.blue").unwrap().is_some());
    }

    #[test]
    fn test_lcp_block_loads_first() {
        let host = FakeHost::new();
        let registry = BlockRegistry::with_builtin();
        boot(&host, &registry);

        assert_eq!(
            host.stylesheets(),
            vec![
                "/blocks/marquee/marquee.css",
                "/blocks/embed/embed.css",
                "/blocks/columns/columns.css",
                "/blocks/header/header.css",
                "/fonts/fonts.css",
            ]
        );
        assert_eq!(host.images(), vec!["/hero.png"]);
    }

    #[test]
    fn test_head_after_boot() {
        let host = FakeHost::new();
        let registry = BlockRegistry::new();
        let (doc, _) = boot(&host, &registry);

        let head = doc.head().unwrap();
        let icon = doc.query_selector(head, r#"link[rel="icon"]"#).unwrap().unwrap();
        assert_eq!(doc.attribute(icon, "href"), Some("/img/icon.svg"));
        let stylesheets = doc.query_selector_all(head, r#"link[rel="stylesheet"]"#).unwrap();
        assert_eq!(stylesheets.len(), 5);
    }

    #[test]
    fn test_top_checkpoint_sent_when_sampled() {
        let host = FakeHost::new().with_random(0.001);
        let registry = BlockRegistry::new();
        boot(&host, &registry);

        let beacons = host.beacons();
        assert_eq!(beacons.len(), 1);
        assert!(beacons[0].1.contains(r#""checkpoint":"top""#));
    }

    #[test]
    fn test_delayed_hooks_run_last() {
        init_logger();
        let host = FakeHost::new();
        let registry = BlockRegistry::new();
        let mut doc = Document::parse(PAGE);
        let ctx = PageContext::new(&doc, "https://example.com/", SiteConfig::default()).unwrap();
        let page = Page::new(&host, &ctx, &registry).with_delayed(|doc, _| {
            let body = doc.ensure_body();
            let booted = doc
                .query_selector(body, "header .block[data-block-status=\"loaded\"]")
                .ok()
                .flatten()
                .is_some();
            doc.set_attribute(body, "data-delayed", &booted.to_string());
        });

        assert_eq!(page.phase(), PagePhase::Pending);
        pollster::block_on(page.load_page(&mut doc)).unwrap();
        let body = doc.body().unwrap();
        assert_eq!(doc.attribute(body, "data-delayed"), Some("true"));
    }

    #[test]
    fn test_page_without_main() {
        init_logger();
        let host = FakeHost::new();
        let registry = BlockRegistry::new();
        let mut doc = Document::parse("<html><head></head><body><p>plain</p></body></html>");
        let ctx = PageContext::new(&doc, "https://example.com/", SiteConfig::default()).unwrap();
        let page = Page::new(&host, &ctx, &registry);

        pollster::block_on(page.load_page(&mut doc)).unwrap();
        let body = doc.body().unwrap();
        assert!(!doc.has_class(body, APPEAR_CLASS));
        assert_eq!(host.stylesheets(), vec!["/fonts/fonts.css"]);
    }

    #[test]
    fn test_eager_phase_settles_before_lazy_links() {
        init_logger();
        let host = GatedHost::new();
        let registry = BlockRegistry::with_builtin();
        let mut doc = Document::parse(PAGE);
        let ctx = PageContext::new(&doc, "https://example.com/landing", SiteConfig::default()).unwrap();
        let page = Page::new(&host, &ctx, &registry);

        let mut booting = Box::pin(page.load_page(&mut doc));
        assert!(poll_once(&mut booting).is_pending());
        assert!(poll_once(&mut booting).is_pending());
        assert_eq!(page.phase(), PagePhase::Eager);
        assert_eq!(host.events(), vec!["style /blocks/marquee/marquee.css"]);

        assert!(host.release_next());
        assert!(poll_once(&mut booting).is_pending());
        assert_eq!(page.phase(), PagePhase::Lazy);
        assert_eq!(
            host.events(),
            vec![
                "style /blocks/marquee/marquee.css",
                "image /hero.png",
                "style /blocks/embed/embed.css",
            ]
        );

        let result = loop {
            match poll_once(&mut booting) {
                Poll::Ready(result) => break result,
                Poll::Pending => assert!(host.release_next()),
            }
        };
        result.unwrap();
        drop(booting);

        assert_eq!(page.phase(), PagePhase::Booted);
        assert_eq!(host.events().len(), 6);
        assert_eq!(host.events()[5], "style /fonts/fonts.css");
        assert!(doc.has_class(doc.body().unwrap(), APPEAR_CLASS));
    }

    #[test]
    fn test_load_and_click_checkpoints() {
        let host = FakeHost::new().with_random(0.001);
        let registry = BlockRegistry::new();
        let (_, ctx) = boot(&host, &registry);
        let page = Page::new(&host, &ctx, &registry);

        page.on_load();
        page.on_click();
        page.on_click();

        let checkpoints: Vec<String> = host
            .beacons()
            .iter()
            .map(|(_, body)| {
                let body: serde_json::Value = serde_json::from_str(body).unwrap();
                body["checkpoint"].as_str().unwrap().to_string()
            })
            .collect();
        assert_eq!(checkpoints, vec!["top", "load", "click", "click"]);
    }

    #[test]
    fn test_unsampled_page_ignores_events() {
        let host = FakeHost::new();
        let registry = BlockRegistry::new();
        let (_, ctx) = boot(&host, &registry);
        let page = Page::new(&host, &ctx, &registry);

        page.on_load();
        page.on_click();
        assert!(host.beacons().is_empty());
    }
}
