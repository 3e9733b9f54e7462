//! Block loader
//!
//! Loading a block means attaching its stylesheet and running its decorator.
//! The stylesheet stays in flight while the decorator runs; the block is
//! marked `loaded` once both are done, whatever the outcome. Blocks of a page
//! are loaded one after the other in document order so that sections settle
//! top to bottom.

use hlx_dom::{Document, DomError, NodeId};

use crate::block::{block_status, set_block_status, BlockStatus, BLOCK_NAME_ATTR};
use crate::context::PageContext;
use crate::head::load_style;
use crate::host::{Host, StyleEvent};
use crate::registry::{BlockContext, BlockRegistry};
use crate::section::update_sections_status;

pub struct Loader<'a> {
    host: &'a dyn Host,
    context: &'a PageContext,
    registry: &'a BlockRegistry,
}

impl<'a> Loader<'a> {
    pub fn new(host: &'a dyn Host, context: &'a PageContext, registry: &'a BlockRegistry) -> Self {
        Self {
            host,
            context,
            registry,
        }
    }

    /// Load one block; blocks already loading or loaded are left alone
    ///
    /// Never fails: decorator and stylesheet problems are logged.
    pub async fn load_block(&self, doc: &mut Document, block: NodeId, eager: bool) {
        if matches!(
            block_status(doc, block),
            Some(BlockStatus::Loading | BlockStatus::Loaded)
        ) {
            return;
        }
        set_block_status(doc, block, BlockStatus::Loading);

        let Some(name) = doc.attribute(block, BLOCK_NAME_ATTR).map(str::to_string) else {
            log::warn!("block {:?} has no {} attribute", block, BLOCK_NAME_ATTR);
            set_block_status(doc, block, BlockStatus::Loaded);
            return;
        };
        log::debug!("loading block {} (eager {})", name, eager);

        let href = self.context.block_asset(&name, "css");
        let stylesheet = load_style(doc, self.host, &href);

        let cx = BlockContext {
            name: &name,
            eager,
            page: self.context,
        };
        if let Err(err) = self.registry.decorate(doc, block, &cx) {
            log::warn!("failed to load module for {}: {}", name, err);
        }

        if stylesheet.await == StyleEvent::Error {
            log::warn!("failed to load stylesheet {}", href);
        }
        set_block_status(doc, block, BlockStatus::Loaded);
    }

    /// Load every block under `main` sequentially, updating section status as they finish
    pub async fn load_blocks(&self, doc: &mut Document, main: NodeId) -> Result<(), DomError> {
        update_sections_status(doc, main)?;
        let blocks = doc.query_selector_all(main, "div.block")?;
        for block in blocks {
            self.load_block(doc, block, false).await;
            update_sections_status(doc, main)?;
        }
        Ok(())
    }
}
