//! Block decorator registry
//!
//! Block behavior is looked up by block name at load time. Decorators are
//! registered once at startup; plain functions with the right signature work
//! as decorators too.

use std::collections::HashMap;

use hlx_dom::{Document, NodeId};

use crate::blocks::marquee::Marquee;
use crate::context::PageContext;
use crate::error::BlockError;

/// What a decorator gets to know about the block it is decorating
pub struct BlockContext<'a> {
    pub name: &'a str,
    pub eager: bool,
    pub page: &'a PageContext,
}

pub trait BlockDecorator {
    fn decorate(&self, doc: &mut Document, block: NodeId, cx: &BlockContext<'_>) -> Result<(), BlockError>;
}

impl<F> BlockDecorator for F
where
    F: Fn(&mut Document, NodeId, &BlockContext<'_>) -> Result<(), BlockError>,
{
    fn decorate(&self, doc: &mut Document, block: NodeId, cx: &BlockContext<'_>) -> Result<(), BlockError> {
        self(doc, block, cx)
    }
}

#[derive(Default)]
pub struct BlockRegistry {
    decorators: HashMap<String, Box<dyn BlockDecorator>>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the decorators shipped in this crate
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register("marquee", Marquee);
        registry
    }

    /// Register `decorator` under `name`, replacing an earlier one
    pub fn register<D>(&mut self, name: &str, decorator: D) -> &mut Self
    where
        D: BlockDecorator + 'static,
    {
        if self
            .decorators
            .insert(name.to_string(), Box::new(decorator))
            .is_some()
        {
            log::debug!("decorator for '{}' replaced", name);
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&dyn BlockDecorator> {
        self.decorators.get(name).map(|decorator| decorator.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.decorators.contains_key(name)
    }

    /// Run the decorator registered for `cx.name`
    pub fn decorate(&self, doc: &mut Document, block: NodeId, cx: &BlockContext<'_>) -> Result<(), BlockError> {
        let decorator = self
            .get(cx.name)
            .ok_or_else(|| BlockError::UnknownBlock(cx.name.to_string()))?;
        decorator.decorate(doc, block, cx)
    }
}
