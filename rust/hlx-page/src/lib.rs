//! HLX Page - section/block decoration and progressive loading
//!
//! This crate provides:
//! - Section wrapping and block classification with status tracking
//! - A sequential block loader driven by a decorator registry
//! - The eager/lazy/delayed page sequencer
//! - Anchor normalization, synthetic blocks and head helpers
//! - RUM sampling through the embedding host
//!
//! Browser events reach the crate through the [`host::Host`] trait.

pub mod anchors;
pub mod block;
pub mod blocks;
pub mod config;
pub mod context;
pub mod error;
pub mod head;
pub mod host;
pub mod loader;
pub mod metadata;
pub mod page;
pub mod registry;
pub mod rum;
pub mod section;

#[cfg(test)]
mod testing;

pub use block::{BlockName, BlockStatus, CellContent};
pub use config::{ConfigError, SiteConfig};
pub use context::PageContext;
pub use error::{BlockError, PageError};
pub use host::{Host, StyleEvent};
pub use loader::Loader;
pub use page::{Page, PagePhase};
pub use registry::{BlockContext, BlockDecorator, BlockRegistry};
pub use section::SectionStatus;
