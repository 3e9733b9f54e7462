//! HLX DOM - arena document model for page decoration
//!
//! This crate provides:
//! - An arena DOM with 1-indexed node ids
//! - HTML parsing using the html5ever tokenizer
//! - CSS selector queries using cssparser
//! - HTML serialization
//!
//! The FFI module exposes the parser to embedding hosts.

pub mod error;
pub mod node;
pub mod parser;
pub mod selector;
pub mod serialize;
pub mod ffi;

pub use error::DomError;
pub use node::{Attribute, Document, NodeId, NodeKind};
pub use selector::SelectorList;
