//! Block decorators shipped with the crate
//!
//! Each block lives in its own module and exposes a unit struct implementing
//! [`crate::registry::BlockDecorator`].

pub mod marquee;
