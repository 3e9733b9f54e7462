//! Host environment abstraction
//!
//! Everything a browser provides asynchronously or non-deterministically is
//! routed through [`Host`]: stylesheet and image load events, beacons, the
//! random source and the clock. Futures are `LocalBoxFuture`s because the
//! page runs on a single thread.

use futures::future::LocalBoxFuture;

/// Outcome reported for a stylesheet link
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StyleEvent {
    Load,
    Error,
    /// The link was already present, nothing was inserted
    Noop,
}

pub trait Host {
    /// Resolves once the `<link rel=stylesheet href=...>` fires `load` or `error`
    fn stylesheet_settled(&self, href: &str) -> LocalBoxFuture<'_, StyleEvent>;

    /// Resolves once the image with `src` has loaded or failed; immediately if complete
    fn image_settled(&self, src: &str) -> LocalBoxFuture<'_, ()>;

    /// Fire-and-forget POST; returns whether the host queued it
    fn send_beacon(&self, url: &str, body: &str) -> bool;

    /// Uniform draw from `[0, 1)`
    fn random(&self) -> f64;

    /// Milliseconds since the Unix epoch
    fn now_millis(&self) -> u64;
}
