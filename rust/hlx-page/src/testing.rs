//! Test doubles shared by the unit tests

use std::cell::RefCell;
use std::collections::HashSet;
use std::future::Future;
use std::task::{Context, Poll};

use futures::channel::oneshot;
use futures::future::{self, FutureExt, LocalBoxFuture};

use crate::host::{Host, StyleEvent};

pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Poll `future` once without a real executor
pub(crate) fn poll_once<F: Future + Unpin>(future: &mut F) -> Poll<F::Output> {
    let mut cx = Context::from_waker(futures::task::noop_waker_ref());
    future.poll_unpin(&mut cx)
}

/// Host whose events settle immediately and whose effects are recorded
pub(crate) struct FakeHost {
    random: f64,
    now: u64,
    failing: HashSet<String>,
    stylesheets: RefCell<Vec<String>>,
    images: RefCell<Vec<String>>,
    beacons: RefCell<Vec<(String, String)>>,
}

impl FakeHost {
    pub(crate) fn new() -> Self {
        Self {
            random: 0.5,
            now: 1_600_000_000_000,
            failing: HashSet::new(),
            stylesheets: RefCell::new(Vec::new()),
            images: RefCell::new(Vec::new()),
            beacons: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn with_random(mut self, random: f64) -> Self {
        self.random = random;
        self
    }

    pub(crate) fn with_now(mut self, now: u64) -> Self {
        self.now = now;
        self
    }

    /// Make the stylesheet at `href` report `error`
    pub(crate) fn failing_stylesheet(mut self, href: &str) -> Self {
        self.failing.insert(href.to_string());
        self
    }

    pub(crate) fn stylesheets(&self) -> Vec<String> {
        self.stylesheets.borrow().clone()
    }

    pub(crate) fn images(&self) -> Vec<String> {
        self.images.borrow().clone()
    }

    pub(crate) fn beacons(&self) -> Vec<(String, String)> {
        self.beacons.borrow().clone()
    }
}

impl Host for FakeHost {
    fn stylesheet_settled(&self, href: &str) -> LocalBoxFuture<'_, StyleEvent> {
        self.stylesheets.borrow_mut().push(href.to_string());
        let event = if self.failing.contains(href) {
            StyleEvent::Error
        } else {
            StyleEvent::Load
        };
        future::ready(event).boxed_local()
    }

    fn image_settled(&self, src: &str) -> LocalBoxFuture<'_, ()> {
        self.images.borrow_mut().push(src.to_string());
        future::ready(()).boxed_local()
    }

    fn send_beacon(&self, url: &str, body: &str) -> bool {
        self.beacons
            .borrow_mut()
            .push((url.to_string(), body.to_string()));
        true
    }

    fn random(&self) -> f64 {
        self.random
    }

    fn now_millis(&self) -> u64 {
        self.now
    }
}

/// Host whose stylesheets stay pending until the test releases them
///
/// Stylesheet and image requests are logged in order as `style <href>` and
/// `image <src>`. Images settle immediately.
pub(crate) struct GatedHost {
    events: RefCell<Vec<String>>,
    pending: RefCell<Vec<(String, oneshot::Sender<StyleEvent>)>>,
}

impl GatedHost {
    pub(crate) fn new() -> Self {
        Self {
            events: RefCell::new(Vec::new()),
            pending: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn events(&self) -> Vec<String> {
        self.events.borrow().clone()
    }

    /// Stylesheets still waiting for their `load` event
    pub(crate) fn pending(&self) -> Vec<String> {
        self.pending.borrow().iter().map(|(href, _)| href.clone()).collect()
    }

    /// Fire `load` for the oldest pending stylesheet; false if none is waiting
    pub(crate) fn release_next(&self) -> bool {
        let mut pending = self.pending.borrow_mut();
        if pending.is_empty() {
            return false;
        }
        let (_, sender) = pending.remove(0);
        let _ = sender.send(StyleEvent::Load);
        true
    }
}

impl Host for GatedHost {
    fn stylesheet_settled(&self, href: &str) -> LocalBoxFuture<'_, StyleEvent> {
        self.events.borrow_mut().push(format!("style {href}"));
        let (sender, receiver) = oneshot::channel();
        self.pending.borrow_mut().push((href.to_string(), sender));
        receiver.map(|event| event.unwrap_or(StyleEvent::Error)).boxed_local()
    }

    fn image_settled(&self, src: &str) -> LocalBoxFuture<'_, ()> {
        self.events.borrow_mut().push(format!("image {src}"));
        future::ready(()).boxed_local()
    }

    fn send_beacon(&self, _url: &str, _body: &str) -> bool {
        true
    }

    fn random(&self) -> f64 {
        0.5
    }

    fn now_millis(&self) -> u64 {
        1_600_000_000_000
    }
}
