//! Page context
//!
//! One `PageContext` is created per page view and handed to every phase. It
//! carries the site configuration, the page location and the state that
//! lives for the whole page: the code base path, the lighthouse flag, the
//! publish dependency list and the lazily drawn RUM sample.

use std::cell::{OnceCell, RefCell};

use hlx_dom::Document;
use url::Url;

use crate::config::SiteConfig;
use crate::error::PageError;
use crate::rum::RumState;

pub struct PageContext {
    config: SiteConfig,
    location: Url,
    code_base_path: String,
    lighthouse: bool,
    dependencies: RefCell<Vec<String>>,
    pub(crate) rum: OnceCell<RumState>,
}

impl PageContext {
    /// Build the context for the page at `location`
    ///
    /// The code base path is taken from the page script element whose `src`
    /// ends with the configured script path; it is empty when there is none.
    pub fn new(doc: &Document, location: &str, config: SiteConfig) -> Result<Self, PageError> {
        let location = Url::parse(location).map_err(|source| PageError::InvalidLocation {
            location: location.to_string(),
            source,
        })?;
        let lighthouse = query_param(&location, "lighthouse").as_deref() == Some("on");
        let code_base_path = code_base_path(doc, &location, &config.script_path)?;
        log::debug!(
            "page context for {} (code base '{}', lighthouse {})",
            location,
            code_base_path,
            lighthouse
        );

        Ok(Self {
            config,
            location,
            code_base_path,
            lighthouse,
            dependencies: RefCell::new(Vec::new()),
            rum: OnceCell::new(),
        })
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn location(&self) -> &Url {
        &self.location
    }

    pub fn code_base_path(&self) -> &str {
        &self.code_base_path
    }

    pub fn is_lighthouse(&self) -> bool {
        self.lighthouse
    }

    /// First value of a query parameter of the page location
    pub fn query_param(&self, key: &str) -> Option<String> {
        query_param(&self.location, key)
    }

    /// `<code base>/blocks/<name>/<name>.<ext>`
    pub fn block_asset(&self, name: &str, ext: &str) -> String {
        format!("{}/blocks/{name}/{name}.{ext}", self.code_base_path)
    }

    /// Record URLs the published page depends on
    pub fn add_publish_dependencies<I, S>(&self, urls: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies
            .borrow_mut()
            .extend(urls.into_iter().map(Into::into));
    }

    pub fn publish_dependencies(&self) -> Vec<String> {
        self.dependencies.borrow().clone()
    }
}

fn query_param(location: &Url, key: &str) -> Option<String> {
    location
        .query_pairs()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.into_owned())
}

fn code_base_path(doc: &Document, location: &Url, script_path: &str) -> Result<String, PageError> {
    let selector = format!("script[src$=\"{}\"]", script_path.replace('"', "\\\""));
    let Some(script) = doc.query_selector(doc.root(), &selector)? else {
        return Ok(String::new());
    };
    let src = doc.attribute(script, "src").unwrap_or_default();
    match location.join(src) {
        Ok(url) => Ok(url
            .path()
            .split(script_path)
            .next()
            .unwrap_or_default()
            .to_string()),
        Err(err) => {
            log::warn!("cannot resolve page script {}: {}", src, err);
            Ok(String::new())
        }
    }
}
