//! Site configuration
//!
//! Project-level constants (LCP block list, RUM generation, live hosts, asset
//! paths) live in a `SiteConfig` that can be loaded from TOML. Every field has
//! a default, so an empty document yields the stock configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse site config: {source}")]
    ConfigParseError { source: toml::de::Error },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Blocks loaded eagerly when they are the first block on the page
    pub lcp_blocks: Vec<String>,
    /// Generation tag sent with every RUM ping
    pub rum_generation: String,
    /// RUM collection endpoint; the sampling weight is appended as a path segment
    pub rum_endpoint: String,
    /// Sampling weight when `?rum=on` is absent (1 in `weight` page views)
    pub rum_weight: u32,
    /// Host suffixes whose links are rewritten to relative paths
    pub live_hosts: Vec<String>,
    /// Link prefixes turned into `embed` blocks
    pub embed_prefixes: Vec<String>,
    /// File extensions that get a `download` attribute
    pub download_extensions: Vec<String>,
    /// Global font stylesheet loaded in the lazy phase
    pub fonts_href: String,
    /// Favicon path below the code base path
    pub favicon_path: String,
    /// Path suffix identifying the page script, used to derive the code base path
    pub script_path: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            lcp_blocks: vec!["marquee".to_string()],
            rum_generation: "consonant".to_string(),
            rum_endpoint: "https://rum.hlx3.page/.rum".to_string(),
            rum_weight: 100,
            live_hosts: vec![
                "consonant--adobecom.hlx3.page".to_string(),
                "consonant--adobecom.hlx.live".to_string(),
            ],
            embed_prefixes: vec![
                "https://www.youtube.com".to_string(),
                "https://gist.github.com".to_string(),
            ],
            download_extensions: vec!["crx".to_string()],
            fonts_href: "/fonts/fonts.css".to_string(),
            favicon_path: "/img/icon.svg".to_string(),
            script_path: "/scripts/scripts.js".to_string(),
        }
    }
}

impl SiteConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::ConfigParseError { source })
    }

    pub fn is_lcp_block(&self, name: &str) -> bool {
        self.lcp_blocks.iter().any(|block| block == name)
    }

    pub fn is_live_host(&self, host: &str) -> bool {
        self.live_hosts.iter().any(|suffix| host.ends_with(suffix.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = SiteConfig::from_toml_str("").unwrap();
        assert_eq!(config, SiteConfig::default());
        assert!(config.is_lcp_block("marquee"));
        assert_eq!(config.rum_weight, 100);
    }

    #[test]
    fn test_partial_override() {
        let config = SiteConfig::from_toml_str(
            r#"
            lcp_blocks = ["hero", "marquee"]
            rum_weight = 10
            "#,
        )
        .unwrap();

        assert!(config.is_lcp_block("hero"));
        assert_eq!(config.rum_weight, 10);
        assert_eq!(config.rum_generation, "consonant");
    }

    #[test]
    fn test_live_host_suffix() {
        let config = SiteConfig::default();
        assert!(config.is_live_host("main--consonant--adobecom.hlx.live"));
        assert!(!config.is_live_host("example.com"));
    }

    #[test]
    fn test_invalid_toml() {
        let err = SiteConfig::from_toml_str("rum_weight = \"lots\"").unwrap_err();
        assert!(matches!(err, ConfigError::ConfigParseError { .. }));
    }

    #[test]
    fn test_serialization_roundtrip() {
        let original = SiteConfig::default();
        let toml_str = toml::to_string(&original).unwrap();
        assert_eq!(SiteConfig::from_toml_str(&toml_str).unwrap(), original);
    }
}
