use crate::error::ConfigError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

/// Optional limits on which normalized links are followed
///
/// The default configuration accepts every http(s) URL.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScopeConfig {
    /// Only follow links on the start URL's host
    #[serde(default)]
    pub same_domain: bool,

    /// Only follow links whose path starts with this prefix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_prefix: Option<String>,

    /// Regex patterns for URLs to include (if empty, all URLs are included unless excluded)
    #[serde(default)]
    pub include_patterns: Vec<String>,

    /// Regex patterns for URLs to exclude (these take precedence over include patterns)
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

/// Compiled form of [`ScopeConfig`], bound to the start URL's host
#[derive(Debug, Default)]
pub struct ScopeFilter {
    required_host: Option<String>,
    path_prefix: Option<String>,
    include_regexes: Vec<Regex>,
    exclude_regexes: Vec<Regex>,
}

impl ScopeFilter {
    /// Filter that accepts every URL
    #[cfg(test)]
    pub fn permissive() -> Self {
        Self::default()
    }

    /// Compile a scope configuration for a crawl rooted at `root`
    pub fn new(config: &ScopeConfig, root: &Url) -> Result<Self, ConfigError> {
        let include_regexes = compile(&config.include_patterns)?;
        let exclude_regexes = compile(&config.exclude_patterns)?;

        let required_host = if config.same_domain {
            Some(root.host_str().map(str::to_string).ok_or_else(|| {
                ConfigError::Validation(format!("start URL {root} has no host"))
            })?)
        } else {
            None
        };

        Ok(Self {
            required_host,
            path_prefix: config.path_prefix.clone(),
            include_regexes,
            exclude_regexes,
        })
    }

    /// Determine if a normalized URL may become a crawl target
    pub fn allows(&self, url: &Url) -> bool {
        if let Some(host) = &self.required_host {
            if url.host_str() != Some(host.as_str()) {
                return false;
            }
        }

        if let Some(prefix) = &self.path_prefix {
            if !url.path().starts_with(prefix.as_str()) {
                return false;
            }
        }

        let url_str = url.as_str();
        if self.exclude_regexes.iter().any(|re| re.is_match(url_str)) {
            return false;
        }

        self.include_regexes.is_empty() || self.include_regexes.iter().any(|re| re.is_match(url_str))
    }
}

fn compile(patterns: &[String]) -> Result<Vec<Regex>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| Regex::new(pattern).map_err(ConfigError::from))
        .collect()
}
