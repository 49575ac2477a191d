//! Client and browse configuration

use std::time::Duration;

use url::Url;

use crate::{Error, Result};

/// Environment variable holding the API base URL
pub const API_BASE_ENV: &str = "WORDLIST_API_BASE";
/// Environment variable holding the request timeout in seconds
pub const API_TIMEOUT_ENV: &str = "WORDLIST_API_TIMEOUT_SECS";
/// API base used when nothing is configured
pub const DEFAULT_API_BASE: &str = "http://localhost:8080/api/";

/// Words per page in the browse view
pub const DEFAULT_PAGE_SIZE: u32 = 10;
/// Dictionaries per page in the sidebar filter
pub const DEFAULT_DICTIONARY_PAGE_SIZE: u32 = 5;
/// Quiet interval before a typed keyword is considered settled
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Connection settings for [`crate::ApiClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL, always ending in `/`
    pub base_url: Url,
    /// Request timeout; `None` leaves it to the transport
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        Ok(Self {
            base_url: Url::parse(&base)?,
            timeout: None,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Read `WORDLIST_API_BASE` and `WORDLIST_API_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from named settings, as [`from_env`](Self::from_env) does with
    /// the process environment
    ///
    /// A missing base falls back to [`DEFAULT_API_BASE`]; a missing timeout
    /// leaves it unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base = lookup(API_BASE_ENV).unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let config = Self::new(&base)?;

        match lookup(API_TIMEOUT_ENV) {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    Error::InvalidInput(format!("{API_TIMEOUT_ENV} must be a number of seconds, got {raw:?}"))
                })?;
                Ok(config.with_timeout(Duration::from_secs(secs)))
            }
            None => Ok(config),
        }
    }
}

/// Paging and input timing for the browse view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrowseConfig {
    pub page_size: u32,
    pub dictionary_page_size: u32,
    pub debounce: Duration,
}

impl Default for BrowseConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            dictionary_page_size: DEFAULT_DICTIONARY_PAGE_SIZE,
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let config = ClientConfig::new("http://example.com/api").unwrap();
        assert_eq!(config.base_url.as_str(), "http://example.com/api/");
        assert_eq!(
            config.base_url.join("dictionaries").unwrap().as_str(),
            "http://example.com/api/dictionaries"
        );
        assert!(config.timeout.is_none());
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            ClientConfig::new("not a url"),
            Err(Error::InvalidUrl(_))
        ));
    }

    fn settings<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |name: &str| {
            pairs
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.to_string())
        }
    }

    #[test]
    fn test_lookup_defaults() {
        let config = ClientConfig::from_lookup(settings(&[])).unwrap();
        assert_eq!(config.base_url.as_str(), DEFAULT_API_BASE);
        assert!(config.timeout.is_none());
    }

    #[test]
    fn test_lookup_base_without_slash() {
        let config =
            ClientConfig::from_lookup(settings(&[(API_BASE_ENV, "https://words.example.org/api")]))
                .unwrap();
        assert_eq!(config.base_url.as_str(), "https://words.example.org/api/");
    }

    #[test]
    fn test_lookup_timeout() {
        let config = ClientConfig::from_lookup(settings(&[(API_TIMEOUT_ENV, " 15 ")])).unwrap();
        assert_eq!(config.timeout, Some(Duration::from_secs(15)));
    }

    #[test]
    fn test_lookup_rejects_non_numeric_timeout() {
        assert!(matches!(
            ClientConfig::from_lookup(settings(&[(API_TIMEOUT_ENV, "abc")])),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_browse_defaults() {
        let config = BrowseConfig::default();
        assert_eq!(config.page_size, 10);
        assert_eq!(config.dictionary_page_size, 5);
        assert_eq!(config.debounce, Duration::from_millis(300));
    }
}
