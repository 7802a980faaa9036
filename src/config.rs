//! Explicit configuration handed to the remote client.

use crate::error::{Error, Result};
use derive_builder::Builder;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

pub const DEFAULT_DATABASE_NAME: &str = "comicat.sqlite";
pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub(crate) const DEFAULT_USER_AGENT: &str = concat!("comicat/", env!("CARGO_PKG_VERSION"));

/// URL which new path segments can be appended to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrl(Url);

impl BaseUrl {
    pub fn parse(s: &str) -> Result<Self> {
        let url = Url::parse(s)?;
        if url.cannot_be_a_base() {
            return Err(Error::Config(format!("{} cannot be used as a base URL", s)));
        }
        Ok(Self(url))
    }

    /// Appends each segment, percent-encoding it as a single path segment.
    pub fn join<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.0.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }
}

impl FromStr for BaseUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl std::fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

/// Where the remote catalog lives and how to talk to it.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct RemoteConfig {
    /// Root of the JSON API, e.g. `https://example.com/api`.
    pub api_root: BaseUrl,
    /// Root of the static file host serving thumbnails and page images.
    pub static_root: BaseUrl,
    #[builder(default = "DEFAULT_TIMEOUT")]
    pub timeout: Duration,
    #[builder(default = "DEFAULT_USER_AGENT.to_owned()")]
    pub user_agent: String,
}

impl RemoteConfig {
    pub fn builder() -> RemoteConfigBuilder {
        RemoteConfigBuilder::default()
    }

    /// Shorthand for a config with default timeout and user agent.
    pub fn new(api_root: &str, static_root: &str) -> Result<Self> {
        Self::builder()
            .api_root(BaseUrl::parse(api_root)?)
            .static_root(BaseUrl::parse(static_root)?)
            .build()
            .map_err(|e| Error::Config(e.to_string()))
    }
}

/// `~/comicat.sqlite`, or the working directory if no home directory is known.
pub fn default_database_path() -> PathBuf {
    let mut path = dirs::home_dir().unwrap_or_default();
    path.push(DEFAULT_DATABASE_NAME);
    path
}
