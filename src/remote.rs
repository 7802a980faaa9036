//! Remote catalog client.
//! Stateless HTTP calls against the listing and detail endpoints, plus the
//! URL templates for static thumbnails and page images.

use crate::config::{BaseUrl, RemoteConfig};
use crate::error::{Error, Result};
use crate::models::{BasicComicRecord, DetailedComicRecord};
use serde::de::DeserializeOwned;
use url::Url;

const LISTING_ENDPOINT: &str = "all-comics";
const DETAIL_ENDPOINT: &str = "comics";
const STATIC_COMICS_DIR: &str = "comics";
const THUMBNAIL_FILE: &str = "thumbnail.webp";

/// Read-only view of a remote comic catalog.
pub trait CatalogSource {
    /// Full basic listing. Failure aborts a synchronization cycle.
    fn list_all(&self) -> Result<Vec<BasicComicRecord>>;

    /// Detail record of a single comic, addressed by name.
    fn get_detail(&self, name: &str) -> Result<DetailedComicRecord>;

    /// Root used for thumbnail and page image URLs.
    fn static_root(&self) -> &BaseUrl;
}

/// `{static}/comics/{name}/thumbnail.webp`
pub fn thumbnail_url(static_root: &BaseUrl, name: &str) -> String {
    static_root
        .join(vec![STATIC_COMICS_DIR, name, THUMBNAIL_FILE])
        .to_string()
}

/// `{static}/comics/{name}/{page:03}.jpg`
pub fn page_url(static_root: &BaseUrl, name: &str, page: u32) -> String {
    let file = format!("{:03}.jpg", page);
    static_root
        .join(vec![STATIC_COMICS_DIR, name, file.as_str()])
        .to_string()
}

/// URLs of pages `1..=pages`, in order.
pub fn page_urls(static_root: &BaseUrl, name: &str, pages: u32) -> Vec<String> {
    (1..=pages).map(|p| page_url(static_root, name, p)).collect()
}

/// [`CatalogSource`] backed by the remote JSON API.
pub struct RemoteClient {
    agent: ureq::Agent,
    config: RemoteConfig,
}

impl RemoteClient {
    pub fn new(config: RemoteConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build();
        Self { agent, config }
    }

    /// GETs and decodes `url`. A 404 becomes `on_missing()`; every other
    /// failed status or transport error is `RemoteUnavailable`.
    fn fetch<T, F>(&self, url: Url, what: &str, on_missing: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: FnOnce() -> Error,
    {
        log::debug!("GET {}", url);
        let body = match self.agent.get(url.as_str()).call() {
            Ok(resp) => resp.into_string().map_err(|e| {
                Error::RemoteUnavailable(format!("cannot read {} response: {}", what, e))
            })?,
            Err(ureq::Error::Status(404, _)) => return Err(on_missing()),
            Err(ureq::Error::Status(code, _)) => {
                return Err(Error::RemoteUnavailable(format!(
                    "{} request returned HTTP {}",
                    what, code
                )))
            }
            Err(e) => {
                return Err(Error::RemoteUnavailable(format!(
                    "{} request failed: {}",
                    what, e
                )))
            }
        };

        serde_json::from_str(&body)
            .map_err(|e| Error::MalformedRecord(format!("{}: {}", what, e)))
    }
}

impl CatalogSource for RemoteClient {
    fn list_all(&self) -> Result<Vec<BasicComicRecord>> {
        let url = self.config.api_root.join(vec![LISTING_ENDPOINT]);
        let comics: Vec<BasicComicRecord> = self.fetch(url, "comic listing", || {
            Error::RemoteUnavailable("comic listing request returned HTTP 404".to_owned())
        })?;
        log::debug!("Remote listing contains {} comics", comics.len());
        Ok(comics)
    }

    fn get_detail(&self, name: &str) -> Result<DetailedComicRecord> {
        let url = self.config.api_root.join(vec![DETAIL_ENDPOINT, name]);
        self.fetch(url, name, || Error::NotFound(name.to_owned()))
    }

    fn static_root(&self) -> &BaseUrl {
        &self.config.static_root
    }
}
