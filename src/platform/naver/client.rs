//! Represents a client abstraction for `comic.naver.com`, both public and private methods.

use super::{
    cache::PageCache,
    catalog::{self, Catalog, CatalogEntry, Query},
    errors::{CatalogError, ClientError, DownloadError, WebtoonError},
    webtoon::{
        self, Webtoon,
        episode::download::{self, Range, Report},
    },
};
use crate::stdx::http::DEFAULT_USER_AGENT;
use anyhow::Context;
use std::{
    future::Future,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{error, info};
use url::Url;

const HOME_URL: &str = "https://comic.naver.com/webtoon/weekday.nhn";
const LIST_URL: &str = "https://comic.naver.com/webtoon/list.nhn";
const DETAIL_URL: &str = "https://comic.naver.com/webtoon/detail.nhn";

const DATA_DIR: &str = "naver-webtoon-data";
const LISTING_FILE: &str = "webtoon-list.html";

/// The HTTP requests the crawler makes.
///
/// Implemented for [`reqwest::Client`], which is what a [`Client`] uses unless
/// built with [`ClientBuilder::build_with()`]. Any non-success status must be
/// returned as an error.
pub trait Http: Clone + Send + Sync {
    /// `GET` a page, returning its body as text.
    fn text(&self, url: &Url) -> impl Future<Output = anyhow::Result<String>> + Send;

    /// `GET` an image, sending `referer` as the `Referer` header, returning the raw bytes.
    fn bytes(&self, url: &Url, referer: &str) -> impl Future<Output = anyhow::Result<Vec<u8>>> + Send;
}

impl Http for reqwest::Client {
    async fn text(&self, url: &Url) -> anyhow::Result<String> {
        let response = self.get(url.as_str()).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }

    async fn bytes(&self, url: &Url, referer: &str) -> anyhow::Result<Vec<u8>> {
        let response = self
            .get(url.as_str())
            .header("Referer", referer)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.bytes().await?.to_vec())
    }
}

/// The three pages of the site the crawler reads from.
#[derive(Debug)]
pub(super) struct Endpoints {
    /// Listing of the currently featured webtoons.
    pub home: Url,
    /// A webtoon's own page, listing its episodes. Takes `titleId`.
    pub list: Url,
    /// An episode's page with its images. Takes `titleId` and `no`.
    pub detail: Url,
}

/// A builder for configuring and creating instances of [`Client`] with custom settings.
///
/// # Example
///
/// ```
/// # use naver_webtoon_crawler::platform::naver::ClientBuilder;
/// let client = ClientBuilder::new()
///     .root("downloads/naver")
///     .user_agent("custom-agent/1.0")
///     .build()?;
/// # Ok::<(), naver_webtoon_crawler::platform::naver::errors::ClientError>(())
/// ```
#[derive(Debug)]
pub struct ClientBuilder {
    builder: reqwest::ClientBuilder,
    root: PathBuf,
    home: String,
    list: String,
    detail: String,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default settings.
    ///
    /// Pages are cached under `naver-webtoon-data` in the working directory and
    /// requests are sent with a `naver-webtoon-crawler/VERSION` user agent.
    #[must_use]
    pub fn new() -> Self {
        let builder = reqwest::Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .use_rustls_tls()
            .brotli(true);

        Self {
            builder,
            root: PathBuf::from(DATA_DIR),
            home: HOME_URL.to_owned(),
            list: LIST_URL.to_owned(),
            detail: DETAIL_URL.to_owned(),
        }
    }

    /// Sets the directory cached pages and downloaded images are written to.
    #[must_use]
    pub fn root<P>(self, root: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Self {
            root: root.into(),
            ..self
        }
    }

    /// Sets a custom `User-Agent` header for the [`Client`].
    #[must_use]
    pub fn user_agent(self, user_agent: &str) -> Self {
        Self {
            builder: self.builder.user_agent(user_agent),
            ..self
        }
    }

    /// Overrides the url of the listing page the catalog is built from.
    #[must_use]
    pub fn home_url(self, url: &str) -> Self {
        Self {
            home: url.to_owned(),
            ..self
        }
    }

    /// Overrides the url of the webtoon page, which gets a `titleId` query.
    #[must_use]
    pub fn list_url(self, url: &str) -> Self {
        Self {
            list: url.to_owned(),
            ..self
        }
    }

    /// Overrides the url of the episode page, which gets `titleId` and `no` queries.
    #[must_use]
    pub fn detail_url(self, url: &str) -> Self {
        Self {
            detail: url.to_owned(),
            ..self
        }
    }

    /// Consumes the `ClientBuilder` and returns a fully-configured [`Client`].
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] if the underlying HTTP client could not be built,
    /// or if one of the configured urls does not parse.
    pub fn build(self) -> Result<Client, ClientError> {
        let http = self.builder.build()?;

        Ok(Client {
            http,
            root: self.root.into(),
            endpoints: Arc::new(endpoints(&self.home, &self.list, &self.detail)?),
            catalog: Catalog::new(),
        })
    }

    /// Builds a [`Client`] that makes its requests through `http` instead of `reqwest`.
    ///
    /// The user agent set on the builder only applies to the `reqwest` client
    /// and is not passed on.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] if one of the configured urls does not parse.
    pub fn build_with<H>(self, http: H) -> Result<Client<H>, ClientError>
    where
        H: Http,
    {
        Ok(Client {
            http,
            root: self.root.into(),
            endpoints: Arc::new(endpoints(&self.home, &self.list, &self.detail)?),
            catalog: Catalog::new(),
        })
    }
}

fn endpoints(home: &str, list: &str, detail: &str) -> Result<Endpoints, ClientError> {
    Ok(Endpoints {
        home: Url::parse(home)?,
        list: Url::parse(list)?,
        detail: Url::parse(detail)?,
    })
}

/// A crawler for `comic.naver.com` backed by an on-disk page cache.
///
/// Cloning is cheap, and clones share the same [`Catalog`].
///
/// Every call runs to completion before returning, one request at a time.
///
/// # Example
///
/// ```
/// # use naver_webtoon_crawler::platform::naver::Client;
/// let client = Client::new();
/// ```
#[derive(Debug, Clone)]
pub struct Client<H = reqwest::Client> {
    pub(super) http: H,
    pub(super) root: Arc<Path>,
    pub(super) endpoints: Arc<Endpoints>,
    catalog: Catalog,
}

// Creation impls
impl Client {
    /// Instantiates a new [`Client`] with the default settings.
    ///
    /// # Panics
    ///
    /// This function will panic if the TLS backend cannot be initialized. For
    /// a version that returns a `Result`, use the [`ClientBuilder`].
    #[must_use]
    pub fn new() -> Self {
        ClientBuilder::new().build().expect("Client::new()")
    }

    /// Returns a [`ClientBuilder`] for creating a custom-configured `Client`.
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

// Public facing impls
impl<H> Client<H>
where
    H: Http,
{
    /// Returns the catalog of webtoon titles to ids.
    #[inline]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Returns the directory cached pages and images are written to.
    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Searches the catalog for webtoons whose title contains `query`, or
    /// whose id is exactly `query`.
    ///
    /// A `u32` is searched for by its decimal form, so `search(20853)` finds
    /// the webtoon with id `20853`.
    ///
    /// If the catalog is empty, it is [refreshed](Client::refresh()) first.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] when the catalog had to be refreshed and that failed.
    pub async fn search<Q>(&self, query: Q) -> Result<Vec<CatalogEntry>, CatalogError>
    where
        Q: Query,
    {
        if self.catalog.is_empty() {
            self.refresh().await?;
        }

        Ok(self.catalog.search(&query.as_query()))
    }

    /// Reads the listing page and adds every webtoon on it to the catalog,
    /// returning how many were read.
    ///
    /// Titles already in the catalog get the id that was read last. Entries
    /// no longer on the listing are kept.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the listing page could not be loaded, or
    /// a thumbnail on it was missing its title or id.
    pub async fn refresh(&self) -> Result<usize, CatalogError> {
        let path = self.root.join(LISTING_FILE);

        let html = self.cache().fetch(&path, &self.endpoints.home, &[]).await?;
        let entries = catalog::entries(&html)
            .inspect_err(|err| error!(error = %err, "failed to read listing page"))?;

        let count = entries.len();

        for (title, id) in entries {
            self.catalog.insert(title, id);
        }

        info!(count, total = self.catalog.len(), "refreshed webtoon catalog");

        Ok(count)
    }

    /// Builds the [`Webtoon`] of the first catalog entry matching `query`.
    ///
    /// Returns `None` if nothing in the catalog matches. When `episodes` is
    /// `false` the episode list is left empty.
    ///
    /// # Errors
    ///
    /// Returns a [`WebtoonError`] if the catalog or the webtoon's page could
    /// not be loaded, or the page is missing any of the expected fields.
    pub async fn webtoon<Q>(&self, query: Q, episodes: bool) -> Result<Option<Webtoon>, WebtoonError>
    where
        Q: Query,
    {
        let Some(entry) = self.search(query).await?.into_iter().next() else {
            return Ok(None);
        };

        let path = self
            .root
            .join(webtoon::directory(entry.title()))
            .join("info.html");

        let html = self
            .cache()
            .fetch(&path, &self.endpoints.list, &[("titleId", entry.id())])
            .await?;

        let webtoon = webtoon::parse(
            &html,
            entry.id(),
            &self.endpoints.list,
            &self.endpoints.detail,
            episodes,
        )
        .inspect_err(|err| error!(id = entry.id(), error = %err, "failed to read webtoon page"))?;

        Ok(Some(webtoon))
    }

    /// Builds a `Webtoon` from a given `url` of the form
    /// `https://comic.naver.com/webtoon/list.nhn?titleId={ID}`.
    ///
    /// The id must be in the catalog, otherwise `None` is returned.
    ///
    /// # Errors
    ///
    /// Returns a [`WebtoonError`] if the url is malformed or has no `titleId`,
    /// as well as for anything [`Client::webtoon()`] can fail on.
    pub async fn webtoon_from_url(
        &self,
        url: &str,
        episodes: bool,
    ) -> Result<Option<Webtoon>, WebtoonError> {
        let url = Url::parse(url).map_err(ClientError::from)?;

        let id = url
            .query_pairs()
            .find(|query| query.0 == "titleId")
            .ok_or(ClientError::InvalidUrl(
                "Naver URL should have a `titleId` query: failed to find one in provided URL.",
            ))?
            .1
            .parse::<u32>()
            .context("`titleId` query parameter wasn't able to parse into a u32")
            .map_err(ClientError::from)?;

        self.webtoon(id, episodes).await
    }

    /// Rebuilds `webtoon` from its page, with its episode list included.
    ///
    /// # Errors
    ///
    /// Returns a [`WebtoonError`] for anything [`Client::webtoon()`] can fail on.
    pub async fn update_webtoon(&self, webtoon: &Webtoon) -> Result<Option<Webtoon>, WebtoonError> {
        self.webtoon(webtoon.id(), true).await
    }

    /// Downloads the images of episodes `min..=max` of `webtoon`, or of every
    /// episode when `all` is `true`.
    ///
    /// This is a shorthand for [`Client::download()`].
    ///
    /// # Errors
    ///
    /// See [`Client::download()`].
    pub async fn download_range(
        &self,
        webtoon: &Webtoon,
        min: u32,
        max: u32,
        all: bool,
    ) -> Result<Report, DownloadError> {
        let range = if all { Range::All } else { Range::Span { min, max } };

        self.download(webtoon, range).await
    }

    /// Downloads the images of the episodes in `range`.
    ///
    /// The webtoon must have been built with its episodes, as the newest one
    /// bounds the range. With an empty episode list nothing is downloaded and
    /// an empty [`Report`] is returned.
    ///
    /// Each episode's page is cached to `<root>/webtoon-<title>/<no>/episode_info.html`
    /// and its images are written next to it, named after the image's `id`.
    /// Images are downloaded again on every call. An image that fails to
    /// download or save is logged and counted in [`Report::failed`], and the
    /// rest carry on.
    ///
    /// # Errors
    ///
    /// Returns a [`DownloadError`] if the range is invalid for the webtoon, or
    /// if an episode page fails to load, which stops the download.
    pub async fn download(&self, webtoon: &Webtoon, range: Range) -> Result<Report, DownloadError> {
        download::range(self, webtoon, range).await
    }
}

// Internal only impls
impl<H> Client<H>
where
    H: Http,
{
    pub(super) fn cache(&self) -> PageCache<'_, H> {
        PageCache::new(&self.http)
    }
}
