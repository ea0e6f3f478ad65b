//! Fetch-or-load of single HTML pages, keyed by a path on disk.

use super::{client::Http, errors::CacheError};
use scraper::Html;
use std::{
    io,
    path::{Path, PathBuf},
};
use tokio::fs;
use tracing::{debug, error};
use url::Url;

/// Loads pages from disk, requesting and saving them first if they were never cached.
///
/// A file that exists at the page's path is taken to be the page. There is no
/// expiry or validation of the contents; delete the file to refetch the page.
#[derive(Debug)]
pub(crate) struct PageCache<'a, H> {
    http: &'a H,
}

impl<'a, H> PageCache<'a, H>
where
    H: Http,
{
    pub(super) fn new(http: &'a H) -> Self {
        Self { http }
    }

    /// Returns the parsed page cached at `path`.
    ///
    /// When nothing is at `path`, `url` with `query` appended is requested and
    /// the response body is saved to `path`, creating missing directories.
    /// Either way, the page is then read back from disk and parsed.
    ///
    /// # Errors
    ///
    /// Returns a [`CacheError`] if the page had to be requested and the request
    /// failed, or if the cache file could not be written or read. The failure
    /// is logged before being returned.
    pub(crate) async fn fetch(
        &self,
        path: &Path,
        url: &Url,
        query: &[(&str, &str)],
    ) -> Result<Html, CacheError> {
        match self.load(path, url, query).await {
            Ok(text) => Ok(Html::parse_document(&text)),
            Err(err) => {
                error!(path = %path.display(), %url, error = %err, "failed to load page");
                Err(err)
            }
        }
    }

    async fn load(&self, path: &Path, url: &Url, query: &[(&str, &str)]) -> Result<String, CacheError> {
        if fs::try_exists(path).await.map_err(storage(path))? {
            debug!(path = %path.display(), "page cache hit");
        } else {
            let mut url = url.clone();

            // An empty `query_pairs_mut` would leave a dangling `?` behind.
            if !query.is_empty() {
                url.query_pairs_mut().extend_pairs(query);
            }

            debug!(path = %path.display(), %url, "page cache miss");

            let text = self
                .http
                .text(&url)
                .await
                .map_err(|source| CacheError::Network {
                    url: url.to_string(),
                    source,
                })?;

            store(path, &text).await?;
        }

        fs::read_to_string(path).await.map_err(storage(path))
    }
}

/// Writes `text` to `path` through a temporary sibling file so that `path`
/// only ever holds a complete page.
async fn store(path: &Path, text: &str) -> Result<(), CacheError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.map_err(storage(parent))?;
    }

    let mut partial = path.as_os_str().to_owned();
    partial.push(".part");
    let partial = PathBuf::from(partial);

    fs::write(&partial, text).await.map_err(storage(&partial))?;
    fs::rename(&partial, path).await.map_err(storage(path))?;

    Ok(())
}

pub(super) fn storage(path: &Path) -> impl FnOnce(io::Error) -> CacheError + '_ {
    move |source| CacheError::Storage {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[derive(Debug, Clone, Default)]
    struct Counting {
        requested: Arc<Mutex<Vec<String>>>,
        down: bool,
    }

    impl Http for Counting {
        async fn text(&self, url: &Url) -> anyhow::Result<String> {
            self.requested.lock().push(url.to_string());

            if self.down {
                anyhow::bail!("connection refused");
            }

            Ok(format!("<html><body><p id=\"served\">{}</p></body></html>", self.requested.lock().len()))
        }

        async fn bytes(&self, _url: &Url, _referer: &str) -> anyhow::Result<Vec<u8>> {
            anyhow::bail!("pages only")
        }
    }

    fn served(html: &Html) -> String {
        let selector = scraper::Selector::parse("p#served").unwrap();
        html.select(&selector).next().unwrap().text().collect()
    }

    #[tokio::test]
    async fn should_request_once_and_reuse_file() {
        let dir = TempDir::new().unwrap();
        let http = Counting::default();
        let cache = PageCache::new(&http);

        let path = dir.path().join("webtoon-Foo").join("info.html");
        let url = Url::parse("https://comic.naver.com/webtoon/list.nhn").unwrap();

        let first = cache.fetch(&path, &url, &[("titleId", "20853")]).await.unwrap();
        let second = cache.fetch(&path, &url, &[("titleId", "20853")]).await.unwrap();

        pretty_assertions::assert_eq!(
            vec!["https://comic.naver.com/webtoon/list.nhn?titleId=20853".to_owned()],
            *http.requested.lock()
        );
        assert_eq!("1", served(&first), "first call should parse the saved response");
        assert_eq!("1", served(&second), "second call should read the same file");
        assert!(path.exists(), "page should be saved, parent directories included");
    }

    #[tokio::test]
    async fn should_read_from_disk_not_from_network() {
        let dir = TempDir::new().unwrap();
        let http = Counting::default();
        let cache = PageCache::new(&http);

        let path = dir.path().join("webtoon-list.html");
        std::fs::write(&path, "<p id=\"served\">on disk</p>").unwrap();

        let url = Url::parse("https://comic.naver.com/webtoon/weekday.nhn").unwrap();
        let html = cache.fetch(&path, &url, &[]).await.unwrap();

        assert_eq!("on disk", served(&html), "existing file should be used as-is");
        assert!(http.requested.lock().is_empty(), "no request should be made");
    }

    #[tokio::test]
    async fn should_not_append_empty_query() {
        let dir = TempDir::new().unwrap();
        let http = Counting::default();
        let cache = PageCache::new(&http);

        let url = Url::parse("https://comic.naver.com/webtoon/weekday.nhn").unwrap();
        cache.fetch(&dir.path().join("webtoon-list.html"), &url, &[]).await.unwrap();

        pretty_assertions::assert_eq!(
            vec!["https://comic.naver.com/webtoon/weekday.nhn".to_owned()],
            *http.requested.lock()
        );
    }

    #[tokio::test]
    async fn should_fail_with_network_error_and_write_nothing() {
        let dir = TempDir::new().unwrap();
        let http = Counting {
            down: true,
            ..Counting::default()
        };
        let cache = PageCache::new(&http);

        let path = dir.path().join("webtoon-list.html");
        let url = Url::parse("https://comic.naver.com/webtoon/weekday.nhn").unwrap();

        let err = cache.fetch(&path, &url, &[]).await.unwrap_err();

        assert!(matches!(err, CacheError::Network { .. }), "expected network error, got {err:?}");
        assert!(!path.exists(), "nothing should be cached for a failed request");
    }

    #[tokio::test]
    async fn should_fail_with_storage_error() {
        let dir = TempDir::new().unwrap();
        let http = Counting::default();
        let cache = PageCache::new(&http);

        // A regular file where a directory is needed.
        let blocker = dir.path().join("webtoon-Foo");
        std::fs::write(&blocker, "").unwrap();

        let path = blocker.join("info.html");
        let url = Url::parse("https://comic.naver.com/webtoon/list.nhn").unwrap();

        let err = cache.fetch(&path, &url, &[]).await.unwrap_err();

        assert!(matches!(err, CacheError::Storage { .. }), "expected storage error, got {err:?}");
    }
}
