//! An index of webtoon titles to ids, read from the listing page.

use crate::{
    private::Sealed,
    stdx::error::{Assume, ParseError},
};
use parking_lot::RwLock;
use regex::Regex;
use scraper::{Html, Selector};
use serde::Serialize;
use std::{borrow::Cow, sync::Arc};

/// A value that can be searched for in a [`Catalog`].
///
/// Implemented for string types, searched as is, and for `u32`, searched by
/// its decimal form so that ids can be passed as numbers.
pub trait Query: Sealed {
    /// The string form of the query.
    fn as_query(&self) -> Cow<'_, str>;
}

impl Query for u32 {
    fn as_query(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }
}

impl Query for &str {
    fn as_query(&self) -> Cow<'_, str> {
        Cow::Borrowed(*self)
    }
}

impl Query for String {
    fn as_query(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.as_str())
    }
}

/// A title and id pair from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    title: String,
    id: String,
}

impl CatalogEntry {
    /// Returns the title of the webtoon.
    #[inline]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the id of the webtoon, the `titleId` of its urls.
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Titles of webtoons mapped to their ids.
///
/// Starts out empty, and is filled by [`Client::refresh()`](super::Client::refresh()),
/// which a search on an empty catalog triggers. Entries are never removed.
///
/// Titles are unique: inserting a title that is already present replaces its
/// id but keeps its position.
///
/// Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Arc<RwLock<Vec<CatalogEntry>>>,
}

impl Catalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `title` to `id`, replacing the id if the title was already present.
    pub fn insert<T, I>(&self, title: T, id: I)
    where
        T: Into<String>,
        I: Into<String>,
    {
        let title = title.into();
        let id = id.into();

        let mut entries = self.entries.write();

        if let Some(entry) = entries.iter_mut().find(|entry| entry.title == title) {
            entry.id = id;
        } else {
            entries.push(CatalogEntry { title, id });
        }
    }

    /// Returns every entry whose title contains `query` or whose id equals `query`,
    /// in catalog order.
    ///
    /// Unlike [`Client::search()`](super::Client::search()) this never refreshes.
    pub fn search(&self, query: &str) -> Vec<CatalogEntry> {
        self.entries
            .read()
            .iter()
            .filter(|entry| entry.title.contains(query) || entry.id == query)
            .cloned()
            .collect()
    }

    /// Returns a copy of all entries, in catalog order.
    pub fn entries(&self) -> Vec<CatalogEntry> {
        self.entries.read().clone()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if nothing was ever added.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

/// Reads `(title, id)` pairs from the thumbnails of the listing page, in page order.
pub(super) fn entries(html: &Html) -> Result<Vec<(String, String)>, ParseError> {
    let selector = Selector::parse(r"div.thumb > a > img:nth-of-type(1)") //
        .assumption("`div.thumb > a > img:nth-of-type(1)` should be a valid selector")?;

    // Thumbnails are served from a path like `.../webtoon/20853/thumbnail/...`.
    let regex = Regex::new(r"webtoon/(\d+)") //
        .assumption("`webtoon/(\\d+)` should be a valid regex")?;

    let mut entries = Vec::new();

    for img in html.select(&selector) {
        let title = img
            .value()
            .attr("title")
            .assumption("`title` is missing on a listing page thumbnail `img`")?;

        let src = img
            .value()
            .attr("src")
            .assumption(format!("`src` is missing on the listing page thumbnail for `{title}`"))?;

        let id = regex
            .captures(src)
            .and_then(|captures| captures.get(1))
            .assumption(format!(
                "thumbnail `src` for `{title}` should have a `webtoon/<id>` segment, but was `{src}`"
            ))?;

        entries.push((title.to_owned(), id.as_str().to_owned()));
    }

    Ok(entries)
}
