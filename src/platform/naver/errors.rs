//! Errors that can happen when crawling `comic.naver.com`.

use std::path::PathBuf;
use thiserror::Error;

pub use crate::stdx::error::ParseError;

#[allow(missing_docs)]
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    ClientError(#[from] ClientError),
    #[error(transparent)]
    CacheError(#[from] CacheError),
    #[error(transparent)]
    CatalogError(#[from] CatalogError),
    #[error(transparent)]
    WebtoonError(#[from] WebtoonError),
    #[error(transparent)]
    DownloadError(#[from] DownloadError),
}

#[allow(missing_docs)]
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{0}")]
    InvalidUrl(&'static str),
    #[error(transparent)]
    MalformedUrl(#[from] url::ParseError),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl From<reqwest::Error> for ClientError {
    fn from(error: reqwest::Error) -> Self {
        Self::Unexpected(anyhow::Error::from(error))
    }
}

/// Failure to produce a page from the on-disk cache.
///
/// Either the page was not on disk and the request for it failed, or the disk
/// itself could not be read from or written to.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CacheError {
    /// The request for a page that was not yet cached failed.
    #[error("failed to fetch `{url}`")]
    Network {
        /// Full url, query included, that was requested.
        url: String,
        /// Why the request failed.
        #[source]
        source: anyhow::Error,
    },
    /// Creating, writing or reading a cache file failed.
    #[error("failed to access cache file `{}`", path.display())]
    Storage {
        /// Path of the cache file or directory involved.
        path: PathBuf,
        /// The underlying io error.
        #[source]
        source: std::io::Error,
    },
}

#[allow(missing_docs)]
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    CacheError(#[from] CacheError),
    #[error(transparent)]
    ParseError(#[from] ParseError),
}

#[allow(missing_docs)]
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum WebtoonError {
    #[error(transparent)]
    CatalogError(#[from] CatalogError),
    #[error(transparent)]
    CacheError(#[from] CacheError),
    #[error(transparent)]
    ParseError(#[from] ParseError),
    #[error(transparent)]
    ClientError(#[from] ClientError),
}

/// Episode numbers given to a range download that the webtoon cannot satisfy.
#[non_exhaustive]
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RangeError {
    /// Episodes start at `1`.
    #[error("first episode must be at least 1, but was {0}")]
    MinBelowOne(u32),
    /// The last requested episode is past the newest listed episode.
    #[error("last episode {max} is past the newest episode {latest}")]
    MaxAboveLatest {
        /// Requested last episode.
        max: u32,
        /// Newest episode number of the webtoon.
        latest: u32,
    },
    /// The range is backwards.
    #[error("first episode {min} is after last episode {max}")]
    MinAboveMax {
        /// Requested first episode.
        min: u32,
        /// Requested last episode.
        max: u32,
    },
}

#[allow(missing_docs)]
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error(transparent)]
    RangeError(#[from] RangeError),
    #[error(transparent)]
    CacheError(#[from] CacheError),
    #[error(transparent)]
    ParseError(#[from] ParseError),
    #[error(transparent)]
    ClientError(#[from] ClientError),
}
