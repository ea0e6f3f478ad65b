//! A crawler for the `comic.naver.com` website.
//!
//! Naver uses a single set of ids, the `titleId` of its urls, across all of
//! its webtoons. The crawler reads them from the thumbnails of the listing
//! page into a [`Catalog`], which is what titles are searched in.
//!
//! Every page is cached on disk under the client's root directory:
//!
//! - the listing page at `webtoon-list.html`,
//! - a webtoon's page at `webtoon-<title>/info.html`, with the spaces of the title replaced by `-`,
//! - an episode's page at `webtoon-<title>/<no>/episode_info.html`, next to its images.

mod cache;
pub mod catalog;
pub mod client;
pub mod errors;
pub mod webtoon;

pub use catalog::{Catalog, CatalogEntry, Query};
pub use client::{Client, ClientBuilder, Http};
pub use webtoon::{
    Webtoon,
    episode::{
        Episode,
        download::{Range, Report},
    },
};
