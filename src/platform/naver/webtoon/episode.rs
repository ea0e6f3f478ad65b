//! Module containing things related to an episode on `comic.naver.com`.

pub mod download;

use chrono::NaiveDate;
use serde::Serialize;
use url::Url;

/// Represents an episode on `comic.naver.com`, as listed on its webtoon's page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Episode {
    webtoon: String,
    number: u32,
    title: String,
    thumbnail: String,
    rating: String,
    created: String,
    /// Episode page of the client that listed this episode.
    #[serde(skip)]
    detail: Url,
}

impl Episode {
    pub(in crate::platform::naver) fn new(
        webtoon: &str,
        number: u32,
        title: String,
        thumbnail: &str,
        rating: String,
        created: String,
        detail: &Url,
    ) -> Self {
        Self {
            webtoon: webtoon.to_owned(),
            number,
            title,
            thumbnail: thumbnail.to_owned(),
            rating,
            created,
            detail: detail.clone(),
        }
    }

    /// Returns the id of the webtoon this episode belongs to.
    #[inline]
    pub fn webtoon(&self) -> &str {
        &self.webtoon
    }

    /// Returns the episode number, the `no` of its url.
    #[inline]
    pub const fn number(&self) -> u32 {
        self.number
    }

    /// Returns the title of the episode.
    #[inline]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the url of the episode's thumbnail.
    #[inline]
    pub fn thumbnail(&self) -> &str {
        &self.thumbnail
    }

    /// Returns the rating as shown on the site, for example `9.97`.
    #[inline]
    pub fn rating(&self) -> &str {
        &self.rating
    }

    /// Returns the rating as a number, if it is one.
    pub fn score(&self) -> Option<f64> {
        self.rating.parse().ok()
    }

    /// Returns the creation date as shown on the site, for example `18.03.12`.
    #[inline]
    pub fn created(&self) -> &str {
        &self.created
    }

    /// Returns the creation date, if it is in one of the site's date formats.
    pub fn published(&self) -> Option<NaiveDate> {
        published(&self.created)
    }

    /// Returns the url of the episode's page, on the episode endpoint of the
    /// [`Client`](crate::platform::naver::Client) that built it.
    pub fn url(&self) -> String {
        let mut url = self.detail.clone();

        url.query_pairs_mut()
            .append_pair("titleId", &self.webtoon)
            .append_pair("no", &self.number.to_string());

        url.into()
    }
}

fn published(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date, "%y.%m.%d")
        .or_else(|_| NaiveDate::parse_from_str(date, "%Y.%m.%d"))
        .ok()
}
