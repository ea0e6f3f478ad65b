//! Downloading the images of a range of episodes.

use crate::{
    platform::naver::{
        Client,
        cache::storage,
        client::Http,
        errors::{CacheError, DownloadError, RangeError},
        webtoon::{Webtoon, directory},
    },
    stdx::error::{Assume, ParseError},
};
use scraper::{Html, Selector};
use serde::Serialize;
use std::{
    ops::RangeInclusive,
    path::{Component, Path},
};
use tokio::fs;
use tracing::{error, info, warn};
use url::Url;

/// Which episodes to download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Range {
    /// Episodes `min` through `max`, both included.
    Span {
        /// First episode, at least `1`.
        min: u32,
        /// Last episode, at most the newest episode.
        max: u32,
    },
    /// Every episode from `1` through the newest.
    All,
}

impl Range {
    /// Resolves the range against the newest episode number.
    ///
    /// # Errors
    ///
    /// Returns a [`RangeError`] if a [`Span`](Range::Span) starts below `1`,
    /// ends past `latest`, or is backwards.
    pub fn resolve(self, latest: u32) -> Result<RangeInclusive<u32>, RangeError> {
        let Self::Span { min, max } = self else {
            return Ok(1..=latest);
        };

        if max > latest {
            return Err(RangeError::MaxAboveLatest { max, latest });
        }

        if min < 1 {
            return Err(RangeError::MinBelowOne(min));
        }

        if min > max {
            return Err(RangeError::MinAboveMax { min, max });
        }

        Ok(min..=max)
    }
}

/// Outcome of a range download.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    /// Episodes whose page was loaded.
    pub episodes: u32,
    /// Images written to disk.
    pub saved: usize,
    /// Images that could not be downloaded or written.
    pub failed: usize,
}

/// An image on an episode page.
struct Image {
    id: Option<String>,
    src: Option<String>,
}

pub(in crate::platform::naver) async fn range<H>(
    client: &Client<H>,
    webtoon: &Webtoon,
    range: Range,
) -> Result<Report, DownloadError>
where
    H: Http,
{
    let Some(latest) = webtoon.latest() else {
        warn!(
            title = webtoon.title(),
            "episode list is empty, build the webtoon with its episodes to download them"
        );
        return Ok(Report::default());
    };

    let range = range.resolve(latest)?;

    info!(
        title = webtoon.title(),
        first = *range.start(),
        last = *range.end(),
        "downloading episodes"
    );

    let mut report = Report::default();

    for number in range {
        let episode_dir = client
            .root
            .join(directory(webtoon.title()))
            .join(number.to_string());

        let no = number.to_string();
        let query = [("titleId", webtoon.id()), ("no", no.as_str())];

        let images = {
            let html = client
                .cache()
                .fetch(
                    &episode_dir.join("episode_info.html"),
                    &client.endpoints.detail,
                    &query,
                )
                .await?;

            images(&html).inspect_err(|err| {
                error!(episode = number, error = %err, "failed to read images of episode page");
            })?
        };

        report.episodes += 1;

        let mut referer = client.endpoints.detail.clone();
        referer.query_pairs_mut().extend_pairs(query);

        for image in images {
            let (Some(id), Some(src)) = (image.id, image.src) else {
                warn!(episode = number, "image is missing its `id` or `src`, skipping it");
                report.failed += 1;
                continue;
            };

            if !is_file_name(&id) {
                warn!(episode = number, image = %id, "image `id` is not a plain file name, skipping it");
                report.failed += 1;
                continue;
            }

            match save(&client.http, &episode_dir, &id, &src, &referer, &query).await {
                Ok(()) => report.saved += 1,
                Err(err) => {
                    warn!(
                        episode = number,
                        image = %id,
                        error = %err,
                        "failed to save image, skipping it"
                    );
                    report.failed += 1;
                }
            }
        }

        info!(episode = number, saved = report.saved, failed = report.failed, "episode done");
    }

    Ok(report)
}

/// Reads the strip images out of an episode page, in page order.
fn images(html: &Html) -> Result<Vec<Image>, ParseError> {
    let selector = Selector::parse(r"div.wt_viewer > img") //
        .assumption("`div.wt_viewer > img` should be a valid selector")?;

    let images = html
        .select(&selector)
        .map(|img| Image {
            id: img.value().attr("id").map(str::to_owned),
            src: img.value().attr("src").map(str::to_owned),
        })
        .collect();

    Ok(images)
}

/// Whether `id` names a single file, so that `<id>.jpg` stays inside the episode directory.
fn is_file_name(id: &str) -> bool {
    let mut components = Path::new(id).components();

    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !id.contains(['/', '\\'])
}

/// Downloads one image and writes it to `<directory>/<id>.jpg`, replacing any existing file.
///
/// The episode's `titleId` and `no` are sent along as query parameters.
async fn save<H>(
    http: &H,
    directory: &Path,
    id: &str,
    src: &str,
    referer: &Url,
    query: &[(&str, &str)],
) -> Result<(), CacheError>
where
    H: Http,
{
    let mut url = referer.join(src).map_err(|err| CacheError::Network {
        url: src.to_owned(),
        source: err.into(),
    })?;

    url.query_pairs_mut().extend_pairs(query);

    let bytes = http
        .bytes(&url, referer.as_str())
        .await
        .map_err(|source| CacheError::Network {
            url: url.to_string(),
            source,
        })?;

    let path = directory.join(format!("{id}.jpg"));

    fs::write(&path, bytes).await.map_err(storage(&path))
}
