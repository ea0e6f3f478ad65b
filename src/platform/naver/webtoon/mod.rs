//! Represents an abstraction for a Webtoon on `comic.naver.com`.

pub mod episode;

use crate::stdx::error::{Assume, ParseError, assumption};
use episode::Episode;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use url::Url;

/// Represents a Webtoon from `comic.naver.com`.
///
/// This type is not constructed directly, instead it is gotten through a
/// [`Client`](super::Client) via [`Client::webtoon()`](super::Client::webtoon()).
///
/// The episode list is only filled when the webtoon was built with its
/// episodes, and is then ordered newest first, as listed on the site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Webtoon {
    id: String,
    title: String,
    author: String,
    description: String,
    episodes: Vec<Episode>,
}

impl Webtoon {
    /// Returns the id of this `Webtoon`, the `titleId` of its urls.
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the title of this `Webtoon`.
    #[inline]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the author of this `Webtoon`, as written on its page.
    #[inline]
    pub fn author(&self) -> &str {
        &self.author
    }

    /// Returns the description of this `Webtoon`.
    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the episodes of this `Webtoon`, newest first.
    ///
    /// Empty unless the webtoon was built with its episodes.
    #[inline]
    pub fn episodes(&self) -> &[Episode] {
        &self.episodes
    }

    /// Returns the listed episode with the given number, if any.
    pub fn episode(&self, number: u32) -> Option<&Episode> {
        self.episodes
            .iter()
            .find(|episode| episode.number() == number)
    }

    /// Returns the number of the newest episode, which is the first one listed.
    #[inline]
    pub fn latest(&self) -> Option<u32> {
        self.episodes.first().map(Episode::number)
    }
}

/// Name of the directory a webtoon's pages are cached in.
///
/// Spaces and path separators become `-`, so the name is always a single
/// directory under the root.
pub(super) fn directory(title: &str) -> String {
    format!("webtoon-{}", title.replace([' ', '/', '\\'], "-"))
}

/// Builds a [`Webtoon`] from its page.
///
/// `base` is the url the page was fetched from, used to resolve the relative
/// episode links. `detail` is the episode page the episodes' urls point at.
pub(super) fn parse(
    html: &Html,
    id: &str,
    base: &Url,
    detail: &Url,
    episodes: bool,
) -> Result<Webtoon, ParseError> {
    let heading = Selector::parse(r"div.detail > h2") //
        .assumption("`div.detail > h2` should be a valid selector")?;

    let heading = html
        .select(&heading)
        .next()
        .assumption("`div.detail > h2` is missing on the webtoon page")?;

    Ok(Webtoon {
        id: id.to_owned(),
        title: title(heading)?,
        author: author(heading)?,
        description: description(html)?,
        episodes: if episodes {
            self::episodes(html, id, base, detail)?
        } else {
            Vec::new()
        },
    })
}

fn title(heading: ElementRef<'_>) -> Result<String, ParseError> {
    // The heading holds the title as a bare text node, followed by a `<span>`
    // with the author:
    //
    //    <h2>
    //      마음의소리
    //      <span class="wrt_nm">조석</span>
    //    </h2>
    let title = heading
        .children()
        .find_map(|node| node.value().as_text())
        .map(|text| text.trim())
        .filter(|text| !text.is_empty())
        .assumption("`div.detail > h2` on the webtoon page should start with the title text")?;

    Ok(title.to_owned())
}

fn author(heading: ElementRef<'_>) -> Result<String, ParseError> {
    let selector = Selector::parse(r"span") //
        .assumption("`span` should be a valid selector")?;

    let span = heading
        .select(&selector)
        .next()
        .assumption("`div.detail > h2 > span`(author) is missing on the webtoon page")?;

    Ok(span.text().map(str::trim).collect())
}

fn description(html: &Html) -> Result<String, ParseError> {
    let selector = Selector::parse(r"div.detail > p") //
        .assumption("`div.detail > p` should be a valid selector")?;

    let paragraph = html
        .select(&selector)
        .next()
        .assumption("`div.detail > p`(description) is missing on the webtoon page")?;

    Ok(paragraph.text().collect())
}

fn episodes(html: &Html, id: &str, base: &Url, detail: &Url) -> Result<Vec<Episode>, ParseError> {
    // The HTML5 parser puts rows into an implied `<tbody>`, so rows are not
    // direct children of the table.
    let rows = Selector::parse(r"table.viewList tr") //
        .assumption("`table.viewList tr` should be a valid selector")?;

    let mut episodes = Vec::new();

    for row in html.select(&rows) {
        // Rows with a class are headers, banners and other non-episode rows.
        if row.value().attr("class").is_some() {
            continue;
        }

        episodes.push(episode(row, id, base, detail)?);
    }

    Ok(episodes)
}

fn episode(row: ElementRef<'_>, id: &str, base: &Url, detail: &Url) -> Result<Episode, ParseError> {
    let href = select(row, r"td:nth-of-type(1) a")?
        .value()
        .attr("href")
        .assumption("`href` is missing on an episode link, `a` should always have one")?;

    let url = base
        .join(href)
        .assumption(format!("episode link `{href}` should be a valid url"))?;

    let number = url
        .query_pairs()
        .find(|query| query.0 == "no")
        .assumption(format!("episode link `{href}` should have a `no` query"))?
        .1;

    let number = number
        .parse::<u32>()
        .assumption(format!("episode `no` query should be numeric, but was `{number}`"))?;

    let thumbnail = select(row, r"td:nth-of-type(1) img")?
        .value()
        .attr("src")
        .assumption(format!("`src` is missing on the thumbnail of episode {number}"))?;

    let title = text(select(row, r"td:nth-of-type(2) a")?);
    let rating = text(select(row, r"td:nth-of-type(3) strong")?);
    let created = text(select(row, r"td:nth-of-type(4)")?);

    Ok(Episode::new(id, number, title, thumbnail, rating, created, detail))
}

fn select<'a>(row: ElementRef<'a>, selector: &str) -> Result<ElementRef<'a>, ParseError> {
    let parsed = Selector::parse(selector) //
        .assumption(format!("`{selector}` should be a valid selector"))?;

    let Some(element) = row.select(&parsed).next() else {
        assumption!("`{selector}` is missing in an episode row of the webtoon page");
    };

    Ok(element)
}

fn text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"
        <html><body>
        <div class="comicinfo">
          <div class="detail">
            <h2>
              마음의소리
              <span class="wrt_nm"> 조석 </span>
            </h2>
            <p>조석 작가의 일상 이야기</p>
          </div>
        </div>
        <table class="viewList">
          <tr class="band_banner v2"><td colspan="4"><a href="/promo">배너</a></td></tr>
          <tr>
            <td><a href="/webtoon/detail.nhn?titleId=20853&no=1145&weekday=tue"><img src="https://shared-comic.pstatic.net/thumb/webtoon/20853/1145/thumbnail.jpg" title="1145화"></a></td>
            <td class="title"><a href="/webtoon/detail.nhn?titleId=20853&no=1145&weekday=tue">1145화 휴가</a></td>
            <td><div class="rating_type"><strong>9.97</strong></div></td>
            <td class="num"> 2018.03.12 </td>
          </tr>
          <tr>
            <td><a href="/webtoon/detail.nhn?titleId=20853&no=1144&weekday=tue"><img src="https://shared-comic.pstatic.net/thumb/webtoon/20853/1144/thumbnail.jpg"></a></td>
            <td class="title"><a href="/webtoon/detail.nhn?titleId=20853&no=1144&weekday=tue">1144화 복귀</a></td>
            <td><div class="rating_type"><strong>9.95</strong></div></td>
            <td class="num">2018.03.05</td>
          </tr>
        </table>
        </body></html>
    "#;

    fn base() -> Url {
        Url::parse("https://comic.naver.com/webtoon/list.nhn").unwrap()
    }

    fn detail() -> Url {
        Url::parse("https://comic.naver.com/webtoon/detail.nhn").unwrap()
    }

    #[test]
    fn should_parse_series_fields() {
        let html = Html::parse_document(PAGE);

        let webtoon = parse(&html, "20853", &base(), &detail(), false).unwrap();

        assert_eq!("20853", webtoon.id());
        assert_eq!("마음의소리", webtoon.title());
        assert_eq!("조석", webtoon.author());
        assert_eq!("조석 작가의 일상 이야기", webtoon.description());
        assert!(webtoon.episodes().is_empty(), "episodes were not requested");
        assert_eq!(None, webtoon.latest());
    }

    #[test]
    fn should_parse_episode_rows_in_order() {
        let html = Html::parse_document(PAGE);

        let webtoon = parse(&html, "20853", &base(), &detail(), true).unwrap();
        let episodes = webtoon.episodes();

        assert_eq!(2, episodes.len());
        assert_eq!(Some(1145), webtoon.latest());

        let newest = &episodes[0];
        assert_eq!("20853", newest.webtoon());
        assert_eq!(1145, newest.number());
        assert_eq!("1145화 휴가", newest.title());
        assert_eq!(
            "https://shared-comic.pstatic.net/thumb/webtoon/20853/1145/thumbnail.jpg",
            newest.thumbnail()
        );
        assert_eq!("9.97", newest.rating());
        assert_eq!("2018.03.12", newest.created());

        assert_eq!(
            "https://comic.naver.com/webtoon/detail.nhn?titleId=20853&no=1145",
            newest.url()
        );

        assert_eq!(1144, episodes[1].number());
        assert_eq!(Some(&episodes[1]), webtoon.episode(1144));
        assert_eq!(None, webtoon.episode(1));
    }

    #[test]
    fn should_skip_rows_with_a_class_whatever_they_hold() {
        // A fully formed episode row, but with a class.
        let html = Html::parse_document(
            r#"
            <div class="detail"><h2>Foo<span>Bar</span></h2><p>Baz</p></div>
            <table class="viewList">
              <tr class="">
                <td><a href="/webtoon/detail.nhn?titleId=1&no=3"><img src="t.jpg"></a></td>
                <td><a>Three</a></td>
                <td><strong>9.0</strong></td>
                <td>18.01.01</td>
              </tr>
              <tr class="band_banner"><td>nothing an episode needs</td></tr>
            </table>
            "#,
        );

        let webtoon = parse(&html, "1", &base(), &detail(), true).unwrap();

        assert!(webtoon.episodes().is_empty(), "classed rows are never episodes");
    }

    #[test]
    fn should_fail_without_heading() {
        let html = Html::parse_document(r#"<div class="detail"><p>Baz</p></div>"#);

        let err = parse(&html, "1", &base(), &detail(), false).unwrap_err();

        assert!(err.to_string().contains("div.detail > h2"), "unexpected error: {err}");
    }

    #[test]
    fn should_fail_without_author() {
        let html = Html::parse_document(r#"<div class="detail"><h2>Foo</h2><p>Baz</p></div>"#);

        let err = parse(&html, "1", &base(), &detail(), false).unwrap_err();

        assert!(err.to_string().contains("author"), "unexpected error: {err}");
    }

    #[test]
    fn should_fail_on_episode_link_without_number() {
        let html = Html::parse_document(
            r#"
            <div class="detail"><h2>Foo<span>Bar</span></h2><p>Baz</p></div>
            <table class="viewList">
              <tr>
                <td><a href="/webtoon/detail.nhn?titleId=1"><img src="t.jpg"></a></td>
                <td><a>One</a></td>
                <td><strong>9.0</strong></td>
                <td>18.01.01</td>
              </tr>
            </table>
            "#,
        );

        let err = parse(&html, "1", &base(), &detail(), true).unwrap_err();

        assert!(err.to_string().contains("`no` query"), "unexpected error: {err}");
    }

    #[test]
    fn should_hyphenate_directory_name() {
        assert_eq!("webtoon-신의-탑", directory("신의 탑"));
        assert_eq!("webtoon-Example-Series", directory("Example Series"));
    }

    #[test]
    fn should_keep_directory_name_a_single_component() {
        assert_eq!("webtoon-..-..-escaped", directory("../../escaped"));
        assert_eq!("webtoon--tmp-pwned", directory("/tmp/pwned"));
        assert_eq!("webtoon-..-escaped", directory(r"..\escaped"));
        assert_eq!("webtoon-..", directory(".."));
    }

    #[test]
    fn should_point_episode_urls_at_given_detail_page() {
        let html = Html::parse_document(PAGE);
        let detail = Url::parse("https://mirror.test/detail").unwrap();

        let webtoon = parse(&html, "20853", &base(), &detail, true).unwrap();

        assert_eq!(
            "https://mirror.test/detail?titleId=20853&no=1145",
            webtoon.episodes()[0].url()
        );
    }
}
