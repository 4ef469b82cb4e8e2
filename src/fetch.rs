use anyhow::{Context, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::clean::decode_entities;
use crate::config::ScrapeConfig;
use crate::models::RawReview;

const CARD_MARKER: &str = r#"class="col EPCmJX Ma1fCG""#;

static RATING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)<div class="XQDdHH[^"]*">(.*?)<"#).unwrap());
static TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)<p class="z9E0IG[^"]*">(.*?)</p>"#).unwrap());
static BODY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)<div class="ZmyHeo[^"]*">(.*?)</div>\s*</div>"#).unwrap());
static NEXT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<span[^>]*>\s*Next\s*</span>").unwrap());
static BREAK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").unwrap());

/// Review listing URL for one page number.
pub fn page_url(product_url: &str, page: usize) -> Result<String> {
    let mut url = Url::parse(product_url).with_context(|| format!("Invalid product URL {}", product_url))?;
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "page")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair("page", &page.to_string());
    Ok(url.to_string())
}

/// Fetch one review page; Ok(None) when the page does not exist (404).
pub async fn fetch_review_page(client: &Client, product_url: &str, page: usize) -> Result<Option<String>> {
    let url = page_url(product_url, page)?;
    let start = std::time::Instant::now();
    debug!("Fetching review page - page={}", page);

    let resp = client
        .get(&url)
        .send()
        .await
        .with_context(|| format!("Request failed for {}", url))?;

    if resp.status() == reqwest::StatusCode::NOT_FOUND {
        warn!("Review page not found (404) - page={}", page);
        return Ok(None);
    }

    let resp = resp
        .error_for_status()
        .with_context(|| format!("HTTP error for {}", url))?;
    let body = resp
        .text()
        .await
        .with_context(|| format!("Reading body of {}", url))?;

    info!(
        "Review page fetched - page={}, duration={:.2}s, bytes={}",
        page,
        start.elapsed().as_secs_f32(),
        body.len()
    );
    Ok(Some(body))
}

fn inner_text(fragment: &str) -> String {
    let s = BREAK_RE.replace_all(fragment, "\n");
    let s = TAG_RE.replace_all(&s, " ");
    let s = decode_entities(&s);
    let s = SPACE_RE.replace_all(&s, " ");
    s.lines().map(str::trim).filter(|l| !l.is_empty()).collect::<Vec<_>>().join("\n")
}

fn capture_text(re: &Regex, card: &str) -> String {
    re.captures(card)
        .and_then(|c| c.get(1))
        .map(|m| inner_text(m.as_str()))
        .unwrap_or_default()
}

/// Review cards on one listing page. Missing fields default to empty; cards
/// without a body are skipped.
pub fn extract_reviews(html: &str) -> Vec<RawReview> {
    let mut out = Vec::new();
    for card in html.split(CARD_MARKER).skip(1) {
        let review = capture_text(&BODY_RE, card).replace("READ MORE", "").trim().to_string();
        if review.is_empty() {
            debug!("Skipping card without review body");
            continue;
        }
        out.push(RawReview {
            rating: capture_text(&RATING_RE, card),
            title: capture_text(&TITLE_RE, card),
            review,
        });
    }
    out
}

pub fn has_next_page(html: &str) -> bool {
    NEXT_RE.is_match(html)
}

/// Source of review listing pages, numbered from 1. `Ok(None)` means the page does not exist.
#[async_trait]
pub trait PageSource {
    async fn page(&self, page: usize) -> Result<Option<String>>;
}

/// Live listing pages of one product.
pub struct HttpPages<'a> {
    client: &'a Client,
    product_url: &'a str,
}

impl<'a> HttpPages<'a> {
    pub fn new(client: &'a Client, product_url: &'a str) -> Self {
        Self { client, product_url }
    }
}

#[async_trait]
impl PageSource for HttpPages<'_> {
    async fn page(&self, page: usize) -> Result<Option<String>> {
        fetch_review_page(self.client, self.product_url, page).await
    }
}

/// Scrape the configured product's review pages.
pub async fn collect_reviews(client: &Client, cfg: &ScrapeConfig) -> Result<Vec<RawReview>> {
    let product_url = cfg
        .product_url
        .as_deref()
        .context("No product URL configured (scrape.product_url or --url)")?;
    collect_from(&HttpPages::new(client, product_url), cfg).await
}

/// Walk pages until the target count, a missing page, an empty page,
/// or the last page. Nothing is retried.
pub async fn collect_from(source: &(dyn PageSource + Sync), cfg: &ScrapeConfig) -> Result<Vec<RawReview>> {
    let start = std::time::Instant::now();
    let mut reviews: Vec<RawReview> = Vec::new();
    let mut page = 1usize;

    while reviews.len() < cfg.target_count {
        info!("Scraping page - page={}, collected={}/{}", page, reviews.len(), cfg.target_count);
        let Some(html) = source.page(page).await? else {
            break;
        };

        let found = extract_reviews(&html);
        if found.is_empty() {
            warn!("No review cards on page - page={}", page);
            break;
        }
        let room = cfg.target_count - reviews.len();
        let taken = found.len().min(room);
        reviews.extend(found.into_iter().take(room));
        info!("Collected reviews from page - page={}, count={}", page, taken);

        if reviews.len() >= cfg.target_count {
            break;
        }
        if !has_next_page(&html) {
            info!("No more pages found - last_page={}", page);
            break;
        }
        tokio::time::sleep(Duration::from_millis(cfg.page_delay_ms)).await;
        page += 1;
    }

    info!(
        "Review collection complete - reviews={}, pages={}, duration={:.2}s",
        reviews.len(),
        page,
        start.elapsed().as_secs_f32()
    );
    Ok(reviews)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    const PAGE: &str = r#"
<html><body>
<div class="col EPCmJX Ma1fCG"><div class="row">
  <div class="XQDdHH Ga3i8K">5<img src="star.svg"></div>
  <p class="z9E0IG">Brilliant</p>
  <div class="ZmyHeo"><div><div class="">Very quiet &amp; efficient.<br>Worth it.<span class="b4x-fr">READ MORE</span></div></div></div>
</div></div>
<div class="col EPCmJX Ma1fCG"><div class="row">
  <p class="z9E0IG">No body here</p>
</div></div>
<div class="col EPCmJX Ma1fCG"><div class="row">
  <div class="ZmyHeo"><div><div class="">बहुत अच्छा</div></div></div>
</div></div>
<nav><a href="?page=2"><span>Next</span></a></nav>
</body></html>"#;

    #[test]
    fn test_page_url_sets_page_param() {
        let url = page_url("https://example.com/product-reviews/itm1?pid=ABC&page=3", 7).unwrap();
        assert_eq!(url, "https://example.com/product-reviews/itm1?pid=ABC&page=7");
        let url = page_url("https://example.com/r", 1).unwrap();
        assert_eq!(url, "https://example.com/r?page=1");
        assert!(page_url("not a url", 1).is_err());
    }

    #[test]
    fn test_extract_reviews_from_cards() {
        let reviews = extract_reviews(PAGE);
        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews[0].rating, "5");
        assert_eq!(reviews[0].title, "Brilliant");
        assert_eq!(reviews[0].review, "Very quiet & efficient.\nWorth it.");
        assert_eq!(reviews[1].rating, "");
        assert_eq!(reviews[1].title, "");
        assert_eq!(reviews[1].review, "बहुत अच्छा");
    }

    #[test]
    fn test_next_page_detection() {
        assert!(has_next_page(PAGE));
        assert!(!has_next_page("<span>Previous</span>"));
        assert!(extract_reviews("<html></html>").is_empty());
    }

    #[tokio::test]
    async fn test_collect_requires_product_url() {
        let cfg = ScrapeConfig::default();
        assert!(collect_reviews(&Client::new(), &cfg).await.is_err());
    }

    /// Canned pages; records every page number requested.
    struct CannedPages {
        pages: Vec<Option<String>>,
        requested: Mutex<Vec<usize>>,
    }

    impl CannedPages {
        fn new(pages: Vec<Option<String>>) -> Self {
            Self {
                pages,
                requested: Mutex::new(Vec::new()),
            }
        }

        fn requested(&self) -> Vec<usize> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageSource for CannedPages {
        async fn page(&self, page: usize) -> Result<Option<String>> {
            self.requested.lock().unwrap().push(page);
            Ok(self.pages.get(page - 1).cloned().flatten())
        }
    }

    fn listing(bodies: &[&str], next: bool) -> String {
        let mut html = String::from("<html><body>");
        for b in bodies {
            html.push_str(&format!(
                r#"<div class="col EPCmJX Ma1fCG"><div class="ZmyHeo"><div><div class="">{}</div></div></div></div>"#,
                b
            ));
        }
        if next {
            html.push_str("<nav><span>Next</span></nav>");
        }
        html.push_str("</body></html>");
        html
    }

    fn cfg(target: usize) -> ScrapeConfig {
        ScrapeConfig {
            product_url: Some("https://example.com/r".into()),
            target_count: target,
            page_delay_ms: 0,
            ..ScrapeConfig::default()
        }
    }

    #[tokio::test]
    async fn test_collect_takes_only_remaining_room_from_last_page() {
        let src = CannedPages::new(vec![
            Some(listing(&["a1", "a2", "a3"], true)),
            Some(listing(&["b1", "b2", "b3"], true)),
            Some(listing(&["c1"], true)),
        ]);
        let reviews = collect_from(&src, &cfg(5)).await.unwrap();
        let bodies: Vec<&str> = reviews.iter().map(|r| r.review.as_str()).collect();
        assert_eq!(bodies, vec!["a1", "a2", "a3", "b1", "b2"]);
        assert_eq!(src.requested(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_collect_stops_on_missing_page_without_retry() {
        let src = CannedPages::new(vec![Some(listing(&["a1", "a2"], true)), None]);
        let reviews = collect_from(&src, &cfg(10)).await.unwrap();
        assert_eq!(reviews.len(), 2);
        assert_eq!(src.requested(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_collect_stops_without_next_link() {
        let src = CannedPages::new(vec![
            Some(listing(&["a1"], false)),
            Some(listing(&["b1"], true)),
        ]);
        let reviews = collect_from(&src, &cfg(10)).await.unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(src.requested(), vec![1]);
    }

    #[tokio::test]
    async fn test_collect_stops_on_page_without_cards() {
        let src = CannedPages::new(vec![
            Some(listing(&["a1"], true)),
            Some(listing(&[], true)),
            Some(listing(&["c1"], true)),
        ]);
        let reviews = collect_from(&src, &cfg(10)).await.unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(src.requested(), vec![1, 2]);
    }
}
