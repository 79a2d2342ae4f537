//! Page fetching and shared HTML helpers.
//!
//! Uses reqwest for fetching and scraper for HTML parsing. Fetchers hand back
//! the raw body; each extractor parses it synchronously so a parsed document
//! never lives across an await point.

use async_trait::async_trait;
use lazy_static::lazy_static;
use reqwest::{Client, Url};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

use crate::config::ScraperConfig;
use crate::model::{Continent, League};

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("failed to fetch URL: {0}")]
    Request(#[from] reqwest::Error),
    #[error("server answered {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
}

/// Source of page bodies. `None` means the page is unavailable, never an error.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &str) -> Option<String>;
}

/// Rate-limited HTTP fetcher: sleeps a fixed delay before every request, no retries.
pub struct HttpFetcher {
    client: Client,
    delay: Duration,
}

impl HttpFetcher {
    pub fn new(config: &ScraperConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            delay: config.delay(),
        })
    }

    async fn try_fetch(&self, url: &str) -> Result<String, FetchError> {
        tokio::time::sleep(self.delay).await;

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Option<String> {
        match self.try_fetch(url).await {
            Ok(body) => Some(body),
            Err(e) => {
                tracing::warn!(url, error = %e, "fetch failed");
                None
            }
        }
    }
}

/// Per-process league lists keyed by continent, for the read-only listing path.
#[derive(Default)]
pub struct LeagueCache {
    entries: Mutex<HashMap<Continent, Vec<League>>>,
}

impl LeagueCache {
    pub fn get(&self, continent: Continent) -> Option<Vec<League>> {
        self.entries.lock().ok()?.get(&continent).cloned()
    }

    pub fn insert(&self, continent: Continent, leagues: Vec<League>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(continent, leagues);
        }
    }
}

lazy_static! {
    pub(crate) static ref TABLE: Selector = Selector::parse("table").unwrap();
    pub(crate) static ref ITEMS_TABLE: Selector = Selector::parse("table.items").unwrap();
    pub(crate) static ref ROW: Selector = Selector::parse("tr").unwrap();
    pub(crate) static ref LINK: Selector = Selector::parse("a[href]").unwrap();
    pub(crate) static ref IMAGE_WITH_ALT: Selector = Selector::parse("img[alt]").unwrap();
    static ref H1: Selector = Selector::parse("h1").unwrap();
}

/// Concatenated text of an element, like a browser's `textContent`.
pub fn raw_text(element: &ElementRef) -> String {
    element.text().collect()
}

/// Element text with whitespace runs collapsed to single spaces.
pub fn clean_text(element: &ElementRef) -> String {
    collapse_whitespace(&raw_text(element))
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolve `href` against `base`, falling back to plain concatenation.
pub fn absolute_url(base: &str, href: &str) -> String {
    Url::parse(base)
        .and_then(|b| b.join(href))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| format!("{}{}", base.trim_end_matches('/'), href))
}

/// The `<table class="items">` listings, or every table when none carry the class.
pub fn listing_tables(document: &Html) -> Vec<ElementRef<'_>> {
    let items: Vec<_> = document.select(&ITEMS_TABLE).collect();
    if !items.is_empty() {
        return items;
    }
    document.select(&TABLE).collect()
}

/// Rows that belong to `table` itself, skipping rows of nested inline tables.
pub fn own_rows<'a>(table: ElementRef<'a>) -> Vec<ElementRef<'a>> {
    table
        .select(&ROW)
        .filter(|row| {
            row.ancestors()
                .filter_map(ElementRef::wrap)
                .find(|e| e.value().name() == "table")
                .map(|t| t.id() == table.id())
                .unwrap_or(false)
        })
        .collect()
}

/// Direct `<td>` children of a row.
pub fn cells<'a>(row: ElementRef<'a>) -> Vec<ElementRef<'a>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|e| e.value().name() == "td")
        .collect()
}

/// First link inside `element` whose href satisfies `accept`.
pub fn find_link<'a>(element: ElementRef<'a>, accept: impl Fn(&str) -> bool) -> Option<ElementRef<'a>> {
    element
        .select(&LINK)
        .find(|a| a.value().attr("href").map(&accept).unwrap_or(false))
}

/// Text of the first `<h1>` on a page, whitespace-collapsed.
pub fn page_heading(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    document
        .select(&H1)
        .map(|h| clean_text(&h))
        .find(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_url_joins_relative_paths() {
        assert_eq!(
            absolute_url("https://www.transfermarkt.com", "/fc-porto/startseite/verein/720"),
            "https://www.transfermarkt.com/fc-porto/startseite/verein/720"
        );
        assert_eq!(
            absolute_url("https://www.transfermarkt.com", "https://other.example/a"),
            "https://other.example/a"
        );
    }

    #[test]
    fn own_rows_skip_nested_tables() {
        let html = r#"<table id="outer"><tbody>
            <tr><td><table class="inline-table"><tr><td>inner</td></tr></table></td></tr>
            <tr><td>second</td></tr>
        </tbody></table>"#;
        let document = Html::parse_document(html);
        let outer = document.select(&Selector::parse("#outer").unwrap()).next().unwrap();
        let rows = own_rows(outer);
        assert_eq!(rows.len(), 2);
        assert_eq!(cells(rows[1]).len(), 1);
    }

    #[test]
    fn heading_is_collapsed() {
        let html = "<html><body><h1>\n  Premier   League \n</h1></body></html>";
        assert_eq!(page_heading(html).as_deref(), Some("Premier League"));
    }

    #[test]
    fn league_cache_round_trip() {
        let cache = LeagueCache::default();
        assert!(cache.get(Continent::Afrika).is_none());
        cache.insert(Continent::Afrika, Vec::new());
        assert_eq!(cache.get(Continent::Afrika), Some(Vec::new()));
    }
}
