//! Club table on a league page.
//!
//! The table is located by an ordered list of strategies; the first one that
//! finds something wins.

use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;

use crate::model::Club;
use crate::scraper::{
    absolute_url, cells, clean_text, find_link, own_rows, raw_text, ITEMS_TABLE, TABLE,
};
use crate::urls;

lazy_static! {
    static ref CLUBS_HEADING: Regex = Regex::new(r"(?i)clubs\s*-").unwrap();
    static ref HEADINGS: Selector = Selector::parse("h2, h3, h4").unwrap();
    static ref HEADING_CONTAINERS: Selector = Selector::parse("h2, h3, h4, div").unwrap();
}

/// Siblings inspected after a "Clubs - …" heading.
const HEADING_LOOKAHEAD: usize = 10;
const CLUB_LINK: &str = "/startseite/verein/";

/// Locates the club table in a parsed league page.
pub type TableStrategy = for<'a> fn(&'a Html) -> Option<ElementRef<'a>>;

/// Heading first, then any listing with club links, then the first table.
pub const TABLE_STRATEGIES: &[(&str, TableStrategy)] = &[
    ("clubs heading", table_after_heading),
    ("club links", table_with_club_links),
    ("first table", first_table),
];

fn is_club_link(href: &str) -> bool {
    href.contains(CLUB_LINK)
}

/// Table following a "Clubs - {league} {season}" heading, directly or inside a
/// following container.
pub fn table_after_heading(document: &Html) -> Option<ElementRef<'_>> {
    let mut headings: Vec<ElementRef> = document
        .select(&HEADINGS)
        .filter(|h| CLUBS_HEADING.is_match(&raw_text(h)))
        .collect();
    if headings.is_empty() {
        // Heading text may sit in a div or a nested span.
        headings = document
            .select(&HEADING_CONTAINERS)
            .filter(|h| {
                h.text().any(|t| CLUBS_HEADING.is_match(t))
                    && !h.select(&HEADING_CONTAINERS).any(|inner| inner.text().any(|t| CLUBS_HEADING.is_match(t)))
            })
            .collect();
    }

    headings.into_iter().find_map(|heading| {
        heading
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .take(HEADING_LOOKAHEAD)
            .find_map(|sibling| match sibling.value().name() {
                "table" => Some(sibling),
                "div" | "section" => sibling.select(&ITEMS_TABLE).next(),
                _ => None,
            })
    })
}

/// First `table.items` that links to club pages.
pub fn table_with_club_links(document: &Html) -> Option<ElementRef<'_>> {
    document
        .select(&ITEMS_TABLE)
        .find(|t| find_link(*t, is_club_link).is_some())
}

pub fn first_table(document: &Html) -> Option<ElementRef<'_>> {
    document.select(&TABLE).next()
}

/// Parse the clubs of a league page, de-duplicated by name (first wins).
pub fn parse_clubs(html: &str, base_url: &str) -> Vec<Club> {
    let document = Html::parse_document(html);
    let Some((strategy, table)) = TABLE_STRATEGIES
        .iter()
        .find_map(|(name, find)| find(&document).map(|t| (*name, t)))
    else {
        tracing::info!("no club table found");
        return Vec::new();
    };
    tracing::debug!(strategy, "club table located");

    let mut seen = HashSet::new();
    let mut clubs = Vec::new();
    for row in own_rows(table) {
        let Some(club) = parse_row(row, base_url) else {
            continue;
        };
        if seen.insert(club.name.clone()) {
            clubs.push(club);
        }
    }

    tracing::info!(count = clubs.len(), "parsed clubs");
    clubs
}

fn parse_row(row: ElementRef, base_url: &str) -> Option<Club> {
    let row_cells = cells(row);
    if row_cells.is_empty() {
        return None;
    }
    // Summary and total rows carry no club links.
    find_link(row, is_club_link)?;

    let link = row_cells
        .get(1)
        .and_then(|c| find_link(*c, is_club_link))
        .or_else(|| find_link(row_cells[0], is_club_link))
        .or_else(|| row_cells.iter().find_map(|c| find_link(*c, is_club_link)))?;

    let mut name = clean_text(&link);
    if name.is_empty() {
        name = link
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|e| e.value().name() == "td")
            .map(|td| clean_text(&td))
            .unwrap_or_default();
    }
    if name.is_empty() {
        return None;
    }

    let href = link.value().attr("href")?;
    let url = urls::canonical_club_url(base_url, &absolute_url(base_url, href));
    url.contains("verein").then(|| Club::standalone(name, url))
}
