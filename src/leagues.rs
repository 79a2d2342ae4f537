//! League listing on a continent page (`/wettbewerbe/{continent}`).

use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html};

use crate::model::League;
use crate::scraper::{absolute_url, cells, clean_text, find_link, listing_tables, own_rows, IMAGE_WITH_ALT};
use crate::urls;

lazy_static! {
    static ref REPEATED_PAREN: Regex = Regex::new(r"^(.+?)\s*\((.+?)\)$").unwrap();
    static ref TRAILING_PAREN: Regex = Regex::new(r"\s*\(([^)]+)\)$").unwrap();
    static ref LEADING_BULLET: Regex = Regex::new(r"^\s*[-•]\s*").unwrap();
}

const MAX_COUNTRY_LEN: usize = 50;

/// Parse every league row of a continent page. No table or no rows is an empty list.
pub fn parse_leagues(html: &str, base_url: &str) -> Vec<League> {
    let document = Html::parse_document(html);
    let Some(table) = listing_tables(&document).into_iter().next() else {
        tracing::info!("no league table found");
        return Vec::new();
    };

    let mut leagues = Vec::new();
    for row in own_rows(table) {
        let row_cells = cells(row);
        let Some(first) = row_cells.first() else {
            continue;
        };
        if let Some(league) = parse_row(*first, &row_cells, base_url, leagues.len()) {
            tracing::debug!(name = %league.name, country = %league.country, "league");
            leagues.push(league);
        }
    }

    tracing::info!(count = leagues.len(), "parsed leagues");
    leagues
}

fn parse_row(first: ElementRef, row_cells: &[ElementRef], base_url: &str, index: usize) -> Option<League> {
    let link = find_link(first, |href| href.contains("/startseite/wettbewerb/"))
        .or_else(|| find_link(first, |href| href.contains("/wettbewerb/")))?;

    let mut name = clean_text(&link);
    if name.is_empty() {
        name = clean_text(&first);
    }
    if name.is_empty() {
        return None;
    }
    let href = link.value().attr("href")?;
    let url = absolute_url(base_url, href);

    let mut name = drop_repeated_parenthetical(&name);
    let mut country = country_from_flags(row_cells, &name)
        .or_else(|| country_from_second_cell(row_cells, &name));
    if country.is_none() {
        if let Some((stripped, suffix)) = split_country_suffix(&name) {
            name = stripped;
            country = Some(suffix);
        }
    }

    Some(League {
        id: urls::league_id(&url).unwrap_or_else(|| index.to_string()),
        name,
        url,
        country: country.unwrap_or_default(),
    })
}

/// "Serie A (Serie A)" becomes "Serie A"; other parentheticals are kept.
fn drop_repeated_parenthetical(name: &str) -> String {
    match REPEATED_PAREN.captures(name) {
        Some(c) if c[1].trim().eq_ignore_ascii_case(c[2].trim()) => c[1].trim().to_string(),
        _ => name.to_string(),
    }
}

fn plausible_country(candidate: &str, league_name: &str) -> bool {
    let lower = candidate.to_lowercase();
    !candidate.is_empty()
        && lower != league_name.to_lowercase()
        && candidate.chars().count() < MAX_COUNTRY_LEN
        && !lower.contains("league")
        && !lower.contains("liga")
}

/// Alt text of the first flag image in any cell.
fn country_from_flags(row_cells: &[ElementRef], league_name: &str) -> Option<String> {
    row_cells
        .iter()
        .flat_map(|cell| cell.select(&IMAGE_WITH_ALT))
        .filter_map(|img| img.value().attr("alt"))
        .map(str::trim)
        .find(|alt| plausible_country(alt, league_name))
        .map(str::to_string)
}

/// Text of the second cell when it is not the league name itself.
fn country_from_second_cell(row_cells: &[ElementRef], league_name: &str) -> Option<String> {
    let cell = row_cells.get(1)?;
    let text = clean_text(cell);
    let text = LEADING_BULLET.replace(&text, "").trim().to_string();
    plausible_country(&text, league_name).then_some(text)
}

/// "Premier League (England)" gives ("Premier League", "England").
fn split_country_suffix(name: &str) -> Option<(String, String)> {
    let caps = TRAILING_PAREN.captures(name)?;
    let country = caps[1].trim().to_string();
    if !plausible_country(&country, name) {
        return None;
    }
    let stripped = TRAILING_PAREN.replace(name, "").trim().to_string();
    Some((stripped, country))
}
