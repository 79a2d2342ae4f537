//! Players from a club's squad page (`/kader/verein/{id}`).

use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};

use crate::fields;
use crate::model::Player;
use crate::scraper::{absolute_url, clean_text};
use crate::urls;

lazy_static! {
    static ref PLAYER_LINKS: Selector = Selector::parse("a[href*='/profil/spieler/']").unwrap();
    static ref CELL: Selector = Selector::parse("td").unwrap();
    static ref JERSEY_NUMBER: Selector = Selector::parse(".rn_nummer").unwrap();
}

const POSITION_WORDS: &[&str] = &[
    "goalkeeper",
    "defender",
    "midfielder",
    "forward",
    "attacker",
    "torwart",
    "verteidiger",
    "mittelfeld",
    "stürmer",
    "angreifer",
];
const POSITION_ABBREVIATIONS: &[&str] = &["gk", "df", "mf", "fw", "att"];

/// Every player linked from a squad page, once per id, in page order.
pub fn parse_squad(html: &str, base_url: &str) -> Vec<Player> {
    let document = Html::parse_document(html);

    // A player is usually linked twice (photo and name); group by id.
    let mut groups: Vec<(String, Vec<ElementRef>)> = Vec::new();
    for link in document.select(&PLAYER_LINKS) {
        let Some(id) = link.value().attr("href").and_then(urls::player_id) else {
            continue;
        };
        match groups.iter_mut().find(|(seen, _)| *seen == id) {
            Some((_, links)) => links.push(link),
            None => groups.push((id, vec![link])),
        }
    }

    let players: Vec<Player> = groups
        .into_iter()
        .filter_map(|(id, links)| player_from_links(id, &links, base_url))
        .collect();
    tracing::info!(count = players.len(), "parsed squad");
    players
}

fn player_from_links(id: String, links: &[ElementRef], base_url: &str) -> Option<Player> {
    let first = *links.first()?;
    let link = links
        .iter()
        .copied()
        .find(|l| !clean_text(l).is_empty())
        .unwrap_or(first);

    let mut text = clean_text(&link);
    if text.is_empty() {
        text = link
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|e| matches!(e.value().name(), "td" | "div" | "span"))
            .map(|e| clean_text(&e))
            .unwrap_or_default();
    }
    if text.is_empty() {
        return None;
    }

    let (jersey, name) = fields::jersey_and_name(&text);
    let rows = enclosing_rows(link);
    let jersey_number = jersey.or_else(|| jersey_from_rows(&rows)).unwrap_or_default();

    Some(Player {
        name,
        jersey_number,
        profile_url: absolute_url(base_url, link.value().attr("href")?),
        id,
        position: position_from_rows(&rows).unwrap_or_default(),
    })
}

/// Innermost row first; squad tables nest an inline table inside each row.
fn enclosing_rows(link: ElementRef) -> Vec<ElementRef> {
    link.ancestors()
        .filter_map(ElementRef::wrap)
        .filter(|e| e.value().name() == "tr")
        .collect()
}

fn jersey_from_rows(rows: &[ElementRef]) -> Option<String> {
    rows.iter().find_map(|row| {
        row.select(&JERSEY_NUMBER)
            .map(|e| clean_text(&e))
            .find(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
    })
}

fn position_from_rows(rows: &[ElementRef]) -> Option<String> {
    rows.iter().find_map(|row| {
        row.select(&CELL)
            .filter(|cell| cell.select(&CELL).next().is_none())
            .find_map(|cell| position(&clean_text(&cell)))
    })
}

/// A position word keeps the cell's text; an abbreviation is upper-cased.
fn position(cell_text: &str) -> Option<String> {
    let lower = cell_text.to_lowercase();
    if POSITION_WORDS.iter().any(|w| lower.contains(w)) {
        return Some(cell_text.to_string());
    }
    POSITION_ABBREVIATIONS
        .contains(&lower.as_str())
        .then(|| lower.to_uppercase())
}
