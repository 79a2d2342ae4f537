//! Manager profile pages: name, date of birth and preferred formation.

use lazy_static::lazy_static;
use scraper::{Html, Selector};

use crate::fields;
use crate::model::ManagerProfile;
use crate::scraper::{clean_text, raw_text, own_rows, TABLE};

lazy_static! {
    static ref INFO_TABLE: Selector = Selector::parse("table.auflistung").unwrap();
    static ref NAME_CANDIDATES: Vec<Selector> = [
        "h1",
        "div.data-header__headline-wrapper",
        "span.data-header__headline",
        "div.data-header__headline",
        "div[class*='headline']",
        "span[class*='headline']",
    ]
    .iter()
    .map(|s| Selector::parse(s).unwrap())
    .collect();
    static ref TRAINER_LINKS: Selector = Selector::parse("a[href*='/trainer/']").unwrap();
}

const DOB_LABELS: &[&str] = &["date of birth", "geburtstag", "geboren", "geb."];
const FORMATION_LABELS: &[&str] = &["formation", "lieblingsformation"];
/// Shorter headings are layout noise, not names.
const MIN_NAME_LEN: usize = 3;

/// Date of birth and preferred formation, empty when the page has neither.
///
/// Label rows of the info table are searched first, then the whole page.
pub fn parse_manager_profile(html: &str) -> ManagerProfile {
    let document = Html::parse_document(html);
    let rows: Vec<String> = document
        .select(&INFO_TABLE)
        .next()
        .or_else(|| document.select(&TABLE).next())
        .map(|table| own_rows(table).iter().map(|r| raw_text(r)).collect())
        .unwrap_or_default();

    let labelled = |labels: &[&str], parse: fn(&str) -> Option<String>| {
        rows.iter()
            .filter(|row| {
                let lower = row.to_lowercase();
                labels.iter().any(|l| lower.contains(l))
            })
            .find_map(|row| parse(row))
    };

    let page_text: String = document.root_element().text().collect();

    ManagerProfile {
        date_of_birth: labelled(DOB_LABELS, fields::date_of_birth)
            .or_else(|| fields::date_of_birth(&page_text))
            .unwrap_or_default(),
        preferred_formation: labelled(FORMATION_LABELS, fields::formation)
            .or_else(|| fields::formation(&page_text))
            .unwrap_or_default(),
    }
}

/// Display name from a profile page's heading, or the first named trainer link.
pub fn parse_manager_name(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let from_heading = NAME_CANDIDATES.iter().find_map(|selector| {
        document
            .select(selector)
            .map(|e| clean_text(&e))
            .find(|name| name.chars().count() >= MIN_NAME_LEN)
    });
    from_heading.or_else(|| {
        document
            .select(&TRAINER_LINKS)
            .map(|a| clean_text(&a))
            .find(|name| name.chars().count() >= MIN_NAME_LEN)
    })
}
