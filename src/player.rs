//! Player profile pages (`/profil/spieler/{id}`).
//!
//! Values sit next to labels ("Height:", "Größe:") in spans, list items or
//! `dt`/`dd` pairs. For each field every element holding one of its labels
//! is tried: the element right after the label first, then the text after
//! the label inside the label's container and its parent. When nothing
//! parses, the labelled pattern is run over the whole page text.

use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};

use crate::fields;
use crate::model::PlayerProfile;
use crate::scraper::{clean_text, collapse_whitespace, raw_text, IMAGE_WITH_ALT};

lazy_static! {
    static ref NAME_CANDIDATES: Vec<Selector> = [
        "h1.data-header__headline-wrapper",
        "h1",
        "div.data-header__headline-wrapper",
        "span.data-header__headline",
    ]
    .iter()
    .map(|s| Selector::parse(s).unwrap())
    .collect();
    static ref VALUE_BOXES: Selector =
        Selector::parse("div[class*='value'], span[class*='value'], a[class*='value'], div[class*='marktwert'], span[class*='marktwert']")
            .unwrap();
}

const LABEL_CONTAINERS: &[&str] = &["div", "span", "li", "dt", "th", "td"];

const CITIZENSHIP: &[&str] = &["citizenship", "staatsbürgerschaft"];
const DATE_OF_BIRTH: &[&str] = &["date of birth", "geburtstag", "geb./alter"];
const POSITION: &[&str] = &["main position", "hauptposition", "position:"];
const HEIGHT: &[&str] = &["height", "größe", "grösse"];
const FOOT: &[&str] = &["foot:", "fuß:", "fuss:"];
const CAPS_GOALS: &[&str] = &["caps/goals", "länderspiele"];
const MARKET_VALUE: &[&str] = &["market value", "marktwert"];

/// A label found on the page and the element that holds it.
struct Labelled<'a> {
    label: &'static str,
    container: ElementRef<'a>,
}

impl<'a> Labelled<'a> {
    /// The element right after the label's container.
    fn sibling(&self) -> Option<ElementRef<'a>> {
        self.container.next_siblings().filter_map(ElementRef::wrap).next()
    }

    fn parent(&self) -> Option<ElementRef<'a>> {
        self.container.parent().and_then(ElementRef::wrap)
    }

    /// Texts that may hold the value, most specific first.
    fn candidates(&self) -> Vec<String> {
        let mut texts = Vec::new();
        if let Some(sibling) = self.sibling() {
            texts.push(clean_text(&sibling));
        }
        for element in [Some(self.container), self.parent()].into_iter().flatten() {
            if let Some(value) = fields::after_label(&raw_text(&element), self.label) {
                texts.push(collapse_whitespace(&value));
            }
        }
        texts
    }

    fn value<T>(&self, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
        self.candidates().iter().find_map(|t| parse(t))
    }
}

/// Containers of every text node that mentions one of `labels`, in page order.
fn find_labels<'a>(document: &'a Html, labels: &[&'static str]) -> Vec<Labelled<'a>> {
    document
        .root_element()
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let lower = text.to_lowercase();
            let label = *labels.iter().find(|l| lower.contains(*l))?;
            let container = node
                .ancestors()
                .filter_map(ElementRef::wrap)
                .find(|e| LABEL_CONTAINERS.contains(&e.value().name()))?;
            Some(Labelled { label, container })
        })
        .collect()
}

fn lookup<T>(document: &Html, page_text: &str, labels: &[&'static str], parse: impl Fn(&str) -> Option<T>) -> Option<T> {
    find_labels(document, labels)
        .iter()
        .find_map(|l| l.value(&parse))
        .or_else(|| {
            labels
                .iter()
                .filter_map(|label| fields::after_label(page_text, label))
                .find_map(|value| parse(&value))
        })
}

/// Free text that is not itself another label.
fn plain_value(text: &str) -> Option<String> {
    let text = collapse_whitespace(text);
    (!text.is_empty() && !text.ends_with(':')).then_some(text)
}

fn nationality(document: &Html, page_text: &str) -> Option<String> {
    let flag = find_labels(document, CITIZENSHIP).iter().find_map(|l| {
        [l.sibling(), Some(l.container), l.parent()]
            .into_iter()
            .flatten()
            .flat_map(|e| e.select(&IMAGE_WITH_ALT))
            .filter_map(|img| img.value().attr("alt"))
            .map(str::trim)
            .find(|alt| !alt.is_empty())
            .map(str::to_string)
    });
    flag.or_else(|| lookup(document, page_text, CITIZENSHIP, plain_value))
}

fn market_value(document: &Html, page_text: &str) -> Option<String> {
    find_labels(document, MARKET_VALUE)
        .iter()
        .find_map(|l| l.value(fields::market_value))
        .or_else(|| {
            document
                .select(&VALUE_BOXES)
                .find_map(|e| fields::market_value(&clean_text(&e)))
        })
        .or_else(|| fields::market_value(page_text))
}

fn heading(document: &Html) -> Option<String> {
    NAME_CANDIDATES.iter().find_map(|selector| {
        document
            .select(selector)
            .map(|e| clean_text(&e))
            .find(|t| !t.is_empty())
    })
}

/// Everything a profile page says about a player; unknown fields stay empty.
pub fn parse_player_profile(html: &str) -> PlayerProfile {
    let document = Html::parse_document(html);
    let page_text: String = document.root_element().text().collect();

    let mut profile = PlayerProfile::default();

    if let Some(name) = heading(&document) {
        let (jersey, name) = fields::jersey_and_name(&name);
        profile.player_name = name;
        profile.jersey_number = jersey.unwrap_or_default();
    }

    profile.nationality = nationality(&document, &page_text).unwrap_or_default();
    profile.date_of_birth = lookup(&document, &page_text, DATE_OF_BIRTH, fields::any_date)
        .or_else(|| fields::labeled_date_of_birth(&page_text))
        .unwrap_or_default();
    profile.position = lookup(&document, &page_text, POSITION, plain_value).unwrap_or_default();
    profile.height = lookup(&document, &page_text, HEIGHT, fields::height).unwrap_or_default();
    profile.foot = lookup(&document, &page_text, FOOT, fields::foot).unwrap_or_default();
    if let Some((caps, goals)) = lookup(&document, &page_text, CAPS_GOALS, fields::caps_goals) {
        profile.caps = caps;
        profile.goals = goals.unwrap_or_default();
    }
    profile.current_market_value = market_value(&document, &page_text).unwrap_or_default();

    tracing::debug!(player = %profile.player_name, "parsed player profile");
    profile
}

#[cfg(test)]
mod tests {
    use super::*;

    const INFO_TABLE_PAGE: &str = r#"<html><body>
        <header>
          <h1 class="data-header__headline-wrapper"><span class="data-header__shirt-number">#1</span>
            Thibaut Courtois</h1>
          <a class="data-header__market-value-wrapper"><span class="waehrung">€</span>18.00<span class="waehrung">m</span>
            <p>Last update: 20/12/2024</p></a>
        </header>
        <div class="info-table">
          <span class="info-table__content info-table__content--regular">Date of birth/Age:</span>
          <span class="info-table__content info-table__content--bold"><a href="/x">11/05/1992 (32)</a></span>
          <span class="info-table__content info-table__content--regular">Height:</span>
          <span class="info-table__content info-table__content--bold">1,99&nbsp;m</span>
          <span class="info-table__content info-table__content--regular">Citizenship:</span>
          <span class="info-table__content info-table__content--bold"><img alt="Belgium" src="be.png"> Belgium</span>
          <span class="info-table__content info-table__content--regular">Position:</span>
          <span class="info-table__content info-table__content--bold">Goalkeeper</span>
          <span class="info-table__content info-table__content--regular">Foot:</span>
          <span class="info-table__content info-table__content--bold">left</span>
        </div>
        <ul><li class="data-header__label">Caps/Goals: <a>107</a> / <a>0</a></li></ul>
    </body></html>"#;

    #[test]
    fn info_table_profile() {
        let profile = parse_player_profile(INFO_TABLE_PAGE);
        assert_eq!(profile.player_name, "Thibaut Courtois");
        assert_eq!(profile.jersey_number, "1");
        assert_eq!(profile.date_of_birth, "11/05/1992");
        assert_eq!(profile.height, "1.99 m");
        assert_eq!(profile.nationality, "Belgium");
        assert_eq!(profile.position, "Goalkeeper");
        assert_eq!(profile.foot, "left");
        assert_eq!(profile.caps, "107");
        assert_eq!(profile.goals, "0");
        assert_eq!(profile.current_market_value, "€18.00m");
    }

    #[test]
    fn definition_list_and_german_labels() {
        let html = r#"<html><body><h1>Jamal Musiala</h1>
            <dl><dt>Hauptposition:</dt><dd>Offensives Mittelfeld</dd></dl>
            <ul><li>Größe: 1,84 m</li><li>Fuß: rechts / right</li></ul>
            <div class="marktwert">Marktwert: €140.00m</div>
        </body></html>"#;
        let profile = parse_player_profile(html);
        assert_eq!(profile.player_name, "Jamal Musiala");
        assert_eq!(profile.jersey_number, "");
        assert_eq!(profile.position, "Offensives Mittelfeld");
        assert_eq!(profile.height, "1.84 m");
        assert_eq!(profile.foot, "right");
        assert_eq!(profile.current_market_value, "€140.00m");
    }

    #[test]
    fn citizenship_text_without_flag() {
        let html = r#"<html><body><p>Citizenship: Spain</p></body></html>"#;
        assert_eq!(parse_player_profile(html).nationality, "Spain");
    }

    #[test]
    fn empty_page_gives_empty_profile() {
        assert_eq!(parse_player_profile("<html><body></body></html>"), PlayerProfile::default());
    }
}
