//! Current manager from a club's staff page (`/mitarbeiter/verein/{id}`).

use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;

use crate::model::{Manager, Role};
use crate::role::RoleClassifier;
use crate::scraper::{absolute_url, cells, clean_text, find_link, listing_tables, own_rows, raw_text};
use crate::urls;

lazy_static! {
    static ref TRAINER_LINK: Regex = Regex::new(r"/trainer/\d+").unwrap();
    static ref TRAINER_ANCHORS: Selector = Selector::parse("a[href*='/trainer/']").unwrap();
}

const STAFF_TABLE_MARKERS: &[&str] = &["coaching staff", "manager", "trainer"];

fn is_trainer_link(href: &str) -> bool {
    TRAINER_LINK.is_match(href)
}

/// Managers listed on a staff page, de-duplicated by id.
///
/// Rows of the staff tables are classified first. Only when none of them
/// yields a manager is every trainer link on the page classified against the
/// text of its nearest row, cell or block.
pub fn parse_staff(html: &str, base_url: &str, classifier: &RoleClassifier) -> Vec<Manager> {
    let document = Html::parse_document(html);

    let mut managers = Vec::new();
    let mut seen = HashSet::new();

    for table in staff_tables(&document) {
        for row in own_rows(table) {
            if cells(row).is_empty() {
                continue;
            }
            let Some(role) = classifier.classify_staff(&raw_text(&row)) else {
                continue;
            };
            let Some(link) = find_link(row, is_trainer_link) else {
                continue;
            };
            if let Some(manager) = manager_from_link(link, role, base_url) {
                if seen.insert(manager.id.clone()) {
                    tracing::debug!(name = %manager.name, id = %manager.id, "manager in staff table");
                    managers.push(manager);
                }
            }
        }
    }
    if !managers.is_empty() {
        return managers;
    }

    for link in document.select(&TRAINER_ANCHORS) {
        if !link.value().attr("href").map(is_trainer_link).unwrap_or(false) {
            continue;
        }
        let Some(context) = nearest_block(link) else {
            continue;
        };
        let Some(role) = classifier.classify_staff(&raw_text(&context)) else {
            continue;
        };
        if let Some(manager) = manager_from_link(link, role, base_url) {
            if seen.insert(manager.id.clone()) {
                tracing::debug!(name = %manager.name, id = %manager.id, "manager from trainer link");
                managers.push(manager);
            }
        }
    }
    managers
}

fn staff_tables(document: &Html) -> Vec<ElementRef<'_>> {
    listing_tables(document)
        .into_iter()
        .filter(|table| {
            let text = raw_text(table).to_lowercase();
            STAFF_TABLE_MARKERS.iter().any(|m| text.contains(m))
        })
        .collect()
}

fn nearest_block(link: ElementRef) -> Option<ElementRef> {
    link.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|e| matches!(e.value().name(), "tr" | "td" | "div"))
}

fn manager_from_link(link: ElementRef, role: Role, base_url: &str) -> Option<Manager> {
    let name = clean_text(&link);
    if name.is_empty() {
        return None;
    }
    let profile_url = absolute_url(base_url, link.value().attr("href")?);
    let id = urls::manager_id(&profile_url)?;
    Some(Manager {
        name,
        profile_url,
        id,
        role,
    })
}
