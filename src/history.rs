//! A manager's career-history table (`/stationen/trainer/{id}/plus/1`).
//!
//! Rows are read positionally:
//!
//! | col | content                         |
//! |-----|---------------------------------|
//! | 0-1 | club name and link, role text   |
//! | 2   | appointed `16/17 (01/07/2016)`  |
//! | 3   | in charge until                 |
//! | 4   | from / until seasons            |
//! | 5   | days in charge                  |
//! | 6-9 | matches, wins, draws, losses    |
//! | 10  | players used                    |
//! | 11  | average goals `2.10 : 0.90`     |
//! | 12  | points per match                |
//!
//! Every column is parsed on its own; a cell that does not match leaves its
//! field absent and the rest of the row is still read.

use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html};

use crate::fields::{self, Until};
use crate::model::{CareerHistoryEntry, Role};
use crate::role::RoleClassifier;
use crate::scraper::{absolute_url, cells, clean_text, find_link, listing_tables, own_rows, raw_text};

/// Shortest row that still carries a tenure.
const MIN_CELLS: usize = 5;
const CURRENT: &str = "Current";
const CLUB_SEPARATORS: &[&str] = &[" — ", " – ", " - ", "\n"];

lazy_static! {
    static ref TRAILING_ROLE: Regex = Regex::new(r"(?i)\s*manager\s*$").unwrap();
}

/// Club link found in the first two cells, as `(name, absolute url)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClubLink {
    pub name: String,
    pub url: String,
}

/// Parse one history row from its cell texts.
///
/// Returns `None` for rows that are too short or name no club. The entry's
/// `role` is only set when the row text classifies as the head-coach role.
pub fn parse_history_row(
    texts: &[String],
    club_link: Option<ClubLink>,
    classifier: &RoleClassifier,
) -> Option<CareerHistoryEntry> {
    if texts.len() < MIN_CELLS {
        return None;
    }

    let club_cell = &texts[1];
    let club = club_link.or_else(|| club_from_text(club_cell))?;

    let row_text: String = texts.concat();
    let combined = format!("{club_cell} {row_text}");

    let role = classifier.classify(&combined);
    // Without a link the role can be glued to the club name: "Real MadridManager".
    let club_name = match role {
        Some(_) if club.url.is_empty() => without_trailing_role(&club.name),
        _ => club.name,
    };

    let mut entry = CareerHistoryEntry {
        club: club_name,
        club_url: club.url,
        role,
        ..Default::default()
    };

    if let Some((season, date)) = fields::season_and_date(&texts[2]) {
        entry.appointed_season = Some(season);
        entry.appointed_date = Some(date);
    }

    match fields::until(&texts[3]) {
        Until::Current => entry.until_date = Some(CURRENT.to_string()),
        Until::Dated { season, date } => {
            entry.until_season = Some(season);
            entry.until_date = Some(date);
        }
        Until::Text(text) => entry.until_date = Some(text),
    }

    if let Some((from, until)) = fields::period(&texts[4]) {
        entry.period_from = Some(from);
        entry.period_until = Some(until.unwrap_or_else(|| CURRENT.to_string()));
    }

    let cell = |i: usize| texts.get(i).map(String::as_str);

    entry.days_in_charge = cell(5).and_then(fields::integer);
    if texts.len() > 9 {
        entry.matches = fields::integer(&texts[6]);
        entry.wins = fields::integer(&texts[7]);
        entry.draws = fields::integer(&texts[8]);
        entry.losses = fields::integer(&texts[9]);
    }
    entry.players_used = cell(10).and_then(fields::integer);
    if let Some((for_, against)) = cell(11).and_then(fields::goal_ratio) {
        entry.avg_goals_for = Some(for_);
        entry.avg_goals_against = Some(against);
    }
    entry.points_per_match = cell(12).and_then(fields::decimal);

    Some(entry)
}

/// "Real Madrid — Manager" gives "Real Madrid" when the cell has no club link.
fn club_from_text(text: &str) -> Option<ClubLink> {
    let text = text.trim();
    let name = CLUB_SEPARATORS
        .iter()
        .filter_map(|sep| text.split_once(sep).map(|(head, _)| head))
        .min_by_key(|head| head.len())
        .unwrap_or(text)
        .trim();
    (!name.is_empty()).then(|| ClubLink {
        name: name.to_string(),
        url: String::new(),
    })
}

fn without_trailing_role(name: &str) -> String {
    let stripped = TRAILING_ROLE.replace(name, "");
    if stripped.trim().is_empty() {
        name.to_string()
    } else {
        stripped.trim().to_string()
    }
}

fn club_link(row_cells: &[ElementRef], base_url: &str) -> Option<ClubLink> {
    [1, 0].iter().find_map(|&i| {
        let link = find_link(*row_cells.get(i)?, |href| href.contains("/verein/"))?;
        let name = clean_text(&link);
        if name.is_empty() {
            return None;
        }
        Some(ClubLink {
            name,
            url: absolute_url(base_url, link.value().attr("href")?),
        })
    })
}

/// Stints held in the exact "Manager" role, in table order.
pub fn parse_history(html: &str, base_url: &str, classifier: &RoleClassifier) -> Vec<CareerHistoryEntry> {
    let document = Html::parse_document(html);
    let Some(table) = listing_tables(&document).into_iter().next() else {
        tracing::info!("no career history table found");
        return Vec::new();
    };

    let mut entries = Vec::new();
    for row in own_rows(table) {
        let row_cells = cells(row);
        let texts: Vec<String> = row_cells.iter().map(|c| raw_text(c)).collect();
        let Some(entry) = parse_history_row(&texts, club_link(&row_cells, base_url), classifier) else {
            continue;
        };
        if entry.role == Some(Role::Manager) {
            entries.push(entry);
        } else {
            tracing::debug!(club = %entry.club, "history row is not a manager stint");
        }
    }

    tracing::info!(count = entries.len(), "parsed career history");
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.transfermarkt.com";

    fn texts(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn manager_stint_is_fully_parsed() {
        let row = texts(&[
            "",
            "Real Madrid — Manager",
            "16/17 (01/07/2016)",
            "-",
            "01/07/2016() / -",
            "1200",
            "80",
            "50",
            "20",
            "10",
            "30",
            "2.10 : 0.90",
            "2.1",
        ]);
        let entry = parse_history_row(&row, None, &RoleClassifier::default()).unwrap();
        assert_eq!(entry.club, "Real Madrid");
        assert_eq!(entry.role, Some(Role::Manager));
        assert_eq!(entry.appointed_season.as_deref(), Some("16/17"));
        assert_eq!(entry.appointed_date.as_deref(), Some("01/07/2016"));
        assert_eq!(entry.until_date.as_deref(), Some("Current"));
        assert_eq!(entry.until_season, None);
        assert_eq!(entry.days_in_charge, Some(1200));
        assert_eq!(entry.matches, Some(80));
        assert_eq!(entry.wins, Some(50));
        assert_eq!(entry.draws, Some(20));
        assert_eq!(entry.losses, Some(10));
        assert_eq!(entry.players_used, Some(30));
        assert_eq!(entry.avg_goals_for, Some(2.10));
        assert_eq!(entry.avg_goals_against, Some(0.90));
        assert_eq!(entry.points_per_match, Some(2.1));
    }

    #[test]
    fn assistant_stint_has_no_role() {
        let row = texts(&["", "Real Madrid — Assistant Manager", "13/14 (01/07/2013)", "14/15 (30/06/2014)", ""]);
        let entry = parse_history_row(&row, None, &RoleClassifier::default()).unwrap();
        assert_eq!(entry.role, None);
        assert_eq!(entry.until_season.as_deref(), Some("14/15"));
        assert_eq!(entry.until_date.as_deref(), Some("30/06/2014"));
    }

    #[test]
    fn malformed_cells_degrade_single_fields() {
        let row = texts(&["", "Chelsea — Manager", "n/a", "until further notice", "x", "?", "-", "-", "-", "-"]);
        let entry = parse_history_row(&row, None, &RoleClassifier::default()).unwrap();
        assert_eq!(entry.role, Some(Role::Manager));
        assert_eq!(entry.appointed_date, None);
        assert_eq!(entry.until_date.as_deref(), Some("until further notice"));
        assert_eq!(entry.days_in_charge, None);
        assert_eq!(entry.matches, None);
        assert_eq!(entry.avg_goals_for, None);
    }

    #[test]
    fn role_glued_to_club_name_is_stripped() {
        let row = texts(&["", "Real MadridManager", "16/17 (01/07/2016)", "-", "-"]);
        let entry = parse_history_row(&row, None, &RoleClassifier::default()).unwrap();
        assert_eq!(entry.role, Some(Role::Manager));
        assert_eq!(entry.club, "Real Madrid");

        let linked = ClubLink {
            name: "Manchester United".to_string(),
            url: "https://www.transfermarkt.com/manchester-united/startseite/verein/985".to_string(),
        };
        let row = texts(&["", "Manchester United Manager", "13/14 (01/07/2013)", "-", "-"]);
        let entry = parse_history_row(&row, Some(linked), &RoleClassifier::default()).unwrap();
        assert_eq!(entry.club, "Manchester United");
    }

    #[test]
    fn short_rows_are_ignored() {
        let row = texts(&["", "Real Madrid — Manager", "16/17 (01/07/2016)"]);
        assert!(parse_history_row(&row, None, &RoleClassifier::default()).is_none());
    }

    #[test]
    fn only_manager_rows_are_retained() {
        let html = r#"<html><body><table class="items">
            <thead><tr><th>Club</th><th>Appointed</th></tr></thead>
            <tbody>
            <tr><td><img alt="Real Madrid"></td>
                <td><a href="/real-madrid/startseite/verein/418">Real Madrid</a> Manager</td>
                <td>21/22 (01/07/2021)</td><td>-</td><td>21/22 (01/07/2021) / -</td><td>1000</td>
                <td>150</td><td>104</td><td>25</td><td>21</td><td>40</td><td>2.32 : 0.92</td><td>2.25</td></tr>
            <tr><td><img alt="Real Madrid"></td>
                <td><a href="/real-madrid/startseite/verein/418">Real Madrid</a> Assistant Manager</td>
                <td>13/14 (01/07/2013)</td><td>14/15 (30/06/2014)</td><td>-</td><td>364</td>
                <td>-</td><td>-</td><td>-</td><td>-</td><td>-</td><td>-</td><td>-</td></tr>
            </tbody></table></body></html>"#;
        let entries = parse_history(html, BASE, &RoleClassifier::default());
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.club, "Real Madrid");
        assert_eq!(entry.club_url, "https://www.transfermarkt.com/real-madrid/startseite/verein/418");
        assert_eq!(entry.period_from.as_deref(), Some("21/22"));
        assert_eq!(entry.period_until.as_deref(), Some("Current"));
        assert_eq!(entry.wins, Some(104));
    }
}
