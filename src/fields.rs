//! Pure parsers from free cell/label text to typed values.
//!
//! Each function looks at one piece of text and returns `None` when the value
//! is not there. Callers decide where to look and what to fall back to.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SEASON_AND_DATE: Regex =
        Regex::new(r"(\d{2}/\d{2})\s*\((\d{2}/\d{2}/\d{4})\)").unwrap();
    static ref PERIOD: Regex =
        Regex::new(r"(\d{2}/\d{2})\s*\([^)]+\)\s*/\s*(-|(\d{2}/\d{2})\([^)]+\))").unwrap();
    static ref NUMBER: Regex = Regex::new(r"([\d.]+)").unwrap();
    static ref GOAL_RATIO: Regex = Regex::new(r"([\d.]+)\s*:\s*([\d.]+)").unwrap();
    static ref DATE: Regex = Regex::new(r"(\d{1,2}[/.-]\d{1,2}[/.-]\d{4})").unwrap();
    static ref LABELED_DOB: [Regex; 3] = [
        Regex::new(r"(?i)date\s+of\s+birth[^\d]{0,20}(\d{1,2}[/.-]\d{1,2}[/.-]\d{4})").unwrap(),
        Regex::new(r"(?i)geburtstag[^\d]{0,20}(\d{1,2}[/.-]\d{1,2}[/.-]\d{4})").unwrap(),
        Regex::new(r"(?i)geboren[^\d]{0,20}(\d{1,2}[/.-]\d{1,2}[/.-]\d{4})").unwrap(),
    ];
    static ref LABELED_FORMATION: [Regex; 3] = [
        Regex::new(r"(?i)preferred\s+formation[:\s]+(\d(?:-\d)+)").unwrap(),
        Regex::new(r"(?i)lieblingsformation[:\s]+(\d(?:-\d)+)").unwrap(),
        Regex::new(r"(?i)formation[:\s]+(\d(?:-\d)+)").unwrap(),
    ];
    static ref FORMATION: Regex = Regex::new(r"\b(\d-\d(?:-\d){0,3})\b").unwrap();
    static ref JERSEY_PREFIX: Regex = Regex::new(r"^#?(\d+)\s+(.+)$").unwrap();
    static ref HEIGHT: Regex = Regex::new(r"(\d[.,]\d{2})\s*m\b").unwrap();
    static ref CAPS_GOALS: Regex = Regex::new(r"(\d+)\s*/\s*(\d+)").unwrap();
    static ref MARKET_VALUE: Regex =
        Regex::new(r"€\s*([\d.,]+)\s*(?i:(bn|m|k|th\.))").unwrap();
    static ref FOOT: Regex = Regex::new(r"(?i)\b(right|left|both)\b").unwrap();
}

/// "16/17 (01/07/2016)" gives `("16/17", "01/07/2016")`.
pub fn season_and_date(text: &str) -> Option<(String, String)> {
    SEASON_AND_DATE
        .captures(text)
        .map(|c| (c[1].to_string(), c[2].to_string()))
}

/// End of a tenure. An empty cell or "-" means the stint is ongoing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Until {
    Current,
    Dated { season: String, date: String },
    Text(String),
}

pub fn until(text: &str) -> Until {
    let text = text.trim();
    if text.is_empty() || text == "-" {
        return Until::Current;
    }
    match season_and_date(text) {
        Some((season, date)) => Until::Dated { season, date },
        None => Until::Text(text.to_string()),
    }
}

/// "19/20 (01/07/2019) / 21/22 (30/06/2021)" style spans; `None` for the end
/// means the period is open ("-").
pub fn period(text: &str) -> Option<(String, Option<String>)> {
    let caps = PERIOD.captures(text)?;
    let from = caps[1].to_string();
    if &caps[2] == "-" {
        Some((from, None))
    } else {
        Some((from, caps.get(3).map(|m| m.as_str().to_string())))
    }
}

/// First run of digits, `None` for "-" or empty cells.
pub fn integer(text: &str) -> Option<u32> {
    let text = text.trim();
    if text.is_empty() || text == "-" {
        return None;
    }
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// First decimal number, `None` for "-" or empty cells.
pub fn decimal(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() || text == "-" {
        return None;
    }
    NUMBER
        .captures(text)
        .and_then(|c| c[1].parse().ok())
}

/// Average goals "2.49 : 0.94" as `(for, against)`.
pub fn goal_ratio(text: &str) -> Option<(f64, f64)> {
    let caps = GOAL_RATIO.captures(text)?;
    Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
}

/// A date of birth after one of its labels, in English or German.
pub fn labeled_date_of_birth(text: &str) -> Option<String> {
    LABELED_DOB
        .iter()
        .find_map(|re| re.captures(text))
        .map(|c| c[1].to_string())
}

/// Any `dd/mm/yyyy`-like date.
pub fn any_date(text: &str) -> Option<String> {
    DATE.captures(text).map(|c| c[1].to_string())
}

/// Date of birth: labelled first, then any date in the text.
pub fn date_of_birth(text: &str) -> Option<String> {
    labeled_date_of_birth(text).or_else(|| any_date(text))
}

pub fn labeled_formation(text: &str) -> Option<String> {
    LABELED_FORMATION
        .iter()
        .find_map(|re| re.captures(text))
        .map(|c| c[1].to_string())
}

/// Preferred formation such as "4-3-3": labelled first, then any formation shape.
pub fn formation(text: &str) -> Option<String> {
    labeled_formation(text).or_else(|| FORMATION.captures(text).map(|c| c[1].to_string()))
}

/// Split "#1 Thibaut Courtois" or "1 Thibaut Courtois" into number and name.
pub fn jersey_and_name(text: &str) -> (Option<String>, String) {
    let text = text.trim();
    match JERSEY_PREFIX.captures(text) {
        Some(c) => (Some(c[1].to_string()), c[2].trim().to_string()),
        None => (None, text.to_string()),
    }
}

/// Height "1,99 m" normalised to "1.99 m".
pub fn height(text: &str) -> Option<String> {
    HEIGHT
        .captures(text)
        .map(|c| format!("{} m", c[1].replace(',', ".")))
}

/// Caps and goals "107 / 0"; only caps when a single number is present.
pub fn caps_goals(text: &str) -> Option<(String, Option<String>)> {
    if let Some(c) = CAPS_GOALS.captures(text) {
        return Some((c[1].to_string(), Some(c[2].to_string())));
    }
    integer(text).map(|caps| (caps.to_string(), None))
}

/// Market value such as "€18.00m" or "€500k", normalised to a compact form.
pub fn market_value(text: &str) -> Option<String> {
    let caps = MARKET_VALUE.captures(text)?;
    let unit = caps[2].to_lowercase();
    let unit = if unit == "th." { "k" } else { unit.as_str() };
    Some(format!("€{}{}", &caps[1], unit))
}

/// Preferred foot: "right", "left" or "both".
pub fn foot(text: &str) -> Option<String> {
    FOOT.captures(text).map(|c| c[1].to_lowercase())
}

/// Text after `label:` up to the end of its line.
pub fn after_label(text: &str, label: &str) -> Option<String> {
    let pattern = Regex::new(&format!("(?i){}", regex::escape(label))).ok()?;
    let rest = &text[pattern.find(text)?.end()..];
    let value = rest
        .trim_start_matches(|c: char| c == ':' || c.is_whitespace())
        .lines()
        .next()?
        .trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appointed_cell() {
        assert_eq!(
            season_and_date("16/17 (01/07/2016)"),
            Some(("16/17".to_string(), "01/07/2016".to_string()))
        );
        assert_eq!(season_and_date("-"), None);
    }

    #[test]
    fn until_cell_variants() {
        assert_eq!(until("-"), Until::Current);
        assert_eq!(until("  "), Until::Current);
        assert_eq!(
            until("20/21 (30/06/2021)"),
            Until::Dated {
                season: "20/21".into(),
                date: "30/06/2021".into()
            }
        );
        assert_eq!(until("expected 2026"), Until::Text("expected 2026".into()));
    }

    #[test]
    fn period_cell_variants() {
        assert_eq!(
            period("19/20 (01/07/2019) / 21/22(30/06/2021)"),
            Some(("19/20".to_string(), Some("21/22".to_string())))
        );
        assert_eq!(
            period("19/20 (01/07/2019) / -"),
            Some(("19/20".to_string(), None))
        );
        assert_eq!(period("01/07/2016() / -"), None);
    }

    #[test]
    fn numbers() {
        assert_eq!(integer("1200"), Some(1200));
        assert_eq!(integer(" 80 matches"), Some(80));
        assert_eq!(integer("-"), None);
        assert_eq!(integer(""), None);
        assert_eq!(decimal("2.1"), Some(2.1));
        assert_eq!(decimal("-"), None);
        assert_eq!(goal_ratio("2.10 : 0.90"), Some((2.10, 0.90)));
        assert_eq!(goal_ratio("n/a"), None);
    }

    #[test]
    fn dates_of_birth() {
        assert_eq!(
            labeled_date_of_birth("Date of birth/Age: 10/06/1959 (65)").as_deref(),
            Some("10/06/1959")
        );
        assert_eq!(
            date_of_birth("Geb./Alter: 10.06.1959").as_deref(),
            Some("10.06.1959")
        );
        assert_eq!(date_of_birth("no date here"), None);
    }

    #[test]
    fn formations() {
        assert_eq!(formation("Preferred formation: 4-3-3 attacking").as_deref(), Some("4-3-3"));
        assert_eq!(formation("Lieblingsformation: 4-4-2").as_deref(), Some("4-4-2"));
        assert_eq!(formation("plays 3-5-2 mostly").as_deref(), Some("3-5-2"));
        assert_eq!(formation("10/06/1959"), None);
    }

    #[test]
    fn jersey_prefix() {
        assert_eq!(
            jersey_and_name("#1 Thibaut Courtois"),
            (Some("1".to_string()), "Thibaut Courtois".to_string())
        );
        assert_eq!(
            jersey_and_name("13 Andriy Lunin"),
            (Some("13".to_string()), "Andriy Lunin".to_string())
        );
        assert_eq!(jersey_and_name("Vinicius Junior"), (None, "Vinicius Junior".to_string()));
    }

    #[test]
    fn profile_values() {
        assert_eq!(height("Height: 1,99 m").as_deref(), Some("1.99 m"));
        assert_eq!(
            caps_goals("Caps/Goals: 107 / 0"),
            Some(("107".to_string(), Some("0".to_string())))
        );
        assert_eq!(caps_goals("Caps: 12"), Some(("12".to_string(), None)));
        assert_eq!(market_value("Market value: €18.00m").as_deref(), Some("€18.00m"));
        assert_eq!(market_value("€500k Last update").as_deref(), Some("€500k"));
        assert_eq!(market_value("€ 1.20bn").as_deref(), Some("€1.20bn"));
        assert_eq!(market_value("no value"), None);
        assert_eq!(market_value("€18.00M").as_deref(), Some("€18.00m"));
        assert_eq!(market_value("€750Th.").as_deref(), Some("€750k"));
        assert_eq!(foot("Foot: Left").as_deref(), Some("left"));
        assert_eq!(after_label("Citizenship: Spain\nother", "Citizenship").as_deref(), Some("Spain"));
        assert_eq!(after_label("İİİİ Height: 1,80 m\nnext", "height").as_deref(), Some("1,80 m"));
    }
}
