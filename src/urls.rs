//! URL shapes used by the site: ids, slugs and canonical club links.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref CLUB_ID: Regex = Regex::new(r"/verein/(\d+)").unwrap();
    static ref CLUB_SLUG: Regex = Regex::new(r"/([^/.]+)/startseite/verein/").unwrap();
    static ref TRAINER_ID: Regex = Regex::new(r"/trainer/(\d+)").unwrap();
    static ref TRAILING_ID: Regex = Regex::new(r"/(\d+)/?$").unwrap();
    static ref PLAYER_ID: Regex = Regex::new(r"/profil/spieler/(\d+)").unwrap();
    static ref LEAGUE_ID: Regex = Regex::new(r"/wettbewerb/([A-Z0-9]+)").unwrap();
    static ref LEAGUE_SLUG: Regex = Regex::new(r"/([^/.]+)/startseite/wettbewerb/").unwrap();
    static ref NON_SLUG: Regex = Regex::new(r"[^\w\s-]").unwrap();
    static ref SLUG_SEPARATORS: Regex = Regex::new(r"[-\s]+").unwrap();
    static ref LEAGUE_CODE: Regex = Regex::new(r"^[A-Z0-9]+$").unwrap();
}

const SEASON_SEGMENT: &str = "/saison_id/";

pub fn club_id(url: &str) -> Option<String> {
    CLUB_ID.captures(url).map(|c| c[1].to_string())
}

/// Slug before `/startseite/verein/`, e.g. `real-madrid`.
pub fn club_slug(url: &str) -> Option<String> {
    CLUB_SLUG.captures(url).map(|c| c[1].to_string())
}

/// Trainer id from `/trainer/{id}`, falling back to a trailing numeric segment.
pub fn manager_id(url: &str) -> Option<String> {
    TRAINER_ID
        .captures(url)
        .or_else(|| TRAILING_ID.captures(url))
        .map(|c| c[1].to_string())
}

pub fn player_id(url: &str) -> Option<String> {
    PLAYER_ID.captures(url).map(|c| c[1].to_string())
}

/// Competition code such as `GB1`.
pub fn league_id(url: &str) -> Option<String> {
    LEAGUE_ID.captures(url).map(|c| c[1].to_string())
}

pub fn is_league_code(id: &str) -> bool {
    LEAGUE_CODE.is_match(id)
}

pub fn is_numeric_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_digit())
}

/// Display name from a league URL slug: `premier-league` becomes `Premier League`.
pub fn league_name_from_url(url: &str) -> Option<String> {
    let slug = LEAGUE_SLUG.captures(url)?.get(1)?.as_str().to_string();
    let words: Vec<String> = slug
        .split('-')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
                None => String::new(),
            }
        })
        .collect();
    (!words.is_empty()).then(|| words.join(" "))
}

/// Lower-case, hyphenated form of a name, as the site builds its slugs.
pub fn slugify(name: &str) -> String {
    let lower = name.to_lowercase();
    let stripped = NON_SLUG.replace_all(&lower, "");
    SLUG_SEPARATORS
        .replace_all(&stripped, "-")
        .trim_matches('-')
        .to_string()
}

/// Normalise a club link to `{base}/{slug}/startseite/verein/{id}`.
///
/// Any season selector (`/saison_id/…` or `?saison_id=…`) is dropped. Links
/// to other club pages (`/kader/verein/…`) are rewritten to the start page.
pub fn canonical_club_url(base_url: &str, url: &str) -> String {
    let mut url = url.to_string();
    if let Some(idx) = url.find(SEASON_SEGMENT) {
        url.truncate(idx);
    }
    if let Some(idx) = url.find('?') {
        url.truncate(idx);
    }
    let url = url.trim_end_matches('/').to_string();

    if url.contains("/startseite/verein/") {
        return url;
    }

    let Some(id) = club_id(&url) else {
        return url;
    };
    let base = base_url.trim_end_matches('/');
    match slug_before_verein(&url) {
        Some(slug) => format!("{base}/{slug}/startseite/verein/{id}"),
        None => format!("{base}/startseite/verein/{id}"),
    }
}

/// In `/{slug}/{page}/verein/{id}` the slug sits two segments before `verein`.
fn slug_before_verein(url: &str) -> Option<String> {
    let path = url.split("://").nth(1).map_or(url, |rest| {
        rest.find('/').map_or("", |i| &rest[i..])
    });
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let pos = segments.iter().position(|s| *s == "verein")?;
    (pos >= 2).then(|| segments[pos - 2].to_string())
}

pub fn staff_urls(base_url: &str, club_url: &str) -> Vec<String> {
    club_page_urls(base_url, club_url, "mitarbeiter")
}

pub fn squad_urls(base_url: &str, club_url: &str) -> Vec<String> {
    club_page_urls(base_url, club_url, "kader")
}

/// Slug-qualified variant first, then the slug-less one.
fn club_page_urls(base_url: &str, club_url: &str, page: &str) -> Vec<String> {
    let base = base_url.trim_end_matches('/');
    let Some(id) = club_id(club_url) else {
        return Vec::new();
    };
    let mut urls = Vec::with_capacity(2);
    if let Some(slug) = club_slug(club_url) {
        urls.push(format!("{base}/{slug}/{page}/verein/{id}"));
    }
    urls.push(format!("{base}/{page}/verein/{id}"));
    urls
}

pub fn history_url(base_url: &str, manager_name: &str, manager_id: &str) -> String {
    format!(
        "{}/{}/stationen/trainer/{}/plus/1",
        base_url.trim_end_matches('/'),
        slugify(manager_name),
        manager_id
    )
}

pub fn manager_profile_urls(base_url: &str, manager_id: &str) -> Vec<String> {
    let base = base_url.trim_end_matches('/');
    vec![
        format!("{base}/trainer/{manager_id}"),
        format!("{base}/profil/trainer/{manager_id}"),
        format!("{base}/trainer/profil/trainer/{manager_id}"),
    ]
}

pub fn continent_url(base_url: &str, continent: &str) -> String {
    format!("{}/wettbewerbe/{}", base_url.trim_end_matches('/'), continent)
}

pub fn league_url_by_id(base_url: &str, league_id: &str) -> String {
    format!("{}/startseite/wettbewerb/{}", base_url.trim_end_matches('/'), league_id)
}

pub fn club_url_by_id(base_url: &str, club_id: &str) -> String {
    format!("{}/startseite/verein/{}", base_url.trim_end_matches('/'), club_id)
}

pub fn player_url_by_id(base_url: &str, player_id: &str) -> String {
    format!("{}/profil/spieler/{}", base_url.trim_end_matches('/'), player_id)
}
