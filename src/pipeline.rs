//! Traversals from an entry point down to flat result rows.
//!
//! Every traversal resolves a list of clubs first and then visits them one
//! by one. The cancellation token is checked before each club; work inside a
//! club always runs to the end. A club that fails is recorded as skipped and
//! the walk moves on.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::clubs::parse_clubs;
use crate::config::Config;
use crate::history::parse_history;
use crate::leagues::parse_leagues;
use crate::manager::{parse_manager_name, parse_manager_profile};
use crate::model::{
    CareerHistoryEntry, Club, CoachRow, Continent, League, Manager, ManagerProfile, Player, PlayerProfile, PlayerRow,
    Role, SkippedItem,
};
use crate::player::parse_player_profile;
use crate::role::RoleClassifier;
use crate::scraper::{page_heading, Fetch, FetchError, HttpFetcher, LeagueCache};
use crate::squad::parse_squad;
use crate::staff::parse_staff;
use crate::urls;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("no club id in URL: {0}")]
    InvalidUrl(String),
    #[error("page unavailable: {0}")]
    PageUnavailable(String),
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },
    #[error("invalid {kind} id '{id}'")]
    InvalidId { kind: &'static str, id: String },
    #[error("a {0} scope cannot be used for this job")]
    UnsupportedScope(&'static str),
}

/// A league given by URL, with an optional display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueRef {
    pub url: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Where a traversal starts.
#[derive(Debug, Clone, PartialEq)]
pub enum Scope {
    Continent(Continent),
    League(LeagueRef),
    Leagues(Vec<LeagueRef>),
    LeagueId(String),
    Club(Club),
    Clubs(Vec<Club>),
    ClubId(String),
    /// Coach traversals only.
    Manager(String),
    /// Player traversals only.
    Player(String),
}

impl Scope {
    fn kind(&self) -> &'static str {
        match self {
            Scope::Continent(_) => "continent",
            Scope::League(_) => "league",
            Scope::Leagues(_) => "leagues",
            Scope::LeagueId(_) => "league id",
            Scope::Club(_) => "club",
            Scope::Clubs(_) => "clubs",
            Scope::ClubId(_) => "club id",
            Scope::Manager(_) => "manager",
            Scope::Player(_) => "player",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
    pub current_club: String,
    pub status: String,
}

impl Progress {
    pub fn new(current: usize, total: usize, current_club: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            current,
            total,
            current_club: current_club.into(),
            status: status.into(),
        }
    }
}

/// Receives a progress update after every unit of work.
pub trait Reporter: Send + Sync {
    fn report(&self, progress: Progress);
}

impl<T> Reporter for T
where
    T: Fn(Progress) + Send + Sync,
{
    fn report(&self, progress: Progress) {
        self(progress)
    }
}

/// Rows and skipped units collected by one traversal.
#[derive(Debug, Clone, PartialEq)]
pub struct Harvest<R> {
    pub rows: Vec<R>,
    pub skipped: Vec<SkippedItem>,
    /// The token was cancelled before every club was visited.
    pub stopped: bool,
    /// Why there was nothing to visit: [`NO_LEAGUES_FOUND`] or [`NO_CLUBS_FOUND`].
    pub nothing_found: Option<String>,
}

pub const NO_LEAGUES_FOUND: &str = "No leagues found";
pub const NO_CLUBS_FOUND: &str = "No clubs found";

impl<R> Default for Harvest<R> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            skipped: Vec::new(),
            stopped: false,
            nothing_found: None,
        }
    }
}

/// Per-club work of a traversal.
#[async_trait]
trait ClubHarvest: Send + Sync {
    type Row: Send;

    async fn harvest<F: Fetch>(&self, scout: &Scout<F>, club: &Club) -> Result<Vec<Self::Row>, ScrapeError>;
}

struct Coaches;
struct Players;

#[async_trait]
impl ClubHarvest for Coaches {
    type Row = CoachRow;

    async fn harvest<F: Fetch>(&self, scout: &Scout<F>, club: &Club) -> Result<Vec<CoachRow>, ScrapeError> {
        let managers = scout.current_managers(&club.url).await?;
        if managers.is_empty() {
            tracing::info!(club = %club.name, "no manager found");
            return Ok(Vec::new());
        }

        let mut rows = Vec::new();
        for manager in &managers {
            tracing::info!(club = %club.name, manager = %manager.name, role = %manager.role, "manager");
            rows.extend(scout.manager_rows(club, manager).await);
        }
        Ok(rows)
    }
}

#[async_trait]
impl ClubHarvest for Players {
    type Row = PlayerRow;

    async fn harvest<F: Fetch>(&self, scout: &Scout<F>, club: &Club) -> Result<Vec<PlayerRow>, ScrapeError> {
        let players = scout.squad(&club.url).await?;
        if players.is_empty() {
            tracing::info!(club = %club.name, "no players found");
        }

        let mut rows = Vec::with_capacity(players.len());
        for player in &players {
            let profile = scout.player_profile(&player.profile_url).await;
            rows.push(PlayerRow::new(club, player, profile));
        }
        Ok(rows)
    }
}

/// Fetches pages and runs the extractors over them.
pub struct Scout<F> {
    fetcher: F,
    base_url: String,
    classifier: RoleClassifier,
    league_cache: LeagueCache,
}

impl Scout<HttpFetcher> {
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        Ok(Self::new(
            HttpFetcher::new(&config.scraper)?,
            config.scraper.base_url.clone(),
            RoleClassifier::from_config(&config.classifier),
        ))
    }
}

impl<F: Fetch> Scout<F> {
    pub fn new(fetcher: F, base_url: impl Into<String>, classifier: RoleClassifier) -> Self {
        Self {
            fetcher,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            classifier,
            league_cache: LeagueCache::default(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Leagues listed on a continent page; empty when the page is unavailable.
    pub async fn leagues(&self, continent: Continent) -> Vec<League> {
        let url = urls::continent_url(&self.base_url, continent.slug());
        match self.fetcher.fetch(&url).await {
            Some(html) => parse_leagues(&html, &self.base_url),
            None => Vec::new(),
        }
    }

    /// Like [`Scout::leagues`], served from the per-process cache when possible.
    pub async fn cached_leagues(&self, continent: Continent) -> Vec<League> {
        if let Some(leagues) = self.league_cache.get(continent) {
            tracing::debug!(%continent, "league list from cache");
            return leagues;
        }
        let leagues = self.leagues(continent).await;
        if !leagues.is_empty() {
            self.league_cache.insert(continent, leagues.clone());
        }
        leagues
    }

    pub async fn clubs(&self, league_url: &str) -> Vec<Club> {
        match self.fetcher.fetch(league_url).await {
            Some(html) => parse_clubs(&html, &self.base_url),
            None => Vec::new(),
        }
    }

    /// Managers on the club's staff page, trying each staff URL variant in turn.
    pub async fn current_managers(&self, club_url: &str) -> Result<Vec<Manager>, ScrapeError> {
        let variants = urls::staff_urls(&self.base_url, club_url);
        if variants.is_empty() {
            return Err(ScrapeError::InvalidUrl(club_url.to_string()));
        }

        let mut fetched = false;
        for url in &variants {
            let Some(html) = self.fetcher.fetch(url).await else {
                continue;
            };
            fetched = true;
            let managers = parse_staff(&html, &self.base_url, &self.classifier);
            if !managers.is_empty() {
                return Ok(managers);
            }
        }
        if fetched {
            Ok(Vec::new())
        } else {
            Err(ScrapeError::PageUnavailable(variants[0].clone()))
        }
    }

    pub async fn manager_profile(&self, profile_url: &str) -> ManagerProfile {
        if profile_url.is_empty() {
            return ManagerProfile::default();
        }
        self.fetcher
            .fetch(profile_url)
            .await
            .map(|html| parse_manager_profile(&html))
            .unwrap_or_default()
    }

    /// Manager stints from the career-history page.
    pub async fn career_history(&self, name: &str, id: &str) -> Vec<CareerHistoryEntry> {
        let url = urls::history_url(&self.base_url, name, id);
        match self.fetcher.fetch(&url).await {
            Some(html) => parse_history(&html, &self.base_url, &self.classifier),
            None => Vec::new(),
        }
    }

    /// Name and profile URL of a manager, trying each profile URL variant.
    pub async fn find_manager(&self, id: &str) -> Result<Manager, ScrapeError> {
        if !urls::is_numeric_id(id) {
            return Err(ScrapeError::InvalidId {
                kind: "manager",
                id: id.to_string(),
            });
        }
        for url in urls::manager_profile_urls(&self.base_url, id) {
            let Some(html) = self.fetcher.fetch(&url).await else {
                continue;
            };
            if let Some(name) = parse_manager_name(&html) {
                return Ok(Manager {
                    name,
                    profile_url: url,
                    id: id.to_string(),
                    role: Role::Manager,
                });
            }
        }
        Err(ScrapeError::NotFound {
            kind: "manager",
            id: id.to_string(),
        })
    }

    /// One coach row per retained history stint.
    async fn manager_rows(&self, club: &Club, manager: &Manager) -> Vec<CoachRow> {
        let profile = self.manager_profile(&manager.profile_url).await;
        self.career_history(&manager.name, &manager.id)
            .await
            .into_iter()
            .filter(|entry| entry.role == Some(Role::Manager))
            .map(|entry| CoachRow::new(club, manager, &profile, entry))
            .collect()
    }

    /// Players on the club's squad page; the first variant with players wins.
    pub async fn squad(&self, club_url: &str) -> Result<Vec<Player>, ScrapeError> {
        let variants = urls::squad_urls(&self.base_url, club_url);
        if variants.is_empty() {
            return Err(ScrapeError::InvalidUrl(club_url.to_string()));
        }

        let mut fetched = false;
        for url in &variants {
            let Some(html) = self.fetcher.fetch(url).await else {
                continue;
            };
            fetched = true;
            let players = parse_squad(&html, &self.base_url);
            if !players.is_empty() {
                return Ok(players);
            }
        }
        if fetched {
            Ok(Vec::new())
        } else {
            Err(ScrapeError::PageUnavailable(variants[0].clone()))
        }
    }

    pub async fn player_profile(&self, profile_url: &str) -> PlayerProfile {
        if profile_url.is_empty() {
            return PlayerProfile::default();
        }
        self.fetcher
            .fetch(profile_url)
            .await
            .map(|html| parse_player_profile(&html))
            .unwrap_or_default()
    }

    async fn league_clubs(&self, league: &LeagueRef, country: &str) -> Vec<Club> {
        let name = league
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .or_else(|| urls::league_name_from_url(&league.url))
            .unwrap_or_else(|| "Unknown League".to_string());
        tracing::info!(league = %name, "fetching clubs");
        with_league(self.clubs(&league.url).await, &name, country)
    }

    /// The flat list of clubs a scope covers.
    pub async fn resolve_clubs(&self, scope: &Scope, reporter: &dyn Reporter) -> Result<Vec<Club>, ScrapeError> {
        Ok(self.resolve(scope, reporter).await?.0)
    }

    /// Clubs of `scope` and the status to end with when there are none.
    async fn resolve(&self, scope: &Scope, reporter: &dyn Reporter) -> Result<(Vec<Club>, &'static str), ScrapeError> {
        let clubs = match scope {
            Scope::Continent(continent) => {
                reporter.report(Progress::new(0, 0, "", "Fetching leagues list..."));
                let leagues = self.leagues(*continent).await;
                tracing::info!(count = leagues.len(), %continent, "leagues found");
                if leagues.is_empty() {
                    return Ok((Vec::new(), NO_LEAGUES_FOUND));
                }
                let mut clubs = Vec::new();
                for league in leagues {
                    let league_ref = LeagueRef {
                        url: league.url,
                        name: Some(league.name),
                    };
                    clubs.extend(self.league_clubs(&league_ref, &league.country).await);
                }
                clubs
            }
            Scope::League(league) => {
                reporter.report(Progress::new(0, 0, "", "Fetching clubs from league..."));
                self.league_clubs(league, "").await
            }
            Scope::Leagues(leagues) => {
                reporter.report(Progress::new(0, 0, "", "Fetching clubs from leagues..."));
                let mut clubs = Vec::new();
                for league in leagues {
                    clubs.extend(self.league_clubs(league, "").await);
                }
                clubs
            }
            Scope::LeagueId(id) => {
                if !urls::is_league_code(id) {
                    return Err(ScrapeError::InvalidId {
                        kind: "league",
                        id: id.clone(),
                    });
                }
                reporter.report(Progress::new(0, 0, "", format!("Fetching league {id}...")));
                let url = urls::league_url_by_id(&self.base_url, id);
                let html = self
                    .fetcher
                    .fetch(&url)
                    .await
                    .ok_or_else(|| ScrapeError::PageUnavailable(url.clone()))?;
                let name = page_heading(&html).unwrap_or_else(|| format!("League {id}"));
                with_league(parse_clubs(&html, &self.base_url), &name, "")
            }
            Scope::Club(club) => vec![Club {
                url: urls::canonical_club_url(&self.base_url, &club.url),
                ..club.clone()
            }],
            Scope::Clubs(clubs) => clubs
                .iter()
                .map(|club| Club {
                    url: urls::canonical_club_url(&self.base_url, &club.url),
                    ..club.clone()
                })
                .collect(),
            Scope::ClubId(id) => {
                if !urls::is_numeric_id(id) {
                    return Err(ScrapeError::InvalidId {
                        kind: "club",
                        id: id.clone(),
                    });
                }
                let url = urls::club_url_by_id(&self.base_url, id);
                let name = match self.fetcher.fetch(&url).await {
                    Some(html) => page_heading(&html),
                    None => None,
                }
                .unwrap_or_else(|| format!("Club {id}"));
                vec![Club::standalone(name, url)]
            }
            Scope::Manager(_) | Scope::Player(_) => return Err(ScrapeError::UnsupportedScope(scope.kind())),
        };
        Ok((clubs, NO_CLUBS_FOUND))
    }

    async fn walk_clubs<H: ClubHarvest>(
        &self,
        harvester: &H,
        (clubs, nothing_found): (Vec<Club>, &'static str),
        cancel: &CancellationToken,
        reporter: &dyn Reporter,
    ) -> Harvest<H::Row> {
        let mut harvest = Harvest::default();
        let total = clubs.len();
        if total == 0 {
            reporter.report(Progress::new(0, 0, "", nothing_found));
            harvest.nothing_found = Some(nothing_found.to_string());
            return harvest;
        }

        for (idx, club) in clubs.iter().enumerate() {
            if cancel.is_cancelled() {
                reporter.report(Progress::new(idx, total, club.name.as_str(), "stopped"));
                harvest.stopped = true;
                break;
            }
            reporter.report(Progress::new(
                idx + 1,
                total,
                club.name.as_str(),
                format!("Processing {}...", club.name),
            ));
            tracing::info!(current = idx + 1, total, club = %club.name, "processing club");

            match harvester.harvest(self, club).await {
                Ok(rows) => harvest.rows.extend(rows),
                Err(e) => {
                    tracing::warn!(club = %club.name, error = %e, "skipping club");
                    harvest.skipped.push(SkippedItem {
                        name: club.name.clone(),
                        url: club.url.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
        harvest
    }

    /// Coach rows for every manager reachable from `scope`.
    pub async fn run_coaches(
        &self,
        scope: &Scope,
        cancel: &CancellationToken,
        reporter: &dyn Reporter,
    ) -> Result<Harvest<CoachRow>, ScrapeError> {
        if let Scope::Manager(id) = scope {
            return self.manager_by_id(id, cancel, reporter).await;
        }
        let resolved = self.resolve(scope, reporter).await?;
        Ok(self.walk_clubs(&Coaches, resolved, cancel, reporter).await)
    }

    /// Player rows for every squad reachable from `scope`.
    pub async fn run_players(
        &self,
        scope: &Scope,
        cancel: &CancellationToken,
        reporter: &dyn Reporter,
    ) -> Result<Harvest<PlayerRow>, ScrapeError> {
        if let Scope::Player(id) = scope {
            return self.player_by_id(id, cancel, reporter).await;
        }
        let resolved = self.resolve(scope, reporter).await?;
        Ok(self.walk_clubs(&Players, resolved, cancel, reporter).await)
    }

    async fn manager_by_id(
        &self,
        id: &str,
        cancel: &CancellationToken,
        reporter: &dyn Reporter,
    ) -> Result<Harvest<CoachRow>, ScrapeError> {
        if cancel.is_cancelled() {
            reporter.report(Progress::new(0, 1, "", "stopped"));
            return Ok(Harvest {
                stopped: true,
                ..Harvest::default()
            });
        }
        reporter.report(Progress::new(0, 1, "", format!("Looking up manager {id}...")));
        let manager = self.find_manager(id).await?;
        reporter.report(Progress::new(1, 1, manager.name.as_str(), format!("Processing {}...", manager.name)));

        let no_club = Club::standalone("", "");
        Ok(Harvest {
            rows: self.manager_rows(&no_club, &manager).await,
            ..Harvest::default()
        })
    }

    async fn player_by_id(
        &self,
        id: &str,
        cancel: &CancellationToken,
        reporter: &dyn Reporter,
    ) -> Result<Harvest<PlayerRow>, ScrapeError> {
        if !urls::is_numeric_id(id) {
            return Err(ScrapeError::InvalidId {
                kind: "player",
                id: id.to_string(),
            });
        }
        if cancel.is_cancelled() {
            reporter.report(Progress::new(0, 1, "", "stopped"));
            return Ok(Harvest {
                stopped: true,
                ..Harvest::default()
            });
        }

        let url = urls::player_url_by_id(&self.base_url, id);
        reporter.report(Progress::new(0, 1, "", format!("Fetching player {id}...")));
        let html = self
            .fetcher
            .fetch(&url)
            .await
            .ok_or_else(|| ScrapeError::PageUnavailable(url.clone()))?;
        let profile = parse_player_profile(&html);
        if profile.player_name.is_empty() {
            return Err(ScrapeError::NotFound {
                kind: "player",
                id: id.to_string(),
            });
        }
        reporter.report(Progress::new(1, 1, profile.player_name.as_str(), format!("Processing {}...", profile.player_name)));

        let player = Player {
            name: profile.player_name.clone(),
            jersey_number: profile.jersey_number.clone(),
            profile_url: url,
            id: id.to_string(),
            position: profile.position.clone(),
        };
        let no_club = Club::standalone("", "");
        Ok(Harvest {
            rows: vec![PlayerRow::new(&no_club, &player, profile)],
            ..Harvest::default()
        })
    }
}

fn with_league(clubs: Vec<Club>, league: &str, country: &str) -> Vec<Club> {
    clubs
        .into_iter()
        .map(|club| Club {
            league: league.to_string(),
            league_country: country.to_string(),
            ..club
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    const BASE: &str = "https://tm.test";

    #[derive(Default)]
    struct Pages {
        pages: HashMap<String, String>,
        requests: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Fetch for Pages {
        async fn fetch(&self, url: &str) -> Option<String> {
            if let Ok(mut requests) = self.requests.lock() {
                requests.push(url.to_string());
            }
            self.pages.get(url).cloned()
        }
    }

    fn scout(pages: &[(&str, &str)]) -> Scout<Pages> {
        let pages = Pages {
            pages: pages.iter().map(|(u, p)| (u.to_string(), p.to_string())).collect(),
            ..Default::default()
        };
        Scout::new(pages, BASE, RoleClassifier::default())
    }

    fn quiet(_: Progress) {}

    #[tokio::test]
    async fn invalid_club_url_is_skipped() {
        let scout = scout(&[]);
        let scope = Scope::Club(Club::standalone("Nowhere", "https://tm.test/nowhere"));
        let harvest = scout
            .run_coaches(&scope, &CancellationToken::new(), &quiet)
            .await
            .unwrap();
        assert!(harvest.rows.is_empty());
        assert_eq!(harvest.skipped.len(), 1);
        assert_eq!(harvest.skipped[0].name, "Nowhere");
        assert!(harvest.skipped[0].error.contains("no club id"));
    }

    #[tokio::test]
    async fn cancelled_token_stops_before_first_club() {
        let scout = scout(&[]);
        let token = CancellationToken::new();
        token.cancel();
        let seen = Mutex::new(Vec::new());
        let reporter = |p: Progress| seen.lock().unwrap().push(p);
        let scope = Scope::Clubs(vec![
            Club::standalone("A", "https://tm.test/a/startseite/verein/1"),
            Club::standalone("B", "https://tm.test/b/startseite/verein/2"),
        ]);
        let harvest = scout.run_players(&scope, &token, &reporter).await.unwrap();
        assert!(harvest.stopped);
        assert!(harvest.rows.is_empty());
        let seen = seen.lock().unwrap();
        assert_eq!(seen.last().map(|p| p.status.as_str()), Some("stopped"));
        assert!(scout.fetcher.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn scope_kinds_are_checked() {
        let scout = scout(&[]);
        let token = CancellationToken::new();
        let err = scout
            .run_players(&Scope::Manager("1".into()), &token, &quiet)
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::UnsupportedScope("manager")));
        let err = scout
            .run_coaches(&Scope::LeagueId("gb1".into()), &token, &quiet)
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidId { kind: "league", .. }));
    }

    #[tokio::test]
    async fn league_cache_avoids_refetch() {
        let page = r#"<table class="items"><tr><td><a href="/premier-league/startseite/wettbewerb/GB1">Premier League</a></td>
            <td><img alt="England"></td></tr></table>"#;
        let scout = scout(&[("https://tm.test/wettbewerbe/europa", page)]);
        let first = scout.cached_leagues(Continent::Europa).await;
        let second = scout.cached_leagues(Continent::Europa).await;
        assert_eq!(first, second);
        assert_eq!(first.len(), 1);
        assert_eq!(scout.fetcher.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_continent_reports_no_leagues() {
        let scout = scout(&[]);
        let seen = Mutex::new(Vec::new());
        let reporter = |p: Progress| seen.lock().unwrap().push(p);
        let harvest = scout
            .run_coaches(&Scope::Continent(Continent::Afrika), &CancellationToken::new(), &reporter)
            .await
            .unwrap();
        assert!(harvest.rows.is_empty());
        assert_eq!(harvest.nothing_found.as_deref(), Some(NO_LEAGUES_FOUND));
        let seen = seen.lock().unwrap();
        assert_eq!(seen.last().map(|p| p.status.as_str()), Some(NO_LEAGUES_FOUND));
    }

    #[tokio::test]
    async fn club_id_name_falls_back() {
        let scout = scout(&[]);
        let clubs = scout.resolve_clubs(&Scope::ClubId("418".into()), &quiet).await.unwrap();
        assert_eq!(clubs, vec![Club::standalone("Club 418", "https://tm.test/startseite/verein/418")]);
    }
}
