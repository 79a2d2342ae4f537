//! Records extracted from the site and the flat rows emitted by a run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Continents with a league listing page (`/wettbewerbe/{continent}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Continent {
    #[default]
    Europa,
    Amerika,
    Afrika,
    Asien,
}

#[derive(Error, Debug)]
#[error("invalid continent '{0}', must be one of: europa, amerika, afrika, asien")]
pub struct InvalidContinent(pub String);

impl Continent {
    pub const ALL: [Continent; 4] = [
        Continent::Europa,
        Continent::Amerika,
        Continent::Afrika,
        Continent::Asien,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            Continent::Europa => "europa",
            Continent::Amerika => "amerika",
            Continent::Afrika => "afrika",
            Continent::Asien => "asien",
        }
    }
}

impl fmt::Display for Continent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Continent {
    type Err = InvalidContinent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Continent::ALL
            .into_iter()
            .find(|c| c.slug() == s.trim().to_lowercase())
            .ok_or_else(|| InvalidContinent(s.to_string()))
    }
}

/// A competition row from a continent listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct League {
    /// Competition code such as `GB1`, or the row index when the URL has none
    pub id: String,
    pub name: String,
    pub url: String,
    /// Country name, empty when no heuristic produced one
    pub country: String,
}

/// A club from a league's club table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Club {
    pub name: String,
    /// Canonical `/startseite/verein/{id}` URL
    pub url: String,
    #[serde(default)]
    pub league: String,
    #[serde(default)]
    pub league_country: String,
}

impl Club {
    /// A club visited outside of any league listing.
    pub fn standalone(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            league: String::new(),
            league_country: String::new(),
        }
    }
}

/// Coaching role as resolved by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "Manager")]
    Manager,
    #[serde(rename = "Caretaker Manager")]
    CaretakerManager,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Manager => "Manager",
            Role::CaretakerManager => "Caretaker Manager",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A club's current manager as listed on its staff page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manager {
    pub name: String,
    pub profile_url: String,
    /// Numeric trainer id
    pub id: String,
    pub role: Role,
}

/// Extra fields from a manager's profile page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManagerProfile {
    pub date_of_birth: String,
    pub preferred_formation: String,
}

/// One stint from a manager's career-history table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CareerHistoryEntry {
    pub club: String,
    pub club_url: String,
    pub role: Option<Role>,
    pub appointed_season: Option<String>,
    pub appointed_date: Option<String>,
    pub until_season: Option<String>,
    pub until_date: Option<String>,
    pub period_from: Option<String>,
    pub period_until: Option<String>,
    pub days_in_charge: Option<u32>,
    pub matches: Option<u32>,
    pub wins: Option<u32>,
    pub draws: Option<u32>,
    pub losses: Option<u32>,
    pub players_used: Option<u32>,
    pub avg_goals_for: Option<f64>,
    pub avg_goals_against: Option<f64>,
    pub points_per_match: Option<f64>,
}

/// A squad member from a club's squad page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub jersey_number: String,
    pub profile_url: String,
    pub id: String,
    pub position: String,
}

/// Fields read from a player's profile page. Missing fields stay empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub player_name: String,
    pub jersey_number: String,
    pub nationality: String,
    pub date_of_birth: String,
    pub caps: String,
    pub goals: String,
    pub position: String,
    pub height: String,
    pub foot: String,
    pub current_market_value: String,
}

/// Flat output row for the coach traversal: context + manager + one history stint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoachRow {
    pub league: String,
    pub league_country: String,
    pub current_club: String,
    pub current_club_url: String,
    pub manager: String,
    pub manager_id: String,
    pub manager_role: String,
    pub date_of_birth: String,
    pub preferred_formation: String,
    pub history_club: String,
    pub history_club_url: String,
    pub role: String,
    pub appointed_season: Option<String>,
    pub appointed_date: Option<String>,
    pub until_season: Option<String>,
    pub until_date: Option<String>,
    pub period_from: Option<String>,
    pub period_until: Option<String>,
    pub days_in_charge: Option<u32>,
    pub matches: Option<u32>,
    pub wins: Option<u32>,
    pub draws: Option<u32>,
    pub losses: Option<u32>,
    pub players_used: Option<u32>,
    pub avg_goals_for: Option<f64>,
    pub avg_goals_against: Option<f64>,
    pub points_per_match: Option<f64>,
}

impl CoachRow {
    pub fn new(
        club: &Club,
        manager: &Manager,
        profile: &ManagerProfile,
        entry: CareerHistoryEntry,
    ) -> Self {
        Self {
            league: club.league.clone(),
            league_country: club.league_country.clone(),
            current_club: club.name.clone(),
            current_club_url: club.url.clone(),
            manager: manager.name.clone(),
            manager_id: manager.id.clone(),
            manager_role: manager.role.to_string(),
            date_of_birth: profile.date_of_birth.clone(),
            preferred_formation: profile.preferred_formation.clone(),
            history_club: entry.club,
            history_club_url: entry.club_url,
            role: entry.role.map(|r| r.to_string()).unwrap_or_default(),
            appointed_season: entry.appointed_season,
            appointed_date: entry.appointed_date,
            until_season: entry.until_season,
            until_date: entry.until_date,
            period_from: entry.period_from,
            period_until: entry.period_until,
            days_in_charge: entry.days_in_charge,
            matches: entry.matches,
            wins: entry.wins,
            draws: entry.draws,
            losses: entry.losses,
            players_used: entry.players_used,
            avg_goals_for: entry.avg_goals_for,
            avg_goals_against: entry.avg_goals_against,
            points_per_match: entry.points_per_match,
        }
    }
}

/// Flat output row for the player traversal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerRow {
    pub league: String,
    pub league_country: String,
    pub current_club: String,
    pub current_club_url: String,
    pub player_name: String,
    pub player_id: String,
    pub jersey_number: String,
    pub nationality: String,
    pub date_of_birth: String,
    pub caps: String,
    pub goals: String,
    pub position: String,
    pub height: String,
    pub foot: String,
    pub current_market_value: String,
}

impl PlayerRow {
    /// Profile values win; squad-page values fill the gaps.
    pub fn new(club: &Club, player: &Player, profile: PlayerProfile) -> Self {
        Self {
            league: club.league.clone(),
            league_country: club.league_country.clone(),
            current_club: club.name.clone(),
            current_club_url: club.url.clone(),
            player_name: or_else(profile.player_name, &player.name),
            player_id: player.id.clone(),
            jersey_number: or_else(profile.jersey_number, &player.jersey_number),
            nationality: profile.nationality,
            date_of_birth: profile.date_of_birth,
            caps: profile.caps,
            goals: profile.goals,
            position: or_else(profile.position, &player.position),
            height: profile.height,
            foot: profile.foot,
            current_market_value: profile.current_market_value,
        }
    }
}

fn or_else(value: String, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value
    }
}

/// A unit that failed during a run and was passed over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedItem {
    pub name: String,
    pub url: String,
    pub error: String,
}
