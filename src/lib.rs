//! # Touchline
//!
//! Scrapes football leagues, clubs, managers and players from Transfermarkt
//! into flat rows.
//!
//! ## Features
//!
//! - **Extractors**: league, club, staff, squad, career-history and profile
//!   pages parsed with fallback strategies, tolerant of partial markup
//! - **Role classification**: tells the head-coach "Manager" apart from the
//!   many staff titles containing the same word
//! - **Traversals**: continent, league, club or single person down to coach
//!   or player rows, with progress reports and cooperative cancellation
//! - **Jobs**: one background coach job and one player job at a time

pub mod clubs;
pub mod config;
pub mod fields;
pub mod history;
pub mod job;
pub mod leagues;
pub mod manager;
pub mod model;
pub mod pipeline;
pub mod player;
pub mod role;
pub mod scraper;
pub mod squad;
pub mod staff;
pub mod urls;

pub use config::Config;
pub use job::{JobError, JobHandle, JobKind, JobManager, JobSnapshot};
pub use model::{CoachRow, Continent, PlayerRow, SkippedItem};
pub use pipeline::{Harvest, LeagueRef, Progress, Reporter, Scope, ScrapeError, Scout};
pub use role::{classify_role, RoleClassifier};
pub use scraper::{Fetch, HttpFetcher};
