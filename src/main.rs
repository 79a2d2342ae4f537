//! Touchline CLI - football data from Transfermarkt
//!
//! The scraping logic lives in lib.rs; this file parses arguments, drives
//! jobs from the terminal and handles top-level errors.

use anyhow::Context;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::{prelude::*, EnvFilter};

use touchline::model::Club;
use touchline::{urls, Config, Continent, HttpFetcher, JobHandle, JobManager, LeagueRef, Scope, Scout};

#[derive(Parser)]
#[command(name = "touchline")]
#[command(author, version, about = "Football club, manager and player data from Transfermarkt", long_about = None)]
struct Cli {
    /// Config file (defaults to ./touchline.toml, then ~/.config/touchline/touchline.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output from the extractors
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the leagues of a continent
    Leagues {
        #[arg(long, default_value = "europa")]
        continent: Continent,
        /// Print JSON instead of a listing
        #[arg(long)]
        json: bool,
    },
    /// List the clubs of a league page
    Clubs {
        league_url: String,
        #[arg(long)]
        json: bool,
    },
    /// Collect current managers and their career history
    Coaches {
        #[command(flatten)]
        scope: ScopeArgs,
        /// A single manager by id
        #[arg(long, conflicts_with = "ScopeArgs")]
        manager_id: Option<String>,
        /// Write rows to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Collect squad players and their profiles
    Players {
        #[command(flatten)]
        scope: ScopeArgs,
        /// A single player by id
        #[arg(long, conflicts_with = "ScopeArgs")]
        player_id: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print shell completions
    Completions { shell: Shell },
}

/// Where a job starts; all leagues of Europe when nothing is given.
#[derive(Args)]
#[group(multiple = false)]
struct ScopeArgs {
    /// Every league of a continent
    #[arg(long)]
    continent: Option<Continent>,
    /// League page URL (repeatable)
    #[arg(long)]
    league: Vec<String>,
    /// League by competition code, e.g. GB1
    #[arg(long)]
    league_id: Option<String>,
    /// Club page URL (repeatable)
    #[arg(long)]
    club: Vec<String>,
    /// Club by numeric id
    #[arg(long)]
    club_id: Option<String>,
}

impl ScopeArgs {
    fn into_scope(self) -> Scope {
        if let Some(continent) = self.continent {
            return Scope::Continent(continent);
        }
        if let Some(id) = self.league_id {
            return Scope::LeagueId(id);
        }
        if let Some(id) = self.club_id {
            return Scope::ClubId(id);
        }
        match (self.league.len(), self.club.len()) {
            (1, _) => Scope::League(league_ref(&self.league[0])),
            (n, _) if n > 1 => Scope::Leagues(self.league.iter().map(|u| league_ref(u)).collect()),
            (_, 1) => Scope::Club(club_from_url(&self.club[0])),
            (_, n) if n > 1 => Scope::Clubs(self.club.iter().map(|u| club_from_url(u)).collect()),
            _ => Scope::Continent(Continent::Europa),
        }
    }
}

fn league_ref(url: &str) -> LeagueRef {
    LeagueRef {
        url: url.to_string(),
        name: None,
    }
}

fn club_from_url(url: &str) -> Club {
    let name = urls::club_slug(url).unwrap_or_else(|| "Unknown Club".to_string());
    Club::standalone(name, url)
}

fn init_tracing(verbose: bool) {
    let level = std::env::var("RUST_LOG").unwrap_or_else(|_| if verbose { "debug" } else { "info" }.to_string());
    let filter = EnvFilter::try_new(format!("warn,touchline={level}")).unwrap_or_else(|_| EnvFilter::new("warn,touchline=info"));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(filter),
        )
        .init();
}

/// Logging, config and the scout every scraping command needs.
fn setup(config: Option<&Path>, verbose: bool) -> anyhow::Result<Scout<HttpFetcher>> {
    init_tracing(verbose);
    let config = match config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    Scout::from_config(&config).context("failed to build HTTP client")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Cli {
        config,
        verbose,
        command,
    } = Cli::parse();

    match command {
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "touchline", &mut std::io::stdout());
        }
        Commands::Leagues { continent, json } => {
            let scout = setup(config.as_deref(), verbose)?;
            let leagues = scout.cached_leagues(continent).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&leagues)?);
            } else if leagues.is_empty() {
                println!("No leagues found for {}.", continent);
            } else {
                println!("Leagues in {} ({}):\n", continent, leagues.len());
                for league in &leagues {
                    let country = if league.country.is_empty() {
                        String::new()
                    } else {
                        format!(" ({})", league.country)
                    };
                    println!("  {:<6} {}{}", league.id.bright_cyan(), league.name.bold(), country);
                    println!("         {}", league.url.dimmed());
                }
            }
        }
        Commands::Clubs { league_url, json } => {
            let scout = setup(config.as_deref(), verbose)?;
            let clubs = scout.clubs(&league_url).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&clubs)?);
            } else if clubs.is_empty() {
                println!("No clubs found.");
            } else {
                println!("Clubs ({}):\n", clubs.len());
                for club in &clubs {
                    println!("  {}", club.name.bold());
                    println!("  {}", club.url.dimmed());
                }
            }
        }
        Commands::Coaches {
            scope,
            manager_id,
            output,
        } => {
            let scope = manager_id.map(Scope::Manager).unwrap_or_else(|| scope.into_scope());
            let jobs = JobManager::new(setup(config.as_deref(), verbose)?);
            jobs.start_coaches(scope)?;
            run_job(jobs.coaches(), output).await?;
        }
        Commands::Players {
            scope,
            player_id,
            output,
        } => {
            let scope = player_id.map(Scope::Player).unwrap_or_else(|| scope.into_scope());
            let jobs = JobManager::new(setup(config.as_deref(), verbose)?);
            jobs.start_players(scope)?;
            run_job(jobs.players(), output).await?;
        }
    }

    Ok(())
}

/// Follow a started job until it ends, stopping it on Ctrl-C, then write its rows.
async fn run_job<R>(handle: &JobHandle<R>, output: Option<PathBuf>) -> anyhow::Result<()>
where
    R: Serialize + Clone + Send + Sync + 'static,
{
    let mut ticker = tokio::time::interval(Duration::from_millis(250));
    let mut last_status = String::new();

    while handle.is_running() {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                eprintln!("{}", "Stopping after the current club...".yellow());
                // The job may have finished in the meantime.
                let _ = handle.stop();
            }
            _ = ticker.tick() => {
                let progress = handle.snapshot().progress;
                if progress.status != last_status {
                    if progress.total > 0 {
                        eprintln!("[{}/{}] {}", progress.current, progress.total, progress.status);
                    } else {
                        eprintln!("{}", progress.status);
                    }
                    last_status = progress.status;
                }
            }
        }
    }

    let snapshot = handle.wait().await;
    let json = serde_json::to_string_pretty(&snapshot.results)?;
    match &output {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", json)?;
        }
    }

    let status = &snapshot.progress.status;
    let status_colored = if status == "completed" {
        status.green()
    } else if status.starts_with("error") {
        status.red()
    } else {
        status.yellow()
    };
    eprintln!("\n{} {} ({} rows)", "Job".bold(), status_colored, snapshot.results.len());
    if let Some(path) = &output {
        eprintln!("Rows written to {}", path.display());
    }
    if !snapshot.skipped.is_empty() {
        eprintln!("{}", format!("Skipped {}:", snapshot.skipped.len()).yellow());
        for item in &snapshot.skipped {
            eprintln!("  • {} ({}): {}", item.name, item.url, item.error);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn completions_need_no_scope_or_config() {
        let cli = Cli::try_parse_from(["touchline", "completions", "bash"]).unwrap();
        assert!(matches!(cli.command, Commands::Completions { shell: Shell::Bash }));
        assert!(cli.config.is_none());
    }

    #[test]
    fn scope_flags_exclude_each_other() {
        assert!(Cli::try_parse_from(["touchline", "coaches", "--league-id", "GB1", "--club-id", "11"]).is_err());
        assert!(Cli::try_parse_from(["touchline", "players", "--player-id", "1", "--club-id", "11"]).is_err());

        let cli = Cli::try_parse_from(["touchline", "coaches", "--club", "https://x/a/startseite/verein/1", "--club", "https://x/b/startseite/verein/2"]).unwrap();
        let Commands::Coaches { scope, .. } = cli.command else {
            panic!("expected coaches");
        };
        assert!(matches!(scope.into_scope(), Scope::Clubs(clubs) if clubs.len() == 2));
    }
}
