#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

use touchline::{Fetch, RoleClassifier, Scout};

pub const BASE: &str = "https://tm.test";
pub const LEAGUE_URL: &str = "https://tm.test/premier-league/startseite/wettbewerb/GB1";
pub const EMPTY_LEAGUE_URL: &str = "https://tm.test/national-league/startseite/wettbewerb/GB5";
pub const ARSENAL_URL: &str = "https://tm.test/arsenal-fc/startseite/verein/11";
pub const CHELSEA_URL: &str = "https://tm.test/chelsea-fc/startseite/verein/631";

/// Canned pages keyed by URL; unknown URLs are unavailable.
#[derive(Default)]
pub struct StaticPages {
    pages: HashMap<String, String>,
    requests: Mutex<Vec<String>>,
    gate: Option<Arc<Semaphore>>,
}

impl StaticPages {
    pub fn new(pages: &[(&str, String)]) -> Self {
        Self {
            pages: pages.iter().map(|(u, p)| (u.to_string(), p.clone())).collect(),
            ..Default::default()
        }
    }

    /// Every fetch waits for a permit on `gate`.
    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetch for StaticPages {
    async fn fetch(&self, url: &str) -> Option<String> {
        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await.ok()?;
        }
        self.requests.lock().unwrap().push(url.to_string());
        self.pages.get(url).cloned()
    }
}

pub fn scout(pages: StaticPages) -> Scout<StaticPages> {
    Scout::new(pages, BASE, RoleClassifier::default())
}

fn club_row(slug: &str, id: u32, name: &str) -> String {
    format!(
        r#"<tr><td><a href="/{slug}/startseite/verein/{id}/saison_id/2024"><img alt="{name}"></a></td>
           <td class="hauptlink"><a href="/{slug}/startseite/verein/{id}/saison_id/2024">{name}</a></td>
           <td>25</td></tr>"#
    )
}

pub fn league_page() -> String {
    format!(
        r#"<html><body><h1>Premier League</h1>
        <h2>Clubs - Premier League 24/25</h2>
        <table class="items"><thead><tr><th>#</th><th>Club</th></tr></thead><tbody>
        {}{}
        </tbody></table></body></html>"#,
        club_row("arsenal-fc", 11, "Arsenal FC"),
        club_row("chelsea-fc", 631, "Chelsea FC"),
    )
}

pub fn empty_league_page() -> String {
    r#"<html><body><h2>Clubs - National League</h2>
        <table class="items"><tbody><tr><td>No clubs this season</td></tr></tbody></table>
        </body></html>"#
        .to_string()
}

fn staff_row(slug: &str, name: &str, id: u32, role: &str) -> String {
    format!(
        r#"<tr><td><table class="inline-table"><tr><td><a href="/{slug}/profil/trainer/{id}">{name}</a></td></tr>
           <tr><td>{role}</td></tr></table></td><td> Dec 20, 2019</td></tr>"#
    )
}

pub fn arsenal_staff_page() -> String {
    format!(
        r#"<html><body><table class="items">
        <thead><tr><th>Coaching staff</th><th>Since</th></tr></thead>
        <tbody>{}{}</tbody></table></body></html>"#,
        staff_row("albert-stuivenberg", "Albert Stuivenberg", 2310, "Assistant Manager"),
        staff_row("mikel-arteta", "Mikel Arteta", 5672, "Manager"),
    )
}

pub fn arteta_profile_page() -> String {
    r#"<html><body><h1>Mikel Arteta</h1>
        <table class="auflistung">
          <tr><th>Date of birth/Age:</th><td>26/03/1982 (42)</td></tr>
          <tr><th>Preferred formation:</th><td>4-3-3 Attacking</td></tr>
        </table></body></html>"#
        .to_string()
}

pub fn arteta_history_page() -> String {
    r#"<html><body><table class="items">
        <thead><tr><th>Club</th><th>Appointed</th></tr></thead>
        <tbody>
        <tr><td><img alt="Arsenal FC"></td>
            <td><a href="/arsenal-fc/startseite/verein/11">Arsenal FC</a> Manager</td>
            <td>19/20 (20/12/2019)</td><td>-</td><td>19/20 (20/12/2019) / -</td><td>1800</td>
            <td>250</td><td>150</td><td>50</td><td>50</td><td>45</td><td>1.95 : 0.95</td><td>2.00</td></tr>
        <tr><td><img alt="Manchester City"></td>
            <td><a href="/manchester-city/startseite/verein/281">Manchester City</a> Assistant Manager</td>
            <td>16/17 (03/07/2016)</td><td>19/20 (20/12/2019)</td><td>-</td><td>1265</td>
            <td>-</td><td>-</td><td>-</td><td>-</td><td>-</td><td>-</td><td>-</td></tr>
        </tbody></table></body></html>"#
        .to_string()
}

pub fn arsenal_squad_page() -> String {
    r#"<html><body><table class="items"><tbody>
        <tr>
          <td class="zentriert rueckennummer"><div class="rn_nummer">7</div></td>
          <td class="posrela"><table class="inline-table">
            <tr><td rowspan="2"><a href="/bukayo-saka/profil/spieler/433177"><img alt="Bukayo Saka"></a></td>
                <td class="hauptlink"><a href="/bukayo-saka/profil/spieler/433177">Bukayo Saka</a></td></tr>
            <tr><td>Attacker</td></tr>
          </table></td>
        </tr>
    </tbody></table></body></html>"#
        .to_string()
}

pub fn saka_profile_page() -> String {
    r#"<html><body>
        <h1 class="data-header__headline-wrapper"><span class="data-header__shirt-number">#7</span> Bukayo Saka</h1>
        <div class="info-table">
          <span class="info-table__content info-table__content--regular">Date of birth/Age:</span>
          <span class="info-table__content info-table__content--bold">05/09/2001 (23)</span>
          <span class="info-table__content info-table__content--regular">Height:</span>
          <span class="info-table__content info-table__content--bold">1,78&nbsp;m</span>
          <span class="info-table__content info-table__content--regular">Citizenship:</span>
          <span class="info-table__content info-table__content--bold"><img alt="England" src="en.png"> England</span>
          <span class="info-table__content info-table__content--regular">Foot:</span>
          <span class="info-table__content info-table__content--bold">left</span>
        </div>
    </body></html>"#
        .to_string()
}

/// A two-club league where only Arsenal's pages exist.
pub fn premier_league() -> Vec<(&'static str, String)> {
    vec![
        (LEAGUE_URL, league_page()),
        (EMPTY_LEAGUE_URL, empty_league_page()),
        ("https://tm.test/arsenal-fc/mitarbeiter/verein/11", arsenal_staff_page()),
        ("https://tm.test/mikel-arteta/profil/trainer/5672", arteta_profile_page()),
        ("https://tm.test/mikel-arteta/stationen/trainer/5672/plus/1", arteta_history_page()),
        ("https://tm.test/arsenal-fc/kader/verein/11", arsenal_squad_page()),
        ("https://tm.test/bukayo-saka/profil/spieler/433177", saka_profile_page()),
    ]
}
