//! Manager role classification.
//!
//! The site writes "Manager" inconsistently: as its own cell, glued to a club
//! name ("Real MadridManager"), or inside a different job title that happens
//! to contain the word ("Kit Manager"). Classification is layered:
//!
//! 1. find `manager` at a token boundary (so not "management");
//! 2. reject if any known compound role appears, spaced or concatenated;
//! 3. reject if a role-indicator word sits within the proximity window of the
//!    matched token.
//!
//! A miss is a normal outcome. Missing a real manager is preferred to
//! accepting a member of staff.

use crate::config::ClassifierConfig;
use crate::model::Role;

/// Characters inspected on each side of the matched `manager` token.
pub const DEFAULT_PROXIMITY_WINDOW: usize = 15;

/// Compound titles that contain "manager" (or sit beside it) but are not the head coach.
pub const EXCLUDED_COMPOUND_ROLES: &[&str] = &[
    "loan player manager",
    "player manager",
    "team manager",
    "caretaker manager",
    "assistant manager",
    "general manager",
    "sporting manager",
    "technical manager",
    "youth manager",
    "academy manager",
    "development manager",
    "operations manager",
    "business manager",
    "commercial manager",
    "marketing manager",
    "kit manager",
    "performance manager",
    "team official",
    "goalkeeping coach",
    "fitness manager",
    "scout manager",
    "data manager",
    "analyst manager",
    "video manager",
    "equipment manager",
    "stadium manager",
    "facilities manager",
];

/// Words that mark a different job when found near the `manager` token.
pub const ROLE_INDICATORS: &[&str] = &[
    "coach",
    "official",
    "staff",
    "analyst",
    "scout",
    "kit",
    "performance",
    "goalkeeping",
    "fitness",
    "equipment",
    "stadium",
    "facilities",
];

const TOKEN: &str = "manager";
const CARETAKER: &str = "caretaker manager";

/// Decides whether free text names the head-coach "Manager" role.
#[derive(Debug, Clone)]
pub struct RoleClassifier {
    window: usize,
    include_caretaker: bool,
    excluded: Vec<String>,
    excluded_glued: Vec<String>,
    indicators: Vec<String>,
}

impl Default for RoleClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_PROXIMITY_WINDOW, false)
    }
}

impl RoleClassifier {
    pub fn new(window: usize, include_caretaker: bool) -> Self {
        let excluded: Vec<String> = EXCLUDED_COMPOUND_ROLES
            .iter()
            .map(|r| r.to_string())
            .collect();
        let excluded_glued = excluded.iter().map(|r| r.replace(' ', "")).collect();

        Self {
            window,
            include_caretaker,
            excluded,
            excluded_glued,
            indicators: ROLE_INDICATORS.iter().map(|r| r.to_string()).collect(),
        }
    }

    pub fn from_config(config: &ClassifierConfig) -> Self {
        Self::new(config.proximity_window, config.include_caretaker)
    }

    /// `Some(Role::Manager)` only for the bare head-coach role.
    pub fn classify(&self, context: &str) -> Option<Role> {
        let text = context.to_lowercase();
        let (start, end) = find_manager_token(&text)?;

        if let Some(role) = self.compound_role(&text) {
            tracing::debug!(role, "excluded compound role");
            return None;
        }

        let window = window_around(&text, start, end, self.window);
        if let Some(indicator) = self.indicators.iter().find(|i| window.contains(i.as_str())) {
            tracing::debug!(indicator = indicator.as_str(), window, "excluded by nearby role word");
            return None;
        }

        Some(Role::Manager)
    }

    /// Staff-page variant: honours the caretaker knob before the strict check.
    pub fn classify_staff(&self, context: &str) -> Option<Role> {
        if self.include_caretaker {
            let text = context.to_lowercase();
            if text.contains(CARETAKER) || text.replace(' ', "").contains("caretakermanager") {
                return Some(Role::CaretakerManager);
            }
        }
        self.classify(context)
    }

    fn compound_role<'a>(&'a self, text: &str) -> Option<&'a str> {
        if let Some(role) = self.excluded.iter().find(|r| text.contains(r.as_str())) {
            return Some(role);
        }
        let glued = text.replace(' ', "");
        self.excluded_glued
            .iter()
            .find(|r| glued.contains(r.as_str()))
            .map(|r| r.as_str())
    }
}

/// Convenience wrapper using the default tuning.
pub fn classify_role(context: &str) -> Option<Role> {
    RoleClassifier::default().classify(context)
}

/// Byte span of the first `manager` that ends at a word boundary and is
/// preceded by a non-word character or a letter (covers "madridmanager").
fn find_manager_token(text: &str) -> Option<(usize, usize)> {
    text.match_indices(TOKEN).find_map(|(start, m)| {
        let end = start + m.len();
        let after_ok = text[end..]
            .chars()
            .next()
            .map(|c| !is_word_char(c))
            .unwrap_or(true);
        let before_ok = text[..start]
            .chars()
            .next_back()
            .map(|c| c.is_alphabetic() || !is_word_char(c))
            .unwrap_or(true);
        (after_ok && before_ok).then_some((start, end))
    })
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Up to `chars` characters either side of `start..end`, on char boundaries.
fn window_around(text: &str, start: usize, end: usize, chars: usize) -> &str {
    let from = text[..start]
        .char_indices()
        .rev()
        .take(chars)
        .last()
        .map(|(i, _)| i)
        .unwrap_or(start);
    let to = text[end..]
        .char_indices()
        .nth(chars)
        .map(|(i, _)| end + i)
        .unwrap_or(text.len());
    &text[from..to]
}
