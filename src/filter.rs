// Filter and search derivation over the canonical order

use crate::models::TodoItem;
use crate::store::{ChangeCause, Subscriber};
use eyre::{Result, eyre};
use std::str::FromStr;
use tracing::debug;

/// Which items the derived view shows
///
/// Exactly one mode is active; choosing a search replaces the completed/incomplete
/// toggles and the other way around.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FilterMode {
    #[default]
    All,
    Completed,
    Incomplete,
    /// Case-sensitive substring match on the text
    Search(String),
}

impl FilterMode {
    /// Whether `item` belongs in the derived view
    pub fn matches(&self, item: &TodoItem) -> bool {
        match self {
            FilterMode::All => true,
            FilterMode::Completed => item.completed,
            FilterMode::Incomplete => !item.completed,
            FilterMode::Search(term) => item.text.contains(term.as_str()),
        }
    }
}

impl std::fmt::Display for FilterMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterMode::All => write!(f, "all"),
            FilterMode::Completed => write!(f, "completed"),
            FilterMode::Incomplete => write!(f, "incomplete"),
            FilterMode::Search(term) => write!(f, "search:{}", term),
        }
    }
}

impl FromStr for FilterMode {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        if let Some(term) = s.strip_prefix("search:") {
            return Ok(FilterMode::Search(term.to_string()));
        }
        match s {
            "all" => Ok(FilterMode::All),
            "completed" | "checked" => Ok(FilterMode::Completed),
            "incomplete" | "unchecked" => Ok(FilterMode::Incomplete),
            other => Err(eyre!(
                "Unknown filter: {} (expected all, completed, incomplete or search:<term>)",
                other
            )),
        }
    }
}

/// Derive the displayed subsequence of `items` for `mode`
pub fn apply(items: &[TodoItem], mode: &FilterMode) -> Vec<TodoItem> {
    items.iter().filter(|item| mode.matches(item)).cloned().collect()
}

/// Holds the active mode and the derived view, kept current through store notifications
#[derive(Debug, Clone, Default)]
pub struct FilterEngine {
    mode: FilterMode,
    view: Vec<TodoItem>,
}

impl FilterEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> &FilterMode {
        &self.mode
    }

    /// Current derived view
    pub fn view(&self) -> &[TodoItem] {
        &self.view
    }

    /// Switch mode and recompute against `items` right away
    pub fn set_mode(&mut self, mode: FilterMode, items: &[TodoItem]) {
        debug!(%mode, "Filter mode changed");
        self.mode = mode;
        self.recompute(items);
    }

    pub fn recompute(&mut self, items: &[TodoItem]) {
        self.view = apply(items, &self.mode);
    }
}

impl Subscriber for FilterEngine {
    fn on_change(&mut self, items: &[TodoItem], _cause: ChangeCause) {
        self.recompute(items);
    }
}
