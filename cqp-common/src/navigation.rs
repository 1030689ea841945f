//! Two-screen navigation: intro page and main page

use serde::{Deserialize, Serialize};

/// Screen a session is currently on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    #[default]
    Intro,
    Main,
}

/// User action that may change the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavAction {
    /// "Enter" button on the intro page
    Enter,
    /// "Go Back to Intro Page" button on the main page
    GoBack,
}

impl Page {
    /// Next page after `action`; actions that do not apply leave the page unchanged
    pub fn apply(self, action: NavAction) -> Page {
        match (self, action) {
            (Page::Intro, NavAction::Enter) => Page::Main,
            (Page::Main, NavAction::GoBack) => Page::Intro,
            (page, _) => page,
        }
    }
}
