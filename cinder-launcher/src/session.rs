//! Selection / navigation sink
//!
//! The UI layer implements [`SessionSink`] and is driven by the reconciler
//! and the account commands: which accounts to list, which one is active,
//! and which panel to show.

use crate::models::Account;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-level panels the core can navigate to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Panel {
    Login,
    Home,
}

impl Panel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Panel::Login => "login",
            Panel::Home => "home",
        }
    }
}

impl fmt::Display for Panel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub trait SessionSink: Send + Sync {
    /// Add (or refresh) an entry in the account list
    fn register_account(&self, account: &Account);

    /// Mark `account` as the one the game will launch with
    fn activate_account(&self, account: &Account);

    fn navigate_to(&self, panel: Panel);

    /// Transient "connecting" indicator. Observational only.
    fn show_progress(&self, _title: &str, _message: &str) {}

    fn close_progress(&self) {}

    /// Blocking, exit-only error notice
    fn show_fatal_error(&self, _code: &str, _message: &str) {}
}
