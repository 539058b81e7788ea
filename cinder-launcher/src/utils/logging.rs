//! Structured logging helpers
//!
//! Everything goes through the `log` facade; the host picks the backend.

use crate::models::Account;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    pub fn level(&self) -> log::Level {
        match self {
            Severity::Info | Severity::Success => log::Level::Info,
            Severity::Warning => log::Level::Warn,
            Severity::Error => log::Level::Error,
        }
    }

    fn default_title(&self) -> &'static str {
        match self {
            Severity::Info => "Info",
            Severity::Success => "Success",
            Severity::Warning => "Warning",
            Severity::Error => "Error",
        }
    }
}

/// Log `message` at the level matching `severity`, prefixed with `[title]`
pub fn emit(severity: Severity, title: Option<&str>, message: &str) {
    log::log!(
        severity.level(),
        "[{}] {}",
        title.unwrap_or(severity.default_title()),
        message
    );
}

/// Diagnostic line for an account that could not be kept
pub fn account_diagnostic(account: &Account, message: &str) {
    emit(
        Severity::Error,
        Some("Account"),
        &format!("{}: {}", account.name, message),
    );
}

/// Trace line written before an account is handed to its provider
pub fn account_trace(account: &Account) {
    emit(
        Severity::Info,
        Some("Account"),
        &format!("Type: {} | {}", account.kind(), account.name),
    );
}
