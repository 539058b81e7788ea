//! Authentication provider contract
//!
//! The launcher never speaks the remote protocols itself. A host supplies an
//! [`AuthProvider`] and this module routes each stored account to the right
//! capability based on its `meta.type`.

pub mod reconcile;

use crate::models::{Account, AccountKind};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use reconcile::{
    reconcile_accounts, ReconcileContext, ReconcileReport, RemovalReason, RemovedAccount,
};

/// Why an account could not be refreshed
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AuthFailure {
    /// The provider answered and refused the stored session
    #[error("{message}")]
    Rejected { message: String },

    #[error("Unrecognized account type '{kind}'")]
    UnknownAccountType { kind: String },

    /// The launcher configuration lacks what this provider needs
    #[error("Missing provider credential: {what}")]
    MissingCredential { what: String },

    /// The stored record could not be read as an account
    #[error("Malformed account record: {message}")]
    Malformed { message: String },
}

impl AuthFailure {
    pub fn rejected(message: impl Into<String>) -> Self {
        AuthFailure::Rejected {
            message: message.into(),
        }
    }
}

/// Provider-scoped settings taken from the launcher configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderCredentials {
    /// OAuth client id used for Xbox refreshes
    pub client_id: String,
    /// AZauth server URL, when the launcher is bound to one
    pub azauth_url: Option<String>,
}

/// Remote authentication capabilities, one per account family.
///
/// Every capability returns the replacement account record. Its `ID` is
/// ignored; the caller keeps the stored identity.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Refresh a Microsoft / Xbox Live session
    async fn refresh_xbox(&self, client_id: &str, account: &Account)
        -> Result<Account, AuthFailure>;

    /// Validate (and renew) a session on an AZauth server
    async fn verify_azauth(&self, server_url: &str, account: &Account)
        -> Result<Account, AuthFailure>;

    /// Re-create an offline Mojang profile from its name
    async fn login_mojang_offline(&self, name: &str) -> Result<Account, AuthFailure>;

    /// Refresh an online Mojang session
    async fn refresh_mojang(&self, account: &Account) -> Result<Account, AuthFailure>;
}

/// Which capability handles an account
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshRoute {
    XboxRefresh,
    AzauthVerify,
    MojangLogin,
    MojangRefresh,
    Unrecognized(String),
}

impl RefreshRoute {
    pub fn for_account(account: &Account) -> Self {
        match account.kind() {
            AccountKind::Xbox => RefreshRoute::XboxRefresh,
            AccountKind::AZauth => RefreshRoute::AzauthVerify,
            AccountKind::Mojang if account.is_offline() => RefreshRoute::MojangLogin,
            AccountKind::Mojang => RefreshRoute::MojangRefresh,
            AccountKind::Unknown(tag) => RefreshRoute::Unrecognized(tag.clone()),
        }
    }
}

/// Ask the matching provider capability for a fresh copy of `account`.
///
/// Unknown account types fail without contacting any provider.
pub async fn refresh_account<P>(
    provider: &P,
    credentials: &ProviderCredentials,
    account: &Account,
) -> Result<Account, AuthFailure>
where
    P: AuthProvider + ?Sized,
{
    match RefreshRoute::for_account(account) {
        RefreshRoute::XboxRefresh => provider.refresh_xbox(&credentials.client_id, account).await,
        RefreshRoute::AzauthVerify => {
            let url = credentials
                .azauth_url
                .as_deref()
                .ok_or_else(|| AuthFailure::MissingCredential {
                    what: "AZauth server URL".to_string(),
                })?;
            provider.verify_azauth(url, account).await
        }
        RefreshRoute::MojangLogin => provider.login_mojang_offline(&account.name).await,
        RefreshRoute::MojangRefresh => provider.refresh_mojang(account).await,
        RefreshRoute::Unrecognized(kind) => Err(AuthFailure::UnknownAccountType { kind }),
    }
}
