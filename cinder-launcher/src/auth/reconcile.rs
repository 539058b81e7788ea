//! Startup account reconciliation
//!
//! Runs once per launch, before any account-dependent panel is shown. Every
//! stored account is handed to its provider in table order, one at a time:
//!
//! 1. records already flagged with `error` are dropped without a provider call
//! 2. a provider failure drops the record; if it was the selected account the
//!    selection is cleared and persisted right away
//! 3. a successful refresh replaces the record under the same `ID`
//!
//! After the loop the store is re-read (not the loop's own state) to settle
//! the selection: no accounts means the login panel, otherwise a missing or
//! dangling selection falls back to the first account in table order.
//!
//! Accounts are processed strictly sequentially. The selection repair in
//! step 2 relies on it, so do not fan the provider calls out.

use super::{refresh_account, AuthFailure, AuthProvider, ProviderCredentials, RefreshRoute};
use crate::models::{selectable_accounts, Account, ConfigClient, ACCOUNTS_TABLE};
use crate::session::{Panel, SessionSink};
use crate::utils::config::{get_config_client, init_config_client, update_config_client};
use crate::utils::logging::{self, emit, Severity};
use chrono::{DateTime, Utc};
use cinder_lib::store::{from_record, record_id, KeySpace, RecordId, RecordStore, StoreError};

const PROGRESS_TITLE: &str = "Connecting";

/// What the reconciler needs from the surrounding application
pub struct ReconcileContext<'a, K: KeySpace> {
    pub store: &'a RecordStore<K>,
    pub credentials: &'a ProviderCredentials,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RemovalReason {
    /// The record carried an `error` flag from an earlier session
    FlaggedInvalid,
    ProviderFailure(AuthFailure),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemovedAccount {
    pub id: RecordId,
    pub name: String,
    pub reason: RemovalReason,
}

/// Outcome of one reconciliation pass
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileReport {
    pub panel: Panel,
    /// IDs refreshed successfully, in processing order
    pub refreshed: Vec<RecordId>,
    pub removed: Vec<RemovedAccount>,
    /// Selection persisted at the end of the pass
    pub account_selected: Option<RecordId>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ReconcileReport {
    fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            panel: Panel::Login,
            refreshed: Vec::new(),
            removed: Vec::new(),
            account_selected: None,
            started_at,
            finished_at: started_at,
        }
    }
}

async fn load_config<K: KeySpace>(store: &RecordStore<K>) -> Result<ConfigClient, StoreError> {
    match get_config_client(store).await? {
        Some(config) => Ok(config),
        None => init_config_client(store).await,
    }
}

/// Delete `id` and clear the selection in the same step if it pointed there
async fn drop_account<K: KeySpace>(
    store: &RecordStore<K>,
    config: &mut ConfigClient,
    selected_at_start: Option<RecordId>,
    id: RecordId,
) -> Result<(), StoreError> {
    store.delete(ACCOUNTS_TABLE, id).await?;

    if selected_at_start == Some(id) && config.account_selected.is_some() {
        config.account_selected = None;
        update_config_client(store, config).await?;
        log::info!("[auth] Cleared selection of removed account {}", id);
    }
    Ok(())
}

fn finish<S: SessionSink + ?Sized>(
    sink: &S,
    mut report: ReconcileReport,
    panel: Panel,
    account_selected: Option<RecordId>,
) -> ReconcileReport {
    sink.close_progress();
    sink.navigate_to(panel);

    report.panel = panel;
    report.account_selected = account_selected;
    report.finished_at = Utc::now();

    emit(
        Severity::Success,
        Some("auth"),
        &format!(
            "Reconciliation finished: {} refreshed, {} removed, selected {:?}, showing {}",
            report.refreshed.len(),
            report.removed.len(),
            account_selected,
            panel
        ),
    );
    report
}

/// Validate every stored account against its provider and settle the
/// selection. Store failures abort the pass; provider failures never do.
pub async fn reconcile_accounts<K, P, S>(
    ctx: &ReconcileContext<'_, K>,
    provider: &P,
    sink: &S,
) -> Result<ReconcileReport, StoreError>
where
    K: KeySpace,
    P: AuthProvider + ?Sized,
    S: SessionSink + ?Sized,
{
    let store = ctx.store;
    let mut report = ReconcileReport::new(Utc::now());

    let rows = store.read_all(ACCOUNTS_TABLE).await?;
    let mut config = load_config(store).await?;
    let selected_at_start = config.account_selected;

    if rows.is_empty() {
        log::info!("[auth] No stored accounts");
        return Ok(finish(sink, report, Panel::Login, config.account_selected));
    }

    log::info!("[auth] Reconciling {} stored account(s)", rows.len());

    for row in rows {
        let Some(id) = record_id(&row) else {
            emit(Severity::Warning, Some("auth"), "Skipping account row without an ID");
            continue;
        };

        let account: Account = match from_record(row) {
            Ok(account) => account,
            Err(e) => {
                emit(
                    Severity::Error,
                    Some("Account"),
                    &format!("ID:{}: unreadable record: {}", id, e),
                );
                drop_account(store, &mut config, selected_at_start, id).await?;
                report.removed.push(RemovedAccount {
                    id,
                    name: String::new(),
                    reason: RemovalReason::ProviderFailure(AuthFailure::Malformed {
                        message: e.to_string(),
                    }),
                });
                continue;
            }
        };

        if account.has_error() {
            log::info!("[Account] {}: flagged invalid, removing", account.name);
            drop_account(store, &mut config, selected_at_start, id).await?;
            report.removed.push(RemovedAccount {
                id,
                name: account.name,
                reason: RemovalReason::FlaggedInvalid,
            });
            continue;
        }

        if !matches!(RefreshRoute::for_account(&account), RefreshRoute::Unrecognized(_)) {
            logging::account_trace(&account);
            sink.show_progress(
                PROGRESS_TITLE,
                &format!(
                    "Refreshing {} account {}",
                    account.kind(),
                    account.name
                ),
            );
        }

        match refresh_account(provider, ctx.credentials, &account).await {
            Ok(mut refreshed) => {
                refreshed.id = id;
                store.update_as(&refreshed, id).await?;

                sink.register_account(&refreshed);
                if selected_at_start == Some(id) {
                    sink.activate_account(&refreshed);
                }
                report.refreshed.push(id);
            }
            Err(failure) => {
                logging::account_diagnostic(&account, &failure.to_string());
                drop_account(store, &mut config, selected_at_start, id).await?;
                report.removed.push(RemovedAccount {
                    id,
                    name: account.name,
                    reason: RemovalReason::ProviderFailure(failure),
                });
            }
        }
    }

    // Settle the selection against what actually got persisted
    let accounts = selectable_accounts(store.read_all(ACCOUNTS_TABLE).await?);
    let mut config = load_config(store).await?;

    if accounts.is_empty() {
        config.account_selected = None;
        update_config_client(store, &config).await?;
        return Ok(finish(sink, report, Panel::Login, None));
    }

    let selection_valid = config
        .account_selected
        .map(|selected| accounts.iter().any(|a| a.id == selected))
        .unwrap_or(false);

    if !selection_valid {
        let first = &accounts[0];
        if let Some(stale) = config.account_selected {
            emit(
                Severity::Warning,
                Some("auth"),
                &format!("Selected account {} no longer exists", stale),
            );
        }
        log::info!("[auth] Selecting first account {} ({})", first.id, first.name);

        config.account_selected = Some(first.id);
        update_config_client(store, &config).await?;
        sink.activate_account(first);
    }

    Ok(finish(sink, report, Panel::Home, config.account_selected))
}
