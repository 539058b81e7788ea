//! Account commands invoked from the login and settings panels

use crate::models::{selectable_accounts, Account, ConfigClient, InstanceInfo, ACCOUNTS_TABLE};
use crate::session::{Panel, SessionSink};
use crate::utils::config::{get_config_client, modify_config_client, SettingsError};
use cinder_lib::store::{KeySpace, RecordId, RecordStore};

/// Result of removing an account from the settings panel
#[derive(Debug, Clone, PartialEq)]
pub enum RemoveOutcome {
    /// The last account is gone; the UI was sent to the login panel
    NoAccountsLeft,
    /// The removed account was selected and `next` took over
    Reselected { next: Account },
    /// Another account was selected; nothing else changed
    Removed,
}

/// If the selected instance is whitelisted and `account_name` is not on its
/// list, switch to the first open instance. Returns whether it changed.
pub fn ensure_instance_allowed(
    config: &mut ConfigClient,
    account_name: &str,
    instances: &[InstanceInfo],
) -> bool {
    let Some(current) = config.instance_select.as_deref() else {
        return false;
    };

    let blocked = instances
        .iter()
        .any(|i| i.name == current && !i.allows(account_name));
    if !blocked {
        return false;
    }

    match instances.iter().find(|i| !i.whitelist_active) {
        Some(open) => {
            log::info!(
                "[auth] {} is not whitelisted on {}, switching to {}",
                account_name,
                current,
                open.name
            );
            config.instance_select = Some(open.name.clone());
            true
        }
        None => {
            log::warn!(
                "[auth] {} is not whitelisted on {} and no open instance exists",
                account_name,
                current
            );
            false
        }
    }
}

/// Persist a freshly logged-in account and make it the active one
pub async fn add_account<K, S>(
    store: &RecordStore<K>,
    sink: &S,
    account: Account,
    instances: &[InstanceInfo],
) -> Result<Account, SettingsError>
where
    K: KeySpace,
    S: SessionSink + ?Sized,
{
    let stored = store.create_as(&account).await?;
    log::info!("[auth] Added {} account {} (ID:{})", stored.kind(), stored.name, stored.id);

    sink.register_account(&stored);
    select_loaded_account(store, sink, &stored, instances).await?;
    Ok(stored)
}

/// Make the stored account `id` the active one
pub async fn select_account<K, S>(
    store: &RecordStore<K>,
    sink: &S,
    id: RecordId,
    instances: &[InstanceInfo],
) -> Result<Account, SettingsError>
where
    K: KeySpace,
    S: SessionSink + ?Sized,
{
    let account = store
        .read_one_as::<Account>(id)
        .await?
        .ok_or(SettingsError::AccountNotFound(id))?;

    select_loaded_account(store, sink, &account, instances).await?;
    Ok(account)
}

async fn select_loaded_account<K, S>(
    store: &RecordStore<K>,
    sink: &S,
    account: &Account,
    instances: &[InstanceInfo],
) -> Result<(), SettingsError>
where
    K: KeySpace,
    S: SessionSink + ?Sized,
{
    modify_config_client(store, |config| {
        ensure_instance_allowed(config, &account.name, instances);
        config.account_selected = Some(account.id);
        Ok(())
    })
    .await?;

    sink.activate_account(account);
    Ok(())
}

/// Delete an account at the user's request, keeping the selection valid
pub async fn remove_account<K, S>(
    store: &RecordStore<K>,
    sink: &S,
    id: RecordId,
    instances: &[InstanceInfo],
) -> Result<RemoveOutcome, SettingsError>
where
    K: KeySpace,
    S: SessionSink + ?Sized,
{
    store.delete_as::<Account>(id).await?;
    log::info!("[auth] Removed account {}", id);

    let remaining = selectable_accounts(store.read_all(ACCOUNTS_TABLE).await?);
    let Some(next) = remaining.into_iter().next() else {
        modify_config_client(store, |config| {
            config.account_selected = None;
            Ok(())
        })
        .await?;
        sink.navigate_to(Panel::Login);
        return Ok(RemoveOutcome::NoAccountsLeft);
    };

    let selected = get_config_client(store)
        .await?
        .and_then(|config| config.account_selected);
    if selected == Some(id) {
        select_loaded_account(store, sink, &next, instances).await?;
        return Ok(RemoveOutcome::Reselected { next });
    }

    Ok(RemoveOutcome::Removed)
}
