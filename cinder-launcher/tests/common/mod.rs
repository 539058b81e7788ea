#![allow(dead_code)]

use async_trait::async_trait;
use cinder_launcher::models::{Account, AccountKind, ACCOUNTS_TABLE, CONFIG_CLIENT_TABLE};
use cinder_launcher::{AuthFailure, AuthProvider, Panel, ProviderCredentials, SessionSink};
use cinder_lib::store::{KeySpace, MemoryKeySpace, RecordId, RecordStore, StoreError};
use futures::future::BoxFuture;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Mutex;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn credentials() -> ProviderCredentials {
    ProviderCredentials {
        client_id: "client-123".into(),
        azauth_url: Some("https://auth.example.net".into()),
    }
}

/// Store seeded with raw table contents
pub async fn seeded_store(accounts: Value, config: Option<Value>) -> RecordStore<MemoryKeySpace> {
    let ks = MemoryKeySpace::new();
    ks.set(ACCOUNTS_TABLE, accounts).await.unwrap();
    if let Some(config) = config {
        ks.set(CONFIG_CLIENT_TABLE, json!([config])).await.unwrap();
    }
    RecordStore::new(ks)
}

/// Key space whose writes to one key fail like a full disk
pub struct FailingWrites {
    inner: MemoryKeySpace,
    key: &'static str,
}

impl FailingWrites {
    pub fn new(inner: MemoryKeySpace, key: &'static str) -> Self {
        Self { inner, key }
    }
}

impl KeySpace for FailingWrites {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<Value>, StoreError>> {
        self.inner.get(key)
    }

    fn set<'a>(&'a self, key: &'a str, value: Value) -> BoxFuture<'a, Result<(), StoreError>> {
        if key == self.key {
            return Box::pin(async {
                Err(StoreError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "no space left on device",
                )))
            });
        }
        self.inner.set(key, value)
    }
}

pub fn xbox(id: RecordId, name: &str) -> Value {
    json!({
        "ID": id,
        "name": name,
        "meta": {"type": "Xbox"},
        "access_token": format!("old-{}", name)
    })
}

/// Provider that refreshes every account except the ones told to fail.
///
/// Refreshed records come back with a new token and a bogus `ID` so callers
/// can check the stored identity wins.
#[derive(Default)]
pub struct ScriptedProvider {
    failing: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(names: &[&str]) -> Self {
        Self {
            failing: names.iter().map(|n| n.to_string()).collect(),
            ..Default::default()
        }
    }

    /// Names of the accounts handed to the provider, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn answer(&self, account: &Account) -> Result<Account, AuthFailure> {
        self.calls.lock().unwrap().push(account.name.clone());
        if self.failing.contains(&account.name) {
            return Err(AuthFailure::rejected("session expired"));
        }

        let mut refreshed = account.clone();
        refreshed.id = 999;
        refreshed
            .session
            .insert("access_token".into(), json!(format!("fresh-{}", account.name)));
        Ok(refreshed)
    }
}

#[async_trait]
impl AuthProvider for ScriptedProvider {
    async fn refresh_xbox(
        &self,
        _client_id: &str,
        account: &Account,
    ) -> Result<Account, AuthFailure> {
        self.answer(account)
    }

    async fn verify_azauth(
        &self,
        _server_url: &str,
        account: &Account,
    ) -> Result<Account, AuthFailure> {
        self.answer(account)
    }

    async fn login_mojang_offline(&self, name: &str) -> Result<Account, AuthFailure> {
        let mut account = Account::new(name, AccountKind::Mojang);
        account.meta.online = Some(false);
        self.answer(&account)
    }

    async fn refresh_mojang(&self, account: &Account) -> Result<Account, AuthFailure> {
        self.answer(account)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Registered(RecordId, String),
    Activated(RecordId, String),
    Navigated(Panel),
    Progress(String),
    ProgressClosed,
    Fatal(String),
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SinkEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn activated(&self) -> Vec<RecordId> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SinkEvent::Activated(id, _) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn registered(&self) -> Vec<RecordId> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SinkEvent::Registered(id, _) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn navigations(&self) -> Vec<Panel> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SinkEvent::Navigated(panel) => Some(panel),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: SinkEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl SessionSink for RecordingSink {
    fn register_account(&self, account: &Account) {
        self.push(SinkEvent::Registered(account.id, account.name.clone()));
    }

    fn activate_account(&self, account: &Account) {
        self.push(SinkEvent::Activated(account.id, account.name.clone()));
    }

    fn navigate_to(&self, panel: Panel) {
        self.push(SinkEvent::Navigated(panel));
    }

    fn show_progress(&self, _title: &str, message: &str) {
        self.push(SinkEvent::Progress(message.to_string()));
    }

    fn close_progress(&self) {
        self.push(SinkEvent::ProgressClosed);
    }

    fn show_fatal_error(&self, code: &str, _message: &str) {
        self.push(SinkEvent::Fatal(code.to_string()));
    }
}
