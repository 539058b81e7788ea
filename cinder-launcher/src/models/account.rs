use cinder_lib::store::{from_record, record_id, Record, RecordId, TableRecord};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

pub const ACCOUNTS_TABLE: &str = "accounts";

/// Authentication provider family of a stored account (`meta.type`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AccountKind {
    /// Microsoft / Xbox Live account, refreshed with the launcher's client id
    Xbox,
    /// Account on an AZauth server, verified against the configured endpoint
    AZauth,
    /// Legacy Mojang profile, online or offline
    Mojang,
    /// Any other tag. Kept verbatim so the record round-trips.
    Unknown(String),
}

impl AccountKind {
    pub fn as_str(&self) -> &str {
        match self {
            AccountKind::Xbox => "Xbox",
            AccountKind::AZauth => "AZauth",
            AccountKind::Mojang => "Mojang",
            AccountKind::Unknown(tag) => tag,
        }
    }
}

impl Default for AccountKind {
    fn default() -> Self {
        AccountKind::Unknown(String::new())
    }
}

impl From<String> for AccountKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "Xbox" => AccountKind::Xbox,
            "AZauth" => AccountKind::AZauth,
            "Mojang" => AccountKind::Mojang,
            _ => AccountKind::Unknown(tag),
        }
    }
}

impl From<AccountKind> for String {
    fn from(kind: AccountKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountMeta {
    #[serde(rename = "type", default)]
    pub kind: AccountKind,
    /// Only meaningful for Mojang profiles
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub online: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A remembered login, stored in the `accounts` table.
///
/// Provider session data (tokens, uuid, profile, ...) is opaque here and kept
/// in `session` so it round-trips untouched; a refresh replaces the whole
/// record except its `ID`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "ID", default)]
    pub id: RecordId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub meta: AccountMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
    #[serde(flatten)]
    pub session: Map<String, Value>,
}

impl Account {
    pub fn new(name: impl Into<String>, kind: AccountKind) -> Self {
        Self {
            name: name.into(),
            meta: AccountMeta {
                kind,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn kind(&self) -> &AccountKind {
        &self.meta.kind
    }

    /// Offline Mojang profiles are re-created by name instead of refreshed.
    /// A missing `online` flag counts as online.
    pub fn is_offline(&self) -> bool {
        self.meta.online == Some(false)
    }

    /// Whether the record was already flagged invalid by an earlier session
    pub fn has_error(&self) -> bool {
        match &self.error {
            None | Some(Value::Null) | Some(Value::Bool(false)) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Number(n)) => n.as_f64() != Some(0.0),
            Some(_) => true,
        }
    }
}

impl TableRecord for Account {
    const TABLE: &'static str = ACCOUNTS_TABLE;
}

/// Decode the rows that can be selected, in table order. Rows without an
/// integer `ID` cannot be addressed and rows that do not decode are skipped.
pub fn selectable_accounts(rows: Vec<Record>) -> Vec<Account> {
    rows.into_iter()
        .filter(|row| record_id(row).is_some())
        .filter_map(|row| from_record::<Account>(row).ok())
        .collect()
}
