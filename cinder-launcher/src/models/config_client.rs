use cinder_lib::store::{RecordId, TableRecord, SINGLETON_ID};
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::str::FromStr;

pub const CONFIG_CLIENT_TABLE: &str = "configClient";

pub const DEFAULT_JAVA_MEMORY: JavaMemory = JavaMemory { min: 2.0, max: 4.0 };
/// Used by the memory slider when nothing usable is stored
pub const FALLBACK_JAVA_MEMORY: JavaMemory = JavaMemory { min: 1.0, max: 2.0 };
pub const DEFAULT_SCREEN_SIZE: ScreenSize = ScreenSize {
    width: 854,
    height: 480,
};
pub const DEFAULT_DOWNLOAD_MULTI: u32 = 5;

// Rows are edited by hand and by older launchers, which store form input as
// strings. Decoding never fails on a single bad value: numbers may arrive as
// numeric strings, a missing leaf takes its default, and anything else turns
// the nearest optional field into `None`.

/// Decode an optional value, treating anything unreadable as absent
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    match serde_json::from_value(value) {
        Ok(decoded) => Ok(Some(decoded)),
        Err(e) => {
            log::warn!("[config] Ignoring unreadable client config value: {}", e);
            Ok(None)
        }
    }
}

/// A number, or a string holding one
fn numeric<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("'{}' is not a number", s))),
        other => T::deserialize(other).map_err(de::Error::custom),
    }
}

/// [`lenient`] for numeric fields
fn lenient_numeric<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + DeserializeOwned,
{
    let value: Option<Value> = lenient(deserializer)?;
    Ok(value.and_then(|value| numeric(value).ok()))
}

/// Whole gigabytes are written as integers (`2`, not `2.0`)
fn gigabytes<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

/// Java heap bounds in GB
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JavaMemory {
    #[serde(deserialize_with = "numeric", serialize_with = "gigabytes")]
    pub min: f64,
    #[serde(deserialize_with = "numeric", serialize_with = "gigabytes")]
    pub max: f64,
}

impl Default for JavaMemory {
    fn default() -> Self {
        DEFAULT_JAVA_MEMORY
    }
}

impl JavaMemory {
    /// Whether the bounds can be handed to the JVM
    pub fn is_valid(&self) -> bool {
        self.min > 0.0 && self.min <= self.max
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JavaConfig {
    #[serde(default, deserialize_with = "lenient")]
    pub java_path: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub java_memory: Option<JavaMemory>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenSize {
    #[serde(deserialize_with = "numeric")]
    pub width: u32,
    #[serde(deserialize_with = "numeric")]
    pub height: u32,
}

impl Default for ScreenSize {
    fn default() -> Self {
        DEFAULT_SCREEN_SIZE
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub screen_size: Option<ScreenSize>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Auto,
    Dark,
    Light,
}

/// What happens to the launcher window once the game starts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CloseBehavior {
    #[default]
    CloseLauncher,
    CloseAll,
    CloseNone,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LauncherSettings {
    #[serde(
        default,
        deserialize_with = "lenient_numeric",
        skip_serializing_if = "Option::is_none"
    )]
    pub download_multi: Option<u32>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub theme: Option<Theme>,
    #[serde(
        rename = "closeLauncher",
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub close_launcher: Option<CloseBehavior>,
    #[serde(
        rename = "intelEnabledMac",
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub intel_enabled_mac: Option<bool>,
}

fn singleton_id() -> RecordId {
    SINGLETON_ID
}

/// Per-installation client settings, one row in `configClient`.
///
/// Rows written by older launchers may lack whole groups; decoding tolerates
/// that and the accessors below substitute defaults at the point of use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigClient {
    #[serde(rename = "ID", default = "singleton_id")]
    pub id: RecordId,
    #[serde(default, deserialize_with = "lenient_numeric")]
    pub account_selected: Option<RecordId>,
    #[serde(default, deserialize_with = "lenient")]
    pub instance_select: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub java_config: Option<JavaConfig>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub game_config: Option<GameConfig>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub launcher_config: Option<LauncherSettings>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for ConfigClient {
    fn default() -> Self {
        Self {
            id: SINGLETON_ID,
            account_selected: None,
            instance_select: None,
            java_config: Some(JavaConfig {
                java_path: None,
                java_memory: Some(DEFAULT_JAVA_MEMORY),
            }),
            game_config: Some(GameConfig {
                screen_size: Some(DEFAULT_SCREEN_SIZE),
            }),
            launcher_config: Some(LauncherSettings {
                download_multi: Some(DEFAULT_DOWNLOAD_MULTI),
                theme: Some(Theme::Auto),
                close_launcher: Some(CloseBehavior::CloseLauncher),
                intel_enabled_mac: Some(true),
            }),
            extra: Map::new(),
        }
    }
}

impl ConfigClient {
    /// Stored heap bounds, if any
    pub fn java_memory(&self) -> Option<JavaMemory> {
        self.java_config.as_ref().and_then(|j| j.java_memory)
    }

    pub fn java_path(&self) -> Option<&str> {
        self.java_config
            .as_ref()
            .and_then(|j| j.java_path.as_deref())
    }

    pub fn screen_size(&self) -> ScreenSize {
        self.game_config
            .as_ref()
            .and_then(|g| g.screen_size)
            .unwrap_or(DEFAULT_SCREEN_SIZE)
    }

    pub fn download_multi(&self) -> u32 {
        self.launcher_config
            .as_ref()
            .and_then(|l| l.download_multi)
            .unwrap_or(DEFAULT_DOWNLOAD_MULTI)
    }

    pub fn theme(&self) -> Theme {
        self.launcher_config
            .as_ref()
            .and_then(|l| l.theme)
            .unwrap_or_default()
    }

    pub fn close_behavior(&self) -> CloseBehavior {
        self.launcher_config
            .as_ref()
            .and_then(|l| l.close_launcher)
            .unwrap_or_default()
    }

    pub fn intel_enabled_mac(&self) -> bool {
        self.launcher_config
            .as_ref()
            .and_then(|l| l.intel_enabled_mac)
            .unwrap_or(true)
    }

    pub fn java_config_mut(&mut self) -> &mut JavaConfig {
        self.java_config.get_or_insert_with(JavaConfig::default)
    }

    pub fn game_config_mut(&mut self) -> &mut GameConfig {
        self.game_config.get_or_insert_with(GameConfig::default)
    }

    pub fn launcher_config_mut(&mut self) -> &mut LauncherSettings {
        self.launcher_config
            .get_or_insert_with(LauncherSettings::default)
    }
}

impl TableRecord for ConfigClient {
    const TABLE: &'static str = CONFIG_CLIENT_TABLE;
}
