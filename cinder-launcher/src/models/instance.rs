use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A game instance offered by the remote catalog.
///
/// Only the fields the account-selection rules need are modelled; the catalog
/// itself is fetched and owned by the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceInfo {
    pub name: String,
    #[serde(rename = "whitelistActive", default)]
    pub whitelist_active: bool,
    #[serde(default)]
    pub whitelist: Vec<String>,
    /// Server status block shown on the home panel
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,
}

impl InstanceInfo {
    /// Whether `account_name` may play this instance
    pub fn allows(&self, account_name: &str) -> bool {
        !self.whitelist_active || self.whitelist.iter().any(|n| n == account_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_whitelist_rules() {
        let open = InstanceInfo {
            name: "Lobby".into(),
            ..Default::default()
        };
        assert!(open.allows("anyone"));

        let closed: InstanceInfo = serde_json::from_value(json!({
            "name": "Staff",
            "whitelistActive": true,
            "whitelist": ["Notch"]
        }))
        .unwrap();
        assert!(closed.allows("Notch"));
        assert!(!closed.allows("Steve"));
    }
}
