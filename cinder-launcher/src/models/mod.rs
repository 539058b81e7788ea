pub mod account;
pub mod config_client;
pub mod instance;

pub use account::{selectable_accounts, Account, AccountKind, AccountMeta, ACCOUNTS_TABLE};
pub use config_client::{
    CloseBehavior, ConfigClient, GameConfig, JavaConfig, JavaMemory, LauncherSettings, ScreenSize,
    Theme, CONFIG_CLIENT_TABLE,
};
pub use instance::InstanceInfo;
