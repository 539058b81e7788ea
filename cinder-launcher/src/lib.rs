pub mod auth;
pub mod commands;
pub mod models;
pub mod session;
pub mod startup;
pub mod utils;

pub use auth::{AuthFailure, AuthProvider, ProviderCredentials};
pub use session::{Panel, SessionSink};
pub use startup::{start_launcher, LauncherConfig, StartupOutcome};
