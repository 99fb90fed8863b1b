//! Application-level configuration loading for the bot host.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::dao::store::MEMORY_CONNECTION;

/// Default location on disk where the host looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/mafia.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "MAFIA_ENGINE_CONFIG_PATH";
/// Default location of the persisted game database.
const DEFAULT_DB_PATH: &str = "./mafiadb.json";

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Backing destination for the game database; `:memory:` for ephemeral runs.
    pub db: String,
    /// Thread id of the game to create or augment at startup.
    pub thread: Option<u64>,
    /// Name of the game to create or augment at startup.
    pub name: Option<String>,
    /// Moderators to register at startup.
    pub mods: Vec<String>,
    /// Players to register at startup.
    pub players: Vec<String>,
    /// Canned replies for unrecognized commands; one is picked at random.
    pub messages: Vec<String>,
    /// Whether reaching the lynch threshold kills the target immediately.
    pub auto_lynch: bool,
    /// Whether re-linking an attached thread/chat is rejected.
    pub strict_links: bool,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to built-in defaults on
    /// a missing or unreadable file.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(path = %path.display(), db = %config.db, "loaded configuration");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Configuration for an ephemeral in-memory run, used by tests.
    pub fn ephemeral() -> Self {
        Self {
            db: MEMORY_CONNECTION.into(),
            ..Self::default()
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db: DEFAULT_DB_PATH.into(),
            thread: None,
            name: None,
            mods: Vec::new(),
            players: Vec::new(),
            messages: default_messages(),
            auto_lynch: true,
            strict_links: false,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file.
struct RawConfig {
    #[serde(default)]
    db: Option<String>,
    #[serde(default)]
    thread: Option<u64>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    mods: Vec<String>,
    #[serde(default)]
    players: Vec<String>,
    #[serde(default)]
    messages: Vec<String>,
    #[serde(default = "default_true")]
    auto_lynch: bool,
    #[serde(default)]
    strict_links: bool,
}

fn default_true() -> bool {
    true
}

impl From<RawConfig> for AppConfig {
    fn from(raw: RawConfig) -> Self {
        Self {
            db: raw.db.unwrap_or_else(|| DEFAULT_DB_PATH.into()),
            thread: raw.thread,
            name: raw.name,
            mods: raw.mods,
            players: raw.players,
            messages: if raw.messages.is_empty() {
                default_messages()
            } else {
                raw.messages
            },
            auto_lynch: raw.auto_lynch,
            strict_links: raw.strict_links,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Built-in reply set for unrecognized commands.
fn default_messages() -> Vec<String> {
    vec!["Command invalid or no command issued. Try the `help` command.".into()]
}
