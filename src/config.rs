//! Application-level configuration loading: turn policy, timer durations,
//! and the question-file location.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::state::game::TurnPolicy;

/// Default location on disk where the binary looks for the JSON
/// configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "BUZZDESK_CONFIG_PATH";
/// Default question-file location, relative to the working directory.
const DEFAULT_QUESTIONS_PATH: &str = "config/questions.json";
/// How long buzzers stay armed before an unanswered question times out.
const DEFAULT_BUZZ_TIMEOUT_MS: u64 = 15_000;
/// How long a buzzed-in player has before their answer times out.
const DEFAULT_ANSWER_TIMEOUT_MS: u64 = 20_000;

/// Immutable runtime configuration shared across the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// How the next picking player is selected.
    pub turn_policy: TurnPolicy,
    /// Buzz-in window for each offered question.
    pub buzz_timeout: Duration,
    /// Answer window once a buzzer wins arbitration.
    pub answer_timeout: Duration,
    /// Where the question file is loaded from.
    pub questions_path: PathBuf,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(path = %path.display(), policy = ?config.turn_policy, "loaded config");
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
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            turn_policy: TurnPolicy::default(),
            buzz_timeout: Duration::from_millis(DEFAULT_BUZZ_TIMEOUT_MS),
            answer_timeout: Duration::from_millis(DEFAULT_ANSWER_TIMEOUT_MS),
            questions_path: PathBuf::from(DEFAULT_QUESTIONS_PATH),
        }
    }
}

/// JSON representation of the configuration file.
#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    turn_policy: TurnPolicy,
    #[serde(default)]
    buzz_timeout_ms: Option<u64>,
    #[serde(default)]
    answer_timeout_ms: Option<u64>,
    #[serde(default)]
    questions_path: Option<PathBuf>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            turn_policy: value.turn_policy,
            buzz_timeout: Duration::from_millis(
                value.buzz_timeout_ms.unwrap_or(DEFAULT_BUZZ_TIMEOUT_MS),
            ),
            answer_timeout: Duration::from_millis(
                value.answer_timeout_ms.unwrap_or(DEFAULT_ANSWER_TIMEOUT_MS),
            ),
            questions_path: value
                .questions_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_QUESTIONS_PATH)),
        }
    }
}

/// Resolve the configuration path taking the environment override into
/// account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
