/// Worker configuration
///
/// Settings come from the environment (a `.env` file is loaded first in
/// development) through the `config` crate:
///
/// | Variable                      | Default                                         |
/// |-------------------------------|-------------------------------------------------|
/// | `DATABASE_URL`                | required                                        |
/// | `DATABASE_MAX_CONNECTIONS`    | 5                                               |
/// | `WORKER_POLL_INTERVAL_SECS`   | 5                                               |
/// | `WORKER_BATCH_SIZE`           | 20                                              |
/// | `WORKER_MAX_CONCURRENT`       | 4                                               |
/// | `WORKER_MAX_ATTEMPTS`         | 5                                               |
/// | `WORKER_BACKOFF_BASE_SECS`    | 30                                              |
/// | `WORKER_BACKOFF_CAP_SECS`     | 3600                                            |
/// | `WORKER_LEASE_SECS`           | 300                                             |
/// | `AISENSY_API_URL`             | `https://backend.aisensy.com/campaign/t1/api/v2` |
/// | `AISENSY_API_KEY`             | unset: delivery is disabled                     |
/// | `AISENSY_CAMPAIGN_NAME`       | unset: delivery is disabled                     |
/// | `LLM_API_KEY` / `LLM_*`       | unset: template messages only                   |

use std::collections::HashMap;
use std::time::Duration;

use config::{ConfigError, Environment};
use serde::Deserialize;
use task100x_shared::llm::LlmConfig;

pub const DEFAULT_AISENSY_API_URL: &str = "https://backend.aisensy.com/campaign/t1/api/v2";

/// Polling and retry knobs (`WORKER_*`)
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerSettings {
    #[serde(default = "WorkerSettings::default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Notifications claimed per poll
    #[serde(default = "WorkerSettings::default_batch_size")]
    pub batch_size: i64,

    /// Jobs running at the same time
    #[serde(default = "WorkerSettings::default_max_concurrent")]
    pub max_concurrent: usize,

    /// Delivery attempts before a notification is marked FAILED
    #[serde(default = "WorkerSettings::default_max_attempts")]
    pub max_attempts: i32,

    #[serde(default = "WorkerSettings::default_backoff_base")]
    pub backoff_base_secs: u64,

    #[serde(default = "WorkerSettings::default_backoff_cap")]
    pub backoff_cap_secs: u64,

    /// How long a claimed notification stays invisible to other workers
    #[serde(default = "WorkerSettings::default_lease")]
    pub lease_secs: u64,
}

impl WorkerSettings {
    const fn default_poll_interval() -> u64 {
        5
    }

    const fn default_batch_size() -> i64 {
        20
    }

    const fn default_max_concurrent() -> usize {
        4
    }

    const fn default_max_attempts() -> i32 {
        5
    }

    const fn default_backoff_base() -> u64 {
        30
    }

    const fn default_backoff_cap() -> u64 {
        3600
    }

    const fn default_lease() -> u64 {
        300
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn lease(&self) -> Duration {
        Duration::from_secs(self.lease_secs)
    }
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: Self::default_poll_interval(),
            batch_size: Self::default_batch_size(),
            max_concurrent: Self::default_max_concurrent(),
            max_attempts: Self::default_max_attempts(),
            backoff_base_secs: Self::default_backoff_base(),
            backoff_cap_secs: Self::default_backoff_cap(),
            lease_secs: Self::default_lease(),
        }
    }
}

/// WhatsApp campaign API settings (`AISENSY_*`)
#[derive(Debug, Clone, Deserialize)]
pub struct AiSensySettings {
    #[serde(default = "AiSensySettings::default_api_url")]
    pub api_url: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub campaign_name: Option<String>,
}

impl AiSensySettings {
    fn default_api_url() -> String {
        DEFAULT_AISENSY_API_URL.to_string()
    }

    /// Whether messages can be delivered at all
    pub fn is_configured(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.api_key) && present(&self.campaign_name)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct DatabaseSettings {
    url: String,
    #[serde(default = "default_max_connections")]
    max_connections: u32,
}

const fn default_max_connections() -> u32 {
    5
}

/// Complete worker configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub worker: WorkerSettings,
    pub aisensy: AiSensySettings,
    pub llm: Option<LlmConfig>,
}

impl Config {
    /// Loads configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_vars(std::env::vars().collect())
    }

    /// Loads configuration from the given variables
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let database: DatabaseSettings = section(&vars, "DATABASE")?;
        let worker: WorkerSettings = section(&vars, "WORKER")?;
        let aisensy: AiSensySettings = section(&vars, "AISENSY")?;

        if worker.max_concurrent == 0 {
            return Err(ConfigError::Message(
                "WORKER_MAX_CONCURRENT must be at least 1".to_string(),
            ));
        }
        if worker.max_attempts < 1 {
            return Err(ConfigError::Message(
                "WORKER_MAX_ATTEMPTS must be at least 1".to_string(),
            ));
        }

        let llm = LlmConfig::from_lookup(|key| vars.get(key).cloned());

        Ok(Self {
            database_url: database.url,
            database_max_connections: database.max_connections,
            worker,
            aisensy,
            llm,
        })
    }
}

/// Deserializes every `PREFIX_*` variable into `T`
fn section<T: for<'de> Deserialize<'de>>(
    vars: &HashMap<String, String>,
    prefix: &str,
) -> Result<T, ConfigError> {
    config::Config::builder()
        .add_source(
            Environment::with_prefix(prefix)
                .try_parsing(true)
                .source(Some(vars.clone())),
        )
        .build()?
        .try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_vars(vars(&[("DATABASE_URL", "postgresql://localhost/t")])).unwrap();

        assert_eq!(config.database_url, "postgresql://localhost/t");
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.worker.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.worker.batch_size, 20);
        assert_eq!(config.worker.max_concurrent, 4);
        assert_eq!(config.worker.max_attempts, 5);
        assert_eq!(config.aisensy.api_url, DEFAULT_AISENSY_API_URL);
        assert!(!config.aisensy.is_configured());
        assert!(config.llm.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_vars(vars(&[
            ("DATABASE_URL", "postgresql://localhost/t"),
            ("WORKER_MAX_CONCURRENT", "8"),
            ("WORKER_BACKOFF_BASE_SECS", "10"),
            ("AISENSY_API_KEY", "key"),
            ("AISENSY_CAMPAIGN_NAME", "session_reminder"),
            ("LLM_API_KEY", "llm-key"),
        ]))
        .unwrap();

        assert_eq!(config.worker.max_concurrent, 8);
        assert_eq!(config.worker.backoff_base_secs, 10);
        assert!(config.aisensy.is_configured());
        assert_eq!(config.llm.unwrap().api_key, "llm-key");
    }

    #[test]
    fn test_missing_database_url() {
        assert!(Config::from_vars(HashMap::new()).is_err());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let result = Config::from_vars(vars(&[
            ("DATABASE_URL", "postgresql://localhost/t"),
            ("WORKER_MAX_CONCURRENT", "0"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_blank_campaign_is_not_configured() {
        let settings = AiSensySettings {
            api_url: DEFAULT_AISENSY_API_URL.to_string(),
            api_key: Some("key".to_string()),
            campaign_name: Some("  ".to_string()),
        };
        assert!(!settings.is_configured());
    }
}
