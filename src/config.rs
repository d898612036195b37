use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::ConfigError;

// ============================================================================
// Configuration
// ============================================================================
//
// Everything is read from environment variables. A tier that is not
// configured is simply disabled:
//
// - SCYLLA_NODES unset         -> no durable store
// - ENABLE_FILE_DATABASE=false -> no file tier
//
// ============================================================================

#[derive(Debug, Clone)]
pub struct Config {
    pub redis: RedisConfig,
    pub durable: Option<ScyllaConfig>,
    pub file: Option<FileConfig>,
    pub metrics_port: u16,
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub channel: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: "redis".to_string(),
            port: 6379,
            channel: "whiteboard-channel".to_string(),
        }
    }
}

impl RedisConfig {
    pub fn url(&self) -> String {
        format!("redis://{}:{}/", self.host, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct ScyllaConfig {
    pub nodes: Vec<String>,
    pub keyspace: String,
    /// Upper bound for a single connection attempt
    pub connect_timeout: Duration,
}

impl Default for ScyllaConfig {
    fn default() -> Self {
        Self {
            nodes: vec!["127.0.0.1:9042".to_string()],
            keyspace: "whiteboard".to_string(),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileConfig {
    pub dir: PathBuf,
    /// Debounce window for file writes
    pub save_delay: Duration,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("savedBoards"),
            save_delay: Duration::from_secs(10),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis: RedisConfig::default(),
            durable: None,
            file: Some(FileConfig::default()),
            metrics_port: 9090,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (env, map in tests, ...).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let redis = RedisConfig {
            host: lookup("REDIS_HOST").unwrap_or(defaults.redis.host),
            port: parse_or(&lookup, "REDIS_PORT", defaults.redis.port)?,
            channel: lookup("WHITEBOARD_CHANNEL").unwrap_or(defaults.redis.channel),
        };

        let durable = match lookup("SCYLLA_NODES") {
            Some(nodes) => {
                let nodes: Vec<String> = nodes
                    .split(',')
                    .map(str::trim)
                    .filter(|node| !node.is_empty())
                    .map(str::to_string)
                    .collect();

                if nodes.is_empty() {
                    None
                } else {
                    let scylla_defaults = ScyllaConfig::default();
                    Some(ScyllaConfig {
                        nodes,
                        keyspace: lookup("SCYLLA_KEYSPACE").unwrap_or(scylla_defaults.keyspace),
                        connect_timeout: Duration::from_secs(parse_or(
                            &lookup,
                            "SCYLLA_CONNECT_TIMEOUT_SECS",
                            scylla_defaults.connect_timeout.as_secs(),
                        )?),
                    })
                }
            }
            None => None,
        };

        let file = if parse_or(&lookup, "ENABLE_FILE_DATABASE", true)? {
            let file_defaults = FileConfig::default();
            Some(FileConfig {
                dir: lookup("FILE_DATABASE_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(file_defaults.dir),
                save_delay: Duration::from_secs(parse_or(
                    &lookup,
                    "FILE_SAVE_DELAY_SECS",
                    file_defaults.save_delay.as_secs(),
                )?),
            })
        } else {
            None
        };

        Ok(Self {
            redis,
            durable,
            file,
            metrics_port: parse_or(&lookup, "METRICS_PORT", defaults.metrics_port)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                key,
                value: value.clone(),
                reason: e.to_string(),
            }),
        None => Ok(default),
    }
}
