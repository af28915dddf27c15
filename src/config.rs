use std::time::Duration;

use anyhow::Context;
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// `debug` or `release`; release switches logs to JSON.
    pub mode: String,
    pub read_timeout_secs: u64,
    pub write_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            mode: "debug".into(),
            read_timeout_secs: 30,
            write_timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    pub fn is_release(&self) -> bool {
        self.mode.eq_ignore_ascii_case("release")
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    pub charset: String,
    pub max_idle_conns: u32,
    pub max_open_conns: u32,
    pub conn_max_lifetime_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 5432,
            username: "postgres".into(),
            password: String::new(),
            database: "learnhub".into(),
            charset: "UTF8".into(),
            max_idle_conns: 10,
            max_open_conns: 100,
            conn_max_lifetime_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    pub db: i64,
    pub pool_size: usize,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 6379,
            password: None,
            db: 0,
            pool_size: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            issuer: "learnhub".into(),
            audience: "learnhub-users".into(),
            ttl_minutes: 60,
            refresh_ttl_minutes: 60 * 24 * 14,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub jwt: JwtConfig,
}

impl AppConfig {
    const CONFIG_FILES: [&'static str; 2] = ["configs/config.yaml", "config.yaml"];
    const ENV_PREFIX: &'static str = "LEARNHUB_";

    /// Defaults, then the first YAML files found, then `LEARNHUB_*` env vars.
    /// Nested keys use a double underscore: `LEARNHUB_DATABASE__HOST`.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));
        for file in Self::CONFIG_FILES.iter().rev() {
            figment = figment.merge(Yaml::file(file));
        }
        figment.merge(Env::prefixed(Self::ENV_PREFIX).split("__"))
    }

    pub fn load() -> anyhow::Result<Self> {
        Self::figment()
            .extract::<Self>()
            .context("load configuration")
    }
}
