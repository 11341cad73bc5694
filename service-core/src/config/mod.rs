use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use thiserror::Error;

/// Listener settings shared by every service.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

fn default_port() -> u16 {
    3000
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_bind_address(),
        }
    }
}

impl Config {
    /// Layers an optional `configuration` file under the process environment
    /// (`PORT`, `BIND_ADDRESS`).
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::default().try_parsing(true))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing env var: {0}")]
    Missing(String),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: String, reason: String },
}

/// Where named settings come from.
pub trait ConfigSource: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;
}

/// Reads settings from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl ConfigSource for ProcessEnv {
    fn get(&self, name: &str) -> Option<String> {
        env::var(name).ok()
    }
}

impl ConfigSource for HashMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        HashMap::get(self, name).cloned()
    }
}

/// Resolves required and optional settings. Empty values count as unset.
pub struct EnvLoader<S = ProcessEnv> {
    source: S,
}

impl EnvLoader<ProcessEnv> {
    pub fn from_env() -> Self {
        Self { source: ProcessEnv }
    }
}

impl<S: ConfigSource> EnvLoader<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn get_required(&self, name: &str) -> Result<String, ConfigError> {
        self.get_optional(name)
            .ok_or_else(|| ConfigError::Missing(name.to_string()))
    }

    pub fn get_optional(&self, name: &str) -> Option<String> {
        self.source.get(name).filter(|v| !v.is_empty())
    }

    /// Parses an optional setting, falling back to `default` when unset.
    pub fn get_parsed<T>(&self, name: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get_optional(name) {
            Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                name: name.to_string(),
                reason: e.to_string(),
            }),
            None => Ok(default),
        }
    }
}
