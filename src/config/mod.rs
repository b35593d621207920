use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::preview::fetcher::DEFAULT_USER_AGENT;
use crate::preview::image::DEFAULT_BODY_IMAGE_SCAN_LIMIT;
use crate::preview::{PreviewOptions, DEFAULT_TIMEOUT};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub is_dev: bool,
    pub preview_timeout: Duration,
    pub body_image_scan_limit: usize,
    pub user_agent: String,
    pub block_private_hosts: bool,
}

fn parse_var<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid { key, value: raw }),
        Err(_) => Ok(default),
    }
}

fn parse_positive(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    let value = parse_var(key, default)?;
    if value == 0 {
        return Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
        });
    }
    Ok(value)
}

fn parse_flag(key: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid { key, value: raw }),
        },
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let default_timeout_ms = DEFAULT_TIMEOUT.as_millis() as u64;

        Ok(Config {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: parse_var("SERVER_PORT", 8080)?,
            is_dev: env::var("APP_ENV").as_deref() != Ok("production"),
            preview_timeout: Duration::from_millis(parse_positive(
                "PREVIEW_TIMEOUT_MS",
                default_timeout_ms,
            )?),
            body_image_scan_limit: parse_positive(
                "PREVIEW_BODY_IMAGE_LIMIT",
                DEFAULT_BODY_IMAGE_SCAN_LIMIT as u64,
            )? as usize,
            user_agent: env::var("PREVIEW_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
            block_private_hosts: parse_flag("PREVIEW_BLOCK_PRIVATE_HOSTS", true)?,
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn preview_options(&self) -> PreviewOptions {
        PreviewOptions {
            default_timeout: self.preview_timeout,
            body_image_scan_limit: self.body_image_scan_limit,
        }
    }
}
