//! Environment-variable configuration surface.
//!
//! Credentials and addresses are required; everything else has a
//! default matching the original deployment.

use std::env;
use std::str::FromStr;

const DEFAULT_SENDER_NAME: &str = "ArXiv Paper Assistant";
const DEFAULT_SMTP_SERVER: &str = "smtp.qq.com";
const DEFAULT_SMTP_PORT: u16 = 465;
const DEFAULT_MODEL: &str = "deepseek-chat";
const DEFAULT_API_BASE: &str = "https://api.deepseek.com/v1";
const DEFAULT_SEARCH_TERMS: &str = "transformer,large language model";
const DEFAULT_MAX_RESULTS: u32 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),

    #[error("{0} is not a valid number: {1:?}")]
    InvalidNumber(&'static str, String),
}

// No Debug derive: holds the SMTP password and the API key.
#[derive(Clone)]
pub struct Config {
    pub sender_email: String,
    pub sender_name: Option<String>,
    pub sender_password: String,
    pub recipients: Vec<String>,
    pub smtp_server: String,
    pub smtp_port: u16,
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_api_base: String,
    pub search_terms: Vec<String>,
    pub max_results: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let recipients = parse_list(&required("RECEIVER_EMAILS")?);
        if recipients.is_empty() {
            return Err(ConfigError::Missing("RECEIVER_EMAILS"));
        }

        Ok(Self {
            sender_email: required("SENDER_EMAIL")?,
            sender_name: Some(
                optional("SENDER_NAME").unwrap_or_else(|| DEFAULT_SENDER_NAME.to_string()),
            ),
            sender_password: required("SENDER_PASSWORD")?,
            recipients,
            smtp_server: optional("SMTP_SERVER")
                .unwrap_or_else(|| DEFAULT_SMTP_SERVER.to_string()),
            smtp_port: parse_number("SMTP_PORT", DEFAULT_SMTP_PORT)?,
            openai_api_key: required("OPENAI_API_KEY")?,
            openai_model: optional("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            openai_api_base: optional("OPENAI_API_BASE")
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            search_terms: parse_keywords(
                &optional("SEARCH_TERMS").unwrap_or_else(|| DEFAULT_SEARCH_TERMS.to_string()),
            ),
            max_results: parse_number("MAX_RESULTS", DEFAULT_MAX_RESULTS)?,
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    optional(name).ok_or(ConfigError::Missing(name))
}

fn optional(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_number<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(name) {
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidNumber(name, raw)),
        None => Ok(default),
    }
}

/// Comma-separated keyword list. Whitespace and surrounding quotes are
/// stripped (the original configuration carried shell-style quoting);
/// phrase quoting for multi-word keywords happens at query time.
fn parse_keywords(raw: &str) -> Vec<String> {
    raw.trim()
        .trim_matches('\'')
        .split(',')
        .map(|term| term.trim().trim_matches('"').trim().to_string())
        .filter(|term| !term.is_empty())
        .collect()
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}
