// src/config.rs
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";

const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are the assistant for a software \
engineer's personal portfolio site. Answer questions about the projects, skills \
and experience presented on the page. Be professional but not stiff, keep \
responses direct, use Markdown for clarity, and suggest reaching out via the \
contact section when someone wants to talk shop or hire.";

/// Process-wide configuration, read once at startup and immutable afterwards.
#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub api_key: String,
    pub model: String,
    pub api_base_url: String,
    pub system_instruction: String,
    pub reply_timeout: Duration,
    pub static_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let api_key = env::var("GEMINI_API_KEY")
            .context("GEMINI_API_KEY must be set")?
            .trim()
            .to_string();
        if api_key.is_empty() {
            anyhow::bail!("GEMINI_API_KEY must not be empty");
        }

        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(3000);

        let reply_timeout_secs = env::var("REPLY_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);

        Ok(Self {
            port,
            api_key,
            model: env_or("GEMINI_MODEL", DEFAULT_MODEL),
            api_base_url: env_or("GEMINI_BASE_URL", DEFAULT_BASE_URL),
            system_instruction: env_or("SYSTEM_INSTRUCTION", DEFAULT_SYSTEM_INSTRUCTION),
            reply_timeout: Duration::from_secs(reply_timeout_secs),
            static_dir: PathBuf::from(env_or("STATIC_DIR", "public")),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    match env::var(key) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => default.to_string(),
    }
}
