//! Process configuration, read once at startup from the environment.
//!
//! Every setting has a documented default so the server runs with zero
//! configuration in development; production deployments override via
//! `EVA_*` environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const APP_NAME: &str = "Eva";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
    pub bind_addr: SocketAddr,
    pub llm_base_url: String,
    pub llm_model: String,
    pub llm_timeout: Duration,
    pub tts_base_url: String,
    pub tts_voice: String,
    pub tts_timeout: Duration,
    pub stt_base_url: String,
    pub stt_language: String,
    pub stt_timeout: Duration,
    pub object_store_root: PathBuf,
}

impl Config {
    /// Loads from the environment, falling back to locally-reachable
    /// defaults (a loopback Ollama/TTS/STT sidecar and a data directory
    /// under the user's home) for zero-configuration local development.
    pub fn from_env() -> Self {
        Self {
            database_path: env_path("EVA_DATABASE_PATH", default_data_dir().join("eva.sqlite3")),
            bind_addr: env_parsed("EVA_BIND_ADDR", "127.0.0.1:8787".parse().expect("valid default bind addr")),
            llm_base_url: env_string("EVA_LLM_BASE_URL", "http://127.0.0.1:11434"),
            llm_model: env_string("EVA_LLM_MODEL", "llama3"),
            llm_timeout: env_duration_secs("EVA_LLM_TIMEOUT_SECS", 60),
            tts_base_url: env_string("EVA_TTS_BASE_URL", "http://127.0.0.1:5002"),
            tts_voice: env_string("EVA_TTS_VOICE", "hu-HU-female"),
            tts_timeout: env_duration_secs("EVA_TTS_TIMEOUT_SECS", 60),
            stt_base_url: env_string("EVA_STT_BASE_URL", "http://127.0.0.1:5003"),
            stt_language: env_string("EVA_STT_LANGUAGE", "hu-HU"),
            stt_timeout: env_duration_secs("EVA_STT_TIMEOUT_SECS", 60),
            object_store_root: env_path("EVA_OBJECT_STORE_ROOT", default_data_dir().join("blobs")),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir().expect("cannot determine home directory").join(".eva")
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_path(key: &str, default: PathBuf) -> PathBuf {
    std::env::var(key).map(PathBuf::from).unwrap_or(default)
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_duration_secs(key: &str, default_secs: u64) -> Duration {
    Duration::from_secs(env_parsed(key, default_secs))
}

/// The `RUST_LOG`-style filter used when the environment doesn't set one.
pub fn default_log_filter() -> String {
    format!("{}=info,tower_http=info", env!("CARGO_PKG_NAME"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_addr_falls_back_to_documented_default_when_unset() {
        std::env::remove_var("EVA_BIND_ADDR");
        let config = Config::from_env();
        assert_eq!(config.bind_addr.port(), 8787);
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, env!("CARGO_PKG_VERSION"));
    }
}
