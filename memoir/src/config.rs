use serde::Deserialize;
use std::env;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

fn parse_env_opt<T: std::str::FromStr>(var: &str) -> Option<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) if val.trim().is_empty() => None,
        Ok(val) => match val.parse() {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Ignoring.", val, var, e);
                None
            }
        },
        Err(_) => None,
    }
}

fn non_empty_env(var: &str) -> Option<String> {
    env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub embeddings: EmbeddingsConfig,
    pub llm: LlmConfig,
    pub diary: DiaryConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub api_keys: Vec<String>,
    pub log_format: LogFormat,
    /// Upper bound on request bodies, in bytes.
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub auth_token: Option<String>,
    pub local_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingsConfig {
    pub model: String,
    pub dimensions: usize,
    pub batch_size: usize,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

/// Chat model used for replies, tag extraction, and guided reflection.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub temperature: Option<f32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gemini/gemini-2.0-flash".to_string(),
            api_key: None,
            base_url: None,
            timeout_secs: 60,
            max_retries: 0,
            temperature: None,
        }
    }
}

/// Behaviour of the diary itself.
#[derive(Debug, Clone, Deserialize)]
pub struct DiaryConfig {
    /// Chat turns kept when building a prompt.
    pub history_turns: usize,
    /// Memory records returned by a recall.
    pub recall_top_k: usize,
    /// Minimum cosine similarity for a memory record to count as related.
    pub recall_threshold: f32,
    /// Most recent entries quoted verbatim in the past-self prompt.
    pub past_self_recent_entries: usize,
    /// Question rounds in a guided reflection.
    pub reflection_rounds: usize,
    /// Values per tag type in the knowledge snapshot.
    pub snapshot_values_per_type: usize,
    /// Forces every reply into this language when set.
    pub response_language: Option<String>,
    pub session_capacity: usize,
    pub session_idle_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: env::var("MEMOIR_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
                port: parse_env_or("MEMOIR_PORT", 3000),
                api_keys: env::var("MEMOIR_API_KEYS")
                    .map(|keys| {
                        keys.split(',')
                            .map(|s| s.trim().to_string())
                            .filter(|s| !s.is_empty())
                            .collect()
                    })
                    .unwrap_or_default(),
                log_format: parse_env_or("LOG_FORMAT", LogFormat::Pretty),
                max_body_bytes: parse_env_or("MAX_BODY_BYTES", 256 * 1024),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or_else(|_| "file:memoir.db".to_string()),
                auth_token: env::var("DATABASE_AUTH_TOKEN").ok(),
                local_path: env::var("DATABASE_LOCAL_PATH").ok(),
            },
            embeddings: EmbeddingsConfig {
                model: env::var("EMBEDDING_MODEL")
                    .unwrap_or_else(|_| "BAAI/bge-small-en-v1.5".to_string()),
                dimensions: parse_env_or("EMBEDDING_DIMENSIONS", 384),
                batch_size: parse_env_or("EMBEDDING_BATCH_SIZE", 64),
                api_key: non_empty_env("EMBEDDING_API_KEY"),
                base_url: non_empty_env("EMBEDDING_BASE_URL"),
                timeout_secs: parse_env_or("EMBEDDING_TIMEOUT", 30),
                max_retries: parse_env_or("EMBEDDING_MAX_RETRIES", 2),
            },
            llm: LlmConfig {
                model: env::var("LLM_MODEL")
                    .unwrap_or_else(|_| "gemini/gemini-2.0-flash".to_string()),
                api_key: non_empty_env("LLM_API_KEY").or_else(|| non_empty_env("GEMINI_API_KEY")),
                base_url: non_empty_env("LLM_BASE_URL"),
                timeout_secs: parse_env_or("LLM_TIMEOUT", 60),
                max_retries: parse_env_or("LLM_MAX_RETRIES", 0),
                temperature: parse_env_opt("LLM_TEMPERATURE"),
            },
            diary: DiaryConfig {
                history_turns: parse_env_or("HISTORY_TURNS", 10),
                recall_top_k: parse_env_or("RECALL_TOP_K", 5),
                recall_threshold: parse_env_or("RECALL_THRESHOLD", 0.0),
                past_self_recent_entries: parse_env_or("PAST_SELF_RECENT_ENTRIES", 20),
                reflection_rounds: parse_env_or("REFLECTION_ROUNDS", 3),
                snapshot_values_per_type: parse_env_or("SNAPSHOT_VALUES_PER_TYPE", 3),
                response_language: non_empty_env("DIARY_LANGUAGE"),
                session_capacity: parse_env_or("SESSION_CAPACITY", 64),
                session_idle_timeout_secs: parse_env_or("SESSION_IDLE_TIMEOUT_SECS", 6 * 3600),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}

/// Known embedding providers that use OpenAI-compatible APIs
const KNOWN_PROVIDERS: &[&str] = &["openai", "openrouter", "ollama", "lmstudio", "gemini", "local"];

/// Known LLM providers that use OpenAI-compatible APIs
pub const KNOWN_LLM_PROVIDERS: &[&str] = &["openai", "openrouter", "ollama", "lmstudio", "gemini"];

/// Parse a model name into (provider, model) tuple.
pub fn parse_provider_model(model: &str) -> (&str, &str) {
    if let Some((prefix, rest)) = model.split_once('/') {
        let prefix_lower = prefix.to_lowercase();
        if KNOWN_PROVIDERS.contains(&prefix_lower.as_str()) {
            return (prefix, rest);
        }
    }
    ("local", model)
}

/// Parse an LLM model name into (provider, model) tuple.
pub fn parse_llm_provider_model(model: &str) -> (&str, &str) {
    if let Some((prefix, rest)) = model.split_once('/') {
        let prefix_lower = prefix.to_lowercase();
        if KNOWN_LLM_PROVIDERS.contains(&prefix_lower.as_str()) {
            return (prefix, rest);
        }
    }
    ("local", model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const DIARY_VARS: &[&str] = &[
        "HISTORY_TURNS",
        "RECALL_TOP_K",
        "REFLECTION_ROUNDS",
        "DIARY_LANGUAGE",
        "LLM_MODEL",
        "LLM_API_KEY",
        "GEMINI_API_KEY",
        "LLM_MAX_RETRIES",
    ];

    fn clear_vars() {
        for var in DIARY_VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_diary_defaults() {
        clear_vars();

        let config = Config::default();
        assert_eq!(config.diary.history_turns, 10);
        assert_eq!(config.diary.recall_top_k, 5);
        assert_eq!(config.diary.past_self_recent_entries, 20);
        assert_eq!(config.diary.reflection_rounds, 3);
        assert_eq!(config.diary.snapshot_values_per_type, 3);
        assert!(config.diary.response_language.is_none());
    }

    #[test]
    #[serial]
    fn test_llm_defaults_to_gemini_without_retries() {
        clear_vars();

        let config = Config::default();
        assert_eq!(config.llm.model, "gemini/gemini-2.0-flash");
        assert_eq!(config.llm.max_retries, 0);
        assert!(config.llm.api_key.is_none());
    }

    #[test]
    #[serial]
    fn test_gemini_key_is_used_as_fallback() {
        clear_vars();
        std::env::set_var("GEMINI_API_KEY", "gem-key");

        let config = Config::default();
        assert_eq!(config.llm.api_key.as_deref(), Some("gem-key"));

        std::env::set_var("LLM_API_KEY", "explicit");
        let config = Config::default();
        assert_eq!(config.llm.api_key.as_deref(), Some("explicit"));

        clear_vars();
    }

    #[test]
    #[serial]
    fn test_invalid_values_fall_back_to_defaults() {
        clear_vars();
        std::env::set_var("HISTORY_TURNS", "ten");
        std::env::set_var("DIARY_LANGUAGE", "  ");

        let config = Config::default();
        assert_eq!(config.diary.history_turns, 10);
        assert!(config.diary.response_language.is_none());

        clear_vars();
    }

    #[test]
    fn test_parse_llm_provider_model() {
        assert_eq!(
            parse_llm_provider_model("gemini/gemini-2.0-flash"),
            ("gemini", "gemini-2.0-flash")
        );
        assert_eq!(
            parse_llm_provider_model("openai/gpt-4o-mini"),
            ("openai", "gpt-4o-mini")
        );
        assert_eq!(
            parse_llm_provider_model("meta-llama/llama-3"),
            ("local", "meta-llama/llama-3")
        );
    }

    #[test]
    fn test_parse_provider_model_defaults_to_local() {
        assert_eq!(
            parse_provider_model("BAAI/bge-small-en-v1.5"),
            ("local", "BAAI/bge-small-en-v1.5")
        );
        assert_eq!(
            parse_provider_model("ollama/nomic-embed-text"),
            ("ollama", "nomic-embed-text")
        );
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!("json".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!("TEXT".parse::<LogFormat>(), Ok(LogFormat::Pretty));
        assert!("yaml".parse::<LogFormat>().is_err());
    }
}
