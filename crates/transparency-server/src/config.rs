use crate::error::AppError;

const DEFAULT_QUESTION_MODEL: &str = "llama-3.1-8b-instant";
const DEFAULT_QUESTION_TEMPERATURE: f32 = 0.7;
const DEFAULT_QUESTION_MAX_TOKENS: u32 = 100;

#[derive(Debug, Clone)]
pub struct Config {
    pub redis_url: Option<String>,
    pub tcp_listen_addr: Option<String>,
    pub question: QuestionSettings,
    pub rate_limit_rps: Option<u32>,
}

/// Chat completion parameters for question generation.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for QuestionSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_QUESTION_MODEL.to_string(),
            temperature: DEFAULT_QUESTION_TEMPERATURE,
            max_tokens: DEFAULT_QUESTION_MAX_TOKENS,
        }
    }
}

impl Config {
    /// All settings are optional:
    /// - `REDIS_URL` (unset: records are kept in memory)
    /// - `MCP_TCP_LISTEN_ADDR` (unset: serve on stdio)
    /// - `QUESTION_MODEL` (default: "llama-3.1-8b-instant")
    /// - `QUESTION_TEMPERATURE` (default: 0.7, must be within 0..=2)
    /// - `QUESTION_MAX_TOKENS` (default: 100)
    /// - `RATE_LIMIT_RPS` (unset or 0: no limit on question generation)
    ///
    /// LLM connection settings are read separately by `OpenAiClientConfig::from_env`.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let temperature = non_empty("QUESTION_TEMPERATURE")
            .and_then(|s| s.trim().parse::<f32>().ok())
            .unwrap_or(DEFAULT_QUESTION_TEMPERATURE);
        if !(0.0..=2.0).contains(&temperature) {
            return Err(AppError::Config(format!(
                "QUESTION_TEMPERATURE must be between 0 and 2, got {temperature}"
            )));
        }

        let question = QuestionSettings {
            model: non_empty("QUESTION_MODEL")
                .map(|m| m.trim().to_string())
                .unwrap_or_else(|| DEFAULT_QUESTION_MODEL.to_string()),
            temperature,
            max_tokens: non_empty("QUESTION_MAX_TOKENS")
                .and_then(|s| s.trim().parse::<u32>().ok())
                .filter(|&n| n > 0)
                .unwrap_or(DEFAULT_QUESTION_MAX_TOKENS),
        };

        Ok(Self {
            redis_url: non_empty("REDIS_URL"),
            tcp_listen_addr: non_empty("MCP_TCP_LISTEN_ADDR"),
            question,
            rate_limit_rps: non_empty("RATE_LIMIT_RPS")
                .and_then(|s| s.trim().parse::<u32>().ok())
                .filter(|&n| n > 0),
        })
    }
}
