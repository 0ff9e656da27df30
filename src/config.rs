use crate::MoodError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Default, Clone)]
pub struct MoodConfig {
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub inference: InferenceConfig,
    #[serde(default)]
    pub response: ResponseConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub tasks: TasksConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub size: usize,
    /// Chunk every entry even when the caller did not ask for it.
    #[serde(default = "default_true")]
    pub always_chunk: bool,
    #[serde(default = "default_conjunctions")]
    pub conjunctions: Vec<String>,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            size: default_chunk_size(),
            always_chunk: true,
            conjunctions: default_conjunctions(),
        }
    }
}

fn default_chunk_size() -> usize {
    300
}

fn default_true() -> bool {
    true
}

fn default_conjunctions() -> Vec<String> {
    ["and", "but", "or", "so", "và", "nhưng", "hoặc", "nên", "rồi"]
        .into_iter()
        .map(String::from)
        .collect()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClassifierConfig {
    #[serde(default = "default_uncertain_margin")]
    pub uncertain_margin: f64,
    #[serde(default = "default_strong_threshold")]
    pub strong_threshold: f64,
    #[serde(default = "default_reversal_connectives")]
    pub reversal_connectives: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            uncertain_margin: default_uncertain_margin(),
            strong_threshold: default_strong_threshold(),
            reversal_connectives: default_reversal_connectives(),
        }
    }
}

fn default_uncertain_margin() -> f64 {
    0.1
}

fn default_strong_threshold() -> f64 {
    0.6
}

fn default_reversal_connectives() -> Vec<String> {
    [
        "but",
        "however",
        "yet",
        "on the contrary",
        "although",
        "nhưng",
        "tuy nhiên",
        "thế nhưng",
        "ngược lại",
        "mặc dù",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[derive(Debug, Deserialize, Clone)]
pub struct InferenceConfig {
    #[serde(default = "default_inference_endpoint")]
    pub endpoint: String,
    /// Falls back to `HF_API_TOKEN` when unset.
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_inference_endpoint(),
            api_token: None,
            timeout_secs: default_timeout(),
        }
    }
}

impl InferenceConfig {
    pub fn resolved_token(&self) -> Option<String> {
        self.api_token
            .clone()
            .or_else(|| std::env::var("HF_API_TOKEN").ok())
            .filter(|t| !t.is_empty())
    }
}

fn default_inference_endpoint() -> String {
    "https://zonecb-my-sentiment-v2.hf.space/predict".into()
}

fn default_timeout() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResponseConfig {
    #[serde(default = "default_response_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_response_model")]
    pub model: String,
    /// Falls back to `OPENAI_API_KEY` when unset.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Value recorded as `advice_source` for generated replies.
    #[serde(default = "default_response_source")]
    pub source: String,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            endpoint: default_response_endpoint(),
            model: default_response_model(),
            api_key: None,
            timeout_secs: default_timeout(),
            source: default_response_source(),
        }
    }
}

impl ResponseConfig {
    pub fn resolved_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|k| !k.is_empty())
    }
}

fn default_response_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".into()
}

fn default_response_model() -> String {
    std::env::var("GPT_RESPONSE_MODEL_ID").unwrap_or_else(|_| "gpt-4o-mini".into())
}

fn default_response_source() -> String {
    "student_mood_gpt".into()
}

#[derive(Debug, Deserialize, Clone)]
pub struct HistoryConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Past entries recalled into the reply prompt.
    #[serde(default = "default_context_examples")]
    pub context_examples: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: None,
            context_examples: default_context_examples(),
        }
    }
}

fn default_context_examples() -> usize {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct TasksConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_confidence: default_min_confidence(),
        }
    }
}

fn default_min_confidence() -> f64 {
    0.6
}

/// Load config from MOODLOG_CONFIG env var, ~/.moodlog/config.toml, or defaults.
pub fn load_config() -> Result<MoodConfig, MoodError> {
    let path = config_path();
    match path {
        Some(p) if p.exists() => {
            let content = std::fs::read_to_string(&p)?;
            let config: MoodConfig = toml::from_str(&content)
                .map_err(|e| MoodError::Config(format!("{}: {e}", p.display())))?;
            validate_config(&config)?;
            Ok(config)
        }
        _ => Ok(MoodConfig::default()),
    }
}

fn config_path() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("MOODLOG_CONFIG") {
        return Some(PathBuf::from(p));
    }
    moodlog_dir().map(|d| d.join("config.toml"))
}

pub fn moodlog_dir() -> Option<PathBuf> {
    let home = std::env::var("HOME").ok()?;
    Some(Path::new(&home).join(".moodlog"))
}

/// History file: explicit override > config > ~/.moodlog/pipeline_history.json.
pub fn resolve_history_path(config: &MoodConfig, cli_override: Option<PathBuf>) -> PathBuf {
    cli_override
        .or_else(|| config.history.path.clone())
        .or_else(|| moodlog_dir().map(|d| d.join("pipeline_history.json")))
        .unwrap_or_else(|| PathBuf::from("pipeline_history.json"))
}

fn validate_config(config: &MoodConfig) -> Result<(), MoodError> {
    if config.chunking.size == 0 {
        return Err(MoodError::Config("chunking.size must be positive".into()));
    }
    let unit = |name: &str, v: f64| {
        if (0.0..=1.0).contains(&v) {
            Ok(())
        } else {
            Err(MoodError::Config(format!("{name} must be within [0, 1], got {v}")))
        }
    };
    unit("classifier.uncertain_margin", config.classifier.uncertain_margin)?;
    unit("classifier.strong_threshold", config.classifier.strong_threshold)?;
    unit("tasks.min_confidence", config.tasks.min_confidence)?;

    for (i, c) in config.chunking.conjunctions.iter().enumerate() {
        if c.trim().is_empty() {
            return Err(MoodError::Config(format!("chunking.conjunctions[{i}] is blank")));
        }
    }
    for (i, c) in config.classifier.reversal_connectives.iter().enumerate() {
        if c.trim().is_empty() {
            return Err(MoodError::Config(format!(
                "classifier.reversal_connectives[{i}] is blank"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_when_no_file() {
        let config = MoodConfig::default();
        assert_eq!(config.chunking.size, 300);
        assert!(config.chunking.always_chunk);
        assert_eq!(config.classifier.uncertain_margin, 0.1);
        assert_eq!(config.classifier.strong_threshold, 0.6);
        assert!(config.classifier.reversal_connectives.iter().any(|c| c == "however"));
        assert_eq!(config.history.context_examples, 3);
        assert!(config.tasks.enabled);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
[chunking]
size = 120
always_chunk = false
conjunctions = ["and", "but"]

[classifier]
uncertain_margin = 0.05
strong_threshold = 0.7
reversal_connectives = ["however"]

[inference]
endpoint = "http://localhost:8000/predict"
api_token = "hf_test"
timeout_secs = 5

[response]
endpoint = "http://localhost:1234/v1/chat/completions"
model = "local-model"
source = "local_llm"

[history]
path = "/tmp/moodlog/history.json"
context_examples = 5

[tasks]
enabled = false
min_confidence = 0.75
"#;
        let config: MoodConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.chunking.size, 120);
        assert!(!config.chunking.always_chunk);
        assert_eq!(config.chunking.conjunctions, vec!["and", "but"]);
        assert_eq!(config.classifier.uncertain_margin, 0.05);
        assert_eq!(config.classifier.reversal_connectives, vec!["however"]);
        assert_eq!(config.inference.endpoint, "http://localhost:8000/predict");
        assert_eq!(config.inference.resolved_token().as_deref(), Some("hf_test"));
        assert_eq!(config.inference.timeout_secs, 5);
        assert_eq!(config.response.model, "local-model");
        assert_eq!(config.response.source, "local_llm");
        assert_eq!(
            config.history.path,
            Some(PathBuf::from("/tmp/moodlog/history.json"))
        );
        assert_eq!(config.history.context_examples, 5);
        assert!(!config.tasks.enabled);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn partial_section_keeps_defaults() {
        let config: MoodConfig = toml::from_str(
            r#"
[chunking]
size = 80
"#,
        )
        .unwrap();
        assert_eq!(config.chunking.size, 80);
        assert!(config.chunking.always_chunk);
        assert!(config.chunking.conjunctions.iter().any(|c| c == "nhưng"));
        assert_eq!(config.inference.timeout_secs, 30);
    }

    #[test]
    fn inference_section_is_endpoint_only() {
        // The hosted endpoint fixes the model; a leftover `model` key is ignored
        let config: MoodConfig = toml::from_str(
            r#"
[inference]
endpoint = "http://localhost:8000/predict"
model = "some/other-model"
"#,
        )
        .unwrap();
        assert_eq!(config.inference.endpoint, "http://localhost:8000/predict");
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn zero_chunk_size_rejected() {
        let config: MoodConfig = toml::from_str("[chunking]\nsize = 0\n").unwrap();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn threshold_out_of_range_rejected() {
        let config: MoodConfig =
            toml::from_str("[classifier]\nstrong_threshold = 1.5\n").unwrap();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("strong_threshold"));
    }

    #[test]
    fn blank_connective_rejected() {
        let config: MoodConfig =
            toml::from_str("[classifier]\nreversal_connectives = [\"but\", \" \"]\n").unwrap();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn cli_history_path_wins() {
        let config: MoodConfig =
            toml::from_str("[history]\npath = \"/from/config.json\"\n").unwrap();
        assert_eq!(
            resolve_history_path(&config, Some(PathBuf::from("/from/cli.json"))),
            PathBuf::from("/from/cli.json")
        );
        assert_eq!(
            resolve_history_path(&config, None),
            PathBuf::from("/from/config.json")
        );
    }
}
