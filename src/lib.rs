pub mod aggregate;
pub mod case;
pub mod chunk;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod emotion;
pub mod history;
pub mod inference;
pub mod pipeline;
pub mod probe;
pub mod respond;
pub mod sentiment;
pub mod tasks;

#[derive(Debug)]
pub enum MoodError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Config(String),
    Http(String),
    /// Inference failed or returned an unusable payload for a chunk (0-based index).
    Probe { chunk: usize, reason: String },
    InvalidInput(String),
}

impl std::fmt::Display for MoodError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MoodError::Io(e) => write!(f, "io: {e}"),
            MoodError::Json(e) => write!(f, "json: {e}"),
            MoodError::Config(msg) => write!(f, "config: {msg}"),
            MoodError::Http(msg) => write!(f, "http: {msg}"),
            MoodError::Probe { chunk, reason } => {
                write!(f, "sentiment probe failed on chunk {}: {reason}", chunk + 1)
            }
            MoodError::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
        }
    }
}

impl std::error::Error for MoodError {}

impl From<std::io::Error> for MoodError {
    fn from(e: std::io::Error) -> Self {
        MoodError::Io(e)
    }
}

impl From<serde_json::Error> for MoodError {
    fn from(e: serde_json::Error) -> Self {
        MoodError::Json(e)
    }
}
