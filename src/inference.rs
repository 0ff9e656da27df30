//! Sentiment inference collaborator. The pipeline only sees the
//! [`Inference`] trait; [`HttpInference`] talks to a hosted model.

use crate::config::InferenceConfig;
use crate::probe::RawProbe;
use crate::MoodError;
use std::time::Duration;

/// Run the sentiment model on one chunk of text.
pub trait Inference {
    fn infer(&self, text: &str) -> Result<RawProbe, MoodError>;
}

pub struct HttpInference {
    agent: ureq::Agent,
    endpoint: String,
    token: Option<String>,
}

impl HttpInference {
    pub fn new(config: &InferenceConfig) -> Self {
        let agent = ureq::Agent::new_with_config(
            ureq::config::Config::builder()
                .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
                .build(),
        );
        HttpInference {
            agent,
            endpoint: config.endpoint.clone(),
            token: config.resolved_token(),
        }
    }
}

impl Inference for HttpInference {
    fn infer(&self, text: &str) -> Result<RawProbe, MoodError> {
        let body = serde_json::json!({ "text": text });

        let mut request = self.agent.post(&self.endpoint);
        if let Some(token) = &self.token {
            request = request.header("Authorization", &format!("Bearer {token}"));
        }

        let mut response = request
            .send_json(&body)
            .map_err(|e| MoodError::Http(format!("sentiment request: {e}")))?;
        let reply: serde_json::Value = response
            .body_mut()
            .read_json()
            .map_err(|e| MoodError::Http(format!("sentiment response: {e}")))?;

        RawProbe::from_json(&reply).ok_or_else(|| {
            MoodError::Http(format!(
                "unrecognized sentiment payload: {}",
                preview(&reply.to_string(), 120)
            ))
        })
    }
}

fn preview(s: &str, max: usize) -> String {
    let mut out: String = s.chars().take(max).collect();
    if s.chars().count() > max {
        out.push('…');
    }
    out
}
