//! Reply generation: prompt assembly plus an OpenAI-compatible chat client.

use crate::case::CaseType;
use crate::config::ResponseConfig;
use crate::sentiment::{Label, LabelDistribution};
use crate::MoodError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Advice source recorded when generation failed and the fixed text was used.
pub const FALLBACK_SOURCE: &str = "fallback";

pub const FALLBACK_TEXT: &str =
    "I'm having a little trouble right now, but I'm still here to listen to you 🌿.";

const SYSTEM_PROMPT: &str = r#"You are "Student Mood GPT", a warm, empathetic, non-judgmental companion for students keeping a mood journal. You act like an older mentor who listens first and advises gently.

You receive a structured summary of a journal entry. Reply with ONLY the response text, 2-4 sentences, optionally with one gentle emoji.

- positive: celebrate with the writer, acknowledge their effort, encourage them to keep it up. Never bring up stress or exhaustion.
- negative: comfort immediately, stress that the feeling is valid and they are not alone, suggest one small action (a deep breath, a five-minute break, writing it down). Never order ("you must") and never minimize.
- neutral: acknowledge calmly and leave room to share more. Do not push the mood either way.
- mixed or shifting feelings: name both sides before responding to the one that matters now.

Safety: never diagnose. If the entry signals self-harm or crisis, ignore the rules above and reply only with a short safety message urging the writer to contact a trusted person or a local crisis hotline. Avoid politics, religion, and violence."#;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,
    pub source: String,
}

impl Reply {
    pub fn fallback() -> Self {
        Reply {
            text: FALLBACK_TEXT.to_string(),
            source: FALLBACK_SOURCE.to_string(),
        }
    }
}

/// Produce a reply for an assembled prompt.
pub trait Responder {
    fn generate(&self, prompt: &str) -> Result<Reply, MoodError>;
}

/// Everything the reply prompt is built from.
pub struct PromptInput<'a> {
    pub text: &'a str,
    pub label: Label,
    pub distribution: &'a LabelDistribution,
    pub emotion: &'a str,
    pub case_type: CaseType,
    pub past_context: Option<&'a str>,
    pub task_hint: Option<&'a str>,
}

pub fn build_prompt(input: &PromptInput<'_>) -> String {
    let mut out = String::new();
    out.push_str(&format!("Journal entry: {}\n", input.text));
    out.push_str(&format!(
        "Overall sentiment: {} ({})\n",
        input.label, input.distribution
    ));
    out.push_str(&format!("Emotion: {}\n", input.emotion));
    out.push_str(&format!("Sentiment shape: {}\n", input.case_type));

    if let Some(ctx) = input.past_context.filter(|c| !c.trim().is_empty()) {
        out.push_str("\nRelated past entries:\n");
        out.push_str(ctx);
        out.push('\n');
    }

    if let Some(hint) = input.task_hint {
        out.push('\n');
        out.push_str(hint);
        out.push('\n');
    }

    out.push_str("\nWrite a short, warm, natural reply to the writer.");
    out
}

pub struct ChatResponder {
    agent: ureq::Agent,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    source: String,
}

impl ChatResponder {
    pub fn new(config: &ResponseConfig) -> Self {
        let agent = ureq::Agent::new_with_config(
            ureq::config::Config::builder()
                .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
                .build(),
        );
        ChatResponder {
            agent,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: config.resolved_key(),
            source: config.source.clone(),
        }
    }
}

impl Responder for ChatResponder {
    fn generate(&self, prompt: &str) -> Result<Reply, MoodError> {
        let Some(key) = &self.api_key else {
            return Err(MoodError::Config("no response API key configured".into()));
        };

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": prompt},
            ],
        });

        let mut response = self
            .agent
            .post(&self.endpoint)
            .header("Authorization", &format!("Bearer {key}"))
            .send_json(&body)
            .map_err(|e| MoodError::Http(format!("response request: {e}")))?;
        let resp: serde_json::Value = response
            .body_mut()
            .read_json()
            .map_err(|e| MoodError::Http(format!("response body: {e}")))?;

        let text = resp
            .pointer("/choices/0/message/content")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| MoodError::Http("no content in chat completion response".into()))?;

        let cleaned = clean_reply(text);
        if cleaned.is_empty() {
            return Err(MoodError::Http("empty chat completion".into()));
        }

        Ok(Reply {
            text: cleaned,
            source: self.source.clone(),
        })
    }
}

/// Turn literal `\n` escapes into newlines and drop zero-width joiners.
fn clean_reply(text: &str) -> String {
    text.replace("\\n", "\n")
        .replace('\u{200d}', "")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input<'a>(dist: &'a LabelDistribution) -> PromptInput<'a> {
        PromptInput {
            text: "Failed the quiz but dinner with friends was great.",
            label: Label::Positive,
            distribution: dist,
            emotion: "sad, joyful",
            case_type: CaseType::PolarityShift,
            past_context: None,
            task_hint: None,
        }
    }

    #[test]
    fn prompt_carries_the_verdict() {
        let dist = LabelDistribution::from_probs(&[0.1, 0.1, 0.8]);
        let prompt = build_prompt(&input(&dist));
        assert!(prompt.contains("Journal entry: Failed the quiz"));
        assert!(prompt.contains("Overall sentiment: positive (negative 10.0%, neutral 10.0%, positive 80.0%)"));
        assert!(prompt.contains("Emotion: sad, joyful"));
        assert!(prompt.contains("Sentiment shape: polarity_shift"));
        assert!(!prompt.contains("Related past entries"));
    }

    #[test]
    fn prompt_includes_context_and_task_hint() {
        let dist = LabelDistribution::from_probs(&[0.1, 0.1, 0.8]);
        let mut p = input(&dist);
        p.past_context = Some("- [2025-11-20 10:22:00] Music helped me relax.");
        p.task_hint = Some("Pending task: study for exam.");
        let prompt = build_prompt(&p);
        assert!(prompt.contains("Related past entries:\n- [2025-11-20 10:22:00] Music helped me relax."));
        assert!(prompt.contains("Pending task: study for exam."));
    }

    #[test]
    fn blank_context_is_omitted() {
        let dist = LabelDistribution::from_probs(&[0.1, 0.1, 0.8]);
        let mut p = input(&dist);
        p.past_context = Some("  ");
        assert!(!build_prompt(&p).contains("Related past entries"));
    }

    #[test]
    fn reply_cleanup() {
        assert_eq!(clean_reply("  Hi!\\nTake care\u{200d} "), "Hi!\nTake care");
    }

    #[test]
    fn missing_key_is_an_error() {
        let config = ResponseConfig {
            api_key: None,
            ..Default::default()
        };
        let mut responder = ChatResponder::new(&config);
        responder.api_key = None;
        assert!(matches!(
            responder.generate("hello"),
            Err(MoodError::Config(_))
        ));
    }

    #[test]
    fn fallback_reply_is_marked() {
        let reply = Reply::fallback();
        assert_eq!(reply.source, FALLBACK_SOURCE);
        assert_eq!(reply.text, FALLBACK_TEXT);
    }
}
