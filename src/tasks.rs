//! Task extraction: spots pending work (exams, presentations, deadlines)
//! in an entry so the reply can offer to break it into small steps.

use crate::MoodError;
use regex::Regex;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskCandidate {
    pub action: String,
    pub description: String,
    pub source_text: String,
    pub confidence: f64,
    pub context_tags: Vec<String>,
    pub deadline: Option<String>,
}

pub trait TaskExtractor {
    fn extract(&self, text: &str) -> Vec<TaskCandidate>;
}

struct TaskRule {
    pattern: Regex,
    action: &'static str,
    description: &'static str,
    confidence: f64,
    tags: &'static [&'static str],
}

/// Keyword rules over English and Vietnamese, matched as whole words.
pub struct RuleTaskExtractor {
    rules: Vec<TaskRule>,
    weekday_vi: Regex,
    weekday_en: Regex,
    tomorrow: Regex,
    today: Regex,
}

fn word_pattern(words: &[&str]) -> Result<Regex, MoodError> {
    let alternation = words
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternation})\b"))
        .map_err(|e| MoodError::Config(format!("task pattern: {e}")))
}

impl RuleTaskExtractor {
    pub fn new() -> Result<Self, MoodError> {
        let rules = vec![
            TaskRule {
                pattern: word_pattern(&["exam", "exams", "test", "quiz", "midterm", "final", "thi", "kiểm tra"])?,
                action: "Review for the exam",
                description: "Go over one chapter or try one short practice paper.",
                confidence: 0.7,
                tags: &["exam"],
            },
            TaskRule {
                pattern: word_pattern(&["slide", "slides", "presentation", "present", "thuyết trình"])?,
                action: "Prepare the presentation slides",
                description: "Draft the outline and the intro first.",
                confidence: 0.75,
                tags: &["slide", "presentation"],
            },
            TaskRule {
                pattern: word_pattern(&["deadline", "due", "submit", "submission", "nộp"])?,
                action: "Finish the assignment",
                description: "Do one small part first.",
                confidence: 0.8,
                tags: &["deadline"],
            },
        ];

        Ok(RuleTaskExtractor {
            rules,
            weekday_vi: Regex::new(r"(?i)\bthứ\s*(\d+)")
                .map_err(|e| MoodError::Config(format!("task pattern: {e}")))?,
            weekday_en: word_pattern(&[
                "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
            ])?,
            tomorrow: word_pattern(&["tomorrow", "mai", "ngày mai"])?,
            today: word_pattern(&["today", "tonight", "hôm nay", "tối nay"])?,
        })
    }

    /// Rough deadline phrase: `tomorrow`, `today`, `thứ N`, or a weekday name.
    pub fn detect_deadline(&self, text: &str) -> Option<String> {
        if self.tomorrow.is_match(text) {
            return Some("tomorrow".into());
        }
        if self.today.is_match(text) {
            return Some("today".into());
        }
        if let Some(caps) = self.weekday_vi.captures(text) {
            return Some(format!("thứ {}", &caps[1]));
        }
        self.weekday_en
            .find(text)
            .map(|m| m.as_str().to_lowercase())
    }
}

impl TaskExtractor for RuleTaskExtractor {
    fn extract(&self, text: &str) -> Vec<TaskCandidate> {
        let deadline = self.detect_deadline(text);
        self.rules
            .iter()
            .filter(|r| r.pattern.is_match(text))
            .map(|r| TaskCandidate {
                action: r.action.to_string(),
                description: r.description.to_string(),
                source_text: text.to_string(),
                confidence: r.confidence,
                context_tags: r.tags.iter().map(|t| t.to_string()).collect(),
                deadline: deadline.clone(),
            })
            .collect()
    }
}

/// Highest-confidence candidate; the earliest wins a tie.
pub fn select_task(candidates: &[TaskCandidate]) -> Option<&TaskCandidate> {
    candidates.iter().fold(None, |best: Option<&TaskCandidate>, c| match best {
        Some(b) if b.confidence >= c.confidence => Some(b),
        _ => Some(c),
    })
}

/// Prompt fragment nudging the reply towards a gentle offer of help.
pub fn task_hint(task: &TaskCandidate) -> String {
    let when = task
        .deadline
        .as_deref()
        .map(|d| format!(" (deadline: {d})"))
        .unwrap_or_default();
    format!(
        "The writer seems to have a pending task: {}{when}. Suggested first step: {} \
         If it fits, gently ask whether they would like help splitting it into small steps.",
        task.action, task.description
    )
}
