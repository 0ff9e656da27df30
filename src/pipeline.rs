//! Pipeline orchestrator.
//!
//! CHUNKING → PROBING → CLASSIFYING → AGGREGATING → DESCRIBING →
//! RESPONDING → PERSISTING → DONE. A failed probe aborts the run with no
//! partial result. A failed reply falls back to fixed text and a failed
//! history write is only reported; neither changes the status.

use crate::aggregate::{AggregateTag, aggregate};
use crate::case::{CaseRules, CaseType, detect_sentiment_case};
use crate::chunk::{Chunker, clean_text};
use crate::config::MoodConfig;
use crate::context::build_past_context;
use crate::emotion;
use crate::history::{HistoryStore, JournalEntry, local_timestamp};
use crate::inference::Inference;
use crate::probe::normalize;
use crate::respond::{PromptInput, Reply, Responder, build_prompt};
use crate::sentiment::{Label, LabelDistribution, Probs, Segment};
use crate::tasks::{TaskCandidate, TaskExtractor, select_task, task_hint};
use crate::MoodError;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Document-level verdict after classification and aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSentimentResult {
    pub predicted_label: Label,
    pub label_distribution: LabelDistribution,
    #[serde(default)]
    pub emotion_detail: String,
    pub case_type: CaseType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<AggregateTag>,
}

/// Classify, aggregate, and describe an ordered list of probed segments.
/// Shared by the live pipeline and offline classification.
pub fn analyze_segments(segments: &[Segment], rules: &CaseRules) -> DocumentSentimentResult {
    enter(Stage::Classifying);
    let case_type = detect_sentiment_case(segments, rules);

    enter(Stage::Aggregating);
    let agg = aggregate(case_type, segments);
    let label_distribution = LabelDistribution::from_probs(&agg.probs);

    enter(Stage::Describing);
    let emotion_detail = emotion::summarize(segments.iter().map(|s| emotion::describe(&s.probs)));

    DocumentSentimentResult {
        predicted_label: label_distribution.dominant(),
        label_distribution,
        emotion_detail,
        case_type,
        tags: agg.tag.into_iter().collect(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Chunking,
    Probing,
    Classifying,
    Aggregating,
    Describing,
    Responding,
    Persisting,
    Done,
    Error,
}

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Ask for chunking; `always_chunk` in config forces it regardless.
    pub chunk: bool,
    pub persist: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            chunk: false,
            persist: true,
        }
    }
}

/// Per-chunk detail reported alongside the entry; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkReport {
    pub text: String,
    pub label: Label,
    pub probs: Probs,
    pub emotion: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineReport {
    #[serde(flatten)]
    pub entry: JournalEntry,
    pub chunks: Vec<ChunkReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<TaskCandidate>,
    pub persisted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistence_error: Option<String>,
}

impl PipelineReport {
    pub fn is_fallback(&self) -> bool {
        self.entry.advice_source == crate::respond::FALLBACK_SOURCE
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineFailure {
    pub status: &'static str,
    pub error_message: String,
    /// Stage that was running when the run aborted.
    pub stage: Stage,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PipelineOutcome {
    Success(Box<PipelineReport>),
    Error(PipelineFailure),
}

impl PipelineOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PipelineOutcome::Success(_))
    }
}

pub struct Pipeline<'a> {
    chunker: Chunker,
    rules: CaseRules,
    always_chunk: bool,
    context_examples: usize,
    task_min_confidence: f64,
    inference: &'a dyn Inference,
    responder: &'a dyn Responder,
    history: &'a dyn HistoryStore,
    tasks: Option<&'a dyn TaskExtractor>,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &MoodConfig,
        inference: &'a dyn Inference,
        responder: &'a dyn Responder,
        history: &'a dyn HistoryStore,
    ) -> Result<Self, MoodError> {
        Ok(Pipeline {
            chunker: Chunker::from_config(&config.chunking)?,
            rules: CaseRules::from_config(&config.classifier),
            always_chunk: config.chunking.always_chunk,
            context_examples: config.history.context_examples,
            task_min_confidence: config.tasks.min_confidence,
            inference,
            responder,
            history,
            tasks: None,
        })
    }

    pub fn with_task_extractor(mut self, extractor: &'a dyn TaskExtractor) -> Self {
        self.tasks = Some(extractor);
        self
    }

    pub fn run(&self, text: &str, options: &RunOptions) -> PipelineOutcome {
        let started = Instant::now();
        let started_at = local_timestamp();
        let fail = |stage: Stage, message: String| {
            log::debug!("pipeline: {stage:?} -> Error");
            PipelineOutcome::Error(PipelineFailure {
                status: "error",
                error_message: message,
                stage,
                timestamp: started_at.clone(),
            })
        };

        enter(Stage::Chunking);
        let chunks = self.split(text, options.chunk);
        if chunks.is_empty() {
            return fail(Stage::Chunking, "journal entry is empty".into());
        }

        enter(Stage::Probing);
        let mut segments = Vec::with_capacity(chunks.len());
        for (i, chunk) in chunks.into_iter().enumerate() {
            match self.probe(i, &chunk) {
                Ok(probs) => segments.push(Segment::new(chunk, probs)),
                Err(e) => return fail(Stage::Probing, e.to_string()),
            }
        }

        let sentiment = analyze_segments(&segments, &self.rules);
        let chunk_reports: Vec<ChunkReport> = segments
            .iter()
            .map(|s| ChunkReport {
                text: s.text.clone(),
                label: s.label,
                probs: s.probs,
                emotion: emotion::describe(&s.probs),
            })
            .collect();

        enter(Stage::Responding);
        let task = self.pick_task(text);
        let reply = self.respond(text, &sentiment, task.as_ref());

        let elapsed = started.elapsed().as_secs_f64();
        let entry = JournalEntry {
            status: "success".into(),
            text: text.to_string(),
            sentiment,
            advice_text: reply.text,
            advice_source: reply.source,
            timestamp: local_timestamp(),
            processing_time: Some((elapsed * 100.0).round() / 100.0),
        };

        let mut persisted = false;
        let mut persistence_error = None;
        if options.persist {
            enter(Stage::Persisting);
            match self.history.append(&entry) {
                Ok(()) => persisted = true,
                Err(e) => {
                    log::warn!("history write failed, result not saved: {e}");
                    persistence_error = Some(e.to_string());
                }
            }
        }

        enter(Stage::Done);
        log::info!(
            "analyzed {} chunk(s): {} / {} in {:.2}s",
            segments.len(),
            entry.sentiment.predicted_label,
            entry.sentiment.case_type,
            elapsed
        );

        PipelineOutcome::Success(Box::new(PipelineReport {
            entry,
            chunks: chunk_reports,
            task,
            persisted,
            persistence_error,
        }))
    }

    fn split(&self, text: &str, requested: bool) -> Vec<String> {
        if requested || self.always_chunk {
            return self.chunker.chunk(text);
        }
        let whole = clean_text(text);
        if whole.is_empty() { Vec::new() } else { vec![whole] }
    }

    fn probe(&self, index: usize, text: &str) -> Result<Probs, MoodError> {
        let raw = self.inference.infer(text).map_err(|e| MoodError::Probe {
            chunk: index,
            reason: e.to_string(),
        })?;
        normalize(&raw).map_err(|e| MoodError::Probe {
            chunk: index,
            reason: e.to_string(),
        })
    }

    fn pick_task(&self, text: &str) -> Option<TaskCandidate> {
        let extractor = self.tasks?;
        let candidates = extractor.extract(text);
        select_task(&candidates)
            .filter(|t| t.confidence >= self.task_min_confidence)
            .cloned()
    }

    fn respond(
        &self,
        text: &str,
        sentiment: &DocumentSentimentResult,
        task: Option<&TaskCandidate>,
    ) -> Reply {
        let past = build_past_context(
            self.history,
            sentiment.predicted_label,
            sentiment.case_type,
            self.context_examples,
        );
        let hint = task.map(task_hint);
        let prompt = build_prompt(&PromptInput {
            text,
            label: sentiment.predicted_label,
            distribution: &sentiment.label_distribution,
            emotion: &sentiment.emotion_detail,
            case_type: sentiment.case_type,
            past_context: (!past.is_empty()).then_some(past.as_str()),
            task_hint: hint.as_deref(),
        });

        match self.responder.generate(&prompt) {
            Ok(reply) => reply,
            Err(e) => {
                log::warn!("reply generation failed, using fallback: {e}");
                Reply::fallback()
            }
        }
    }
}

fn enter(stage: Stage) {
    log::debug!("pipeline: {stage:?}");
}
