//! Command handlers behind the CLI. These are the only functions that
//! print; everything they call returns values.

use crate::case::CaseRules;
use crate::chunk::Chunker;
use crate::cli::{AnalyzeArgs, ChunkArgs, ClassifyArgs, HistoryArgs, TasksArgs};
use crate::config::{MoodConfig, resolve_history_path};
use crate::history::{HistoryFilter, HistoryStore, JsonFileHistory};
use crate::inference::HttpInference;
use crate::pipeline::{Pipeline, PipelineOutcome, RunOptions, analyze_segments};
use crate::probe::{RawProbe, normalize};
use crate::respond::ChatResponder;
use crate::sentiment::Segment;
use crate::tasks::{RuleTaskExtractor, TaskExtractor, select_task};
use crate::MoodError;
use std::io::Read;
use std::path::PathBuf;

fn read_text(arg: Option<String>) -> Result<String, MoodError> {
    match arg {
        Some(t) => Ok(t),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

/// Run the full pipeline. Returns `false` when the run aborted.
pub fn handle_analyze(
    config: &MoodConfig,
    history_path: Option<PathBuf>,
    args: AnalyzeArgs,
) -> Result<bool, MoodError> {
    let text = read_text(args.text)?;
    let history = JsonFileHistory::new(resolve_history_path(config, history_path));
    let inference = HttpInference::new(&config.inference);
    let responder = ChatResponder::new(&config.response);
    let extractor = RuleTaskExtractor::new()?;

    let mut pipeline = Pipeline::new(config, &inference, &responder, &history)?;
    if config.tasks.enabled {
        pipeline = pipeline.with_task_extractor(&extractor);
    }

    let options = RunOptions {
        chunk: args.chunk,
        persist: !args.no_persist,
    };
    let outcome = pipeline.run(&text, &options);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(outcome.is_success());
    }

    match &outcome {
        PipelineOutcome::Success(report) => {
            let e = &report.entry;
            println!("===== SENTIMENT PIPELINE RESULT =====");
            println!("Input: {}", e.text.trim());
            println!("Predicted Label: {}", e.sentiment.predicted_label);
            println!("Distribution: {}", e.sentiment.label_distribution);
            println!("Emotion Detail: {}", e.sentiment.emotion_detail);
            println!("Case Type: {}", e.sentiment.case_type);
            for tag in &e.sentiment.tags {
                println!("Flag: {}", tag.as_str());
            }
            if report.is_fallback() {
                println!("Advice (fallback): {}", e.advice_text);
            } else {
                println!("Advice: {}", e.advice_text);
            }
            println!("Timestamp: {}", e.timestamp);
            if let Some(err) = &report.persistence_error {
                println!("Warning: not saved to history ({err})");
            }
            println!("=====================================");
        }
        PipelineOutcome::Error(failure) => {
            eprintln!("moodlog: {} ({:?} stage)", failure.error_message, failure.stage);
        }
    }
    Ok(outcome.is_success())
}

/// Parse `[{"text": ..., "probs"|"label_distribution"|"raw_logits": ..., "length"?: n}]`.
pub fn parse_scored_segments(input: &str) -> Result<Vec<Segment>, MoodError> {
    let items: Vec<serde_json::Value> = serde_json::from_str(input)?;
    if items.is_empty() {
        return Err(MoodError::InvalidInput("no segments given".into()));
    }

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let text = item.get("text").and_then(|v| v.as_str()).unwrap_or_default();
            let raw = RawProbe::from_json(item).ok_or_else(|| MoodError::Probe {
                chunk: i,
                reason: "unrecognized payload shape".into(),
            })?;
            let probs = normalize(&raw).map_err(|e| MoodError::Probe {
                chunk: i,
                reason: e.to_string(),
            })?;
            Ok(match item.get("length").and_then(|v| v.as_u64()) {
                Some(len) => Segment::with_length(text, probs, len as usize),
                None => Segment::new(text, probs),
            })
        })
        .collect()
}

pub fn handle_classify(config: &MoodConfig, args: ClassifyArgs) -> Result<(), MoodError> {
    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    let segments = parse_scored_segments(&input)?;
    let result = analyze_segments(&segments, &CaseRules::from_config(&config.classifier));

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("Case Type: {}", result.case_type);
        println!("Predicted Label: {}", result.predicted_label);
        println!("Distribution: {}", result.label_distribution);
        println!("Emotion Detail: {}", result.emotion_detail);
        for tag in &result.tags {
            println!("Flag: {}", tag.as_str());
        }
    }
    Ok(())
}

pub fn handle_chunk(config: &MoodConfig, args: ChunkArgs) -> Result<(), MoodError> {
    let text = read_text(args.text)?;
    let size = args.size.unwrap_or(config.chunking.size);
    let chunker = Chunker::new(size, &config.chunking.conjunctions)?;
    for chunk in chunker.chunk(&text) {
        println!("{chunk}");
    }
    Ok(())
}

pub fn handle_history(
    config: &MoodConfig,
    history_path: Option<PathBuf>,
    args: HistoryArgs,
) -> Result<(), MoodError> {
    let store = JsonFileHistory::new(resolve_history_path(config, history_path));
    let filter = HistoryFilter {
        label: args.label,
        case_type: args.case_type,
    };
    let entries = store.load(args.limit, Some(&filter))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    if entries.is_empty() {
        println!("No journal entries found.");
        return Ok(());
    }
    for e in &entries {
        let preview: String = e.text.chars().take(80).collect();
        println!(
            "[{}] {} / {} ({}) | {}",
            e.timestamp,
            e.sentiment.predicted_label,
            e.sentiment.case_type,
            e.sentiment.label_distribution,
            preview.trim()
        );
    }
    Ok(())
}

pub fn handle_tasks(config: &MoodConfig, args: TasksArgs) -> Result<(), MoodError> {
    let text = read_text(args.text)?;
    let tasks = RuleTaskExtractor::new()?.extract(&text);
    if tasks.is_empty() {
        println!("No tasks detected.");
        return Ok(());
    }

    let best = select_task(&tasks);
    for t in &tasks {
        let marker = if best == Some(t) && t.confidence >= config.tasks.min_confidence {
            "*"
        } else {
            " "
        };
        let deadline = t.deadline.as_deref().unwrap_or("-");
        println!(
            "{marker} {:.2}  {}  (deadline: {deadline})  {}",
            t.confidence, t.action, t.description
        );
    }
    Ok(())
}
