//! Document-level aggregation. Each case type maps to one strategy that
//! folds the per-segment probability vectors into a single vector.

use crate::case::CaseType;
use crate::sentiment::{Probs, Segment};
use serde::{Deserialize, Serialize};

/// Compatibility constant, neutral slightly favored. Do not round to thirds.
pub const UNCERTAIN_PROBS: Probs = [0.33, 0.34, 0.33];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateTag {
    MixedSentiment,
    Uncertain,
}

impl AggregateTag {
    pub fn as_str(self) -> &'static str {
        match self {
            AggregateTag::MixedSentiment => "mixed_sentiment",
            AggregateTag::Uncertain => "uncertain",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub probs: Probs,
    pub tag: Option<AggregateTag>,
}

pub type Strategy = fn(&[Segment]) -> Aggregate;

/// Strategy table keyed by case type.
pub fn strategy_for(case: CaseType) -> Strategy {
    match case {
        CaseType::Consistent => consistent,
        CaseType::MildShift => mild_shift,
        CaseType::PolarityShift => polarity_shift,
        CaseType::MultiSentiment => multi_sentiment,
        CaseType::Uncertain => uncertain,
    }
}

pub fn aggregate(case: CaseType, segments: &[Segment]) -> Aggregate {
    strategy_for(case)(segments)
}

/// Length-weighted mean.
pub fn consistent(segments: &[Segment]) -> Aggregate {
    Aggregate {
        probs: weighted_mean(segments, |_| 1.0),
        tag: None,
    }
}

/// Length-weighted mean where each segment's own decisiveness
/// (`max - mean` of its probabilities) amplifies its weight.
pub fn mild_shift(segments: &[Segment]) -> Aggregate {
    Aggregate {
        probs: weighted_mean(segments, |s| 1.0 + intensity(&s.probs)),
        tag: None,
    }
}

/// The final segment wins outright.
pub fn polarity_shift(segments: &[Segment]) -> Aggregate {
    Aggregate {
        probs: segments.last().map_or(UNCERTAIN_PROBS, |s| s.probs),
        tag: None,
    }
}

pub fn multi_sentiment(segments: &[Segment]) -> Aggregate {
    Aggregate {
        probs: weighted_mean(segments, |_| 1.0),
        tag: Some(AggregateTag::MixedSentiment),
    }
}

/// Segment data is ignored entirely.
pub fn uncertain(_segments: &[Segment]) -> Aggregate {
    Aggregate {
        probs: UNCERTAIN_PROBS,
        tag: Some(AggregateTag::Uncertain),
    }
}

pub fn intensity(probs: &Probs) -> f64 {
    let max = probs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = probs.iter().sum::<f64>() / probs.len() as f64;
    max - mean
}

/// Zero-length segments weigh as one character.
fn base_weight(segment: &Segment) -> f64 {
    segment.length.max(1) as f64
}

fn weighted_mean(segments: &[Segment], boost: impl Fn(&Segment) -> f64) -> Probs {
    let mut acc = [0.0; 3];
    let mut total = 0.0;
    for s in segments {
        let w = base_weight(s) * boost(s);
        for (a, p) in acc.iter_mut().zip(s.probs.iter()) {
            *a += p * w;
        }
        total += w;
    }
    if total <= 0.0 {
        return UNCERTAIN_PROBS;
    }
    acc.map(|a| a / total)
}
