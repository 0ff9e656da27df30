//! Segment prober: turns whatever the sentiment model returned for one chunk
//! into a canonical `[negative, neutral, positive]` probability vector.

use crate::sentiment::Probs;
use serde_json::Value;
use std::fmt;

/// Raw per-chunk model output in one of the three accepted shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum RawProbe {
    /// Explicit probabilities; may not sum exactly to 1.
    Probs(Vec<f64>),
    /// Percentages keyed by class name.
    Distribution { negative: f64, neutral: f64, positive: f64 },
    /// Unnormalized scores.
    Logits(Vec<f64>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum NormalizeError {
    WrongArity(usize),
    NonFinite,
    Negative,
    ZeroSum,
}

impl fmt::Display for NormalizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizeError::WrongArity(n) => write!(f, "expected 3 values, got {n}"),
            NormalizeError::NonFinite => f.write_str("non-finite value in model output"),
            NormalizeError::Negative => f.write_str("negative probability in model output"),
            NormalizeError::ZeroSum => f.write_str("model output sums to zero"),
        }
    }
}

impl RawProbe {
    /// Recognize a model reply. Keys are tried in priority order:
    /// `probs`, then `label_distribution`, then `raw_logits`.
    pub fn from_json(value: &Value) -> Option<RawProbe> {
        if let Some(p) = three_numbers(value.get("probs")) {
            return Some(RawProbe::Probs(p));
        }
        if let Some(dist) = value.get("label_distribution").and_then(Value::as_object) {
            let get = |k: &str| dist.get(k).and_then(Value::as_f64);
            if let (Some(negative), Some(neutral), Some(positive)) =
                (get("negative"), get("neutral"), get("positive"))
            {
                return Some(RawProbe::Distribution { negative, neutral, positive });
            }
        }
        if let Some(l) = three_numbers(value.get("raw_logits")) {
            return Some(RawProbe::Logits(l));
        }
        None
    }
}

fn three_numbers(value: Option<&Value>) -> Option<Vec<f64>> {
    let arr = value?.as_array()?;
    if arr.len() != 3 {
        return None;
    }
    arr.iter().map(Value::as_f64).collect()
}

/// Normalize raw output into probabilities summing to 1.
///
/// A zero-sum or malformed payload is an error, never `[0, 0, 0]`.
pub fn normalize(raw: &RawProbe) -> Result<Probs, NormalizeError> {
    match raw {
        RawProbe::Probs(p) => rescale(&as_triple(p)?),
        RawProbe::Distribution { negative, neutral, positive } => {
            rescale(&[*negative, *neutral, *positive])
        }
        RawProbe::Logits(l) => softmax(&as_triple(l)?),
    }
}

fn as_triple(values: &[f64]) -> Result<[f64; 3], NormalizeError> {
    <[f64; 3]>::try_from(values).map_err(|_| NormalizeError::WrongArity(values.len()))
}

fn rescale(values: &[f64; 3]) -> Result<Probs, NormalizeError> {
    if values.iter().any(|v| !v.is_finite()) {
        return Err(NormalizeError::NonFinite);
    }
    if values.iter().any(|v| *v < 0.0) {
        return Err(NormalizeError::Negative);
    }
    let sum: f64 = values.iter().sum();
    if sum <= 0.0 {
        return Err(NormalizeError::ZeroSum);
    }
    Ok(values.map(|v| v / sum))
}

fn softmax(logits: &[f64; 3]) -> Result<Probs, NormalizeError> {
    if logits.iter().any(|v| !v.is_finite()) {
        return Err(NormalizeError::NonFinite);
    }
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exp = logits.map(|x| (x - max).exp());
    let sum: f64 = exp.iter().sum();
    Ok(exp.map(|e| e / sum))
}
