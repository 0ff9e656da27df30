//! Shared sentiment vocabulary: the three classes, per-chunk segments, and the
//! percentage distribution persisted with every journal entry.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Probability vector ordered `[negative, neutral, positive]`.
pub type Probs = [f64; 3];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Negative,
    Neutral,
    Positive,
}

impl Label {
    pub const ALL: [Label; 3] = [Label::Negative, Label::Neutral, Label::Positive];

    pub fn index(self) -> usize {
        match self {
            Label::Negative => 0,
            Label::Neutral => 1,
            Label::Positive => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Label::Negative => "negative",
            Label::Neutral => "neutral",
            Label::Positive => "positive",
        }
    }

    /// Negative and positive sit on opposite sides of neutral.
    pub fn is_opposite(self, other: Label) -> bool {
        matches!(
            (self, other),
            (Label::Negative, Label::Positive) | (Label::Positive, Label::Negative)
        )
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = String;

    /// Accepts full names and the short model tags (`POS`, `NEG`, `NEU`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "negative" | "neg" => Ok(Label::Negative),
            "neutral" | "neu" => Ok(Label::Neutral),
            "positive" | "pos" => Ok(Label::Positive),
            other => Err(format!("unknown sentiment label '{other}'")),
        }
    }
}

/// Index of the largest value. Ties resolve to the earliest class.
pub fn argmax(probs: &Probs) -> usize {
    let mut best = 0;
    for i in 1..probs.len() {
        if probs[i] > probs[best] {
            best = i;
        }
    }
    best
}

pub fn dominant(probs: &Probs) -> Label {
    Label::ALL[argmax(probs)]
}

/// Gap between the largest and second-largest probability.
pub fn top_two_margin(probs: &Probs) -> f64 {
    let mut sorted = *probs;
    sorted.sort_by(|a, b| b.total_cmp(a));
    sorted[0] - sorted[1]
}

/// One chunk of a journal entry with its normalized probabilities attached.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub text: String,
    pub probs: Probs,
    pub label: Label,
    /// Character count of `text`, used as the aggregation weight.
    pub length: usize,
}

impl Segment {
    pub fn new(text: impl Into<String>, probs: Probs) -> Self {
        let text = text.into();
        let length = text.chars().count();
        Self::with_length(text, probs, length)
    }

    pub fn with_length(text: impl Into<String>, probs: Probs, length: usize) -> Self {
        Segment {
            text: text.into(),
            probs,
            label: dominant(&probs),
            length,
        }
    }

    pub fn confidence(&self) -> f64 {
        self.probs[argmax(&self.probs)]
    }
}

/// Percentage breakdown over the three classes at one-decimal precision.
///
/// Stored as integer tenths of a percent so the total is exactly 100.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PercentMap", into = "PercentMap")]
pub struct LabelDistribution {
    tenths: [i64; 3],
}

impl LabelDistribution {
    /// Scale to percent, round to one decimal, and hand the rounding residual
    /// to the currently largest bucket.
    pub fn from_probs(probs: &Probs) -> Self {
        let mut tenths = probs.map(|p| (p * 1000.0).round() as i64);
        let residual = 1000 - tenths.iter().sum::<i64>();
        let largest = largest_bucket(&tenths);
        tenths[largest] += residual;
        LabelDistribution { tenths }
    }

    pub fn percent(&self, label: Label) -> f64 {
        self.tenths[label.index()] as f64 / 10.0
    }

    pub fn total_tenths(&self) -> i64 {
        self.tenths.iter().sum()
    }

    pub fn dominant(&self) -> Label {
        Label::ALL[largest_bucket(&self.tenths)]
    }
}

impl fmt::Display for LabelDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "negative {:.1}%, neutral {:.1}%, positive {:.1}%",
            self.percent(Label::Negative),
            self.percent(Label::Neutral),
            self.percent(Label::Positive)
        )
    }
}

fn largest_bucket(tenths: &[i64; 3]) -> usize {
    let mut best = 0;
    for i in 1..tenths.len() {
        if tenths[i] > tenths[best] {
            best = i;
        }
    }
    best
}

/// Wire form of [`LabelDistribution`]: `{"negative": 12.5, ...}`.
#[derive(Serialize, Deserialize)]
struct PercentMap {
    negative: f64,
    neutral: f64,
    positive: f64,
}

impl From<PercentMap> for LabelDistribution {
    fn from(m: PercentMap) -> Self {
        let tenths = [m.negative, m.neutral, m.positive].map(|v| (v * 10.0).round() as i64);
        LabelDistribution { tenths }
    }
}

impl From<LabelDistribution> for PercentMap {
    fn from(d: LabelDistribution) -> Self {
        PercentMap {
            negative: d.percent(Label::Negative),
            neutral: d.percent(Label::Neutral),
            positive: d.percent(Label::Positive),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_parses_short_tags() {
        assert_eq!("POS".parse::<Label>(), Ok(Label::Positive));
        assert_eq!(" neg ".parse::<Label>(), Ok(Label::Negative));
        assert_eq!("Neutral".parse::<Label>(), Ok(Label::Neutral));
        assert!("happy".parse::<Label>().is_err());
    }

    #[test]
    fn argmax_ties_pick_earliest() {
        assert_eq!(argmax(&[0.4, 0.4, 0.2]), 0);
        assert_eq!(argmax(&[0.33, 0.34, 0.33]), 1);
        assert_eq!(dominant(&[0.1, 0.1, 0.8]), Label::Positive);
    }

    #[test]
    fn margin_between_top_two() {
        let m = top_two_margin(&[0.2, 0.45, 0.35]);
        assert!((m - 0.1).abs() < 1e-12);
    }

    #[test]
    fn segment_length_counts_chars() {
        let seg = Segment::new("hôm nay", [0.1, 0.8, 0.1]);
        assert_eq!(seg.length, 7);
        assert_eq!(seg.label, Label::Neutral);
        assert!((seg.confidence() - 0.8).abs() < 1e-12);
    }

    #[test]
    fn distribution_always_totals_one_hundred() {
        let cases: [Probs; 6] = [
            [1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0],
            [0.33, 0.34, 0.33],
            [0.06666, 0.06666, 0.86668],
            [0.12345, 0.45678, 0.41977],
            [0.0, 0.0, 1.0],
            [0.00049, 0.00049, 0.99902],
        ];
        for probs in cases {
            let dist = LabelDistribution::from_probs(&probs);
            assert_eq!(dist.total_tenths(), 1000, "probs {probs:?} -> {dist}");
        }
    }

    #[test]
    fn residual_goes_to_largest_bucket() {
        // 33.3 + 33.3 + 33.3 = 99.9, residual 0.1 lands on the first max
        let dist = LabelDistribution::from_probs(&[1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0]);
        assert_eq!(dist.percent(Label::Negative), 33.4);
        assert_eq!(dist.percent(Label::Neutral), 33.3);
        assert_eq!(dist.percent(Label::Positive), 33.3);
    }

    #[test]
    fn distribution_serializes_as_percent_map() {
        let dist = LabelDistribution::from_probs(&[0.33, 0.34, 0.33]);
        let json = serde_json::to_value(dist).unwrap();
        assert_eq!(json["negative"], 33.0);
        assert_eq!(json["neutral"], 34.0);
        assert_eq!(json["positive"], 33.0);

        let back: LabelDistribution = serde_json::from_value(json).unwrap();
        assert_eq!(back, dist);
        assert_eq!(back.dominant(), Label::Neutral);
    }
}
