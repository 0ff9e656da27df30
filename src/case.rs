//! Case classifier: decides the shape of sentiment across a document's
//! segments. Rules are checked in priority order; the first match wins.

use crate::config::ClassifierConfig;
use crate::sentiment::{Label, Segment, top_two_margin};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseType {
    Consistent,
    MildShift,
    PolarityShift,
    Uncertain,
    MultiSentiment,
}

impl CaseType {
    pub fn as_str(self) -> &'static str {
        match self {
            CaseType::Consistent => "consistent",
            CaseType::MildShift => "mild_shift",
            CaseType::PolarityShift => "polarity_shift",
            CaseType::Uncertain => "uncertain",
            CaseType::MultiSentiment => "multi_sentiment",
        }
    }
}

impl fmt::Display for CaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "consistent" => Ok(CaseType::Consistent),
            "mild_shift" => Ok(CaseType::MildShift),
            "polarity_shift" => Ok(CaseType::PolarityShift),
            "uncertain" => Ok(CaseType::Uncertain),
            "multi_sentiment" => Ok(CaseType::MultiSentiment),
            other => Err(format!("unknown case type '{other}'")),
        }
    }
}

/// Thresholds and connective list the classifier runs with.
#[derive(Debug, Clone)]
pub struct CaseRules {
    /// Every segment below this top1-top2 gap means the model never separated classes.
    pub uncertain_margin: f64,
    /// `max(probs)` strictly above this counts as a strongly felt segment.
    pub strong_threshold: f64,
    /// Lowercased polarity-reversing connectives, matched as substrings.
    pub reversal_connectives: Vec<String>,
}

impl Default for CaseRules {
    fn default() -> Self {
        Self::from_config(&ClassifierConfig::default())
    }
}

impl CaseRules {
    pub fn from_config(config: &ClassifierConfig) -> Self {
        CaseRules {
            uncertain_margin: config.uncertain_margin,
            strong_threshold: config.strong_threshold,
            reversal_connectives: config
                .reversal_connectives
                .iter()
                .map(|c| c.trim().to_lowercase())
                .filter(|c| !c.is_empty())
                .collect(),
        }
    }

    /// Literal substring match over the whole text, regardless of which
    /// chunk the connective falls in.
    pub fn has_reversal(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.reversal_connectives.iter().any(|c| lower.contains(c.as_str()))
    }
}

/// Classify the ordered segments of one document.
///
/// An empty slice is `Uncertain`: there is no signal to aggregate.
pub fn detect_sentiment_case(segments: &[Segment], rules: &CaseRules) -> CaseType {
    if segments
        .iter()
        .all(|s| top_two_margin(&s.probs) < rules.uncertain_margin)
    {
        return CaseType::Uncertain;
    }

    let first = segments[0].label;
    if segments.iter().all(|s| s.label == first) {
        return CaseType::Consistent;
    }

    let last = segments[segments.len() - 1].label;
    if first.is_opposite(last) {
        let joined = segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        if rules.has_reversal(&joined) {
            return CaseType::PolarityShift;
        }
    }

    let strong_labels: HashSet<Label> = segments
        .iter()
        .filter(|s| s.confidence() > rules.strong_threshold)
        .map(|s| s.label)
        .collect();
    if strong_labels.len() >= 2 {
        return CaseType::MultiSentiment;
    }

    CaseType::MildShift
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(text: &str, probs: [f64; 3]) -> Segment {
        Segment::new(text, probs)
    }

    #[test]
    fn uncertain_preempts_consistent() {
        let segments = vec![
            seg("meh", [0.30, 0.36, 0.34]),
            seg("whatever", [0.31, 0.35, 0.34]),
        ];
        // every label is neutral, but no segment separates its classes
        assert!(segments.iter().all(|s| s.label == Label::Neutral));
        assert_eq!(
            detect_sentiment_case(&segments, &CaseRules::default()),
            CaseType::Uncertain
        );
    }

    #[test]
    fn one_decisive_segment_breaks_uncertainty() {
        let segments = vec![
            seg("meh", [0.30, 0.36, 0.34]),
            seg("great day", [0.05, 0.15, 0.80]),
        ];
        assert_ne!(
            detect_sentiment_case(&segments, &CaseRules::default()),
            CaseType::Uncertain
        );
    }

    #[test]
    fn same_label_is_consistent() {
        let segments = vec![
            seg("good morning", [0.1, 0.1, 0.8]),
            seg("lovely lunch", [0.05, 0.05, 0.9]),
        ];
        assert_eq!(
            detect_sentiment_case(&segments, &CaseRules::default()),
            CaseType::Consistent
        );
    }

    #[test]
    fn reversal_with_opposite_ends_is_polarity_shift() {
        let segments = vec![
            seg("The morning was wonderful", [0.05, 0.05, 0.9]),
            seg("but then I lost my wallet", [0.8, 0.1, 0.1]),
        ];
        assert_eq!(
            detect_sentiment_case(&segments, &CaseRules::default()),
            CaseType::PolarityShift
        );
    }

    #[test]
    fn vietnamese_connective_detected() {
        let segments = vec![
            seg("Hôm nay mình rất buồn", [0.85, 0.1, 0.05]),
            seg("Tuy nhiên tối đi chơi rất vui", [0.05, 0.1, 0.85]),
        ];
        assert_eq!(
            detect_sentiment_case(&segments, &CaseRules::default()),
            CaseType::PolarityShift
        );
    }

    #[test]
    fn connective_anywhere_in_text_counts() {
        // the connective sits in the middle chunk, not at the pivot
        let segments = vec![
            seg("Exam results came back great", [0.05, 0.1, 0.85]),
            seg("Nothing else happened, but fine", [0.1, 0.8, 0.1]),
            seg("Then my bike got stolen", [0.85, 0.1, 0.05]),
        ];
        assert_eq!(
            detect_sentiment_case(&segments, &CaseRules::default()),
            CaseType::PolarityShift
        );
    }

    #[test]
    fn opposite_ends_without_connective_is_multi_sentiment() {
        let segments = vec![
            seg("Exam results came back great", [0.05, 0.1, 0.85]),
            seg("My bike got stolen", [0.85, 0.1, 0.05]),
        ];
        assert_eq!(
            detect_sentiment_case(&segments, &CaseRules::default()),
            CaseType::MultiSentiment
        );
    }

    #[test]
    fn connective_without_opposite_ends_is_not_polarity_shift() {
        let segments = vec![
            seg("Fine morning but nothing special", [0.1, 0.8, 0.1]),
            seg("Then the bus left without me", [0.85, 0.1, 0.05]),
            seg("A friend drove me and we laughed", [0.05, 0.1, 0.85]),
        ];
        assert_eq!(
            detect_sentiment_case(&segments, &CaseRules::default()),
            CaseType::MultiSentiment
        );
    }

    #[test]
    fn strong_same_label_segments_are_not_multi() {
        // two strong positives and a weak negative: one strong label only
        let segments = vec![
            seg("Won the match", [0.05, 0.1, 0.85]),
            seg("Slightly sore legs", [0.5, 0.3, 0.2]),
            seg("Team dinner after", [0.05, 0.15, 0.8]),
        ];
        assert_eq!(
            detect_sentiment_case(&segments, &CaseRules::default()),
            CaseType::MildShift
        );
    }

    #[test]
    fn adjacent_labels_fall_back_to_mild_shift() {
        let segments = vec![
            seg("Class was okay", [0.1, 0.55, 0.35]),
            seg("Coffee after was nice", [0.05, 0.4, 0.55]),
        ];
        assert_eq!(
            detect_sentiment_case(&segments, &CaseRules::default()),
            CaseType::MildShift
        );
    }

    #[test]
    fn strong_threshold_is_strict() {
        let segments = vec![
            seg("a", [0.6, 0.3, 0.1]),
            seg("b", [0.1, 0.3, 0.6]),
        ];
        // 0.6 does not exceed 0.6, and there is no connective
        assert_eq!(
            detect_sentiment_case(&segments, &CaseRules::default()),
            CaseType::MildShift
        );
    }

    #[test]
    fn empty_is_uncertain() {
        assert_eq!(
            detect_sentiment_case(&[], &CaseRules::default()),
            CaseType::Uncertain
        );
    }

    #[test]
    fn case_type_round_trips_names() {
        for case in [
            CaseType::Consistent,
            CaseType::MildShift,
            CaseType::PolarityShift,
            CaseType::Uncertain,
            CaseType::MultiSentiment,
        ] {
            assert_eq!(case.as_str().parse::<CaseType>(), Ok(case));
            assert_eq!(
                serde_json::to_value(case).unwrap(),
                serde_json::Value::String(case.as_str().into())
            );
        }
        assert_eq!("mild-shift".parse::<CaseType>(), Ok(CaseType::MildShift));
    }
}
