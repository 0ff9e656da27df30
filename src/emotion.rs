//! Emotion mapper: thresholded lookup from probabilities to a descriptor.

use crate::sentiment::Probs;

pub const UNCLEAR: &str = "unclear";

/// Rules are checked in order; the first one that holds names the emotion.
pub fn describe(probs: &Probs) -> &'static str {
    let [neg, neu, pos] = *probs;
    if pos > 0.8 {
        "joyful"
    } else if pos > 0.5 {
        "mildly positive"
    } else if neu > 0.5 {
        "calm"
    } else if neg > 0.8 {
        "very negative"
    } else if neg > 0.5 {
        "sad"
    } else {
        UNCLEAR
    }
}

/// Deduplicate per-segment descriptors in first-seen order and join them.
pub fn summarize<'a>(descriptors: impl IntoIterator<Item = &'a str>) -> String {
    let mut seen: Vec<&str> = Vec::new();
    for d in descriptors {
        if !d.is_empty() && !seen.contains(&d) {
            seen.push(d);
        }
    }
    if seen.is_empty() {
        UNCLEAR.to_string()
    } else {
        seen.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds() {
        assert_eq!(describe(&[0.05, 0.05, 0.9]), "joyful");
        assert_eq!(describe(&[0.1, 0.3, 0.6]), "mildly positive");
        assert_eq!(describe(&[0.2, 0.6, 0.2]), "calm");
        assert_eq!(describe(&[0.85, 0.1, 0.05]), "very negative");
        assert_eq!(describe(&[0.55, 0.3, 0.15]), "sad");
        assert_eq!(describe(&[0.4, 0.3, 0.3]), "unclear");
        assert_eq!(describe(&[0.33, 0.34, 0.33]), "unclear");
    }

    #[test]
    fn boundaries_are_strict() {
        assert_eq!(describe(&[0.0, 0.2, 0.8]), "mildly positive");
        assert_eq!(describe(&[0.5, 0.5, 0.0]), "unclear");
    }

    #[test]
    fn summary_dedupes_in_order() {
        let s = summarize(["sad", "calm", "sad", "joyful", "calm"]);
        assert_eq!(s, "sad, calm, joyful");
    }

    #[test]
    fn empty_summary_is_unclear() {
        assert_eq!(summarize(Vec::<&str>::new()), "unclear");
    }
}
