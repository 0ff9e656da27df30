//! Past-context builder: recalls recent entries with the same mood so the
//! reply can refer back to them.

use crate::case::CaseType;
use crate::history::{HistoryFilter, HistoryStore, JournalEntry};
use crate::sentiment::Label;

/// Recent entries matching both label and case type, or the label alone
/// when nothing matches both. Empty string when there is nothing to recall.
pub fn build_past_context(
    store: &dyn HistoryStore,
    label: Label,
    case_type: CaseType,
    max_examples: usize,
) -> String {
    if max_examples == 0 {
        return String::new();
    }

    let exact = HistoryFilter {
        label: Some(label),
        case_type: Some(case_type),
    };
    let by_label = HistoryFilter {
        label: Some(label),
        case_type: None,
    };

    let picked = match store.load(max_examples, Some(&exact)) {
        Ok(found) if !found.is_empty() => Ok(found),
        Ok(_) => store.load(max_examples, Some(&by_label)),
        Err(e) => Err(e),
    };

    match picked {
        Ok(entries) => format_context(&entries),
        Err(e) => {
            log::warn!("history unavailable, replying without past context: {e}");
            String::new()
        }
    }
}

/// One bullet per entry: `- [timestamp] text`.
pub fn format_context(entries: &[JournalEntry]) -> String {
    entries
        .iter()
        .map(|e| {
            let ts = if e.timestamp.is_empty() {
                "unknown time"
            } else {
                e.timestamp.as_str()
            };
            format!("- [{ts}] {}", e.text)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::tests::entry;
    use crate::history::MemoryHistory;
    use crate::MoodError;

    struct BrokenStore;

    impl HistoryStore for BrokenStore {
        fn load(&self, _: usize, _: Option<&HistoryFilter>) -> Result<Vec<JournalEntry>, MoodError> {
            Err(MoodError::Config("disk on fire".into()))
        }

        fn append(&self, _: &JournalEntry) -> Result<(), MoodError> {
            Err(MoodError::Config("disk on fire".into()))
        }
    }

    fn store() -> MemoryHistory {
        MemoryHistory::with_entries(vec![
            entry("Music calmed me down", Label::Negative, CaseType::Consistent, "2025-11-01 21:00:00"),
            entry("Walk helped after the bad news", Label::Negative, CaseType::PolarityShift, "2025-11-02 21:00:00"),
            entry("Got an A", Label::Positive, CaseType::Consistent, "2025-11-03 21:00:00"),
            entry("Slept early, felt better", Label::Negative, CaseType::Consistent, "2025-11-04 21:00:00"),
        ])
    }

    #[test]
    fn recalls_same_label_and_case() {
        let ctx = build_past_context(&store(), Label::Negative, CaseType::Consistent, 3);
        assert_eq!(
            ctx,
            "- [2025-11-04 21:00:00] Slept early, felt better\n- [2025-11-01 21:00:00] Music calmed me down"
        );
    }

    #[test]
    fn falls_back_to_label_only() {
        let ctx = build_past_context(&store(), Label::Negative, CaseType::MultiSentiment, 2);
        assert_eq!(
            ctx,
            "- [2025-11-04 21:00:00] Slept early, felt better\n- [2025-11-02 21:00:00] Walk helped after the bad news"
        );
    }

    #[test]
    fn nothing_to_recall() {
        let ctx = build_past_context(&store(), Label::Neutral, CaseType::Consistent, 3);
        assert!(ctx.is_empty());
        assert!(build_past_context(&store(), Label::Negative, CaseType::Consistent, 0).is_empty());
    }

    #[test]
    fn broken_store_gives_empty_context() {
        assert!(build_past_context(&BrokenStore, Label::Positive, CaseType::Consistent, 3).is_empty());
    }

    #[test]
    fn missing_timestamp_placeholder() {
        let mut e = entry("no time", Label::Neutral, CaseType::Consistent, "");
        e.timestamp.clear();
        assert_eq!(format_context(&[e]), "- [unknown time] no time");
    }
}
