//! Text chunker. Splits a journal entry into bounded segments, preferring
//! sentence terminators and falling back to coordinating conjunctions.

use crate::config::ChunkingConfig;
use crate::MoodError;
use regex::Regex;

pub struct Chunker {
    max_size: usize,
    clause_break: Option<Regex>,
}

impl Chunker {
    pub fn new(max_size: usize, conjunctions: &[String]) -> Result<Self, MoodError> {
        if max_size == 0 {
            return Err(MoodError::Config("chunk size must be positive".into()));
        }

        let mut words: Vec<&str> = conjunctions
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .collect();
        // Longest first so multi-word conjunctions win over their prefixes
        words.sort_by_key(|w| std::cmp::Reverse(w.chars().count()));

        let clause_break = if words.is_empty() {
            None
        } else {
            let alternation = words
                .iter()
                .map(|w| regex::escape(w))
                .collect::<Vec<_>>()
                .join("|");
            let pattern = format!(r"(?i)\s(?:{alternation})\b");
            Some(
                Regex::new(&pattern)
                    .map_err(|e| MoodError::Config(format!("conjunction pattern: {e}")))?,
            )
        };

        Ok(Chunker { max_size, clause_break })
    }

    pub fn from_config(config: &ChunkingConfig) -> Result<Self, MoodError> {
        Self::new(config.size, &config.conjunctions)
    }

    /// Split `text` into non-empty chunks of at most `max_size` characters.
    ///
    /// A sentence that does not fit is broken at conjunctions; a clause that
    /// still does not fit is emitted whole.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let cleaned = clean_text(text);
        let mut units: Vec<&str> = Vec::new();

        for sentence in split_sentences(&cleaned) {
            if char_len(sentence) <= self.max_size {
                units.push(sentence);
            } else {
                units.extend(self.split_clauses(sentence));
            }
        }

        let mut chunks = Vec::new();
        let mut current = String::new();
        for unit in units {
            if current.is_empty() {
                current.push_str(unit);
            } else if char_len(&current) + 1 + char_len(unit) <= self.max_size {
                current.push(' ');
                current.push_str(unit);
            } else {
                chunks.push(std::mem::take(&mut current));
                current.push_str(unit);
            }
        }
        if !current.is_empty() {
            chunks.push(current);
        }

        chunks
    }

    fn split_clauses<'a>(&self, sentence: &'a str) -> Vec<&'a str> {
        let Some(re) = &self.clause_break else {
            return vec![sentence];
        };

        let mut clauses = Vec::new();
        let mut start = 0;
        for m in re.find_iter(sentence) {
            if m.start() > start {
                let piece = sentence[start..m.start()].trim();
                if !piece.is_empty() {
                    clauses.push(piece);
                }
                start = m.start();
            }
        }
        let tail = sentence[start..].trim();
        if !tail.is_empty() {
            clauses.push(tail);
        }
        clauses
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Collapse whitespace runs to one space and drop other control characters.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace()
        .map(|word| word.chars().filter(|c| !c.is_control()).collect::<String>())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '…')
}

fn is_closing(c: char) -> bool {
    matches!(c, '"' | '\'' | ')' | '”' | '’' | '»')
}

/// Split at terminator runs followed by whitespace or end of text.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !is_terminator(c) {
            continue;
        }
        let mut end = i + c.len_utf8();
        while let Some(&(j, next)) = chars.peek() {
            if is_terminator(next) || is_closing(next) {
                end = j + next.len_utf8();
                chars.next();
            } else {
                break;
            }
        }
        if chars.peek().is_none_or(|&(_, next)| next.is_whitespace()) {
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = end;
        }
    }

    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest);
    }
    sentences
}
