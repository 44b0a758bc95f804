use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::analyzer::questions::QuestionDraft;
use crate::model::QuestionRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
    Number(u64),
    Alpha(char),
}

/// Parsed hierarchical numbering token: dotted integers with an optional
/// single trailing letter (`3.1.2`, `1a`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NumberingToken {
    segments: Vec<Segment>,
}

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{1,4}(?:\.\d{1,4})*)\.?([a-z])?$").expect("numbering token regex")
    })
}

fn leading_token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{1,4}(?:\.\d{1,4})*[a-z]?)[.):]?\s+\S").expect("leading token regex")
    })
}

impl NumberingToken {
    /// Parse a cell whose whole content is a numbering token.
    pub(crate) fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim().trim_end_matches([')', ':']);
        let captures = token_regex().captures(trimmed)?;

        let mut segments = captures
            .get(1)?
            .as_str()
            .split('.')
            .map(|part| part.parse::<u64>().ok().map(Segment::Number))
            .collect::<Option<Vec<Segment>>>()?;

        if let Some(alpha) = captures.get(2) {
            segments.push(Segment::Alpha(alpha.as_str().chars().next()?));
        }

        Some(Self { segments })
    }

    /// Parse a numbering token that prefixes longer question text.
    pub(crate) fn parse_leading(text: &str) -> Option<Self> {
        let captures = leading_token_regex().captures(text.trim())?;
        Self::parse(captures.get(1)?.as_str())
    }

    pub(crate) fn level(&self) -> usize {
        self.segments.len()
    }

    /// Canonical key: numbers joined by dots, a letter segment appended
    /// directly (`[1, a]` -> `1a`).
    pub(crate) fn key(&self) -> String {
        let mut key = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Number(value) => {
                    if !key.is_empty() {
                        key.push('.');
                    }
                    key.push_str(&value.to_string());
                }
                Segment::Alpha(value) => key.push(*value),
            }
        }
        key
    }

    pub(crate) fn parent_key(&self) -> Option<String> {
        if self.segments.len() < 2 {
            return None;
        }
        let parent = Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        };
        Some(parent.key())
    }
}

fn starts_with_conditional(text: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let regex = RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*if\s+(?:yes|no|not|so|applicable)\b").expect("conditional regex")
    });
    regex.is_match(text)
}

/// Populate ids and parent links over the extracted drafts.
///
/// Numbered questions attach to the most recently seen question carrying
/// their prefix. The scan keeps an explicit stack of open ancestors, one
/// entry per numbering level; when the stack top does not match (numbering
/// that jumps backward or skips levels) resolution backtracks through the
/// set of all seen tokens before declaring an ambiguity. Unnumbered
/// questions nest under their predecessor only on an indentation or
/// conditional-continuation cue.
pub(crate) fn resolve_hierarchy(
    drafts: Vec<QuestionDraft>,
    ambiguities: &mut Vec<String>,
) -> Vec<QuestionRecord> {
    let mut records = Vec::<QuestionRecord>::with_capacity(drafts.len());
    let mut seen = HashSet::<String>::new();
    let mut stack = Vec::<String>::new();

    for (index, draft) in drafts.into_iter().enumerate() {
        let QuestionDraft {
            mut record,
            token,
            indent,
        } = draft;
        let synthetic_id = format!("Q{}", index + 1);

        match token {
            Some(token) => {
                let key = token.key();
                let level = token.level();

                if let Some(parent_key) = token.parent_key() {
                    let stack_parent = stack
                        .get(level.wrapping_sub(2))
                        .is_some_and(|open| *open == parent_key);

                    if stack_parent || seen.contains(&parent_key) {
                        record.parent_id = Some(parent_key);
                    } else {
                        ambiguities.push(format!(
                            "question {key} at {} has no resolvable parent {parent_key}; treating it as a root",
                            record.location.describe()
                        ));
                    }
                }

                if seen.contains(&key) {
                    ambiguities.push(format!(
                        "duplicate question id {key} at {}; the first occurrence stays canonical",
                        record.location.describe()
                    ));
                    record.id = synthetic_id;
                } else {
                    record.id = key.clone();
                    seen.insert(key.clone());

                    stack.truncate(level.saturating_sub(1));
                    if stack.len() + 1 == level {
                        stack.push(key);
                    }
                }
            }
            None => {
                record.id = synthetic_id;

                if indent >= 2 || starts_with_conditional(&record.text) {
                    if let Some(previous) = records.last() {
                        record.parent_id = Some(previous.id.clone());
                    }
                }
            }
        }

        records.push(record);
    }

    records
}
