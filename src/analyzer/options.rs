use crate::model::ColumnRole;

/// Hint vocabulary for one column role. Hints longer than two characters
/// match as case-insensitive substrings; shorter hints must match the whole
/// header cell, so `id` does not fire on `Provider`.
#[derive(Debug, Clone)]
pub struct RoleHint {
    pub role: ColumnRole,
    pub hints: Vec<String>,
}

impl RoleHint {
    fn new(role: ColumnRole, hints: &[&str]) -> Self {
        Self {
            role,
            hints: hints.iter().map(|hint| hint.to_string()).collect(),
        }
    }

    pub fn matches(&self, header_text: &str) -> bool {
        let normalized = header_text.trim().to_lowercase();
        self.hints.iter().any(|hint| {
            if hint.chars().count() <= 2 {
                normalized == *hint
            } else {
                normalized.contains(hint.as_str())
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequirementDecision {
    Required,
    Optional,
    Unstated,
    Conflicting,
}

/// Detects required/optional markers in question text. Marker lists are data,
/// not code, so callers can swap the vocabulary without touching detection
/// logic.
#[derive(Debug, Clone)]
pub struct RequirementPolicy {
    pub optional_markers: Vec<String>,
    pub required_markers: Vec<String>,
}

impl Default for RequirementPolicy {
    fn default() -> Self {
        Self {
            optional_markers: ["optional", "if applicable", "if available", "not mandatory"]
                .iter()
                .map(|marker| marker.to_string())
                .collect(),
            required_markers: ["required", "mandatory", "must be answered", "must answer"]
                .iter()
                .map(|marker| marker.to_string())
                .collect(),
        }
    }
}

impl RequirementPolicy {
    pub fn assess(&self, text: &str) -> RequirementDecision {
        let normalized = text.to_lowercase();
        let optional = self
            .optional_markers
            .iter()
            .any(|marker| normalized.contains(marker.as_str()));
        let required = self
            .required_markers
            .iter()
            .any(|marker| normalized.contains(marker.as_str()));

        match (optional, required) {
            (true, true) => RequirementDecision::Conflicting,
            (true, false) => RequirementDecision::Optional,
            (false, true) => RequirementDecision::Required,
            (false, false) => RequirementDecision::Unstated,
        }
    }
}

/// Tunable knobs for one analysis run. The defaults reproduce the stock
/// heuristics; every list is plain data so behavior stays enumerable.
#[derive(Debug, Clone)]
pub struct AnalyzerOptions {
    pub role_hints: Vec<RoleHint>,
    pub requirement_policy: RequirementPolicy,
    /// Minimum distinct role matches before a row counts as the header.
    pub min_header_matches: usize,
    /// Fraction of a column's data cells that must parse as numbering tokens
    /// before the column is re-tagged as question ids.
    pub id_column_threshold: f64,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            role_hints: vec![
                RoleHint::new(
                    ColumnRole::QuestionId,
                    &["id", "no.", "q#", "ref", "number", "#"],
                ),
                RoleHint::new(
                    ColumnRole::QuestionText,
                    &["question", "query", "requirement", "item description", "description"],
                ),
                RoleHint::new(
                    ColumnRole::Response,
                    &["response", "answer", "y/n", "yes/no", "vendor", "supplier"],
                ),
                RoleHint::new(ColumnRole::Comment, &["comment", "remark", "explanation"]),
                RoleHint::new(ColumnRole::Note, &["note", "instruction", "guidance"]),
            ],
            requirement_policy: RequirementPolicy::default(),
            min_header_matches: 2,
            id_column_threshold: 0.6,
        }
    }
}

impl AnalyzerOptions {
    /// First role whose hint vocabulary matches the header cell, in the fixed
    /// role order of `role_hints`.
    pub fn match_role(&self, header_text: &str) -> ColumnRole {
        for role_hint in &self.role_hints {
            if role_hint.matches(header_text) {
                return role_hint.role;
            }
        }
        ColumnRole::Unknown
    }
}
