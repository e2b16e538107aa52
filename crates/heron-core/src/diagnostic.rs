//! Issue reporting for analysis results
//!
//! One `Issue` is a single accessibility finding: stable rule id, severity,
//! message, primary location, WCAG criteria, a confidence record that must
//! always be surfaced, and an optional one-shot text fix. Issues are created
//! per analysis run and never persisted.

use serde::Serialize;

use crate::confidence::{ConfidenceLevel, ConfidenceReport};
use crate::location::SourceLocation;
use crate::rules::Severity;

/// A one-shot text insertion or replacement a consumer may apply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fix {
    pub description: String,
    pub replacement: String,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Serialize)]
pub struct Issue {
    pub rule_id: String,
    pub severity: Severity,
    pub message: String,
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub end_line: usize,
    pub end_column: usize,
    pub wcag: Vec<&'static str>,
    pub related: Vec<SourceLocation>,
    pub confidence: ConfidenceReport,
    pub suggestion: Option<String>,
    pub fix: Option<Fix>,
    /// Whether a rule set the confidence explicitly. Unscored issues
    /// inherit the context score when the registry runs.
    #[serde(skip)]
    scored: bool,
}

impl Issue {
    pub fn new(
        rule_id: &str,
        severity: Severity,
        message: impl Into<String>,
        file: &str,
        line: usize,
        column: usize,
    ) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            severity,
            message: message.into(),
            file: file.to_string(),
            line,
            column,
            end_line: line,
            end_column: column,
            wcag: Vec::new(),
            related: Vec::new(),
            // every issue carries a confidence record; this placeholder is
            // replaced with the context score unless a rule scores the
            // issue itself
            confidence: ConfidenceReport::from_completeness(1.0, "not yet scored"),
            suggestion: None,
            fix: None,
            scored: false,
        }
    }

    pub fn at(rule_id: &str, severity: Severity, message: impl Into<String>, location: &SourceLocation) -> Self {
        let mut issue = Self::new(
            rule_id,
            severity,
            message,
            &location.file,
            location.line,
            location.column,
        );
        if let Some(length) = location.length {
            issue.end_column = location.column + length;
        }
        issue
    }

    pub fn with_end(mut self, line: usize, column: usize) -> Self {
        self.end_line = line;
        self.end_column = column;
        self
    }

    pub fn with_wcag(mut self, criteria: &[&'static str]) -> Self {
        self.wcag = criteria.to_vec();
        self
    }

    pub fn with_related(mut self, location: SourceLocation) -> Self {
        self.related.push(location);
        self
    }

    pub fn with_confidence(mut self, confidence: ConfidenceReport) -> Self {
        self.confidence = confidence;
        self.scored = true;
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_fix(mut self, fix: Fix) -> Self {
        self.fix = Some(fix);
        self
    }

    pub fn location(&self) -> SourceLocation {
        SourceLocation::new(self.file.clone(), self.line, self.column)
    }

    pub fn confidence_level(&self) -> ConfidenceLevel {
        self.confidence.level
    }

    pub fn is_scored(&self) -> bool {
        self.scored
    }

    pub(crate) fn inherit_confidence(&mut self, confidence: ConfidenceReport) {
        self.confidence = confidence;
        self.scored = true;
    }
}
