//! JSON output formatter for programmatic integration

use heron_core::confidence::ConfidenceLevel;
use heron_core::diagnostic::Issue;
use heron_core::rules::{RuleCategory, RuleRegistry, Severity};
use serde::Serialize;
use std::collections::HashSet;

#[derive(Serialize)]
pub struct JsonOutput {
    pub version: &'static str,
    pub metadata: JsonMetadata,
    pub summary: JsonSummary,
    pub issues: Vec<JsonIssue>,
}

#[derive(Serialize)]
pub struct JsonMetadata {
    pub heron_version: &'static str,
    pub analyzed_path: String,
}

#[derive(Serialize)]
pub struct JsonSummary {
    pub total_files: usize,
    pub files_with_issues: usize,
    pub total_issues: usize,
    pub by_severity: SeverityCounts,
    pub by_category: CategoryCounts,
}

#[derive(Serialize)]
pub struct SeverityCounts {
    pub error: usize,
    pub warning: usize,
    pub info: usize,
}

#[derive(Serialize)]
pub struct CategoryCounts {
    pub structure: usize,
    pub interaction: usize,
}

#[derive(Serialize)]
pub struct JsonIssue {
    pub rule_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub severity: String,
    pub confidence: JsonConfidence,
    pub message: String,
    pub location: JsonLocation,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub wcag: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix: Option<JsonFix>,
}

#[derive(Serialize)]
pub struct JsonConfidence {
    pub level: String,
    pub reason: String,
    pub completeness: f64,
}

#[derive(Serialize)]
pub struct JsonLocation {
    pub file: String,
    pub start: JsonPosition,
    pub end: JsonPosition,
}

#[derive(Serialize)]
pub struct JsonPosition {
    pub line: usize,
    pub column: usize,
}

#[derive(Serialize)]
pub struct JsonFix {
    pub description: String,
    pub replacement: String,
    pub line: usize,
    pub column: usize,
}

pub struct JsonFormatter<'a> {
    registry: Option<&'a RuleRegistry>,
}

impl<'a> JsonFormatter<'a> {
    pub fn new() -> Self {
        Self { registry: None }
    }

    pub fn with_registry(registry: &'a RuleRegistry) -> Self {
        Self {
            registry: Some(registry),
        }
    }

    pub fn format(&self, issues: &[Issue], total_files: usize, analyzed_path: &str) -> String {
        let output = JsonOutput {
            version: "1",
            metadata: JsonMetadata {
                heron_version: env!("CARGO_PKG_VERSION"),
                analyzed_path: analyzed_path.to_string(),
            },
            summary: self.build_summary(issues, total_files),
            issues: issues.iter().map(|i| self.build_issue(i)).collect(),
        };
        serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
    }

    fn build_summary(&self, issues: &[Issue], total_files: usize) -> JsonSummary {
        let files_with_issues: HashSet<&str> = issues.iter().map(|i| i.file.as_str()).collect();

        let mut by_severity = SeverityCounts {
            error: 0,
            warning: 0,
            info: 0,
        };
        for issue in issues {
            match issue.severity {
                Severity::Error => by_severity.error += 1,
                Severity::Warning => by_severity.warning += 1,
                Severity::Info => by_severity.info += 1,
            }
        }

        let mut by_category = CategoryCounts {
            structure: 0,
            interaction: 0,
        };
        if let Some(registry) = self.registry {
            for issue in issues {
                match registry.get_rule(&issue.rule_id).map(|r| r.metadata().category) {
                    Some(RuleCategory::Structure) => by_category.structure += 1,
                    Some(RuleCategory::Interaction) => by_category.interaction += 1,
                    None => {}
                }
            }
        }

        JsonSummary {
            total_files,
            files_with_issues: files_with_issues.len(),
            total_issues: issues.len(),
            by_severity,
            by_category,
        }
    }

    fn build_issue(&self, issue: &Issue) -> JsonIssue {
        let metadata = self
            .registry
            .and_then(|r| r.get_rule(&issue.rule_id))
            .map(|r| r.metadata());

        JsonIssue {
            rule_id: issue.rule_id.clone(),
            rule_name: metadata.map(|m| m.name.to_string()),
            category: metadata.map(|m| match m.category {
                RuleCategory::Structure => "structure".to_string(),
                RuleCategory::Interaction => "interaction".to_string(),
            }),
            severity: severity_name(issue.severity).to_string(),
            confidence: JsonConfidence {
                level: confidence_name(issue.confidence.level).to_string(),
                reason: issue.confidence.reason.clone(),
                completeness: issue.confidence.raw_completeness,
            },
            message: issue.message.clone(),
            location: JsonLocation {
                file: issue.file.clone(),
                start: JsonPosition {
                    line: issue.line,
                    column: issue.column,
                },
                end: JsonPosition {
                    line: issue.end_line,
                    column: issue.end_column,
                },
            },
            wcag: issue.wcag.iter().map(|c| c.to_string()).collect(),
            suggestion: issue.suggestion.clone(),
            fix: issue.fix.as_ref().map(|f| JsonFix {
                description: f.description.clone(),
                replacement: f.replacement.clone(),
                line: f.location.line,
                column: f.location.column,
            }),
        }
    }
}

impl Default for JsonFormatter<'_> {
    fn default() -> Self {
        Self::new()
    }
}

fn severity_name(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Info => "info",
    }
}

fn confidence_name(level: ConfidenceLevel) -> &'static str {
    match level {
        ConfidenceLevel::High => "high",
        ConfidenceLevel::Medium => "medium",
        ConfidenceLevel::Low => "low",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heron_core::analysis::AnalysisEngine;

    fn sample_issue() -> Issue {
        Issue::new(
            "A001",
            Severity::Error,
            "img element is missing alternative text",
            "index.html",
            3,
            5,
        )
        .with_end(3, 9)
        .with_wcag(&["1.1.1"])
    }

    #[test]
    fn output_is_valid_json_with_expected_shape() {
        let engine = AnalysisEngine::new();
        let formatter = JsonFormatter::with_registry(engine.registry());
        let output = formatter.format(&[sample_issue()], 4, "./site");

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["summary"]["total_files"], 4);
        assert_eq!(parsed["summary"]["total_issues"], 1);
        assert_eq!(parsed["summary"]["by_severity"]["error"], 1);
        assert_eq!(parsed["summary"]["by_category"]["structure"], 1);
        assert_eq!(parsed["issues"][0]["rule_id"], "A001");
        assert_eq!(parsed["issues"][0]["rule_name"], "img-alt");
        assert_eq!(parsed["issues"][0]["location"]["start"]["line"], 3);
        assert_eq!(parsed["issues"][0]["location"]["end"]["column"], 9);
    }

    #[test]
    fn confidence_is_always_serialized() {
        let formatter = JsonFormatter::new();
        let output = formatter.format(&[sample_issue()], 1, ".");

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        let confidence = &parsed["issues"][0]["confidence"];
        assert!(confidence["level"].is_string());
        assert!(confidence["reason"].is_string());
        assert!(confidence["completeness"].is_number());
    }

    #[test]
    fn empty_issue_list_still_produces_a_summary() {
        let formatter = JsonFormatter::new();
        let output = formatter.format(&[], 2, ".");

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["summary"]["total_issues"], 0);
        assert_eq!(parsed["summary"]["files_with_issues"], 0);
        assert!(parsed["issues"].as_array().unwrap().is_empty());
    }
}
