//! Pretty formatter for human-readable terminal output
//!
//! Displays issues with colors, source code context, confidence, and a
//! closing summary.

use colored::{ColoredString, Colorize};
use heron_core::confidence::ConfidenceLevel;
use heron_core::diagnostic::Issue;
use heron_core::rules::Severity;
use std::collections::HashMap;
use std::fs;

pub struct PrettyFormatter {
    sources: HashMap<String, String>,
}

impl PrettyFormatter {
    pub fn new() -> Self {
        Self {
            sources: HashMap::new(),
        }
    }

    pub fn with_sources(sources: HashMap<String, String>) -> Self {
        Self { sources }
    }

    pub fn format(&self, issues: &[Issue]) -> String {
        let mut output = String::new();

        for issue in issues {
            output.push_str(&self.format_issue(issue));
            output.push('\n');
        }

        if !issues.is_empty() {
            output.push_str(&self.format_summary(issues));
        }

        output
    }

    fn format_issue(&self, issue: &Issue) -> String {
        let mut lines = Vec::new();

        let severity_str = colorize_severity(issue.severity);
        lines.push(format!(
            "{}[{}]: {}",
            severity_str,
            issue.rule_id.dimmed(),
            issue.message
        ));

        lines.push(format!(
            "  {} {}:{}:{}",
            "-->".blue(),
            issue.file,
            issue.line,
            issue.column
        ));

        if let Some(source_line) = self.get_source_line(&issue.file, issue.line) {
            let line_num_width = issue.line.to_string().len();
            let padding = " ".repeat(line_num_width);

            lines.push(format!("{} {}", padding, "|".blue()));
            lines.push(format!(
                "{} {} {}",
                issue.line.to_string().blue(),
                "|".blue(),
                source_line
            ));

            let caret_padding = " ".repeat(issue.column.saturating_sub(1));
            let caret_len = if issue.end_column > issue.column && issue.end_line == issue.line {
                issue.end_column - issue.column
            } else {
                1
            };
            lines.push(format!(
                "{} {} {}{}",
                padding,
                "|".blue(),
                caret_padding,
                "^".repeat(caret_len).red()
            ));
            lines.push(format!("{} {}", padding, "|".blue()));
        }

        let confidence_str = match issue.confidence.level {
            ConfidenceLevel::High => "high".green(),
            ConfidenceLevel::Medium => "medium".yellow(),
            ConfidenceLevel::Low => "low".red(),
        };
        lines.push(format!(
            "  {} {} ({})",
            "confidence:".dimmed(),
            confidence_str,
            issue.confidence.reason.dimmed()
        ));

        if !issue.wcag.is_empty() {
            lines.push(format!("  {} {}", "wcag:".dimmed(), issue.wcag.join(", ")));
        }

        for related in &issue.related {
            lines.push(format!("  {} {}", "related:".dimmed(), related));
        }

        if let Some(suggestion) = &issue.suggestion {
            lines.push(format!("  {} {}", "suggestion:".green(), suggestion));
        }

        lines.join("\n") + "\n"
    }

    fn get_source_line(&self, file: &str, line: usize) -> Option<String> {
        if let Some(source) = self.sources.get(file) {
            return source.lines().nth(line.checked_sub(1)?).map(str::to_string);
        }
        if let Ok(content) = fs::read_to_string(file) {
            return content.lines().nth(line.checked_sub(1)?).map(str::to_string);
        }
        None
    }

    fn format_summary(&self, issues: &[Issue]) -> String {
        let error_count = issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count();
        let warning_count = issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count();
        let info_count = issues.len() - error_count - warning_count;

        let mut parts = Vec::new();
        if error_count > 0 {
            parts.push(
                format!("{} error{}", error_count, plural(error_count))
                    .red()
                    .bold()
                    .to_string(),
            );
        }
        if warning_count > 0 {
            parts.push(
                format!("{} warning{}", warning_count, plural(warning_count))
                    .yellow()
                    .bold()
                    .to_string(),
            );
        }
        if info_count > 0 {
            parts.push(format!("{} info", info_count).blue().to_string());
        }

        format!("Found {}\n", parts.join(", "))
    }
}

impl Default for PrettyFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn colorize_severity(severity: Severity) -> ColoredString {
    match severity {
        Severity::Error => "error".red().bold(),
        Severity::Warning => "warning".yellow().bold(),
        Severity::Info => "info".blue().bold(),
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}
