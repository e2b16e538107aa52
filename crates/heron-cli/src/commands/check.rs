//! Check command - analyzes a project for accessibility issues

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use heron_core::analysis::AnalysisEngine;
use heron_core::config::load_config_or_default_with_warnings;
use heron_core::confidence::ConfidenceLevel;
use heron_core::diagnostic::Issue;
use heron_core::merge::MergeEngine;
use heron_core::parser::{extract_behaviors, extract_inline_behaviors, parse_markup, parse_stylesheet};
use heron_core::project::{discover_files, FileKind, Page, ProjectIndex};
use heron_core::rules::Severity;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tracing::warn;

use crate::output::json::JsonFormatter;
use crate::output::pretty::PrettyFormatter;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Path to file or directory to analyze
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Output format for issues (pretty, text, json)
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Fail on warnings (exit code 1)
    #[arg(long)]
    pub fail_on_warnings: bool,

    /// Filter issues by minimum severity level (error, warning, info)
    #[arg(long, value_name = "LEVEL")]
    pub severity: Option<String>,

    /// Filter issues by minimum confidence level (high, medium, low)
    #[arg(long, value_name = "LEVEL", default_value = "low")]
    pub min_confidence: String,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

impl CheckArgs {
    pub fn run(&self) -> Result<()> {
        self.configure_colors();

        if !self.path.exists() {
            anyhow::bail!("Path does not exist: {}", self.path.display());
        }

        let config_dir = if self.path.is_file() {
            self.path.parent().unwrap_or(Path::new(".")).to_path_buf()
        } else {
            self.path.clone()
        };
        let config_result = load_config_or_default_with_warnings(&config_dir);
        surface_warnings(&config_result.warnings);
        let config = config_result.config;

        let discovery = discover_files(&self.path, &config);
        surface_warnings(&discovery.warnings);
        if discovery.files.is_empty() {
            println!("No HTML, CSS, or JavaScript files found.");
            return Ok(());
        }

        let engine = AnalysisEngine::with_config(&config);
        let min_severity = self.parse_severity()?;
        let min_confidence = self.parse_confidence()?;

        let (issues, sources) = analyze_project(&engine, &discovery.files);

        let config_min_confidence: Option<ConfidenceLevel> =
            config.rules.min_confidence.map(Into::into);
        let all_issues: Vec<Issue> = issues
            .into_iter()
            .filter(|i| i.severity.rank() >= min_severity.rank())
            .filter(|i| i.confidence.level.rank() >= min_confidence.rank())
            .filter(|i| match config_min_confidence {
                Some(level) => i.confidence.level.rank() >= level.rank(),
                None => true,
            })
            .collect();

        let error_count = all_issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count();
        let warning_count = all_issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count();

        match self.format.as_str() {
            "json" => {
                let formatter = JsonFormatter::with_registry(engine.registry());
                println!(
                    "{}",
                    formatter.format(
                        &all_issues,
                        discovery.files.len(),
                        &self.path.to_string_lossy()
                    )
                );
            }
            "text" => output_text(&all_issues),
            _ => {
                let formatter = PrettyFormatter::with_sources(sources);
                print!("{}", formatter.format(&all_issues));
            }
        }

        if error_count > 0 || (warning_count > 0 && self.fail_on_warnings) {
            process::exit(1);
        }

        Ok(())
    }

    fn parse_severity(&self) -> Result<Severity> {
        match self.severity.as_deref() {
            Some("error") => Ok(Severity::Error),
            Some("warning") => Ok(Severity::Warning),
            Some("info") | None => Ok(Severity::Info),
            Some(other) => anyhow::bail!(
                "Invalid severity '{}'. Valid values: error, warning, info",
                other
            ),
        }
    }

    fn parse_confidence(&self) -> Result<ConfidenceLevel> {
        match self.min_confidence.as_str() {
            "high" => Ok(ConfidenceLevel::High),
            "medium" => Ok(ConfidenceLevel::Medium),
            "low" => Ok(ConfidenceLevel::Low),
            other => anyhow::bail!(
                "Invalid confidence '{}'. Valid values: high, medium, low",
                other
            ),
        }
    }

    fn configure_colors(&self) {
        let no_color_env = std::env::var("NO_COLOR").is_ok();
        if self.no_color || no_color_env {
            colored::control::set_override(false);
        }
    }
}

/// Warnings go to the log stream as well as stderr so editor hosts that
/// capture the subscriber still see them.
fn surface_warnings(warnings: &[String]) {
    for warning in warnings {
        warn!("{warning}");
        eprintln!("{} {}", "warning:".yellow().bold(), warning);
    }
}

/// Runs the page pipeline over every discovered markup file, then the
/// single-file pipeline over scripts no page references. Returns the
/// issues plus a source cache for the pretty formatter.
fn analyze_project(
    engine: &AnalysisEngine,
    files: &[PathBuf],
) -> (Vec<Issue>, HashMap<String, String>) {
    let markup_files: Vec<&PathBuf> = files
        .iter()
        .filter(|f| FileKind::of(f) == Some(FileKind::Markup))
        .collect();

    let pages: Vec<Page> = markup_files
        .par_iter()
        .filter_map(|path| {
            let source = fs::read_to_string(path).ok()?;
            let tree = parse_markup(&path.to_string_lossy(), &source);
            Some(Page::detect(path, &tree))
        })
        .collect();
    let index = ProjectIndex::new(pages);

    let mut issues: Vec<Issue> = index
        .pages
        .par_iter()
        .flat_map(|page| analyze_page(engine, page))
        .collect();

    let referenced: HashSet<&Path> = index
        .pages
        .iter()
        .flat_map(|p| p.scripts.iter().map(PathBuf::as_path))
        .collect();
    let standalone: Vec<Issue> = files
        .par_iter()
        .filter(|f| FileKind::of(f) == Some(FileKind::Script))
        .filter(|f| !referenced.contains(f.as_path()))
        .flat_map(|path| {
            let Ok(source) = fs::read_to_string(path) else {
                return Vec::new();
            };
            let behaviors = extract_behaviors(&path.to_string_lossy(), &source);
            engine.analyze_behavior(&behaviors)
        })
        .collect();
    issues.extend(standalone);

    let mut sources = HashMap::new();
    for path in files {
        if let Ok(content) = fs::read_to_string(path) {
            sources.insert(path.to_string_lossy().to_string(), content);
        }
    }

    (issues, sources)
}

fn analyze_page(engine: &AnalysisEngine, page: &Page) -> Vec<Issue> {
    let Ok(markup_source) = fs::read_to_string(&page.markup_path) else {
        return Vec::new();
    };
    let tree = Arc::new(parse_markup(
        &page.markup_path.to_string_lossy(),
        &markup_source,
    ));

    let mut behaviors = Vec::new();
    let inline = extract_inline_behaviors(&tree);
    if !inline.is_empty() {
        behaviors.push(Arc::new(inline));
    }
    behaviors.extend(page.scripts.iter().filter_map(|path| {
        let source = fs::read_to_string(path).ok()?;
        Some(Arc::new(extract_behaviors(
            &path.to_string_lossy(),
            &source,
        )))
    }));
    let styles = page
        .styles
        .iter()
        .filter_map(|path| {
            let source = fs::read_to_string(path).ok()?;
            Some(Arc::new(parse_stylesheet(&path.to_string_lossy(), &source)))
        })
        .collect();

    let doc = MergeEngine::new().merge(tree, behaviors, styles);
    engine.analyze_page(&doc)
}

fn output_text(issues: &[Issue]) {
    for issue in issues {
        let severity_str = match issue.severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
            Severity::Info => "info".blue().bold(),
        };

        println!(
            "{}:{}:{}: {} [{}]: {}",
            issue.file, issue.line, issue.column, severity_str, issue.rule_id.dimmed(), issue.message
        );

        if let Some(suggestion) = &issue.suggestion {
            println!("  {} {}", "suggestion:".green(), suggestion);
        }
    }

    let error_count = issues
        .iter()
        .filter(|i| i.severity == Severity::Error)
        .count();
    let warning_count = issues
        .iter()
        .filter(|i| i.severity == Severity::Warning)
        .count();

    if !issues.is_empty() {
        println!();
        println!(
            "Found {} error(s) and {} warning(s)",
            error_count, warning_count
        );
    }
}
