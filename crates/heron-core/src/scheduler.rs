//! Incremental analysis scheduler
//!
//! Keeps one cached analysis per page and runs in two modes. Background
//! mode builds pages one `run_background_step` call at a time so a host
//! loop can interleave other work. Interactive mode (`on_file_changed`)
//! invalidates the affected pages, rebuilds them synchronously, then
//! notifies listeners, in that order, so listeners never observe a stale
//! cache entry.
//!
//! Queries against a file whose page has not been built yet fall back to
//! single-file analysis rather than blocking on a page build.

use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::analysis::AnalysisEngine;
use crate::confidence::{ConfidenceLevel, ConfidenceReport};
use crate::diagnostic::Issue;
use crate::merge::{MergeEngine, MergedDocument};
use crate::parser::{extract_behaviors, extract_inline_behaviors, parse_markup, parse_stylesheet};
use crate::project::{FileKind, Page, ProjectIndex};

/// Cached result of building and analyzing one page.
pub struct PageAnalysis {
    pub page: Page,
    pub document: Arc<MergedDocument>,
    pub issues: Vec<Issue>,
    /// Generation of the page at build time. Stale queued builds are
    /// recognized by a mismatch and skipped.
    pub generation: u64,
}

/// Whether a query was answered from the page cache or from the degraded
/// single-file path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    Cached,
    Fallback,
}

pub struct QueryResult {
    pub issues: Vec<Issue>,
    pub mode: QueryMode,
}

type ChangeListener = Box<dyn Fn(&Path, &PageAnalysis) + Send + Sync>;

pub struct Scheduler {
    engine: AnalysisEngine,
    merger: MergeEngine,
    index: ProjectIndex,
    cache: HashMap<PathBuf, Arc<PageAnalysis>>,
    generations: HashMap<PathBuf, u64>,
    queue: VecDeque<(usize, u64)>,
    listeners: Vec<ChangeListener>,
}

impl Scheduler {
    pub fn new(engine: AnalysisEngine, index: ProjectIndex) -> Self {
        let mut scheduler = Self {
            engine,
            merger: MergeEngine::new(),
            index,
            cache: HashMap::new(),
            generations: HashMap::new(),
            queue: VecDeque::new(),
            listeners: Vec::new(),
        };
        scheduler.schedule_all();
        scheduler
    }

    /// Register a listener called after every interactive rebuild.
    pub fn subscribe(&mut self, listener: ChangeListener) {
        self.listeners.push(listener);
    }

    pub fn cached(&self, markup_path: &Path) -> Option<&Arc<PageAnalysis>> {
        self.cache.get(markup_path)
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Queue every page for a background build. Requeueing a page bumps
    /// its generation so builds already queued for it become stale.
    pub fn schedule_all(&mut self) {
        for idx in 0..self.index.len() {
            self.schedule_page(idx);
        }
    }

    fn schedule_page(&mut self, idx: usize) {
        let Some(page) = self.index.page(idx) else {
            return;
        };
        let generation = self
            .generations
            .entry(page.markup_path.clone())
            .and_modify(|g| *g += 1)
            .or_insert(1);
        self.queue.push_back((idx, *generation));
    }

    /// Build at most one page, then return so the caller can interleave
    /// other work. Stale queue entries are skipped without building.
    /// Returns false once the queue is exhausted.
    pub fn run_background_step(&mut self) -> bool {
        while let Some((idx, generation)) = self.queue.pop_front() {
            let Some(page) = self.index.page(idx) else {
                continue;
            };
            let current = self
                .generations
                .get(&page.markup_path)
                .copied()
                .unwrap_or(0);
            if generation != current {
                debug!(
                    page = %page.markup_path.display(),
                    "skipping stale queued build"
                );
                continue;
            }
            self.build_page(idx, generation);
            return true;
        }
        false
    }

    /// Drain the background queue. Used at startup and in tests.
    pub fn run_to_completion(&mut self) {
        while self.run_background_step() {}
    }

    /// Interactive update path. Invalidates every page that includes
    /// `path`, rebuilds them synchronously, then notifies listeners.
    pub fn on_file_changed(&mut self, path: &Path) {
        let affected: Vec<usize> = self.index.pages_for_file(path).to_vec();
        if affected.is_empty() {
            debug!(file = %path.display(), "change does not affect any known page");
            return;
        }

        // A markup edit can add or remove script/link references, so the
        // page model is re-detected before rebuilding.
        if FileKind::of(path) == Some(FileKind::Markup) {
            self.redetect_page(path);
        }

        for idx in affected {
            let Some(page) = self.index.page(idx) else {
                continue;
            };
            let markup_path = page.markup_path.clone();
            self.cache.remove(&markup_path);
            let generation = self
                .generations
                .entry(markup_path.clone())
                .and_modify(|g| *g += 1)
                .or_insert(1);
            let generation = *generation;

            if let Some(analysis) = self.build_page(idx, generation) {
                for listener in &self.listeners {
                    listener(path, &analysis);
                }
            }
        }
    }

    /// Answer a query for one file. Cached page results win; otherwise a
    /// degraded single-file analysis runs so the caller is never blocked
    /// on a page build. `source` overrides the on-disk contents for the
    /// fallback path, for callers holding an unsaved buffer.
    pub fn query(&self, path: &Path, source: Option<&str>) -> QueryResult {
        let mut issues = Vec::new();
        let mut hit = false;
        for &idx in self.index.pages_for_file(path) {
            if let Some(page) = self.index.page(idx) {
                if let Some(analysis) = self.cache.get(&page.markup_path) {
                    issues.extend(analysis.issues.iter().cloned());
                    hit = true;
                }
            }
        }
        if hit {
            return QueryResult {
                issues,
                mode: QueryMode::Cached,
            };
        }
        QueryResult {
            issues: self.analyze_single_file(path, source),
            mode: QueryMode::Fallback,
        }
    }

    fn analyze_single_file(&self, path: &Path, source: Option<&str>) -> Vec<Issue> {
        let source = match source {
            Some(source) => source.to_string(),
            None => match fs::read_to_string(path) {
                Ok(source) => source,
                Err(err) => {
                    warn!(file = %path.display(), %err, "cannot read file for fallback analysis");
                    return Vec::new();
                }
            },
        };
        let name = path.to_string_lossy();
        match FileKind::of(path) {
            Some(FileKind::Script) => {
                let behaviors = extract_behaviors(&name, &source);
                self.engine.analyze_behavior(&behaviors)
            }
            Some(FileKind::Markup) => {
                // Markup alone still merges, so structural rules run with
                // the confidence penalty the missing collections imply.
                let tree = Arc::new(parse_markup(&name, &source));
                let inline = extract_inline_behaviors(&tree);
                let behaviors = if inline.is_empty() {
                    vec![]
                } else {
                    vec![Arc::new(inline)]
                };
                let doc = self.merger.merge(tree, behaviors, vec![]);
                self.engine.analyze_page(&doc)
            }
            _ => Vec::new(),
        }
    }

    fn redetect_page(&mut self, markup_path: &Path) {
        let Ok(source) = fs::read_to_string(markup_path) else {
            return;
        };
        let tree = parse_markup(&markup_path.to_string_lossy(), &source);
        let detected = Page::detect(markup_path, &tree);

        let mut pages = std::mem::take(&mut self.index).pages;
        for page in pages.iter_mut() {
            if page.markup_path == markup_path {
                *page = detected.clone();
            }
        }
        self.index = ProjectIndex::new(pages);
    }

    fn build_page(&mut self, idx: usize, generation: u64) -> Option<Arc<PageAnalysis>> {
        let page = self.index.page(idx)?.clone();
        let markup_source = match fs::read_to_string(&page.markup_path) {
            Ok(source) => source,
            Err(err) => {
                error!(
                    page = %page.markup_path.display(),
                    %err,
                    "cannot read markup file, dropping page from cache"
                );
                self.cache.remove(&page.markup_path);
                return None;
            }
        };
        let tree = Arc::new(parse_markup(
            &page.markup_path.to_string_lossy(),
            &markup_source,
        ));

        let mut missing_inputs = 0usize;
        let mut behaviors = Vec::new();
        let inline = extract_inline_behaviors(&tree);
        if !inline.is_empty() {
            behaviors.push(Arc::new(inline));
        }
        for script in &page.scripts {
            match fs::read_to_string(script) {
                Ok(source) => {
                    behaviors.push(Arc::new(extract_behaviors(
                        &script.to_string_lossy(),
                        &source,
                    )));
                }
                Err(err) => {
                    warn!(file = %script.display(), %err, "referenced script is unreadable");
                    missing_inputs += 1;
                }
            }
        }
        let mut styles = Vec::new();
        for style in &page.styles {
            match fs::read_to_string(style) {
                Ok(source) => {
                    styles.push(Arc::new(parse_stylesheet(
                        &style.to_string_lossy(),
                        &source,
                    )));
                }
                Err(err) => {
                    warn!(file = %style.display(), %err, "referenced stylesheet is unreadable");
                    missing_inputs += 1;
                }
            }
        }

        let mut doc = self.merger.merge(tree, behaviors, styles);
        if missing_inputs > 0 {
            doc.confidence = degrade_confidence(&doc.confidence, missing_inputs);
        }
        let issues = self.engine.analyze_page(&doc);

        let analysis = Arc::new(PageAnalysis {
            page: page.clone(),
            document: Arc::new(doc),
            issues,
            generation,
        });
        self.cache
            .insert(page.markup_path.clone(), Arc::clone(&analysis));
        debug!(
            page = %page.markup_path.display(),
            generation,
            issues = analysis.issues.len(),
            "page analysis cached"
        );
        Some(analysis)
    }
}

/// Unreadable referenced files mean the page model is incomplete even when
/// the markup itself fused cleanly, so the report is capped below High.
fn degrade_confidence(report: &ConfidenceReport, missing_inputs: usize) -> ConfidenceReport {
    let level = if report.level == ConfidenceLevel::High {
        ConfidenceLevel::Medium
    } else {
        report.level
    };
    ConfidenceReport {
        level,
        reason: format!(
            "{} ({missing_inputs} referenced file(s) could not be read)",
            report.reason
        ),
        raw_completeness: report.raw_completeness,
    }
}
