//! Scheduler tests over real temporary project trees.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tempfile::TempDir;

use heron_core::analysis::AnalysisEngine;
use heron_core::parser::parse_markup;
use heron_core::project::{Page, ProjectIndex};
use heron_core::scheduler::{QueryMode, Scheduler};

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

fn detect_page(markup_path: &Path) -> Page {
    let source = fs::read_to_string(markup_path).unwrap();
    let tree = parse_markup(&markup_path.to_string_lossy(), &source);
    Page::detect(markup_path, &tree)
}

fn project(dir: &TempDir, markup_files: &[&str]) -> ProjectIndex {
    let pages = markup_files
        .iter()
        .map(|name| detect_page(&dir.path().join(name)))
        .collect();
    ProjectIndex::new(pages)
}

#[test]
fn background_steps_build_one_page_at_a_time() {
    let dir = TempDir::new().unwrap();
    write(&dir, "a.html", "<img src=\"x.png\">");
    write(&dir, "b.html", "<p>fine</p>");

    let mut scheduler = Scheduler::new(AnalysisEngine::new(), project(&dir, &["a.html", "b.html"]));

    assert!(scheduler.run_background_step());
    assert!(scheduler.run_background_step());
    assert!(!scheduler.run_background_step(), "queue should be drained");

    let a = scheduler.cached(&dir.path().join("a.html")).unwrap();
    assert!(a.issues.iter().any(|i| i.rule_id == "A001"));
    let b = scheduler.cached(&dir.path().join("b.html")).unwrap();
    assert!(b.issues.iter().all(|i| i.rule_id != "A001"));
}

#[test]
fn query_prefers_the_cached_page_analysis() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "index.html",
        r#"<script src="app.js"></script><div class="card">Open</div>"#,
    );
    let script = write(
        &dir,
        "app.js",
        r#"document.querySelector('.card').addEventListener('click', open);"#,
    );

    let mut scheduler = Scheduler::new(AnalysisEngine::new(), project(&dir, &["index.html"]));
    scheduler.run_to_completion();

    let result = scheduler.query(&script, None);
    assert_eq!(result.mode, QueryMode::Cached);
    // With the full page model the mouse-only click is an error, not the
    // softer single-file warning.
    assert!(result
        .issues
        .iter()
        .any(|i| i.rule_id == "A010" && i.severity == heron_core::Severity::Error));
}

#[test]
fn query_falls_back_to_single_file_analysis_before_the_page_builds() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "index.html",
        r#"<script src="app.js"></script><div class="card">Open</div>"#,
    );
    let script = write(
        &dir,
        "app.js",
        r#"document.querySelector('.card').addEventListener('click', open);"#,
    );

    // No background steps have run yet.
    let scheduler = Scheduler::new(AnalysisEngine::new(), project(&dir, &["index.html"]));
    let result = scheduler.query(&script, None);

    assert_eq!(result.mode, QueryMode::Fallback);
    assert!(result.issues.iter().any(|i| i.rule_id == "A010"));
    for issue in &result.issues {
        assert_eq!(
            issue.confidence.level,
            heron_core::ConfidenceLevel::Low,
            "fallback results must carry low confidence"
        );
    }
}

#[test]
fn query_uses_an_unsaved_buffer_over_disk_contents() {
    let dir = TempDir::new().unwrap();
    write(&dir, "index.html", "<p>unrelated</p>");
    let script = write(&dir, "untracked.js", "// empty on disk\n");

    let scheduler = Scheduler::new(AnalysisEngine::new(), project(&dir, &["index.html"]));
    let buffer = r#"document.querySelector('.card').addEventListener('click', open);"#;
    let result = scheduler.query(&script, Some(buffer));

    assert_eq!(result.mode, QueryMode::Fallback);
    assert!(
        result.issues.iter().any(|i| i.rule_id == "A010"),
        "analysis must see the buffer, not the stale file"
    );
}

#[test]
fn file_change_invalidates_rebuilds_then_notifies() {
    let dir = TempDir::new().unwrap();
    let markup = write(&dir, "index.html", "<img src=\"x.png\">");

    let mut scheduler = Scheduler::new(AnalysisEngine::new(), project(&dir, &["index.html"]));
    scheduler.run_to_completion();
    assert!(scheduler
        .cached(&markup)
        .unwrap()
        .issues
        .iter()
        .any(|i| i.rule_id == "A001"));

    let notified = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&notified);
    scheduler.subscribe(Box::new(move |_, analysis| {
        // The listener observes the already rebuilt analysis.
        assert!(analysis.issues.iter().all(|i| i.rule_id != "A001"));
        seen.fetch_add(1, Ordering::SeqCst);
    }));

    fs::write(&markup, "<img src=\"x.png\" alt=\"diagram\">").unwrap();
    scheduler.on_file_changed(&markup);

    assert_eq!(notified.load(Ordering::SeqCst), 1);
    let rebuilt = scheduler.cached(&markup).unwrap();
    assert!(rebuilt.issues.iter().all(|i| i.rule_id != "A001"));
}

#[test]
fn script_change_rebuilds_every_page_that_includes_it() {
    let dir = TempDir::new().unwrap();
    let a = write(
        &dir,
        "a.html",
        r#"<script src="shared.js"></script><div class="card">A</div>"#,
    );
    let b = write(
        &dir,
        "b.html",
        r#"<script src="shared.js"></script><div class="card">B</div>"#,
    );
    let shared = write(&dir, "shared.js", "// nothing yet\n");

    let mut scheduler = Scheduler::new(AnalysisEngine::new(), project(&dir, &["a.html", "b.html"]));
    scheduler.run_to_completion();
    assert!(scheduler
        .cached(&a)
        .unwrap()
        .issues
        .iter()
        .all(|i| i.rule_id != "A010"));

    fs::write(
        &shared,
        r#"document.querySelector('.card').addEventListener('click', open);"#,
    )
    .unwrap();
    scheduler.on_file_changed(&shared);

    for page in [&a, &b] {
        let analysis = scheduler.cached(page).unwrap();
        assert!(
            analysis.issues.iter().any(|i| i.rule_id == "A010"),
            "{} should pick up the new click handler",
            page.display()
        );
    }
}

#[test]
fn requeued_builds_coalesce_to_the_newest_generation() {
    let dir = TempDir::new().unwrap();
    write(&dir, "index.html", "<p>hi</p>");

    let mut scheduler = Scheduler::new(AnalysisEngine::new(), project(&dir, &["index.html"]));
    // Requeue the same page twice more; only the newest generation runs.
    scheduler.schedule_all();
    scheduler.schedule_all();
    assert_eq!(scheduler.pending(), 3);

    assert!(scheduler.run_background_step());
    assert!(
        !scheduler.run_background_step(),
        "stale generations must be skipped, not rebuilt"
    );

    let analysis = scheduler
        .cached(&dir.path().join("index.html"))
        .unwrap();
    assert_eq!(analysis.generation, 3);
}

#[test]
fn markup_edits_update_the_page_reference_model() {
    let dir = TempDir::new().unwrap();
    let markup = write(&dir, "index.html", "<div class=\"card\">Open</div>");
    let script = write(
        &dir,
        "app.js",
        r#"document.querySelector('.card').addEventListener('click', open);"#,
    );

    let mut scheduler = Scheduler::new(AnalysisEngine::new(), project(&dir, &["index.html"]));
    scheduler.run_to_completion();
    assert!(scheduler
        .cached(&markup)
        .unwrap()
        .issues
        .iter()
        .all(|i| i.rule_id != "A010"));

    // The edit adds a script reference; redetection must pick it up.
    fs::write(
        &markup,
        r#"<script src="app.js"></script><div class="card">Open</div>"#,
    )
    .unwrap();
    scheduler.on_file_changed(&markup);

    let rebuilt = scheduler.cached(&markup).unwrap();
    assert!(rebuilt.page.scripts.contains(&script));
    assert!(rebuilt.issues.iter().any(|i| i.rule_id == "A010"));
}
