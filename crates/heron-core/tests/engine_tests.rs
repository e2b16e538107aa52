//! End-to-end tests of the parse, merge, and analyze pipeline.

use std::sync::Arc;

use heron_core::confidence::{self, ConfidenceLevel};
use heron_core::context::{element_context, Label};
use heron_core::parser::{extract_behaviors, parse_markup, parse_stylesheet};
use heron_core::rules::Severity;
use heron_core::{AnalysisEngine, MergeEngine, MergedDocument};

fn merge_page(html: &str, scripts: &[&str], styles: &[&str]) -> MergedDocument {
    let tree = Arc::new(parse_markup("index.html", html));
    let behaviors = scripts
        .iter()
        .enumerate()
        .map(|(i, src)| Arc::new(extract_behaviors(&format!("script{i}.js"), src)))
        .collect();
    let sheets = styles
        .iter()
        .enumerate()
        .map(|(i, src)| Arc::new(parse_stylesheet(&format!("style{i}.css"), src)))
        .collect();
    MergeEngine::new().merge(tree, behaviors, sheets)
}

#[test]
fn single_complete_fragment_scores_medium() {
    let doc = merge_page("<main><h1>Title</h1><p>Body text</p></main>", &[], &[]);

    assert_eq!(doc.markup.fragment_count(), 1);
    assert!((doc.confidence.raw_completeness - 0.7).abs() < 1e-9);
    assert_eq!(doc.confidence.level, ConfidenceLevel::Medium);
}

#[test]
fn resolved_references_raise_a_single_fragment_to_high() {
    let html = r#"
        <div>
            <label id="name-label">Name</label>
            <input aria-labelledby="name-label">
        </div>
    "#;
    let doc = merge_page(html, &[], &[]);

    // base 0.7 plus the full 0.3 resolution bonus
    assert!((doc.confidence.raw_completeness - 1.0).abs() < 1e-9);
    assert_eq!(doc.confidence.level, ConfidenceLevel::High);
}

#[test]
fn multi_fragment_trees_score_each_fragment_locally() {
    // A file with two top-level fragments. The first is self-contained,
    // the second references an id that only exists in the first.
    let html = r#"<section><span id="hint">hint</span></section><section><input aria-describedby="hint"></section>"#;
    let tree = parse_markup("widgets.html", html);

    assert_eq!(tree.fragment_count(), 2);
    assert!(confidence::is_fragment_complete(&tree, 0));
    assert!(!confidence::is_fragment_complete(&tree, 1));

    // Globally the reference resolves across fragments.
    let report = confidence::estimate(&tree);
    assert!((report.raw_completeness - (0.8 + 0.3_f64).min(1.0)).abs() < 1e-9);
}

#[test]
fn unresolved_references_alone_keep_the_base_score() {
    // One fragment, one dangling reference. The resolution bonus is zero
    // but the score stays exactly at the single-fragment base.
    let doc = merge_page("<div><input aria-labelledby=\"missing\"></div>", &[], &[]);

    assert!((doc.confidence.raw_completeness - 0.7).abs() < 1e-9);
    assert_eq!(doc.confidence.level, ConfidenceLevel::Medium);
}

#[test]
fn behaviors_matching_no_element_are_dropped_and_counted() {
    let doc = merge_page(
        "<button id=\"save\">Save</button>",
        &[r#"
            document.querySelector('#save').addEventListener('click', save);
            document.querySelector('#ghost').addEventListener('click', haunt);
        "#],
        &[],
    );

    let save = doc.markup.query_selector("#save").unwrap();
    assert_eq!(doc.handlers(save).len(), 1);
    assert_eq!(doc.unattached_behaviors, 1);
}

#[test]
fn merge_is_idempotent() {
    let html = "<button class=\"cta\">Go</button>";
    let script = r#"document.querySelector('.cta').addEventListener('click', go);"#;
    let css = ".cta { color: red; }";

    let first = merge_page(html, &[script], &[css]);
    let second = merge_page(html, &[script], &[css]);

    let a = first.markup.query_selector(".cta").unwrap();
    let b = second.markup.query_selector(".cta").unwrap();
    assert_eq!(first.attachments(a), second.attachments(b));
    assert_eq!(first.unattached_behaviors, second.unattached_behaviors);
    assert_eq!(first.confidence, second.confidence);
}

#[test]
fn style_rules_attach_in_specificity_order() {
    let html = "<p id=\"intro\" class=\"lead\">Hello</p>";
    let css = r#"
        p { color: black; }
        .lead { color: gray; }
        #intro { color: blue; }
    "#;
    let doc = merge_page(html, &[], &[css]);

    let id = doc.markup.query_selector("#intro").unwrap();
    let rules = doc.style_rules(id);
    let selectors: Vec<&str> = rules.iter().map(|r| r.selector.as_str()).collect();
    assert_eq!(selectors, vec!["#intro", ".lead", "p"]);
}

#[test]
fn element_context_resolves_labels_and_interactivity() {
    let html = r#"
        <span id="close-label">Close dialog</span>
        <div class="close" aria-labelledby="close-label"></div>
    "#;
    let script = r#"document.querySelector('.close').addEventListener('click', close);"#;
    let doc = merge_page(html, &[script], &[]);

    let id = doc.markup.query_selector(".close").unwrap();
    let ctx = element_context(&doc, id);

    assert!(ctx.interactive);
    assert!(ctx.has_click_handler);
    assert!(!ctx.has_keyboard_handler);
    assert!(!ctx.focusable);
    assert_eq!(ctx.label, Some(Label::Resolved("Close dialog".to_string())));
}

#[test]
fn handler_attachment_implies_interactive() {
    // Elements whose only signal is an attached handler still count as
    // interactive, same as focusable ones.
    let html = "<div class=\"a\"></div><div tabindex=\"0\"></div>";
    let script = r#"document.querySelector('.a').addEventListener('mouseover', hover);"#;
    let doc = merge_page(html, &[script], &[]);

    let with_handler = doc.markup.query_selector(".a").unwrap();
    assert!(element_context(&doc, with_handler).interactive);

    let focusable = doc
        .markup
        .focusable_elements()
        .into_iter()
        .next()
        .expect("tabindex element is focusable");
    assert!(element_context(&doc, focusable).interactive);
}

#[test]
fn clickable_div_without_keyboard_support_is_reported() {
    let html = "<div class=\"card\">Open</div>";
    let script = r#"document.querySelector('.card').addEventListener('click', open);"#;
    let doc = merge_page(html, &[script], &[]);

    let engine = AnalysisEngine::new();
    let issues = engine.analyze_page(&doc);
    let finding = issues
        .iter()
        .find(|i| i.rule_id == "A010")
        .expect("mouse-only clickable element should be flagged");
    assert_eq!(finding.severity, Severity::Error);
}

#[test]
fn keyboard_handler_silences_the_click_rule() {
    let html = "<div class=\"card\" tabindex=\"0\">Open</div>";
    let script = r#"
        const card = document.querySelector('.card');
        card.addEventListener('click', open);
        card.addEventListener('keydown', openFromKey);
    "#;
    let doc = merge_page(html, &[script], &[]);

    let issues = AnalysisEngine::new().analyze_page(&doc);
    assert!(issues.iter().all(|i| i.rule_id != "A010"));
}

#[test]
fn confidence_monotonically_improves_with_resolution_rate() {
    let mut last = 0.0;
    for resolved in 0..=4 {
        let raw = confidence::completeness(1, resolved, 4 - resolved);
        assert!(
            raw >= last,
            "completeness must not drop as more references resolve"
        );
        last = raw;
    }
}

#[test]
fn high_confidence_means_at_least_nine_tenths() {
    for (raw, level) in [
        (1.0, ConfidenceLevel::High),
        (0.9, ConfidenceLevel::High),
        (0.89, ConfidenceLevel::Medium),
        (0.5, ConfidenceLevel::Medium),
        (0.49, ConfidenceLevel::Low),
        (0.0, ConfidenceLevel::Low),
    ] {
        assert_eq!(
            ConfidenceLevel::for_completeness(raw),
            level,
            "raw {raw} mapped to the wrong level"
        );
    }
}

#[test]
fn serialization_round_trips_structure() {
    let html = r#"<ul class="menu"><li><a href="/home">Home</a></li></ul>"#;
    let tree = parse_markup("menu.html", html);
    let serialized = tree.serialize();
    let reparsed = parse_markup("menu.html", &serialized);

    assert_eq!(reparsed.serialize(), serialized);
    assert!(reparsed.query_selector(".menu").is_some());
    assert!(reparsed.query_selector("a").is_some());
}
