//! Heron core - static accessibility analysis for web front-end source code
//!
//! Parses markup, observed script behavior, and stylesheets into unified
//! in-memory models, cross-references them by selector, and runs pluggable
//! accessibility rules that emit issues with confidence levels and optional
//! fixes.

pub mod analysis;
pub mod behavior;
pub mod confidence;
pub mod config;
pub mod context;
pub mod diagnostic;
pub mod location;
pub mod markup;
pub mod merge;
pub mod parser;
pub mod project;
pub mod rules;
pub mod scheduler;
pub mod style;

pub use analysis::AnalysisEngine;
pub use behavior::{ActionType, BehaviorCollection, BehaviorNode, ElementRef};
pub use confidence::{ConfidenceLevel, ConfidenceReport};
pub use diagnostic::{Fix, Issue};
pub use location::SourceLocation;
pub use markup::{MarkupTree, Node, NodeId, NodeKind};
pub use merge::{MergeEngine, MergedDocument};
pub use project::{Page, ProjectIndex};
pub use rules::Severity;
pub use scheduler::{PageAnalysis, QueryMode, Scheduler};
pub use style::{Specificity, StyleCollection, StyleProperty, StyleRule};
