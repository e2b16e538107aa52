//! Project discovery
//!
//! Walks a project root for analyzable sources, groups them into pages by
//! reading `<script src>` and `<link rel="stylesheet">` references out of
//! each markup file, and keeps a reverse index from any file to the pages
//! that include it.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

use crate::config::Config;
use crate::markup::MarkupTree;

const MARKUP_EXTENSIONS: &[&str] = &["html", "htm"];
const SCRIPT_EXTENSIONS: &[&str] = &["js", "mjs"];
const STYLE_EXTENSIONS: &[&str] = &["css"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Markup,
    Script,
    Style,
}

impl FileKind {
    pub fn of(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        if MARKUP_EXTENSIONS.contains(&ext.as_str()) {
            Some(FileKind::Markup)
        } else if SCRIPT_EXTENSIONS.contains(&ext.as_str()) {
            Some(FileKind::Script)
        } else if STYLE_EXTENSIONS.contains(&ext.as_str()) {
            Some(FileKind::Style)
        } else {
            None
        }
    }
}

#[derive(Debug, Default)]
pub struct Discovery {
    pub files: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

/// Walk `root` and collect analyzable files, honoring the config's
/// include/exclude patterns and the `[project] max_files` ceiling.
///
/// Hitting the ceiling stops the walk and records a warning; callers must
/// surface it rather than pretend the listing is complete.
pub fn discover_files(root: &Path, config: &Config) -> Discovery {
    let mut discovery = Discovery::default();
    let max_files = config.project.max_files;

    if root.is_file() {
        if FileKind::of(root).is_some() {
            discovery.files.push(root.to_path_buf());
        }
        return discovery;
    }

    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if FileKind::of(path).is_none() {
            continue;
        }
        if !matches_patterns(path, &config.include, &config.exclude) {
            continue;
        }
        if discovery.files.len() >= max_files {
            let message = format!(
                "file discovery stopped at the configured ceiling of {max_files} files; \
                 results are incomplete, raise [project] max_files to scan everything"
            );
            warn!("{message}");
            discovery.warnings.push(message);
            break;
        }
        discovery.files.push(path.to_path_buf());
    }

    discovery
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    if entry.depth() == 0 {
        return false;
    }
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.') || name == "node_modules")
        .unwrap_or(false)
}

fn matches_patterns(path: &Path, include: &[String], exclude: &[String]) -> bool {
    let normalized = path.to_string_lossy().replace('\\', "/");
    if exclude.iter().any(|p| normalized.contains(p.as_str())) {
        return false;
    }
    if include.is_empty() {
        return true;
    }
    include.iter().any(|p| normalized.contains(p.as_str()))
}

/// A markup file plus the script and style files it references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub markup_path: PathBuf,
    pub scripts: Vec<PathBuf>,
    pub styles: Vec<PathBuf>,
}

impl Page {
    /// Read `<script src>` and `<link rel="stylesheet" href>` references
    /// out of a parsed markup tree. Relative references resolve against the
    /// markup file's directory; remote URLs are not part of the page model.
    pub fn detect(markup_path: &Path, tree: &MarkupTree) -> Self {
        let base = markup_path.parent().unwrap_or_else(|| Path::new(""));
        let mut scripts = Vec::new();
        let mut styles = Vec::new();

        for id in tree.all_elements() {
            let node = tree.node(id);
            match node.tag_name.as_str() {
                "script" => {
                    if let Some(src) = node.attr("src") {
                        if let Some(resolved) = resolve_reference(base, src) {
                            scripts.push(resolved);
                        }
                    }
                }
                "link" => {
                    let is_stylesheet = node
                        .attr("rel")
                        .map(|rel| rel.eq_ignore_ascii_case("stylesheet"))
                        .unwrap_or(false);
                    if is_stylesheet {
                        if let Some(href) = node.attr("href") {
                            if let Some(resolved) = resolve_reference(base, href) {
                                styles.push(resolved);
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        Self {
            markup_path: markup_path.to_path_buf(),
            scripts,
            styles,
        }
    }
}

fn resolve_reference(base: &Path, reference: &str) -> Option<PathBuf> {
    let reference = reference.trim();
    if reference.is_empty()
        || reference.contains("://")
        || reference.starts_with("//")
        || reference.starts_with("data:")
    {
        return None;
    }
    let joined = if let Some(rooted) = reference.strip_prefix('/') {
        PathBuf::from(rooted)
    } else {
        base.join(reference)
    };
    Some(normalize_path(&joined))
}

/// Lexically resolve `.` and `..` components without touching the
/// filesystem, so unsaved or not-yet-written references still index.
fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !result.pop() {
                    result.push("..");
                }
            }
            other => result.push(other.as_os_str()),
        }
    }
    result
}

/// Every page in the project plus a reverse index from any referenced file
/// to the pages that include it. The scheduler uses the reverse index to
/// decide which pages a file change invalidates.
#[derive(Debug, Default)]
pub struct ProjectIndex {
    pub pages: Vec<Page>,
    by_file: HashMap<PathBuf, Vec<usize>>,
}

impl ProjectIndex {
    pub fn new(pages: Vec<Page>) -> Self {
        let mut by_file: HashMap<PathBuf, Vec<usize>> = HashMap::new();
        for (idx, page) in pages.iter().enumerate() {
            by_file
                .entry(page.markup_path.clone())
                .or_default()
                .push(idx);
            for path in page.scripts.iter().chain(page.styles.iter()) {
                let slot = by_file.entry(path.clone()).or_default();
                if slot.last() != Some(&idx) {
                    slot.push(idx);
                }
            }
        }
        Self { pages, by_file }
    }

    /// Pages affected by a change to `path`, in project order.
    pub fn pages_for_file(&self, path: &Path) -> &[usize] {
        self.by_file
            .get(path)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn page(&self, idx: usize) -> Option<&Page> {
        self.pages.get(idx)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}
