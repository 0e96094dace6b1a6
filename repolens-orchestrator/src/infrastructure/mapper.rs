//! Structural mapper
//!
//! Two-pass best-effort scan of a working directory that renders a Mermaid
//! flow diagram: pass 1 discovers nodes from supported source files, pass 2
//! discovers directed import edges via single-line pattern matching. Sparse
//! results fall back to a directory-containment graph. Per-file read errors
//! are counted and skipped; the scan itself never fails.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;
use walkdir::WalkDir;

/// File extensions considered source code for mapping purposes.
const SUPPORTED_EXTENSIONS: [&str; 5] = ["js", "jsx", "ts", "tsx", "py"];

/// Directories never descended into (build artifacts, caches, VCS, tests).
const IGNORED_DIRS: [&str; 13] = [
    "node_modules",
    "venv",
    ".venv",
    "dist",
    "build",
    ".git",
    "test",
    "tests",
    "__pycache__",
    "target",
    "vendor",
    "coverage",
    ".next",
];

/// Below this many import edges the import graph is considered too sparse
/// to be useful and the directory fallback kicks in.
const MIN_IMPORT_EDGES: usize = 3;
const MAX_IMPORT_EDGES: usize = 40;
const MAX_FALLBACK_EDGES: usize = 50;
const MAX_FILES_PER_DIR: usize = 5;

// import X from './path'  |  require('./path')
static JS_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:import\s+.*?\s+from\s+['"]([^'"]+)['"])|(?:require\(\s*['"]([^'"]+)['"]\))"#)
        .expect("invalid JS import pattern")
});

// from x.y import z  |  import x.y
static PY_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:from\s+([\w.]+)\s+import)|(?:import\s+([\w.]+))")
        .expect("invalid Python import pattern")
});

/// How the rendered graph was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphMode {
    /// Edges are import relations between source files.
    Imports,
    /// Too few imports were found; edges are directory containment.
    DirectoryTree,
    /// Nothing scannable at all; a minimal two-node placeholder.
    Placeholder,
}

/// Rendered graph plus scan accounting.
#[derive(Debug, Clone)]
pub struct GraphDescription {
    /// Mermaid flow-diagram text.
    pub graph: String,
    pub mode: GraphMode,
    /// Edges actually rendered (after capping).
    pub edge_count: usize,
    /// Files that could not be read during scanning.
    pub skipped_files: usize,
}

/// Best-effort architecture mapper.
#[derive(Debug, Default, Clone)]
pub struct StructuralMapper;

impl StructuralMapper {
    pub fn new() -> Self {
        Self
    }

    /// Scan `root` and render a Mermaid graph description.
    pub fn map(&self, root: &Path) -> GraphDescription {
        let files = Self::collect_source_files(root);
        let (node_names, node_by_path) = Self::discover_nodes(&files);

        let mut skipped_files = 0usize;
        let edges = Self::discover_import_edges(&files, &node_names, &node_by_path, &mut skipped_files);

        if edges.len() >= MIN_IMPORT_EDGES {
            let rendered: Vec<String> = edges
                .iter()
                .take(MAX_IMPORT_EDGES)
                .map(|(from, to)| format!("{} --> {}", from, to))
                .collect();
            return GraphDescription {
                edge_count: rendered.len(),
                graph: Self::render(&rendered),
                mode: GraphMode::Imports,
                skipped_files,
            };
        }

        debug!(
            import_edges = edges.len(),
            "Few explicit imports found; falling back to directory graph"
        );

        let fallback = Self::directory_edges(root);
        if fallback.is_empty() {
            let rendered = vec!["Root --> src".to_string(), "src --> App".to_string()];
            return GraphDescription {
                edge_count: rendered.len(),
                graph: Self::render(&rendered),
                mode: GraphMode::Placeholder,
                skipped_files,
            };
        }

        let rendered: Vec<String> = fallback.into_iter().take(MAX_FALLBACK_EDGES).collect();
        GraphDescription {
            edge_count: rendered.len(),
            graph: Self::render(&rendered),
            mode: GraphMode::DirectoryTree,
            skipped_files,
        }
    }

    /// Supported source files in deterministic (name-sorted) walk order.
    fn collect_source_files(root: &Path) -> Vec<PathBuf> {
        WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_ignored(e))
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                entry
                    .path()
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext))
            })
            .map(|entry| entry.into_path())
            .collect()
    }

    /// Pass 1: derive deduplicated node names from file stems. A stem already
    /// claimed by a different file is disambiguated with the parent
    /// directory's basename.
    fn discover_nodes(files: &[PathBuf]) -> (HashSet<String>, HashMap<PathBuf, String>) {
        let mut node_names: HashSet<String> = HashSet::new();
        let mut node_by_path: HashMap<PathBuf, String> = HashMap::new();

        for path in files {
            let stem = match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) => sanitize(stem),
                None => continue,
            };

            let name = if node_names.contains(&stem) {
                let parent = path
                    .parent()
                    .and_then(|p| p.file_name())
                    .and_then(|n| n.to_str())
                    .map(sanitize)
                    .unwrap_or_else(|| "root".to_string());
                format!("{}_{}", stem, parent)
            } else {
                stem
            };

            node_names.insert(name.clone());
            node_by_path.insert(path.clone(), name);
        }

        (node_names, node_by_path)
    }

    /// Pass 2: single-line import matching. Multi-line import statements are
    /// not guaranteed to be found; this is deliberate best-effort.
    fn discover_import_edges(
        files: &[PathBuf],
        node_names: &HashSet<String>,
        node_by_path: &HashMap<PathBuf, String>,
        skipped_files: &mut usize,
    ) -> Vec<(String, String)> {
        let mut edges: Vec<(String, String)> = Vec::new();
        let mut seen: HashSet<(String, String)> = HashSet::new();

        for path in files {
            let Some(source_node) = node_by_path.get(path) else {
                continue;
            };
            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

            let content = match std::fs::read_to_string(path) {
                Ok(content) => content,
                Err(_) => {
                    *skipped_files += 1;
                    continue;
                }
            };

            for line in content.lines() {
                let target = match ext {
                    "js" | "jsx" | "ts" | "tsx" => JS_IMPORT.captures(line).and_then(|caps| {
                        caps.get(1)
                            .or_else(|| caps.get(2))
                            .map(|m| js_import_target(m.as_str()))
                    }),
                    "py" => PY_IMPORT.captures(line).and_then(|caps| {
                        caps.get(1)
                            .or_else(|| caps.get(2))
                            .map(|m| py_import_target(m.as_str()))
                    }),
                    _ => None,
                };

                let Some(target) = target else { continue };
                if target.is_empty() || &target == source_node {
                    continue;
                }
                if !node_names.contains(&target) {
                    continue;
                }

                let edge = (source_node.clone(), target);
                if seen.insert(edge.clone()) {
                    edges.push(edge);
                }
            }
        }

        edges
    }

    /// Fallback: directory-containment edges. Each directory links to its
    /// immediate subdirectories and to at most [`MAX_FILES_PER_DIR`] of its
    /// supported files.
    fn directory_edges(root: &Path) -> Vec<String> {
        let mut edges: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut files_per_dir: HashMap<PathBuf, usize> = HashMap::new();

        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_ignored(e));

        for entry in walker.filter_map(|e| e.ok()) {
            if entry.depth() == 0 {
                continue;
            }

            let parent_label = entry
                .path()
                .parent()
                .filter(|p| *p != root)
                .and_then(|p| p.file_name())
                .and_then(|n| n.to_str())
                .map(sanitize)
                .unwrap_or_else(|| "Root".to_string());

            if entry.file_type().is_dir() {
                let name = sanitize(&entry.file_name().to_string_lossy());
                let edge = format!("{} --> {}[/{}/]", parent_label, name, name);
                if seen.insert(edge.clone()) {
                    edges.push(edge);
                }
            } else if entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext))
            {
                let dir = entry.path().parent().unwrap_or(root).to_path_buf();
                let count = files_per_dir.entry(dir).or_insert(0);
                if *count >= MAX_FILES_PER_DIR {
                    continue;
                }
                *count += 1;

                let stem = entry
                    .path()
                    .file_stem()
                    .map(|s| sanitize(&s.to_string_lossy()))
                    .unwrap_or_default();
                let edge = format!("{} -.-> {}", parent_label, stem);
                if seen.insert(edge.clone()) {
                    edges.push(edge);
                }
            }
        }

        edges
    }

    fn render(edges: &[String]) -> String {
        let mut graph = String::from("graph TD\n    subgraph System Architecture\n");
        for edge in edges {
            graph.push_str("    ");
            graph.push_str(edge);
            graph.push('\n');
        }
        graph.push_str("    end");
        graph
    }
}

/// Resolve "./components/Button.jsx" -> "Button".
fn js_import_target(import_path: &str) -> String {
    let base = import_path.rsplit('/').next().unwrap_or(import_path);
    let stem = base.rsplit_once('.').map(|(s, _)| s).unwrap_or(base);
    sanitize(stem)
}

/// Resolve "app.services.auth" -> "auth".
fn py_import_target(module_path: &str) -> String {
    let last = module_path.rsplit('.').next().unwrap_or(module_path);
    sanitize(last)
}

/// Mermaid node identifiers tolerate only word characters.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Check if a directory entry should be ignored
pub(crate) fn is_ignored(entry: &walkdir::DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.') || IGNORED_DIRS.contains(&s))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn import_edges_between_known_nodes() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/app.js", "import { helper } from './util'\nimport x from './other'\nrequire('./config')");
        write(dir.path(), "src/util.js", "module.exports = {}");
        write(dir.path(), "src/other.js", "export default 1");
        write(dir.path(), "src/config.js", "export default {}");

        let result = StructuralMapper::new().map(dir.path());
        assert_eq!(result.mode, GraphMode::Imports);
        assert!(result.graph.contains("app --> util"));
        assert!(result.graph.contains("app --> other"));
        assert!(result.graph.contains("app --> config"));
    }

    #[test]
    fn python_imports_resolve_last_segment() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "app/main.py", "from app.services.auth import login\nimport database\nfrom app import models");
        write(dir.path(), "app/services/auth.py", "");
        write(dir.path(), "app/database.py", "");
        write(dir.path(), "app/models.py", "");

        let result = StructuralMapper::new().map(dir.path());
        assert_eq!(result.mode, GraphMode::Imports);
        assert!(result.graph.contains("main --> auth"));
        assert!(result.graph.contains("main --> database"));
        assert!(result.graph.contains("main --> models"));
    }

    #[test]
    fn colliding_stems_get_parent_suffix() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "alpha/index.js", "");
        write(dir.path(), "beta/index.js", "");

        let files = StructuralMapper::collect_source_files(dir.path());
        let (names, _) = StructuralMapper::discover_nodes(&files);
        assert!(names.contains("index"));
        assert!(names.contains("index_beta"));
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn node_discovery_is_deterministic() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a/handler.js", "");
        write(dir.path(), "b/handler.js", "");
        write(dir.path(), "c/main.py", "");

        let files = StructuralMapper::collect_source_files(dir.path());
        let (first, _) = StructuralMapper::discover_nodes(&files);
        let files = StructuralMapper::collect_source_files(dir.path());
        let (second, _) = StructuralMapper::discover_nodes(&files);
        assert_eq!(first, second);
    }

    #[test]
    fn import_mode_renders_exactly_the_edge_cap() {
        let dir = TempDir::new().unwrap();
        let mut hub = String::new();
        for i in 0..45 {
            hub.push_str(&format!("import m{i} from './m{i}'\n"));
            write(dir.path(), &format!("src/m{i}.js"), "");
        }
        write(dir.path(), "src/hub.js", &hub);

        let result = StructuralMapper::new().map(dir.path());
        assert_eq!(result.mode, GraphMode::Imports);
        assert_eq!(result.edge_count, MAX_IMPORT_EDGES);
        assert_eq!(result.graph.matches("hub --> ").count(), MAX_IMPORT_EDGES);
    }

    #[test]
    fn sparse_imports_trigger_directory_fallback() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/a.js", "import b from './b'");
        write(dir.path(), "src/b.js", "");

        let result = StructuralMapper::new().map(dir.path());
        assert_eq!(result.mode, GraphMode::DirectoryTree);
        assert!(result.graph.contains("src[/src/]"));
        assert!(result.graph.contains("src -.-> a"));
    }

    #[test]
    fn empty_tree_renders_placeholder() {
        let dir = TempDir::new().unwrap();
        let result = StructuralMapper::new().map(dir.path());
        assert_eq!(result.mode, GraphMode::Placeholder);
        assert!(result.graph.contains("Root --> src"));
        assert!(result.graph.contains("src --> App"));
    }

    #[test]
    fn ignored_directories_are_not_scanned() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "node_modules/lib/index.js", "require('./dep')");
        write(dir.path(), "src/app.py", "import os");

        let files = StructuralMapper::collect_source_files(dir.path());
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("src/app.py"));
    }

    #[test]
    fn fallback_caps_files_per_directory() {
        let dir = TempDir::new().unwrap();
        for i in 0..8 {
            write(dir.path(), &format!("src/file{}.js", i), "");
        }

        let edges = StructuralMapper::directory_edges(dir.path());
        let file_edges = edges.iter().filter(|e| e.contains("-.->")).count();
        assert_eq!(file_edges, MAX_FILES_PER_DIR);
    }
}
