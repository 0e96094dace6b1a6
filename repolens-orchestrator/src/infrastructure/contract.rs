//! Contract resolution and framework detection
//!
//! Framework detection sniffs dependency manifests at the repository root in
//! a fixed order; the first match wins. Contract resolution searches for a
//! pre-existing OpenAPI/Swagger document, which is authoritative when found
//! and is never merged with synthesized routes.

use std::collections::HashSet;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::domain::entities::{
    ContractSource, DetectedFramework, HttpMethod, ResolvedContract, RouteDescriptor,
};
use crate::domain::errors::ContractUnavailable;

/// File names recognized as candidate API contract documents.
const SPEC_FILENAMES: [&str; 3] = ["openapi.json", "swagger.json", "api-docs.json"];

/// Route cap applied to a contract read from a document in the repository.
pub const MAX_SPEC_FILE_ROUTES: usize = 100;
/// Route cap applied to a synthesized contract.
pub const MAX_SYNTHESIZED_ROUTES: usize = 50;

/// Outcome of a contract scan. A missing contract is not an error; it is a
/// prompt to synthesize one.
#[derive(Debug)]
pub struct ContractScan {
    pub outcome: Result<ResolvedContract, ContractUnavailable>,
    /// Candidate documents that could not be read or parsed.
    pub skipped_files: usize,
}

/// Resolves API contracts and classifies web frameworks from a working
/// directory.
#[derive(Debug, Default, Clone)]
pub struct ContractResolver;

impl ContractResolver {
    pub fn new() -> Self {
        Self
    }

    /// Classify the repository's web framework from root-level manifests.
    ///
    /// The probe order is fixed: Node manifests before Python before Java,
    /// and within each manifest the more specific framework first. The first
    /// token found wins even if later manifests would also match.
    pub fn detect_framework(&self, root: &Path) -> DetectedFramework {
        if let Ok(package_json) = std::fs::read_to_string(root.join("package.json")) {
            let package_json = package_json.to_lowercase();
            for (token, framework) in [
                ("\"express\"", DetectedFramework::ExpressJs),
                ("\"@nestjs/core\"", DetectedFramework::NestJs),
                ("\"fastify\"", DetectedFramework::Fastify),
            ] {
                if package_json.contains(token) {
                    return framework;
                }
            }
        }

        for manifest in ["requirements.txt", "pyproject.toml"] {
            if let Ok(content) = std::fs::read_to_string(root.join(manifest)) {
                for (token, framework) in [
                    ("fastapi", DetectedFramework::FastApi),
                    ("flask", DetectedFramework::Flask),
                    ("django", DetectedFramework::Django),
                ] {
                    if content.to_lowercase().contains(token) {
                        return framework;
                    }
                }
            }
        }

        if root.join("pom.xml").exists() || root.join("build.gradle").exists() {
            return DetectedFramework::SpringBoot;
        }

        DetectedFramework::Unknown
    }

    /// Look for an existing OpenAPI/Swagger document anywhere in the tree.
    ///
    /// Candidates are matched by file name, must parse as JSON, and must
    /// carry a top-level `openapi` or `swagger` version key. The first valid
    /// document in deterministic walk order wins.
    pub fn resolve_contract(&self, root: &Path) -> ContractScan {
        let mut skipped_files = 0usize;

        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !super::mapper::is_ignored(e));

        for entry in walker.filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if !SPEC_FILENAMES.contains(&name.as_ref()) {
                continue;
            }

            let content = match std::fs::read_to_string(entry.path()) {
                Ok(content) => content,
                Err(e) => {
                    warn!(path = %entry.path().display(), error = %e, "Unreadable contract candidate");
                    skipped_files += 1;
                    continue;
                }
            };

            let doc: Value = match serde_json::from_str(&content) {
                Ok(doc) => doc,
                Err(e) => {
                    warn!(path = %entry.path().display(), error = %e, "Contract candidate is not valid JSON");
                    skipped_files += 1;
                    continue;
                }
            };

            if doc.get("openapi").is_none() && doc.get("swagger").is_none() {
                debug!(path = %entry.path().display(), "JSON file lacks an OpenAPI version key; skipping");
                skipped_files += 1;
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(root)
                .unwrap_or(entry.path())
                .to_string_lossy()
                .into_owned();
            let routes = routes_from_openapi(&doc, &relative, MAX_SPEC_FILE_ROUTES);

            debug!(path = %relative, routes = routes.len(), "Resolved contract from repository document");
            return ContractScan {
                outcome: Ok(ResolvedContract {
                    source: ContractSource::SpecFile(relative),
                    routes,
                }),
                skipped_files,
            };
        }

        ContractScan {
            outcome: Err(ContractUnavailable),
            skipped_files,
        }
    }
}

/// Extract routes from a parsed OpenAPI document.
///
/// Iterates `paths`, keeps entries whose key parses as an HTTP method,
/// deduplicates on (method, path), and caps the result. Shared between
/// repository documents and synthesized output.
pub fn routes_from_openapi(doc: &Value, source_file: &str, cap: usize) -> Vec<RouteDescriptor> {
    let Some(paths) = doc.get("paths").and_then(Value::as_object) else {
        return Vec::new();
    };

    let mut routes = Vec::new();
    let mut seen: HashSet<(HttpMethod, String)> = HashSet::new();

    for (url_path, operations) in paths {
        let Some(operations) = operations.as_object() else {
            continue;
        };
        for (method_name, operation) in operations {
            let Some(method) = HttpMethod::parse(method_name) else {
                continue;
            };
            if !seen.insert((method, url_path.clone())) {
                continue;
            }
            if routes.len() >= cap {
                return routes;
            }

            let summary = operation
                .get("summary")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string);

            routes.push(RouteDescriptor {
                method,
                url_path: url_path.clone(),
                source_file: source_file.to_string(),
                summary,
            });
        }
    }

    routes
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn node_manifest_wins_over_python() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "package.json",
            r#"{"dependencies": {"express": "^4.18.0"}}"#,
        );
        write(dir.path(), "requirements.txt", "fastapi==0.110.0\n");

        let resolver = ContractResolver::new();
        assert_eq!(
            resolver.detect_framework(dir.path()),
            DetectedFramework::ExpressJs
        );
    }

    #[test]
    fn nest_outranks_fastify_within_package_json() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "package.json",
            r#"{"dependencies": {"fastify": "^4.0.0", "@nestjs/core": "^10.0.0"}}"#,
        );

        let resolver = ContractResolver::new();
        assert_eq!(
            resolver.detect_framework(dir.path()),
            DetectedFramework::NestJs
        );
    }

    #[test]
    fn node_detection_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "package.json",
            r#"{"dependencies": {"EXPRESS": "^4.18.0"}}"#,
        );

        let resolver = ContractResolver::new();
        assert_eq!(
            resolver.detect_framework(dir.path()),
            DetectedFramework::ExpressJs
        );
    }

    #[test]
    fn python_detection_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "pyproject.toml", "dependencies = [\"Flask>=3.0\"]\n");

        let resolver = ContractResolver::new();
        assert_eq!(
            resolver.detect_framework(dir.path()),
            DetectedFramework::Flask
        );
    }

    #[test]
    fn java_build_files_mean_spring_boot() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "pom.xml", "<project/>");

        let resolver = ContractResolver::new();
        assert_eq!(
            resolver.detect_framework(dir.path()),
            DetectedFramework::SpringBoot
        );
    }

    #[test]
    fn empty_repo_is_unknown() {
        let dir = TempDir::new().unwrap();
        assert_eq!(
            ContractResolver::new().detect_framework(dir.path()),
            DetectedFramework::Unknown
        );
    }

    #[test]
    fn spec_file_is_authoritative_and_deduplicated() {
        let dir = TempDir::new().unwrap();
        let doc = json!({
            "openapi": "3.0.0",
            "paths": {
                "/users": {
                    "get": {"summary": "List users"},
                    "post": {"summary": ""},
                    "trace": {}
                },
                "/health": {
                    "get": {}
                }
            }
        });
        write(dir.path(), "docs/openapi.json", &doc.to_string());

        let scan = ContractResolver::new().resolve_contract(dir.path());
        let contract = scan.outcome.unwrap();
        assert_eq!(
            contract.source,
            ContractSource::SpecFile("docs/openapi.json".to_string())
        );
        // trace is not a recognized method, empty summaries become None
        assert_eq!(contract.routes.len(), 3);
        let users_get = contract
            .routes
            .iter()
            .find(|r| r.url_path == "/users" && r.method == HttpMethod::Get)
            .unwrap();
        assert_eq!(users_get.summary.as_deref(), Some("List users"));
        let users_post = contract
            .routes
            .iter()
            .find(|r| r.url_path == "/users" && r.method == HttpMethod::Post)
            .unwrap();
        assert!(users_post.summary.is_none());
    }

    #[test]
    fn json_without_version_key_is_skipped() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "swagger.json", r#"{"paths": {"/a": {"get": {}}}}"#);

        let scan = ContractResolver::new().resolve_contract(dir.path());
        assert!(scan.outcome.is_err());
        assert_eq!(scan.skipped_files, 1);
    }

    #[test]
    fn malformed_candidate_counts_as_skipped_but_scan_continues() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a/openapi.json", "{ not json");
        write(
            dir.path(),
            "b/swagger.json",
            r#"{"swagger": "2.0", "paths": {"/pets": {"get": {}}}}"#,
        );

        let scan = ContractResolver::new().resolve_contract(dir.path());
        let contract = scan.outcome.unwrap();
        assert_eq!(scan.skipped_files, 1);
        assert_eq!(
            contract.source,
            ContractSource::SpecFile("b/swagger.json".to_string())
        );
        assert_eq!(contract.routes.len(), 1);
    }

    #[test]
    fn routes_keep_document_declaration_order() {
        let doc: Value = serde_json::from_str(
            r#"{
                "openapi": "3.0.0",
                "paths": {
                    "/zebra": {"get": {}},
                    "/alpha": {"post": {}},
                    "/middle": {"get": {}}
                }
            }"#,
        )
        .unwrap();

        let routes = routes_from_openapi(&doc, "openapi.json", MAX_SPEC_FILE_ROUTES);
        let paths: Vec<&str> = routes.iter().map(|r| r.url_path.as_str()).collect();
        assert_eq!(paths, vec!["/zebra", "/alpha", "/middle"]);
    }

    #[test]
    fn route_extraction_respects_cap() {
        let mut paths = serde_json::Map::new();
        for i in 0..120 {
            paths.insert(format!("/r{}", i), json!({"get": {}}));
        }
        let doc = json!({"openapi": "3.1.0", "paths": paths});

        let routes = routes_from_openapi(&doc, "openapi.json", MAX_SPEC_FILE_ROUTES);
        assert_eq!(routes.len(), MAX_SPEC_FILE_ROUTES);
    }

    #[test]
    fn contract_search_ignores_vendored_trees() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "node_modules/pkg/openapi.json",
            r#"{"openapi": "3.0.0", "paths": {}}"#,
        );

        let scan = ContractResolver::new().resolve_contract(dir.path());
        assert!(scan.outcome.is_err());
        assert_eq!(scan.skipped_files, 0);
    }
}
