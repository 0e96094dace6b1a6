//! Documentation synthesis
//!
//! Turns a working directory into a README and, when no contract document
//! exists, an OpenAPI document inferred from source excerpts. Every path
//! degrades: a missing credential yields fixed text without a network call,
//! and provider errors are logged and absorbed.

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};
use walkdir::WalkDir;

use repolens_core::config::LlmConfig;
use repolens_llm::prompts::{OPENAPI_SYSTEM_PROMPT, PromptBuilder, README_SYSTEM_PROMPT};
use repolens_llm::{CompletionRequest, LlmProvider};

use crate::domain::entities::DetectedFramework;
use crate::infrastructure::mapper::is_ignored;

/// README returned when the request carried no API key.
pub const README_PLACEHOLDER: &str =
    "# README\n\nNo API key was provided, so documentation could not be generated.";

/// README returned when the model call failed.
pub const README_GENERATION_FAILED: &str =
    "# README\n\nDocumentation generation failed. Please try again later.";

/// Directory tree depth included in README context.
const TREE_DEPTH: usize = 2;
/// Character budget for the rendered tree.
const TREE_BUDGET: usize = 2_000;
/// Byte budget shared by all manifest excerpts.
const MANIFEST_BUDGET: usize = 1_000;
/// At most this many source files are sent for contract synthesis.
const MAX_SCOUT_FILES: usize = 10;
/// Per-file excerpt size for contract synthesis.
const SCOUT_EXCERPT_BYTES: usize = 4_000;

const MANIFEST_NAMES: [&str; 6] = [
    "package.json",
    "requirements.txt",
    "pyproject.toml",
    "pom.xml",
    "build.gradle",
    "Cargo.toml",
];

/// Synthesizes documentation artifacts via an LLM provider.
pub struct DocSynthesizer {
    provider: Arc<dyn LlmProvider>,
    temperature: f64,
    max_tokens: u32,
}

impl DocSynthesizer {
    pub fn new(provider: Arc<dyn LlmProvider>, config: &LlmConfig) -> Self {
        Self {
            provider,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// Generate a README from the directory tree and dependency manifests.
    ///
    /// Never fails: degraded inputs produce degraded but well-formed output.
    pub async fn generate_readme(&self, dir: &Path, credential: &str) -> String {
        if credential.is_empty() {
            debug!("No credential supplied; returning placeholder README");
            return README_PLACEHOLDER.to_string();
        }

        let structure = render_tree(dir, TREE_DEPTH, TREE_BUDGET);
        let dependencies = read_manifests(dir, MANIFEST_BUDGET);

        let request = CompletionRequest::new()
            .with_system(README_SYSTEM_PROMPT)
            .with_user(PromptBuilder::build_readme_prompt(&structure, &dependencies))
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);

        match self.provider.complete(request, credential).await {
            Ok(response) => {
                if response.is_truncated() {
                    debug!("README generation hit the completion token limit");
                }
                response.text
            }
            Err(e) => {
                warn!(error = %e, "README generation failed");
                README_GENERATION_FAILED.to_string()
            }
        }
    }

    /// Infer an OpenAPI document from route-bearing source excerpts.
    ///
    /// Returns None when there is no credential, nothing worth sending, or
    /// the model's answer does not contain a parseable JSON object.
    pub async fn generate_openapi_spec(
        &self,
        dir: &Path,
        framework: DetectedFramework,
        credential: &str,
    ) -> Option<Value> {
        if credential.is_empty() {
            debug!("No credential supplied; skipping contract synthesis");
            return None;
        }

        let excerpts = scout_route_files(dir, framework);
        if excerpts.is_empty() {
            debug!(framework = %framework, "No route-bearing files found; skipping contract synthesis");
            return None;
        }

        let mut sources = String::new();
        for (path, excerpt) in &excerpts {
            sources.push_str(&format!("// File: {}\n{}\n\n", path, excerpt));
        }

        let request = CompletionRequest::new()
            .with_system(OPENAPI_SYSTEM_PROMPT)
            .with_user(PromptBuilder::build_openapi_prompt(framework.as_str(), &sources))
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);

        let response = match self.provider.complete(request, credential).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Contract synthesis failed");
                return None;
            }
        };

        match slice_json_object(&response.text).and_then(|s| serde_json::from_str::<Value>(s).ok())
        {
            Some(doc) => Some(doc),
            None => {
                warn!("Contract synthesis returned no parseable JSON object");
                None
            }
        }
    }
}

/// Render a shallow directory listing, indented by depth, within a character
/// budget.
fn render_tree(root: &Path, max_depth: usize, budget: usize) -> String {
    let mut out = String::new();
    let walker = WalkDir::new(root)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_ignored(e));

    for entry in walker.filter_map(|e| e.ok()) {
        if entry.depth() == 0 {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        let line = format!(
            "{}{}{}\n",
            "  ".repeat(entry.depth() - 1),
            name,
            if entry.file_type().is_dir() { "/" } else { "" }
        );
        if out.len() + line.len() > budget {
            out.push_str("...\n");
            break;
        }
        out.push_str(&line);
    }

    if out.is_empty() {
        out.push_str("(empty repository)\n");
    }
    out
}

/// Concatenate root-level dependency manifests within a shared byte budget.
fn read_manifests(root: &Path, budget: usize) -> String {
    let mut out = String::new();
    let mut remaining = budget;

    for name in MANIFEST_NAMES {
        if remaining == 0 {
            break;
        }
        let Ok(content) = std::fs::read_to_string(root.join(name)) else {
            continue;
        };
        let mut excerpt: &str = &content;
        if excerpt.len() > remaining {
            let mut cut = remaining;
            while cut > 0 && !excerpt.is_char_boundary(cut) {
                cut -= 1;
            }
            excerpt = &excerpt[..cut];
        }
        remaining -= excerpt.len();
        out.push_str(&format!("--- {} ---\n{}\n", name, excerpt));
    }

    if out.is_empty() {
        out.push_str("(no recognized dependency manifests)\n");
    }
    out
}

/// Tokens whose presence marks a file as route-bearing for the framework.
fn route_keywords(framework: DetectedFramework) -> &'static [&'static str] {
    match framework {
        DetectedFramework::ExpressJs => {
            &["app.get(", "app.post(", "app.put(", "app.delete(", "router."]
        }
        DetectedFramework::NestJs => &["@Controller", "@Get(", "@Post(", "@Put(", "@Delete("],
        DetectedFramework::Fastify => &["fastify.get(", "fastify.post(", "fastify.route(", ".register("],
        DetectedFramework::FastApi => &["@app.get(", "@app.post(", "@router.", "APIRouter"],
        DetectedFramework::Flask => &["@app.route(", ".route(", "Blueprint("],
        DetectedFramework::Django => &["urlpatterns", "path(", "re_path("],
        DetectedFramework::SpringBoot => &[
            "@RestController",
            "@GetMapping",
            "@PostMapping",
            "@RequestMapping",
        ],
        DetectedFramework::Unknown => &["route", "get(", "post(", "app."],
    }
}

const SCOUT_EXTENSIONS: [&str; 6] = ["js", "jsx", "ts", "tsx", "py", "java"];

/// Collect up to [`MAX_SCOUT_FILES`] excerpts of files that look like they
/// declare routes.
fn scout_route_files(root: &Path, framework: DetectedFramework) -> Vec<(String, String)> {
    let keywords = route_keywords(framework);
    let mut excerpts = Vec::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_ignored(e));

    for entry in walker.filter_map(|e| e.ok()) {
        if excerpts.len() >= MAX_SCOUT_FILES {
            break;
        }
        if !entry.file_type().is_file() {
            continue;
        }
        if !entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| SCOUT_EXTENSIONS.contains(&ext))
        {
            continue;
        }
        let Ok(content) = std::fs::read_to_string(entry.path()) else {
            continue;
        };
        if !keywords.iter().any(|k| content.contains(k)) {
            continue;
        }

        let mut cut = content.len().min(SCOUT_EXCERPT_BYTES);
        while cut > 0 && !content.is_char_boundary(cut) {
            cut -= 1;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .into_owned();
        excerpts.push((relative, content[..cut].to_string()));
    }

    excerpts
}

/// Slice the first `{` through the last `}` out of model output, tolerating
/// fences and prose around the object.
fn slice_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use repolens_llm::{CompletionResponse, LlmError, ProviderInfo, StopReason, Usage};
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct StubProvider {
        calls: AtomicUsize,
        reply: String,
    }

    impl StubProvider {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                reply: reply.to_string(),
            })
        }
    }

    #[async_trait]
    impl LlmProvider for StubProvider {
        fn info(&self) -> ProviderInfo {
            ProviderInfo {
                id: "stub",
                name: "Stub",
            }
        }

        async fn complete(
            &self,
            _request: CompletionRequest,
            _credential: &str,
        ) -> Result<CompletionResponse, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(CompletionResponse {
                id: "resp".to_string(),
                model: "stub".to_string(),
                text: self.reply.clone(),
                stop_reason: StopReason::EndTurn,
                usage: Usage::default(),
            })
        }

        fn default_model(&self) -> &str {
            "stub"
        }
    }

    fn synthesizer(provider: Arc<StubProvider>) -> DocSynthesizer {
        DocSynthesizer::new(provider, &LlmConfig::default())
    }

    #[tokio::test]
    async fn missing_credential_yields_placeholder_without_a_call() {
        let dir = TempDir::new().unwrap();
        let provider = StubProvider::replying("# Generated");
        let synth = synthesizer(provider.clone());

        let readme = synth.generate_readme(dir.path(), "").await;
        assert_eq!(readme, README_PLACEHOLDER);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn readme_uses_provider_output() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.json"), "{}").unwrap();
        let provider = StubProvider::replying("# My Project\n\nGenerated.");
        let synth = synthesizer(provider.clone());

        let readme = synth.generate_readme(dir.path(), "key").await;
        assert_eq!(readme, "# My Project\n\nGenerated.");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn synthesis_slices_fenced_json() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(
            dir.path().join("src/app.py"),
            "@app.get('/users')\ndef users(): ...",
        )
        .unwrap();

        let provider = StubProvider::replying(
            "```json\n{\"openapi\": \"3.0.0\", \"paths\": {}}\n```",
        );
        let synth = synthesizer(provider);

        let doc = synth
            .generate_openapi_spec(dir.path(), DetectedFramework::FastApi, "key")
            .await
            .unwrap();
        assert_eq!(doc["openapi"], "3.0.0");
    }

    #[tokio::test]
    async fn unparseable_reply_yields_none() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("app.py"), "@app.get('/x')").unwrap();

        let provider = StubProvider::replying("Sorry, I cannot do that.");
        let synth = synthesizer(provider);

        let doc = synth
            .generate_openapi_spec(dir.path(), DetectedFramework::FastApi, "key")
            .await;
        assert!(doc.is_none());
    }

    #[tokio::test]
    async fn no_candidate_files_means_no_call() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("README.md"), "hello").unwrap();

        let provider = StubProvider::replying("{}");
        let synth = synthesizer(provider.clone());

        let doc = synth
            .generate_openapi_spec(dir.path(), DetectedFramework::ExpressJs, "key")
            .await;
        assert!(doc.is_none());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn tree_rendering_respects_budget() {
        let dir = TempDir::new().unwrap();
        for i in 0..200 {
            fs::write(dir.path().join(format!("file{:03}.js", i)), "x").unwrap();
        }

        let tree = render_tree(dir.path(), 2, 300);
        assert!(tree.len() <= 300 + "...\n".len());
        assert!(tree.ends_with("...\n"));
    }

    #[test]
    fn manifest_budget_is_shared() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.json"), "a".repeat(900)).unwrap();
        fs::write(dir.path().join("requirements.txt"), "b".repeat(900)).unwrap();

        let manifests = read_manifests(dir.path(), 1_000);
        assert!(manifests.contains("package.json"));
        assert!(manifests.matches('b').count() <= 100);
    }

    #[test]
    fn json_slice_handles_surrounding_prose() {
        assert_eq!(
            slice_json_object("Here you go: {\"a\": 1} hope that helps"),
            Some("{\"a\": 1}")
        );
        assert!(slice_json_object("no json here").is_none());
        assert!(slice_json_object("} backwards {").is_none());
    }
}
