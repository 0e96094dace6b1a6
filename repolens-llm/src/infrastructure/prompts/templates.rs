pub const README_SYSTEM_PROMPT: &str = r#"You are a senior software engineer writing a professional README.md for a project you have just been shown.

You will receive the project's directory structure and the contents of its dependency manifests. Write a complete README.md with exactly these sections, in this order:

1. Project title and a one-line description
2. Architecture overview
3. Tech stack
4. Features
5. Project structure
6. Configuration
7. Setup / installation
8. Testing
9. Build and deployment
10. Contributing
11. License

Base every statement on the provided files and dependencies. Do NOT invent features, endpoints, or integrations that are not evidenced by the input. If a section cannot be inferred, keep it brief and generic rather than fabricating specifics.

Respond with Markdown only, no surrounding commentary.
"#;

pub const OPENAPI_SYSTEM_PROMPT: &str = r#"You are an API documentation generator. You will receive source file excerpts from a web service and the name of its web framework.

Infer the HTTP API surface and produce an OpenAPI 3.0 document describing it.

Rules:
- Output ONLY a raw JSON object. No markdown fences, no prose, no explanations.
- The top-level object must contain an "openapi" version field, an "info" object, and a "paths" object.
- Only include routes that are visible in the provided source excerpts.
- For each operation include at minimum a "summary" string.
"#;

const README_USER_PROMPT: &str = r#"Project files:
{structure}

Dependency manifests:
{dependencies}
"#;

const OPENAPI_USER_PROMPT: &str = r#"Detected framework: {framework}

Source excerpts:
{sources}
"#;

pub struct PromptBuilder;

impl PromptBuilder {
    pub fn build_readme_prompt(structure: &str, dependencies: &str) -> String {
        README_USER_PROMPT
            .replace("{structure}", structure)
            .replace("{dependencies}", dependencies)
    }

    pub fn build_openapi_prompt(framework: &str, sources: &str) -> String {
        OPENAPI_USER_PROMPT
            .replace("{framework}", framework)
            .replace("{sources}", sources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readme_prompt_substitutes_placeholders() {
        let prompt = PromptBuilder::build_readme_prompt("src/\n  main.rs", "tokio = \"1\"");
        assert!(prompt.contains("src/\n  main.rs"));
        assert!(prompt.contains("tokio"));
        assert!(!prompt.contains("{structure}"));
    }

    #[test]
    fn openapi_prompt_names_framework() {
        let prompt = PromptBuilder::build_openapi_prompt("Express.js", "app.get('/users')");
        assert!(prompt.contains("Express.js"));
        assert!(!prompt.contains("{framework}"));
    }
}
