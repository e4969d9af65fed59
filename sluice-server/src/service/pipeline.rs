//! Pipeline Service
//!
//! Builds a compiler for a repository and commit, reading templates either
//! from the source-control host or from a local directory.

use sluice_compiler::{CompileError, Compiler, FileFetcher, TemplateFetcher};
use sluice_core::dto::pipeline::CompilePipeline;
use sluice_core::pipeline::Pipeline;
use sluice_scm::{ScmClient, ScmFetcher};
use std::path::PathBuf;
use std::sync::Arc;

/// Where templates are read from
#[derive(Debug, Clone)]
pub enum TemplateStore {
    /// Source-control host contents API
    Scm(ScmClient),
    /// Local directory; template sources are paths under it
    Directory(PathBuf),
}

/// Produces a compiler per build
#[derive(Debug, Clone)]
pub struct Compilers {
    store: TemplateStore,
    max_template_depth: usize,
}

impl Compilers {
    pub fn new(store: TemplateStore, max_template_depth: usize) -> Self {
        Self {
            store,
            max_template_depth,
        }
    }

    /// Compiler whose `file` templates resolve against `org/repo` at `commit`
    pub fn for_commit(&self, org: &str, repo: &str, commit: &str) -> Compiler {
        let fetcher: Arc<dyn TemplateFetcher> = match &self.store {
            TemplateStore::Scm(client) => {
                Arc::new(ScmFetcher::new(client.clone(), org, repo, commit))
            }
            TemplateStore::Directory(root) => Arc::new(FileFetcher::new(root.clone())),
        };

        Compiler::new(fetcher).with_max_template_depth(self.max_template_depth)
    }
}

/// Compile a pipeline document without persisting anything
pub async fn compile_pipeline(
    compilers: &Compilers,
    req: CompilePipeline,
) -> Result<Pipeline, CompileError> {
    let compiler = compilers.for_commit(&req.org, &req.repo, &req.commit);
    let pipeline = compiler.compile(req.pipeline.as_bytes(), &req.rules).await?;

    tracing::info!(
        "Compiled pipeline for {}/{} at {}",
        req.org,
        req.repo,
        req.commit
    );

    Ok(pipeline)
}

#[cfg(test)]
pub(crate) fn test_compilers() -> Compilers {
    Compilers::new(
        TemplateStore::Directory(PathBuf::from(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../sluice-compiler/testdata"
        ))),
        sluice_compiler::DEFAULT_MAX_TEMPLATE_DEPTH,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use sluice_core::pipeline::RuleData;

    fn request(pipeline: &str) -> CompilePipeline {
        CompilePipeline {
            org: "octocat".to_string(),
            repo: "hello-world".to_string(),
            commit: "7fd1a60".to_string(),
            rules: RuleData {
                branch: "main".to_string(),
                ..Default::default()
            },
            pipeline: pipeline.to_string(),
        }
    }

    #[tokio::test]
    async fn test_compile_pipeline_with_local_templates() {
        let document = r#"
templates:
  - name: golang
    source: template.lua
    type: file
    format: lua
steps:
  - name: sample
    template:
      name: golang
"#;

        let pipeline = compile_pipeline(&test_compilers(), request(document))
            .await
            .unwrap();

        assert_eq!(pipeline.steps[0].name, "sample_build");
    }

    #[tokio::test]
    async fn test_compile_pipeline_respects_depth() {
        let compilers = Compilers::new(
            TemplateStore::Directory(PathBuf::from(concat!(
                env!("CARGO_MANIFEST_DIR"),
                "/../sluice-compiler/testdata"
            ))),
            1,
        );
        let document = r#"
templates:
  - name: chain
    source: template_calls_template.yml
    type: file
steps:
  - name: sample
    template:
      name: chain
"#;

        let result = compile_pipeline(&compilers, request(document)).await;
        assert!(matches!(result, Err(CompileError::DepthExceeded { .. })));
    }
}
