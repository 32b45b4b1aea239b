//! Per-chunk analysis.
//!
//! [`HeuristicProcessor`] applies path-based rules to every file of a chunk
//! and cannot fail. [`ReasoningProcessor`] runs the same heuristics and then
//! delegates the chunk to a [`ReasoningEngine`]; an engine failure is a hard
//! chunk failure, while an unparseable engine answer is downgraded to an
//! informational finding.

use crate::chunker::CostModel;
use crate::classifier::PathParts;
use crate::error::ChunkError;
use crate::models::{
    Category, Chunk, ChunkResult, ClassifiedFile, Finding, Severity, SeverityCounts,
};
use crate::reasoning::response::{EngineNotes, ResponseParseError};
use crate::reasoning::{parse_analysis, parse_error_finding, AnalysisContext, ReasoningEngine};
use futures::future::{BoxFuture, FutureExt};
use std::time::Instant;
use tracing::{debug, warn};

/// Turns one chunk into a [`ChunkResult`].
pub trait ChunkProcessor: Send + Sync {
    fn process<'a>(&'a self, chunk: &'a Chunk) -> BoxFuture<'a, Result<ChunkResult, ChunkError>>;
}

impl<P: ChunkProcessor + ?Sized> ChunkProcessor for Box<P> {
    fn process<'a>(&'a self, chunk: &'a Chunk) -> BoxFuture<'a, Result<ChunkResult, ChunkError>> {
        (**self).process(chunk)
    }
}

/// Audit tool per recognized manifest file name.
const MANIFEST_AUDIT_TOOLS: &[(&str, &str)] = &[
    ("package.json", "npm audit"),
    ("requirements.txt", "pip-audit"),
    ("pipfile", "pip-audit"),
    ("pyproject.toml", "pip-audit"),
    ("gemfile", "bundle audit"),
    ("cargo.toml", "cargo audit"),
    ("go.mod", "govulncheck"),
    ("pom.xml", "OWASP dependency-check"),
    ("build.gradle", "OWASP dependency-check"),
    ("build.gradle.kts", "OWASP dependency-check"),
    ("composer.json", "composer audit"),
];

/// Path-pattern heuristics.
#[derive(Debug, Clone, Default)]
pub struct HeuristicProcessor {
    cost: CostModel,
}

impl HeuristicProcessor {
    pub fn new(cost: CostModel) -> Self {
        Self { cost }
    }

    /// Analyze a chunk synchronously.
    pub fn analyze(&self, chunk: &Chunk) -> ChunkResult {
        let started = Instant::now();
        let findings = self.findings(chunk);
        self.build_result(chunk, findings, started, EngineNotes::default(), None)
    }

    /// Heuristic findings for every file of the chunk, in file order.
    pub fn findings(&self, chunk: &Chunk) -> Vec<Finding> {
        chunk
            .files
            .iter()
            .flat_map(|file| analyze_file(chunk.category, file))
            .collect()
    }

    fn build_result(
        &self,
        chunk: &Chunk,
        findings: Vec<Finding>,
        started: Instant,
        notes: EngineNotes,
        analysis_error: Option<String>,
    ) -> ChunkResult {
        let severity_summary = SeverityCounts::from_findings(&findings);
        let cost_used = self.cost.used(chunk.cost_estimate, findings.len());

        debug!(
            "Chunk {} produced {} findings ({})",
            chunk.id,
            findings.len(),
            severity_summary.risk()
        );

        ChunkResult {
            chunk_id: chunk.id.clone(),
            category: chunk.category,
            risk: severity_summary.risk(),
            severity_summary,
            findings,
            processing_duration_ms: started.elapsed().as_millis() as u64,
            cost_used,
            recommendations: notes.recommendations,
            engine_summary: notes.summary,
            risk_score: notes.risk_score,
            analysis_error,
        }
    }
}

impl ChunkProcessor for HeuristicProcessor {
    fn process<'a>(&'a self, chunk: &'a Chunk) -> BoxFuture<'a, Result<ChunkResult, ChunkError>> {
        async move { Ok(self.analyze(chunk)) }.boxed()
    }
}

/// Heuristics for one file. A path that cannot be parsed yields no findings.
fn analyze_file(category: Category, file: &ClassifiedFile) -> Vec<Finding> {
    let Some(parts) = PathParts::parse(&file.path) else {
        return Vec::new();
    };
    let name = parts.file_name.as_str();
    let kind = category.finding_kind();

    let finding = match category {
        Category::Secret => {
            if name.starts_with(".env") {
                Some(
                    Finding::new(
                        kind,
                        Severity::High,
                        "Environment file committed to repository",
                        format!(
                            "`{}` follows the environment-file naming convention and commonly holds API keys, database URLs and other credentials.",
                            file.path
                        ),
                    )
                    .with_recommendation(
                        "Remove the file from version control, add it to .gitignore, rotate any values it contained and commit a sanitized .env.example instead.",
                    ),
                )
            } else if crate::classifier::rules::SECRET_FILES.contains(&name)
                || name.contains("secret")
                || name.contains("credential")
            {
                Some(
                    Finding::new(
                        kind,
                        Severity::Critical,
                        "Secrets file committed to repository",
                        format!(
                            "`{}` matches a known secrets or credentials file name and is likely to expose live credentials.",
                            file.path
                        ),
                    )
                    .with_recommendation(
                        "Revoke and rotate the credentials immediately, purge the file from git history and load secrets from a secret manager at runtime.",
                    ),
                )
            } else {
                None
            }
        }
        Category::Dependency => MANIFEST_AUDIT_TOOLS
            .iter()
            .find(|(manifest, _)| *manifest == name)
            .map(|(_, tool)| {
                Finding::new(
                    kind,
                    Severity::Medium,
                    "Dependencies require a vulnerability audit",
                    format!(
                        "`{}` declares third-party dependencies whose versions may carry known vulnerabilities.",
                        file.path
                    ),
                )
                .with_recommendation(format!(
                    "Run `{}` regularly (ideally in CI) and keep dependencies pinned and up to date.",
                    tool
                ))
            }),
        Category::Config => Some(
            Finding::new(
                kind,
                Severity::Low,
                "Review configuration",
                format!(
                    "`{}` is a configuration file; check it for hard-coded credentials, debug flags and permissive defaults.",
                    file.path
                ),
            )
            .with_recommendation(
                "Keep environment-specific and sensitive values out of committed configuration.",
            ),
        ),
        Category::Security => Some(
            Finding::new(
                kind,
                Severity::Medium,
                "Review security configuration",
                format!(
                    "`{}` affects the application's security controls and should be reviewed for weak or permissive settings.",
                    file.path
                ),
            )
            .with_recommendation(
                "Verify the settings follow least privilege and current best practice for this component.",
            ),
        ),
        Category::Deployment => {
            if name == "dockerfile" || name.starts_with("dockerfile.") || name.ends_with(".dockerfile")
            {
                Some(
                    Finding::new(
                        kind,
                        Severity::Medium,
                        "Container image definition needs hardening",
                        format!(
                            "`{}` defines a container image; images commonly run as root and embed build-time secrets.",
                            file.path
                        ),
                    )
                    .with_recommendation(
                        "Pin the base image by digest, run as a non-root USER, use multi-stage builds and never COPY secrets into image layers.",
                    ),
                )
            } else if name.starts_with("docker-compose") || name.starts_with("compose.") {
                Some(
                    Finding::new(
                        kind,
                        Severity::Low,
                        "Multi-container orchestration file",
                        format!(
                            "`{}` orchestrates several containers; check for privileged services and inline credentials.",
                            file.path
                        ),
                    )
                    .with_recommendation(
                        "Avoid privileged mode and host networking, pin image tags and pass secrets through the secrets block rather than environment variables.",
                    ),
                )
            } else {
                None
            }
        }
    };

    finding.map(|f| f.at(file.path.clone())).into_iter().collect()
}

/// Heuristics followed by a reasoning-engine pass.
pub struct ReasoningProcessor<E> {
    heuristics: HeuristicProcessor,
    engine: E,
    repository: String,
    intent: String,
}

impl<E: ReasoningEngine> ReasoningProcessor<E> {
    pub fn new(engine: E, cost: CostModel, repository: &str, intent: &str) -> Self {
        Self {
            heuristics: HeuristicProcessor::new(cost),
            engine,
            repository: repository.to_string(),
            intent: intent.to_string(),
        }
    }

    async fn process_chunk(&self, chunk: &Chunk) -> Result<ChunkResult, ChunkError> {
        let started = Instant::now();
        let mut findings = self.heuristics.findings(chunk);

        let context = AnalysisContext::for_chunk(&self.repository, &self.intent, chunk);
        let raw = self.engine.analyze(&context).await?;

        let (notes, analysis_error) = match parse_analysis(&raw) {
            Ok(analysis) => {
                let (engine_findings, notes) = analysis.into_parts();
                debug!(
                    "Reasoning engine reported {} findings for chunk {}",
                    engine_findings.len(),
                    chunk.id
                );
                findings.extend(engine_findings);
                (notes, None)
            }
            Err(e) => {
                warn!("Unparseable reasoning response for chunk {}: {}", chunk.id, e);
                findings.push(parse_error_finding(&e));
                (EngineNotes::default(), Some(describe_parse_error(&e)))
            }
        };

        Ok(self
            .heuristics
            .build_result(chunk, findings, started, notes, analysis_error))
    }
}

impl<E: ReasoningEngine> ChunkProcessor for ReasoningProcessor<E> {
    fn process<'a>(&'a self, chunk: &'a Chunk) -> BoxFuture<'a, Result<ChunkResult, ChunkError>> {
        self.process_chunk(chunk).boxed()
    }
}

fn describe_parse_error(error: &ResponseParseError) -> String {
    format!("parse error: {}", error)
}
