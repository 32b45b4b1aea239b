//! Reasoning-engine request context and tolerant response parsing.

use crate::models::{Category, Chunk, ClassifiedFile, Finding, FindingKind, Severity};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Everything the reasoning engine is told about one chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisContext {
    pub repository: String,
    pub intent: String,
    pub category: Category,
    pub files: Vec<ClassifiedFile>,
}

impl AnalysisContext {
    pub fn for_chunk(repository: &str, intent: &str, chunk: &Chunk) -> Self {
        Self {
            repository: repository.to_string(),
            intent: intent.to_string(),
            category: chunk.category,
            files: chunk.files.clone(),
        }
    }
}

/// Structured analysis returned by the engine.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReasoningAnalysis {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub findings: Vec<ReportedFinding>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    /// 0-100, higher is riskier.
    #[serde(default)]
    pub risk_score: Option<f64>,
}

/// One finding as the engine reports it. Every field is optional on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportedFinding {
    #[serde(default, rename = "type", alias = "kind")]
    pub kind: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub line_number: Option<usize>,
    #[serde(default, alias = "suggestion")]
    pub recommendation: Option<String>,
}

impl ReportedFinding {
    pub fn into_finding(self) -> Finding {
        Finding {
            kind: self
                .kind
                .as_deref()
                .map(FindingKind::from)
                .unwrap_or(FindingKind::Vulnerability),
            severity: self
                .severity
                .as_deref()
                .map(Severity::from_label)
                .unwrap_or(Severity::Medium),
            title: self
                .title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| "Untitled finding".to_string()),
            description: self.description.unwrap_or_default(),
            file_path: self.file_path.filter(|p| !p.is_empty()),
            line_number: self.line_number.filter(|l| *l > 0),
            recommendation: self.recommendation.filter(|r| !r.is_empty()),
        }
    }
}

/// Chunk-level output of the engine other than its findings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineNotes {
    pub summary: Option<String>,
    /// Clamped to 0-100.
    pub risk_score: Option<u8>,
    pub recommendations: Vec<String>,
}

impl ReasoningAnalysis {
    pub fn into_parts(self) -> (Vec<Finding>, EngineNotes) {
        let findings = self
            .findings
            .into_iter()
            .map(ReportedFinding::into_finding)
            .collect();
        let recommendations = self
            .recommendations
            .into_iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect();
        let notes = EngineNotes {
            summary: self
                .summary
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            risk_score: self
                .risk_score
                .filter(|s| s.is_finite())
                .map(|s| s.clamp(0.0, 100.0).round() as u8),
            recommendations,
        };
        (findings, notes)
    }
}

/// Why an engine response could not be used.
#[derive(Error, Debug)]
pub enum ResponseParseError {
    #[error("empty response")]
    Empty,

    #[error("no JSON object in response")]
    NoJsonObject,

    #[error("invalid analysis JSON: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Parse the engine's raw text into a [`ReasoningAnalysis`].
///
/// Accepts a bare JSON object, a fenced code block, or an object embedded in
/// surrounding prose.
pub fn parse_analysis(raw: &str) -> Result<ReasoningAnalysis, ResponseParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ResponseParseError::Empty);
    }

    let start = trimmed.find('{').ok_or(ResponseParseError::NoJsonObject)?;
    let end = trimmed.rfind('}').ok_or(ResponseParseError::NoJsonObject)?;
    if end < start {
        return Err(ResponseParseError::NoJsonObject);
    }

    let analysis = serde_json::from_str(&trimmed[start..=end])?;
    Ok(analysis)
}

/// The finding recorded in place of an unparseable engine response.
pub fn parse_error_finding(error: &ResponseParseError) -> Finding {
    Finding::new(
        FindingKind::Security,
        Severity::Info,
        "Reasoning response could not be parsed",
        format!(
            "The reasoning engine returned output that did not match the analysis schema ({}). \
             Heuristic findings for this chunk are still reported.",
            error
        ),
    )
    .with_recommendation("Re-run the scan or try a different model for this chunk.")
}
