//! Security report built from a finished run.
//!
//! [`SecurityReport`] is the document handed to the generators. It holds
//! the raw [`AggregatedVerdict`] alongside the derived views a reader wants
//! first: an executive summary, numbered findings, recommendations and a
//! risk breakdown.

pub mod generator;

use crate::analysis::{collect_recommendations, findings_by_severity, top_findings};
use crate::models::{AggregatedVerdict, Category, Finding, RiskLevel, Severity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub use generator::{generate_json_report, generate_markdown_report, write_report};

/// Number of findings quoted as key concerns.
const KEY_CONCERN_LIMIT: usize = 5;

/// Complete report document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityReport {
    pub repository: String,
    pub scanned_at: DateTime<Utc>,
    pub intent: String,
    /// Reasoning model, when one was consulted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
    pub files_selected: usize,
    pub executive_summary: ExecutiveSummary,
    pub findings: Vec<ReportFinding>,
    pub recommendations: Vec<String>,
    pub risk_analysis: RiskAnalysis,
    pub verdict: AggregatedVerdict,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    pub overall_risk: RiskLevel,
    pub posture: String,
    pub key_concerns: Vec<String>,
    pub success_rate: u32,
    pub narrative: String,
}

/// A finding with a stable report id and its chunk's category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportFinding {
    pub id: String,
    pub category: Category,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

/// Finding summaries grouped by risk band.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiskAnalysis {
    /// Critical and high findings.
    pub high_risk_items: Vec<String>,
    pub medium_risk_items: Vec<String>,
    /// Low findings. Informational findings are not listed.
    pub low_risk_items: Vec<String>,
}

impl SecurityReport {
    pub fn from_verdict(
        repository: &str,
        intent: &str,
        model_used: Option<String>,
        files_selected: usize,
        verdict: AggregatedVerdict,
    ) -> Self {
        let key_concerns = top_findings(&verdict, Severity::High, KEY_CONCERN_LIMIT)
            .into_iter()
            .map(item_label)
            .collect();

        let executive_summary = ExecutiveSummary {
            overall_risk: verdict.overall_risk,
            posture: verdict.overall_risk.posture().to_string(),
            key_concerns,
            success_rate: verdict.success_rate(),
            narrative: verdict.narrative_summary.clone(),
        };

        let findings = numbered_findings(&verdict);
        let recommendations = merged_recommendations(&verdict);
        let risk_analysis = risk_analysis(&verdict);

        Self {
            repository: repository.to_string(),
            scanned_at: Utc::now(),
            intent: intent.to_string(),
            model_used,
            files_selected,
            executive_summary,
            findings,
            recommendations,
            risk_analysis,
            verdict,
        }
    }
}

/// `title (location)`, or just the title when the finding has no location.
fn item_label(finding: &Finding) -> String {
    let location = finding.location();
    if location.is_empty() {
        finding.title.clone()
    } else {
        format!("{} ({})", finding.title, location)
    }
}

/// Findings ordered by severity and numbered `F-001`, `F-002`, ...
fn numbered_findings(verdict: &AggregatedVerdict) -> Vec<ReportFinding> {
    let mut tagged: Vec<(Category, &Finding)> = verdict
        .chunk_results
        .iter()
        .flat_map(|r| r.findings.iter().map(move |f| (r.category, f)))
        .collect();
    tagged.sort_by(|a, b| b.1.severity.cmp(&a.1.severity));

    tagged
        .into_iter()
        .enumerate()
        .map(|(i, (category, finding))| ReportFinding {
            id: format!("F-{:03}", i + 1),
            category,
            severity: finding.severity,
            title: finding.title.clone(),
            description: finding.description.clone(),
            location: finding.location(),
            recommendation: finding.recommendation.clone(),
        })
        .collect()
}

/// Engine advice first, then per-finding advice, most severe first.
fn merged_recommendations(verdict: &AggregatedVerdict) -> Vec<String> {
    let mut seen = HashSet::new();
    let engine = collect_recommendations(verdict);
    let per_finding = findings_by_severity(verdict)
        .into_iter()
        .filter_map(|f| f.recommendation.clone());

    engine
        .into_iter()
        .chain(per_finding)
        .filter(|r| !r.trim().is_empty() && seen.insert(r.to_lowercase()))
        .collect()
}

fn risk_analysis(verdict: &AggregatedVerdict) -> RiskAnalysis {
    let mut analysis = RiskAnalysis::default();
    for finding in findings_by_severity(verdict) {
        let bucket = match finding.severity {
            Severity::Critical | Severity::High => &mut analysis.high_risk_items,
            Severity::Medium => &mut analysis.medium_risk_items,
            Severity::Low => &mut analysis.low_risk_items,
            Severity::Info => continue,
        };
        bucket.push(item_label(finding));
    }
    analysis
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::analysis::VerdictAccumulator;
    use crate::models::{ChunkResult, FindingKind, SeverityCounts};
    use std::time::Duration;

    fn chunk_result(category: Category, findings: Vec<Finding>, recs: &[&str]) -> ChunkResult {
        let severity_summary = SeverityCounts::from_findings(&findings);
        ChunkResult {
            chunk_id: format!("chunk-{}", category),
            category,
            risk: severity_summary.risk(),
            severity_summary,
            findings,
            processing_duration_ms: 5,
            cost_used: 150,
            recommendations: recs.iter().map(|r| r.to_string()).collect(),
            engine_summary: None,
            risk_score: None,
            analysis_error: None,
        }
    }

    pub(crate) fn sample_report() -> SecurityReport {
        let mut acc = VerdictAccumulator::new(3);
        acc.record_success(chunk_result(
            Category::Config,
            vec![Finding::new(
                FindingKind::Configuration,
                Severity::Low,
                "Configuration file",
                "Review for hardcoded values",
            )
            .at("config/app.yml")],
            &["Rotate credentials regularly"],
        ));
        acc.record_success(chunk_result(
            Category::Secret,
            vec![Finding::new(
                FindingKind::Secret,
                Severity::Critical,
                "Credentials file committed",
                "secrets.json may contain credentials",
            )
            .at("secrets.json")
            .with_recommendation("Remove the file and rotate credentials regularly")],
            &["rotate credentials regularly"],
        ));
        acc.record_failure();
        let verdict = acc.finish(Duration::from_millis(1200));

        SecurityReport::from_verdict("acme/api", "secrets", None, 2, verdict)
    }

    #[test]
    fn test_findings_are_numbered_by_severity() {
        let report = sample_report();
        assert_eq!(report.findings.len(), 2);
        assert_eq!(report.findings[0].id, "F-001");
        assert_eq!(report.findings[0].severity, Severity::Critical);
        assert_eq!(report.findings[0].category, Category::Secret);
        assert_eq!(report.findings[0].location, "secrets.json");
        assert_eq!(report.findings[1].id, "F-002");
        assert_eq!(report.findings[1].category, Category::Config);
    }

    #[test]
    fn test_executive_summary() {
        let report = sample_report();
        let summary = &report.executive_summary;
        assert_eq!(summary.overall_risk, RiskLevel::Critical);
        assert_eq!(summary.success_rate, 67);
        assert_eq!(
            summary.key_concerns,
            vec!["Credentials file committed (secrets.json)"]
        );
        assert_eq!(summary.posture, RiskLevel::Critical.posture());
    }

    #[test]
    fn test_recommendations_are_deduplicated() {
        let report = sample_report();
        assert_eq!(
            report.recommendations,
            vec![
                "Rotate credentials regularly".to_string(),
                "Remove the file and rotate credentials regularly".to_string(),
            ]
        );
    }

    #[test]
    fn test_risk_analysis_buckets() {
        let report = sample_report();
        assert_eq!(report.risk_analysis.high_risk_items.len(), 1);
        assert!(report.risk_analysis.medium_risk_items.is_empty());
        assert_eq!(
            report.risk_analysis.low_risk_items,
            vec!["Configuration file (config/app.yml)"]
        );
    }

    #[test]
    fn test_empty_run_report() {
        let verdict = VerdictAccumulator::new(0).finish(Duration::ZERO);
        let report = SecurityReport::from_verdict("acme/api", "default", None, 0, verdict);
        assert_eq!(report.executive_summary.overall_risk, RiskLevel::Safe);
        assert_eq!(report.executive_summary.success_rate, 100);
        assert!(report.findings.is_empty());
        assert!(report.executive_summary.key_concerns.is_empty());
    }
}
