//! Markdown and JSON report generation.

use crate::analysis::count_by_kind;
use crate::models::{ChunkResult, Severity, SeverityCounts};
use crate::report::{ExecutiveSummary, ReportFinding, RiskAnalysis, SecurityReport};
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &SecurityReport) -> String {
    let mut output = String::new();

    output.push_str("# Security Analysis Report\n\n");
    output.push_str(&generate_metadata_section(report));
    output.push_str(&generate_table_of_contents(report));
    output.push_str(&generate_executive_summary(&report.executive_summary));
    output.push_str(&generate_summary_section(
        &report.verdict.severity_counts,
        report,
    ));
    output.push_str(&generate_findings_section(&report.findings));
    output.push_str(&generate_recommendations_section(&report.recommendations));
    output.push_str(&generate_risk_analysis_section(&report.risk_analysis));
    output.push_str(&generate_chunk_section(&report.verdict.chunk_results));
    output.push_str(&generate_footer());

    output
}

fn generate_metadata_section(report: &SecurityReport) -> String {
    let verdict = &report.verdict;
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Repository:** {}\n", report.repository));
    section.push_str(&format!(
        "- **Scan Date:** {}\n",
        report.scanned_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Intent:** `{}`\n", report.intent));
    if let Some(ref model) = report.model_used {
        section.push_str(&format!("- **Model Used:** `{}`\n", model));
    }
    section.push_str(&format!("- **Files Selected:** {}\n", report.files_selected));
    section.push_str(&format!(
        "- **Chunks Analyzed:** {}/{}\n",
        verdict.processed_chunks, verdict.total_chunks
    ));
    if verdict.failed_chunks > 0 {
        section.push_str(&format!("- **Chunks Failed:** {}\n", verdict.failed_chunks));
    }
    if verdict.cancelled {
        section.push_str("- **Status:** cancelled before completion\n");
    }
    section.push_str(&format!("- **Total Findings:** {}\n", verdict.total_findings));
    section.push_str(&format!(
        "- **Analysis Duration:** {:.1}s\n",
        verdict.total_duration_ms as f64 / 1000.0
    ));
    section.push_str(&format!("- **Cost Used:** {} units\n", verdict.total_cost_used));
    section.push('\n');

    section
}

fn generate_table_of_contents(report: &SecurityReport) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");
    toc.push_str("- [Executive Summary](#executive-summary)\n");
    toc.push_str("- [Summary](#summary)\n");
    toc.push_str("- [Findings](#findings)\n");
    if !report.recommendations.is_empty() {
        toc.push_str("- [Recommendations](#recommendations)\n");
    }
    toc.push_str("- [Risk Analysis](#risk-analysis)\n");
    if !report.verdict.chunk_results.is_empty() {
        toc.push_str("- [Chunks](#chunks)\n");
    }
    toc.push('\n');

    toc
}

fn generate_executive_summary(summary: &ExecutiveSummary) -> String {
    let mut section = String::new();

    section.push_str("## Executive Summary\n\n");
    section.push_str(&format!(
        "**Overall Risk:** {} {}\n\n",
        summary.overall_risk.emoji(),
        summary.overall_risk
    ));
    section.push_str(&format!("{}\n\n", summary.posture));

    if !summary.key_concerns.is_empty() {
        section.push_str("**Key Concerns:**\n\n");
        for concern in &summary.key_concerns {
            section.push_str(&format!("- {}\n", concern));
        }
        section.push('\n');
    }

    section.push_str(&format!("> {}\n\n", summary.narrative));

    section
}

fn generate_summary_section(counts: &SeverityCounts, report: &SecurityReport) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");

    section.push_str("### Finding Severity Breakdown\n\n");
    section.push_str(&format!(
        "| {} Critical | {} High | {} Medium | {} Low | {} Info | **Total** |\n",
        Severity::Critical.emoji(),
        Severity::High.emoji(),
        Severity::Medium.emoji(),
        Severity::Low.emoji(),
        Severity::Info.emoji(),
    ));
    section.push_str("|:---:|:---:|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {} | {} | **{}** |\n\n",
        counts.critical,
        counts.high,
        counts.medium,
        counts.low,
        counts.info,
        counts.total()
    ));

    let by_kind = count_by_kind(&report.verdict);
    if !by_kind.is_empty() {
        section.push_str("### Findings by Type\n\n");
        section.push_str("| Type | Count |\n");
        section.push_str("|:---|:---:|\n");

        let mut kinds: Vec<_> = by_kind.iter().collect();
        kinds.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

        for (kind, count) in kinds {
            section.push_str(&format!("| {} | {} |\n", kind, count));
        }
        section.push('\n');
    }

    section
}

fn generate_findings_section(findings: &[ReportFinding]) -> String {
    let mut section = String::new();

    section.push_str("## Findings\n\n");

    if findings.is_empty() {
        section.push_str("No security findings in the analyzed files.\n\n");
        return section;
    }

    for finding in findings {
        section.push_str(&generate_finding_block(finding));
    }

    section
}

fn generate_finding_block(finding: &ReportFinding) -> String {
    let mut block = String::new();

    block.push_str(&format!(
        "#### {} {} **{}** [{}] {}\n\n",
        finding.id,
        finding.severity.emoji(),
        finding.severity.to_string().to_uppercase(),
        finding.category,
        finding.title
    ));

    if !finding.location.is_empty() {
        block.push_str(&format!("**Location:** `{}`\n\n", finding.location));
    }

    if !finding.description.is_empty() {
        block.push_str(&format!("**Description:** {}\n\n", finding.description));
    }

    if let Some(ref recommendation) = finding.recommendation {
        block.push_str(&format!("> **Recommendation:** {}\n\n", recommendation));
    }

    block.push_str("---\n\n");

    block
}

fn generate_recommendations_section(recommendations: &[String]) -> String {
    if recommendations.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Recommendations\n\n");
    for (i, rec) in recommendations.iter().enumerate() {
        section.push_str(&format!("{}. {}\n", i + 1, rec));
    }
    section.push('\n');

    section
}

fn generate_risk_analysis_section(analysis: &RiskAnalysis) -> String {
    let mut section = String::new();

    section.push_str("## Risk Analysis\n\n");
    section.push_str(&risk_band("High Risk", &analysis.high_risk_items));
    section.push_str(&risk_band("Medium Risk", &analysis.medium_risk_items));
    section.push_str(&risk_band("Low Risk", &analysis.low_risk_items));

    section
}

fn risk_band(title: &str, items: &[String]) -> String {
    let mut band = format!("### {} ({})\n\n", title, items.len());
    if items.is_empty() {
        band.push_str("_None_\n\n");
    } else {
        for item in items {
            band.push_str(&format!("- {}\n", item));
        }
        band.push('\n');
    }
    band
}

fn generate_chunk_section(results: &[ChunkResult]) -> String {
    if results.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Chunks\n\n");
    section.push_str("| Chunk | Category | Risk | Model Score | Findings | Cost | Time (ms) |\n");
    section.push_str("|:---|:---|:---:|:---:|:---:|:---:|:---:|\n");

    for result in results {
        let score = result
            .risk_score
            .map(|s| format!("{}/100", s))
            .unwrap_or_else(|| "-".to_string());
        section.push_str(&format!(
            "| `{}` | {} | {} {} | {} | {} | {} | {} |\n",
            result.chunk_id,
            result.category,
            result.risk.emoji(),
            result.risk,
            score,
            result.findings.len(),
            result.cost_used,
            result.processing_duration_ms
        ));
    }
    section.push('\n');

    let summaries: Vec<_> = results
        .iter()
        .filter_map(|r| r.engine_summary.as_ref().map(|s| (r.category, s)))
        .collect();
    if !summaries.is_empty() {
        section.push_str("**Model summaries:**\n\n");
        for (category, summary) in summaries {
            section.push_str(&format!("- **{}:** {}\n", category, summary));
        }
        section.push('\n');
    }

    let errors: Vec<_> = results
        .iter()
        .filter_map(|r| r.analysis_error.as_ref().map(|e| (&r.chunk_id, e)))
        .collect();
    if !errors.is_empty() {
        section.push_str("**Analysis errors:**\n\n");
        for (chunk_id, error) in errors {
            section.push_str(&format!("- `{}`: {}\n", chunk_id, error));
        }
        section.push('\n');
    }

    section
}

fn generate_footer() -> String {
    "---\n\n*Report generated by riskscan*\n".to_string()
}

/// Generate a JSON report.
pub fn generate_json_report(report: &SecurityReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write already-rendered report content to a file.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create report file: {}", path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write report file: {}", path.display()))?;

    Ok(())
}
