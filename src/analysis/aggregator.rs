//! Finding aggregation and statistics.
//!
//! The orchestrator threads a [`VerdictAccumulator`] through its loop and
//! folds it into an [`AggregatedVerdict`] at the end. The remaining helpers
//! derive report views from a finished verdict.

use crate::models::{
    success_rate, AggregatedVerdict, ChunkResult, Finding, RiskLevel, Severity, SeverityCounts,
};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// Snapshot emitted before each chunk is processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressUpdate {
    /// 1-based index of the chunk about to be processed.
    pub current: usize,
    pub total: usize,
    pub processed: usize,
    pub failed: usize,
    pub findings_so_far: usize,
    /// `round(current / total * 100)`
    pub percent: u32,
}

/// Running state of one orchestration run.
#[derive(Debug, Clone, Default)]
pub struct VerdictAccumulator {
    total_chunks: usize,
    failed_chunks: usize,
    findings_so_far: usize,
    results: Vec<ChunkResult>,
    cancelled: bool,
}

impl VerdictAccumulator {
    pub fn new(total_chunks: usize) -> Self {
        Self {
            total_chunks,
            ..Default::default()
        }
    }

    /// Progress snapshot for the chunk at zero-based `index`.
    pub fn progress(&self, index: usize) -> ProgressUpdate {
        let percent = if self.total_chunks == 0 {
            100
        } else {
            (((index + 1) as f64 / self.total_chunks as f64) * 100.0).round() as u32
        };

        ProgressUpdate {
            current: index + 1,
            total: self.total_chunks,
            processed: self.results.len(),
            failed: self.failed_chunks,
            findings_so_far: self.findings_so_far,
            percent,
        }
    }

    pub fn record_success(&mut self, result: ChunkResult) {
        self.findings_so_far += result.findings.len();
        self.results.push(result);
    }

    pub fn record_failure(&mut self) {
        self.failed_chunks += 1;
    }

    pub fn mark_cancelled(&mut self) {
        self.cancelled = true;
    }

    pub fn processed(&self) -> usize {
        self.results.len()
    }

    /// Fold everything recorded so far into the run's verdict.
    pub fn finish(self, elapsed: Duration) -> AggregatedVerdict {
        let severity_counts = fold_severity(&self.results);
        let overall_risk = severity_counts.risk();
        let total_cost_used: u64 = self.results.iter().map(|r| r.cost_used as u64).sum();
        let total_duration_ms = elapsed.as_millis() as u64;
        let processed_chunks = self.results.len();

        let narrative_summary = narrative_summary(
            processed_chunks,
            self.total_chunks,
            &severity_counts,
            overall_risk,
            total_duration_ms,
            total_cost_used,
            self.cancelled,
        );

        AggregatedVerdict {
            total_chunks: self.total_chunks,
            processed_chunks,
            failed_chunks: self.failed_chunks,
            total_findings: severity_counts.total(),
            severity_counts,
            overall_risk,
            chunk_results: self.results,
            total_duration_ms,
            total_cost_used,
            narrative_summary,
            cancelled: self.cancelled,
        }
    }
}

/// Sum the severity summaries of successful chunks.
pub fn fold_severity(results: &[ChunkResult]) -> SeverityCounts {
    results
        .iter()
        .fold(SeverityCounts::default(), |mut acc, result| {
            acc.merge(&result.severity_summary);
            acc
        })
}

/// Human-readable one-paragraph summary of a run.
pub fn narrative_summary(
    processed: usize,
    total: usize,
    counts: &SeverityCounts,
    risk: RiskLevel,
    duration_ms: u64,
    cost_used: u64,
    cancelled: bool,
) -> String {
    let mut lines = Vec::new();

    lines.push(format!(
        "Analyzed {}/{} chunks ({}% success rate). Overall risk: {}.",
        processed,
        total,
        success_rate(processed, total),
        risk
    ));
    lines.push(format!(
        "Findings: {} critical, {} high, {} medium, {} low, {} info.",
        counts.critical, counts.high, counts.medium, counts.low, counts.info
    ));
    lines.push(format!(
        "Completed in {:.1}s using {} cost units.",
        duration_ms as f64 / 1000.0,
        cost_used
    ));
    if cancelled {
        lines.push("The run was cancelled before all chunks were analyzed.".to_string());
    }

    lines.join(" ")
}

/// Findings sorted by severity (critical first); ties keep chunk order.
pub fn findings_by_severity(verdict: &AggregatedVerdict) -> Vec<&Finding> {
    let mut findings: Vec<&Finding> = verdict.findings().collect();
    findings.sort_by(|a, b| b.severity.cmp(&a.severity));
    findings
}

/// The `n` most severe findings at or above `min`.
pub fn top_findings(verdict: &AggregatedVerdict, min: Severity, n: usize) -> Vec<&Finding> {
    findings_by_severity(verdict)
        .into_iter()
        .filter(|f| f.severity >= min)
        .take(n)
        .collect()
}

/// Count findings per kind label.
pub fn count_by_kind(verdict: &AggregatedVerdict) -> HashMap<String, usize> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for finding in verdict.findings() {
        *counts.entry(finding.kind.to_string()).or_default() += 1;
    }
    counts
}

/// Engine recommendations across all chunks, de-duplicated in first-seen order.
pub fn collect_recommendations(verdict: &AggregatedVerdict) -> Vec<String> {
    let mut seen = HashSet::new();
    verdict
        .chunk_results
        .iter()
        .flat_map(|r| r.recommendations.iter())
        .filter(|r| seen.insert(r.to_lowercase()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, FindingKind};

    fn result_with(id: &str, severities: &[Severity]) -> ChunkResult {
        let findings: Vec<Finding> = severities
            .iter()
            .map(|s| Finding::new(FindingKind::Security, *s, format!("{} finding", s), ""))
            .collect();
        let severity_summary = SeverityCounts::from_findings(&findings);
        ChunkResult {
            chunk_id: id.to_string(),
            category: Category::Security,
            risk: severity_summary.risk(),
            severity_summary,
            findings,
            processing_duration_ms: 1,
            cost_used: 100,
            recommendations: Vec::new(),
            engine_summary: None,
            risk_score: None,
            analysis_error: None,
        }
    }

    #[test]
    fn test_empty_accumulator() {
        let verdict = VerdictAccumulator::new(0).finish(Duration::ZERO);
        assert_eq!(verdict.total_chunks, 0);
        assert_eq!(verdict.processed_chunks, 0);
        assert_eq!(verdict.total_findings, 0);
        assert_eq!(verdict.overall_risk, RiskLevel::Safe);
        assert!(verdict.narrative_summary.contains("0/0 chunks"));
    }

    #[test]
    fn test_progress_percent() {
        let acc = VerdictAccumulator::new(3);
        assert_eq!(acc.progress(0).percent, 33);
        assert_eq!(acc.progress(1).percent, 67);
        assert_eq!(acc.progress(2).percent, 100);
        assert_eq!(acc.progress(0).current, 1);
    }

    #[test]
    fn test_accumulate_and_finish() {
        let mut acc = VerdictAccumulator::new(3);
        acc.record_success(result_with("a", &[Severity::High]));
        acc.record_failure();
        acc.record_success(result_with("b", &[Severity::Medium, Severity::Low]));

        let progress = acc.progress(2);
        assert_eq!(progress.processed, 2);
        assert_eq!(progress.failed, 1);
        assert_eq!(progress.findings_so_far, 3);

        let verdict = acc.finish(Duration::from_millis(1500));
        assert_eq!(verdict.processed_chunks, 2);
        assert_eq!(verdict.failed_chunks, 1);
        assert_eq!(verdict.total_findings, 3);
        assert_eq!(verdict.overall_risk, RiskLevel::High);
        assert_eq!(verdict.total_cost_used, 200);
        assert_eq!(verdict.total_duration_ms, 1500);
        assert!(verdict.narrative_summary.contains("2/3 chunks (67% success rate)"));
        assert!(verdict.narrative_summary.contains("1.5s"));
    }

    #[test]
    fn test_critical_dominates() {
        let results = vec![
            result_with("a", &[Severity::Low, Severity::Low]),
            result_with("b", &[Severity::Critical]),
            result_with("c", &[]),
        ];
        assert_eq!(fold_severity(&results).risk(), RiskLevel::Critical);
    }

    #[test]
    fn test_cancelled_summary() {
        let mut acc = VerdictAccumulator::new(2);
        acc.mark_cancelled();
        let verdict = acc.finish(Duration::ZERO);
        assert!(verdict.cancelled);
        assert!(verdict.narrative_summary.contains("cancelled"));
    }

    #[test]
    fn test_top_findings_and_kinds() {
        let mut acc = VerdictAccumulator::new(2);
        acc.record_success(result_with("a", &[Severity::Low, Severity::High]));
        acc.record_success(result_with("b", &[Severity::Critical, Severity::Medium]));
        let verdict = acc.finish(Duration::ZERO);

        let top = top_findings(&verdict, Severity::High, 5);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].severity, Severity::Critical);
        assert_eq!(top[1].severity, Severity::High);

        assert_eq!(count_by_kind(&verdict).get("Security"), Some(&4));
    }

    #[test]
    fn test_collect_recommendations_dedups() {
        let mut a = result_with("a", &[]);
        a.recommendations = vec!["Rotate keys".to_string(), "Enable MFA".to_string()];
        let mut b = result_with("b", &[]);
        b.recommendations = vec!["rotate keys".to_string(), "Pin images".to_string()];

        let mut acc = VerdictAccumulator::new(2);
        acc.record_success(a);
        acc.record_success(b);
        let verdict = acc.finish(Duration::ZERO);

        assert_eq!(
            collect_recommendations(&verdict),
            vec!["Rotate keys", "Enable MFA", "Pin images"]
        );
    }
}
