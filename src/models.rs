//! Data models for the risk scanner.
//!
//! This module contains the core data structures that flow through the
//! pipeline: classified files, chunks, findings, per-chunk results and the
//! repository-wide verdict.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Category a security-relevant file belongs to.
///
/// Variants are declared in classification precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Files that are or may contain secrets (env files, key material).
    Secret,
    /// Package manifests and lock files.
    Dependency,
    /// Security policy and hardening files.
    Security,
    /// Container, CI and infrastructure definitions.
    Deployment,
    /// Generic configuration files.
    Config,
}

impl Category {
    /// All categories in precedence order.
    pub const ALL: [Category; 5] = [
        Category::Secret,
        Category::Dependency,
        Category::Security,
        Category::Deployment,
        Category::Config,
    ];

    /// Sort rank used as the selector's secondary key (higher first).
    pub fn rank(&self) -> u8 {
        match self {
            Category::Secret => 5,
            Category::Dependency => 4,
            Category::Security => 3,
            Category::Deployment => 2,
            Category::Config => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Secret => "secret",
            Category::Dependency => "dependency",
            Category::Security => "security",
            Category::Deployment => "deployment",
            Category::Config => "config",
        }
    }

    /// The finding kind heuristics report for files of this category.
    pub fn finding_kind(&self) -> FindingKind {
        match self {
            Category::Secret => FindingKind::Secret,
            Category::Dependency => FindingKind::Dependency,
            Category::Security => FindingKind::Security,
            Category::Deployment | Category::Config => FindingKind::Configuration,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Review priority of a classified file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Sort rank used as the selector's primary key (higher first).
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Medium => write!(f, "medium"),
            Priority::High => write!(f, "high"),
        }
    }
}

/// A path that matched one of the classification rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedFile {
    /// Path as received from the file-listing provider.
    pub path: String,
    pub category: Category,
    pub priority: Priority,
    /// Human-readable explanation of the matching rule. Never empty.
    pub reason: String,
}

/// Which categories a run looks at and how many files it keeps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionPolicy {
    pub enabled_categories: BTreeSet<Category>,
    pub max_files: Option<usize>,
}

impl SelectionPolicy {
    /// Policy enabling the given categories.
    pub fn new(categories: &[Category], max_files: Option<usize>) -> Self {
        Self {
            enabled_categories: categories.iter().copied().collect(),
            max_files,
        }
    }

    /// Policy enabling every category with no file limit.
    #[allow(dead_code)] // Used by tests
    pub fn all() -> Self {
        Self::new(&Category::ALL, None)
    }

    pub fn is_enabled(&self, category: Category) -> bool {
        self.enabled_categories.contains(&category)
    }
}

/// A single-category batch of files analyzed as one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub category: Category,
    pub files: Vec<ClassifiedFile>,
    /// Highest priority among `files`.
    pub priority: Priority,
    /// Heuristic sizing signal in abstract cost units.
    pub cost_estimate: u32,
}

/// Severity level of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational - no action required
    Info,
    /// Low severity - hygiene and review items
    Low,
    /// Medium severity - weak configuration, unaudited dependencies
    Medium,
    /// High severity - likely exposure
    High,
    /// Critical severity - committed secrets, exploitable issues
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "Info"),
            Severity::Low => write!(f, "Low"),
            Severity::Medium => write!(f, "Medium"),
            Severity::High => write!(f, "High"),
            Severity::Critical => write!(f, "Critical"),
        }
    }
}

impl Severity {
    /// Returns an emoji representation of the severity.
    pub fn emoji(&self) -> &'static str {
        match self {
            Severity::Info => "🔵",
            Severity::Low => "🟢",
            Severity::Medium => "🟡",
            Severity::High => "🟠",
            Severity::Critical => "🔴",
        }
    }

    /// Lenient parse used for reasoning-engine output; unknown labels map to `Medium`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "critical" => Severity::Critical,
            "high" => Severity::High,
            "low" => Severity::Low,
            "info" | "informational" | "none" => Severity::Info,
            _ => Severity::Medium,
        }
    }
}

/// Kind of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingKind {
    Vulnerability,
    Secret,
    Dependency,
    Configuration,
    Security,
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FindingKind::Vulnerability => write!(f, "Vulnerability"),
            FindingKind::Secret => write!(f, "Secret"),
            FindingKind::Dependency => write!(f, "Dependency"),
            FindingKind::Configuration => write!(f, "Configuration"),
            FindingKind::Security => write!(f, "Security"),
        }
    }
}

impl From<&str> for FindingKind {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "vulnerability" | "vuln" => FindingKind::Vulnerability,
            "secret" | "secrets" => FindingKind::Secret,
            "dependency" | "dependencies" => FindingKind::Dependency,
            "configuration" | "config" => FindingKind::Configuration,
            _ => FindingKind::Security,
        }
    }
}

/// One discrete security observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    #[serde(rename = "type")]
    pub kind: FindingKind,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_number: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

impl Finding {
    pub fn new(
        kind: FindingKind,
        severity: Severity,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            severity,
            title: title.into(),
            description: description.into(),
            file_path: None,
            line_number: None,
            recommendation: None,
        }
    }

    pub fn at(mut self, path: impl Into<String>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = Some(recommendation.into());
        self
    }

    /// Returns `path:line`, `path`, or an empty string.
    pub fn location(&self) -> String {
        match (&self.file_path, self.line_number) {
            (Some(path), Some(line)) if line > 0 => format!("{}:{}", path, line),
            (Some(path), _) => path.clone(),
            (None, _) => String::new(),
        }
    }
}

/// Number of findings per severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub info: usize,
}

impl SeverityCounts {
    /// Counts a list of findings.
    pub fn from_findings(findings: &[Finding]) -> Self {
        let mut counts = Self::default();
        for finding in findings {
            counts.record(finding.severity);
        }
        counts
    }

    pub fn record(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
            Severity::Info => self.info += 1,
        }
    }

    /// Adds another set of counts into this one.
    pub fn merge(&mut self, other: &SeverityCounts) {
        self.critical += other.critical;
        self.high += other.high;
        self.medium += other.medium;
        self.low += other.low;
        self.info += other.info;
    }

    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low + self.info
    }

    /// Worst-severity-wins roll-up. Informational findings alone leave the
    /// risk at `Safe`.
    pub fn risk(&self) -> RiskLevel {
        if self.critical > 0 {
            RiskLevel::Critical
        } else if self.high > 0 {
            RiskLevel::High
        } else if self.medium > 0 {
            RiskLevel::Medium
        } else if self.low > 0 {
            RiskLevel::Low
        } else {
            RiskLevel::Safe
        }
    }
}

/// Overall risk label for a chunk or a whole repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Safe,
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Safe => write!(f, "Safe"),
            RiskLevel::Low => write!(f, "Low"),
            RiskLevel::Medium => write!(f, "Medium"),
            RiskLevel::High => write!(f, "High"),
            RiskLevel::Critical => write!(f, "Critical"),
        }
    }
}

impl RiskLevel {
    pub fn emoji(&self) -> &'static str {
        match self {
            RiskLevel::Safe => "✅",
            RiskLevel::Low => "🟢",
            RiskLevel::Medium => "🟡",
            RiskLevel::High => "🟠",
            RiskLevel::Critical => "🔴",
        }
    }

    /// One-sentence description of the security posture at this risk level.
    pub fn posture(&self) -> &'static str {
        match self {
            RiskLevel::Safe => "No security concerns were identified in the analyzed files.",
            RiskLevel::Low => {
                "Security posture is good; only minor configuration items need review."
            }
            RiskLevel::Medium => {
                "Security posture is fair; several items should be reviewed and hardened."
            }
            RiskLevel::High => {
                "Security posture needs attention; likely exposures were found and should be fixed soon."
            }
            RiskLevel::Critical => {
                "Security posture is poor; critical exposures require immediate remediation."
            }
        }
    }
}

/// Result of analyzing one chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkResult {
    pub chunk_id: String,
    pub category: Category,
    pub findings: Vec<Finding>,
    pub severity_summary: SeverityCounts,
    /// Roll-up of `severity_summary`.
    pub risk: RiskLevel,
    pub processing_duration_ms: u64,
    pub cost_used: u32,
    /// Advice returned by the reasoning engine, if one was used.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recommendations: Vec<String>,
    /// The reasoning engine's own summary of the chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_summary: Option<String>,
    /// The reasoning engine's 0-100 risk score for the chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<u8>,
    /// Set when the reasoning engine answered with unparseable content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_error: Option<String>,
}

/// Terminal output of one orchestration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedVerdict {
    pub total_chunks: usize,
    pub processed_chunks: usize,
    pub failed_chunks: usize,
    pub total_findings: usize,
    pub severity_counts: SeverityCounts,
    pub overall_risk: RiskLevel,
    pub chunk_results: Vec<ChunkResult>,
    pub total_duration_ms: u64,
    pub total_cost_used: u64,
    pub narrative_summary: String,
    /// True when the run was stopped before every chunk was attempted.
    #[serde(default)]
    pub cancelled: bool,
}

impl AggregatedVerdict {
    /// Percentage of chunks processed successfully, rounded. An empty run is 100%.
    pub fn success_rate(&self) -> u32 {
        success_rate(self.processed_chunks, self.total_chunks)
    }

    /// All findings in chunk order.
    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.chunk_results.iter().flat_map(|r| r.findings.iter())
    }
}

pub(crate) fn success_rate(processed: usize, total: usize) -> u32 {
    if total == 0 {
        return 100;
    }
    ((processed as f64 / total as f64) * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Info < Severity::Low);
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn test_severity_emoji() {
        assert_eq!(Severity::Critical.emoji(), "🔴");
        assert_eq!(Severity::High.emoji(), "🟠");
        assert_eq!(Severity::Medium.emoji(), "🟡");
        assert_eq!(Severity::Low.emoji(), "🟢");
    }

    #[test]
    fn test_severity_from_label() {
        assert_eq!(Severity::from_label("CRITICAL"), Severity::Critical);
        assert_eq!(Severity::from_label(" high "), Severity::High);
        assert_eq!(Severity::from_label("informational"), Severity::Info);
        assert_eq!(Severity::from_label("bogus"), Severity::Medium);
    }

    #[test]
    fn test_finding_kind_from_str() {
        assert_eq!(FindingKind::from("vuln"), FindingKind::Vulnerability);
        assert_eq!(FindingKind::from("Secret"), FindingKind::Secret);
        assert_eq!(FindingKind::from("config"), FindingKind::Configuration);
        assert_eq!(FindingKind::from("something"), FindingKind::Security);
    }

    #[test]
    fn test_finding_location() {
        let finding = Finding::new(FindingKind::Secret, Severity::High, "t", "d").at(".env");
        assert_eq!(finding.location(), ".env");

        let with_line = Finding {
            line_number: Some(12),
            ..finding.clone()
        };
        assert_eq!(with_line.location(), ".env:12");

        let nowhere = Finding::new(FindingKind::Security, Severity::Low, "t", "d");
        assert_eq!(nowhere.location(), "");
    }

    #[test]
    fn test_severity_counts_roll_up() {
        let findings = vec![
            Finding::new(FindingKind::Secret, Severity::High, "a", ""),
            Finding::new(FindingKind::Dependency, Severity::Medium, "b", ""),
            Finding::new(FindingKind::Configuration, Severity::Low, "c", ""),
        ];
        let counts = SeverityCounts::from_findings(&findings);
        assert_eq!(counts.high, 1);
        assert_eq!(counts.medium, 1);
        assert_eq!(counts.low, 1);
        assert_eq!(counts.total(), 3);
        assert_eq!(counts.risk(), RiskLevel::High);
    }

    #[test]
    fn test_risk_of_empty_and_info_only() {
        assert_eq!(SeverityCounts::default().risk(), RiskLevel::Safe);

        let mut info_only = SeverityCounts::default();
        info_only.record(Severity::Info);
        assert_eq!(info_only.risk(), RiskLevel::Safe);
    }

    #[test]
    fn test_severity_counts_merge() {
        let mut a = SeverityCounts {
            critical: 1,
            ..Default::default()
        };
        let b = SeverityCounts {
            low: 2,
            info: 1,
            ..Default::default()
        };
        a.merge(&b);
        assert_eq!(a.total(), 4);
        assert_eq!(a.risk(), RiskLevel::Critical);
    }

    #[test]
    fn test_category_ranks_follow_precedence() {
        let ranks: Vec<u8> = Category::ALL.iter().map(|c| c.rank()).collect();
        assert_eq!(ranks, vec![5, 4, 3, 2, 1]);
        assert!(Priority::High.rank() > Priority::Medium.rank());
        assert!(Priority::Medium.rank() > Priority::Low.rank());
    }

    #[test]
    fn test_success_rate() {
        assert_eq!(success_rate(0, 0), 100);
        assert_eq!(success_rate(1, 1), 100);
        assert_eq!(success_rate(2, 3), 67);
        assert_eq!(success_rate(0, 4), 0);
    }

    #[test]
    fn test_enum_serialization_is_lowercase() {
        let json = serde_json::to_string(&Category::Deployment).unwrap();
        assert_eq!(json, "\"deployment\"");
        let json = serde_json::to_string(&RiskLevel::Safe).unwrap();
        assert_eq!(json, "\"safe\"");
    }
}
