//! Grouping of classified files into single-category analysis chunks.

use crate::models::{Category, Chunk, ClassifiedFile, Priority};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Cost weighting per category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryMultipliers {
    #[serde(default = "default_secret_multiplier")]
    pub secret: f64,
    #[serde(default = "default_dependency_multiplier")]
    pub dependency: f64,
    #[serde(default = "default_unit_multiplier")]
    pub security: f64,
    #[serde(default = "default_unit_multiplier")]
    pub deployment: f64,
    #[serde(default = "default_config_multiplier")]
    pub config: f64,
}

impl Default for CategoryMultipliers {
    fn default() -> Self {
        Self {
            secret: default_secret_multiplier(),
            dependency: default_dependency_multiplier(),
            security: default_unit_multiplier(),
            deployment: default_unit_multiplier(),
            config: default_config_multiplier(),
        }
    }
}

impl CategoryMultipliers {
    pub fn for_category(&self, category: Category) -> f64 {
        match category {
            Category::Secret => self.secret,
            Category::Dependency => self.dependency,
            Category::Security => self.security,
            Category::Deployment => self.deployment,
            Category::Config => self.config,
        }
    }
}

fn default_secret_multiplier() -> f64 {
    2.0
}

fn default_dependency_multiplier() -> f64 {
    1.5
}

fn default_config_multiplier() -> f64 {
    1.2
}

fn default_unit_multiplier() -> f64 {
    1.0
}

/// Heuristic cost constants. These are sizing signals in abstract units,
/// not a billing model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostModel {
    #[serde(default = "default_base_cost_per_file")]
    pub base_cost_per_file: u32,

    #[serde(default)]
    pub multipliers: CategoryMultipliers,

    /// Upper bound of a chunk's estimate.
    #[serde(default = "default_max_cost")]
    pub max_cost: u32,

    /// Cost charged per finding when a chunk is processed.
    #[serde(default = "default_cost_per_finding")]
    pub cost_per_finding: u32,

    /// Fixed cost of summarizing one chunk.
    #[serde(default = "default_summary_overhead")]
    pub summary_overhead: u32,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            base_cost_per_file: default_base_cost_per_file(),
            multipliers: CategoryMultipliers::default(),
            max_cost: default_max_cost(),
            cost_per_finding: default_cost_per_finding(),
            summary_overhead: default_summary_overhead(),
        }
    }
}

fn default_base_cost_per_file() -> u32 {
    100
}

fn default_max_cost() -> u32 {
    4000
}

fn default_cost_per_finding() -> u32 {
    50
}

fn default_summary_overhead() -> u32 {
    100
}

impl CostModel {
    /// Estimate for a chunk of `file_count` files of `category`.
    pub fn estimate(&self, category: Category, file_count: usize) -> u32 {
        let base = file_count as f64 * self.base_cost_per_file as f64;
        let scaled = (base * self.multipliers.for_category(category)).round();
        if scaled >= self.max_cost as f64 {
            self.max_cost
        } else {
            scaled as u32
        }
    }

    /// Cost actually used by processing a chunk that produced `finding_count` findings.
    pub fn used(&self, estimate: u32, finding_count: usize) -> u32 {
        let findings = (finding_count as u32).saturating_mul(self.cost_per_finding);
        estimate
            .saturating_add(findings)
            .saturating_add(self.summary_overhead)
    }
}

/// Builds chunks using a cost model.
#[derive(Debug, Clone, Default)]
pub struct Chunker {
    cost: CostModel,
}

impl Chunker {
    pub fn new(cost: CostModel) -> Self {
        Self { cost }
    }

    /// Group `files` into at most one chunk per category.
    ///
    /// Chunks appear in the order their category first occurs in `files`,
    /// and each chunk keeps its files in input order.
    pub fn chunk(&self, files: &[ClassifiedFile]) -> Vec<Chunk> {
        let mut groups: Vec<(Category, Vec<ClassifiedFile>)> = Vec::new();

        for file in files {
            match groups.iter_mut().find(|(category, _)| *category == file.category) {
                Some((_, members)) => members.push(file.clone()),
                None => groups.push((file.category, vec![file.clone()])),
            }
        }

        let run_tag = uuid::Uuid::new_v4().simple().to_string();

        let chunks: Vec<Chunk> = groups
            .into_iter()
            .enumerate()
            .map(|(index, (category, members))| {
                let priority = members
                    .iter()
                    .map(|f| f.priority)
                    .max()
                    .unwrap_or(Priority::Low);
                let cost_estimate = self.cost.estimate(category, members.len());

                Chunk {
                    id: format!("chunk-{}-{}-{}", category, index + 1, &run_tag[..8]),
                    category,
                    files: members,
                    priority,
                    cost_estimate,
                }
            })
            .collect();

        debug!("Built {} chunks from {} files", chunks.len(), files.len());
        chunks
    }
}

/// Chunk with the default cost model.
#[allow(dead_code)] // main configures the cost model; used by tests
pub fn chunk(files: &[ClassifiedFile]) -> Vec<Chunk> {
    Chunker::default().chunk(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SelectionPolicy;
    use crate::selector::select;
    use std::collections::HashSet;

    fn file(path: &str, category: Category, priority: Priority) -> ClassifiedFile {
        ClassifiedFile {
            path: path.to_string(),
            category,
            priority,
            reason: "test".to_string(),
        }
    }

    #[test]
    fn test_empty_input_yields_no_chunks() {
        assert!(chunk(&[]).is_empty());
    }

    #[test]
    fn test_one_chunk_per_category_in_first_seen_order() {
        let files = vec![
            file(".env", Category::Secret, Priority::High),
            file("package.json", Category::Dependency, Priority::High),
            file("secrets.json", Category::Secret, Priority::High),
            file("config.json", Category::Config, Priority::Low),
        ];
        let chunks = chunk(&files);

        let categories: Vec<Category> = chunks.iter().map(|c| c.category).collect();
        assert_eq!(
            categories,
            vec![Category::Secret, Category::Dependency, Category::Config]
        );

        let secret_paths: Vec<&str> = chunks[0].files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(secret_paths, vec![".env", "secrets.json"]);
    }

    #[test]
    fn test_chunk_priority_is_max_of_members() {
        let files = vec![
            file("a/package.json", Category::Dependency, Priority::Low),
            file("package.json", Category::Dependency, Priority::High),
        ];
        let chunks = chunk(&files);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].priority, Priority::High);
    }

    #[test]
    fn test_cost_estimates() {
        let cost = CostModel::default();
        assert_eq!(cost.estimate(Category::Secret, 1), 200);
        assert_eq!(cost.estimate(Category::Dependency, 3), 450);
        assert_eq!(cost.estimate(Category::Config, 1), 120);
        assert_eq!(cost.estimate(Category::Deployment, 2), 200);
        assert_eq!(cost.estimate(Category::Secret, 25), 4000);
    }

    #[test]
    fn test_cost_used() {
        let cost = CostModel::default();
        assert_eq!(cost.used(200, 1), 350);
        assert_eq!(cost.used(0, 0), 100);
    }

    #[test]
    fn test_custom_cost_model() {
        let cost = CostModel {
            base_cost_per_file: 10,
            max_cost: 50,
            ..Default::default()
        };
        let chunks = Chunker::new(cost).chunk(&[
            file("a.yml", Category::Config, Priority::Low),
            file("b.yml", Category::Config, Priority::Low),
        ]);
        assert_eq!(chunks[0].cost_estimate, 24);
    }

    #[test]
    fn test_chunk_ids_are_unique() {
        let files: Vec<ClassifiedFile> = Category::ALL
            .iter()
            .map(|c| file(&format!("{}.txt", c), *c, Priority::Low))
            .collect();
        let chunks = chunk(&files);
        let ids: HashSet<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids.len(), 5);
    }

    #[test]
    fn test_chunks_partition_selected_files() {
        let paths = [
            ".env",
            "secrets.json",
            "package.json",
            "web/package.json",
            "Dockerfile",
            "docs/SECURITY.md",
            "config/app.yml",
            "README.md",
        ];
        let selected = select(&paths, &SelectionPolicy::all());
        let chunks = chunk(&selected);

        let mut flattened: Vec<ClassifiedFile> =
            chunks.iter().flat_map(|c| c.files.clone()).collect();
        let mut expected = selected.clone();
        flattened.sort_by(|a, b| a.path.cmp(&b.path));
        expected.sort_by(|a, b| a.path.cmp(&b.path));
        assert_eq!(flattened, expected);

        let categories: HashSet<Category> = chunks.iter().map(|c| c.category).collect();
        assert_eq!(categories.len(), chunks.len());
        assert!(chunks
            .iter()
            .all(|c| c.files.iter().all(|f| f.category == c.category)));
    }
}
