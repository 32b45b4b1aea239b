//! Terminal progress display for a run.

use crate::analysis::aggregator::ProgressUpdate;
use crate::analysis::orchestrator::RunObserver;
use crate::error::ChunkError;
use crate::models::{Chunk, ChunkResult};
use indicatif::{ProgressBar, ProgressStyle};

/// Progress bar observer used by the CLI.
pub struct ConsoleObserver {
    bar: ProgressBar,
}

impl ConsoleObserver {
    pub fn new(total_chunks: usize, hidden: bool) -> Self {
        let bar = if hidden {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(total_chunks as u64)
        };

        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            bar.set_style(style.progress_chars("#>-"));
        }

        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_with_message("done");
    }
}

impl RunObserver for ConsoleObserver {
    fn on_progress(&self, update: &ProgressUpdate) {
        self.bar.set_length(update.total as u64);
        self.bar.set_position((update.current - 1) as u64);
        self.bar.set_message(format!(
            "{}% | {} findings | {} failed",
            update.percent, update.findings_so_far, update.failed
        ));
    }

    fn on_chunk_complete(&self, chunk: &Chunk, result: &ChunkResult) {
        self.bar.inc(1);
        self.bar.println(format!(
            "   {} {} chunk: {} files, {} findings ({} ms)",
            result.risk.emoji(),
            chunk.category,
            chunk.files.len(),
            result.findings.len(),
            result.processing_duration_ms
        ));
    }

    fn on_error(&self, chunk: &Chunk, error: &ChunkError) {
        self.bar.inc(1);
        self.bar
            .println(format!("   ⚠️  {} chunk failed: {}", chunk.category, error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::processor::HeuristicProcessor;
    use crate::models::{Category, ClassifiedFile, Priority};

    #[test]
    fn test_hidden_observer_accepts_events() {
        let observer = ConsoleObserver::new(1, true);
        let chunk = Chunk {
            id: "chunk-config-1".to_string(),
            category: Category::Config,
            files: vec![ClassifiedFile {
                path: "app.yml".to_string(),
                category: Category::Config,
                priority: Priority::Low,
                reason: "test".to_string(),
            }],
            priority: Priority::Low,
            cost_estimate: 120,
        };

        observer.on_progress(&ProgressUpdate {
            current: 1,
            total: 1,
            processed: 0,
            failed: 0,
            findings_so_far: 0,
            percent: 100,
        });
        let result = HeuristicProcessor::default().analyze(&chunk);
        observer.on_chunk_complete(&chunk, &result);
        observer.finish();
        assert_eq!(observer.bar.position(), 1);
    }
}
