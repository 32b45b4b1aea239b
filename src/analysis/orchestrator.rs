//! Sequential chunk orchestration.
//!
//! Chunks are processed one at a time in the order given. A failing chunk is
//! counted and reported through [`RunObserver::on_error`]; it never aborts
//! the run.

use crate::analysis::aggregator::{ProgressUpdate, VerdictAccumulator};
use crate::analysis::processor::ChunkProcessor;
use crate::error::ChunkError;
use crate::models::{AggregatedVerdict, Chunk, ChunkResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Hooks invoked synchronously during a run. Every hook defaults to a no-op.
pub trait RunObserver {
    /// Before a chunk is processed.
    fn on_progress(&self, _update: &ProgressUpdate) {}

    /// After a chunk was processed successfully.
    fn on_chunk_complete(&self, _chunk: &Chunk, _result: &ChunkResult) {}

    /// After a chunk failed.
    fn on_error(&self, _chunk: &Chunk, _error: &ChunkError) {}
}

/// Observer that ignores every event.
#[allow(dead_code)] // Used through Orchestrator::run
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

/// Drives a [`ChunkProcessor`] over a list of chunks.
pub struct Orchestrator<P> {
    processor: P,
    cancel: Option<Arc<AtomicBool>>,
}

impl<P: ChunkProcessor> Orchestrator<P> {
    pub fn new(processor: P) -> Self {
        Self {
            processor,
            cancel: None,
        }
    }

    /// Stop before the next chunk once `flag` is set.
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    #[allow(dead_code)] // main always attaches a console observer
    pub async fn run(&self, chunks: &[Chunk]) -> AggregatedVerdict {
        self.run_with_observer(chunks, &NoopObserver).await
    }

    pub async fn run_with_observer(
        &self,
        chunks: &[Chunk],
        observer: &dyn RunObserver,
    ) -> AggregatedVerdict {
        let started = Instant::now();
        let mut acc = VerdictAccumulator::new(chunks.len());

        info!("Processing {} chunks", chunks.len());

        for (index, chunk) in chunks.iter().enumerate() {
            if self.is_cancelled() {
                warn!(
                    "Run cancelled after {} of {} chunks",
                    acc.processed(),
                    chunks.len()
                );
                acc.mark_cancelled();
                break;
            }

            observer.on_progress(&acc.progress(index));
            debug!(
                "Chunk {}/{}: {} ({} files)",
                index + 1,
                chunks.len(),
                chunk.id,
                chunk.files.len()
            );

            match self.processor.process(chunk).await {
                Ok(result) => {
                    observer.on_chunk_complete(chunk, &result);
                    acc.record_success(result);
                }
                Err(e) => {
                    warn!("Chunk {} failed: {}", chunk.id, e);
                    acc.record_failure();
                    observer.on_error(chunk, &e);
                }
            }
        }

        let verdict = acc.finish(started.elapsed());
        info!(
            "Run complete: {}/{} chunks, {} findings, overall risk {}",
            verdict.processed_chunks,
            verdict.total_chunks,
            verdict.total_findings,
            verdict.overall_risk
        );
        verdict
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map(|flag| flag.load(Ordering::SeqCst))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::processor::HeuristicProcessor;
    use crate::chunker::chunk;
    use crate::error::ReasoningError;
    use crate::models::{Category, ClassifiedFile, Priority, RiskLevel, SelectionPolicy};
    use crate::selector::select;
    use futures::future::{BoxFuture, FutureExt};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingObserver {
        events: Mutex<Vec<String>>,
        progress: Mutex<Vec<ProgressUpdate>>,
    }

    impl RunObserver for RecordingObserver {
        fn on_progress(&self, update: &ProgressUpdate) {
            self.progress.lock().unwrap().push(update.clone());
            self.events
                .lock()
                .unwrap()
                .push(format!("progress {}/{}", update.current, update.total));
        }

        fn on_chunk_complete(&self, chunk: &Chunk, _result: &ChunkResult) {
            self.events
                .lock()
                .unwrap()
                .push(format!("complete {}", chunk.category));
        }

        fn on_error(&self, chunk: &Chunk, _error: &ChunkError) {
            self.events
                .lock()
                .unwrap()
                .push(format!("error {}", chunk.category));
        }
    }

    /// Fails every chunk of one category, analyzes the rest heuristically.
    struct FailingOn(Category);

    impl ChunkProcessor for FailingOn {
        fn process<'a>(
            &'a self,
            chunk: &'a Chunk,
        ) -> BoxFuture<'a, Result<ChunkResult, ChunkError>> {
            async move {
                if chunk.category == self.0 {
                    Err(ChunkError::Reasoning(ReasoningError::Timeout(30)))
                } else {
                    Ok(HeuristicProcessor::default().analyze(chunk))
                }
            }
            .boxed()
        }
    }

    fn chunks_for(paths: &[&str]) -> Vec<Chunk> {
        chunk(&select(paths, &SelectionPolicy::all()))
    }

    #[test]
    fn test_empty_run_is_safe() {
        let orchestrator = Orchestrator::new(HeuristicProcessor::default());
        let verdict = tokio_test::block_on(orchestrator.run(&[]));
        assert_eq!(verdict.total_chunks, 0);
        assert_eq!(verdict.processed_chunks, 0);
        assert_eq!(verdict.failed_chunks, 0);
        assert_eq!(verdict.overall_risk, RiskLevel::Safe);
        assert!(verdict.chunk_results.is_empty());
    }

    #[test]
    fn test_zero_max_files_pipeline() {
        let policy = SelectionPolicy::new(&Category::ALL, Some(0));
        let chunks = chunk(&select(&["package.json"], &policy));
        assert!(chunks.is_empty());

        let verdict =
            tokio_test::block_on(Orchestrator::new(HeuristicProcessor::default()).run(&chunks));
        assert_eq!(verdict.total_chunks, 0);
        assert_eq!(verdict.overall_risk, RiskLevel::Safe);
    }

    #[test]
    fn test_single_secret_chunk_is_critical() {
        let chunks = chunks_for(&["secrets.json"]);
        assert_eq!(chunks.len(), 1);

        let verdict =
            tokio_test::block_on(Orchestrator::new(HeuristicProcessor::default()).run(&chunks));
        assert_eq!(verdict.severity_counts.critical, 1);
        assert_eq!(verdict.overall_risk, RiskLevel::Critical);
        assert!(verdict.narrative_summary.contains("100% success rate"));
    }

    #[test]
    fn test_secret_then_dependency_is_high() {
        let file = |path: &str, category| ClassifiedFile {
            path: path.to_string(),
            category,
            priority: Priority::High,
            reason: "test".to_string(),
        };
        let chunks = chunk(&[
            file(".env", Category::Secret),
            file("package.json", Category::Dependency),
        ]);

        let verdict =
            tokio_test::block_on(Orchestrator::new(HeuristicProcessor::default()).run(&chunks));
        assert_eq!(verdict.severity_counts.high, 1);
        assert_eq!(verdict.severity_counts.medium, 1);
        assert_eq!(verdict.severity_counts.critical, 0);
        assert_eq!(verdict.overall_risk, RiskLevel::High);
        assert_eq!(verdict.chunk_results[0].category, Category::Secret);
        assert_eq!(verdict.chunk_results[1].category, Category::Dependency);
    }

    #[test]
    fn test_failure_is_contained_and_reported() {
        let chunks = chunks_for(&[".env", "package.json", "config.json"]);
        assert_eq!(chunks.len(), 3);

        let observer = RecordingObserver::default();
        let orchestrator = Orchestrator::new(FailingOn(Category::Dependency));
        let verdict = tokio_test::block_on(orchestrator.run_with_observer(&chunks, &observer));

        assert_eq!(verdict.total_chunks, 3);
        assert_eq!(verdict.processed_chunks, 2);
        assert_eq!(verdict.failed_chunks, 1);
        assert!(verdict.narrative_summary.contains("2/3 chunks (67% success rate)"));

        let events = observer.events.lock().unwrap().clone();
        assert_eq!(
            events,
            vec![
                "progress 1/3",
                "complete secret",
                "progress 2/3",
                "error dependency",
                "progress 3/3",
                "complete config",
            ]
        );

        let progress = observer.progress.lock().unwrap().clone();
        assert_eq!(progress[2].processed, 1);
        assert_eq!(progress[2].failed, 1);
        assert_eq!(progress[2].findings_so_far, 1);
        assert_eq!(progress[2].percent, 100);
    }

    #[test]
    fn test_every_chunk_failing_still_completes() {
        let chunks = chunks_for(&["package.json"]);
        let verdict =
            tokio_test::block_on(Orchestrator::new(FailingOn(Category::Dependency)).run(&chunks));
        assert_eq!(verdict.processed_chunks, 0);
        assert_eq!(verdict.failed_chunks, 1);
        assert_eq!(verdict.overall_risk, RiskLevel::Safe);
        assert!(verdict.narrative_summary.contains("0% success rate"));
    }

    #[test]
    fn test_cancellation_stops_between_chunks() {
        let chunks = chunks_for(&["secrets.json", "package.json"]);
        let flag = Arc::new(AtomicBool::new(true));
        let orchestrator =
            Orchestrator::new(HeuristicProcessor::default()).with_cancellation(flag.clone());

        let verdict = tokio_test::block_on(orchestrator.run(&chunks));
        assert!(verdict.cancelled);
        assert_eq!(verdict.total_chunks, 2);
        assert_eq!(verdict.processed_chunks, 0);
        assert_eq!(verdict.overall_risk, RiskLevel::Safe);
    }

    #[test]
    fn test_runs_are_repeatable() {
        let chunks = chunks_for(&[
            ".env",
            "secrets.json",
            "go.mod",
            "Dockerfile",
            "docs/SECURITY.md",
            "settings.ini",
        ]);
        let orchestrator = Orchestrator::new(HeuristicProcessor::default());

        let first = tokio_test::block_on(orchestrator.run(&chunks));
        let second = tokio_test::block_on(orchestrator.run(&chunks));
        assert_eq!(first.severity_counts, second.severity_counts);
        assert_eq!(first.overall_risk, second.overall_risk);
        assert_eq!(first.overall_risk, RiskLevel::Critical);
    }
}
