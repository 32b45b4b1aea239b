//! Chunk analysis and run orchestration.

pub mod aggregator;
pub mod console;
pub mod orchestrator;
pub mod processor;

pub use aggregator::*;
pub use console::ConsoleObserver;
pub use orchestrator::{NoopObserver, Orchestrator, RunObserver};
pub use processor::{ChunkProcessor, HeuristicProcessor, ReasoningProcessor};
