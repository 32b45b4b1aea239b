//! External reasoning engine used to deepen chunk analysis.

pub mod engine;
pub mod response;

pub use engine::{EngineConfig, OllamaSession, ReasoningEngine};
pub use response::{parse_analysis, parse_error_finding, AnalysisContext};
