//! Report generation pipeline library
//!
//! Turns unstructured per-patient findings text into ordered ultrasound
//! reports by delegating sub-tasks to a pluggable text-generation backend:
//! segmentation into canonical sections, concurrent per-section generation
//! with retry and fallback, deterministic reassembly, and impression
//! synthesis — per case, fanned out across batches with failure isolation.

pub mod core;
pub mod error;
pub mod orchestrator;
pub mod services;
pub mod traits;

// Re-export commonly used types
pub use core::{aggregate, Dispatcher, GenerationClient, GenerationOutcome, InstructionSet, Segmenter, Summarizer};
pub use error::{ReporterError, ReporterResult};
pub use orchestrator::{ReportOrchestrator, ReporterConfig};
pub use traits::{ApiKeySource, GenerationBackend, ReportStore};
