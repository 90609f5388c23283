//! Core pipeline stages: reliable client, segmentation, dispatch,
//! aggregation and impression synthesis

pub mod aggregator;
pub mod client;
pub mod dispatcher;
pub mod instructions;
pub mod segmenter;
pub mod summarizer;

pub use aggregator::aggregate;
pub use client::{GenerationClient, GenerationOutcome};
pub use dispatcher::Dispatcher;
pub use instructions::InstructionSet;
pub use segmenter::Segmenter;
pub use summarizer::Summarizer;
