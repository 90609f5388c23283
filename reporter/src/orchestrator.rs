//! Per-case pipeline composition and batch coordination
//!
//! `ReportOrchestrator` wires Segmenter → Dispatcher → aggregate →
//! Summarizer into the per-case pipeline and fans it out across a batch with
//! full per-case isolation: one case's degraded or panicked pipeline never
//! affects another, and the batch always yields one entry per input case in
//! input order.

use std::sync::Arc;

use futures_util::future::join_all;
use shared::{
    logging, BatchResult, CaseInput, CaseOutcome, CaseReport, ConcurrencyConfig, GenerationConfig,
    ResultStatus, RetryConfig,
};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::core::{aggregate, Dispatcher, GenerationClient, InstructionSet, Segmenter, Summarizer};
use crate::traits::GenerationBackend;

/// Immutable pipeline configuration injected at construction time
#[derive(Debug, Clone, Default)]
pub struct ReporterConfig {
    pub generation: GenerationConfig,
    pub retry: RetryConfig,
    pub concurrency: ConcurrencyConfig,
    pub instructions: InstructionSet,
}

/// Orchestrates the full pipeline for single cases and batches
pub struct ReportOrchestrator<B> {
    segmenter: Segmenter<B>,
    dispatcher: Dispatcher<B>,
    summarizer: Summarizer<B>,
    case_permits: Arc<Semaphore>,
}

impl<B: GenerationBackend + Send + Sync + 'static> ReportOrchestrator<B> {
    /// Create the orchestrator over an injected backend
    pub fn new(backend: Arc<B>, config: ReporterConfig) -> Self {
        let instructions = Arc::new(config.instructions);
        let client = GenerationClient::new(backend, config.generation, config.retry);
        let section_permits = Arc::new(Semaphore::new(config.concurrency.max_section_tasks));

        Self {
            segmenter: Segmenter::new(client.clone(), Arc::clone(&instructions)),
            dispatcher: Dispatcher::new(client.clone(), Arc::clone(&instructions), section_permits),
            summarizer: Summarizer::new(client, instructions),
            case_permits: Arc::new(Semaphore::new(config.concurrency.max_cases)),
        }
    }

    /// Run the per-case pipeline
    ///
    /// Never fails: segmentation, sections and impression all degrade to
    /// fallback or empty text. A case whose segmentation yields nothing still
    /// produces a near-empty report.
    pub async fn process_case(&self, input: &CaseInput) -> CaseReport {
        info!("processing case '{}'", input.label);

        let record = self.segmenter.split(&input.raw_text).await;
        if record.is_empty() {
            warn!(
                "case '{}' produced no findings after segmentation",
                input.label
            );
        }

        let results = self.dispatcher.dispatch(&record).await;
        let fallbacks = results
            .iter()
            .filter(|r| r.status == ResultStatus::Fallback)
            .count();
        if fallbacks > 0 {
            warn!(
                "case '{}': {fallbacks} of {} sections degraded to fallback text",
                input.label,
                results.len()
            );
        }

        let body = aggregate(&results);
        let impression = self.summarizer.summarize(&body, &record.note).await;
        if impression.is_fallback() {
            warn!("case '{}': impression degraded to fallback text", input.label);
        }

        debug!("case '{}' complete", input.label);
        CaseReport {
            label: input.label.clone(),
            exam_type: input.exam_type.clone(),
            body,
            impression: impression.text,
        }
    }

    /// Run one pipeline per input case concurrently, bounded by the case
    /// semaphore, and collect outcomes in input order
    pub async fn process_batch(self: Arc<Self>, inputs: Vec<CaseInput>) -> BatchResult {
        logging::log_progress("Processing batch", &format!("{} cases", inputs.len()));

        let labels: Vec<String> = inputs.iter().map(|input| input.label.clone()).collect();
        let handles: Vec<_> = inputs
            .into_iter()
            .map(|input| {
                let orchestrator = Arc::clone(&self);
                tokio::spawn(async move {
                    let _permit = orchestrator
                        .case_permits
                        .clone()
                        .acquire_owned()
                        .await
                        .expect("case semaphore closed");
                    CaseOutcome::Completed(orchestrator.process_case(&input).await)
                })
            })
            .collect();

        // One outcome per input, in input order; a panicked case degrades in
        // place instead of disturbing its neighbours.
        let mut entries = Vec::with_capacity(labels.len());
        for (label, joined) in labels.into_iter().zip(join_all(handles).await) {
            match joined {
                Ok(outcome) => entries.push(outcome),
                Err(e) => {
                    logging::log_error(&format!("case '{label}'"), &e);
                    entries.push(CaseOutcome::Degraded {
                        label,
                        reason: "case pipeline aborted".to_string(),
                    });
                }
            }
        }

        logging::log_success(&format!("Batch complete: {} cases", entries.len()));
        BatchResult::new(entries)
    }
}
