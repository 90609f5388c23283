//! Concurrent per-section dispatch with deterministic reassembly
//!
//! One generation task per non-empty section, canonical sections first in
//! canonical order, then dynamic sections in discovery order. All tasks run
//! in the same concurrent wave, bounded by the section semaphore, and join
//! together. Output order follows task position, never completion time.

use std::sync::Arc;

use futures_util::future::join_all;
use shared::{CaseRecord, ResultStatus, SectionResult, SectionSource, SectionTask};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::core::client::{GenerationClient, GENERIC_FALLBACK};
use crate::core::instructions::{self, InstructionSet};
use crate::traits::GenerationBackend;

pub struct Dispatcher<B> {
    client: GenerationClient<B>,
    instructions: Arc<InstructionSet>,
    section_permits: Arc<Semaphore>,
}

impl<B: GenerationBackend + Send + Sync + 'static> Dispatcher<B> {
    pub fn new(
        client: GenerationClient<B>,
        instructions: Arc<InstructionSet>,
        section_permits: Arc<Semaphore>,
    ) -> Self {
        Self {
            client,
            instructions,
            section_permits,
        }
    }

    /// Build the task list for a record
    ///
    /// Sections whose trimmed text is empty are skipped entirely; they
    /// produce no task and no downstream result.
    pub fn build_tasks(&self, record: &CaseRecord) -> Vec<SectionTask> {
        let mut tasks = Vec::new();

        for (key, text) in record.canonical_sections() {
            if text.trim().is_empty() {
                continue;
            }
            let source = SectionSource::Canonical(key);
            tasks.push(SectionTask {
                instructions: self.instructions.for_source(&source).to_string(),
                input: text.to_string(),
                source,
            });
        }

        for dynamic in &record.dynamic_sections {
            if dynamic.findings.trim().is_empty() {
                continue;
            }
            let source = SectionSource::Dynamic(dynamic.label.clone());
            tasks.push(SectionTask {
                instructions: self.instructions.for_source(&source).to_string(),
                input: dynamic.findings.clone(),
                source,
            });
        }

        tasks
    }

    /// Fan out all tasks concurrently and join them in task order
    pub async fn dispatch(&self, record: &CaseRecord) -> Vec<SectionResult> {
        let tasks = self.build_tasks(record);
        if tasks.is_empty() {
            debug!("no non-empty sections to dispatch");
            return Vec::new();
        }
        debug!("dispatching {} section tasks", tasks.len());

        let sources: Vec<SectionSource> = tasks.iter().map(|t| t.source.clone()).collect();
        let handles: Vec<_> = tasks
            .into_iter()
            .map(|task| {
                let client = self.client.clone();
                let permits = Arc::clone(&self.section_permits);
                let content = instructions::section_content(&task.source, &task.input, &record.note);
                tokio::spawn(async move {
                    let _permit = permits
                        .acquire_owned()
                        .await
                        .expect("section semaphore closed");
                    let outcome = client.generate(&task.instructions, &content).await;
                    SectionResult {
                        source: task.source,
                        text: outcome.text,
                        status: outcome.status,
                        attempts: outcome.attempts,
                    }
                })
            })
            .collect();

        // Handles are joined in spawn order, so arrival timing cannot
        // reorder the output.
        let mut results = Vec::with_capacity(sources.len());
        for (source, joined) in sources.into_iter().zip(join_all(handles).await) {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!("section task for {source} panicked: {e}");
                    results.push(SectionResult {
                        source,
                        text: GENERIC_FALLBACK.to_string(),
                        status: ResultStatus::Fallback,
                        attempts: 0,
                    });
                }
            }
        }
        results
    }
}
