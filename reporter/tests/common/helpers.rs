//! Scripted backend and builder helpers for pipeline tests
//!
//! `ScriptedBackend` gives each test full control over backend behavior per
//! call (index, instructions, content, structured flag) plus optional
//! per-content delays for adversarial completion-order scenarios, while
//! recording every call for assertions.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reporter::core::InstructionSet;
use reporter::{Dispatcher, GenerationClient, ReportOrchestrator, ReporterConfig};
use shared::{ApiFailure, GenerationConfig, RetryConfig};
use tokio::sync::Semaphore;

/// One recorded backend call
#[derive(Debug, Clone)]
pub struct CallRecord {
    pub instructions: String,
    pub content: String,
    pub structured: bool,
}

type Responder = dyn Fn(u32, &str, &str, bool) -> Result<String, ApiFailure> + Send + Sync;

/// Deterministic scripted backend for tests
pub struct ScriptedBackend {
    responder: Box<Responder>,
    delays: Vec<(String, Duration)>,
    calls: Mutex<Vec<CallRecord>>,
    counter: AtomicU32,
}

impl ScriptedBackend {
    pub fn new(
        responder: impl Fn(u32, &str, &str, bool) -> Result<String, ApiFailure>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            delays: Vec::new(),
            calls: Mutex::new(Vec::new()),
            counter: AtomicU32::new(0),
        }
    }

    /// Sleep before answering any call whose content contains `needle`
    pub fn with_delay(mut self, needle: &str, delay: Duration) -> Self {
        self.delays.push((needle.to_string(), delay));
        self
    }

    pub fn calls(&self) -> Vec<CallRecord> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> u32 {
        self.counter.load(Ordering::SeqCst)
    }

    async fn respond(
        &self,
        instructions: &str,
        content: &str,
        structured: bool,
    ) -> Result<String, ApiFailure> {
        let index = self.counter.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(CallRecord {
            instructions: instructions.to_string(),
            content: content.to_string(),
            structured,
        });

        let delay = self
            .delays
            .iter()
            .find(|(needle, _)| content.contains(needle))
            .map(|(_, delay)| *delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        (self.responder)(index, instructions, content, structured)
    }
}

#[async_trait::async_trait]
impl reporter::GenerationBackend for ScriptedBackend {
    async fn generate(
        &self,
        instructions: &str,
        content: &str,
        _config: &GenerationConfig,
    ) -> Result<String, ApiFailure> {
        self.respond(instructions, content, false).await
    }

    async fn generate_structured(
        &self,
        instructions: &str,
        content: &str,
        _config: &GenerationConfig,
    ) -> Result<String, ApiFailure> {
        self.respond(instructions, content, true).await
    }
}

/// True for segmentation calls
pub fn is_segmentation(record: &CallRecord) -> bool {
    record.structured
}

/// True for impression calls
pub fn is_impression(record: &CallRecord) -> bool {
    record
        .content
        .starts_with("Based on this complete radiology report")
}

/// True for per-section calls (canonical or dynamic)
pub fn is_section(record: &CallRecord) -> bool {
    record
        .content
        .starts_with("Generate the radiology report section")
}

/// Orchestrator over a scripted backend with default configuration
pub fn orchestrator_over(backend: Arc<ScriptedBackend>) -> Arc<ReportOrchestrator<ScriptedBackend>> {
    Arc::new(ReportOrchestrator::new(backend, ReporterConfig::default()))
}

/// Dispatcher over a scripted backend with default configuration
pub fn dispatcher_over(backend: Arc<ScriptedBackend>) -> Dispatcher<ScriptedBackend> {
    let client = GenerationClient::new(
        backend,
        GenerationConfig::default(),
        RetryConfig::default(),
    );
    Dispatcher::new(
        client,
        Arc::new(InstructionSet::default()),
        Arc::new(Semaphore::new(8)),
    )
}
