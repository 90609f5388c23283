//! Core types used throughout the report generation pipeline

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Width of the banner lines used in batch artifacts
pub const BANNER_WIDTH: usize = 80;

/// Canonical report sections in their fixed output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionKey {
    Liver,
    Gallbladder,
    Pancreas,
    Spleen,
    Kidney,
    Aorta,
}

impl SectionKey {
    /// Canonical ordering. Fixed configuration, never mutated at runtime.
    pub const ALL: [SectionKey; 6] = [
        SectionKey::Liver,
        SectionKey::Gallbladder,
        SectionKey::Pancreas,
        SectionKey::Spleen,
        SectionKey::Kidney,
        SectionKey::Aorta,
    ];

    /// Field name used for this section in the segmentation JSON object
    pub fn field_name(&self) -> &'static str {
        match self {
            SectionKey::Liver => "liver",
            SectionKey::Gallbladder => "gb",
            SectionKey::Pancreas => "pancreas",
            SectionKey::Spleen => "spleen",
            SectionKey::Kidney => "kidney",
            SectionKey::Aorta => "aorta",
        }
    }

    /// Position of this section in the canonical order
    pub fn canonical_index(&self) -> usize {
        Self::ALL
            .iter()
            .position(|k| k == self)
            .expect("section key missing from canonical order")
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionKey::Liver => write!(f, "liver"),
            SectionKey::Gallbladder => write!(f, "gallbladder"),
            SectionKey::Pancreas => write!(f, "pancreas"),
            SectionKey::Spleen => write!(f, "spleen"),
            SectionKey::Kidney => write!(f, "kidney"),
            SectionKey::Aorta => write!(f, "aorta"),
        }
    }
}

/// A section discovered during segmentation outside the canonical set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicSection {
    /// Organ or region label as reported by the segmentation call
    pub label: String,
    /// Findings text, preserved verbatim
    pub findings: String,
}

/// Structured findings for one case, produced once by segmentation and
/// immutable afterwards
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseRecord {
    pub liver: String,
    pub gallbladder: String,
    pub pancreas: String,
    pub spleen: String,
    pub kidney: String,
    pub aorta: String,
    /// Non-canonical sections in discovery order
    pub dynamic_sections: Vec<DynamicSection>,
    /// Free-text commentary accompanying the findings
    pub note: String,
}

impl CaseRecord {
    /// The all-empty record used when segmentation fails or input is blank
    pub fn empty() -> Self {
        Self::default()
    }

    /// Findings text for a canonical section
    pub fn section(&self, key: SectionKey) -> &str {
        match key {
            SectionKey::Liver => &self.liver,
            SectionKey::Gallbladder => &self.gallbladder,
            SectionKey::Pancreas => &self.pancreas,
            SectionKey::Spleen => &self.spleen,
            SectionKey::Kidney => &self.kidney,
            SectionKey::Aorta => &self.aorta,
        }
    }

    /// Canonical sections paired with their findings, in canonical order
    pub fn canonical_sections(&self) -> impl Iterator<Item = (SectionKey, &str)> {
        SectionKey::ALL.iter().map(move |key| (*key, self.section(*key)))
    }

    /// True when no section carries any findings
    pub fn is_empty(&self) -> bool {
        self.canonical_sections().all(|(_, text)| text.trim().is_empty())
            && self
                .dynamic_sections
                .iter()
                .all(|d| d.findings.trim().is_empty())
            && self.note.trim().is_empty()
    }
}

/// Identity of a dispatched section, carrying its ordering position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectionSource {
    Canonical(SectionKey),
    Dynamic(String),
}

impl fmt::Display for SectionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionSource::Canonical(key) => write!(f, "{key}"),
            SectionSource::Dynamic(label) => write!(f, "{label}"),
        }
    }
}

/// One unit of dispatched generation work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionTask {
    pub source: SectionSource,
    /// Findings text handed to the backend, non-empty after trimming
    pub input: String,
    /// Instructions looked up from the instruction table
    pub instructions: String,
}

/// Whether a generation call produced backend text or a fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultStatus {
    Success,
    Fallback,
}

/// Outcome of a single dispatched section task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionResult {
    pub source: SectionSource,
    pub text: String,
    pub status: ResultStatus,
    /// Backend attempts consumed, including the successful one
    pub attempts: u32,
}

/// Backend failure classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiFailure {
    RateLimited,
    Connectivity(String),
    ContentBlocked,
    MalformedOutput(String),
    Other(String),
}

impl ApiFailure {
    /// Retry only makes sense for rate limiting and transient connectivity
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiFailure::RateLimited | ApiFailure::Connectivity(_))
    }
}

impl fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiFailure::RateLimited => write!(f, "rate limit exceeded"),
            ApiFailure::Connectivity(detail) => write!(f, "connectivity failure: {detail}"),
            ApiFailure::ContentBlocked => write!(f, "blocked by content policy"),
            ApiFailure::MalformedOutput(detail) => write!(f, "malformed output: {detail}"),
            ApiFailure::Other(detail) => write!(f, "request failed: {detail}"),
        }
    }
}

/// Sampling configuration for backend calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub model: String,
    pub max_output_tokens: u32,
    pub temperature: f32,
    /// Deadline for a single backend attempt
    pub request_timeout: Duration,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            max_output_tokens: 5000,
            temperature: 0.0,
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// Retry and backoff configuration for the generation client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per call, including the first
    pub max_attempts: u32,
    pub initial_delay: Duration,
    /// Add up to 10% random jitter to each backoff delay
    pub jitter: bool,
}

impl RetryConfig {
    /// Backoff before retrying after a failed attempt (0-based):
    /// `initial_delay * 2^attempt`
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.initial_delay * 2u32.saturating_pow(attempt)
    }

    pub fn validate(&self) -> crate::errors::SharedResult<()> {
        if self.max_attempts == 0 {
            return Err(crate::errors::SharedError::InvalidConfig {
                field: "max_attempts".to_string(),
                value: self.max_attempts.to_string(),
            });
        }
        Ok(())
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_secs(1),
            jitter: false,
        }
    }
}

/// Fan-out bounds for the dispatcher and the batch coordinator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcurrencyConfig {
    /// Concurrent section generation calls per case
    pub max_section_tasks: usize,
    /// Concurrent case pipelines per batch
    pub max_cases: usize,
}

impl ConcurrencyConfig {
    pub fn validate(&self) -> crate::errors::SharedResult<()> {
        if self.max_section_tasks == 0 {
            return Err(crate::errors::SharedError::InvalidConfig {
                field: "max_section_tasks".to_string(),
                value: self.max_section_tasks.to_string(),
            });
        }
        if self.max_cases == 0 {
            return Err(crate::errors::SharedError::InvalidConfig {
                field: "max_cases".to_string(),
                value: self.max_cases.to_string(),
            });
        }
        Ok(())
    }
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            max_section_tasks: 8,
            max_cases: 4,
        }
    }
}

/// One case submitted to the batch coordinator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseInput {
    /// Identifier used in banners and log lines, typically the file stem
    pub label: String,
    pub raw_text: String,
    /// Study type rendered in the report title
    pub exam_type: String,
}

impl CaseInput {
    pub fn new(label: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            raw_text: raw_text.into(),
            exam_type: "Abdomen".to_string(),
        }
    }

    pub fn with_exam_type(mut self, exam_type: impl Into<String>) -> Self {
        self.exam_type = exam_type.into();
        self
    }
}

/// Final per-case artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseReport {
    pub label: String,
    pub exam_type: String,
    /// Ordered section texts, blank-line separated
    pub body: String,
    pub impression: String,
}

impl CaseReport {
    /// Render through the fixed report template
    pub fn render(&self) -> String {
        format!(
            "ULTRASOUND {}\n\n{}\n\nIMPRESSION:\n{}\n",
            self.exam_type.to_uppercase(),
            self.body,
            self.impression
        )
    }
}

/// Per-case outcome inside a batch: a full report or a degraded placeholder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaseOutcome {
    Completed(CaseReport),
    Degraded { label: String, reason: String },
}

impl CaseOutcome {
    pub fn label(&self) -> &str {
        match self {
            CaseOutcome::Completed(report) => &report.label,
            CaseOutcome::Degraded { label, .. } => label,
        }
    }

    pub fn render(&self) -> String {
        match self {
            CaseOutcome::Completed(report) => report.render(),
            CaseOutcome::Degraded { reason, .. } => {
                format!("Report generation failed: {reason}\n")
            }
        }
    }
}

/// Ordered batch artifact: one entry per input case, in input order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    entries: Vec<CaseOutcome>,
}

impl BatchResult {
    pub fn new(entries: Vec<CaseOutcome>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CaseOutcome] {
        &self.entries
    }

    /// Render the batch artifact: banner-prefixed case blocks joined by a
    /// fixed divider, in input order
    pub fn render(&self) -> String {
        let banner = "=".repeat(BANNER_WIDTH);
        let blocks: Vec<String> = self
            .entries
            .iter()
            .map(|outcome| {
                format!(
                    "{banner}\nPATIENT {}\n{banner}\n\n{}",
                    outcome.label(),
                    outcome.render()
                )
            })
            .collect();
        blocks.join("\n\n\n")
    }
}
