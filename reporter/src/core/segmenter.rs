//! Case segmentation: raw findings text into a structured `CaseRecord`
//!
//! Segmentation is fail-soft: any backend failure or unparseable response
//! degrades to the all-empty record instead of propagating.

use std::sync::Arc;

use serde_json::Value;
use shared::{CaseRecord, DynamicSection, SectionKey};
use tracing::{debug, warn};

use crate::core::client::GenerationClient;
use crate::core::instructions::{self, InstructionSet};
use crate::traits::GenerationBackend;

pub struct Segmenter<B> {
    client: GenerationClient<B>,
    instructions: Arc<InstructionSet>,
}

impl<B: GenerationBackend> Segmenter<B> {
    pub fn new(client: GenerationClient<B>, instructions: Arc<InstructionSet>) -> Self {
        Self {
            client,
            instructions,
        }
    }

    /// Split raw case text into canonical and dynamic sections
    pub async fn split(&self, raw_text: &str) -> CaseRecord {
        if raw_text.trim().is_empty() {
            debug!("blank case input, skipping segmentation call");
            return CaseRecord::empty();
        }

        let content = instructions::splitter_content(raw_text);
        let outcome = self
            .client
            .generate_structured(self.instructions.splitter(), &content)
            .await;

        match parse_segmentation(&outcome.text) {
            Some(record) => record,
            None => {
                warn!("segmentation response was not parseable JSON, continuing with empty record");
                CaseRecord::empty()
            }
        }
    }
}

/// Parse the segmentation response into a record
///
/// Tries the whole response as JSON first, then the first balanced `{...}`
/// substring. Missing keys default to empty, non-string canonical values are
/// treated as empty, malformed `others` entries are skipped, unknown keys are
/// ignored.
fn parse_segmentation(response: &str) -> Option<CaseRecord> {
    let value: Value = match serde_json::from_str(response.trim()) {
        Ok(value) => value,
        Err(_) => {
            let candidate = extract_json_object(response)?;
            serde_json::from_str(candidate).ok()?
        }
    };
    let map = value.as_object()?;

    let field = |name: &str| -> String {
        map.get(name)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    let dynamic_sections = map
        .get("others")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    let entry = item.as_object()?;
                    let label = entry.get("organ").and_then(Value::as_str)?;
                    let findings = entry.get("findings").and_then(Value::as_str)?;
                    Some(DynamicSection {
                        label: label.to_string(),
                        findings: findings.to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Some(CaseRecord {
        liver: field(SectionKey::Liver.field_name()),
        gallbladder: field(SectionKey::Gallbladder.field_name()),
        pancreas: field(SectionKey::Pancreas.field_name()),
        spleen: field(SectionKey::Spleen.field_name()),
        kidney: field(SectionKey::Kidney.field_name()),
        aorta: field(SectionKey::Aorta.field_name()),
        dynamic_sections,
        note: field("comment"),
    })
}

/// Locate the first balanced top-level `{...}` substring
///
/// Brace depth is tracked outside string literals so braces inside findings
/// text cannot truncate the object.
fn extract_json_object(response: &str) -> Option<&str> {
    let start = response.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in response[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&response[start..start + i + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}
