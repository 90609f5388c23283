//! Impression synthesis over the aggregated document

use std::sync::Arc;

use tracing::debug;

use crate::core::client::{GenerationClient, GenerationOutcome};
use crate::core::instructions::{self, InstructionSet};
use crate::traits::GenerationBackend;

pub struct Summarizer<B> {
    client: GenerationClient<B>,
    instructions: Arc<InstructionSet>,
}

impl<B: GenerationBackend> Summarizer<B> {
    pub fn new(client: GenerationClient<B>, instructions: Arc<InstructionSet>) -> Self {
        Self {
            client,
            instructions,
        }
    }

    /// One generation call combining the aggregated document and the case
    /// note. Failure semantics are the client's: the impression degrades to
    /// fallback text, never to an error.
    pub async fn summarize(&self, document: &str, note: &str) -> GenerationOutcome {
        debug!(document_len = document.len(), "generating impression");
        let content = instructions::impression_content(document, note);
        self.client
            .generate(self.instructions.impression(), &content)
            .await
    }
}
