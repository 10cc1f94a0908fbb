//! CRM record extraction from a finished transcript.
//!
//! The model is asked for bare JSON with three fields. When it ignores that
//! and wraps the object in fences or prose fragments, the sanitizer cleans
//! what it can; when parsing still fails, the result degrades into a
//! displayable error record instead of failing the run.

use std::sync::Arc;

use tracing::{info, warn};

use leadcall_core::{
    strip_code_fences, CallRecord, CrmRecord, Message, PipelineError, Stage, TranscriptLine,
};

use crate::llm::CompletionClient;

const CRM_PERSONA: &str =
    "You are a CRM assistant. You read a sales call transcript and fill in a record. \
     You respond with a bare JSON object only: no markdown, no code fences, no prose.";

pub struct RecordExtractor {
    llm: Arc<dyn CompletionClient>,
}

impl RecordExtractor {
    pub fn new(llm: Arc<dyn CompletionClient>) -> Self {
        Self { llm }
    }

    /// Asks the model once for a structured summary and parses the reply.
    /// Returns `Err` only when the completion call itself fails; a malformed
    /// reply becomes [`CallRecord::Degraded`] so the workflow always yields
    /// something displayable.
    pub async fn extract(&self, transcript: &[TranscriptLine]) -> Result<CallRecord, PipelineError> {
        let joined =
            transcript.iter().map(TranscriptLine::render).collect::<Vec<_>>().join("\n");
        let messages = [Message::system(CRM_PERSONA), Message::client(crm_prompt(&joined))];

        let response = self
            .llm
            .complete(&messages)
            .await
            .map_err(|error| PipelineError::provider(Stage::RecordExtraction, error.to_string()))?;

        let cleaned = strip_code_fences(response.into_text().trim());

        match serde_json::from_str::<CrmRecord>(&cleaned) {
            Ok(record) => {
                info!(event_name = "record.extracted", status = %record.status, "CRM record parsed");
                Ok(CallRecord::Parsed(record))
            }
            Err(parse_error) => {
                warn!(
                    event_name = "record.degraded",
                    error = %parse_error,
                    "record output did not parse; returning degraded record"
                );
                Ok(CallRecord::degraded(cleaned))
            }
        }
    }
}

fn crm_prompt(transcript_text: &str) -> String {
    format!(
        "Analyze this call transcript and return ONLY a JSON object with exactly \
         these fields:\n\
         {{\n  \"status\": \"...\",\n  \"mentioned_price\": \"...\",\n  \"outcome\": \"...\"\n}}\n\
         Transcript:\n{transcript_text}"
    )
}
