use thiserror::Error;

/// Pipeline stage names used to tag provider failures so the caller can
/// render a diagnostic pointing at the stage that aborted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    PriceScan,
    Dialogue,
    RecordExtraction,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PriceScan => "price_scan",
            Self::Dialogue => "dialogue",
            Self::RecordExtraction => "record_extraction",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every failure the pipeline can surface to a caller. Stage-level failures
/// halt the run; record-parse failure is deliberately absent because it
/// degrades into a displayable [`crate::CallRecord::Degraded`] instead.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("required credential `{name}` was not found in any configuration source")]
    CredentialMissing { name: String },
    #[error("web search failed: {reason}")]
    SearchFailed { reason: String },
    #[error("web search returned no results")]
    SearchEmpty,
    #[error("completion provider failed during {stage}: {reason}")]
    Provider { stage: Stage, reason: String },
    #[error("could not parse price line from model output during {stage}: {reason}")]
    LlmParse { stage: Stage, reason: String, raw: String },
}

impl PipelineError {
    pub fn provider(stage: Stage, reason: impl Into<String>) -> Self {
        Self::Provider { stage, reason: reason.into() }
    }

    /// The stage a failure belongs to. Search failures always belong to the
    /// price scan because that is the only stage that searches.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::CredentialMissing { .. } => None,
            Self::SearchFailed { .. } | Self::SearchEmpty => Some(Stage::PriceScan),
            Self::Provider { stage, .. } | Self::LlmParse { stage, .. } => Some(*stage),
        }
    }

    /// Stable machine-readable class for structured CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CredentialMissing { .. } => "credential_missing",
            Self::SearchFailed { .. } => "search_failed",
            Self::SearchEmpty => "search_empty",
            Self::Provider { .. } => "provider",
            Self::LlmParse { .. } => "llm_parse",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PipelineError, Stage};

    #[test]
    fn provider_error_names_stage_and_upstream_reason() {
        let error = PipelineError::provider(Stage::Dialogue, "quota exhausted");
        assert_eq!(
            error.to_string(),
            "completion provider failed during dialogue: quota exhausted"
        );
        assert_eq!(error.stage(), Some(Stage::Dialogue));
    }

    #[test]
    fn search_failures_map_to_price_scan_stage() {
        assert_eq!(PipelineError::SearchEmpty.stage(), Some(Stage::PriceScan));
        assert_eq!(
            PipelineError::SearchFailed { reason: "dns".to_string() }.stage(),
            Some(Stage::PriceScan)
        );
    }

    #[test]
    fn kinds_are_stable_identifiers() {
        let error = PipelineError::CredentialMissing { name: "llm.api_key".to_string() };
        assert_eq!(error.kind(), "credential_missing");
        assert_eq!(error.stage(), None);
    }
}
