//! Pipeline orchestration: price scan, call simulation, record extraction.
//!
//! One parameterized pipeline wired from injected collaborators. The stages
//! run strictly in sequence; no two provider calls are ever in flight at the
//! same time, and every run owns its own state.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use leadcall_core::config::AppConfig;
use leadcall_core::{CallRecord, PipelineError, PriceCandidate, TranscriptLine};

use crate::dialogue::DialogueEngine;
use crate::llm::{CompletionClient, OpenRouterClient};
use crate::pricing::PriceScout;
use crate::record::RecordExtractor;
use crate::search::{SearchClient, SerperClient};

/// Everything a caller gets back from a completed run.
#[derive(Clone, Debug, Serialize)]
pub struct CallReport {
    pub call_id: Uuid,
    pub vendor: PriceCandidate,
    pub transcript: Vec<TranscriptLine>,
    pub record: CallRecord,
}

pub struct SalesPipeline {
    scout: PriceScout,
    engine: DialogueEngine,
    extractor: RecordExtractor,
}

impl SalesPipeline {
    /// Wires the production collaborators. Credential checks run here, once,
    /// before any client could touch the network.
    pub fn from_config(config: &AppConfig) -> Result<Self, PipelineError> {
        let llm: Arc<dyn CompletionClient> = Arc::new(OpenRouterClient::from_config(config)?);
        let search: Arc<dyn SearchClient> = Arc::new(SerperClient::from_config(config)?);
        Ok(Self::new(config, search, llm))
    }

    /// Wires the pipeline with injected collaborators; strategy variation
    /// (stub providers, alternate transports) happens here rather than in
    /// parallel pipeline definitions.
    pub fn new(
        config: &AppConfig,
        search: Arc<dyn SearchClient>,
        llm: Arc<dyn CompletionClient>,
    ) -> Self {
        Self {
            scout: PriceScout::new(search, llm.clone(), &config.call),
            engine: DialogueEngine::new(llm.clone(), &config.call),
            extractor: RecordExtractor::new(llm),
        }
    }

    pub async fn find_cheapest_vendor(&self, query: &str) -> Result<PriceCandidate, PipelineError> {
        self.scout.find_cheapest_vendor(query).await
    }

    pub async fn simulate_negotiation(
        &self,
        candidate: &PriceCandidate,
    ) -> Result<Vec<TranscriptLine>, PipelineError> {
        self.engine.run(candidate).await
    }

    pub async fn extract_record(
        &self,
        transcript: &[TranscriptLine],
    ) -> Result<CallRecord, PipelineError> {
        self.extractor.extract(transcript).await
    }

    /// Runs all three stages in order. Any stage failure halts the run; a
    /// malformed record does not, per the degraded-record contract.
    pub async fn run(&self, query: &str) -> Result<CallReport, PipelineError> {
        let call_id = Uuid::new_v4();
        info!(event_name = "pipeline.run.started", %call_id, query, "starting qualification run");

        let vendor = self.find_cheapest_vendor(query).await.map_err(|stage_error| {
            error!(event_name = "pipeline.price_scan.failed", %call_id, error = %stage_error, "run halted");
            stage_error
        })?;
        info!(
            event_name = "pipeline.price_scan.completed",
            %call_id,
            vendor = %vendor.vendor_name,
            price = %vendor.price_text,
            "price scan completed"
        );

        let transcript = self.simulate_negotiation(&vendor).await.map_err(|stage_error| {
            error!(event_name = "pipeline.dialogue.failed", %call_id, error = %stage_error, "run halted");
            stage_error
        })?;
        info!(
            event_name = "pipeline.dialogue.completed",
            %call_id,
            turns = transcript.len(),
            "call simulation completed"
        );

        let record = self.extract_record(&transcript).await.map_err(|stage_error| {
            error!(event_name = "pipeline.record_extraction.failed", %call_id, error = %stage_error, "run halted");
            stage_error
        })?;
        info!(
            event_name = "pipeline.record_extraction.completed",
            %call_id,
            degraded = record.is_degraded(),
            "record extraction completed"
        );

        Ok(CallReport { call_id, vendor, transcript, record })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use leadcall_core::config::AppConfig;
    use leadcall_core::{CallRecord, Message, PipelineError, PriceCandidate};

    use super::SalesPipeline;
    use crate::llm::{CompletionClient, CompletionResponse, ProviderError};
    use crate::search::{SearchClient, SearchError, SearchHit};

    struct FixedSearch(Result<Vec<SearchHit>, SearchError>);

    #[async_trait]
    impl SearchClient for FixedSearch {
        async fn search(&self, _query: &str) -> Result<Vec<SearchHit>, SearchError> {
            self.0.clone()
        }
    }

    /// Serves the whole run from one script: price line, six call turns, CRM
    /// record. One entry per completion call, in order.
    struct ScriptedCompletion {
        script: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CompletionClient for ScriptedCompletion {
        async fn complete(
            &self,
            _messages: &[Message],
        ) -> Result<CompletionResponse, ProviderError> {
            let mut script = self.script.lock().expect("script");
            assert!(!script.is_empty(), "pipeline made more completion calls than scripted");
            Ok(CompletionResponse::Text(script.remove(0)))
        }
    }

    fn full_run_script() -> Arc<ScriptedCompletion> {
        Arc::new(ScriptedCompletion {
            script: Mutex::new(
                [
                    "BrightDental|12000 RUB",
                    "CLIENT: Hi, how much is an implant?",
                    "ADMIN: 12000 RUB, all inclusive.",
                    "CLIENT: Why so cheap?",
                    "ADMIN: We run our own lab.",
                    "CLIENT: Book me for tomorrow.",
                    "ADMIN: Booked for 10am.",
                    r#"{"status":"lead","mentioned_price":"12000 RUB","outcome":"booked"}"#,
                ]
                .into_iter()
                .map(String::from)
                .collect(),
            ),
        })
    }

    fn pipeline_with(
        search: Result<Vec<SearchHit>, SearchError>,
        llm: Arc<ScriptedCompletion>,
    ) -> SalesPipeline {
        SalesPipeline::new(&AppConfig::default(), Arc::new(FixedSearch(search)), llm)
    }

    fn one_hit() -> Vec<SearchHit> {
        vec![SearchHit {
            title: "BrightDental".to_string(),
            snippet: "implants from 12000 RUB".to_string(),
        }]
    }

    #[tokio::test]
    async fn full_run_produces_vendor_transcript_and_record() {
        let pipeline = pipeline_with(Ok(one_hit()), full_run_script());

        let report = pipeline.run("implant price").await.expect("report");
        assert_eq!(report.vendor, PriceCandidate::new("BrightDental", "12000 RUB"));
        assert_eq!(report.transcript.len(), 6);
        assert!(matches!(report.record, CallRecord::Parsed(ref r) if r.status == "lead"));
    }

    #[tokio::test]
    async fn empty_search_halts_the_run_with_search_empty() {
        let pipeline = pipeline_with(Ok(Vec::new()), full_run_script());

        let error = pipeline.run("implant price").await.expect_err("halted");
        assert_eq!(error, PipelineError::SearchEmpty);
    }

    #[tokio::test]
    async fn search_failure_halts_the_run_with_the_reason() {
        let pipeline =
            pipeline_with(Err(SearchError("dns failure".to_string())), full_run_script());

        let error = pipeline.run("implant price").await.expect_err("halted");
        assert!(matches!(error, PipelineError::SearchFailed { ref reason } if reason.contains("dns failure")));
    }

    #[tokio::test]
    async fn degraded_record_still_completes_the_run() {
        let llm = Arc::new(ScriptedCompletion {
            script: Mutex::new(
                [
                    "BrightDental|12000 RUB",
                    "CLIENT: Hi",
                    "ADMIN: Hello",
                    "CLIENT: Why so cheap?",
                    "ADMIN: Own lab.",
                    "CLIENT: Book me.",
                    "ADMIN: Booked.",
                    "no json here, sorry",
                ]
                .into_iter()
                .map(String::from)
                .collect(),
            ),
        });
        let pipeline = pipeline_with(Ok(one_hit()), llm);

        let report = pipeline.run("implant price").await.expect("report");
        assert!(report.record.is_degraded());
    }

    #[tokio::test]
    async fn stages_are_independently_callable() {
        let pipeline = pipeline_with(Ok(one_hit()), full_run_script());

        let vendor = pipeline.find_cheapest_vendor("implant price").await.expect("vendor");
        let transcript = pipeline.simulate_negotiation(&vendor).await.expect("transcript");
        let record = pipeline.extract_record(&transcript).await.expect("record");

        assert_eq!(transcript.len(), 6);
        assert!(!record.is_degraded());
    }
}
