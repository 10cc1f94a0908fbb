//! Agent pipeline - automated sales-qualification workflow
//!
//! This crate drives one qualification run end to end:
//! 1. **Price scan** (`pricing`) - web search + one completion call →
//!    `(vendor, price)` candidate with a two-tier fallback parser
//! 2. **Call simulation** (`dialogue`) - fixed six-turn negotiation between a
//!    model-played client and vendor admin with asymmetric context
//! 3. **Record extraction** (`record`) - transcript → CRM record, degrading
//!    to a displayable error record when the model output will not parse
//!
//! # Key Types
//!
//! - `SalesPipeline` - orchestrator exposing the three stages and `run`
//! - `CompletionClient` / `SearchClient` - pluggable provider seams
//! - `CompletionResponse` - tagged union of provider response shapes with a
//!   single normalization point
//!
//! The pipeline is fully sequential: each stage blocks on its provider call
//! before the next begins, and a run never shares state with another run.

pub mod dialogue;
pub mod llm;
pub mod pipeline;
pub mod pricing;
pub mod record;
pub mod search;

pub use dialogue::{DialogueEngine, TURN_COUNT};
pub use llm::{CompletionClient, CompletionResponse, OpenRouterClient, ProviderError};
pub use pipeline::{CallReport, SalesPipeline};
pub use pricing::{parse_price_line, PriceScout};
pub use record::RecordExtractor;
pub use search::{SearchClient, SearchError, SearchHit, SerperClient};
