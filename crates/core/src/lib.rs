pub mod config;
pub mod errors;
pub mod message;
pub mod sanitize;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions};
pub use errors::{PipelineError, Stage};
pub use message::{
    CallRecord, CrmRecord, Message, PriceCandidate, Role, Speaker, TranscriptLine,
    ASK_FOR_PRICING, PARSE_FAILURE, PRICE_ON_REQUEST,
};
pub use sanitize::{strip_code_fences, strip_role_prefix};
