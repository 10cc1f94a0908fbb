//! Domain types for a single qualification call: role-tagged messages, the
//! transcript the dialogue engine emits, the price candidate found by search
//! analysis, and the CRM record extracted from the finished call.
//!
//! All of these are created per pipeline run and never mutated afterwards;
//! histories grow by appending fresh values.

use serde::{Deserialize, Serialize};

/// Placeholder used when the model emits `Name|` with nothing after the bar.
pub const PRICE_ON_REQUEST: &str = "Price on request";

/// Placeholder used when the model emits a single bare token for the vendor.
pub const ASK_FOR_PRICING: &str = "Ask for pricing";

/// Fixed string carried by every degraded record.
pub const PARSE_FAILURE: &str = "parse failure";

/// Conversational role a message carries when prompting the model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    System,
    Client,
    Admin,
}

/// One of the two simulated call participants. Distinct from [`Role`] so a
/// transcript line can never claim to be spoken by the system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Client,
    Admin,
}

impl Speaker {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Client => "CLIENT",
            Self::Admin => "ADMIN",
        }
    }

    pub fn marker(&self) -> &'static str {
        match self {
            Self::Client => "👤",
            Self::Admin => "🧑‍💼",
        }
    }

    pub fn wire_prefix(&self) -> &'static str {
        match self {
            Self::Client => "CLIENT:",
            Self::Admin => "ADMIN:",
        }
    }
}

/// A single role-tagged message in a conversational view. Immutable once
/// created; ordering within a sequence is chronological.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub text: String,
}

impl Message {
    pub fn system(text: impl Into<String>) -> Self {
        Self { role: Role::System, text: text.into() }
    }

    pub fn client(text: impl Into<String>) -> Self {
        Self { role: Role::Client, text: text.into() }
    }

    pub fn admin(text: impl Into<String>) -> Self {
        Self { role: Role::Admin, text: text.into() }
    }
}

/// Externally visible artifact of the dialogue engine, emitted in speaking
/// order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptLine {
    pub speaker: Speaker,
    pub text: String,
}

impl TranscriptLine {
    pub fn client(text: impl Into<String>) -> Self {
        Self { speaker: Speaker::Client, text: text.into() }
    }

    pub fn admin(text: impl Into<String>) -> Self {
        Self { speaker: Speaker::Admin, text: text.into() }
    }

    pub fn render(&self) -> String {
        format!("{} **{}:** {}", self.speaker.marker(), self.speaker.label(), self.text)
    }
}

impl std::fmt::Display for TranscriptLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

/// Vendor plus advertised price, both free text. The price may carry currency
/// units and is deliberately never parsed to a number.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceCandidate {
    pub vendor_name: String,
    pub price_text: String,
}

impl PriceCandidate {
    /// Builds a candidate, filling either empty field with its fixed
    /// placeholder so downstream prompts never interpolate an empty string.
    pub fn new(vendor_name: impl Into<String>, price_text: impl Into<String>) -> Self {
        let vendor_name = vendor_name.into().trim().to_string();
        let price_text = price_text.into().trim().to_string();
        Self {
            vendor_name: if vendor_name.is_empty() { "Unknown vendor".to_string() } else { vendor_name },
            price_text: if price_text.is_empty() { PRICE_ON_REQUEST.to_string() } else { price_text },
        }
    }
}

/// Structured summary of a finished call. Field values are opaque free text;
/// only the top-level shape is validated at parse time, so a field the model
/// omitted deserializes as an empty string rather than failing the record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrmRecord {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub mentioned_price: String,
    #[serde(default)]
    pub outcome: String,
}

/// Result of record extraction. Parses to a flat string-to-string JSON map in
/// both shapes, so callers can always display *something*.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CallRecord {
    Parsed(CrmRecord),
    Degraded { error: String, raw: String },
}

impl CallRecord {
    pub fn degraded(raw: impl Into<String>) -> Self {
        Self::Degraded { error: PARSE_FAILURE.to_string(), raw: raw.into() }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }
}
