//! Sourced assertions extracted from retrieved content.
//!
//! The assertion filter is the system's grounding guarantee: a claim
//! without a source URL never reaches answer synthesis.

use mes_droits_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// A single factual claim with its source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assertion {
    /// The claim, in French
    pub assertion: String,

    /// URL source of the assertion; `None` when no source is available
    #[serde(default)]
    pub source: Option<String>,
}

/// Ordered collection of assertions produced by one extraction call.
///
/// May be empty after filtering, which is itself a meaningful signal:
/// no grounded answer is available.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssertionSet {
    #[serde(default)]
    pub assertions: Vec<Assertion>,
}

impl AssertionSet {
    /// JSON schema handed to the model to force conforming output.
    pub fn schema() -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "assertions": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "assertion": {
                                "type": "string"
                            },
                            "source": {
                                "type": ["string", "null"],
                                "description": "URL source of the assertion, null if no source is available."
                            }
                        },
                        "required": ["assertion"]
                    }
                }
            },
            "required": ["assertions"]
        })
    }

    /// Parse raw structured output against the assertion schema.
    ///
    /// # Errors
    /// `AppError::Schema` when the payload does not parse; never swallowed.
    pub fn from_json(raw: &str) -> AppResult<Self> {
        serde_json::from_str(raw).map_err(|e| {
            AppError::Schema(format!("Assertion set does not match schema: {}", e))
        })
    }

    /// Keep only assertions whose source is present and non-empty.
    pub fn retain_sourced(mut self) -> Self {
        self.assertions.retain(|a| {
            a.source
                .as_deref()
                .map(|s| !s.trim().is_empty())
                .unwrap_or(false)
        });
        self
    }

    /// Whether no assertions survived.
    pub fn is_empty(&self) -> bool {
        self.assertions.is_empty()
    }

    /// Serialize the set for inclusion in the conversation.
    pub fn to_json(&self) -> AppResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}
