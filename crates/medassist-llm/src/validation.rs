//! Medical safety validation
//!
//! Requests are checked for warning conditions only and are never blocked.
//! Responses are rejected when they contain a denylisted phrase. A missing
//! disclaimer is reported as a warning and does not reject the response.
//!
//! Phrases come from configuration. Matching is case-insensitive and
//! tolerant of repeated whitespace and typographic apostrophes.

use crate::error::{Error, Result};
use crate::request::GenerationRequest;
use regex::RegexSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Safety-context key that disables the disclaimer check when set to `"false"`
pub const REQUIRES_DISCLAIMER_KEY: &str = "requires_disclaimer";

fn default_denylist() -> Vec<String> {
    [
        "ignore your doctor",
        "stop taking medication",
        "stop taking your medication",
        "don't need medical attention",
        "ignore a su médico",
        "deje de tomar su medicación",
        "no necesita atención médica",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_disclaimers() -> Vec<String> {
    [
        "consulte con su médico",
        "consult with your doctor",
        "consult your doctor",
        "medical professional",
        "profesional de la salud",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_max_safe_temperature() -> f32 {
    0.5
}

fn default_required_context_fields() -> Vec<String> {
    vec!["safety_level".to_string(), "domain".to_string()]
}

/// Validation phrases and thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Phrases that make a response unsafe
    #[serde(default = "default_denylist")]
    pub denylist: Vec<String>,
    /// Phrases that count as a medical disclaimer
    #[serde(default = "default_disclaimers")]
    pub disclaimers: Vec<String>,
    /// Temperatures above this produce a warning
    #[serde(default = "default_max_safe_temperature")]
    pub max_safe_temperature: f32,
    /// Safety-context fields expected on every request
    #[serde(default = "default_required_context_fields")]
    pub required_context_fields: Vec<String>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            denylist: default_denylist(),
            disclaimers: default_disclaimers(),
            max_safe_temperature: default_max_safe_temperature(),
            required_context_fields: default_required_context_fields(),
        }
    }
}

/// Non-blocking validation finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationWarning {
    /// Temperature above the configured safe maximum
    HighTemperature {
        /// Requested temperature
        temperature: f32,
        /// Configured maximum
        max: f32,
    },
    /// Expected safety-context field absent
    MissingContextField {
        /// Field name
        field: String,
    },
    /// Response has no recognizable disclaimer
    MissingDisclaimer,
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HighTemperature { temperature, max } => {
                write!(f, "temperature {temperature} exceeds safe maximum {max}")
            }
            Self::MissingContextField { field } => {
                write!(f, "safety context missing field '{field}'")
            }
            Self::MissingDisclaimer => f.write_str("response lacks a medical disclaimer"),
        }
    }
}

/// Full outcome of a response check
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseReport {
    /// No denylisted phrase found
    pub safe: bool,
    /// Denylisted phrases that matched
    pub denylist_matches: Vec<String>,
    /// Non-blocking findings
    pub warnings: Vec<ValidationWarning>,
}

/// Compiled request/response validator
#[derive(Debug, Clone)]
pub struct ValidationPipeline {
    config: ValidationConfig,
    denylist: RegexSet,
    disclaimers: RegexSet,
}

/// Turn a phrase into a whitespace/apostrophe tolerant pattern
fn phrase_pattern(phrase: &str) -> String {
    let words: Vec<String> = phrase
        .split_whitespace()
        .map(|w| regex::escape(w).replace('\'', "['’]"))
        .collect();
    format!("(?i){}", words.join(r"\s+"))
}

fn compile(phrases: &[String], what: &str) -> Result<RegexSet> {
    let patterns: Vec<String> = phrases
        .iter()
        .filter(|p| !p.trim().is_empty())
        .map(|p| phrase_pattern(p))
        .collect();
    RegexSet::new(&patterns).map_err(|e| Error::Configuration(format!("{what} phrases: {e}")))
}

impl ValidationPipeline {
    /// Compile a pipeline from configuration
    pub fn new(config: ValidationConfig) -> Result<Self> {
        let denylist = compile(&config.denylist, "denylist")?;
        let disclaimers = compile(&config.disclaimers, "disclaimer")?;
        Ok(Self {
            config,
            denylist,
            disclaimers,
        })
    }

    /// Pipeline with the built-in phrase lists
    pub fn with_defaults() -> Result<Self> {
        Self::new(ValidationConfig::default())
    }

    /// Configuration in use
    #[must_use]
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Pre-call checks; never blocks
    #[must_use]
    pub fn validate_request(&self, request: &GenerationRequest) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if let Some(temperature) = request.temperature {
            if temperature > self.config.max_safe_temperature {
                warnings.push(ValidationWarning::HighTemperature {
                    temperature,
                    max: self.config.max_safe_temperature,
                });
            }
        }

        if !request.safety_context.is_empty() {
            for field in &self.config.required_context_fields {
                if !request.safety_context.contains_key(field) {
                    warnings.push(ValidationWarning::MissingContextField {
                        field: field.clone(),
                    });
                }
            }
        }

        for warning in &warnings {
            warn!(warning = %warning, "Generation request validation warning");
        }
        warnings
    }

    /// `false` iff the content contains a denylisted phrase
    #[must_use]
    pub fn validate_response(&self, content: &str, request: &GenerationRequest) -> bool {
        self.inspect_response(content, request).safe
    }

    /// Full response check including non-blocking warnings
    #[must_use]
    pub fn inspect_response(&self, content: &str, request: &GenerationRequest) -> ResponseReport {
        let denylist_matches: Vec<String> = self
            .denylist
            .matches(content)
            .into_iter()
            .filter_map(|i| self.denylisted_phrase(i))
            .collect();

        let mut warnings = Vec::new();
        let requires_disclaimer = request
            .safety_context
            .get(REQUIRES_DISCLAIMER_KEY)
            .map_or(true, |v| !v.eq_ignore_ascii_case("false"));
        if requires_disclaimer && !self.disclaimers.is_empty() && !self.disclaimers.is_match(content) {
            debug!("Response lacks a medical disclaimer");
            warnings.push(ValidationWarning::MissingDisclaimer);
        }

        if !denylist_matches.is_empty() {
            warn!(matches = ?denylist_matches, "Response contains unsafe medical advice");
        }

        ResponseReport {
            safe: denylist_matches.is_empty(),
            denylist_matches,
            warnings,
        }
    }

    // RegexSet indexes follow the non-empty phrases in order
    fn denylisted_phrase(&self, index: usize) -> Option<String> {
        self.config
            .denylist
            .iter()
            .filter(|p| !p.trim().is_empty())
            .nth(index)
            .cloned()
    }
}
