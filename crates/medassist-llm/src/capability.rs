//! Capability tags and backend descriptors
//!
//! Capabilities are routing tags only. They never change how a request is
//! built, just which backend is asked first.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Capability
// ============================================================================

/// Kind of generation task a backend can serve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Patient-facing conversational answers
    ClinicalConversation,
    /// Multi-step clinical reasoning
    MedicalReasoning,
    /// Fast lookup-style answers
    KnowledgeRetrieval,
    /// Follow-up on tracked patient metrics
    PatientMonitoring,
}

impl Capability {
    /// Every capability, in declaration order
    pub const ALL: [Capability; 4] = [
        Self::ClinicalConversation,
        Self::MedicalReasoning,
        Self::KnowledgeRetrieval,
        Self::PatientMonitoring,
    ];

    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClinicalConversation => "clinical_conversation",
            Self::MedicalReasoning => "medical_reasoning",
            Self::KnowledgeRetrieval => "knowledge_retrieval",
            Self::PatientMonitoring => "patient_monitoring",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| format!("unknown capability: {s}"))
    }
}

// ============================================================================
// Backend Descriptor
// ============================================================================

/// Static description of a registered generation backend
///
/// The compliance flags are reported in health output only; routing never
/// looks at them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendDescriptor {
    /// Backend identifier (registry key)
    pub id: String,
    /// Model the backend calls by default
    pub model: String,
    /// Declared capabilities
    pub capabilities: Vec<Capability>,
    /// Backend has been reviewed for medical use
    #[serde(default)]
    pub medical_validated: bool,
    /// Backend is covered by a HIPAA agreement
    #[serde(default)]
    pub hipaa_compliant: bool,
}

impl BackendDescriptor {
    /// Create a descriptor with no compliance flags set
    #[must_use]
    pub fn new(id: impl Into<String>, model: impl Into<String>, capabilities: Vec<Capability>) -> Self {
        Self {
            id: id.into(),
            model: model.into(),
            capabilities,
            medical_validated: false,
            hipaa_compliant: false,
        }
    }

    /// Whether this backend declares the capability
    #[must_use]
    pub fn supports(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_parse() {
        assert_eq!(
            "medical_reasoning".parse::<Capability>().unwrap(),
            Capability::MedicalReasoning
        );
        assert_eq!(
            "Knowledge-Retrieval".parse::<Capability>().unwrap(),
            Capability::KnowledgeRetrieval
        );
        assert!("surgery".parse::<Capability>().is_err());
    }

    #[test]
    fn test_capability_serde() {
        let json = serde_json::to_string(&Capability::PatientMonitoring).unwrap();
        assert_eq!(json, "\"patient_monitoring\"");
    }

    #[test]
    fn test_descriptor_supports() {
        let desc = BackendDescriptor::new("a", "m", vec![Capability::ClinicalConversation]);
        assert!(desc.supports(Capability::ClinicalConversation));
        assert!(!desc.supports(Capability::MedicalReasoning));
    }
}
