//! Static routing table

use crate::capability::Capability;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Capability → ordered preferred backend ids
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoutingTable {
    preferences: HashMap<Capability, Vec<String>>,
}

impl Default for RoutingTable {
    fn default() -> Self {
        Self::empty()
            .with_preference(Capability::MedicalReasoning, ["openai"])
            .with_preference(Capability::ClinicalConversation, ["anthropic", "openai"])
            .with_preference(Capability::KnowledgeRetrieval, ["groq", "openai"])
            .with_preference(Capability::PatientMonitoring, ["openai", "anthropic"])
    }
}

impl RoutingTable {
    /// Table with no preferences at all
    #[must_use]
    pub fn empty() -> Self {
        Self {
            preferences: HashMap::new(),
        }
    }

    /// Set the preference list of one capability
    #[must_use]
    pub fn with_preference<I, S>(mut self, capability: Capability, backends: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preferences
            .insert(capability, backends.into_iter().map(Into::into).collect());
        self
    }

    /// Preference list for a capability (empty when unset)
    #[must_use]
    pub fn preferences(&self, capability: Capability) -> &[String] {
        self.preferences
            .get(&capability)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Overlay `other` on top of this table, capability by capability
    #[must_use]
    pub fn merged(mut self, other: RoutingTable) -> Self {
        self.preferences.extend(other.preferences);
        self
    }
}
