//! Capability router implementation

use super::registry::BackendRegistry;
use super::table::RoutingTable;
use crate::adapter::BackendAdapter;
use crate::capability::Capability;
use crate::error::{Error, Result};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Chooses backends for a capability
///
/// Both the registry and the table are fixed for the router's lifetime.
#[derive(Debug, Clone)]
pub struct CapabilityRouter {
    registry: Arc<BackendRegistry>,
    table: RoutingTable,
}

impl CapabilityRouter {
    /// Create a router
    #[must_use]
    pub fn new(registry: Arc<BackendRegistry>, table: RoutingTable) -> Self {
        Self { registry, table }
    }

    /// Registry the router selects from
    #[must_use]
    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    /// Routing table in use
    #[must_use]
    pub fn table(&self) -> &RoutingTable {
        &self.table
    }

    /// Pick the primary backend for a capability
    ///
    /// Order: first preferred backend declaring the capability, then the
    /// first registered backend declaring it, then any registered backend.
    pub fn select_primary(&self, capability: Capability) -> Result<Arc<dyn BackendAdapter>> {
        let preferred = self
            .table
            .preferences(capability)
            .iter()
            .filter_map(|id| self.registry.get(id))
            .find(|a| a.capabilities().contains(&capability));
        if let Some(adapter) = preferred {
            debug!(capability = %capability, backend = %adapter.id(), "Selected preferred backend");
            return Ok(adapter.clone());
        }

        if let Some(adapter) = self
            .registry
            .iter()
            .find(|a| a.capabilities().contains(&capability))
        {
            debug!(capability = %capability, backend = %adapter.id(), "Selected capable backend");
            return Ok(adapter.clone());
        }

        match self.registry.iter().next() {
            Some(adapter) => {
                warn!(
                    capability = %capability,
                    backend = %adapter.id(),
                    "No backend declares capability, degrading to first registered"
                );
                Ok(adapter.clone())
            }
            None => Err(Error::NoBackendAvailable),
        }
    }

    /// Ordered fallbacks after `primary`
    ///
    /// `explicit` replaces the table's preference list when given. Every
    /// other registered backend follows in registration order.
    #[must_use]
    pub fn select_fallbacks(
        &self,
        capability: Capability,
        primary: &str,
        explicit: Option<&[String]>,
    ) -> Vec<Arc<dyn BackendAdapter>> {
        let preferred = explicit.unwrap_or_else(|| self.table.preferences(capability));

        let mut seen: HashSet<&str> = HashSet::new();
        seen.insert(primary);
        let mut fallbacks = Vec::with_capacity(self.registry.len());

        for id in preferred {
            match self.registry.get(id) {
                Some(adapter) if seen.insert(adapter.id()) => fallbacks.push(adapter.clone()),
                Some(_) => {}
                None => debug!(backend = %id, "Skipping unregistered fallback"),
            }
        }
        for adapter in self.registry.iter() {
            if seen.insert(adapter.id()) {
                fallbacks.push(adapter.clone());
            }
        }
        fallbacks
    }

    /// Primary followed by fallbacks
    pub fn plan(
        &self,
        capability: Capability,
        explicit: Option<&[String]>,
    ) -> Result<Vec<Arc<dyn BackendAdapter>>> {
        let primary = self.select_primary(capability)?;
        let mut plan = vec![primary.clone()];
        plan.extend(self.select_fallbacks(capability, primary.id(), explicit));
        Ok(plan)
    }
}
