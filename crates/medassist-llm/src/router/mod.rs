//! Router - backend registry and capability-based selection
//!
//! # Module Structure
//!
//! - `registry`: BackendRegistry, built once at startup
//! - `table`: RoutingTable, capability → preferred backend ids
//! - `router_impl`: CapabilityRouter primary/fallback selection

mod registry;
mod router_impl;
mod table;


pub use registry::BackendRegistry;
pub use router_impl::CapabilityRouter;
pub use table::RoutingTable;
