//! The single published route table.
//!
//! # Responsibilities
//! - Hold exactly one current `RouteTable`
//! - Hand readers a complete snapshot without blocking
//! - Replace the snapshot atomically on publish
//!
//! # Design Decisions
//! - `ArcSwap` for the current pointer: readers never take a lock
//! - Publishers serialise on a mutex so generations strictly increase;
//!   the critical section covers only index building and the swap
//! - A registry cannot exist without a table, so "no table yet" is the
//!   startup phase before the registry is constructed

use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;

use crate::config::schema::GatewayConfig;
use crate::routing::table::RouteTable;

/// Generation assigned to the table built from the startup configuration.
pub const INITIAL_GENERATION: u64 = 1;

#[derive(Debug)]
pub struct RouteRegistry {
    current: ArcSwap<RouteTable>,
    publish_lock: Mutex<()>,
}

impl RouteRegistry {
    /// Create a registry whose first table is built from `config`.
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            current: ArcSwap::from_pointee(RouteTable::new(config, INITIAL_GENERATION)),
            publish_lock: Mutex::new(()),
        }
    }

    /// Snapshot of the current table. Valid for as long as the caller holds it.
    pub fn current(&self) -> Arc<RouteTable> {
        self.current.load_full()
    }

    pub fn generation(&self) -> u64 {
        self.current.load().generation()
    }

    /// Replace the current table with one built from `config`.
    ///
    /// Always bumps the generation, even when the routes are identical.
    pub fn publish(&self, config: GatewayConfig) -> Arc<RouteTable> {
        let _guard = self
            .publish_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let generation = self.current.load().generation() + 1;
        let table = Arc::new(RouteTable::new(config, generation));
        self.current.store(Arc::clone(&table));

        tracing::debug!(generation, routes = table.len(), "Route table published");
        table
    }
}
