//! Immutable route table snapshots.
//!
//! # Design Decisions
//! - Built once per successful reload, never mutated afterwards
//! - Keeps file order for listings, plus a name index for O(1) lookup
//! - Superseded wholesale by the next publish

use std::collections::HashMap;

use crate::config::schema::{GatewayConfig, PublicRouteView, RouteConfig};

/// One generation of active routes.
#[derive(Debug)]
pub struct RouteTable {
    generation: u64,
    routes: Vec<RouteConfig>,
    index: HashMap<String, usize>,
}

impl RouteTable {
    /// Build a table from a validated configuration.
    ///
    /// Names are unique in a validated configuration; should a duplicate
    /// still appear, the first definition wins.
    pub fn new(config: GatewayConfig, generation: u64) -> Self {
        let mut index = HashMap::with_capacity(config.routes.len());
        for (position, route) in config.routes.iter().enumerate() {
            index.entry(route.name.clone()).or_insert(position);
        }
        Self {
            generation,
            routes: config.routes,
            index,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn get(&self, name: &str) -> Option<&RouteConfig> {
        self.index.get(name).map(|&i| &self.routes[i])
    }

    /// Routes in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &RouteConfig> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Secret-free projection of every route, in configuration order.
    pub fn public_views(&self) -> Vec<PublicRouteView> {
        self.routes.iter().map(PublicRouteView::from).collect()
    }
}
