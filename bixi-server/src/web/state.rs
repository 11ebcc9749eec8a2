//! Application state for the web layer.

use std::sync::Arc;

use crate::cache::FreshnessCache;
use crate::facade::BixiService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub service: BixiService,
}

impl AppState {
    pub fn new(cache: FreshnessCache) -> Self {
        Self::from_service(BixiService::new(Arc::new(cache)))
    }

    pub fn from_service(service: BixiService) -> Self {
        Self { service }
    }
}
