mod client;
mod overpass_types;
mod query;

use std::{sync::Arc, time::Duration};

pub use overpass_types::*;
pub use query::*;
use geo::MultiPolygon;
use ureq::Agent;

use crate::{
    config::ExplorerConfig,
    error::ExplorerError,
    types::{FeatureCollection, TagFilter},
};

/// Finds the tagged features inside an area.
pub trait FeatureSource: Send + Sync {
    fn features_within(
        &self,
        area: &MultiPolygon<f64>,
        filter: &TagFilter,
    ) -> Result<FeatureCollection, ExplorerError>;
}

impl<T: FeatureSource + ?Sized> FeatureSource for &T {
    fn features_within(
        &self,
        area: &MultiPolygon<f64>,
        filter: &TagFilter,
    ) -> Result<FeatureCollection, ExplorerError> {
        (**self).features_within(area, filter)
    }
}

impl<T: FeatureSource + ?Sized> FeatureSource for Arc<T> {
    fn features_within(
        &self,
        area: &MultiPolygon<f64>,
        filter: &TagFilter,
    ) -> Result<FeatureCollection, ExplorerError> {
        (**self).features_within(area, filter)
    }
}

#[derive(Clone)]
pub struct OverpassClient {
    url: String,
    pub agent: Agent,
    user_agent: String,
    pub settings: QuerySettings,
}

/// Extra time the HTTP client waits past the server side `[timeout:N]`, so
/// the server's own timeout remark still reaches us.
const HTTP_TIMEOUT_MARGIN_SECS: u64 = 15;

fn http_timeout(query_timeout_secs: u64) -> Duration {
    Duration::from_secs(query_timeout_secs + HTTP_TIMEOUT_MARGIN_SECS)
}

impl Default for OverpassClient {
    fn default() -> Self {
        Self::new(&ExplorerConfig::default())
    }
}

impl OverpassClient {
    pub fn new(config: &ExplorerConfig) -> Self {
        let agent_config = Agent::config_builder()
            .timeout_global(Some(http_timeout(config.timeout_secs)))
            .build();
        let agent: Agent = agent_config.into();
        OverpassClient {
            agent,
            url: config.overpass_url.clone(),
            user_agent: config.user_agent.clone(),
            settings: QuerySettings {
                timeout_secs: config.timeout_secs,
                simplify_tolerance: config.simplify_tolerance,
            },
        }
    }
}
