use bevy::log::{debug, info, warn};
use geo::MultiPolygon;

use crate::{
    error::ExplorerError,
    types::{FeatureCollection, TagFilter},
};

use super::{FeatureSource, OverpassClient, build_overpass_query_string, get_data_from_string_osm};

impl OverpassClient {
    pub fn send_overpass_query_string(&self, query: &str) -> Result<String, ureq::Error> {
        let mut response = self
            .agent
            .post(&self.url)
            .header("User-Agent", self.user_agent.as_str())
            .send(query)?;
        response.body_mut().read_to_string()
    }
}

impl FeatureSource for OverpassClient {
    fn features_within(
        &self,
        area: &MultiPolygon<f64>,
        filter: &TagFilter,
    ) -> Result<FeatureCollection, ExplorerError> {
        let query = build_overpass_query_string(area, filter, &self.settings)?;
        debug!("Query: {}", query);

        let body = self
            .send_overpass_query_string(&query)
            .map_err(ExplorerError::service)?;
        let features = features_from_response(&body, area)?;
        info!("Got {} features", features.len());
        Ok(features)
    }
}

fn features_from_response(
    body: &str,
    area: &MultiPolygon<f64>,
) -> Result<FeatureCollection, ExplorerError> {
    get_data_from_string_osm(body, area).map_err(|err| {
        warn!("Overpass query failed: {}", err);
        ExplorerError::service(err)
    })
}
