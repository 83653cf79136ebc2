use std::time::Duration;

use bevy::log::{debug, info};
use geo::Geometry;
use serde::{Deserialize, Serialize};
use ureq::Agent;

use crate::{
    config::ExplorerConfig,
    error::ExplorerError,
    types::{FeatureCollection, MapFeature, PlaceBoundary},
};

use super::Geocoder;

/// How many candidates Nominatim is asked for. Many names resolve to a node
/// first and the outline further down the list.
const SEARCH_LIMIT: &str = "50";

#[derive(Clone)]
pub struct NominatimClient {
    url: String,
    pub agent: Agent,
    user_agent: String,
}

impl Default for NominatimClient {
    fn default() -> Self {
        Self::new(&ExplorerConfig::default())
    }
}

impl NominatimClient {
    pub fn new(config: &ExplorerConfig) -> Self {
        let agent_config = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .build();
        let agent: Agent = agent_config.into();
        NominatimClient {
            agent,
            url: config.nominatim_url.clone(),
            user_agent: config.user_agent.clone(),
        }
    }

    pub fn send_search(&self, place: &str) -> Result<String, ureq::Error> {
        let mut response = self
            .agent
            .get(&self.url)
            .query("q", place)
            .query("format", "json")
            .query("polygon_geojson", "1")
            .query("limit", SEARCH_LIMIT)
            .header("User-Agent", self.user_agent.as_str())
            .call()?;
        response.body_mut().read_to_string()
    }
}

impl Geocoder for NominatimClient {
    fn geocode(&self, place: &str) -> Result<PlaceBoundary, ExplorerError> {
        info!("Geocoding '{}'", place);
        let body = self
            .send_search(place)
            .map_err(|err| ExplorerError::not_found(place, err))?;
        let places: Vec<NominatimPlace> =
            serde_json::from_str(&body).map_err(|err| ExplorerError::not_found(place, err))?;
        debug!("Nominatim returned {} candidates", places.len());
        select_boundary(place, places)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NominatimPlace {
    pub place_id: u64,
    #[serde(default)]
    pub osm_type: Option<String>,
    #[serde(default)]
    pub osm_id: Option<u64>,
    pub display_name: String,
    #[serde(default)]
    pub geojson: Option<geojson::Geometry>,
}

impl NominatimPlace {
    fn feature_id(&self) -> String {
        match (&self.osm_type, self.osm_id) {
            (Some(osm_type), Some(osm_id)) => format!("{osm_type}/{osm_id}"),
            _ => format!("place/{}", self.place_id),
        }
    }

    /// The outline of this candidate, if it has one.
    fn outline(&self) -> Option<Geometry<f64>> {
        let geometry = self.geojson.as_ref()?;
        match Geometry::<f64>::try_from(geometry.value.clone()) {
            Ok(outline @ (Geometry::Polygon(_) | Geometry::MultiPolygon(_))) => Some(outline),
            _ => None,
        }
    }
}

/// Takes the first candidate that comes with a polygonal outline.
pub fn select_boundary(
    place: &str,
    places: Vec<NominatimPlace>,
) -> Result<PlaceBoundary, ExplorerError> {
    for candidate in places {
        if let Some(outline) = candidate.outline() {
            info!("Resolved '{}' to {}", place, candidate.display_name);
            let properties = serde_json::json!({ "display_name": candidate.display_name });
            let feature = MapFeature::new(candidate.feature_id(), outline).with_properties(properties);
            return Ok(PlaceBoundary {
                query: place.to_string(),
                display_name: candidate.display_name,
                collection: FeatureCollection::new(vec![feature]),
            });
        }
    }
    Err(ExplorerError::not_found(
        place,
        "Nominatim returned no results with a polygon boundary",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(json: &str) -> Vec<NominatimPlace> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn picks_first_polygon_candidate() {
        let places = parse(
            r#"[
                {"place_id": 1, "osm_type": "node", "osm_id": 10, "display_name": "Example City Hall",
                 "geojson": {"type": "Point", "coordinates": [-90.2, 38.6]}},
                {"place_id": 2, "osm_type": "relation", "osm_id": 20, "display_name": "Example City, Missouri",
                 "geojson": {"type": "Polygon", "coordinates": [[[-90.3, 38.5], [-90.1, 38.5], [-90.1, 38.7], [-90.3, 38.5]]]}}
            ]"#,
        );

        let boundary = select_boundary("Example City", places).unwrap();
        assert_eq!(boundary.query, "Example City");
        assert_eq!(boundary.display_name, "Example City, Missouri");
        assert_eq!(boundary.collection.len(), 1);
        assert_eq!(boundary.collection.features[0].id, "relation/20");
        assert!(matches!(
            boundary.collection.features[0].geometry,
            Some(Geometry::Polygon(_))
        ));
    }

    #[test]
    fn point_only_results_are_not_found() {
        let places = parse(
            r#"[{"place_id": 1, "display_name": "Somewhere",
                 "geojson": {"type": "Point", "coordinates": [1.0, 2.0]}}]"#,
        );
        let err = select_boundary("Somewhere", places).unwrap_err();
        assert!(matches!(err, ExplorerError::NotFound { ref place, .. } if place == "Somewhere"));
    }

    #[test]
    fn no_results_are_not_found() {
        assert!(matches!(
            select_boundary("Nowhere", Vec::new()),
            Err(ExplorerError::NotFound { .. })
        ));
    }

    #[test]
    fn missing_geojson_is_tolerated() {
        let places = parse(r#"[{"place_id": 7, "display_name": "Bare"}]"#);
        assert_eq!(places[0].feature_id(), "place/7");
        assert!(select_boundary("Bare", places).is_err());
    }
}
