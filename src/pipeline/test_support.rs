//! In-memory stand-ins for the services and the map.

use std::sync::Mutex;

use geo::{MultiPolygon, polygon};

use crate::{
    error::ExplorerError,
    geocode::Geocoder,
    overpass::FeatureSource,
    types::{Coord, FeatureCollection, MapFeature, PlaceBoundary, TagFilter},
};

use super::{MapSurface, OutlineStyle};

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Clear,
    Polygon(Vec<Coord>),
    Marker(Coord),
    Path(Vec<Coord>),
    Viewport { center: Coord, zoom: u32 },
    Fit { north_east: Coord, south_west: Coord },
}

#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub calls: Vec<DrawCall>,
}

impl RecordingSurface {
    fn count(&self, pick: fn(&DrawCall) -> bool) -> usize {
        self.calls.iter().filter(|call| pick(call)).count()
    }

    pub fn polygons(&self) -> usize {
        self.count(|call| matches!(call, DrawCall::Polygon(_)))
    }

    pub fn markers(&self) -> usize {
        self.count(|call| matches!(call, DrawCall::Marker(_)))
    }

    pub fn paths(&self) -> usize {
        self.count(|call| matches!(call, DrawCall::Path(_)))
    }

    pub fn drawn(&self) -> usize {
        self.polygons() + self.markers() + self.paths()
    }
}

impl MapSurface for RecordingSurface {
    fn clear_all(&mut self) {
        self.calls.push(DrawCall::Clear);
    }

    fn add_polygon(&mut self, outline: Vec<Coord>, _style: &OutlineStyle) {
        self.calls.push(DrawCall::Polygon(outline));
    }

    fn add_marker(&mut self, position: Coord) {
        self.calls.push(DrawCall::Marker(position));
    }

    fn add_path(&mut self, path: Vec<Coord>) {
        self.calls.push(DrawCall::Path(path));
    }

    fn set_viewport(&mut self, center: Coord, zoom: u32) {
        self.calls.push(DrawCall::Viewport { center, zoom });
    }

    fn fit_bounding_box(&mut self, north_east: Coord, south_west: Coord) {
        self.calls.push(DrawCall::Fit {
            north_east,
            south_west,
        });
    }
}

pub fn example_city() -> PlaceBoundary {
    let outline = polygon![
        (x: -90.32, y: 38.53),
        (x: -90.16, y: 38.53),
        (x: -90.16, y: 38.77),
        (x: -90.32, y: 38.77),
        (x: -90.32, y: 38.53),
    ];
    PlaceBoundary {
        query: "Example City".to_string(),
        display_name: "Example City, Missouri".to_string(),
        collection: FeatureCollection::new(vec![MapFeature::new("relation/1", outline)]),
    }
}

/// Resolves only the places it was built with.
#[derive(Default)]
pub struct FakeGeocoder {
    pub places: Vec<PlaceBoundary>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeGeocoder {
    pub fn with(place: PlaceBoundary) -> Self {
        Self {
            places: vec![place],
            ..Default::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Geocoder for FakeGeocoder {
    fn geocode(&self, place: &str) -> Result<PlaceBoundary, ExplorerError> {
        self.calls.lock().unwrap().push(place.to_string());
        self.places
            .iter()
            .find(|boundary| boundary.query == place)
            .cloned()
            .ok_or_else(|| ExplorerError::not_found(place, "no such place"))
    }
}

/// Answers every query with the same collection and remembers what it was
/// asked.
#[derive(Default)]
pub struct FakeFeatures {
    pub answer: FeatureCollection,
    pub fail: bool,
    pub calls: Mutex<Vec<(MultiPolygon<f64>, TagFilter)>>,
}

impl FakeFeatures {
    pub fn answering(answer: FeatureCollection) -> Self {
        Self {
            answer,
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<(MultiPolygon<f64>, TagFilter)> {
        self.calls.lock().unwrap().clone()
    }
}

impl FeatureSource for FakeFeatures {
    fn features_within(
        &self,
        area: &MultiPolygon<f64>,
        filter: &TagFilter,
    ) -> Result<FeatureCollection, ExplorerError> {
        self.calls.lock().unwrap().push((area.clone(), filter.clone()));
        if self.fail {
            return Err(ExplorerError::service("overpass is down"));
        }
        Ok(self.answer.clone())
    }
}
