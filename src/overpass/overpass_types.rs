use bevy::log::warn;
use geo::{Contains, Coord, Intersects, LineString, MultiPolygon, Point, Polygon};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{FeatureCollection, MapFeature};

// Overpass API, `out body geom;` flavour.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverpassResponse {
    pub version: Option<f64>,
    pub generator: Option<String>,
    #[serde(default)]
    pub elements: Vec<Element>,
    /// Set by Overpass when the query ran out of time or memory.
    pub remark: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    #[serde(rename = "type")]
    pub type_field: String,
    pub id: i64,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub tags: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    pub geometry: Vec<Option<LatLon>>,
    #[serde(default)]
    pub members: Vec<Member>,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    #[serde(rename = "type")]
    pub type_field: String,
    #[serde(rename = "ref")]
    pub reference: i64,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub geometry: Vec<Option<LatLon>>,
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl From<LatLon> for Coord<f64> {
    fn from(point: LatLon) -> Self {
        Coord {
            x: point.lon,
            y: point.lat,
        }
    }
}

enum AreaRule {
    All,
    Only(&'static [&'static str]),
    AllExcept(&'static [&'static str]),
}

/// Which tags make a closed way an area rather than a loop,
/// <https://wiki.openstreetmap.org/wiki/Overpass_turbo/Polygon_Features>.
const POLYGON_FEATURES: [(&str, AreaRule); 27] = [
    ("aeroway", AreaRule::AllExcept(&["taxiway"])),
    ("amenity", AreaRule::All),
    ("area:highway", AreaRule::All),
    (
        "barrier",
        AreaRule::Only(&["city_wall", "ditch", "hedge", "retaining_wall", "spikes"]),
    ),
    ("boundary", AreaRule::All),
    ("building", AreaRule::All),
    ("building:part", AreaRule::All),
    ("craft", AreaRule::All),
    ("golf", AreaRule::All),
    (
        "highway",
        AreaRule::Only(&["services", "rest_area", "escape", "elevator"]),
    ),
    ("historic", AreaRule::All),
    ("indoor", AreaRule::All),
    ("landuse", AreaRule::All),
    (
        "leisure",
        AreaRule::AllExcept(&["picnic_table", "slipway", "firepit"]),
    ),
    (
        "man_made",
        AreaRule::AllExcept(&["cutline", "embankment", "pipeline"]),
    ),
    ("military", AreaRule::All),
    (
        "natural",
        AreaRule::AllExcept(&["coastline", "cliff", "ridge", "arete", "tree_row"]),
    ),
    ("office", AreaRule::All),
    ("place", AreaRule::All),
    (
        "power",
        AreaRule::Only(&["plant", "substation", "generator", "transformer"]),
    ),
    ("public_transport", AreaRule::All),
    (
        "railway",
        AreaRule::Only(&["station", "turntable", "roundhouse", "platform"]),
    ),
    ("ruins", AreaRule::All),
    ("shop", AreaRule::All),
    ("tourism", AreaRule::All),
    ("healthcare", AreaRule::All),
    (
        "waterway",
        AreaRule::Only(&["riverbank", "dock", "boatyard", "dam"]),
    ),
];

fn tag<'a>(tags: &'a serde_json::Map<String, serde_json::Value>, key: &str) -> Option<&'a str> {
    tags.get(key).and_then(|value| value.as_str())
}

/// Whether a closed way with these tags is an area.
pub fn is_area(tags: Option<&serde_json::Map<String, serde_json::Value>>) -> bool {
    let Some(tags) = tags else {
        return false;
    };
    match tag(tags, "area") {
        Some("no") => return false,
        Some("yes") => return true,
        _ => {}
    }
    POLYGON_FEATURES.iter().any(|(key, rule)| match tag(tags, key) {
        None => false,
        Some(value) => match rule {
            AreaRule::All => true,
            AreaRule::Only(values) => values.contains(&value),
            AreaRule::AllExcept(values) => !values.contains(&value),
        },
    })
}

fn to_coords(geometry: &[Option<LatLon>]) -> Vec<Coord<f64>> {
    geometry.iter().flatten().map(|point| Coord::from(*point)).collect()
}

fn is_closed(coords: &[Coord<f64>]) -> bool {
    coords.len() >= 4 && coords.first() == coords.last()
}

/// Joins way segments end to end into closed rings. Segments that cannot be
/// closed are dropped.
pub fn assemble_rings(segments: Vec<Vec<Coord<f64>>>) -> Vec<LineString<f64>> {
    let mut open: Vec<Vec<Coord<f64>>> = segments.into_iter().filter(|s| s.len() >= 2).collect();
    let mut rings = Vec::new();

    while let Some(mut current) = open.pop() {
        loop {
            if is_closed(&current) {
                rings.push(LineString::new(current));
                break;
            }
            let Some(tail) = current.last().copied() else {
                break;
            };
            let next = open
                .iter()
                .position(|segment| segment.first() == Some(&tail) || segment.last() == Some(&tail));
            match next {
                Some(index) => {
                    let mut segment = open.swap_remove(index);
                    if segment.first() != Some(&tail) {
                        segment.reverse();
                    }
                    current.extend(segment.into_iter().skip(1));
                }
                None => break,
            }
        }
    }
    rings
}

fn relation_polygons(members: &[Member]) -> MultiPolygon<f64> {
    let ways = |role: &str| -> Vec<Vec<Coord<f64>>> {
        members
            .iter()
            .filter(|member| member.type_field == "way" && member.role == role)
            .map(|member| to_coords(&member.geometry))
            .collect()
    };

    let mut outers: Vec<(LineString<f64>, Vec<LineString<f64>>)> = assemble_rings(ways("outer"))
        .into_iter()
        .map(|ring| (ring, Vec::new()))
        .collect();

    for inner in assemble_rings(ways("inner")) {
        let Some(first) = inner.0.first().copied() else {
            continue;
        };
        let owner = outers.iter_mut().find(|(outer, _)| {
            Polygon::new(outer.clone(), vec![]).contains(&Point::from(first))
        });
        if let Some((_, holes)) = owner {
            holes.push(inner);
        }
    }

    MultiPolygon::new(
        outers
            .into_iter()
            .map(|(exterior, holes)| Polygon::new(exterior, holes))
            .collect(),
    )
}

impl Element {
    pub fn feature_id(&self) -> String {
        format!("{}/{}", self.type_field, self.id)
    }

    /// Geometry of this element, or `None` for elements that cannot be drawn.
    pub fn to_geometry(&self) -> Option<geo::Geometry<f64>> {
        match self.type_field.as_str() {
            "node" => Some(Point::new(self.lon?, self.lat?).into()),
            "way" => {
                let coords = to_coords(&self.geometry);
                if is_closed(&coords) && is_area(self.tags.as_ref()) {
                    Some(Polygon::new(LineString::new(coords), vec![]).into())
                } else if coords.len() >= 2 {
                    Some(LineString::new(coords).into())
                } else {
                    None
                }
            }
            "relation" => {
                let kind = self.tags.as_ref().and_then(|tags| tag(tags, "type"));
                if !matches!(kind, Some("multipolygon" | "boundary")) {
                    return None;
                }
                let polygons = relation_polygons(&self.members);
                if polygons.0.is_empty() {
                    None
                } else {
                    Some(polygons.into())
                }
            }
            _ => None,
        }
    }

    pub fn to_feature(&self) -> MapFeature {
        MapFeature {
            id: self.feature_id(),
            properties: self
                .tags
                .clone()
                .map(serde_json::Value::Object)
                .unwrap_or_default(),
            geometry: self.to_geometry(),
        }
    }
}

#[derive(Debug, Error)]
pub enum OverpassDataError {
    #[error("malformed Overpass response: {0}")]
    Parse(#[from] serde_json::Error),
    /// The query was cut short, so `elements` is incomplete or empty.
    #[error("{0}")]
    Aborted(String),
}

/// Parses an Overpass response into features, keeping those that have a
/// geometry touching `area`.
pub fn get_data_from_string_osm(
    data: &str,
    area: &MultiPolygon<f64>,
) -> Result<FeatureCollection, OverpassDataError> {
    let response: OverpassResponse = serde_json::from_str(data)?;
    if let Some(remark) = &response.remark {
        if remark.contains("runtime error") {
            return Err(OverpassDataError::Aborted(remark.clone()));
        }
        warn!("Overpass remark: {}", remark);
    }

    let mut features = Vec::new();
    for element in &response.elements {
        let feature = element.to_feature();
        if let Some(geometry) = &feature.geometry {
            if geometry.intersects(area) {
                features.push(feature);
            }
        }
    }
    Ok(FeatureCollection::new(features))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Area, Geometry, coord, polygon};
    use pretty_assertions::assert_eq;

    fn area() -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: 10.0, y: 0.0),
            (x: 10.0, y: 10.0),
            (x: 0.0, y: 10.0),
            (x: 0.0, y: 0.0),
        ]])
    }

    const RESPONSE: &str = r#"{
        "version": 0.6,
        "generator": "Overpass API",
        "elements": [
            {"type": "node", "id": 1, "lat": 5.0, "lon": 4.0, "tags": {"amenity": "cafe"}},
            {"type": "node", "id": 2, "lat": 50.0, "lon": 40.0, "tags": {"amenity": "pub"}},
            {"type": "way", "id": 10, "tags": {"amenity": "school", "building": "yes"},
             "geometry": [{"lat": 1.0, "lon": 1.0}, {"lat": 1.0, "lon": 2.0}, {"lat": 2.0, "lon": 2.0}, {"lat": 1.0, "lon": 1.0}]},
            {"type": "way", "id": 11, "tags": {"highway": "residential"},
             "geometry": [{"lat": 3.0, "lon": 3.0}, {"lat": 3.0, "lon": 4.0}, {"lat": 4.0, "lon": 4.0}, {"lat": 3.0, "lon": 3.0}]},
            {"type": "way", "id": 12, "tags": {"amenity": "parking", "area": "no"},
             "geometry": [{"lat": 6.0, "lon": 6.0}, {"lat": 7.0, "lon": 7.0}]},
            {"type": "relation", "id": 20, "tags": {"type": "multipolygon", "amenity": "university"},
             "members": [
                {"type": "way", "ref": 100, "role": "outer",
                 "geometry": [{"lat": 2.0, "lon": 2.0}, {"lat": 2.0, "lon": 8.0}, {"lat": 8.0, "lon": 8.0}]},
                {"type": "way", "ref": 101, "role": "outer",
                 "geometry": [{"lat": 2.0, "lon": 2.0}, {"lat": 8.0, "lon": 2.0}, {"lat": 8.0, "lon": 8.0}]},
                {"type": "way", "ref": 102, "role": "inner",
                 "geometry": [{"lat": 4.0, "lon": 4.0}, {"lat": 4.0, "lon": 5.0}, {"lat": 5.0, "lon": 5.0}, {"lat": 5.0, "lon": 4.0}, {"lat": 4.0, "lon": 4.0}]},
                {"type": "node", "ref": 103, "role": "admin_centre"}
             ]},
            {"type": "relation", "id": 21, "tags": {"type": "route", "amenity": "bus"}, "members": []}
        ]
    }"#;

    fn parsed() -> FeatureCollection {
        get_data_from_string_osm(RESPONSE, &area()).unwrap()
    }

    fn geometry_of(collection: &FeatureCollection, id: &str) -> Geometry<f64> {
        collection
            .features
            .iter()
            .find(|feature| feature.id == id)
            .and_then(|feature| feature.geometry.clone())
            .unwrap_or_else(|| panic!("{id} missing"))
    }

    #[test]
    fn keeps_only_features_inside_the_area() {
        let ids: Vec<String> = parsed().features.into_iter().map(|f| f.id).collect();
        assert_eq!(ids, vec!["node/1", "way/10", "way/11", "way/12", "relation/20"]);
    }

    #[test]
    fn node_becomes_point_in_lon_lat_order() {
        assert_eq!(
            geometry_of(&parsed(), "node/1"),
            Geometry::Point(Point::new(4.0, 5.0))
        );
    }

    #[test]
    fn closed_ways_follow_area_rules() {
        let collection = parsed();
        assert!(matches!(geometry_of(&collection, "way/10"), Geometry::Polygon(_)));
        assert!(matches!(geometry_of(&collection, "way/11"), Geometry::LineString(_)));
        assert!(matches!(geometry_of(&collection, "way/12"), Geometry::LineString(_)));
    }

    #[test]
    fn multipolygon_relation_joins_outer_segments_and_keeps_holes() {
        let Geometry::MultiPolygon(polygons) = geometry_of(&parsed(), "relation/20") else {
            panic!("relation/20 should be a multipolygon");
        };
        assert_eq!(polygons.0.len(), 1);
        assert_eq!(polygons.0[0].interiors().len(), 1);
        assert!((polygons.unsigned_area() - 35.0).abs() < 1e-9);
    }

    #[test]
    fn tags_become_properties() {
        let collection = parsed();
        let cafe = collection.features.iter().find(|f| f.id == "node/1").unwrap();
        assert_eq!(cafe.properties["amenity"], "cafe");
    }

    #[test]
    fn area_rules() {
        let tags = |json: &str| -> serde_json::Map<String, serde_json::Value> {
            serde_json::from_str(json).unwrap()
        };
        assert!(is_area(Some(&tags(r#"{"leisure": "park"}"#))));
        assert!(!is_area(Some(&tags(r#"{"leisure": "slipway"}"#))));
        assert!(is_area(Some(&tags(r#"{"highway": "pedestrian", "area": "yes"}"#))));
        assert!(is_area(Some(&tags(r#"{"waterway": "dam"}"#))));
        assert!(!is_area(Some(&tags(r#"{"waterway": "canal"}"#))));
        assert!(!is_area(None));
    }

    #[test]
    fn unclosable_segments_are_dropped() {
        let rings = assemble_rings(vec![
            vec![coord! { x: 0.0, y: 0.0 }, coord! { x: 1.0, y: 0.0 }],
            vec![coord! { x: 5.0, y: 5.0 }, coord! { x: 6.0, y: 6.0 }],
        ]);
        assert!(rings.is_empty());
    }

    #[test]
    fn malformed_response_is_an_error() {
        assert!(matches!(
            get_data_from_string_osm("<html>", &area()),
            Err(OverpassDataError::Parse(_))
        ));
    }

    #[test]
    fn timed_out_query_is_an_error_not_an_empty_result() {
        let body = r#"{
            "version": 0.6,
            "elements": [],
            "remark": "runtime error: Query timed out in \"query\" at line 3 after 181 seconds."
        }"#;

        let err = get_data_from_string_osm(body, &area()).unwrap_err();
        let OverpassDataError::Aborted(remark) = err else {
            panic!("expected an aborted query, got {err:?}");
        };
        assert!(remark.starts_with("runtime error: Query timed out"));
    }

    #[test]
    fn other_remarks_keep_the_elements() {
        let body = r#"{
            "elements": [{"type": "node", "id": 1, "lat": 5.0, "lon": 4.0}],
            "remark": "runtime remark: Timeout is smaller than the default."
        }"#;

        let collection = get_data_from_string_osm(body, &area()).unwrap();
        assert_eq!(collection.len(), 1);
    }
}
