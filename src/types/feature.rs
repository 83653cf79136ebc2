use geo::{BooleanOps, BoundingRect, Geometry, LineString, MultiPolygon, Point, Polygon};

use super::BoundingBox;

#[derive(Clone, Debug, PartialEq)]
pub struct MapFeature {
    /// OSM style id, `node/123`, `way/456` or `relation/789`.
    pub id: String,
    pub properties: serde_json::Value,
    pub geometry: Option<Geometry<f64>>,
}

impl MapFeature {
    pub fn new(id: impl Into<String>, geometry: impl Into<Geometry<f64>>) -> Self {
        Self {
            id: id.into(),
            properties: serde_json::Value::Null,
            geometry: Some(geometry.into()),
        }
    }

    pub fn with_properties(mut self, properties: serde_json::Value) -> Self {
        self.properties = properties;
        self
    }
}

/// A single part geometry, what the map can actually draw.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Polygon(Polygon<f64>),
    Point(Point<f64>),
    Line(LineString<f64>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Polygon,
    Point,
    Line,
}

impl Shape {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Polygon(_) => ShapeKind::Polygon,
            Shape::Point(_) => ShapeKind::Point,
            Shape::Line(_) => ShapeKind::Line,
        }
    }

    pub fn bounds(&self) -> Option<BoundingBox> {
        let rect = match self {
            Shape::Polygon(polygon) => polygon.bounding_rect(),
            Shape::Point(point) => Some(point.bounding_rect()),
            Shape::Line(line) => line.bounding_rect(),
        };
        rect.map(BoundingBox::from_rect)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeatureCollection {
    pub features: Vec<MapFeature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<MapFeature>) -> Self {
        Self { features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Drops features without geometry and splits every multi part geometry
    /// into its single parts. Empty parts are dropped too.
    pub fn explode(&self) -> Vec<Shape> {
        let mut shapes = Vec::new();
        for feature in &self.features {
            if let Some(geometry) = &feature.geometry {
                explode_into(geometry, &mut shapes);
            }
        }
        shapes
    }

    /// Union of the bounds of every drawable part.
    pub fn bounds(&self) -> Option<BoundingBox> {
        bounds_of(&self.explode())
    }

    /// Merges every polygonal part into one multipolygon, the area a feature
    /// query runs against.
    pub fn dissolve(&self) -> Option<MultiPolygon<f64>> {
        self.explode()
            .into_iter()
            .filter_map(|shape| match shape {
                Shape::Polygon(polygon) => Some(MultiPolygon::new(vec![polygon])),
                _ => None,
            })
            .reduce(|merged, next| merged.union(&next))
    }
}

pub fn bounds_of(shapes: &[Shape]) -> Option<BoundingBox> {
    shapes
        .iter()
        .filter_map(Shape::bounds)
        .reduce(|total, next| total.union(&next))
}

fn explode_into(geometry: &Geometry<f64>, shapes: &mut Vec<Shape>) {
    match geometry {
        Geometry::Point(point) => shapes.push(Shape::Point(*point)),
        Geometry::MultiPoint(points) => {
            shapes.extend(points.iter().map(|point| Shape::Point(*point)))
        }
        Geometry::Line(line) => shapes.push(Shape::Line(LineString::from(vec![
            line.start, line.end,
        ]))),
        Geometry::LineString(line) => push_line(line, shapes),
        Geometry::MultiLineString(lines) => {
            for line in lines {
                push_line(line, shapes);
            }
        }
        Geometry::Polygon(polygon) => push_polygon(polygon, shapes),
        Geometry::MultiPolygon(polygons) => {
            for polygon in polygons {
                push_polygon(polygon, shapes);
            }
        }
        Geometry::Rect(rect) => push_polygon(&rect.to_polygon(), shapes),
        Geometry::Triangle(triangle) => push_polygon(&triangle.to_polygon(), shapes),
        Geometry::GeometryCollection(collection) => {
            for geometry in collection {
                explode_into(geometry, shapes);
            }
        }
    }
}

fn push_line(line: &LineString<f64>, shapes: &mut Vec<Shape>) {
    if line.0.len() >= 2 {
        shapes.push(Shape::Line(line.clone()));
    }
}

fn push_polygon(polygon: &Polygon<f64>, shapes: &mut Vec<Shape>) {
    if !polygon.exterior().0.is_empty() {
        shapes.push(Shape::Polygon(polygon.clone()));
    }
}

/// The outline of a searched place.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaceBoundary {
    /// Text the user searched for.
    pub query: String,
    /// Name the geocoding service resolved it to.
    pub display_name: String,
    pub collection: FeatureCollection,
}

impl PlaceBoundary {
    pub fn dissolved(&self) -> Option<MultiPolygon<f64>> {
        self.collection.dissolve()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Area, GeometryCollection, MultiLineString, MultiPoint, line_string, point, polygon};
    use pretty_assertions::assert_eq;

    fn square(x: f64, y: f64, size: f64) -> Polygon<f64> {
        polygon![
            (x: x, y: y),
            (x: x + size, y: y),
            (x: x + size, y: y + size),
            (x: x, y: y + size),
            (x: x, y: y),
        ]
    }

    #[test]
    fn explode_drops_null_and_splits_multi_parts() {
        let collection = FeatureCollection::new(vec![
            MapFeature {
                id: "node/1".into(),
                properties: serde_json::Value::Null,
                geometry: None,
            },
            MapFeature::new(
                "relation/2",
                MultiPolygon::new(vec![square(0.0, 0.0, 1.0), square(5.0, 5.0, 1.0)]),
            ),
            MapFeature::new(
                "node/3",
                MultiPoint::new(vec![point!(x: 1.0, y: 2.0), point!(x: 3.0, y: 4.0)]),
            ),
            MapFeature::new(
                "way/4",
                MultiLineString::new(vec![
                    line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0)],
                    line_string![(x: 2.0, y: 2.0)],
                ]),
            ),
        ]);

        let kinds: Vec<ShapeKind> = collection.explode().iter().map(Shape::kind).collect();
        assert_eq!(
            kinds,
            vec![
                ShapeKind::Polygon,
                ShapeKind::Polygon,
                ShapeKind::Point,
                ShapeKind::Point,
                ShapeKind::Line,
            ]
        );
    }

    #[test]
    fn explode_walks_geometry_collections() {
        let nested = GeometryCollection(vec![
            Geometry::Point(point!(x: 1.0, y: 1.0)),
            Geometry::Polygon(square(0.0, 0.0, 2.0)),
        ]);
        let collection = FeatureCollection::new(vec![MapFeature::new("way/1", nested)]);
        assert_eq!(collection.explode().len(), 2);
    }

    #[test]
    fn bounds_cover_every_part() {
        let collection = FeatureCollection::new(vec![
            MapFeature::new("way/1", square(0.0, 0.0, 1.0)),
            MapFeature::new("node/2", point!(x: -3.0, y: 4.0)),
        ]);
        let bounds = collection.bounds().unwrap();
        assert_eq!(
            bounds,
            BoundingBox {
                north: 4.0,
                south: 0.0,
                east: 1.0,
                west: -3.0,
            }
        );
    }

    #[test]
    fn empty_collection_has_no_bounds() {
        assert_eq!(FeatureCollection::default().bounds(), None);
    }

    #[test]
    fn dissolve_merges_touching_polygons() {
        let collection = FeatureCollection::new(vec![
            MapFeature::new("relation/1", square(0.0, 0.0, 1.0)),
            MapFeature::new("relation/2", square(1.0, 0.0, 1.0)),
            MapFeature::new("node/3", point!(x: 9.0, y: 9.0)),
        ]);
        let dissolved = collection.dissolve().unwrap();
        assert_eq!(dissolved.0.len(), 1);
        assert!((dissolved.unsigned_area() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn dissolve_without_polygons_is_none() {
        let collection =
            FeatureCollection::new(vec![MapFeature::new("node/1", point!(x: 1.0, y: 1.0))]);
        assert_eq!(collection.dissolve(), None);
    }
}
