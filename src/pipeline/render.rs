use geo::{LineString, Polygon};

use crate::{
    error::QueryError,
    types::{BoundingBox, Coord, DisplayToggles, FeatureCollection, Shape, bounds_of},
};

/// Outline style for polygons, `#2c3e50` two pixels wide.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlineStyle {
    pub outline_color: [u8; 3],
    pub border_width: f32,
}

impl Default for OutlineStyle {
    fn default() -> Self {
        Self {
            outline_color: [0x2c, 0x3e, 0x50],
            border_width: 2.0,
        }
    }
}

/// Whatever the pipeline draws on. All coordinates are `(lat, lon)`.
pub trait MapSurface {
    fn clear_all(&mut self);
    fn add_polygon(&mut self, outline: Vec<Coord>, style: &OutlineStyle);
    fn add_marker(&mut self, position: Coord);
    fn add_path(&mut self, path: Vec<Coord>);
    fn set_viewport(&mut self, center: Coord, zoom: u32);
    fn fit_bounding_box(&mut self, north_east: Coord, south_west: Coord);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub polygons: usize,
    pub points: usize,
    pub lines: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderOutcome {
    Drawn {
        stats: RenderStats,
        bounds: BoundingBox,
    },
    NoData,
}

pub fn polygon_outline(polygon: &Polygon<f64>) -> Vec<Coord> {
    polygon.exterior().coords().map(|c| Coord::from_lon_lat(*c)).collect()
}

pub fn line_path(line: &LineString<f64>) -> Vec<Coord> {
    line.coords().map(|c| Coord::from_lon_lat(*c)).collect()
}

/// Replaces whatever is on `surface` with `collection`.
///
/// Bounds are checked before anything is cleared, so a collection that cannot
/// be plotted leaves the previous drawing in place.
pub fn render_collection(
    collection: &FeatureCollection,
    toggles: &DisplayToggles,
    surface: &mut dyn MapSurface,
) -> Result<RenderOutcome, QueryError> {
    let shapes = collection.explode();
    if shapes.is_empty() {
        surface.clear_all();
        return Ok(RenderOutcome::NoData);
    }

    let bounds = bounds_of(&shapes)
        .filter(BoundingBox::is_finite)
        .ok_or_else(|| QueryError::Plot("the features have no finite bounds".to_string()))?;

    surface.clear_all();
    let style = OutlineStyle::default();
    let mut stats = RenderStats::default();
    for shape in &shapes {
        if !toggles.shows(shape.kind()) {
            continue;
        }
        match shape {
            Shape::Polygon(polygon) => {
                surface.add_polygon(polygon_outline(polygon), &style);
                stats.polygons += 1;
            }
            Shape::Point(point) => {
                surface.add_marker(Coord::new(point.y(), point.x()));
                stats.points += 1;
            }
            Shape::Line(line) => {
                surface.add_path(line_path(line));
                stats.lines += 1;
            }
        }
    }
    surface.fit_bounding_box(bounds.north_east(), bounds.south_west());

    Ok(RenderOutcome::Drawn { stats, bounds })
}
