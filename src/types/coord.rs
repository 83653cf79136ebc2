use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// A geographic position in map order, latitude first.
///
/// Source geometries are stored the GeoJSON way round, `x = longitude` and
/// `y = latitude`; everything handed to the map goes through this type so the
/// swap happens in exactly one place.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize, Copy)]
pub struct Coord {
    pub lat: f64,
    #[serde(rename = "lon")]
    pub long: f64,
}

impl Coord {
    pub const fn new(lat: f64, long: f64) -> Self {
        Self { lat, long }
    }

    /// Builds a map coordinate from a `(lon, lat)` geometry coordinate.
    pub fn from_lon_lat(coord: geo::Coord<f64>) -> Self {
        Self::new(coord.y, coord.x)
    }

    pub fn to_map_coord(&self) -> bevy_map_viewer::Coord {
        bevy_map_viewer::Coord::new(self.lat as f32, self.long as f32)
    }
}

/// Axis aligned bounds of a collection, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl BoundingBox {
    pub fn from_rect(rect: geo::Rect<f64>) -> Self {
        Self {
            north: rect.max().y,
            south: rect.min().y,
            east: rect.max().x,
            west: rect.min().x,
        }
    }

    pub fn north_east(&self) -> Coord {
        Coord::new(self.north, self.east)
    }

    pub fn south_west(&self) -> Coord {
        Coord::new(self.south, self.west)
    }

    pub fn center(&self) -> Coord {
        Coord::new(
            (self.north + self.south) / 2.0,
            (self.east + self.west) / 2.0,
        )
    }

    pub fn is_finite(&self) -> bool {
        self.north.is_finite()
            && self.south.is_finite()
            && self.east.is_finite()
            && self.west.is_finite()
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            north: self.north.max(other.north),
            south: self.south.min(other.south),
            east: self.east.max(other.east),
            west: self.west.min(other.west),
        }
    }

    /// Highest web mercator zoom at which the whole box fits in a viewport of
    /// `viewport` pixels (width, height) with tiles of `tile_size` pixels.
    pub fn fit_zoom(&self, viewport: (f64, f64), tile_size: f64, max_zoom: u32) -> u32 {
        fn mercator_lat(lat: f64) -> f64 {
            let sin = lat.to_radians().sin();
            let rad_x2 = ((1.0 + sin) / (1.0 - sin)).ln() / 2.0;
            rad_x2.clamp(-PI, PI) / 2.0
        }

        fn zoom_for(pixels: f64, tile_size: f64, fraction: f64) -> f64 {
            (pixels / tile_size / fraction).ln() / std::f64::consts::LN_2
        }

        let lat_fraction = (mercator_lat(self.north) - mercator_lat(self.south)) / PI;
        let mut lng_diff = self.east - self.west;
        if lng_diff < 0.0 {
            lng_diff += 360.0;
        }
        let lng_fraction = lng_diff / 360.0;

        let mut zoom = max_zoom as f64;
        if lat_fraction > 0.0 {
            zoom = zoom.min(zoom_for(viewport.1, tile_size, lat_fraction));
        }
        if lng_fraction > 0.0 {
            zoom = zoom.min(zoom_for(viewport.0, tile_size, lng_fraction));
        }
        zoom.floor().max(0.0) as u32
    }
}
