mod nominatim;

use std::sync::Arc;

pub use nominatim::*;

use crate::{error::ExplorerError, types::PlaceBoundary};

/// Resolves a free text place name to its outline.
pub trait Geocoder: Send + Sync {
    fn geocode(&self, place: &str) -> Result<PlaceBoundary, ExplorerError>;
}

impl<T: Geocoder + ?Sized> Geocoder for &T {
    fn geocode(&self, place: &str) -> Result<PlaceBoundary, ExplorerError> {
        (**self).geocode(place)
    }
}

impl<T: Geocoder + ?Sized> Geocoder for Arc<T> {
    fn geocode(&self, place: &str) -> Result<PlaceBoundary, ExplorerError> {
        (**self).geocode(place)
    }
}
