//! # Query and render pipeline
//!
//! Turns a place name and a category into draw calls:
//! geocode the place, keep its outline, query the tagged features inside it,
//! split them by geometry type and hand them to a [`MapSurface`].
//!
//! [`ExplorerState`] holds everything between events and decides what an
//! update has to do. [`Explorer`] runs the whole thing synchronously against
//! a [`Geocoder`](crate::geocode::Geocoder) and a
//! [`FeatureSource`](crate::overpass::FeatureSource); the map viewer drives
//! the same state from a background worker instead.

mod explorer;
mod render;
mod state;
#[cfg(test)]
pub(crate) mod test_support;

pub use explorer::*;
pub use render::*;
pub use state::*;
