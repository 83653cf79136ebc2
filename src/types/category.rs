use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// Selection of top level tags, <https://wiki.openstreetmap.org/wiki/Top-level_tag>.
/// Label shown in the sidebar, then the tag key queried.
pub const FEATURE_CATEGORIES: [(&str, &str); 17] = [
    ("Airport", "aeroway"),
    ("Amenity", "amenity"),
    ("Barrier", "barrier"),
    ("Building", "building"),
    ("Club", "club"),
    ("Craft", "craft"),
    ("Education", "education"),
    ("Emergency", "emergency"),
    ("Geological", "geological"),
    ("Healthcare", "healthcare"),
    ("Roads", "highway"),
    ("Military", "military"),
    ("Natural", "natural"),
    ("Railway", "railway"),
    ("Shop", "shop"),
    ("Tourism", "tourism"),
    ("Waterway", "waterway"),
];

/// Key that means "draw the searched outline itself".
pub const BOUNDARY_KEY: &str = "boundary";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategorySelection {
    #[default]
    Boundary,
    Tag(String),
    Custom,
}

/// What an update has to do for the active category.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedCategory {
    Boundary,
    Filter(TagFilter),
}

impl CategorySelection {
    pub fn tag(key: impl Into<String>) -> Self {
        CategorySelection::Tag(key.into())
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, CategorySelection::Custom)
    }

    /// Turns the selection into the filter to query, reading the free text
    /// entry when the custom category is active.
    pub fn resolve(&self, custom_tag: &str) -> Result<ResolvedCategory, QueryError> {
        let key = match self {
            CategorySelection::Boundary => return Ok(ResolvedCategory::Boundary),
            CategorySelection::Tag(key) => key.as_str(),
            CategorySelection::Custom => custom_tag.trim(),
        };

        if key.is_empty() {
            return Err(QueryError::EmptyTag);
        }
        if key == BOUNDARY_KEY {
            return Ok(ResolvedCategory::Boundary);
        }
        if !is_valid_tag_key(key) {
            return Err(QueryError::InvalidTag(key.to_string()));
        }
        Ok(ResolvedCategory::Filter(TagFilter::presence(key)))
    }
}

/// OSM keys are free form, but anything that would break out of an Overpass
/// `["key"]` selector is rejected.
pub fn is_valid_tag_key(key: &str) -> bool {
    !key.is_empty()
        && !key.chars().any(|c| {
            c.is_whitespace()
                || c.is_control()
                || matches!(c, '"' | '\\' | '[' | ']' | '(' | ')' | '{' | '}' | ';' | '=' | '~')
        })
}

/// Tag key to presence flag, `{"amenity": true}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagFilter(BTreeMap<String, bool>);

impl TagFilter {
    pub fn presence(key: impl Into<String>) -> Self {
        let mut filter = TagFilter::default();
        filter.insert(key, true);
        filter
    }

    pub fn insert(&mut self, key: impl Into<String>, present: bool) {
        self.0.insert(key.into(), present);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.0.iter().map(|(key, present)| (key.as_str(), *present))
    }
}

/// Which geometry types are drawn. Only read at draw time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayToggles {
    pub polygons: bool,
    pub points: bool,
    pub lines: bool,
}

impl Default for DisplayToggles {
    fn default() -> Self {
        Self {
            polygons: true,
            points: true,
            lines: true,
        }
    }
}

impl DisplayToggles {
    pub fn shows(&self, kind: super::ShapeKind) -> bool {
        match kind {
            super::ShapeKind::Polygon => self.polygons,
            super::ShapeKind::Point => self.points,
            super::ShapeKind::Line => self.lines,
        }
    }
}
