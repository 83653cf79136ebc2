use geo::{MultiPolygon, Polygon, Simplify};

use crate::{error::QueryError, types::TagFilter};

#[derive(Clone, Debug, PartialEq)]
pub struct QuerySettings {
    pub timeout_secs: u64,
    pub simplify_tolerance: f64,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            timeout_secs: 180,
            simplify_tolerance: 0.0005,
        }
    }
}

/// Formats the exterior of a polygon as an Overpass `poly:` filter. Overpass
/// wants `lat lon` pairs and closes the ring itself.
pub fn poly_filter(polygon: &Polygon<f64>) -> Option<String> {
    let mut ring = polygon.exterior().0.as_slice();
    if ring.len() > 1 && ring.first() == ring.last() {
        ring = &ring[..ring.len() - 1];
    }
    if ring.len() < 3 {
        return None;
    }
    let points_string = ring
        .iter()
        .map(|point| format!("{} {}", point.y, point.x))
        .collect::<Vec<String>>()
        .join(" ");
    Some(format!("poly:\"{}\"", points_string))
}

fn tag_selector(key: &str, present: bool) -> String {
    if present {
        format!("[\"{}\"]", key)
    } else {
        format!("[!\"{}\"]", key)
    }
}

/// Builds an Overpass query returning every node, way and relation matching
/// `filter` inside `area`, with full geometry.
pub fn build_overpass_query_string(
    area: &MultiPolygon<f64>,
    filter: &TagFilter,
    settings: &QuerySettings,
) -> Result<String, QueryError> {
    if filter.is_empty() {
        return Err(QueryError::EmptyTag);
    }

    let simplified = area.simplify(&settings.simplify_tolerance);
    let bounds: Vec<String> = simplified
        .iter()
        .zip(area.iter())
        .filter_map(|(simple, original)| poly_filter(simple).or_else(|| poly_filter(original)))
        .collect();
    if bounds.is_empty() {
        return Err(QueryError::Service(
            "the boundary has no polygon to search in".to_string(),
        ));
    }

    let selectors: String = filter
        .iter()
        .map(|(key, present)| tag_selector(key, present))
        .collect();

    let mut query = format!("[out:json][timeout:{}];\n(\n", settings.timeout_secs);
    for bound in &bounds {
        for element in ["node", "way", "relation"] {
            query.push_str(&format!("{element}{selectors}({bound});\n"));
        }
    }
    query.push_str(");\nout body geom;");
    Ok(query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;
    use pretty_assertions::assert_eq;

    fn city() -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: -90.3, y: 38.5),
            (x: -90.1, y: 38.5),
            (x: -90.1, y: 38.7),
            (x: -90.3, y: 38.5),
        ]])
    }

    #[test]
    fn poly_filter_swaps_and_drops_closing_point() {
        let area = city();
        assert_eq!(
            poly_filter(&area.0[0]).unwrap(),
            "poly:\"38.5 -90.3 38.5 -90.1 38.7 -90.1\""
        );
    }

    #[test]
    fn query_covers_every_element_type() {
        let query = build_overpass_query_string(
            &city(),
            &TagFilter::presence("amenity"),
            &QuerySettings::default(),
        )
        .unwrap();

        let poly = "poly:\"38.5 -90.3 38.5 -90.1 38.7 -90.1\"";
        assert_eq!(
            query,
            format!(
                "[out:json][timeout:180];\n(\nnode[\"amenity\"]({poly});\nway[\"amenity\"]({poly});\nrelation[\"amenity\"]({poly});\n);\nout body geom;"
            )
        );
    }

    #[test]
    fn absent_tags_are_negated() {
        let mut filter = TagFilter::presence("building");
        filter.insert("demolished", false);
        let query =
            build_overpass_query_string(&city(), &filter, &QuerySettings::default()).unwrap();
        assert!(query.contains("way[\"building\"][!\"demolished\"](poly:"));
    }

    #[test]
    fn one_statement_group_per_polygon() {
        let mut area = city();
        area.0.push(polygon![
            (x: 1.0, y: 1.0),
            (x: 2.0, y: 1.0),
            (x: 2.0, y: 2.0),
            (x: 1.0, y: 1.0),
        ]);
        let query =
            build_overpass_query_string(&area, &TagFilter::presence("shop"), &QuerySettings::default())
                .unwrap();
        assert_eq!(query.matches("node[\"shop\"]").count(), 2);
    }

    #[test]
    fn empty_filter_is_rejected() {
        assert_eq!(
            build_overpass_query_string(&city(), &TagFilter::default(), &QuerySettings::default()),
            Err(QueryError::EmptyTag)
        );
    }

    #[test]
    fn empty_area_is_rejected() {
        let result = build_overpass_query_string(
            &MultiPolygon::new(vec![]),
            &TagFilter::presence("shop"),
            &QuerySettings::default(),
        );
        assert!(matches!(result, Err(QueryError::Service(_))));
    }
}
