use anyhow::{bail, Context, Result};
use geojson::{feature::Id, Feature, GeoJson, Value};

use super::types::RoadSegment;
use crate::geo::GeoPoint;

/// Parse road segments from a GeoJSON Feature or FeatureCollection.
///
/// Each feature needs a numeric `aadt` (or `AADT`) property; features without
/// one are skipped. The segment id is the `id` property, else the feature id,
/// else the feature's index.
pub fn segments_from_geojson(text: &str) -> Result<Vec<RoadSegment>> {
    let geojson: GeoJson = text.parse().context("Failed to parse segment GeoJSON")?;

    let features = match geojson {
        GeoJson::FeatureCollection(collection) => collection.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(_) => bail!("Expected a Feature or FeatureCollection, found a bare geometry"),
    };

    let mut segments = Vec::with_capacity(features.len());
    for (index, feature) in features.iter().enumerate() {
        match segment_from_feature(feature, index) {
            Some(segment) => segments.push(segment),
            None => log::warn!("Skipping segment feature {}: no numeric AADT property", index),
        }
    }

    Ok(segments)
}

fn segment_from_feature(feature: &Feature, index: usize) -> Option<RoadSegment> {
    let properties = feature.properties.as_ref();
    let aadt = properties
        .and_then(|p| p.get("aadt").or_else(|| p.get("AADT")))
        .and_then(|v| v.as_f64())
        .filter(|v| v.is_finite() && *v >= 0.0)?;

    let id = properties
        .and_then(|p| p.get("id"))
        .and_then(|v| match v {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .or_else(|| {
            feature.id.as_ref().map(|id| match id {
                Id::String(s) => s.clone(),
                Id::Number(n) => n.to_string(),
            })
        })
        .unwrap_or_else(|| index.to_string());

    let midpoint = feature.geometry.as_ref().and_then(|g| midpoint(&g.value));

    Some(RoadSegment {
        id,
        aadt: aadt.round() as u64,
        midpoint,
    })
}

/// Representative point of a segment geometry: the point itself, or the middle
/// vertex of a line (first line for multi-lines).
pub fn midpoint(value: &Value) -> Option<GeoPoint> {
    match value {
        Value::Point(position) => to_point(position),
        Value::LineString(line) => middle_vertex(line),
        Value::MultiLineString(lines) => lines.first().and_then(|line| middle_vertex(line)),
        _ => None,
    }
}

fn middle_vertex(line: &[Vec<f64>]) -> Option<GeoPoint> {
    line.get(line.len() / 2).and_then(|position| to_point(position))
}

// GeoJSON positions are [lng, lat, ...]
fn to_point(position: &[f64]) -> Option<GeoPoint> {
    match position {
        [lng, lat, ..] if lat.is_finite() && lng.is_finite() => Some(GeoPoint::new(*lat, *lng)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLLECTION: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "id": "seg-a",
                "properties": {"aadt": 12000},
                "geometry": {"type": "LineString", "coordinates": [[-97.75, 30.26], [-97.74, 30.27], [-97.73, 30.28]]}
            },
            {
                "type": "Feature",
                "properties": {"AADT": 800, "id": 42},
                "geometry": {"type": "Point", "coordinates": [-97.70, 30.30]}
            },
            {
                "type": "Feature",
                "properties": {"name": "no count"},
                "geometry": {"type": "Point", "coordinates": [-97.70, 30.30]}
            },
            {
                "type": "Feature",
                "properties": {"aadt": 3000},
                "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]]}
            }
        ]
    }"#;

    #[test]
    fn test_parse_collection() {
        let segments = segments_from_geojson(COLLECTION).unwrap();
        assert_eq!(segments.len(), 3);

        assert_eq!(segments[0].id, "seg-a");
        assert_eq!(segments[0].aadt, 12_000);
        assert_eq!(segments[0].midpoint, Some(GeoPoint::new(30.27, -97.74)));

        assert_eq!(segments[1].id, "42");
        assert_eq!(segments[1].aadt, 800);
        assert_eq!(segments[1].midpoint, Some(GeoPoint::new(30.30, -97.70)));

        // Polygon has no usable midpoint; falls back to index id
        assert_eq!(segments[2].id, "3");
        assert!(segments[2].midpoint.is_none());
    }

    #[test]
    fn test_bare_geometry_rejected() {
        let text = r#"{"type": "Point", "coordinates": [0.0, 0.0]}"#;
        assert!(segments_from_geojson(text).is_err());
    }

    #[test]
    fn test_invalid_json_rejected() {
        assert!(segments_from_geojson("not geojson").is_err());
    }

    #[test]
    fn test_even_length_line_takes_upper_middle() {
        let line = Value::LineString(vec![
            vec![0.0, 0.0],
            vec![1.0, 1.0],
            vec![2.0, 2.0],
            vec![3.0, 3.0],
        ]);
        assert_eq!(midpoint(&line), Some(GeoPoint::new(2.0, 2.0)));
    }
}
