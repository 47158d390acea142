use geojson::{Feature, FeatureCollection, Geometry, Value};
use serde_json::{Map, Value as JsonValue};

use crate::error::Result;
use crate::extractor::ActivityExtractor;
use crate::options::ConvertOptions;
use crate::summary::ActivitySummary;
use crate::tcx_types::Trackpoint;

/// Convert the positioned trackpoints of a TCX document to a GeoJSON FeatureCollection.
///
/// Two or more points give a LineString Feature, a single point a Point Feature and no
/// points an empty collection.
pub fn to_feature_collection(
    ex: &ActivityExtractor,
    opts: &ConvertOptions,
) -> Result<FeatureCollection> {
    let points = ex.all_trackpoints()?;

    let geometry = match points.as_slice() {
        [] => None,
        [pt] => Some(Geometry::new(Value::Point(point_coords(pt)))),
        _ => Some(Geometry::new(Value::LineString(
            points.iter().map(point_coords).collect(),
        ))),
    };

    let features = match geometry {
        Some(geometry) => vec![Feature {
            bbox: None,
            geometry: Some(geometry),
            id: None,
            properties: Some(build_activity_props(ex, &points, opts)?),
            foreign_members: None,
        }],
        None => Vec::new(),
    };

    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

fn build_activity_props(
    ex: &ActivityExtractor,
    points: &[Trackpoint],
    opts: &ConvertOptions,
) -> Result<Map<String, JsonValue>> {
    let mut props = Map::new();
    props.insert(
        "tcxType".to_string(),
        JsonValue::String("activity".to_string()),
    );
    props.insert("sport".to_string(), JsonValue::String(ex.activity_type()?));

    if opts.include_summary {
        let summary = ActivitySummary::from_extractor(ex)?;
        if let JsonValue::Object(fields) = serde_json::to_value(&summary)? {
            props.extend(fields);
        }
    }

    if opts.include_time {
        insert_coordinate_times(&mut props, points);
    }

    Ok(props)
}

/// Build [lon, lat] coordinate array.
fn point_coords(pt: &Trackpoint) -> Vec<f64> {
    vec![pt.longitude(), pt.latitude()]
}

fn insert_coordinate_times(props: &mut Map<String, JsonValue>, points: &[Trackpoint]) {
    let times: Vec<JsonValue> = points
        .iter()
        .map(|pt| match pt.time() {
            "" => JsonValue::Null,
            t => JsonValue::String(t.to_string()),
        })
        .collect();

    // Only include if at least one time is present
    if times.iter().any(|t| !t.is_null()) {
        let mut coord_props = Map::new();
        coord_props.insert("times".to_string(), JsonValue::Array(times));
        props.insert(
            "coordinateProperties".to_string(),
            JsonValue::Object(coord_props),
        );
    }
}
