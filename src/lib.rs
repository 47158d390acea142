pub mod converter;
pub mod document;
pub mod error;
pub mod extractor;
pub mod options;
pub mod query;
pub mod schema;
pub mod summary;
pub mod tcx_types;
pub mod value;

use wasm_bindgen::prelude::*;

pub use crate::document::{Document, Node};
pub use crate::error::{Result, TcxError};
pub use crate::extractor::ActivityExtractor;
pub use crate::options::ConvertOptions;
pub use crate::summary::ActivitySummary;
pub use crate::tcx_types::Trackpoint;
pub use crate::value::Scalar;

/// Summarize a TCX activity, returned as a JS object.
#[wasm_bindgen(js_name = tcxSummary)]
pub fn tcx_summary(tcx_string: &str) -> std::result::Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let ex = ActivityExtractor::parse_str(tcx_string)?;
    let summary = ActivitySummary::from_extractor(&ex)?;
    serde_wasm_bindgen::to_value(&summary).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Positioned trackpoints of a TCX document, returned as a JS array.
#[wasm_bindgen(js_name = tcxTrackpoints)]
pub fn tcx_trackpoints(tcx_string: &str) -> std::result::Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let ex = ActivityExtractor::parse_str(tcx_string)?;
    let points = ex.all_trackpoints()?;
    serde_wasm_bindgen::to_value(&points).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Convert TCX string to GeoJSON, returned as a JS object.
#[wasm_bindgen(js_name = tcxToGeoJson)]
pub fn tcx_to_geojson(
    tcx_string: &str,
    options: JsValue,
) -> std::result::Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let opts = parse_options(options)?;
    let ex = ActivityExtractor::parse_str(tcx_string)?;
    let fc = converter::to_feature_collection(&ex, &opts)?;
    serde_wasm_bindgen::to_value(&fc).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Convert TCX string to GeoJSON, returned as a JSON string.
#[wasm_bindgen(js_name = tcxToGeoJsonString)]
pub fn tcx_to_geojson_string(
    tcx_string: &str,
    options: JsValue,
) -> std::result::Result<String, JsValue> {
    console_error_panic_hook::set_once();

    let opts = parse_options(options)?;
    let ex = ActivityExtractor::parse_str(tcx_string)?;
    let fc = converter::to_feature_collection(&ex, &opts)?;
    serde_json::to_string(&fc).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn parse_options(options: JsValue) -> std::result::Result<ConvertOptions, JsValue> {
    if options.is_undefined() || options.is_null() {
        Ok(ConvertOptions::default())
    } else {
        serde_wasm_bindgen::from_value(options).map_err(|e| JsValue::from_str(&e.to_string()))
    }
}
