use serde::Serialize;

use crate::error::Result;
use crate::extractor::ActivityExtractor;

/// Snapshot of every derived property of an activity.
///
/// Extrema over empty samples and the pace of a zero-distance activity are `None`;
/// any other failure aborts the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySummary {
    pub activity_type: String,
    pub completed_at: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub distance: f64,
    pub distance_units: &'static str,
    pub duration: f64,
    pub calories: f64,
    pub pace: Option<String>,
    pub hr_avg: f64,
    pub hr_max: Option<f64>,
    pub hr_min: Option<f64>,
    pub speed_avg: f64,
    pub speed_max: Option<f64>,
    pub speed_min: Option<f64>,
    pub speed_units: &'static str,
    pub altitude_avg: f64,
    pub altitude_max: Option<f64>,
    pub altitude_min: Option<f64>,
    pub ascent: f64,
    pub descent: f64,
}

impl ActivitySummary {
    pub fn from_extractor(ex: &ActivityExtractor) -> Result<Self> {
        Ok(Self {
            activity_type: ex.activity_type()?,
            completed_at: ex.completed_at()?,
            latitude: ex.latitude()?,
            longitude: ex.longitude()?,
            distance: ex.distance()?,
            distance_units: ex.distance_units(),
            duration: ex.duration()?,
            calories: ex.calories()?,
            pace: optional(ex.pace())?,
            hr_avg: ex.hr_avg()?,
            hr_max: optional(ex.hr_max())?,
            hr_min: optional(ex.hr_min())?,
            speed_avg: ex.speed_avg()?,
            speed_max: optional(ex.speed_max())?,
            speed_min: optional(ex.speed_min())?,
            speed_units: ex.speed_units(),
            altitude_avg: ex.altitude_avg()?,
            altitude_max: optional(ex.altitude_max())?,
            altitude_min: optional(ex.altitude_min())?,
            ascent: ex.ascent()?,
            descent: ex.descent()?,
        })
    }
}

fn optional<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(e) if e.is_no_data() => Ok(None),
        Err(e) => Err(e),
    }
}
