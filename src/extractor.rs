//! Workout statistics over a TCX document.
//!
//! Sequence extractors (`heart_rate_values`, `altitude_points`, `time_values`,
//! `speed_values`, `all_trackpoints`, `distance`) search the whole document. Lap-based
//! properties only look at the first `<Activity>`. Nothing is cached besides that
//! activity; each call re-runs its queries.
//!
//! Averages of an empty sequence are 0 while minima and maxima fail with
//! [`TcxError::EmptySequence`]. Callers rely on that difference.

use std::path::Path;

use chrono::DateTime;

use crate::document::{Document, Node, NodeId};
use crate::error::{Result, TcxError};
use crate::query;
use crate::schema::{self, NAMESPACES, TCX_NS};
use crate::tcx_types::Trackpoint;

#[derive(Debug)]
pub struct ActivityExtractor {
    document: Document,
    activity: NodeId,
}

impl ActivityExtractor {
    /// Fails with [`TcxError::MissingStructure`] when the root has no `Activities/Activity`.
    pub fn new(document: Document) -> Result<Self> {
        let root = document.root();
        let activity = root
            .child(TCX_NS, schema::ACTIVITIES)
            .ok_or(TcxError::MissingStructure(schema::ACTIVITIES))?
            .child(TCX_NS, schema::ACTIVITY)
            .ok_or(TcxError::MissingStructure(schema::ACTIVITY))?
            .id();
        Ok(Self { document, activity })
    }

    pub fn parse_str(xml: &str) -> Result<Self> {
        Self::new(Document::parse_str(xml)?)
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(Document::open(path)?)
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    fn activity(&self) -> Node<'_> {
        self.document.node(self.activity)
    }

    fn laps(&self) -> Result<Vec<Node<'_>>> {
        let laps: Vec<Node<'_>> = self.activity().children_named(TCX_NS, schema::LAP).collect();
        if laps.is_empty() {
            return Err(TcxError::MissingStructure(schema::LAP));
        }
        Ok(laps)
    }

    fn numbers(&self, path: &str, label: &'static str) -> Result<Vec<f64>> {
        query::find_all(&self.document, path, NAMESPACES)?
            .into_iter()
            .map(number)
            .collect::<Result<Vec<f64>>>()
            .inspect_err(|e| tracing::warn!(%e, sequence = label, "non-numeric sample"))
    }

    pub fn heart_rate_values(&self) -> Result<Vec<f64>> {
        self.numbers(schema::HEART_RATE_PATH, "heart rate")
    }

    pub fn altitude_points(&self) -> Result<Vec<f64>> {
        self.numbers(schema::ALTITUDE_PATH, "altitude")
    }

    /// Raw `<Time>` text of every timestamped element.
    pub fn time_values(&self) -> Result<Vec<String>> {
        Ok(query::find_all(&self.document, schema::TIME_PATH, NAMESPACES)?
            .into_iter()
            .map(|n| n.text().to_string())
            .collect())
    }

    pub fn speed_values(&self) -> Result<Vec<f64>> {
        self.numbers(schema::SPEED_PATH, "speed")
    }

    /// Every trackpoint with a `<Position>`, in document order.
    pub fn all_trackpoints(&self) -> Result<Vec<Trackpoint>> {
        query::find_all(&self.document, schema::TRACKPOINT_PATH, NAMESPACES)?
            .into_iter()
            .filter(|tp| tp.has_child(TCX_NS, schema::POSITION))
            .map(|tp| -> Result<Trackpoint> {
                let position = required(tp, schema::POSITION)?;
                Ok(Trackpoint::new(
                    number(required(position, schema::LATITUDE)?)?,
                    number(required(position, schema::LONGITUDE)?)?,
                    required(tp, schema::TIME)?.text(),
                ))
            })
            .collect()
    }

    fn first_trackpoint(&self) -> Result<Node<'_>> {
        let lap = required(self.activity(), schema::LAP)?;
        required(required(lap, schema::TRACK)?, schema::TRACKPOINT)
    }

    fn first_position_value(&self, name: &'static str) -> Result<Option<f64>> {
        match self.first_trackpoint()?.child(TCX_NS, schema::POSITION) {
            Some(position) => number(required(position, name)?).map(Some),
            None => Ok(None),
        }
    }

    /// Latitude of the first trackpoint, `None` when it has no position.
    pub fn latitude(&self) -> Result<Option<f64>> {
        self.first_position_value(schema::LATITUDE)
    }

    /// Longitude of the first trackpoint, `None` when it has no position.
    pub fn longitude(&self) -> Result<Option<f64>> {
        self.first_position_value(schema::LONGITUDE)
    }

    pub fn activity_type(&self) -> Result<String> {
        self.activity()
            .attribute(schema::SPORT)
            .map(str::to_lowercase)
            .ok_or(TcxError::MissingStructure(schema::SPORT))
    }

    /// `<Time>` of the last trackpoint in the last lap.
    pub fn completed_at(&self) -> Result<String> {
        let laps = self.laps()?;
        let track = required(laps[laps.len() - 1], schema::TRACK)?;
        let last = track
            .children_named(TCX_NS, schema::TRACKPOINT)
            .last()
            .ok_or(TcxError::MissingStructure(schema::TRACKPOINT))?;
        Ok(required(last, schema::TIME)?.text().to_string())
    }

    /// Last `<DistanceMeters>` anywhere in the document (values are cumulative), or 0.
    pub fn distance(&self) -> Result<f64> {
        match query::find_all(&self.document, schema::DISTANCE_PATH, NAMESPACES)?.last() {
            Some(&node) => number(node),
            None => Ok(0.0),
        }
    }

    pub fn distance_units(&self) -> &'static str {
        "meters"
    }

    /// Sum of lap `<TotalTimeSeconds>`, in seconds.
    pub fn duration(&self) -> Result<f64> {
        self.sum_over_laps(schema::TOTAL_TIME)
    }

    pub fn calories(&self) -> Result<f64> {
        self.sum_over_laps(schema::CALORIES)
    }

    fn sum_over_laps(&self, name: &'static str) -> Result<f64> {
        self.laps()?
            .into_iter()
            .map(|lap| number(required(lap, name)?))
            .sum()
    }

    /// Mean heart rate, 0 without samples.
    pub fn hr_avg(&self) -> Result<f64> {
        Ok(mean(&self.heart_rate_values()?))
    }

    pub fn hr_max(&self) -> Result<f64> {
        maximum(&self.heart_rate_values()?, "heart rate")
    }

    pub fn hr_min(&self) -> Result<f64> {
        minimum(&self.heart_rate_values()?, "heart rate")
    }

    /// Average pace as `MM:SS` per kilometer.
    pub fn pace(&self) -> Result<String> {
        let distance = self.distance()?;
        if distance == 0.0 {
            return Err(TcxError::DivisionByZero("distance"));
        }
        format_pace(self.duration()? / (distance / 1000.0))
    }

    pub fn speed_min(&self) -> Result<f64> {
        minimum(&self.speed_values()?, "speed")
    }

    pub fn speed_max(&self) -> Result<f64> {
        maximum(&self.speed_values()?, "speed")
    }

    /// Mean speed, 0 without samples.
    pub fn speed_avg(&self) -> Result<f64> {
        Ok(mean(&self.speed_values()?))
    }

    pub fn speed_units(&self) -> &'static str {
        "m/s"
    }

    /// Mean altitude, 0 without samples.
    pub fn altitude_avg(&self) -> Result<f64> {
        Ok(mean(&self.altitude_points()?))
    }

    pub fn altitude_max(&self) -> Result<f64> {
        maximum(&self.altitude_points()?, "altitude")
    }

    pub fn altitude_min(&self) -> Result<f64> {
        minimum(&self.altitude_points()?, "altitude")
    }

    /// Total climb in meters.
    pub fn ascent(&self) -> Result<f64> {
        Ok(ascent(&self.altitude_points()?))
    }

    /// Total drop in meters.
    pub fn descent(&self) -> Result<f64> {
        Ok(descent(&self.altitude_points()?))
    }
}

/// Format seconds per kilometer as `MM:SS`.
///
/// Fractional seconds are floored and the value is read as a UTC time of day after the
/// Unix epoch, so minutes wrap at 60.
pub fn format_pace(secs_per_km: f64) -> Result<String> {
    if !secs_per_km.is_finite() || secs_per_km.abs() > i64::MAX as f64 {
        return Err(TcxError::PaceOutOfRange(secs_per_km));
    }
    let at = DateTime::from_timestamp(secs_per_km.floor() as i64, 0)
        .ok_or(TcxError::PaceOutOfRange(secs_per_km))?;
    Ok(at.format("%M:%S").to_string())
}

fn required<'d>(node: Node<'d>, name: &'static str) -> Result<Node<'d>> {
    node.child(TCX_NS, name).ok_or(TcxError::MissingStructure(name))
}

fn number(node: Node<'_>) -> Result<f64> {
    node.scalar().as_f64().ok_or_else(|| TcxError::NotNumeric {
        element: node.local_name().to_string(),
        value: node.text().to_string(),
    })
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

// `f64::max` / `f64::min` ignore NaN samples unless every sample is NaN.
fn maximum(values: &[f64], label: &'static str) -> Result<f64> {
    values
        .iter()
        .copied()
        .reduce(f64::max)
        .ok_or(TcxError::EmptySequence(label))
}

fn minimum(values: &[f64], label: &'static str) -> Result<f64> {
    values
        .iter()
        .copied()
        .reduce(f64::min)
        .ok_or(TcxError::EmptySequence(label))
}

fn ascent(altitudes: &[f64]) -> f64 {
    altitudes
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .filter(|diff| *diff > 0.0)
        .sum()
}

fn descent(altitudes: &[f64]) -> f64 {
    altitudes
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .filter(|diff| *diff < 0.0)
        .map(f64::abs)
        .sum()
}
