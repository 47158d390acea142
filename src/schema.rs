//! Element names, namespaces and query paths of the Garmin TCX schema.
//!
//! Every schema string the extractor uses lives here.

/// Training Center Database v2 namespace.
pub const TCX_NS: &str = "http://www.garmin.com/xmlschemas/TrainingCenterDatabase/v2";

/// Activity Extension v2 namespace (carries `TPX/Speed`).
pub const EXT_NS: &str = "http://www.garmin.com/xmlschemas/ActivityExtension/v2";

/// Prefix bindings used by every path query below.
pub const NAMESPACES: &[(&str, &str)] = &[("ns", TCX_NS), ("ns2", EXT_NS)];

pub const ACTIVITIES: &str = "Activities";
pub const ACTIVITY: &str = "Activity";
pub const LAP: &str = "Lap";
pub const TRACK: &str = "Track";
pub const TRACKPOINT: &str = "Trackpoint";
pub const TIME: &str = "Time";
pub const POSITION: &str = "Position";
pub const LATITUDE: &str = "LatitudeDegrees";
pub const LONGITUDE: &str = "LongitudeDegrees";
pub const TOTAL_TIME: &str = "TotalTimeSeconds";
pub const CALORIES: &str = "Calories";
pub const SPORT: &str = "Sport";

pub const HEART_RATE_PATH: &str = "//ns:HeartRateBpm/ns:Value";
pub const ALTITUDE_PATH: &str = "//ns:AltitudeMeters";
pub const TIME_PATH: &str = "//ns:Time";
pub const SPEED_PATH: &str = "//ns:Trackpoint//ns:Extensions//ns2:TPX//ns2:Speed";
pub const TRACKPOINT_PATH: &str = "//ns:Trackpoint";
/// Relative to the root element; cumulative distances are reported per trackpoint.
pub const DISTANCE_PATH: &str = ".//ns:DistanceMeters";
