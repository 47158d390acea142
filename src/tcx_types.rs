use serde::Serialize;

/// A positioned sample taken from a `<Trackpoint>` that carries a `<Position>`.
///
/// Values are stored exactly as read; `time` is the raw `<Time>` text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trackpoint {
    latitude: f64,
    longitude: f64,
    time: String,
}

impl Trackpoint {
    pub fn new(latitude: f64, longitude: f64, time: impl Into<String>) -> Self {
        Self {
            latitude,
            longitude,
            time: time.into(),
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn time(&self) -> &str {
        &self.time
    }
}
