use serde::Deserialize;

/// Options for TCX to GeoJSON conversion.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertOptions {
    /// Include trackpoint timestamps in coordinateProperties.times (default: true)
    #[serde(default = "default_true")]
    pub include_time: bool,

    /// Include the activity summary statistics in properties (default: true)
    #[serde(default = "default_true")]
    pub include_summary: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            include_time: true,
            include_summary: true,
        }
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let opts: ConvertOptions = serde_json::from_str(r#"{"includeTime": false}"#).unwrap();
        assert!(!opts.include_time);
        assert!(opts.include_summary);
    }
}
