use crate::error::{HecrasError, Result};
use chrono::{DateTime, Local};

// Configuration structure for attribute column names in the workspace
#[derive(Debug, Clone)]
pub struct ColumnConfig {
    pub reach_len: String,
    pub start_x: String,
    pub start_y: String,
    pub end_x: String,
    pub end_y: String,
    pub x: String,
    pub y: String,
    pub reach_id: String,
    pub distance: String,
    pub reach: String,
    pub station_id: String,
    pub line: String,
    pub ordinal: String,
    pub cutline: String,
    pub bank: String,
    pub fraction: String,
    pub area: String,
    pub centroid_x: String,
    pub centroid_y: String,
}

impl ColumnConfig {
    pub fn new() -> Self {
        ColumnConfig {
            reach_len: "reach_len".to_string(),
            start_x: "start_x".to_string(),
            start_y: "start_y".to_string(),
            end_x: "end_x".to_string(),
            end_y: "end_y".to_string(),
            x: "x".to_string(),
            y: "y".to_string(),
            reach_id: "reach_id".to_string(),
            distance: "distance".to_string(),
            reach: "reach".to_string(),
            station_id: "station_id".to_string(),
            line: "line".to_string(),
            ordinal: "ordinal".to_string(),
            cutline: "cutline".to_string(),
            bank: "bank".to_string(),
            fraction: "fraction".to_string(),
            area: "area".to_string(),
            centroid_x: "centroid_x".to_string(),
            centroid_y: "centroid_y".to_string(),
        }
    }
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self::new()
    }
}

// Line terminator convention of the written interchange file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn from_unix_flag(unix: bool) -> Self {
        if unix { LineEnding::Lf } else { LineEnding::CrLf }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Units {
    Metric,
    UsCustomary,
    Unspecified,
}

impl Units {
    /// Maps the store's linear unit label onto the header vocabulary.
    pub fn from_label(label: Option<&str>) -> Self {
        match label.map(|l| l.trim().to_ascii_lowercase()).as_deref() {
            Some("metres") | Some("meters") | Some("metre") | Some("meter") => Units::Metric,
            Some("feet") | Some("foot") | Some("us_survey_feet") => Units::UsCustomary,
            _ => Units::Unspecified,
        }
    }

    pub fn header_label(&self) -> &'static str {
        match self {
            Units::Metric => "METRIC",
            Units::UsCustomary => "US CUSTOMARY",
            Units::Unspecified => "",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SmoothingParams {
    pub output: String,
    pub passes: usize,
}

// Caller-supplied synthesis parameters
#[derive(Debug, Clone)]
pub struct SynthesisParams {
    pub spacing: f64,
    pub width: f64,
    pub smoothing: Option<SmoothingParams>,
}

impl SynthesisParams {
    /// Builds and validates the parameters; nothing is synthesized on error.
    pub fn new(
        spacing: f64,
        width: f64,
        smooth: bool,
        smooth_output: Option<String>,
        threshold: Option<usize>,
    ) -> Result<Self> {
        if !spacing.is_finite() || spacing <= 0.0 {
            return Err(HecrasError::InvalidConfig(format!(
                "spacing must be a positive number, got {}",
                spacing
            )));
        }
        if !width.is_finite() || width <= 0.0 {
            return Err(HecrasError::InvalidConfig(format!(
                "cross section width must be a positive number, got {}",
                width
            )));
        }

        let smoothing = if smooth {
            match (smooth_output, threshold) {
                (Some(output), Some(passes)) if passes > 0 && !output.is_empty() => {
                    Some(SmoothingParams { output, passes })
                }
                _ => {
                    return Err(HecrasError::InvalidConfig(
                        "missing smooth options, check smooth_river and threshold".to_string(),
                    ));
                }
            }
        } else {
            None
        };

        Ok(SynthesisParams {
            spacing,
            width,
            smoothing,
        })
    }

    pub fn half_width(&self) -> f64 {
        self.width / 2.0
    }
}

// Run-scoped identity used to name scratch resources
#[derive(Debug, Clone)]
pub struct RunContext {
    pub pid: u32,
    pub started: DateTime<Local>,
}

impl RunContext {
    pub fn new() -> Self {
        RunContext {
            pid: std::process::id(),
            started: Local::now(),
        }
    }

    pub fn scratch_name(&self, prefix: &str) -> String {
        format!(
            "{}_{}_{}",
            prefix,
            self.pid,
            self.started.format("%Y%m%d%H%M%S%3f")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_spacing_and_width() {
        assert!(matches!(
            SynthesisParams::new(0.0, 20.0, false, None, None),
            Err(HecrasError::InvalidConfig(_))
        ));
        assert!(matches!(
            SynthesisParams::new(100.0, -1.0, false, None, None),
            Err(HecrasError::InvalidConfig(_))
        ));
    }

    #[test]
    fn smoothing_requires_threshold_and_output() {
        assert!(SynthesisParams::new(100.0, 20.0, true, Some("smooth".into()), None).is_err());
        assert!(SynthesisParams::new(100.0, 20.0, true, None, Some(2)).is_err());
        let params =
            SynthesisParams::new(100.0, 20.0, true, Some("smooth".into()), Some(2)).unwrap();
        assert_eq!(params.half_width(), 10.0);
        assert_eq!(params.smoothing.map(|s| s.passes), Some(2));
    }

    #[test]
    fn units_labels() {
        assert_eq!(Units::from_label(Some("metres")).header_label(), "METRIC");
        assert_eq!(Units::from_label(Some("feet")).header_label(), "US CUSTOMARY");
        assert_eq!(Units::from_label(None).header_label(), "");
    }
}
