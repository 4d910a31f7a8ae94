//! Codec for the HEC-RAS geometry/SDF text interchange format.
//!
//! The reader scans survey output for cutlines, bank positions and water
//! surface extents, and re-reads stream-network centerlines. The writer
//! renders the nested `BEGIN <NAME>:` / `END <NAME>:` block grammar.

pub mod reader;
pub mod writer;

use geo_types::Coord;

/// Left and right water-surface edge at one surveyed station.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtentPair {
    pub left: Coord<f64>,
    pub right: Coord<f64>,
}

/// The three raw vertices following a `CUT LINE` marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cutline {
    pub vertices: [Coord<f64>; 3],
}

/// Fractional distances of the left and right bank along a cutline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BankPositions {
    pub left: f64,
    pub right: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CenterlinePoint {
    pub position: Coord<f64>,
    pub elevation: Option<f64>,
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CenterlineReach {
    pub reach_id: u32,
    pub points: Vec<CenterlinePoint>,
}

pub use reader::{SurveyData, parse_stream_network, parse_survey, read_stream_network, read_survey};
pub use writer::{SdfWriter, apply_line_ending, render_boundary};
