use super::{BankPositions, CenterlinePoint, CenterlineReach, Cutline, ExtentPair};
use crate::error::{HecrasError, Result};
use geo_types::Coord;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

const WATER_SURFACE_EXTENT: &str = "WATER SURFACE EXTENT";
const CUT_LINE: &str = "CUT LINE";
const BANK_POSITIONS: &str = "BANK POSITIONS";

const BEGIN_STREAM_NETWORK: &str = "BEGIN STREAM NETWORK:";
const END_STREAM_NETWORK: &str = "END STREAM NETWORK:";

// Records scanned from one survey document, in file order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurveyData {
    pub cutlines: Vec<Cutline>,
    pub bank_positions: Vec<BankPositions>,
    pub extents: Vec<ExtentPair>,
}

impl SurveyData {
    /// Pairs every cutline with its bank positions; the counts must agree.
    pub fn banks(&self) -> Result<Vec<(Cutline, BankPositions)>> {
        if self.cutlines.len() != self.bank_positions.len() {
            return Err(HecrasError::CountMismatch {
                what: "cutlines and bank position pairs",
                left: self.cutlines.len(),
                right: self.bank_positions.len(),
            });
        }
        Ok(self
            .cutlines
            .iter()
            .copied()
            .zip(self.bank_positions.iter().copied())
            .collect())
    }
}

enum ScanState {
    Scanning,
    InCutline { opened: usize, coords: Vec<Coord<f64>> },
    InExtent { opened: usize },
}

/// Strips surrounding and internal whitespace from a data line.
fn compact(line: &str) -> String {
    line.chars().filter(|c| !c.is_whitespace()).collect()
}

fn parse_number(field: &str, line: usize) -> Result<f64> {
    field.parse::<f64>().map_err(|_| HecrasError::BadField {
        line,
        message: format!("'{}' is not a number", field),
    })
}

fn parse_fields(data: &str, wanted: usize, line: usize) -> Result<Vec<f64>> {
    let fields: Vec<&str> = data.split(',').collect();
    if fields.len() < wanted {
        return Err(HecrasError::BadField {
            line,
            message: format!("expected {} comma separated values, found {}", wanted, fields.len()),
        });
    }
    fields[..wanted]
        .iter()
        .map(|f| parse_number(f, line))
        .collect()
}

fn parse_bank_positions(raw: &str, line: usize) -> Result<BankPositions> {
    let data = compact(raw);
    let Some((_, values)) = data.split_once(':') else {
        return Err(HecrasError::BadField {
            line,
            message: "BANK POSITIONS line has no ':' separator".to_string(),
        });
    };
    let fractions = parse_fields(values, 2, line)?;
    for f in &fractions {
        if !(0.0..=1.0).contains(f) {
            return Err(HecrasError::BadField {
                line,
                message: format!("bank position {} is outside 0..1", f),
            });
        }
    }
    Ok(BankPositions {
        left: fractions[0],
        right: fractions[1],
    })
}

/// Single forward pass over a survey document.
///
/// `WATER SURFACE EXTENT` consumes exactly one following line of four
/// values. `CUT LINE` consumes three coordinate lines and then requires a
/// `BANK POSITIONS` line.
pub fn parse_survey<R: BufRead>(reader: R) -> Result<SurveyData> {
    let mut data = SurveyData::default();
    let mut state = ScanState::Scanning;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let number = idx + 1;

        state = match state {
            ScanState::Scanning => {
                if line.contains(WATER_SURFACE_EXTENT) {
                    ScanState::InExtent { opened: number }
                } else if line.contains(CUT_LINE) {
                    ScanState::InCutline {
                        opened: number,
                        coords: Vec::with_capacity(3),
                    }
                } else {
                    ScanState::Scanning
                }
            }
            ScanState::InExtent { .. } => {
                let v = parse_fields(&compact(&line), 4, number)?;
                data.extents.push(ExtentPair {
                    left: Coord { x: v[0], y: v[1] },
                    right: Coord { x: v[2], y: v[3] },
                });
                ScanState::Scanning
            }
            ScanState::InCutline { opened, mut coords } if coords.len() < 3 => {
                let v = parse_fields(&compact(&line), 2, number)?;
                coords.push(Coord { x: v[0], y: v[1] });
                ScanState::InCutline { opened, coords }
            }
            ScanState::InCutline { opened, coords } => {
                if !line.contains(BANK_POSITIONS) {
                    return Err(HecrasError::MissingBankPositions { line: opened });
                }
                data.bank_positions.push(parse_bank_positions(&line, number)?);
                data.cutlines.push(Cutline {
                    vertices: [coords[0], coords[1], coords[2]],
                });
                ScanState::Scanning
            }
        };
    }

    match state {
        ScanState::Scanning => Ok(data),
        ScanState::InExtent { opened } => Err(HecrasError::Truncated {
            line: opened,
            marker: WATER_SURFACE_EXTENT,
        }),
        ScanState::InCutline { opened, coords } if coords.len() < 3 => Err(HecrasError::Truncated {
            line: opened,
            marker: CUT_LINE,
        }),
        ScanState::InCutline { opened, .. } => {
            Err(HecrasError::MissingBankPositions { line: opened })
        }
    }
}

pub fn read_survey(path: &Path) -> Result<SurveyData> {
    let file = File::open(path)?;
    parse_survey(BufReader::new(file))
}

enum NetworkState {
    Outside,
    InNetwork,
    InReach { id: Option<u32>, points: Vec<CenterlinePoint> },
    InCenterline { id: Option<u32>, points: Vec<CenterlinePoint> },
}

fn finish_reach(
    id: Option<u32>,
    points: Vec<CenterlinePoint>,
    line: usize,
    reaches: &mut Vec<CenterlineReach>,
) -> Result<()> {
    let reach_id = id.ok_or_else(|| HecrasError::BadField {
        line,
        message: "REACH paragraph has no REACH ID".to_string(),
    })?;
    reaches.push(CenterlineReach { reach_id, points });
    Ok(())
}

fn parse_centerline_point(raw: &str, line: usize) -> Result<CenterlinePoint> {
    let data = compact(raw);
    let fields: Vec<&str> = data.split(',').collect();
    if fields.len() < 2 {
        return Err(HecrasError::BadField {
            line,
            message: "centerline point needs at least x,y".to_string(),
        });
    }
    let position = Coord {
        x: parse_number(fields[0], line)?,
        y: parse_number(fields[1], line)?,
    };
    let elevation = match fields.get(2) {
        Some(&"NULL") | Some(&"") | None => None,
        Some(z) => Some(parse_number(z, line)?),
    };
    Ok(CenterlinePoint {
        position,
        elevation,
        label: fields.get(3).map(|s| s.to_string()),
    })
}

/// Reads the REACH paragraphs of a `BEGIN STREAM NETWORK:` block.
pub fn parse_stream_network<R: BufRead>(reader: R) -> Result<Vec<CenterlineReach>> {
    let mut reaches = Vec::new();
    let mut state = NetworkState::Outside;
    let mut opened = 0;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let number = idx + 1;
        let text = line.trim();

        state = match state {
            NetworkState::Outside => {
                if text == BEGIN_STREAM_NETWORK {
                    opened = number;
                    NetworkState::InNetwork
                } else {
                    NetworkState::Outside
                }
            }
            NetworkState::InNetwork => {
                if text == END_STREAM_NETWORK {
                    NetworkState::Outside
                } else if text == "REACH:" {
                    NetworkState::InReach {
                        id: None,
                        points: Vec::new(),
                    }
                } else {
                    NetworkState::InNetwork
                }
            }
            NetworkState::InReach { id, points } => {
                if let Some(value) = text.strip_prefix("REACH ID:") {
                    let value = value.trim();
                    let parsed = value.parse::<u32>().map_err(|_| HecrasError::BadField {
                        line: number,
                        message: format!("'{}' is not a reach id", value),
                    })?;
                    NetworkState::InReach {
                        id: Some(parsed),
                        points,
                    }
                } else if text == "CENTERLINE:" {
                    NetworkState::InCenterline { id, points }
                } else if text == "END:" {
                    finish_reach(id, points, number, &mut reaches)?;
                    NetworkState::InNetwork
                } else {
                    NetworkState::InReach { id, points }
                }
            }
            NetworkState::InCenterline { id, mut points } => {
                if text == "END:" {
                    finish_reach(id, points, number, &mut reaches)?;
                    NetworkState::InNetwork
                } else if text.is_empty() {
                    NetworkState::InCenterline { id, points }
                } else if text.contains(':') {
                    NetworkState::InReach { id, points }
                } else {
                    points.push(parse_centerline_point(text, number)?);
                    NetworkState::InCenterline { id, points }
                }
            }
        };
    }

    match state {
        NetworkState::Outside => Ok(reaches),
        _ => Err(HecrasError::Truncated {
            line: opened,
            marker: BEGIN_STREAM_NETWORK,
        }),
    }
}

pub fn read_stream_network(path: &Path) -> Result<Vec<CenterlineReach>> {
    let file = File::open(path)?;
    parse_stream_network(BufReader::new(file))
}
