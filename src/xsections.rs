use crate::error::{HecrasError, Result};
use crate::ids::StationId;
use crate::network::{Reach, polyline_length};
use crate::stations::{Station, StationMark};
use geo_types::{Coord, LineString};
use std::collections::{BTreeMap, HashMap};

/// Position of a cross-section vertex, with its explicit ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BankSide {
    Left = 1,
    Center = 2,
    Right = 3,
}

impl BankSide {
    pub const ALL: [BankSide; 3] = [BankSide::Left, BankSide::Center, BankSide::Right];

    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        match ordinal {
            1 => Some(BankSide::Left),
            2 => Some(BankSide::Center),
            3 => Some(BankSide::Right),
            _ => None,
        }
    }

    fn index(self) -> usize {
        self.ordinal() as usize - 1
    }
}

// (distance, lateral offset) request for the offset primitive
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffsetParam {
    pub line: u64,
    pub station: StationId,
    pub side: BankSide,
    pub distance: f64,
    pub offset: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedPoint {
    pub line: u64,
    pub station: StationId,
    pub side: BankSide,
    pub position: Coord<f64>,
}

/// Transverse 3-vertex line anchored at one station, ordered left, center, right.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossSection {
    pub line: u64,
    pub station: StationId,
    pub vertices: [Coord<f64>; 3],
}

impl CrossSection {
    pub fn reach(&self) -> u32 {
        self.station.reach
    }

    pub fn left(&self) -> Coord<f64> {
        self.vertices[BankSide::Left.index()]
    }

    pub fn center(&self) -> Coord<f64> {
        self.vertices[BankSide::Center.index()]
    }

    pub fn right(&self) -> Coord<f64> {
        self.vertices[BankSide::Right.index()]
    }

    pub fn to_line_string(&self) -> LineString<f64> {
        LineString::from(vec![self.left(), self.center(), self.right()])
    }
}

/// Places a point at `distance` along a line, `offset` units to its side.
///
/// Positive offsets fall to the right of the direction of travel, negative
/// offsets to the left.
pub trait OffsetPlacer {
    fn place(&self, line: &LineString<f64>, distance: f64, offset: f64) -> Result<Coord<f64>>;
}

// Linear referencing over the straight segments of a polyline
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearReferencer;

impl LinearReferencer {
    const TOLERANCE: f64 = 1e-9;

    fn offset_point(a: Coord<f64>, b: Coord<f64>, t: f64, offset: f64) -> Coord<f64> {
        let (dx, dy) = (b.x - a.x, b.y - a.y);
        let len = dx.hypot(dy);
        let (ux, uy) = (dx / len, dy / len);
        Coord {
            x: a.x + t * dx + offset * uy,
            y: a.y + t * dy - offset * ux,
        }
    }
}

impl OffsetPlacer for LinearReferencer {
    fn place(&self, line: &LineString<f64>, distance: f64, offset: f64) -> Result<Coord<f64>> {
        let total = polyline_length(&line.0);
        let tolerance = Self::TOLERANCE * total.max(1.0);
        if !distance.is_finite() || distance < -tolerance || distance > total + tolerance {
            return Err(HecrasError::Geometry(format!(
                "distance {} is outside the line (length {})",
                distance, total
            )));
        }
        let d = distance.clamp(0.0, total);

        let mut walked = 0.0;
        let mut last_segment = None;
        for w in line.0.windows(2) {
            let (a, b) = (w[0], w[1]);
            let seg = (b.x - a.x).hypot(b.y - a.y);
            if seg == 0.0 {
                continue;
            }
            if d < walked + seg {
                return Ok(Self::offset_point(a, b, (d - walked) / seg, offset));
            }
            walked += seg;
            last_segment = Some((a, b));
        }

        match last_segment {
            Some((a, b)) => Ok(Self::offset_point(a, b, 1.0, offset)),
            None => Err(HecrasError::Geometry(
                "cannot place a point on a zero-length line".to_string(),
            )),
        }
    }
}

/// Emits the left, center and right parameter triple for every station.
/// Line ids are assigned sequentially from 1 in station order.
pub fn parameterize(marks: &[StationMark], half_width: f64) -> Vec<OffsetParam> {
    let mut params = Vec::with_capacity(marks.len() * 3);
    for (i, mark) in marks.iter().enumerate() {
        let line = i as u64 + 1;
        for side in BankSide::ALL {
            let offset = match side {
                BankSide::Left => -half_width,
                BankSide::Center => 0.0,
                BankSide::Right => half_width,
            };
            params.push(OffsetParam {
                line,
                station: mark.id,
                side,
                distance: mark.distance,
                offset,
            });
        }
    }
    params
}

fn reach_lookup(reaches: &[Reach]) -> HashMap<u32, &Reach> {
    reaches.iter().map(|r| (r.id, r)).collect()
}

fn owning_reach<'a>(lookup: &HashMap<u32, &'a Reach>, station: StationId) -> Result<&'a Reach> {
    lookup.get(&station.reach).copied().ok_or_else(|| {
        HecrasError::Geometry(format!(
            "station {} refers to unknown reach {}",
            station, station.reach
        ))
    })
}

pub fn resolve_stations(
    reaches: &[Reach],
    marks: &[StationMark],
    placer: &dyn OffsetPlacer,
) -> Result<Vec<Station>> {
    let lookup = reach_lookup(reaches);
    marks
        .iter()
        .map(|mark| {
            let reach = owning_reach(&lookup, mark.id)?;
            Ok(Station {
                id: mark.id,
                distance: mark.distance,
                position: placer.place(&reach.line, mark.distance, 0.0)?,
            })
        })
        .collect()
}

pub fn resolve_params(
    reaches: &[Reach],
    params: &[OffsetParam],
    placer: &dyn OffsetPlacer,
) -> Result<Vec<ResolvedPoint>> {
    let lookup = reach_lookup(reaches);
    params
        .iter()
        .map(|p| {
            let reach = owning_reach(&lookup, p.station)?;
            Ok(ResolvedPoint {
                line: p.line,
                station: p.station,
                side: p.side,
                position: placer.place(&reach.line, p.distance, p.offset)?,
            })
        })
        .collect()
}

/// Regroups resolved points into cross-section lines by line id.
///
/// Vertices are slotted by their ordinal, so input order is irrelevant. A
/// line with a missing or repeated ordinal, or with points from different
/// stations, is rejected.
pub fn assemble(points: impl IntoIterator<Item = ResolvedPoint>) -> Result<Vec<CrossSection>> {
    let mut lines: BTreeMap<u64, (StationId, [Option<Coord<f64>>; 3])> = BTreeMap::new();

    for p in points {
        let (station, slots) = lines.entry(p.line).or_insert((p.station, [None; 3]));
        if *station != p.station {
            return Err(HecrasError::Geometry(format!(
                "cross section {} mixes stations {} and {}",
                p.line, station, p.station
            )));
        }
        let slot = &mut slots[p.side.index()];
        if slot.is_some() {
            return Err(HecrasError::Geometry(format!(
                "cross section {} has more than one {:?} vertex",
                p.line, p.side
            )));
        }
        *slot = Some(p.position);
    }

    lines
        .into_iter()
        .map(|(line, (station, slots))| match slots {
            [Some(left), Some(center), Some(right)] => Ok(CrossSection {
                line,
                station,
                vertices: [left, center, right],
            }),
            _ => Err(HecrasError::Geometry(format!(
                "cross section {} is missing a vertex",
                line
            ))),
        })
        .collect()
}
