use crate::error::{HecrasError, Result};
use crate::ids::{MAX_STATIONS_PER_REACH, StationId};
use crate::network::Reach;
use geo_types::Coord;

// A station before its coordinate is resolved
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StationMark {
    pub id: StationId,
    pub distance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Station {
    pub id: StationId,
    pub distance: f64,
    pub position: Coord<f64>,
}

/// Number of stations a reach of `length` gets at `spacing`: one at the
/// upstream start plus one per whole spacing that fits.
pub fn station_count(length: f64, spacing: f64) -> Result<u64> {
    if !spacing.is_finite() || spacing <= 0.0 {
        return Err(HecrasError::InvalidConfig(format!(
            "spacing must be a positive number, got {}",
            spacing
        )));
    }
    if !length.is_finite() || length < 0.0 {
        return Err(HecrasError::Geometry(format!(
            "reach length must be a non-negative number, got {}",
            length
        )));
    }
    // saturates, so an oversized request still exceeds the station limit
    Ok(((length / spacing).floor() as u64).saturating_add(1))
}

/// Places stations at `0, S, 2S, ...` up to and including the reach length.
pub fn plan_stations(reach_id: u32, length: f64, spacing: f64) -> Result<Vec<StationMark>> {
    let count = station_count(length, spacing)?;
    if count > u64::from(MAX_STATIONS_PER_REACH) {
        return Err(HecrasError::StationLimit {
            reach: reach_id,
            requested: count,
        });
    }

    (0..count)
        .map(|k| {
            Ok(StationMark {
                id: StationId::new(reach_id, k as u32 + 1)?,
                distance: (k as f64 * spacing).min(length),
            })
        })
        .collect()
}

/// Plans stations for every reach, checking the per-reach limit on all
/// reaches before returning any of them.
pub fn plan_network(reaches: &[Reach], spacing: f64) -> Result<Vec<StationMark>> {
    for reach in reaches {
        let count = station_count(reach.length, spacing)?;
        if count > u64::from(MAX_STATIONS_PER_REACH) {
            return Err(HecrasError::StationLimit {
                reach: reach.id,
                requested: count,
            });
        }
    }

    let mut marks = Vec::new();
    for reach in reaches {
        marks.extend(plan_stations(reach.id, reach.length, spacing)?);
    }
    Ok(marks)
}
