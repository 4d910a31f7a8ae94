use crate::error::{HecrasError, Result};
use std::fmt;

/// Highest per-reach sequence number that fits the 3-digit station suffix.
pub const MAX_STATIONS_PER_REACH: u32 = 999;

const SUFFIX_BASE: u64 = 1000;

/// Station identifier kept as a genuine `(reach, sequence)` pair.
///
/// The concatenated decimal form (`reach` followed by a zero-padded 3-digit
/// sequence) only exists at the storage and file boundary, through
/// [`StationId::composite`] and `Display`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StationId {
    pub reach: u32,
    pub seq: u32,
}

impl StationId {
    pub fn new(reach: u32, seq: u32) -> Result<Self> {
        if seq == 0 || seq > MAX_STATIONS_PER_REACH {
            return Err(HecrasError::StationLimit {
                reach,
                requested: u64::from(seq),
            });
        }
        Ok(StationId { reach, seq })
    }

    pub fn composite(&self) -> u64 {
        u64::from(self.reach) * SUFFIX_BASE + u64::from(self.seq)
    }

    pub fn from_composite(composite: u64) -> Result<Self> {
        let reach = u32::try_from(reach_of(composite)).map_err(|_| {
            HecrasError::Geometry(format!("station id {} is out of range", composite))
        })?;
        StationId::new(reach, (composite % SUFFIX_BASE) as u32)
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.reach, self.seq)
    }
}

/// Recovers the owning reach from a numeric composite station id.
pub fn reach_of(composite: u64) -> u64 {
    composite / SUFFIX_BASE
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    Start,
    End,
}

// Stream-network endpoint ids use a single literal suffix digit and are a
// separate scheme from station ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointId {
    pub reach: u32,
    pub kind: EndpointKind,
}

impl EndpointId {
    pub fn start(reach: u32) -> Self {
        EndpointId {
            reach,
            kind: EndpointKind::Start,
        }
    }

    pub fn end(reach: u32) -> Self {
        EndpointId {
            reach,
            kind: EndpointKind::End,
        }
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = match self.kind {
            EndpointKind::Start => 1,
            EndpointKind::End => 2,
        };
        write!(f, "{}{}", self.reach, suffix)
    }
}
