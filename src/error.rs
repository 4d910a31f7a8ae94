use thiserror::Error;

// Error taxonomy shared by the codec, the synthesis steps and the store
#[derive(Debug, Error)]
pub enum HecrasError {
    #[error("line {line}: CUT LINE block is not followed by a BANK POSITIONS line")]
    MissingBankPositions { line: usize },

    #[error("input ends inside a {marker} block opened on line {line}")]
    Truncated { line: usize, marker: &'static str },

    #[error("line {line}: {message}")]
    BadField { line: usize, message: String },

    #[error("number of {what} does not match: {left} vs {right}")]
    CountMismatch {
        what: &'static str,
        left: usize,
        right: usize,
    },

    #[error("no water surface extents found in input")]
    EmptySurvey,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("reach {reach} would need {requested} stations, the limit is 999 per reach")]
    StationLimit { reach: u32, requested: u64 },

    #[error("vector layer <{0}> not found in workspace")]
    LayerNotFound(String),

    #[error("geometry error: {0}")]
    Geometry(String),

    #[error("workspace store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("netcdf error: {0}")]
    NetCdf(#[from] netcdf::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, HecrasError>;
