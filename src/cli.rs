use clap::{Parser, Subcommand, command};
use std::path::PathBuf;

/// Build HEC-RAS river geometry from vector layers and read survey data back
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Workspace database holding the vector layers
    #[arg(short, long, global = true, default_value = "workspace.db")]
    pub workspace: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load a river network from a reach_id,x,y CSV or an SDF stream network
    ImportNetwork {
        input: PathBuf,

        /// Name of the river line layer to create
        #[arg(short, long)]
        output: String,

        /// Linear unit label of the coordinates (metres, feet)
        #[arg(long)]
        units: Option<String>,
    },

    /// Create stations, cross sections and their intersections
    Xsections {
        /// River network line layer
        #[arg(short, long)]
        input: String,

        /// Working copy of the river network that receives the reach columns
        #[arg(long, default_value = "river_network")]
        network: String,

        /// Output cross section line layer
        #[arg(long, default_value = "xsections")]
        xsections: String,

        /// Output station point layer
        #[arg(long, default_value = "stations")]
        stations: String,

        /// Output layer of cross section intersection points
        #[arg(long, default_value = "intersects")]
        intersects: String,

        /// Distance between stations along a reach
        #[arg(long, default_value_t = 100.0)]
        spacing: f64,

        /// Total cross section width
        #[arg(long, default_value_t = 200.0)]
        width: f64,

        /// Smooth the river network before placing stations
        #[arg(short, long)]
        smooth: bool,

        /// Name of the smoothed river layer
        #[arg(long, requires = "smooth")]
        smooth_river: Option<String>,

        /// Number of smoothing passes
        #[arg(long, requires = "smooth")]
        threshold: Option<usize>,
    },

    /// Write the HEC-RAS spatial data file
    ExportSdf {
        /// River network line layer
        #[arg(short, long)]
        river: String,

        #[arg(long, default_value = "xsections")]
        xsections: String,

        #[arg(long, default_value = "stations")]
        stations: String,

        /// Elevation raster (NetCDF .nc or ESRI ASCII grid)
        #[arg(short, long)]
        elevation: PathBuf,

        /// Elevation variable name inside a NetCDF raster
        #[arg(long, default_value = "elevation")]
        elevation_var: String,

        /// Profile sampling step, defaults to the raster cell size
        #[arg(long)]
        resolution: Option<f64>,

        /// Output file, `.sdf` is appended when missing
        #[arg(short, long)]
        output: PathBuf,

        /// Use LF instead of CR-LF line endings
        #[arg(short, long)]
        unix_newlines: bool,
    },

    /// Build the water surface polygon from a RAS survey export
    ImportWaterSurface {
        input: PathBuf,

        #[arg(short, long)]
        output: String,

        /// Also write the ring as a standard ASCII vector boundary
        #[arg(long)]
        ascii: Option<PathBuf>,
    },

    /// Place bank points along the cut lines of a RAS survey export
    ImportBanks {
        input: PathBuf,

        #[arg(short, long)]
        output: String,
    },

    /// Dump a layer as cat,ord,x,y rows
    ExportLayer {
        layer: String,

        #[arg(short, long)]
        output: PathBuf,
    },
}

pub fn get_args() -> Args {
    Args::parse()
}
