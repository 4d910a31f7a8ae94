use anyhow::{Context, Result};

mod cli;
mod config;
mod elevation;
mod error;
mod ids;
mod intersect;
mod io;
mod network;
mod pipeline;
mod polygon;
mod sdf;
mod stations;
mod workspace;
mod xsections;

use cli::{Command, get_args};
use config::{ColumnConfig, LineEnding, RunContext, SynthesisParams};
use intersect::PairwiseIntersections;
use pipeline::{ExportJob, SynthesisJob};
use workspace::Workspace;
use xsections::LinearReferencer;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = get_args();
    let ctx = RunContext::new();
    let columns = ColumnConfig::new();

    let ws = Workspace::open(&args.workspace)
        .with_context(|| format!("Failed to open workspace: {:?}", args.workspace))?;

    match args.command {
        Command::ImportNetwork {
            input,
            output,
            units,
        } => {
            pipeline::run_network_import(&ws, &input, &output, units.as_deref())
                .with_context(|| format!("Failed to import river network from {:?}", input))?;
        }
        Command::Xsections {
            input,
            network,
            xsections,
            stations,
            intersects,
            spacing,
            width,
            smooth,
            smooth_river,
            threshold,
        } => {
            let params = SynthesisParams::new(spacing, width, smooth, smooth_river, threshold)?;
            let job = SynthesisJob {
                input,
                network,
                stations,
                xsections,
                intersects,
                params,
            };
            let summary = pipeline::run_synthesis(
                &ws,
                &ctx,
                &job,
                &LinearReferencer,
                &PairwiseIntersections,
                &columns,
            )
            .context("Cross section synthesis failed")?;
            if summary.intersections > 0 {
                log::warn!(
                    "{} cross section intersections written to <{}>, consider a narrower width",
                    summary.intersections,
                    job.intersects
                );
            }
        }
        Command::ExportSdf {
            river,
            xsections,
            stations,
            elevation,
            elevation_var,
            resolution,
            output,
            unix_newlines,
        } => {
            let dem = elevation::load_elevation(&elevation, &elevation_var)
                .with_context(|| format!("Failed to load elevation raster: {:?}", elevation))?;
            let job = ExportJob {
                river,
                stations,
                xsections,
                output,
                resolution,
                line_ending: LineEnding::from_unix_flag(unix_newlines),
            };
            pipeline::run_export(&ws, &dem, &job, &columns)
                .with_context(|| format!("Failed to write {:?}", job.output))?;
        }
        Command::ImportWaterSurface {
            input,
            output,
            ascii,
        } => {
            let ring = pipeline::run_water_surface_import(&ws, &input, &output, &columns)
                .with_context(|| format!("Failed to read water surface extents from {:?}", input))?;
            if let Some(path) = ascii {
                std::fs::write(&path, sdf::render_boundary(&ring))
                    .with_context(|| format!("Failed to write boundary file: {:?}", path))?;
            }
        }
        Command::ImportBanks { input, output } => {
            pipeline::run_bank_import(&ws, &input, &output, &LinearReferencer, &columns)
                .with_context(|| format!("Failed to read bank positions from {:?}", input))?;
        }
        Command::ExportLayer { layer, output } => {
            let count = pipeline::run_layer_export(&ws, &layer, &output)
                .with_context(|| format!("Failed to export layer <{}>", layer))?;
            log::info!("{} features written to {:?}", count, output);
        }
    }

    log::info!("Done");
    Ok(())
}
