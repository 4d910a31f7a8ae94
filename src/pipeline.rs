use crate::config::{ColumnConfig, LineEnding, RunContext, SynthesisParams, Units};
use crate::elevation::ElevationSampler;
use crate::error::{HecrasError, Result};
use crate::ids::{EndpointId, StationId};
use crate::intersect::{IntersectionFinder, extract_intersections};
use crate::io;
use crate::network::{derive_network, load_network, store_network};
use crate::polygon::{BoundaryRing, close_extents};
use crate::sdf::writer::{
    CrossSectionRecord, EndpointRecord, Header, ReachRecord, StreamNetworkBlock,
};
use crate::sdf::{SdfWriter, apply_line_ending, read_stream_network, read_survey};
use crate::stations::{Station, plan_network};
use crate::xsections::{
    BankSide, CrossSection, OffsetPlacer, ResolvedPoint, assemble, parameterize, resolve_params,
    resolve_stations,
};
use crate::workspace::{GeometryKind, Workspace};
use geo_types::{Coord, LineString};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct SynthesisJob {
    pub input: String,
    pub network: String,
    pub stations: String,
    pub xsections: String,
    pub intersects: String,
    pub params: SynthesisParams,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthesisSummary {
    pub stations: usize,
    pub xsections: usize,
    pub intersections: usize,
}

fn column_value(column: &HashMap<u64, f64>, cat: u64, name: &str, layer: &str) -> Result<f64> {
    column.get(&cat).copied().ok_or_else(|| {
        HecrasError::Geometry(format!(
            "feature {} of layer <{}> has no '{}' attribute",
            cat, layer, name
        ))
    })
}

fn write_stations(
    ws: &Workspace,
    layer: &str,
    stations: &[Station],
    columns: &ColumnConfig,
) -> Result<()> {
    ws.create_layer(layer, GeometryKind::Point, true)?;
    for station in stations {
        let cat = station.id.composite();
        ws.put_feature(layer, cat, &[station.position])?;
        ws.set_attribute(layer, cat, &columns.x, station.position.x)?;
        ws.set_attribute(layer, cat, &columns.y, station.position.y)?;
        ws.set_attribute(layer, cat, &columns.reach_id, f64::from(station.id.reach))?;
        ws.set_attribute(layer, cat, &columns.distance, station.distance)?;
    }
    Ok(())
}

fn write_resolved_points(
    ws: &Workspace,
    layer: &str,
    points: &[ResolvedPoint],
    columns: &ColumnConfig,
) -> Result<()> {
    for (i, p) in points.iter().enumerate() {
        let cat = i as u64 + 1;
        ws.put_feature(layer, cat, &[p.position])?;
        ws.set_attribute(layer, cat, &columns.line, p.line as f64)?;
        ws.set_attribute(layer, cat, &columns.ordinal, f64::from(p.side.ordinal()))?;
        ws.set_attribute(layer, cat, &columns.station_id, p.station.composite() as f64)?;
    }
    Ok(())
}

// Rebuild resolved points from the store using their explicit ordinals
fn read_resolved_points(
    ws: &Workspace,
    layer: &str,
    columns: &ColumnConfig,
) -> Result<Vec<ResolvedPoint>> {
    let lines = ws.attribute_column(layer, &columns.line)?;
    let ordinals = ws.attribute_column(layer, &columns.ordinal)?;
    let stations = ws.attribute_column(layer, &columns.station_id)?;

    ws.features(layer)?
        .into_iter()
        .map(|f| {
            let ordinal = column_value(&ordinals, f.cat, &columns.ordinal, layer)?;
            let side = BankSide::from_ordinal(ordinal as u8).ok_or_else(|| {
                HecrasError::Geometry(format!("invalid vertex ordinal {}", ordinal))
            })?;
            Ok(ResolvedPoint {
                line: column_value(&lines, f.cat, &columns.line, layer)? as u64,
                station: StationId::from_composite(
                    column_value(&stations, f.cat, &columns.station_id, layer)? as u64,
                )?,
                side,
                position: f.coords[0],
            })
        })
        .collect()
}

fn write_cross_sections(
    ws: &Workspace,
    layer: &str,
    sections: &[CrossSection],
    columns: &ColumnConfig,
) -> Result<()> {
    ws.create_layer(layer, GeometryKind::Line, true)?;
    for section in sections {
        ws.put_feature(layer, section.line, &section.vertices)?;
        ws.set_attribute(layer, section.line, &columns.reach, f64::from(section.reach()))?;
        ws.set_attribute(
            layer,
            section.line,
            &columns.station_id,
            section.station.composite() as f64,
        )?;
    }
    Ok(())
}

/// Builds the stations, cross-sections and intersections layers from a
/// river network layer.
pub fn run_synthesis(
    ws: &Workspace,
    ctx: &RunContext,
    job: &SynthesisJob,
    placer: &dyn OffsetPlacer,
    finder: &dyn IntersectionFinder,
    columns: &ColumnConfig,
) -> Result<SynthesisSummary> {
    let network = derive_network(
        ws,
        &job.input,
        &job.network,
        job.params.smoothing.as_ref(),
    )?;

    // every reach passes the station limit before anything is written
    let marks = plan_network(&network.reaches, job.params.spacing)?;
    let stations = resolve_stations(&network.reaches, &marks, placer)?;
    {
        let tx = ws.transaction()?;
        store_network(ws, &network, columns)?;
        write_stations(ws, &job.stations, &stations, columns)?;
        tx.commit()?;
    }
    log::info!("Created {} stations", stations.len());

    let params = parameterize(&marks, job.params.half_width());
    let resolved = resolve_params(&network.reaches, &params, placer)?;
    let sections = {
        let scratch = ws.scratch_layer(ctx, "tmp_pairs", GeometryKind::Point)?;
        write_resolved_points(ws, scratch.name(), &resolved, columns)?;
        assemble(read_resolved_points(ws, scratch.name(), columns)?)?
    };
    {
        let tx = ws.transaction()?;
        write_cross_sections(ws, &job.xsections, &sections, columns)?;
        tx.commit()?;
    }
    log::info!("Created {} cross sections", sections.len());

    let report = extract_intersections(finder, &sections)?;
    ws.create_layer(&job.intersects, GeometryKind::Point, true)?;
    for (i, point) in report.points.iter().enumerate() {
        ws.put_feature(&job.intersects, i as u64 + 1, &[*point])?;
    }
    log::info!("Found {} intersection points", report.count());

    Ok(SynthesisSummary {
        stations: stations.len(),
        xsections: sections.len(),
        intersections: report.count(),
    })
}

#[derive(Debug, Clone)]
pub struct ExportJob {
    pub river: String,
    pub stations: String,
    pub xsections: String,
    pub output: PathBuf,
    pub resolution: Option<f64>,
    pub line_ending: LineEnding,
}

/// Appends `.sdf` unless the name already carries that extension.
pub fn sdf_path(output: &Path) -> PathBuf {
    match output.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("sdf") => output.to_path_buf(),
        _ => {
            let mut name = output.as_os_str().to_owned();
            name.push(".sdf");
            PathBuf::from(name)
        }
    }
}

fn load_stations(
    ws: &Workspace,
    layer: &str,
    columns: &ColumnConfig,
) -> Result<BTreeMap<u32, Vec<Station>>> {
    let distances = ws.attribute_column(layer, &columns.distance)?;
    let mut by_reach: BTreeMap<u32, Vec<Station>> = BTreeMap::new();
    for feature in ws.features(layer)? {
        let id = StationId::from_composite(feature.cat)?;
        by_reach.entry(id.reach).or_default().push(Station {
            id,
            distance: column_value(&distances, feature.cat, &columns.distance, layer)?,
            position: feature.coords[0],
        });
    }
    Ok(by_reach)
}

fn load_cross_sections(
    ws: &Workspace,
    layer: &str,
    columns: &ColumnConfig,
) -> Result<Vec<(u32, StationId, Vec<Coord<f64>>)>> {
    let reaches = ws.attribute_column(layer, &columns.reach)?;
    let stations = ws.attribute_column(layer, &columns.station_id)?;
    let mut sections = Vec::new();
    for feature in ws.features(layer)? {
        let reach = column_value(&reaches, feature.cat, &columns.reach, layer)? as u32;
        let station = StationId::from_composite(
            column_value(&stations, feature.cat, &columns.station_id, layer)? as u64,
        )?;
        sections.push((reach, station, feature.coords));
    }
    sections.sort_by_key(|(reach, station, _)| (*reach, *station));
    Ok(sections)
}

/// Renders the whole interchange document for the given layers.
pub fn render_document(
    ws: &Workspace,
    sampler: &dyn ElevationSampler,
    job: &ExportJob,
    columns: &ColumnConfig,
) -> Result<String> {
    ws.require_layer(&job.river, GeometryKind::Line)?;
    ws.require_layer(&job.stations, GeometryKind::Point)?;
    ws.require_layer(&job.xsections, GeometryKind::Line)?;

    let resolution = job.resolution.unwrap_or_else(|| sampler.native_resolution());
    if !(resolution > 0.0) {
        return Err(HecrasError::InvalidConfig(format!(
            "profile resolution must be positive, got {}",
            resolution
        )));
    }

    let network = load_network(ws, &job.river)?;
    let extent = ws
        .extent(&job.river)?
        .ok_or_else(|| HecrasError::LayerNotFound(job.river.clone()))?;
    let sections = load_cross_sections(ws, &job.xsections, columns)?;

    let header = Header {
        created: chrono::Local::now().date_naive(),
        producer: format!("{} version {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        units: Units::from_label(ws.units()?.as_deref()),
        stream_layer: job.river.clone(),
        xsection_layer: job.xsections.clone(),
        extent,
        reach_count: network.reaches.len(),
        xsection_count: sections.len(),
    };

    let mut writer = SdfWriter::new(Vec::new());
    writer.write_header(&header)?;
    log::info!("Headers written");

    let mut stations = load_stations(ws, &job.stations, columns)?;
    let mut endpoints = Vec::with_capacity(network.reaches.len() * 2);
    let mut reaches = Vec::with_capacity(network.reaches.len());
    for reach in &network.reaches {
        let (from, to) = (EndpointId::start(reach.id), EndpointId::end(reach.id));
        endpoints.push(EndpointRecord {
            id: from,
            position: reach.start(),
            elevation: sampler.elevation_at(reach.start())?,
        });
        endpoints.push(EndpointRecord {
            id: to,
            position: reach.end(),
            elevation: sampler.elevation_at(reach.end())?,
        });
        reaches.push(ReachRecord {
            reach_id: reach.id,
            from,
            to,
            stations: stations.remove(&reach.id).unwrap_or_default(),
        });
    }
    writer.write_stream_network(&StreamNetworkBlock {
        stream_id: job.river.clone(),
        endpoints,
        reaches,
    })?;
    log::info!("River network written");

    let pb = ProgressBar::new(sections.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} cross sections ({eta})")
            .map_err(|e| HecrasError::InvalidConfig(e.to_string()))?
            .progress_chars("#>-"),
    );

    writer.begin_cross_sections()?;
    for (reach_id, station, cutline) in sections {
        log::debug!("Processing reach: {} at station id: {}", reach_id, station);
        let surface = sampler.profile(&cutline, resolution)?;
        writer.write_cross_section(
            &job.river,
            &CrossSectionRecord {
                reach_id,
                station,
                cutline,
                surface,
            },
        )?;
        pb.inc(1);
    }
    writer.end_cross_sections()?;
    pb.finish_and_clear();
    log::info!("Cross sections written");

    String::from_utf8(writer.into_inner())
        .map_err(|e| HecrasError::Geometry(format!("document is not valid UTF-8: {}", e)))
}

pub fn run_export(
    ws: &Workspace,
    sampler: &dyn ElevationSampler,
    job: &ExportJob,
    columns: &ColumnConfig,
) -> Result<PathBuf> {
    let path = sdf_path(&job.output);
    let text = render_document(ws, sampler, job, columns)?;
    std::fs::write(&path, apply_line_ending(&text, job.line_ending).as_bytes())?;
    log::info!("Interchange document written to {:?}", path);
    Ok(path)
}

/// Loads a river network from a `reach_id,x,y` CSV or from the stream
/// network block of an interchange document.
pub fn run_network_import(
    ws: &Workspace,
    input: &Path,
    output: &str,
    units: Option<&str>,
) -> Result<usize> {
    let is_sdf = input
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("sdf"));

    let reaches: BTreeMap<u32, Vec<Coord<f64>>> = if is_sdf {
        read_stream_network(input)?
            .into_iter()
            .map(|r| (r.reach_id, r.points.into_iter().map(|p| p.position).collect()))
            .collect()
    } else {
        io::csv::read_reach_file(input)?
    };

    let tx = ws.transaction()?;
    ws.create_layer(output, GeometryKind::Line, true)?;
    for (id, coords) in &reaches {
        if coords.len() < 2 {
            return Err(HecrasError::Geometry(format!(
                "reach {} has fewer than two vertices",
                id
            )));
        }
        ws.put_feature(output, u64::from(*id), coords)?;
    }
    if let Some(units) = units {
        ws.set_units(units)?;
    }
    tx.commit()?;

    log::info!("Imported {} reaches into <{}>", reaches.len(), output);
    Ok(reaches.len())
}

/// Builds the water-surface polygon from the extents of a survey document.
pub fn run_water_surface_import(
    ws: &Workspace,
    input: &Path,
    output: &str,
    columns: &ColumnConfig,
) -> Result<BoundaryRing> {
    let survey = read_survey(input)?;
    let ring = close_extents(&survey.extents)?;

    let tx = ws.transaction()?;
    ws.create_layer(output, GeometryKind::Boundary, true)?;
    ws.put_feature(output, 1, &ring.vertices)?;
    ws.set_attribute(output, 1, &columns.area, ring.area())?;
    if let Some(centroid) = ring.centroid() {
        ws.set_attribute(output, 1, &columns.centroid_x, centroid.x)?;
        ws.set_attribute(output, 1, &columns.centroid_y, centroid.y)?;
    }
    tx.commit()?;

    log::info!("Polygon layer <{}> has been created", output);
    Ok(ring)
}

/// Places left and right bank points along every cutline of a survey document.
pub fn run_bank_import(
    ws: &Workspace,
    input: &Path,
    output: &str,
    placer: &dyn OffsetPlacer,
    columns: &ColumnConfig,
) -> Result<usize> {
    let survey = read_survey(input)?;
    let banks = survey.banks()?;

    let tx = ws.transaction()?;
    ws.create_layer(output, GeometryKind::Point, true)?;
    let mut cat = 0u64;
    for (i, (cutline, positions)) in banks.iter().enumerate() {
        let line = LineString::from(cutline.vertices.to_vec());
        let length = crate::network::polyline_length(&line.0);
        for (bank, fraction) in [(1.0, positions.left), (2.0, positions.right)] {
            cat += 1;
            let point = placer.place(&line, fraction * length, 0.0)?;
            ws.put_feature(output, cat, &[point])?;
            ws.set_attribute(output, cat, &columns.cutline, (i + 1) as f64)?;
            ws.set_attribute(output, cat, &columns.bank, bank)?;
            ws.set_attribute(output, cat, &columns.fraction, fraction)?;
        }
    }
    tx.commit()?;

    log::info!("Created {} bank points in <{}>", cat, output);
    Ok(cat as usize)
}

pub fn run_layer_export(ws: &Workspace, layer: &str, output: &Path) -> Result<usize> {
    if ws.layer_kind(layer)?.is_none() {
        return Err(HecrasError::LayerNotFound(layer.to_string()));
    }
    let features = ws.features(layer)?;
    let file = std::fs::File::create(output)?;
    io::csv::write_features(std::io::BufWriter::new(file), &features)?;
    Ok(features.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elevation::ElevationGrid;
    use crate::intersect::PairwiseIntersections;
    use crate::xsections::LinearReferencer;
    use approx::assert_relative_eq;
    use geo_types::coord;
    use std::io::Write;

    fn river_workspace() -> Workspace {
        let ws = Workspace::open_in_memory().unwrap();
        ws.create_layer("rivers", GeometryKind::Line, false).unwrap();
        ws.put_feature(
            "rivers",
            1,
            &[coord! { x: 0.0, y: 0.0 }, coord! { x: 250.0, y: 0.0 }],
        )
        .unwrap();
        ws.set_units("metres").unwrap();
        ws
    }

    fn job(spacing: f64, width: f64) -> SynthesisJob {
        SynthesisJob {
            input: "rivers".to_string(),
            network: "river_network".to_string(),
            stations: "stations".to_string(),
            xsections: "xsections".to_string(),
            intersects: "intersects".to_string(),
            params: SynthesisParams::new(spacing, width, false, None, None).unwrap(),
        }
    }

    fn synthesize(ws: &Workspace) -> SynthesisSummary {
        run_synthesis(
            ws,
            &RunContext::new(),
            &job(100.0, 20.0),
            &LinearReferencer,
            &PairwiseIntersections,
            &ColumnConfig::new(),
        )
        .unwrap()
    }

    // flat 5 m grid covering the river corridor
    fn dem() -> ElevationGrid {
        let (rows, cols) = (10, 60);
        ElevationGrid::new(-10.0, 25.0, 5.0, rows, cols, vec![42.0; rows * cols], None).unwrap()
    }

    #[test]
    fn synthesis_end_to_end() {
        let ws = river_workspace();
        let summary = synthesize(&ws);
        assert_eq!(
            summary,
            SynthesisSummary {
                stations: 3,
                xsections: 3,
                intersections: 0
            }
        );

        let stations = ws.features("stations").unwrap();
        let ids: Vec<u64> = stations.iter().map(|f| f.cat).collect();
        assert_eq!(ids, vec![1001, 1002, 1003]);
        assert_eq!(ws.attribute("stations", 1003, "distance").unwrap(), Some(200.0));
        assert_eq!(ws.attribute("stations", 1002, "reach_id").unwrap(), Some(1.0));

        let sections = ws.features("xsections").unwrap();
        assert_eq!(sections.len(), 3);
        for (section, x) in sections.iter().zip([0.0, 100.0, 200.0]) {
            let offsets: Vec<f64> = section.coords.iter().map(|c| -c.y).collect();
            assert_eq!(offsets, vec![-10.0, 0.0, 10.0]);
            assert!(section.coords.iter().all(|c| c.x == x));
        }
        assert_eq!(ws.attribute("river_network", 1, "reach_len").unwrap(), Some(250.0));
        assert_eq!(ws.attribute("rivers", 1, "reach_len").unwrap(), None);
    }

    #[test]
    fn scratch_layer_does_not_survive_a_run() {
        let ws = river_workspace();
        let ctx = RunContext::new();
        run_synthesis(
            &ws,
            &ctx,
            &job(100.0, 20.0),
            &LinearReferencer,
            &PairwiseIntersections,
            &ColumnConfig::new(),
        )
        .unwrap();
        let scratch = ctx.scratch_name("tmp_pairs");
        assert_eq!(ws.layer_kind(&scratch).unwrap(), None);
        assert_eq!(ws.feature_count(&scratch).unwrap(), 0);
        assert_eq!(ws.layer_kind("intersects").unwrap(), Some(GeometryKind::Point));
    }

    #[test]
    fn station_limit_stops_synthesis() {
        let ws = river_workspace();
        let result = run_synthesis(
            &ws,
            &RunContext::new(),
            &job(0.1, 20.0),
            &LinearReferencer,
            &PairwiseIntersections,
            &ColumnConfig::new(),
        );
        assert!(matches!(result, Err(HecrasError::StationLimit { reach: 1, .. })));
        assert_eq!(ws.layer_kind("stations").unwrap(), None);
        assert_eq!(ws.layer_kind("river_network").unwrap(), None);
    }

    #[test]
    fn station_limit_leaves_no_smoothed_layer() {
        let ws = river_workspace();
        let mut job = job(1e-17, 20.0);
        job.params =
            SynthesisParams::new(1e-17, 20.0, true, Some("smooth".to_string()), Some(2)).unwrap();
        let result = run_synthesis(
            &ws,
            &RunContext::new(),
            &job,
            &LinearReferencer,
            &PairwiseIntersections,
            &ColumnConfig::new(),
        );
        assert!(matches!(result, Err(HecrasError::StationLimit { reach: 1, .. })));
        assert_eq!(ws.layer_kind("smooth").unwrap(), None);
        assert_eq!(ws.attribute("rivers", 1, "reach_len").unwrap(), None);
    }

    #[test]
    fn converging_reaches_report_intersections() {
        let ws = Workspace::open_in_memory().unwrap();
        ws.create_layer("rivers", GeometryKind::Line, false).unwrap();
        ws.put_feature(
            "rivers",
            1,
            &[coord! { x: 0.0, y: 0.0 }, coord! { x: 100.0, y: 0.0 }],
        )
        .unwrap();
        ws.put_feature(
            "rivers",
            2,
            &[coord! { x: 5.0, y: 0.0 }, coord! { x: 5.0, y: 100.0 }],
        )
        .unwrap();
        let summary = synthesize(&ws);
        assert!(summary.intersections > 0);
        assert_eq!(
            ws.feature_count("intersects").unwrap(),
            summary.intersections
        );
    }

    #[test]
    fn export_writes_conformant_document() {
        let ws = river_workspace();
        synthesize(&ws);
        let dir = tempfile::tempdir().unwrap();
        let job = ExportJob {
            river: "rivers".to_string(),
            stations: "stations".to_string(),
            xsections: "xsections".to_string(),
            output: dir.path().join("model"),
            resolution: Some(10.0),
            line_ending: LineEnding::CrLf,
        };
        let path = run_export(&ws, &dem(), &job, &ColumnConfig::new()).unwrap();
        assert_eq!(path, dir.path().join("model.sdf"));

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("BEGIN HEADER:\r\n UNITS: METRIC\r\n"));
        assert!(text.contains(" NUMBER OF REACHES: 1\r\n NUMBER OF CROSS-SECTIONS: 3\r\n"));
        assert!(text.contains(" ENDPOINT: 0,0,42,11\r\n ENDPOINT: 250,0,42,12\r\n"));
        assert!(text.contains("\t0,0,NULL,1001\r\n\t100,0,NULL,1002\r\n\t200,0,NULL,1003\r\n"));
        assert!(text.contains("   STATION: 1002\r\n   CUTLINE:\r\n\t 100,10\r\n\t 100,0\r\n\t 100,-10\r\n"));
        assert!(text.contains("\t 100,10,42\r\n\t 100,0,42\r\n\t 100,-10,42\r\n"));
        assert!(!text.replace("\r\n", "").contains('\n'));

        let reaches = read_stream_network(&path).unwrap();
        let xs: Vec<f64> = reaches[0].points.iter().map(|p| p.position.x).collect();
        assert_eq!(xs, vec![0.0, 100.0, 200.0]);
    }

    #[test]
    fn missing_layer_fails_export() {
        let ws = river_workspace();
        let job = ExportJob {
            river: "rivers".to_string(),
            stations: "stations".to_string(),
            xsections: "xsections".to_string(),
            output: PathBuf::from("unused.sdf"),
            resolution: None,
            line_ending: LineEnding::Lf,
        };
        assert!(matches!(
            render_document(&ws, &dem(), &job, &ColumnConfig::new()),
            Err(HecrasError::LayerNotFound(_))
        ));
    }

    #[test]
    fn output_extension_is_implied() {
        assert_eq!(sdf_path(Path::new("out")), PathBuf::from("out.sdf"));
        assert_eq!(sdf_path(Path::new("out.SDF")), PathBuf::from("out.SDF"));
        assert_eq!(sdf_path(Path::new("out.txt")), PathBuf::from("out.txt.sdf"));
    }

    fn survey_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn water_surface_polygon_import() {
        let ws = Workspace::open_in_memory().unwrap();
        let file = survey_file(
            "WATER SURFACE EXTENTS:\n 0, 0, 10, 0\nWATER SURFACE EXTENTS:\n 0, 1, 10, 1\n",
        );
        let ring =
            run_water_surface_import(&ws, file.path(), "surface", &ColumnConfig::new()).unwrap();
        assert_eq!(ring.vertices.len(), 5);
        let stored = ws.features("surface").unwrap();
        assert_eq!(stored[0].coords, ring.vertices);
        assert_eq!(ws.attribute("surface", 1, "area").unwrap(), Some(10.0));
    }

    #[test]
    fn bank_points_along_cutlines() {
        let ws = Workspace::open_in_memory().unwrap();
        let file = survey_file(
            "CUT LINE:\n0,10\n0,0\n0,-10\nBANK POSITIONS: 0.25, 0.75\n",
        );
        let count = run_bank_import(
            &ws,
            file.path(),
            "banks",
            &LinearReferencer,
            &ColumnConfig::new(),
        )
        .unwrap();
        assert_eq!(count, 2);
        let points = ws.features("banks").unwrap();
        assert_relative_eq!(points[0].coords[0].y, 5.0);
        assert_relative_eq!(points[1].coords[0].y, -5.0);
        assert_eq!(ws.attribute("banks", 2, "bank").unwrap(), Some(2.0));
    }

    #[test]
    fn malformed_bank_survey_produces_no_output() {
        let ws = Workspace::open_in_memory().unwrap();
        let file = survey_file("CUT LINE:\n0,10\n0,0\n0,-10\nEND:\n");
        let result = run_bank_import(
            &ws,
            file.path(),
            "banks",
            &LinearReferencer,
            &ColumnConfig::new(),
        );
        assert!(matches!(
            result,
            Err(HecrasError::MissingBankPositions { line: 1 })
        ));
        assert_eq!(ws.layer_kind("banks").unwrap(), None);
    }

    #[test]
    fn network_import_from_csv_and_sdf() {
        let ws = Workspace::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("rivers.csv");
        std::fs::write(&csv_path, "reach_id,x,y\n1,0,0\n1,250,0\n").unwrap();
        assert_eq!(
            run_network_import(&ws, &csv_path, "rivers", Some("metres")).unwrap(),
            1
        );
        synthesize(&ws);

        let job = ExportJob {
            river: "rivers".to_string(),
            stations: "stations".to_string(),
            xsections: "xsections".to_string(),
            output: dir.path().join("model.sdf"),
            resolution: None,
            line_ending: LineEnding::Lf,
        };
        let path = run_export(&ws, &dem(), &job, &ColumnConfig::new()).unwrap();
        assert_eq!(run_network_import(&ws, &path, "reimported", None).unwrap(), 1);
        let line = &ws.features("reimported").unwrap()[0].coords;
        assert_eq!(line.len(), 3);
        assert_eq!(line[2], coord! { x: 200.0, y: 0.0 });
    }

    #[test]
    fn layer_export_to_csv() {
        let ws = river_workspace();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rivers.csv");
        assert_eq!(run_layer_export(&ws, "rivers", &path).unwrap(), 1);
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "cat,ord,x,y\n1,0,0.0,0.0\n1,1,250.0,0.0\n");
    }
}
