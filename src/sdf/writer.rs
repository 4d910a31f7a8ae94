use crate::config::{LineEnding, Units};
use crate::elevation::ProfilePoint;
use crate::ids::{EndpointId, StationId};
use crate::polygon::BoundaryRing;
use crate::stations::Station;
use crate::workspace::Extent;
use chrono::NaiveDate;
use geo_types::Coord;
use std::borrow::Cow;
use std::fmt::Write as _;
use std::io::{self, Write};

// Header block contents
#[derive(Debug, Clone)]
pub struct Header {
    pub created: NaiveDate,
    pub producer: String,
    pub units: Units,
    pub stream_layer: String,
    pub xsection_layer: String,
    pub extent: Extent,
    pub reach_count: usize,
    pub xsection_count: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct EndpointRecord {
    pub id: EndpointId,
    pub position: Coord<f64>,
    pub elevation: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct ReachRecord {
    pub reach_id: u32,
    pub from: EndpointId,
    pub to: EndpointId,
    pub stations: Vec<Station>,
}

#[derive(Debug, Clone)]
pub struct StreamNetworkBlock {
    pub stream_id: String,
    pub endpoints: Vec<EndpointRecord>,
    pub reaches: Vec<ReachRecord>,
}

#[derive(Debug, Clone)]
pub struct CrossSectionRecord {
    pub reach_id: u32,
    pub station: StationId,
    pub cutline: Vec<Coord<f64>>,
    pub surface: Vec<ProfilePoint>,
}

fn elevation_text(elevation: Option<f64>) -> String {
    match elevation {
        Some(z) => z.to_string(),
        None => "NULL".to_string(),
    }
}

/// Renders interchange documents with `\n` terminators; see
/// [`apply_line_ending`] for the final terminator pass.
pub struct SdfWriter<W: Write> {
    out: W,
}

impl<W: Write> SdfWriter<W> {
    pub fn new(out: W) -> Self {
        SdfWriter { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn write_header(&mut self, header: &Header) -> io::Result<()> {
        let out = &mut self.out;
        writeln!(out, "# RAS geometry file create on: {}", header.created)?;
        writeln!(out, "# exported from {}", header.producer)?;
        writeln!(out)?;
        writeln!(out, "BEGIN HEADER:")?;
        writeln!(out, " UNITS: {}", header.units.header_label())?;
        writeln!(out, " DTM TYPE: GRID")?;
        writeln!(out, " STREAM LAYER: {}", header.stream_layer)?;
        writeln!(out, " CROSS-SECTION LAYER: {}", header.xsection_layer)?;
        writeln!(out, " BEGIN SPATIALEXTENT: ")?;
        writeln!(out, "   Xmin: {}", header.extent.west)?;
        writeln!(out, "   Xmax: {}", header.extent.east)?;
        writeln!(out, "   Ymin: {}", header.extent.south)?;
        writeln!(out, "   Ymax: {}", header.extent.north)?;
        writeln!(out, " END SPATIALEXTENT: ")?;
        writeln!(out, " NUMBER OF REACHES: {}", header.reach_count)?;
        writeln!(out, " NUMBER OF CROSS-SECTIONS: {}", header.xsection_count)?;
        writeln!(out, "END HEADER:")?;
        writeln!(out)?;
        Ok(())
    }

    /// Writes all endpoints, then one REACH paragraph per reach with its
    /// centerline ordered upstream to downstream by along-reach distance.
    pub fn write_stream_network(&mut self, block: &StreamNetworkBlock) -> io::Result<()> {
        let out = &mut self.out;
        writeln!(out, "BEGIN STREAM NETWORK:")?;
        for endpoint in &block.endpoints {
            writeln!(
                out,
                " ENDPOINT: {},{},{},{}",
                endpoint.position.x,
                endpoint.position.y,
                elevation_text(endpoint.elevation),
                endpoint.id
            )?;
        }

        for reach in &block.reaches {
            writeln!(out, " REACH:")?;
            writeln!(out, "   STREAM ID: {}", block.stream_id)?;
            writeln!(out, "   REACH ID: {}", reach.reach_id)?;
            writeln!(out, "   FROM POINT: {}", reach.from)?;
            writeln!(out, "   TO POINT: {}", reach.to)?;
            writeln!(out, "   CENTERLINE:")?;

            let mut stations: Vec<&Station> = reach.stations.iter().collect();
            stations.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.id.cmp(&b.id)));
            for station in stations {
                writeln!(
                    out,
                    "\t{},{},NULL,{}",
                    station.position.x, station.position.y, station.id
                )?;
            }
            writeln!(out, " END:")?;
        }

        writeln!(out, "END STREAM NETWORK:")?;
        writeln!(out)?;
        Ok(())
    }

    pub fn begin_cross_sections(&mut self) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "BEGIN CROSS-SECTIONS:")
    }

    pub fn write_cross_section(
        &mut self,
        stream_id: &str,
        record: &CrossSectionRecord,
    ) -> io::Result<()> {
        let out = &mut self.out;
        writeln!(out, " CROSS-SECTION:")?;
        writeln!(out, "   STREAM ID: {}", stream_id)?;
        writeln!(out, "   REACH ID: {}", record.reach_id)?;
        writeln!(out, "   STATION: {}", record.station)?;
        writeln!(out, "   CUTLINE:")?;
        for c in &record.cutline {
            writeln!(out, "\t {},{}", c.x, c.y)?;
        }
        writeln!(out, "   SURFACE LINE:")?;
        for p in &record.surface {
            writeln!(
                out,
                "\t {},{},{}",
                p.position.x,
                p.position.y,
                elevation_text(p.elevation)
            )?;
        }
        writeln!(out, " END:")?;
        writeln!(out)?;
        Ok(())
    }

    pub fn end_cross_sections(&mut self) -> io::Result<()> {
        writeln!(self.out, "END CROSS-SECTIONS:")?;
        writeln!(self.out)
    }
}

/// Standard-ASCII vector boundary block for a closed water-surface ring.
pub fn render_boundary(ring: &BoundaryRing) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "VERTI:");
    let _ = writeln!(text, "B {}", ring.vertices.len());
    for v in &ring.vertices {
        let _ = writeln!(text, " {} {}", v.x, v.y);
    }
    text
}

/// Final terminator pass: rewrites `\n` to `\r\n` for CR-LF consumers.
pub fn apply_line_ending(text: &str, ending: LineEnding) -> Cow<'_, str> {
    match ending {
        LineEnding::Lf => Cow::Borrowed(text),
        LineEnding::CrLf => Cow::Owned(text.replace('\n', "\r\n")),
    }
}
