use crate::error::{HecrasError, Result};
use crate::workspace::Feature;
use csv::{ReaderBuilder, WriterBuilder};
use geo_types::Coord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::Path;

// One river vertex; rows of a reach are in upstream-to-downstream order
#[derive(Debug, Deserialize)]
struct VertexRow {
    reach_id: u32,
    x: f64,
    y: f64,
}

#[derive(Debug, Serialize)]
struct FeatureRow {
    cat: u64,
    ord: usize,
    x: f64,
    y: f64,
}

/// Reads `reach_id,x,y` rows into one vertex list per reach. Vertex order is
/// the row order within each reach.
pub fn read_reach_vertices<R: Read>(input: R) -> Result<BTreeMap<u32, Vec<Coord<f64>>>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(b',')
        .trim(csv::Trim::All)
        .from_reader(input);

    let mut reaches: BTreeMap<u32, Vec<Coord<f64>>> = BTreeMap::new();
    for result in rdr.deserialize() {
        let row: VertexRow = result?;
        if row.reach_id == 0 {
            return Err(HecrasError::Geometry(
                "reach ids must be positive integers".to_string(),
            ));
        }
        reaches
            .entry(row.reach_id)
            .or_default()
            .push(Coord { x: row.x, y: row.y });
    }
    Ok(reaches)
}

pub fn read_reach_file(path: &Path) -> Result<BTreeMap<u32, Vec<Coord<f64>>>> {
    let file = std::fs::File::open(path)?;
    read_reach_vertices(std::io::BufReader::new(file))
}

// Write features as cat,ord,x,y rows
pub fn write_features<W: Write>(output: W, features: &[Feature]) -> Result<()> {
    let mut wtr = WriterBuilder::new().has_headers(true).from_writer(output);
    for feature in features {
        for (ord, c) in feature.coords.iter().enumerate() {
            wtr.serialize(FeatureRow {
                cat: feature.cat,
                ord,
                x: c.x,
                y: c.y,
            })?;
        }
    }
    wtr.flush()?;
    Ok(())
}
