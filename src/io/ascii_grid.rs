use crate::elevation::ElevationGrid;
use crate::error::{HecrasError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

#[derive(Debug, Default)]
struct GridHeader {
    cols: Option<usize>,
    rows: Option<usize>,
    xll: Option<(f64, bool)>,
    yll: Option<(f64, bool)>,
    cell_size: Option<f64>,
    nodata: Option<f64>,
}

fn header_value<T: std::str::FromStr>(value: &str, line: usize) -> Result<T> {
    value.parse::<T>().map_err(|_| HecrasError::BadField {
        line,
        message: format!("invalid grid header value '{}'", value),
    })
}

/// Parses an ESRI ASCII grid (`ncols`, `nrows`, `xllcorner`/`xllcenter`,
/// `yllcorner`/`yllcenter`, `cellsize`, optional `nodata_value`).
pub fn parse_ascii_grid<R: BufRead>(reader: R) -> Result<ElevationGrid> {
    let mut header = GridHeader::default();
    let mut values = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let number = idx + 1;
        let mut tokens = line.split_whitespace();
        let Some(first) = tokens.next() else {
            continue;
        };

        let key = first.to_ascii_lowercase();
        if key.starts_with(|c: char| c.is_ascii_alphabetic()) {
            let value = tokens.next().ok_or_else(|| HecrasError::BadField {
                line: number,
                message: format!("grid header '{}' has no value", first),
            })?;
            match key.as_str() {
                "ncols" => header.cols = Some(header_value(value, number)?),
                "nrows" => header.rows = Some(header_value(value, number)?),
                "xllcorner" => header.xll = Some((header_value(value, number)?, false)),
                "xllcenter" => header.xll = Some((header_value(value, number)?, true)),
                "yllcorner" => header.yll = Some((header_value(value, number)?, false)),
                "yllcenter" => header.yll = Some((header_value(value, number)?, true)),
                "cellsize" => header.cell_size = Some(header_value(value, number)?),
                "nodata_value" => header.nodata = Some(header_value(value, number)?),
                _ => {
                    return Err(HecrasError::BadField {
                        line: number,
                        message: format!("unknown grid header '{}'", first),
                    });
                }
            }
            continue;
        }

        for token in std::iter::once(first).chain(tokens) {
            values.push(header_value::<f64>(token, number)?);
        }
    }

    let missing = |name: &str| HecrasError::BadField {
        line: 0,
        message: format!("grid header '{}' is missing", name),
    };
    let cols = header.cols.ok_or_else(|| missing("ncols"))?;
    let rows = header.rows.ok_or_else(|| missing("nrows"))?;
    let cell_size = header.cell_size.ok_or_else(|| missing("cellsize"))?;
    let (xll, x_center) = header.xll.ok_or_else(|| missing("xllcorner"))?;
    let (yll, y_center) = header.yll.ok_or_else(|| missing("yllcorner"))?;

    let west = if x_center { xll - cell_size / 2.0 } else { xll };
    let south = if y_center { yll - cell_size / 2.0 } else { yll };
    let north = south + rows as f64 * cell_size;

    ElevationGrid::new(west, north, cell_size, rows, cols, values, header.nodata)
}

pub fn read_ascii_grid(path: &Path) -> Result<ElevationGrid> {
    let file = File::open(path)?;
    parse_ascii_grid(BufReader::new(file))
}
