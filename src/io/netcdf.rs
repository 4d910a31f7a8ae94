use crate::elevation::ElevationGrid;
use crate::error::{HecrasError, Result};
use netcdf::{AttributeValue, Variable};
use std::path::Path;

const X_NAMES: [&str; 3] = ["x", "lon", "longitude"];
const Y_NAMES: [&str; 3] = ["y", "lat", "latitude"];

fn read_axis(file: &netcdf::File, names: &[&str]) -> Result<Vec<f64>> {
    let var = names
        .iter()
        .find_map(|name| file.variable(name))
        .ok_or_else(|| {
            HecrasError::Geometry(format!("no coordinate variable named any of {:?}", names))
        })?;
    let values: Vec<f64> = var.get_values::<f64, _>(..)?;
    if values.len() < 2 {
        return Err(HecrasError::Geometry(format!(
            "coordinate variable {} needs at least two values",
            var.name()
        )));
    }
    Ok(values)
}

fn fill_value(var: &Variable) -> Option<f64> {
    match var.attribute("_FillValue")?.value().ok()? {
        AttributeValue::Double(v) => Some(v),
        AttributeValue::Float(v) => Some(f64::from(v)),
        AttributeValue::Int(v) => Some(f64::from(v)),
        AttributeValue::Short(v) => Some(f64::from(v)),
        _ => None,
    }
}

// Function to read a DEM stored as a 2-D (y, x) variable with cell-center axes
pub fn read_elevation_grid(path: &Path, variable: &str) -> Result<ElevationGrid> {
    let file = netcdf::open(path)?;

    let xs = read_axis(&file, &X_NAMES)?;
    let ys = read_axis(&file, &Y_NAMES)?;

    let var = file.variable(variable).ok_or_else(|| {
        HecrasError::Geometry(format!("no elevation variable '{}' in {:?}", variable, path))
    })?;
    let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
    if shape != [ys.len(), xs.len()] {
        return Err(HecrasError::Geometry(format!(
            "elevation variable '{}' has shape {:?}, expected [{}, {}]",
            variable,
            shape,
            ys.len(),
            xs.len()
        )));
    }
    let mut values: Vec<f64> = var.get_values::<f64, _>(..)?;
    let nodata = fill_value(&var);

    let cell_size = (xs[1] - xs[0]).abs();
    let west = xs[0].min(xs[xs.len() - 1]) - cell_size / 2.0;

    // Rows are stored south to north when the y axis ascends
    let ascending = ys[1] > ys[0];
    if ascending {
        let cols = xs.len();
        let rows: Vec<Vec<f64>> = values.chunks(cols).rev().map(|r| r.to_vec()).collect();
        values = rows.concat();
    }
    let north = ys[0].max(ys[ys.len() - 1]) + cell_size / 2.0;

    ElevationGrid::new(west, north, cell_size, ys.len(), xs.len(), values, nodata)
}
