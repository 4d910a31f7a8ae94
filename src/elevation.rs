use crate::error::{HecrasError, Result};
use crate::io;
use crate::network::polyline_length;
use crate::xsections::{LinearReferencer, OffsetPlacer};
use geo_types::{Coord, LineString};
use std::path::Path;

// Upper bound on the samples taken along one profile path
pub const MAX_PROFILE_SAMPLES: usize = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfilePoint {
    pub position: Coord<f64>,
    pub distance: f64,
    pub elevation: Option<f64>,
}

/// Raster sampling service: elevation at a point or along a path.
pub trait ElevationSampler {
    fn elevation_at(&self, at: Coord<f64>) -> Result<Option<f64>>;

    fn profile(&self, path: &[Coord<f64>], resolution: f64) -> Result<Vec<ProfilePoint>>;

    fn native_resolution(&self) -> f64;
}

// North-up regular grid, row 0 is the northern edge
#[derive(Debug, Clone)]
pub struct ElevationGrid {
    pub west: f64,
    pub north: f64,
    pub cell_size: f64,
    pub rows: usize,
    pub cols: usize,
    pub nodata: Option<f64>,
    values: Vec<f64>,
}

impl ElevationGrid {
    pub fn new(
        west: f64,
        north: f64,
        cell_size: f64,
        rows: usize,
        cols: usize,
        values: Vec<f64>,
        nodata: Option<f64>,
    ) -> Result<Self> {
        if !(cell_size > 0.0) {
            return Err(HecrasError::Geometry(format!(
                "raster cell size must be positive, got {}",
                cell_size
            )));
        }
        if values.len() != rows * cols {
            return Err(HecrasError::CountMismatch {
                what: "raster cells and values",
                left: rows * cols,
                right: values.len(),
            });
        }
        Ok(ElevationGrid {
            west,
            north,
            cell_size,
            rows,
            cols,
            nodata,
            values,
        })
    }

    pub fn east(&self) -> f64 {
        self.west + self.cols as f64 * self.cell_size
    }

    pub fn south(&self) -> f64 {
        self.north - self.rows as f64 * self.cell_size
    }

    fn cell_of(&self, at: Coord<f64>) -> Option<(usize, usize)> {
        let col = ((at.x - self.west) / self.cell_size).floor();
        let row = ((self.north - at.y) / self.cell_size).floor();
        if col < 0.0 || row < 0.0 || col >= self.cols as f64 || row >= self.rows as f64 {
            return None;
        }
        Some((row as usize, col as usize))
    }

    pub fn value(&self, row: usize, col: usize) -> Option<f64> {
        let v = *self.values.get(row * self.cols + col)?;
        if v.is_nan() || self.nodata == Some(v) {
            None
        } else {
            Some(v)
        }
    }
}

impl ElevationSampler for ElevationGrid {
    fn elevation_at(&self, at: Coord<f64>) -> Result<Option<f64>> {
        Ok(self.cell_of(at).and_then(|(row, col)| self.value(row, col)))
    }

    /// Samples every `resolution` units along the whole path, always ending
    /// on its last vertex.
    fn profile(&self, path: &[Coord<f64>], resolution: f64) -> Result<Vec<ProfilePoint>> {
        if !(resolution > 0.0) || !resolution.is_finite() {
            return Err(HecrasError::InvalidConfig(format!(
                "profile resolution must be positive, got {}",
                resolution
            )));
        }
        let Some(&last) = path.last() else {
            return Ok(Vec::new());
        };

        let total = polyline_length(path);
        if total == 0.0 {
            return Ok(vec![ProfilePoint {
                position: last,
                distance: 0.0,
                elevation: self.elevation_at(last)?,
            }]);
        }

        let span = (total / resolution).floor();
        if span >= MAX_PROFILE_SAMPLES as f64 {
            return Err(HecrasError::InvalidConfig(format!(
                "resolution {} needs more than {} samples along a path of length {}",
                resolution, MAX_PROFILE_SAMPLES, total
            )));
        }
        let steps = span as usize;
        let line = LineString::from(path.to_vec());
        let mut points = Vec::with_capacity(steps + 2);
        for k in 0..=steps {
            let distance = (k as f64 * resolution).min(total);
            let position = LinearReferencer.place(&line, distance, 0.0)?;
            points.push(ProfilePoint {
                position,
                distance,
                elevation: self.elevation_at(position)?,
            });
        }
        if total - steps as f64 * resolution > total * 1e-12 {
            points.push(ProfilePoint {
                position: last,
                distance: total,
                elevation: self.elevation_at(last)?,
            });
        }
        Ok(points)
    }

    fn native_resolution(&self) -> f64 {
        self.cell_size
    }
}

/// Loads a DEM: `.nc` files through NetCDF, anything else as an ESRI ASCII grid.
pub fn load_elevation(path: &Path, variable: &str) -> Result<ElevationGrid> {
    let is_netcdf = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("nc"));
    let grid = if is_netcdf {
        io::netcdf::read_elevation_grid(path, variable)?
    } else {
        io::ascii_grid::read_ascii_grid(path)?
    };
    log::info!(
        "Loaded elevation raster {:?}: {} rows x {} cols, cell size {}, extent [{}, {}] x [{}, {}]",
        path,
        grid.rows,
        grid.cols,
        grid.cell_size,
        grid.west,
        grid.east(),
        grid.south(),
        grid.north
    );
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo_types::coord;

    // 3x4 grid of 10 unit cells, value = row * 10 + col
    fn grid() -> ElevationGrid {
        let values = (0..3)
            .flat_map(|r| (0..4).map(move |c| (r * 10 + c) as f64))
            .collect();
        ElevationGrid::new(0.0, 30.0, 10.0, 3, 4, values, Some(-9999.0)).unwrap()
    }

    #[test]
    fn nearest_cell_lookup() {
        let g = grid();
        assert_eq!(g.elevation_at(coord! { x: 5.0, y: 25.0 }).unwrap(), Some(0.0));
        assert_eq!(g.elevation_at(coord! { x: 35.0, y: 1.0 }).unwrap(), Some(23.0));
        assert_eq!(g.elevation_at(coord! { x: 41.0, y: 1.0 }).unwrap(), None);
        assert_eq!(g.south(), 0.0);
        assert_eq!(g.east(), 40.0);
    }

    #[test]
    fn nodata_is_none() {
        let g = ElevationGrid::new(0.0, 10.0, 10.0, 1, 1, vec![-9999.0], Some(-9999.0)).unwrap();
        assert_eq!(g.elevation_at(coord! { x: 5.0, y: 5.0 }).unwrap(), None);
    }

    #[test]
    fn profile_steps_and_ends_on_last_vertex() {
        let g = grid();
        let path = [
            coord! { x: 1.0, y: 15.0 },
            coord! { x: 11.0, y: 15.0 },
            coord! { x: 26.0, y: 15.0 },
        ];
        let profile = g.profile(&path, 10.0).unwrap();
        let distances: Vec<f64> = profile.iter().map(|p| p.distance).collect();
        assert_eq!(distances, vec![0.0, 10.0, 20.0, 25.0]);
        assert_relative_eq!(profile[3].position.x, 26.0);
        assert_eq!(profile[0].elevation, Some(10.0));
        assert_eq!(profile[3].elevation, Some(12.0));
    }

    #[test]
    fn bad_resolution_is_rejected() {
        assert!(grid().profile(&[coord! { x: 0.0, y: 0.0 }], 0.0).is_err());
    }

    #[test]
    fn tiny_resolution_is_rejected() {
        let path = [coord! { x: 1.0, y: 15.0 }, coord! { x: 11.0, y: 15.0 }];
        assert!(matches!(
            grid().profile(&path, 1e-300),
            Err(HecrasError::InvalidConfig(_))
        ));
        assert!(matches!(
            grid().profile(&path, 1e-6),
            Err(HecrasError::InvalidConfig(_))
        ));
        assert_eq!(grid().profile(&path, 0.5).unwrap().len(), 21);
    }

    #[test]
    fn value_count_must_match_shape() {
        assert!(ElevationGrid::new(0.0, 0.0, 1.0, 2, 2, vec![1.0], None).is_err());
    }
}
