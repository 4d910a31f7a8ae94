pub mod ascii_grid;
pub mod csv;
pub mod netcdf;
