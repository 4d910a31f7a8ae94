use crate::config::RunContext;
use crate::error::{HecrasError, Result};
use geo_types::Coord;
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use std::collections::HashMap;
use std::path::Path;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS layers (
        name TEXT PRIMARY KEY,
        kind TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS vertices (
        layer TEXT NOT NULL,
        cat INTEGER NOT NULL,
        ord INTEGER NOT NULL,
        x REAL NOT NULL,
        y REAL NOT NULL,
        PRIMARY KEY (layer, cat, ord)
    );
    CREATE TABLE IF NOT EXISTS attributes (
        layer TEXT NOT NULL,
        cat INTEGER NOT NULL,
        name TEXT NOT NULL,
        value REAL,
        PRIMARY KEY (layer, cat, name)
    );
    CREATE TABLE IF NOT EXISTS metadata (
        key TEXT PRIMARY KEY,
        value TEXT
    );
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    Point,
    Line,
    Boundary,
}

impl GeometryKind {
    fn as_str(&self) -> &'static str {
        match self {
            GeometryKind::Point => "point",
            GeometryKind::Line => "line",
            GeometryKind::Boundary => "boundary",
        }
    }

    fn parse(kind: &str) -> Option<Self> {
        match kind {
            "point" => Some(GeometryKind::Point),
            "line" => Some(GeometryKind::Line),
            "boundary" => Some(GeometryKind::Boundary),
            _ => None,
        }
    }
}

// One stored feature; vertices are in `ord` order
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub cat: u64,
    pub coords: Vec<Coord<f64>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub west: f64,
    pub east: f64,
    pub south: f64,
    pub north: f64,
}

/// SQLite-backed vector layer store.
///
/// A layer is a named set of features keyed by category number. Every vertex
/// row carries its ordinal so geometry is always rebuilt by explicit sort,
/// never by retrieval order.
pub struct Workspace {
    conn: Connection,
}

impl Workspace {
    pub fn open(path: &Path) -> Result<Self> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Workspace { conn })
    }

    /// Starts a transaction on the shared connection; statements issued
    /// through `self` join it until it is committed or dropped.
    pub fn transaction(&self) -> Result<Transaction<'_>> {
        Ok(self.conn.unchecked_transaction()?)
    }

    pub fn create_layer(&self, name: &str, kind: GeometryKind, overwrite: bool) -> Result<()> {
        if self.layer_kind(name)?.is_some() {
            if !overwrite {
                return Err(HecrasError::InvalidConfig(format!(
                    "vector layer <{}> already exists",
                    name
                )));
            }
            self.remove_layer(name)?;
        }
        self.conn.execute(
            "INSERT INTO layers (name, kind) VALUES (?1, ?2)",
            params![name, kind.as_str()],
        )?;
        Ok(())
    }

    pub fn layer_kind(&self, name: &str) -> Result<Option<GeometryKind>> {
        let kind: Option<String> = self
            .conn
            .query_row("SELECT kind FROM layers WHERE name = ?1", [name], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(kind.as_deref().and_then(GeometryKind::parse))
    }

    pub fn require_layer(&self, name: &str, kind: GeometryKind) -> Result<()> {
        match self.layer_kind(name)? {
            Some(found) if found == kind => Ok(()),
            Some(found) => Err(HecrasError::InvalidConfig(format!(
                "vector layer <{}> holds {} features, expected {}",
                name,
                found.as_str(),
                kind.as_str()
            ))),
            None => Err(HecrasError::LayerNotFound(name.to_string())),
        }
    }

    pub fn remove_layer(&self, name: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM vertices WHERE layer = ?1", [name])?;
        self.conn
            .execute("DELETE FROM attributes WHERE layer = ?1", [name])?;
        self.conn.execute("DELETE FROM layers WHERE name = ?1", [name])?;
        Ok(())
    }

    pub fn copy_layer(&self, from: &str, to: &str) -> Result<()> {
        let kind = self
            .layer_kind(from)?
            .ok_or_else(|| HecrasError::LayerNotFound(from.to_string()))?;
        self.create_layer(to, kind, true)?;
        self.conn.execute(
            "INSERT INTO vertices (layer, cat, ord, x, y)
             SELECT ?2, cat, ord, x, y FROM vertices WHERE layer = ?1",
            params![from, to],
        )?;
        self.conn.execute(
            "INSERT INTO attributes (layer, cat, name, value)
             SELECT ?2, cat, name, value FROM attributes WHERE layer = ?1",
            params![from, to],
        )?;
        Ok(())
    }

    pub fn put_feature(&self, layer: &str, cat: u64, coords: &[Coord<f64>]) -> Result<()> {
        if coords.is_empty() {
            return Err(HecrasError::Geometry(format!(
                "feature {} of layer <{}> has no vertices",
                cat, layer
            )));
        }
        self.conn.execute(
            "DELETE FROM vertices WHERE layer = ?1 AND cat = ?2",
            params![layer, cat as i64],
        )?;
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO vertices (layer, cat, ord, x, y) VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for (ord, c) in coords.iter().enumerate() {
            stmt.execute(params![layer, cat as i64, ord as i64, c.x, c.y])?;
        }
        Ok(())
    }

    pub fn set_attribute(&self, layer: &str, cat: u64, name: &str, value: f64) -> Result<()> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT OR REPLACE INTO attributes (layer, cat, name, value) VALUES (?1, ?2, ?3, ?4)",
        )?;
        stmt.execute(params![layer, cat as i64, name, value])?;
        Ok(())
    }

    pub fn features(&self, layer: &str) -> Result<Vec<Feature>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT cat, ord, x, y FROM vertices WHERE layer = ?1 ORDER BY cat, ord",
        )?;
        let rows = stmt.query_map([layer], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, f64>(3)?,
            ))
        })?;

        let mut features: Vec<Feature> = Vec::new();
        for row in rows {
            let (cat, _ord, x, y) = row?;
            let cat = cat as u64;
            match features.last_mut() {
                Some(feature) if feature.cat == cat => feature.coords.push(Coord { x, y }),
                _ => features.push(Feature {
                    cat,
                    coords: vec![Coord { x, y }],
                }),
            }
        }
        Ok(features)
    }

    #[cfg(test)]
    pub fn attribute(&self, layer: &str, cat: u64, name: &str) -> Result<Option<f64>> {
        let value: Option<Option<f64>> = self
            .conn
            .query_row(
                "SELECT value FROM attributes WHERE layer = ?1 AND cat = ?2 AND name = ?3",
                params![layer, cat as i64, name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.flatten())
    }

    pub fn attribute_column(&self, layer: &str, name: &str) -> Result<HashMap<u64, f64>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT cat, value FROM attributes WHERE layer = ?1 AND name = ?2 AND value IS NOT NULL",
        )?;
        let rows = stmt.query_map(params![layer, name], |row| {
            Ok((row.get::<_, i64>(0)? as u64, row.get::<_, f64>(1)?))
        })?;
        let mut column = HashMap::new();
        for row in rows {
            let (cat, value) = row?;
            column.insert(cat, value);
        }
        Ok(column)
    }

    #[cfg(test)]
    pub fn feature_count(&self, layer: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(DISTINCT cat) FROM vertices WHERE layer = ?1",
            [layer],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn extent(&self, layer: &str) -> Result<Option<Extent>> {
        let bounds = self.conn.query_row(
            "SELECT MIN(x), MAX(x), MIN(y), MAX(y) FROM vertices WHERE layer = ?1",
            [layer],
            |row| {
                Ok((
                    row.get::<_, Option<f64>>(0)?,
                    row.get::<_, Option<f64>>(1)?,
                    row.get::<_, Option<f64>>(2)?,
                    row.get::<_, Option<f64>>(3)?,
                ))
            },
        )?;
        Ok(match bounds {
            (Some(west), Some(east), Some(south), Some(north)) => Some(Extent {
                west,
                east,
                south,
                north,
            }),
            _ => None,
        })
    }

    pub fn units(&self) -> Result<Option<String>> {
        let units: Option<Option<String>> = self
            .conn
            .query_row("SELECT value FROM metadata WHERE key = 'units'", [], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(units.flatten())
    }

    pub fn set_units(&self, units: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES ('units', ?1)",
            [units],
        )?;
        Ok(())
    }

    /// Creates a temporary layer that is removed when the guard is dropped.
    pub fn scratch_layer(
        &self,
        ctx: &RunContext,
        prefix: &str,
        kind: GeometryKind,
    ) -> Result<ScratchLayer<'_>> {
        let name = ctx.scratch_name(prefix);
        self.create_layer(&name, kind, true)?;
        Ok(ScratchLayer {
            workspace: self,
            name,
        })
    }
}

pub struct ScratchLayer<'a> {
    workspace: &'a Workspace,
    name: String,
}

impl ScratchLayer<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for ScratchLayer<'_> {
    fn drop(&mut self) {
        log::debug!("Removing scratch layer <{}>", self.name);
        if let Err(e) = self.workspace.remove_layer(&self.name) {
            log::warn!("Failed to remove scratch layer <{}>: {}", self.name, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::coord;

    #[test]
    fn features_come_back_in_vertex_order() {
        let ws = Workspace::open_in_memory().unwrap();
        ws.create_layer("rivers", GeometryKind::Line, false).unwrap();
        let line = vec![
            coord! { x: 0.0, y: 0.0 },
            coord! { x: 5.0, y: 1.0 },
            coord! { x: 9.0, y: -2.0 },
        ];
        ws.put_feature("rivers", 2, &line).unwrap();
        ws.put_feature("rivers", 1, &line[..2]).unwrap();

        let features = ws.features("rivers").unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].cat, 1);
        assert_eq!(features[1].coords, line);
        assert_eq!(ws.feature_count("rivers").unwrap(), 2);

        let extent = ws.extent("rivers").unwrap().unwrap();
        assert_eq!(extent.west, 0.0);
        assert_eq!(extent.east, 9.0);
        assert_eq!(extent.south, -2.0);
        assert_eq!(extent.north, 1.0);
    }

    #[test]
    fn missing_layer_is_reported() {
        let ws = Workspace::open_in_memory().unwrap();
        assert!(matches!(
            ws.require_layer("nope", GeometryKind::Point),
            Err(HecrasError::LayerNotFound(_))
        ));
    }

    #[test]
    fn existing_layer_needs_overwrite() {
        let ws = Workspace::open_in_memory().unwrap();
        ws.create_layer("a", GeometryKind::Point, false).unwrap();
        assert!(ws.create_layer("a", GeometryKind::Point, false).is_err());
        ws.create_layer("a", GeometryKind::Line, true).unwrap();
        assert_eq!(ws.layer_kind("a").unwrap(), Some(GeometryKind::Line));
    }

    #[test]
    fn attributes_and_copy() {
        let ws = Workspace::open_in_memory().unwrap();
        ws.create_layer("a", GeometryKind::Point, false).unwrap();
        ws.put_feature("a", 7, &[coord! { x: 1.0, y: 2.0 }]).unwrap();
        ws.set_attribute("a", 7, "reach_id", 3.0).unwrap();
        ws.copy_layer("a", "b").unwrap();
        assert_eq!(ws.attribute("b", 7, "reach_id").unwrap(), Some(3.0));
        assert_eq!(ws.attribute_column("b", "reach_id").unwrap()[&7], 3.0);
        assert_eq!(ws.attribute("b", 7, "missing").unwrap(), None);
    }

    #[test]
    fn scratch_layer_is_removed_on_drop() {
        let ws = Workspace::open_in_memory().unwrap();
        let ctx = RunContext::new();
        let name = {
            let scratch = ws.scratch_layer(&ctx, "tmp_pairs", GeometryKind::Point).unwrap();
            ws.put_feature(scratch.name(), 1, &[coord! { x: 0.0, y: 0.0 }])
                .unwrap();
            scratch.name().to_string()
        };
        assert_eq!(ws.layer_kind(&name).unwrap(), None);
        assert_eq!(ws.feature_count(&name).unwrap(), 0);
    }

    #[test]
    fn units_round_trip() {
        let ws = Workspace::open_in_memory().unwrap();
        assert_eq!(ws.units().unwrap(), None);
        ws.set_units("metres").unwrap();
        assert_eq!(ws.units().unwrap().as_deref(), Some("metres"));
    }
}
