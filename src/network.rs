use crate::config::{ColumnConfig, SmoothingParams};
use crate::error::{HecrasError, Result};
use crate::workspace::{GeometryKind, Workspace};
use geo::ChaikinSmoothing;
use geo_types::{Coord, LineString};

// One directed river segment, digitized from its upstream end
#[derive(Debug, Clone)]
pub struct Reach {
    pub id: u32,
    pub line: LineString<f64>,
    pub length: f64,
}

impl Reach {
    pub fn new(id: u32, line: LineString<f64>) -> Result<Self> {
        if line.0.len() < 2 {
            return Err(HecrasError::Geometry(format!(
                "reach {} has fewer than two vertices",
                id
            )));
        }
        let length = polyline_length(&line.0);
        Ok(Reach { id, line, length })
    }

    pub fn start(&self) -> Coord<f64> {
        self.line.0[0]
    }

    pub fn end(&self) -> Coord<f64> {
        self.line.0[self.line.0.len() - 1]
    }
}

pub fn polyline_length(coords: &[Coord<f64>]) -> f64 {
    coords
        .windows(2)
        .map(|w| (w[1].x - w[0].x).hypot(w[1].y - w[0].y))
        .sum()
}

// River network: reaches sorted by id
#[derive(Debug, Clone)]
pub struct RiverNetwork {
    pub layer: String,
    pub source: String,
    pub smoothed: bool,
    pub reaches: Vec<Reach>,
}

impl RiverNetwork {
    pub fn total_length(&self) -> f64 {
        self.reaches.iter().map(|r| r.length).sum()
    }
}

fn reach_id(cat: u64) -> Result<u32> {
    u32::try_from(cat)
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| HecrasError::Geometry(format!("invalid reach id {}", cat)))
}

// Load a river network from a line layer of the workspace
pub fn load_network(ws: &Workspace, layer: &str) -> Result<RiverNetwork> {
    ws.require_layer(layer, GeometryKind::Line)?;

    let mut reaches = Vec::new();
    for feature in ws.features(layer)? {
        reaches.push(Reach::new(
            reach_id(feature.cat)?,
            LineString::from(feature.coords),
        )?);
    }
    reaches.sort_by_key(|r| r.id);

    if reaches.is_empty() {
        return Err(HecrasError::Geometry(format!(
            "river layer <{}> contains no reaches",
            layer
        )));
    }

    Ok(RiverNetwork {
        layer: layer.to_string(),
        source: layer.to_string(),
        smoothed: false,
        reaches,
    })
}

/// Loads the input reaches and smooths them when asked. Nothing is written
/// to the workspace; the returned network names the layer it will be
/// stored under (`working`, or the smoothed layer).
pub fn derive_network(
    ws: &Workspace,
    input: &str,
    working: &str,
    smoothing: Option<&SmoothingParams>,
) -> Result<RiverNetwork> {
    let source = load_network(ws, input)?;

    match smoothing {
        Some(params) => {
            let reaches = source
                .reaches
                .iter()
                .map(|reach| Reach::new(reach.id, reach.line.chaikin_smoothing(params.passes)))
                .collect::<Result<Vec<_>>>()?;
            Ok(RiverNetwork {
                layer: params.output.clone(),
                source: input.to_string(),
                smoothed: true,
                reaches,
            })
        }
        None => Ok(RiverNetwork {
            layer: working.to_string(),
            source: input.to_string(),
            smoothed: false,
            reaches: source.reaches,
        }),
    }
}

/// Writes the working copy of the network (smoothed geometry, or a copy of
/// the input layer) and attaches length and endpoint columns to every reach.
pub fn store_network(ws: &Workspace, network: &RiverNetwork, columns: &ColumnConfig) -> Result<()> {
    if network.smoothed {
        ws.create_layer(&network.layer, GeometryKind::Line, true)?;
        for reach in &network.reaches {
            ws.put_feature(&network.layer, u64::from(reach.id), &reach.line.0)?;
        }
        log::info!(
            "Smoothed {} reaches of <{}> into <{}>",
            network.reaches.len(),
            network.source,
            network.layer
        );
    } else if network.layer != network.source {
        ws.copy_layer(&network.source, &network.layer)?;
    }

    for reach in &network.reaches {
        let cat = u64::from(reach.id);
        let (start, end) = (reach.start(), reach.end());
        ws.set_attribute(&network.layer, cat, &columns.reach_len, reach.length)?;
        ws.set_attribute(&network.layer, cat, &columns.start_x, start.x)?;
        ws.set_attribute(&network.layer, cat, &columns.start_y, start.y)?;
        ws.set_attribute(&network.layer, cat, &columns.end_x, end.x)?;
        ws.set_attribute(&network.layer, cat, &columns.end_y, end.y)?;
    }

    log::info!(
        "River network <{}> built with {} reaches, {:.3} total length",
        network.layer,
        network.reaches.len(),
        network.total_length()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo_types::coord;

    fn workspace_with_river() -> Workspace {
        let ws = Workspace::open_in_memory().unwrap();
        ws.create_layer("rivers", GeometryKind::Line, false).unwrap();
        ws.put_feature(
            "rivers",
            2,
            &[
                coord! { x: 0.0, y: 0.0 },
                coord! { x: 30.0, y: 40.0 },
                coord! { x: 30.0, y: 100.0 },
            ],
        )
        .unwrap();
        ws.put_feature(
            "rivers",
            1,
            &[coord! { x: 0.0, y: 0.0 }, coord! { x: 250.0, y: 0.0 }],
        )
        .unwrap();
        ws
    }

    #[test]
    fn reaches_are_sorted_and_measured() {
        let ws = workspace_with_river();
        let network = load_network(&ws, "rivers").unwrap();
        assert_eq!(network.reaches.len(), 2);
        assert_eq!(network.reaches[0].id, 1);
        assert_relative_eq!(network.reaches[0].length, 250.0);
        assert_relative_eq!(network.reaches[1].length, 110.0);
    }

    #[test]
    fn working_copy_gets_reach_columns() {
        let ws = workspace_with_river();
        ws.set_attribute("rivers", 2, "name", 7.0).unwrap();
        let columns = ColumnConfig::new();
        let network = derive_network(&ws, "rivers", "river_network", None).unwrap();
        assert_eq!(network.layer, "river_network");
        assert_eq!(ws.layer_kind("river_network").unwrap(), None);

        store_network(&ws, &network, &columns).unwrap();
        assert_eq!(ws.attribute("river_network", 2, "reach_len").unwrap(), Some(110.0));
        assert_eq!(ws.attribute("river_network", 2, "end_y").unwrap(), Some(100.0));
        assert_eq!(ws.attribute("river_network", 2, "name").unwrap(), Some(7.0));
        assert_eq!(ws.attribute("rivers", 2, "reach_len").unwrap(), None);
        assert_eq!(ws.features("river_network").unwrap(), ws.features("rivers").unwrap());
    }

    #[test]
    fn working_layer_may_be_the_input() {
        let ws = workspace_with_river();
        let network = derive_network(&ws, "rivers", "rivers", None).unwrap();
        store_network(&ws, &network, &ColumnConfig::new()).unwrap();
        assert_eq!(ws.feature_count("rivers").unwrap(), 2);
        assert_eq!(ws.attribute("rivers", 1, "reach_len").unwrap(), Some(250.0));
    }

    #[test]
    fn smoothing_keeps_endpoints() {
        let ws = workspace_with_river();
        let columns = ColumnConfig::new();
        let smoothing = SmoothingParams {
            output: "smooth".to_string(),
            passes: 2,
        };
        let network = derive_network(&ws, "rivers", "unused", Some(&smoothing)).unwrap();
        assert_eq!(network.layer, "smooth");
        let bent = &network.reaches[1];
        assert!(bent.line.0.len() > 3);
        assert_eq!(bent.start(), coord! { x: 0.0, y: 0.0 });
        assert_eq!(bent.end(), coord! { x: 30.0, y: 100.0 });
        assert_eq!(ws.layer_kind("smooth").unwrap(), None);

        store_network(&ws, &network, &columns).unwrap();
        assert_eq!(ws.feature_count("smooth").unwrap(), 2);
        assert_eq!(ws.features("smooth").unwrap()[1].coords, bent.line.0);
    }
}
