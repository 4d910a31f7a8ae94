use crate::error::{HecrasError, Result};
use crate::sdf::ExtentPair;
use geo::{Area, Centroid};
use geo_types::{Coord, LineString, Polygon};

/// Closed water-surface boundary built from surveyed extent pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryRing {
    pub vertices: Vec<Coord<f64>>,
}

impl BoundaryRing {
    pub fn to_polygon(&self) -> Polygon<f64> {
        Polygon::new(LineString::from(self.vertices.clone()), vec![])
    }

    pub fn area(&self) -> f64 {
        self.to_polygon().unsigned_area()
    }

    pub fn centroid(&self) -> Option<Coord<f64>> {
        self.to_polygon().centroid().map(|p| p.0)
    }
}

/// Walks the left bank downstream, the right bank back upstream, and
/// repeats the first left point to close the ring.
pub fn close_boundary(left: &[Coord<f64>], right: &[Coord<f64>]) -> Result<BoundaryRing> {
    if left.len() != right.len() {
        return Err(HecrasError::CountMismatch {
            what: "left and right water surface extents",
            left: left.len(),
            right: right.len(),
        });
    }
    let Some(first) = left.first() else {
        return Err(HecrasError::EmptySurvey);
    };

    let mut vertices = Vec::with_capacity(left.len() * 2 + 1);
    vertices.extend_from_slice(left);
    vertices.extend(right.iter().rev());
    vertices.push(*first);

    log::info!(
        "Total number of vertices in water surface polygon: {}",
        vertices.len()
    );
    Ok(BoundaryRing { vertices })
}

pub fn close_extents(extents: &[ExtentPair]) -> Result<BoundaryRing> {
    let left: Vec<Coord<f64>> = extents.iter().map(|e| e.left).collect();
    let right: Vec<Coord<f64>> = extents.iter().map(|e| e.right).collect();
    close_boundary(&left, &right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo_types::coord;

    #[test]
    fn two_pairs_close_into_a_rectangle() {
        let extents = vec![
            ExtentPair {
                left: coord! { x: 0.0, y: 0.0 },
                right: coord! { x: 10.0, y: 0.0 },
            },
            ExtentPair {
                left: coord! { x: 0.0, y: 1.0 },
                right: coord! { x: 10.0, y: 1.0 },
            },
        ];
        let ring = close_extents(&extents).unwrap();
        assert_eq!(
            ring.vertices,
            vec![
                coord! { x: 0.0, y: 0.0 },
                coord! { x: 0.0, y: 1.0 },
                coord! { x: 10.0, y: 1.0 },
                coord! { x: 10.0, y: 0.0 },
                coord! { x: 0.0, y: 0.0 },
            ]
        );
        assert_relative_eq!(ring.area(), 10.0);
        let centroid = ring.centroid().unwrap();
        assert_relative_eq!(centroid.x, 5.0);
        assert_relative_eq!(centroid.y, 0.5);
    }

    #[test]
    fn ring_is_left_then_reversed_right() {
        for n in 1..6 {
            let left: Vec<Coord<f64>> = (0..n).map(|i| coord! { x: 0.0, y: i as f64 }).collect();
            let right: Vec<Coord<f64>> =
                (0..n).map(|i| coord! { x: 5.0, y: i as f64 * 1.5 }).collect();
            let ring = close_boundary(&left, &right).unwrap();
            assert_eq!(ring.vertices.len(), 2 * n + 1);
            assert_eq!(ring.vertices.first(), ring.vertices.last());

            let mut expected = left.clone();
            expected.extend(right.iter().rev());
            assert_eq!(ring.vertices[..2 * n], expected[..]);
        }
    }

    #[test]
    fn mismatched_or_empty_input_is_fatal() {
        let left = vec![coord! { x: 0.0, y: 0.0 }];
        assert!(matches!(
            close_boundary(&left, &[]),
            Err(HecrasError::CountMismatch { left: 1, right: 0, .. })
        ));
        assert!(matches!(
            close_boundary(&[], &[]),
            Err(HecrasError::EmptySurvey)
        ));
    }
}
