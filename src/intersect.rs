use crate::error::Result;
use crate::xsections::CrossSection;
use geo::algorithm::line_intersection::{LineIntersection, line_intersection};
use geo_types::{Coord, Line, LineString};
use std::collections::HashSet;

/// Returns every point where two or more of the given lines meet or cross.
pub trait IntersectionFinder {
    fn intersections(&self, lines: &[LineString<f64>]) -> Result<Vec<Coord<f64>>>;
}

// Tests every segment pair belonging to different lines
#[derive(Debug, Clone, Copy, Default)]
pub struct PairwiseIntersections;

fn bbox_overlaps(a: &Line<f64>, b: &Line<f64>) -> bool {
    a.start.x.min(a.end.x) <= b.start.x.max(b.end.x)
        && b.start.x.min(b.end.x) <= a.start.x.max(a.end.x)
        && a.start.y.min(a.end.y) <= b.start.y.max(b.end.y)
        && b.start.y.min(b.end.y) <= a.start.y.max(a.end.y)
}

impl IntersectionFinder for PairwiseIntersections {
    fn intersections(&self, lines: &[LineString<f64>]) -> Result<Vec<Coord<f64>>> {
        let segments: Vec<(usize, Line<f64>)> = lines
            .iter()
            .enumerate()
            .flat_map(|(i, ls)| ls.lines().map(move |l| (i, l)))
            .collect();

        let mut seen = HashSet::new();
        let mut points = Vec::new();
        let mut record = |c: Coord<f64>| {
            // +0.0 and -0.0 must land on the same key
            let key = ((c.x + 0.0).to_bits(), (c.y + 0.0).to_bits());
            if seen.insert(key) {
                points.push(c);
            }
        };

        for (i, (line_a, seg_a)) in segments.iter().enumerate() {
            for (line_b, seg_b) in &segments[i + 1..] {
                if line_a == line_b || !bbox_overlaps(seg_a, seg_b) {
                    continue;
                }
                match line_intersection(*seg_a, *seg_b) {
                    Some(LineIntersection::SinglePoint { intersection, .. }) => {
                        record(intersection)
                    }
                    Some(LineIntersection::Collinear { intersection }) => {
                        record(intersection.start);
                        record(intersection.end);
                    }
                    None => {}
                }
            }
        }

        Ok(points)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionReport {
    pub points: Vec<Coord<f64>>,
}

impl IntersectionReport {
    pub fn count(&self) -> usize {
        self.points.len()
    }
}

/// Feeds all cross-sections to the finder as one line set.
pub fn extract_intersections(
    finder: &dyn IntersectionFinder,
    sections: &[CrossSection],
) -> Result<IntersectionReport> {
    let lines: Vec<LineString<f64>> = sections.iter().map(|s| s.to_line_string()).collect();
    let points = finder.intersections(&lines)?;
    log::debug!(
        "{} cross sections produced {} intersection points",
        lines.len(),
        points.len()
    );
    Ok(IntersectionReport { points })
}
