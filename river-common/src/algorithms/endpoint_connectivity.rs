use crate::structures::{CoordinateKey, Segment};
use std::borrow::Borrow;
use std::collections::HashMap;

/// Rounded endpoints of one segment.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SegmentEndpoints {
    Keyed {
        start: CoordinateKey,
        end: CoordinateKey,
    },
    /// The segment has fewer than two vertices or an endpoint that cannot be
    /// keyed. It carries the origin key for reporting but never takes part in
    /// endpoint matching.
    Sentinel(CoordinateKey),
}

impl SegmentEndpoints {
    pub fn is_sentinel(&self) -> bool {
        matches!(self, SegmentEndpoints::Sentinel(_))
    }
}

/// Map from a rounded coordinate to the batch positions of every segment that
/// starts or ends there.
pub type EndpointIndex = HashMap<CoordinateKey, Vec<usize>>;

/// Rounds the first and last vertex of each segment to `precision` decimal
/// digits. Segments without usable geometry get a sentinel and a warning.
pub fn extract_endpoints<S: Borrow<Segment>>(segments: &[S], precision: u32) -> Vec<SegmentEndpoints> {
    segments
        .iter()
        .map(|seg| {
            let seg = seg.borrow();
            let keys = seg.endpoints().and_then(|(first, last)| {
                Some((
                    CoordinateKey::from_point(&first, precision)?,
                    CoordinateKey::from_point(&last, precision)?,
                ))
            });
            match keys {
                Some((start, end)) => SegmentEndpoints::Keyed { start, end },
                None => {
                    tracing::warn!(
                        segment = seg.index,
                        vertices = seg.points.len(),
                        "segment has no usable geometry; using sentinel endpoints"
                    );
                    SegmentEndpoints::Sentinel(CoordinateKey::origin(precision))
                }
            }
        })
        .collect()
}

/// Builds the coordinate-to-segments index. Batch positions are pushed in
/// ascending order, start before end.
pub fn build_endpoint_index(endpoints: &[SegmentEndpoints]) -> EndpointIndex {
    let mut index = EndpointIndex::with_capacity(endpoints.len() * 2);
    for (i, ep) in endpoints.iter().enumerate() {
        if let SegmentEndpoints::Keyed { start, end } = *ep {
            index.entry(start).or_default().push(i);
            index.entry(end).or_default().push(i);
        }
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structures::Point2D;

    fn seg(index: usize, coords: &[(f64, f64)]) -> Segment {
        let points = coords.iter().map(|&(x, y)| Point2D::new(x, y)).collect();
        Segment::new(index, points, 1)
    }

    #[test]
    fn test_shared_endpoint_is_indexed_once_per_segment() {
        let segments = vec![
            seg(0, &[(0.0, 0.0), (1.0, 1.0)]),
            seg(1, &[(1.0000000002, 1.0), (2.0, 2.0)]),
        ];
        let endpoints = extract_endpoints(&segments, 6);
        let index = build_endpoint_index(&endpoints);
        let shared = CoordinateKey::from_point(&Point2D::new(1.0, 1.0), 6).unwrap();
        assert_eq!(index.get(&shared), Some(&vec![0, 1]));
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_empty_geometry_gets_sentinel_and_is_not_indexed() {
        let segments = vec![seg(0, &[]), seg(1, &[(3.0, 3.0)]), seg(2, &[(0.0, 0.0), (0.0, 1.0)])];
        let endpoints = extract_endpoints(&segments, 6);
        assert!(endpoints[0].is_sentinel());
        assert!(endpoints[1].is_sentinel());
        assert_eq!(endpoints[0], SegmentEndpoints::Sentinel(CoordinateKey::origin(6)));
        let index = build_endpoint_index(&endpoints);
        // the real segment starting at the origin does not pick up the sentinels
        assert_eq!(index.get(&CoordinateKey::origin(6)), Some(&vec![2]));
    }

    #[test]
    fn test_non_finite_endpoint_gets_sentinel() {
        let segments = vec![
            seg(0, &[(f64::NAN, 0.0), (1.0, 1.0)]),
            seg(1, &[(1.0, 1.0), (f64::NAN, 0.0)]),
        ];
        let endpoints = extract_endpoints(&segments, 6);
        assert!(endpoints.iter().all(|e| e.is_sentinel()));
        assert!(build_endpoint_index(&endpoints).is_empty());
    }
}
