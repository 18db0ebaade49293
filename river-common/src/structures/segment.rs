use super::{polyline_length, Point2D};

/// Basin group value meaning the segment intersects no basin.
pub const NO_BASIN: u32 = 0;

/// One stream reach polyline prior to network assembly.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Segment {
    /// Position of the segment in its input collection, used when reporting it.
    pub index: usize,
    pub points: Vec<Point2D>,
    pub basin_group: u32,
}

impl Segment {
    pub fn new(index: usize, points: Vec<Point2D>, basin_group: u32) -> Segment {
        Segment {
            index,
            points,
            basin_group,
        }
    }

    pub fn length(&self) -> f64 {
        polyline_length(&self.points)
    }

    /// First and last vertex, or `None` for a segment with fewer than two points.
    pub fn endpoints(&self) -> Option<(Point2D, Point2D)> {
        if self.points.len() < 2 {
            return None;
        }
        Some((self.points[0], self.points[self.points.len() - 1]))
    }
}
