use super::Point2D;

/// Largest supported rounding precision. Keys are scaled into `i128`, which
/// holds any projected or geographic coordinate at this many digits.
pub const MAX_PRECISION: u32 = 12;

/// Default number of decimal digits kept when matching segment endpoints.
pub const DEFAULT_PRECISION: u32 = 6;

/// A coordinate rounded independently per axis to a fixed number of decimal
/// digits, stored as scaled integers so it can be hashed and compared exactly.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoordinateKey {
    x: i128,
    y: i128,
    precision: u32,
}

impl CoordinateKey {
    /// Key used in place of a real endpoint when a segment has no usable geometry.
    pub fn origin(precision: u32) -> CoordinateKey {
        CoordinateKey {
            x: 0,
            y: 0,
            precision,
        }
    }

    /// Rounds `p` to `precision` digits. Returns `None` for a non-finite
    /// coordinate or one too large to scale without saturating.
    pub fn from_point(p: &Point2D, precision: u32) -> Option<CoordinateKey> {
        let precision = precision.min(MAX_PRECISION);
        let scale = 10f64.powi(precision as i32);
        Some(CoordinateKey {
            x: scale_axis(p.x, scale)?,
            y: scale_axis(p.y, scale)?,
            precision,
        })
    }
}

fn scale_axis(value: f64, scale: f64) -> Option<i128> {
    let scaled = (value * scale).round();
    if scaled.is_finite() && scaled.abs() < i128::MAX as f64 {
        Some(scaled as i128)
    } else {
        None
    }
}
