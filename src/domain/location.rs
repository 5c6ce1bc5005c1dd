use {
    crate::error::{EngineError, EngineResult},
    h3o::CellIndex,
    serde::{Deserialize, Serialize, Serializer},
};

/// A point on the map, in degrees.
/// Fields are public so callers can carry raw request coordinates; `validate` decides.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub const LAT_RANGE: std::ops::RangeInclusive<f64> = -90.0..=90.0;
    pub const LON_RANGE: std::ops::RangeInclusive<f64> = -180.0..=180.0;

    /// Checked constructor.
    pub fn new(latitude: f64, longitude: f64) -> EngineResult<Self> {
        Self {
            latitude,
            longitude,
        }
        .validate()
    }

    pub fn validate(self) -> EngineResult<Self> {
        if Self::LAT_RANGE.contains(&self.latitude) && Self::LON_RANGE.contains(&self.longitude) {
            Ok(self)
        } else {
            Err(EngineError::InvalidCoordinate {
                latitude: self.latitude,
                longitude: self.longitude,
            })
        }
    }

    /// Rounds both coordinates to `decimals` places and scales to integers,
    /// so nearby points collapse onto the same key.
    pub fn quantized(&self, decimals: u32) -> (i64, i64) {
        let factor = 10f64.powi(decimals as i32);
        (
            (self.latitude * factor).round() as i64,
            (self.longitude * factor).round() as i64,
        )
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "({:.4}, {:.4})", self.latitude, self.longitude)
    }
}

/// Hierarchical spatial cell id. Identity and grouping only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpatialCell(CellIndex);

impl SpatialCell {
    pub(crate) fn new(cell: CellIndex) -> Self {
        Self(cell)
    }

    pub(crate) fn index(&self) -> CellIndex {
        self.0
    }
}

impl std::fmt::Display for SpatialCell {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for SpatialCell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_ranges() {
        assert!(Location::new(37.77, -122.42).is_ok());
        assert!(Location::new(90.0, 180.0).is_ok());
        assert!(Location::new(-90.0, -180.0).is_ok());
        assert_eq!(
            Location::new(91.0, 0.0),
            Err(EngineError::InvalidCoordinate {
                latitude: 91.0,
                longitude: 0.0
            })
        );
        assert!(Location::new(0.0, 180.5).is_err());
        assert!(Location::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn nearby_points_share_a_key() {
        let a = Location::new(37.77491, -122.41942).unwrap();
        let b = Location::new(37.77012, -122.42401).unwrap();
        let c = Location::new(37.78600, -122.41942).unwrap();
        assert_eq!(a.quantized(2), b.quantized(2));
        assert_ne!(a.quantized(2), c.quantized(2));
        assert_eq!(a.quantized(2), (3777, -12242));
    }
}
