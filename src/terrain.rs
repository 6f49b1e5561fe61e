//! Elevation sources consulted when plants are placed.

use thiserror::Error;

/// Anything that can answer a normalised (0..=1) elevation for a world position.
pub trait Terrain {
    fn elevation_at(&self, x: f64, y: f64) -> f64;
}

#[derive(Debug, Error, PartialEq)]
pub enum TerrainError {
    #[error("elevation map needs at least one sample")]
    Empty,
    #[error("elevation row {row} has {found} samples, expected {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error("sample spacing must be positive, got {0}")]
    InvalidSpacing(f64),
}

/// Same elevation everywhere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatTerrain(pub f64);

impl Terrain for FlatTerrain {
    fn elevation_at(&self, _x: f64, _y: f64) -> f64 {
        self.0.clamp(0.0, 1.0)
    }
}

/// Regular grid of elevation samples, bilinearly interpolated between samples.
///
/// Sample `(col, row)` sits at world position `(col * spacing, row * spacing)`;
/// queries outside the sampled area use the nearest edge value.
#[derive(Debug, Clone)]
pub struct ElevationMap {
    cols: usize,
    rows: usize,
    spacing: f64,
    samples: Vec<f64>,
}

impl ElevationMap {
    pub fn from_rows(rows: &[Vec<f64>], spacing: f64) -> Result<Self, TerrainError> {
        if !(spacing.is_finite() && spacing > 0.0) {
            return Err(TerrainError::InvalidSpacing(spacing));
        }
        let cols = rows.first().map(Vec::len).unwrap_or(0);
        if cols == 0 {
            return Err(TerrainError::Empty);
        }
        let mut samples = Vec::with_capacity(cols * rows.len());
        for (index, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(TerrainError::RaggedRow {
                    row: index,
                    found: row.len(),
                    expected: cols,
                });
            }
            samples.extend(row.iter().map(|value| value.clamp(0.0, 1.0)));
        }
        Ok(Self {
            cols,
            rows: rows.len(),
            spacing,
            samples,
        })
    }

    fn sample(&self, col: usize, row: usize) -> f64 {
        self.samples[row * self.cols + col]
    }
}

impl Terrain for ElevationMap {
    fn elevation_at(&self, x: f64, y: f64) -> f64 {
        let max_col = (self.cols - 1) as f64;
        let max_row = (self.rows - 1) as f64;
        let fx = (x / self.spacing).clamp(0.0, max_col);
        let fy = (y / self.spacing).clamp(0.0, max_row);

        let c0 = fx.floor() as usize;
        let r0 = fy.floor() as usize;
        let c1 = (c0 + 1).min(self.cols - 1);
        let r1 = (r0 + 1).min(self.rows - 1);
        let tx = fx - c0 as f64;
        let ty = fy - r0 as f64;

        let top = self.sample(c0, r0) * (1.0 - tx) + self.sample(c1, r0) * tx;
        let bottom = self.sample(c0, r1) * (1.0 - tx) + self.sample(c1, r1) * tx;
        top * (1.0 - ty) + bottom * ty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_terrain_clamps() {
        assert_eq!(FlatTerrain(0.4).elevation_at(10.0, -3.0), 0.4);
        assert_eq!(FlatTerrain(1.7).elevation_at(0.0, 0.0), 1.0);
    }

    #[test]
    fn test_elevation_map_interpolates() {
        let map = ElevationMap::from_rows(&[vec![0.0, 1.0], vec![0.0, 1.0]], 10.0).unwrap();
        assert_eq!(map.elevation_at(0.0, 0.0), 0.0);
        assert_eq!(map.elevation_at(10.0, 10.0), 1.0);
        assert!((map.elevation_at(5.0, 3.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_elevation_map_clamps_outside_samples() {
        let map = ElevationMap::from_rows(&[vec![0.2, 0.8]], 5.0).unwrap();
        assert_eq!(map.elevation_at(-50.0, 0.0), 0.2);
        assert_eq!(map.elevation_at(500.0, 40.0), 0.8);
    }

    #[test]
    fn test_elevation_map_rejects_bad_input() {
        assert_eq!(
            ElevationMap::from_rows(&[], 1.0).unwrap_err(),
            TerrainError::Empty
        );
        assert_eq!(
            ElevationMap::from_rows(&[vec![0.1, 0.2], vec![0.3]], 1.0).unwrap_err(),
            TerrainError::RaggedRow {
                row: 1,
                found: 1,
                expected: 2
            }
        );
        assert!(ElevationMap::from_rows(&[vec![0.1]], 0.0).is_err());
    }
}
