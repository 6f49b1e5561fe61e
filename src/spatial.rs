//! Uniform-cell spatial index rebuilt every tick.

use std::collections::HashMap;

use thiserror::Error;

/// Anything with a 2D world position.
pub trait Positioned {
    fn position(&self) -> (f64, f64);
}

pub type CellKey = (i64, i64);

#[derive(Debug, Error, PartialEq)]
pub enum SpatialError {
    #[error("cell size must be positive, got {0}")]
    InvalidCellSize(f64),
}

/// Buckets entries into square cells of `cell_size` world units.
///
/// Cells are keyed by signed column/row so positions outside the nominal world
/// bounds are still indexed and found.
#[derive(Debug, Clone)]
pub struct SpatialGrid<T> {
    cell_size: f64,
    cols: usize,
    rows: usize,
    cells: HashMap<CellKey, Vec<T>>,
}

impl<T: Positioned> SpatialGrid<T> {
    pub fn new(width: f64, height: f64, cell_size: f64) -> Result<Self, SpatialError> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(SpatialError::InvalidCellSize(cell_size));
        }
        let cols = (width / cell_size).ceil().max(1.0) as usize;
        let rows = (height / cell_size).ceil().max(1.0) as usize;
        Ok(Self {
            cell_size,
            cols,
            rows,
            cells: HashMap::new(),
        })
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Nominal column and row count covering the world.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    pub fn cell_of(&self, x: f64, y: f64) -> CellKey {
        (
            (x / self.cell_size).floor() as i64,
            (y / self.cell_size).floor() as i64,
        )
    }

    /// Empties every cell. Buckets that were already empty are dropped, so only
    /// cells occupied during the previous rebuild keep their allocation.
    pub fn clear(&mut self) {
        self.cells.retain(|_, cell| !cell.is_empty());
        for cell in self.cells.values_mut() {
            cell.clear();
        }
    }

    pub fn insert(&mut self, entity: T) {
        let (x, y) = entity.position();
        let key = self.cell_of(x, y);
        self.cells.entry(key).or_default().push(entity);
    }

    pub fn len(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.values().all(Vec::is_empty)
    }

    pub fn cell(&self, key: CellKey) -> &[T] {
        self.cells.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every entry in cells overlapping the square of `ceil(radius / cell_size)`
    /// cells around the cell containing `(x, y)`. May include entries further
    /// than `radius` away.
    pub fn nearby(&self, x: f64, y: f64, radius: f64) -> Vec<&T> {
        let (cx, cy) = self.cell_of(x, y);
        let reach = (radius.max(0.0) / self.cell_size).ceil();
        let span = 2.0 * reach + 1.0;
        if span * span > self.cells.len() as f64 {
            return self.nearby_by_scan(cx, cy, reach as u64);
        }

        let reach = reach as i64;
        let mut result = Vec::new();
        for row in cy.saturating_sub(reach)..=cy.saturating_add(reach) {
            for col in cx.saturating_sub(reach)..=cx.saturating_add(reach) {
                if let Some(cell) = self.cells.get(&(col, row)) {
                    result.extend(cell.iter());
                }
            }
        }
        result
    }

    /// Walks the occupied cells instead of the query square; used when the
    /// square covers more cells than the grid holds.
    fn nearby_by_scan(&self, cx: i64, cy: i64, reach: u64) -> Vec<&T> {
        let mut keys: Vec<CellKey> = self
            .cells
            .keys()
            .copied()
            .filter(|&(col, row)| col.abs_diff(cx) <= reach && row.abs_diff(cy) <= reach)
            .collect();
        keys.sort_unstable_by_key(|&(col, row)| (row, col));
        keys.iter()
            .filter_map(|key| self.cells.get(key))
            .flat_map(|cell| cell.iter())
            .collect()
    }

    /// Entries whose exact distance to `(x, y)` is at most `radius`.
    pub fn in_radius(&self, x: f64, y: f64, radius: f64) -> Vec<&T> {
        let radius_sq = radius * radius;
        self.nearby(x, y, radius)
            .into_iter()
            .filter(|entity| {
                let (ex, ey) = entity.position();
                let dx = ex - x;
                let dy = ey - y;
                dx * dx + dy * dy <= radius_sq
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Dot {
        id: u32,
        x: f64,
        y: f64,
    }

    impl Positioned for Dot {
        fn position(&self) -> (f64, f64) {
            (self.x, self.y)
        }
    }

    fn dot(id: u32, x: f64, y: f64) -> Dot {
        Dot { id, x, y }
    }

    fn ids(found: Vec<&Dot>) -> Vec<u32> {
        let mut ids: Vec<u32> = found.into_iter().map(|d| d.id).collect();
        ids.sort();
        ids
    }

    #[test]
    fn test_grid_dimensions() {
        let grid: SpatialGrid<Dot> = SpatialGrid::new(100.0, 45.0, 10.0).unwrap();
        assert_eq!(grid.dimensions(), (10, 5));
        assert_eq!(grid.cell_of(15.0, 9.99), (1, 0));
        assert_eq!(grid.cell_of(-0.5, 120.0), (-1, 12));
    }

    #[test]
    fn test_zero_radius_finds_self() {
        let mut grid = SpatialGrid::new(100.0, 100.0, 10.0).unwrap();
        let dots = [
            dot(1, 5.0, 5.0),
            dot(2, 5.0, 5.0),
            dot(3, 9.0, 5.0),
            dot(4, 55.5, 72.25),
            dot(5, -12.0, 130.0),
        ];
        for d in dots {
            grid.insert(d);
        }
        for d in &dots {
            assert!(grid.nearby(d.x, d.y, 0.0).iter().any(|n| n.id == d.id));
        }
        assert_eq!(ids(grid.in_radius(5.0, 5.0, 0.0)), vec![1, 2]);
        assert_eq!(ids(grid.in_radius(-12.0, 130.0, 0.0)), vec![5]);
    }

    #[test]
    fn test_nearby_is_cell_granular() {
        let mut grid = SpatialGrid::new(100.0, 100.0, 10.0).unwrap();
        grid.insert(dot(1, 1.0, 1.0));
        grid.insert(dot(2, 18.0, 17.0));
        grid.insert(dot(3, 35.0, 35.0));
        // radius 5 reaches one cell in each direction from cell (1, 1)
        assert_eq!(ids(grid.nearby(15.0, 15.0, 5.0)), vec![1, 2]);
        assert_eq!(ids(grid.in_radius(15.0, 15.0, 5.0)), vec![2]);
        assert_eq!(ids(grid.in_radius(15.0, 15.0, 30.0)), vec![1, 2, 3]);
    }

    #[test]
    fn test_clear_empties_cells() {
        let mut grid = SpatialGrid::new(50.0, 50.0, 5.0).unwrap();
        assert!(grid.nearby(10.0, 10.0, 20.0).is_empty());
        grid.insert(dot(1, 10.0, 10.0));
        grid.insert(dot(2, 11.0, 10.0));
        assert_eq!(grid.len(), 2);
        assert_eq!(grid.cell((2, 2)).len(), 2);
        grid.clear();
        assert!(grid.is_empty());
        assert!(grid.in_radius(10.0, 10.0, 100.0).is_empty());
    }

    #[test]
    fn test_rejects_degenerate_cell_size() {
        for size in [0.0, -4.0, f64::NAN, f64::INFINITY] {
            assert!(SpatialGrid::<Dot>::new(100.0, 100.0, size).is_err());
        }
        assert_eq!(
            SpatialGrid::<Dot>::new(100.0, 100.0, 0.0).unwrap_err(),
            SpatialError::InvalidCellSize(0.0)
        );
    }

    #[test]
    fn test_huge_radius_scans_occupied_cells() {
        let mut grid = SpatialGrid::new(100.0, 100.0, 10.0).unwrap();
        grid.insert(dot(1, 1.0, 1.0));
        grid.insert(dot(2, 18.0, 17.0));
        grid.insert(dot(3, -5_000.0, 9_000.0));
        grid.insert(dot(4, 35.0, 35.0));

        assert_eq!(ids(grid.in_radius(15.0, 15.0, f64::INFINITY)), vec![1, 2, 3, 4]);
        assert_eq!(ids(grid.nearby(15.0, 15.0, 1.0e7)), vec![1, 2, 3, 4]);
        assert_eq!(ids(grid.in_radius(15.0, 15.0, 100.0)), vec![1, 2, 4]);
        assert_eq!(ids(grid.nearby(f64::MAX, f64::MAX, f64::MAX)), vec![1, 2, 3, 4]);

        let scanned: Vec<u32> = grid.nearby(15.0, 15.0, 1.0e7).iter().map(|d| d.id).collect();
        let again: Vec<u32> = grid.nearby(15.0, 15.0, 1.0e7).iter().map(|d| d.id).collect();
        assert_eq!(scanned, again);
    }

    #[test]
    fn test_clear_drops_stale_buckets() {
        let mut grid = SpatialGrid::new(50.0, 50.0, 5.0).unwrap();
        for step in 0..100 {
            grid.clear();
            grid.insert(dot(1, 1_000.0 + step as f64 * 10.0, 0.0));
        }
        assert!(grid.cells.len() <= 2);
        assert_eq!(grid.len(), 1);
        grid.clear();
        grid.clear();
        assert!(grid.cells.is_empty());
    }
}
