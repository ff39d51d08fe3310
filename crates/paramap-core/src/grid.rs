use serde::{Deserialize, Serialize};

use crate::error::{MapError, Result};

/// Fill value for cells whose code or species has no parameter value.
pub const SENTINEL: f32 = 0.0;

/// A 2D grid stored row-major, row 0 first as it appears in the source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid<T> {
    /// Row-major cell values.
    pub data: Vec<T>,
    /// Number of columns.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
}

/// Integer land-use codes, one per cell.
pub type LandUseGrid = Grid<i64>;

/// Per-cell parameter values for a single parameter.
pub type ParameterGrid = Grid<f32>;

impl<T: Clone> Grid<T> {
    /// Create a new grid filled with the given value.
    pub fn filled(width: usize, height: usize, fill: T) -> Self {
        Self {
            data: vec![fill; width * height],
            width,
            height,
        }
    }
}

impl<T> Grid<T> {
    /// Wrap row-major `data`, checking that it covers exactly `width * height` cells.
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Result<Self> {
        if data.len() != width * height {
            return Err(MapError::ShapeMismatch {
                width,
                height,
                len: data.len(),
            });
        }
        Ok(Self { data, width, height })
    }

    /// Build a grid from nested rows. All rows must have the same length.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        let data: Vec<T> = rows.into_iter().flatten().collect();
        Self::from_vec(width, height, data)
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> &T {
        &self.data[row * self.width + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, val: T) {
        self.data[row * self.width + col] = val;
    }

    /// Iterate over rows as slices.
    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        // chunks(0) panics; an empty grid has no rows anyway.
        self.data.chunks(self.width.max(1))
    }
}

impl<T: Clone> Grid<T> {
    /// Copy out the grid as nested rows.
    pub fn to_rows(&self) -> Vec<Vec<T>> {
        self.rows().map(<[T]>::to_vec).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rows_keeps_row_major_order() {
        let g = Grid::from_rows(vec![vec![1, 2, 3], vec![4, 5, 6]]).unwrap();
        assert_eq!(g.shape(), (2, 3));
        assert_eq!(*g.get(1, 0), 4);
        assert_eq!(g.to_rows(), vec![vec![1, 2, 3], vec![4, 5, 6]]);
    }

    #[test]
    fn from_rows_rejects_ragged_input() {
        let err = Grid::from_rows(vec![vec![1, 2], vec![3]]).unwrap_err();
        assert!(matches!(err, MapError::ShapeMismatch { width: 2, height: 2, len: 3 }));
    }

    #[test]
    fn filled_grid_has_requested_shape() {
        let mut g = Grid::filled(4, 3, SENTINEL);
        g.set(2, 3, 1.5);
        assert_eq!(g.shape(), (3, 4));
        assert_eq!(g.len(), 12);
        assert_eq!(*g.get(2, 3), 1.5);
        assert_eq!(*g.get(0, 0), SENTINEL);
    }
}
