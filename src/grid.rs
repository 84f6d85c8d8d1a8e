use std::fmt;

use crate::error::{Error, Result};
use crate::pattern::{Extent, Offset};
use crate::Cell;

/// Square, odd-sided matrix of sand heights, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
	side: usize,
	cells: Vec<Cell>,
}

impl Grid {
	pub fn new(side: usize) -> Result<Grid> {
		if side == 0 || side % 2 == 0 {
			return Err(Error::invalid(format!("Grid side must be odd and positive, got {}", side)));
		}
		Ok(Grid {
			side,
			cells: vec![0; side * side],
		})
	}

	pub fn from_rows(rows: Vec<Vec<Cell>>) -> Result<Grid> {
		let mut grid = Grid::new(rows.len())?;
		for (i, row) in rows.into_iter().enumerate() {
			if row.len() != grid.side {
				return Err(Error::invalid(format!("Row {} has {} cells, expected {}", i, row.len(), grid.side)));
			}
			grid.row_mut(i).copy_from_slice(&row);
		}
		Ok(grid)
	}

	pub fn side(&self) -> usize {
		self.side
	}

	pub fn centre(&self) -> usize {
		self.side / 2
	}

	pub fn get(&self, row: usize, col: usize) -> Option<Cell> {
		if row < self.side && col < self.side {
			Some(self.cells[row * self.side + col])
		} else {
			None
		}
	}

	pub fn get_mut(&mut self, row: usize, col: usize) -> Option<&mut Cell> {
		if row < self.side && col < self.side {
			Some(&mut self.cells[row * self.side + col])
		} else {
			None
		}
	}

	/// Position reached from `(row, col)` by `offset`, if it lies on the grid.
	pub fn offset(&self, row: usize, col: usize, offset: Offset) -> Option<(usize, usize)> {
		let r = row.checked_add_signed(offset.dx)?;
		let c = col.checked_add_signed(offset.dy)?;
		if r < self.side && c < self.side {
			Some((r, c))
		} else {
			None
		}
	}

	/// Whether every offset within `extent` of `(row, col)` lies on the grid.
	pub fn contains_extent(&self, row: usize, col: usize, extent: Extent) -> bool {
		self.offset(row, col, Offset::new(extent.min_dx, extent.min_dy)).is_some()
			&& self.offset(row, col, Offset::new(extent.max_dx, extent.max_dy)).is_some()
	}

	pub fn row(&self, row: usize) -> &[Cell] {
		&self.cells[row * self.side..(row + 1) * self.side]
	}

	pub(crate) fn row_mut(&mut self, row: usize) -> &mut [Cell] {
		&mut self.cells[row * self.side..(row + 1) * self.side]
	}

	pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
		self.cells.chunks(self.side)
	}

	pub(crate) fn cells(&self) -> &[Cell] {
		&self.cells
	}

	pub(crate) fn cells_mut(&mut self) -> &mut Vec<Cell> {
		&mut self.cells
	}

	/// Total sand on the grid.
	pub fn mass(&self) -> u128 {
		self.cells.iter().map(|&c| c as u128).sum()
	}

	pub fn max(&self) -> Cell {
		self.cells.iter().copied().max().unwrap_or(0)
	}

	pub fn is_stable(&self, threshold: Cell) -> bool {
		self.cells.iter().all(|&c| c < threshold)
	}

	/// Rows with the all-zero border rows and columns cut away.
	pub fn trimmed_rows(&self) -> Vec<&[Cell]> {
		let nonzero_rows: Vec<usize> = (0..self.side).filter(|&i| self.row(i).iter().any(|&c| c > 0)).collect();
		let (first, last) = match (nonzero_rows.first(), nonzero_rows.last()) {
			(Some(&f), Some(&l)) => (f, l),
			_ => return Vec::new(),
		};
		let nonzero_col = |j: usize| (first..=last).any(|i| self.cells[i * self.side + j] > 0);
		let left = (0..self.side).find(|&j| nonzero_col(j)).unwrap_or(0);
		let right = (0..self.side).rev().find(|&j| nonzero_col(j)).unwrap_or(left);
		(first..=last).map(|i| &self.row(i)[left..=right]).collect()
	}
}

impl fmt::Display for Grid {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		for row in self.rows() {
			for &el in row {
				let ch = u32::try_from(el).ok().and_then(|v| std::char::from_digit(v, 36)).unwrap_or('#');
				write!(f, "{}", ch)?;
			}
			writeln!(f)?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_new_rejects_even_side() {
		assert!(Grid::new(4).is_err());
		assert!(Grid::new(0).is_err());
		let g = Grid::new(5).unwrap();
		assert_eq!(g.centre(), 2);
		assert_eq!(g.mass(), 0);
	}

	#[test]
	fn test_offset_bounds() {
		let g = Grid::new(3).unwrap();
		assert_eq!(g.offset(1, 1, Offset::new(-1, 1)), Some((0, 2)));
		assert_eq!(g.offset(0, 1, Offset::new(-1, 0)), None);
		assert_eq!(g.offset(2, 2, Offset::new(0, 1)), None);
		assert_eq!(g.get(3, 0), None);
	}

	#[test]
	fn test_contains_extent() {
		let g = Grid::new(5).unwrap();
		let e = Extent { min_dx: -1, max_dx: 1, min_dy: -2, max_dy: 2 };
		assert!(g.contains_extent(2, 2, e));
		assert!(!g.contains_extent(2, 1, e));
		assert!(!g.contains_extent(0, 2, e));
	}

	#[test]
	fn test_trimmed_rows() {
		let g = Grid::from_rows(vec![
			vec![0, 0, 0, 0, 0],
			vec![0, 0, 1, 0, 0],
			vec![0, 2, 0, 3, 0],
			vec![0, 0, 0, 0, 0],
			vec![0, 0, 0, 0, 0],
		])
		.unwrap();
		let t = g.trimmed_rows();
		assert_eq!(t, vec![&[0, 1, 0][..], &[2, 0, 3][..]]);
		assert!(Grid::new(3).unwrap().trimmed_rows().is_empty());
	}

	#[test]
	fn test_display() {
		let g = Grid::from_rows(vec![vec![0, 1, 2], vec![3, 11, 0], vec![0, 0, 0]]).unwrap();
		assert_eq!(g.to_string(), "012\n3b0\n000\n");
	}
}
