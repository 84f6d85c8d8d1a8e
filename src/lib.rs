//! Abelian sandpile simulation on a square grid.
//!
//! Sand is seeded around the centre of an odd-sided grid and then toppled
//! under a [`Pattern`]: any cell holding at least as many grains as the
//! pattern has offsets sends one share to each offset and keeps the rest.
//! Toppling repeats until the grid is stable. The stable grid does not depend
//! on the order cells are toppled in, which the row-major, column-major,
//! shuffled and parallel engines all rely on.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaChaRng;
use tracing::{debug, info};

pub mod error;
pub mod grid;
pub mod init;
mod parallel;
pub mod pattern;
pub mod sink;

pub use error::{Error, Result};
pub use grid::Grid;
pub use init::{initialise, Seed, SeedRemainder, SizingConfig};
pub use pattern::{Offset, Pattern, PatternRegistry};
pub use sink::{output_file_name, CsvSink, GridSink, PngSink};

pub type Cell = u64;

/// Order in which the in-place engine visits cells within a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOrder {
	RowMajor,
	ColumnMajor,
	/// A new random permutation of all cells every pass.
	Shuffled(u64),
}

/// Handed to the pass observer after each pass that toppled something.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassReport {
	pub pass: u64,
	pub topples: u64,
}

/// A grid bound to the pattern it topples under.
#[derive(Debug, Clone, PartialEq)]
pub struct GridSandpile {
	grid: Grid,
	pattern: Pattern,
	last_topple: u64,
	passes: u64,
}

impl GridSandpile {
	pub fn new(grid: Grid, pattern: Pattern) -> GridSandpile {
		GridSandpile {
			grid,
			pattern,
			last_topple: 0,
			passes: 0,
		}
	}

	pub fn grid(&self) -> &Grid {
		&self.grid
	}

	pub fn into_grid(self) -> Grid {
		self.grid
	}

	pub fn pattern(&self) -> &Pattern {
		&self.pattern
	}

	/// Topple events (not grains) in the last run.
	pub fn last_topple(&self) -> u64 {
		self.last_topple
	}

	/// Passes that toppled at least one cell in the last run.
	pub fn passes(&self) -> u64 {
		self.passes
	}

	pub fn is_stable(&self) -> bool {
		self.grid.is_stable(self.pattern.threshold())
	}

	/// Topples in row-major order until stable and returns the pass count.
	pub fn topple(&mut self) -> Result<u64> {
		self.topple_observed(ScanOrder::RowMajor, |_| {})
	}

	pub fn topple_in_order(&mut self, order: ScanOrder) -> Result<u64> {
		self.topple_observed(order, |_| {})
	}

	/// Topples in place, visiting cells in `order`, calling `observer` after
	/// every pass that toppled. A pass's own topples can push cells it has
	/// not reached yet over the threshold; those topple in the same pass.
	pub fn topple_observed<F>(&mut self, order: ScanOrder, mut observer: F) -> Result<u64>
	where
		F: FnMut(&PassReport),
	{
		let side = self.grid.side();
		let mut visit: Vec<(usize, usize)> = match order {
			ScanOrder::RowMajor => Vec::new(),
			ScanOrder::ColumnMajor => (0..side).flat_map(|j| (0..side).map(move |i| (i, j))).collect(),
			ScanOrder::Shuffled(_) => (0..side).flat_map(|i| (0..side).map(move |j| (i, j))).collect(),
		};
		let mut rng = match order {
			ScanOrder::Shuffled(seed) => Some(ChaChaRng::seed_from_u64(seed)),
			_ => None,
		};
		self.last_topple = 0;
		self.passes = 0;
		loop {
			let pass = self.passes + 1;
			let topples = if order == ScanOrder::RowMajor {
				let mut count = 0;
				for i in 0..side {
					for j in 0..side {
						count += self.topple_cell(i, j, pass)?;
					}
				}
				count
			} else {
				if let Some(rng) = rng.as_mut() {
					visit.shuffle(rng);
				}
				let mut count = 0;
				for &(i, j) in &visit {
					count += self.topple_cell(i, j, pass)?;
				}
				count
			};
			if topples == 0 {
				break;
			}
			self.passes = pass;
			self.last_topple += topples;
			debug!(pass, topples, "pass complete");
			observer(&PassReport { pass, topples });
		}
		info!(passes = self.passes, topples = self.last_topple, "stable");
		Ok(self.passes)
	}

	/// Topples one cell if it is at or over the threshold; returns 1 if it did.
	fn topple_cell(&mut self, i: usize, j: usize, pass: u64) -> Result<u64> {
		let threshold = self.pattern.threshold();
		let side = self.grid.side();
		let sand = self.grid.cells()[i * side + j];
		if sand < threshold {
			return Ok(0);
		}
		if !self.grid.contains_extent(i, j, self.pattern.extent()) {
			return Err(self.overflow(i, j, pass));
		}
		let remaining = sand % threshold;
		let share = (sand - remaining) / threshold;
		let cells = self.grid.cells_mut();
		cells[i * side + j] = remaining;
		for o in self.pattern.offsets() {
			let r = (i as isize + o.dx) as usize;
			let c = (j as isize + o.dy) as usize;
			cells[r * side + c] += share;
		}
		Ok(1)
	}

	/// Error for a topple at `(i, j)` whose footprint leaves the grid.
	fn overflow(&self, i: usize, j: usize, pass: u64) -> Error {
		let o = self
			.pattern
			.offsets()
			.iter()
			.find(|&&o| self.grid.offset(i, j, o).is_none())
			.copied()
			.unwrap_or(Offset::new(0, 0));
		Error::GridOverflow {
			row: i,
			col: j,
			dx: o.dx,
			dy: o.dy,
			pass,
		}
	}
}
