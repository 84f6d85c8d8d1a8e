use rayon::prelude::*;

use super::*;

impl GridSandpile {
	/// Topples with double-buffered passes spread across threads.
	///
	/// Every cell at or over the threshold at the start of a pass topples
	/// once by its whole quotient; the pass reads only that snapshot and
	/// gathers each cell's new height row by row.
	pub fn topple_parallel(&mut self) -> Result<u64> {
		self.topple_parallel_observed(|_| {})
	}

	pub fn topple_parallel_observed<F>(&mut self, mut observer: F) -> Result<u64>
	where
		F: FnMut(&PassReport),
	{
		let side = self.grid.side();
		let threshold = self.pattern.threshold();
		let extent = self.pattern.extent();
		let mut next = vec![0; side * side];
		self.last_topple = 0;
		self.passes = 0;
		loop {
			let pass = self.passes + 1;
			let snapshot = self.grid.cells();
			let grid = &self.grid;

			// First cell in row-major order whose topple would leave the grid.
			let overflow = snapshot
				.par_chunks(side)
				.enumerate()
				.find_map_first(|(i, row)| {
					row.iter()
						.enumerate()
						.find(|&(j, &sand)| sand >= threshold && !grid.contains_extent(i, j, extent))
						.map(|(j, _)| (i, j))
				});
			if let Some((i, j)) = overflow {
				return Err(self.overflow(i, j, pass));
			}

			let topples: u64 = snapshot.par_iter().filter(|&&sand| sand >= threshold).count() as u64;
			if topples == 0 {
				break;
			}

			let offsets = self.pattern.offsets();
			next.par_chunks_mut(side).enumerate().for_each(|(i, row)| {
				for (j, out) in row.iter_mut().enumerate() {
					let sand = snapshot[i * side + j];
					let mut height = if sand >= threshold { sand % threshold } else { sand };
					for o in offsets {
						// the neighbour that reaches (i, j) through this offset
						let src = i.checked_add_signed(-o.dx).zip(j.checked_add_signed(-o.dy));
						if let Some((si, sj)) = src {
							if si < side && sj < side {
								let s = snapshot[si * side + sj];
								if s >= threshold {
									height += s / threshold;
								}
							}
						}
					}
					*out = height;
				}
			});
			std::mem::swap(self.grid.cells_mut(), &mut next);

			self.passes = pass;
			self.last_topple += topples;
			debug!(pass, topples, "parallel pass complete");
			observer(&PassReport { pass, topples });
		}
		info!(passes = self.passes, topples = self.last_topple, "stable");
		Ok(self.passes)
	}
}
