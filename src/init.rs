//! Grid sizing and initial sand placement.

use std::fmt;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::grid::Grid;
use crate::pattern::{Pattern, PatternRegistry, CENTRE_SEED};
use crate::{Cell, GridSandpile};

/// Where the starting sand goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Seed {
	/// Everything on the centre cell.
	Centre,
	/// Split across the offsets of a named pattern, relative to the centre.
	Pattern(String),
}

impl Seed {
	pub fn parse(key: &str) -> Seed {
		if key == CENTRE_SEED {
			Seed::Centre
		} else {
			Seed::Pattern(key.to_owned())
		}
	}

	pub fn key(&self) -> &str {
		match self {
			Seed::Centre => CENTRE_SEED,
			Seed::Pattern(k) => k.as_str(),
		}
	}
}

impl fmt::Display for Seed {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{}", self.key())
	}
}

/// What happens to the grains left over when the sand does not split evenly
/// across the seed cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedRemainder {
	/// One extra grain each to the first seed offsets, in pattern order.
	Spread,
	/// Dropped, so the grid starts with less than the requested mass.
	Discard,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizingConfig {
	/// Side length multiplier for long-reach toppling patterns.
	pub oversize_factor: f64,
	pub seed_remainder: SeedRemainder,
	/// Largest side length that will be allocated.
	pub max_side: usize,
}

impl Default for SizingConfig {
	fn default() -> SizingConfig {
		SizingConfig {
			oversize_factor: 1.5,
			seed_remainder: SeedRemainder::Spread,
			max_side: 1 << 15,
		}
	}
}

/// Total grains for a power of two; `2^power` must fit a cell.
pub fn sand_for_power(power: u32) -> Result<Cell> {
	Cell::checked_pow(2, power).ok_or_else(|| Error::invalid(format!("Power {} is too large: 2^{} grains do not fit in a cell", power, power)))
}

/// Side length for `sand` grains toppled under `topple` and seeded with `seed`
/// (`None` for the centre cell). Always odd.
pub fn side_length(sand: Cell, topple: &Pattern, seed: Option<&Pattern>, config: &SizingConfig) -> Result<usize> {
	if !config.oversize_factor.is_finite() || config.oversize_factor < 1.0 {
		return Err(Error::invalid(format!("Oversize factor must be finite and at least 1, got {}", config.oversize_factor)));
	}
	let too_large = || Error::invalid(format!("Grid for {} grains exceeds the side limit of {}", sand, config.max_side));
	let mut side = sand.isqrt() as usize + 1;
	if topple.is_long_reach() {
		let scaled = (side as f64 * config.oversize_factor).ceil();
		if scaled > config.max_side as f64 {
			return Err(too_large());
		}
		side = scaled as usize;
	}
	let seed_reach = seed.map_or(0, Pattern::reach);
	let seed_margin = seed_reach.checked_mul(2).ok_or_else(too_large)?;
	let footprint = topple
		.reach()
		.checked_add(seed_reach)
		.and_then(|r| r.checked_mul(2))
		.and_then(|r| r.checked_add(1))
		.ok_or_else(too_large)?;
	side = side.checked_add(seed_margin).ok_or_else(too_large)?.max(footprint);
	if side % 2 == 0 {
		side = side.checked_add(1).ok_or_else(too_large)?;
	}
	if side > config.max_side {
		return Err(too_large());
	}
	Ok(side)
}

/// Builds a seeded sandpile holding `2^power` grains, ready to topple.
pub fn initialise(registry: &PatternRegistry, power: u32, pattern: &str, seed: &Seed, config: &SizingConfig) -> Result<GridSandpile> {
	let sand = sand_for_power(power)?;
	let topple = registry.toppling(pattern)?;
	let seed_pattern = match seed {
		Seed::Centre => None,
		Seed::Pattern(key) => Some(registry.get(key)?),
	};
	let side = side_length(sand, topple, seed_pattern, config)?;
	let mut grid = Grid::new(side)?;
	let c = grid.centre();
	debug!(sand, side, pattern = topple.name(), seed = seed.key(), "initialising grid");

	match seed_pattern {
		None => {
			if let Some(cell) = grid.get_mut(c, c) {
				*cell = sand;
			}
		}
		Some(sp) => {
			let count = sp.threshold();
			let share = sand / count;
			let remainder = sand % count;
			for (k, &o) in sp.offsets().iter().enumerate() {
				let (r, col) = grid.offset(c, c, o).ok_or(Error::GridOverflow {
					row: c,
					col: c,
					dx: o.dx,
					dy: o.dy,
					pass: 0,
				})?;
				let extra = match config.seed_remainder {
					SeedRemainder::Spread if (k as u64) < remainder => 1,
					_ => 0,
				};
				if let Some(cell) = grid.get_mut(r, col) {
					*cell += share + extra;
				}
			}
			if config.seed_remainder == SeedRemainder::Discard && remainder > 0 {
				warn!(lost = remainder, seed = sp.name(), "seed remainder discarded");
			}
		}
	}
	Ok(GridSandpile::new(grid, topple.clone()))
}
