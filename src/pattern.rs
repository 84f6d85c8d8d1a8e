//! Toppling and seeding patterns.
//!
//! A pattern is an ordered list of offsets. When a cell topples under a
//! pattern it sends one share to every listed offset, so the number of
//! offsets is also the toppling threshold. Listing an offset twice gives
//! that neighbour a double share.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};

/// Key reserved for seeding all sand into the centre cell.
pub const CENTRE_SEED: &str = ".";

/// Largest Chebyshev reach a pattern offset may have.
pub const MAX_REACH: usize = 1 << 16;

/// Row and column delta from the toppling cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Offset {
	pub dx: isize,
	pub dy: isize,
}

impl Offset {
	pub const fn new(dx: isize, dy: isize) -> Offset {
		Offset { dx, dy }
	}

	/// Chebyshev length: how many rings away from the cell this offset lands.
	pub fn chebyshev(&self) -> usize {
		self.dx.unsigned_abs().max(self.dy.unsigned_abs())
	}

	pub fn exceeds_unit(&self) -> bool {
		let (dx, dy) = (self.dx.unsigned_abs() as u128, self.dy.unsigned_abs() as u128);
		dx * dx + dy * dy > 1
	}
}

impl From<(isize, isize)> for Offset {
	fn from((dx, dy): (isize, isize)) -> Offset {
		Offset { dx, dy }
	}
}

/// Bounding box of a pattern's offsets, relative to the toppling cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
	pub min_dx: isize,
	pub max_dx: isize,
	pub min_dy: isize,
	pub max_dy: isize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
	name: String,
	offsets: Vec<Offset>,
	extent: Extent,
	long_reach: bool,
	seed_only: bool,
}

impl Pattern {
	pub fn new(name: &str, offsets: &[(isize, isize)]) -> Result<Pattern> {
		validate_name(name)?;
		if offsets.is_empty() {
			return Err(Error::invalid(format!("Pattern '{}' has no offsets", name)));
		}
		if let Some(&(dx, dy)) = offsets.iter().find(|&&o| Offset::from(o).chebyshev() > MAX_REACH) {
			return Err(Error::invalid(format!("Pattern '{}' offset ({}, {}) reaches further than {}", name, dx, dy, MAX_REACH)));
		}
		Ok(Pattern::from_parts(name, offsets))
	}

	fn from_parts(name: &str, offsets: &[(isize, isize)]) -> Pattern {
		let offsets: Vec<Offset> = offsets.iter().map(|&o| Offset::from(o)).collect();
		let mut extent = Extent { min_dx: 0, max_dx: 0, min_dy: 0, max_dy: 0 };
		for o in &offsets {
			extent.min_dx = extent.min_dx.min(o.dx);
			extent.max_dx = extent.max_dx.max(o.dx);
			extent.min_dy = extent.min_dy.min(o.dy);
			extent.max_dy = extent.max_dy.max(o.dy);
		}
		let long_reach = offsets.iter().any(Offset::exceeds_unit);
		Pattern {
			name: name.to_owned(),
			offsets,
			extent,
			long_reach,
			seed_only: false,
		}
	}

	/// Overrides the automatic long-reach classification used for grid sizing.
	pub fn with_long_reach(mut self, long_reach: bool) -> Pattern {
		self.long_reach = long_reach;
		self
	}

	/// Marks the pattern as usable for seeding only.
	pub fn seed_only(mut self) -> Pattern {
		self.seed_only = true;
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn offsets(&self) -> &[Offset] {
		&self.offsets
	}

	/// A cell topples once it holds at least this many grains.
	pub fn threshold(&self) -> u64 {
		self.offsets.len() as u64
	}

	pub fn reach(&self) -> usize {
		self.offsets.iter().map(Offset::chebyshev).max().unwrap_or(0)
	}

	pub fn extent(&self) -> Extent {
		self.extent
	}

	pub fn is_long_reach(&self) -> bool {
		self.long_reach
	}

	pub fn is_seed_only(&self) -> bool {
		self.seed_only
	}
}

impl fmt::Display for Pattern {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "'{}' (threshold {})", self.name, self.threshold())
	}
}

fn validate_name(name: &str) -> Result<()> {
	if name.is_empty() {
		return Err(Error::invalid("Pattern name is empty"));
	}
	if name == CENTRE_SEED {
		return Err(Error::invalid(format!("Pattern name '{}' is reserved for centre seeding", CENTRE_SEED)));
	}
	if name.contains(|c: char| c == '/' || c == '\\' || c.is_whitespace()) {
		return Err(Error::invalid(format!("Pattern name '{}' may not contain path separators or whitespace", name)));
	}
	Ok(())
}

const PLUS: &[(isize, isize)] = &[(0, 1), (0, -1), (1, 0), (-1, 0)];
const CROSS: &[(isize, isize)] = &[(1, 1), (1, -1), (-1, 1), (-1, -1)];
const RING: &[(isize, isize)] = &[(0, 1), (0, -1), (1, 0), (-1, 0), (1, 1), (1, -1), (-1, 1), (-1, -1)];
const RING_PLUS: &[(isize, isize)] = &[
	(0, 1), (0, -1), (1, 0), (-1, 0),
	(0, 1), (0, -1), (1, 0), (-1, 0),
	(1, 1), (1, -1), (-1, 1), (-1, -1),
];
const RING_CROSS: &[(isize, isize)] = &[
	(0, 1), (0, -1), (1, 0), (-1, 0),
	(1, 1), (1, -1), (-1, 1), (-1, -1),
	(1, 1), (1, -1), (-1, 1), (-1, -1),
];

const PRESETS: &[(&str, &[(isize, isize)])] = &[("+", PLUS), ("x", CROSS), ("o", RING), ("o+", RING_PLUS), ("ox", RING_CROSS)];

const SEED_PRESETS: &[(&str, &[(isize, isize)])] = &[
	("^", &[(-1, 1), (-1, -1), (-1, 1), (-1, -1)]),
	(":", &[(-1, 0), (1, 0)]),
	("-", &[(0, -1), (0, 1)]),
];

/// Named patterns, built once and then only read.
#[derive(Debug, Clone, Default)]
pub struct PatternRegistry {
	patterns: BTreeMap<String, Pattern>,
}

impl PatternRegistry {
	pub fn empty() -> PatternRegistry {
		PatternRegistry::default()
	}

	/// Registry holding the built-in toppling and seed patterns.
	pub fn with_presets() -> PatternRegistry {
		let mut r = PatternRegistry::empty();
		for &(name, offsets) in PRESETS {
			r.patterns.insert(name.to_owned(), Pattern::from_parts(name, offsets));
		}
		for &(name, offsets) in SEED_PRESETS {
			r.patterns.insert(name.to_owned(), Pattern::from_parts(name, offsets).seed_only());
		}
		r
	}

	/// Adds a pattern. Names are defined once: re-registering one is an error.
	pub fn register(&mut self, pattern: Pattern) -> Result<()> {
		if self.patterns.contains_key(pattern.name()) {
			return Err(Error::invalid(format!("Pattern '{}' is already registered", pattern.name())));
		}
		self.patterns.insert(pattern.name.clone(), pattern);
		Ok(())
	}

	/// Looks up any pattern, seed-only ones included.
	pub fn get(&self, key: &str) -> Result<&Pattern> {
		self.patterns.get(key).ok_or_else(|| {
			Error::invalid(format!(
				"Unknown pattern '{}' (known: {})",
				key,
				self.names().collect::<Vec<_>>().join(" "),
			))
		})
	}

	/// Looks up a pattern that may drive toppling.
	pub fn toppling(&self, key: &str) -> Result<&Pattern> {
		let p = self.get(key)?;
		if p.is_seed_only() {
			return Err(Error::invalid(format!("Pattern '{}' can only be used for seeding", key)));
		}
		Ok(p)
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.patterns.keys().map(String::as_str)
	}

	pub fn toppling_names(&self) -> impl Iterator<Item = &str> {
		self.patterns.values().filter(|p| !p.is_seed_only()).map(Pattern::name)
	}
}
