use proptest::prelude::*;

use sandheap::init::sand_for_power;
use sandheap::{initialise, Cell, Error, Grid, GridSandpile, PatternRegistry, ScanOrder, Seed, SeedRemainder, SizingConfig};

const SEEDS: [&str; 9] = [".", "+", "x", "o", "o+", "ox", "^", ":", "-"];

fn stabilised(power: u32, pattern: &str, seed: &str) -> GridSandpile {
	let registry = PatternRegistry::with_presets();
	let mut pile = initialise(&registry, power, pattern, &Seed::parse(seed), &SizingConfig::default()).unwrap();
	pile.topple().unwrap();
	pile
}

#[test]
fn test_no_overflow_across_powers_patterns_and_seeds() {
	let registry = PatternRegistry::with_presets();
	let config = SizingConfig::default();
	let patterns: Vec<&str> = registry.toppling_names().collect();
	assert_eq!(patterns.len(), 5);
	for power in 0..=12 {
		for pattern in &patterns {
			for seed in SEEDS {
				let mut pile = initialise(&registry, power, pattern, &Seed::parse(seed), &config).unwrap();
				match pile.topple() {
					Ok(_) => {}
					Err(e) => panic!("power {} pattern {} seed {}: {}", power, pattern, seed, e),
				}
				assert_eq!(pile.grid().mass(), 1u128 << power, "power {} pattern {} seed {}", power, pattern, seed);
				assert!(pile.is_stable());
			}
		}
	}
}

#[test]
fn test_discarded_remainder_is_the_only_loss() {
	let registry = PatternRegistry::with_presets();
	let config = SizingConfig { seed_remainder: SeedRemainder::Discard, ..SizingConfig::default() };
	// 2^7 = 128 over 12 offsets: 10 each, 8 grains lost
	let mut pile = initialise(&registry, 7, "o", &Seed::parse("o+"), &config).unwrap();
	assert_eq!(pile.grid().mass(), 120);
	pile.topple().unwrap();
	assert_eq!(pile.grid().mass(), 120);
}

#[test]
fn test_toppling_a_stable_grid_changes_nothing() {
	for pattern in ["+", "x", "o", "o+", "ox"] {
		let mut pile = stabilised(8, pattern, ".");
		let before = pile.grid().clone();
		assert_eq!(pile.topple().unwrap(), 0);
		assert_eq!(pile.last_topple(), 0);
		assert_eq!(pile.grid(), &before);
		assert_eq!(pile.topple_parallel().unwrap(), 0);
		assert_eq!(pile.grid(), &before);
	}
}

#[test]
fn test_scan_orders_agree() {
	let registry = PatternRegistry::with_presets();
	let config = SizingConfig::default();
	for pattern in ["+", "x", "o", "o+", "ox"] {
		for seed in [".", "^", "o"] {
			let start = initialise(&registry, 9, pattern, &Seed::parse(seed), &config).unwrap();
			let mut row = start.clone();
			row.topple().unwrap();
			for order in [ScanOrder::ColumnMajor, ScanOrder::Shuffled(7), ScanOrder::Shuffled(1234)] {
				let mut other = start.clone();
				other.topple_in_order(order).unwrap();
				assert_eq!(row.grid(), other.grid(), "pattern {} seed {} order {:?}", pattern, seed, order);
			}
			let mut par = start.clone();
			par.topple_parallel().unwrap();
			assert_eq!(row.grid(), par.grid(), "pattern {} seed {} parallel", pattern, seed);
		}
	}
}

#[test]
fn test_plus_sixteen_is_rotation_symmetric() {
	let pile = stabilised(4, "+", ".");
	let g = pile.grid();
	let n = g.side();
	assert!(n >= 5 && n % 2 == 1);
	for i in 0..n {
		for j in 0..n {
			assert_eq!(g.get(i, j), g.get(j, n - 1 - i), "cell ({}, {})", i, j);
		}
	}
	assert_eq!(g.mass(), 16);
}

#[test]
fn test_single_grain_never_topples() {
	let registry = PatternRegistry::with_presets();
	for pattern in ["+", "x", "o", "o+", "ox"] {
		let mut pile = initialise(&registry, 0, pattern, &Seed::Centre, &SizingConfig::default()).unwrap();
		assert!(pile.pattern().threshold() >= 2);
		assert_eq!(pile.topple().unwrap(), 0);
		let g = pile.grid();
		let c = g.centre();
		for (i, row) in g.rows().enumerate() {
			for (j, &v) in row.iter().enumerate() {
				let expected = if (i, j) == (c, c) { 1 } else { 0 };
				assert_eq!(v, expected);
			}
		}
	}
}

#[test]
fn test_undersized_grid_overflows() {
	let registry = PatternRegistry::with_presets();
	let mut grid = Grid::new(5).unwrap();
	*grid.get_mut(2, 2).unwrap() = sand_for_power(8).unwrap();
	let mut pile = GridSandpile::new(grid, registry.toppling("+").unwrap().clone());
	assert!(matches!(pile.topple(), Err(Error::GridOverflow { pass: 1, .. })));
}

fn centre_block(side: usize, heights: &[Cell]) -> Grid {
	let mut grid = Grid::new(side).unwrap();
	let c = grid.centre();
	for (k, &h) in heights.iter().enumerate() {
		let (i, j) = (c - 2 + k / 5, c - 2 + k % 5);
		*grid.get_mut(i, j).unwrap() = h;
	}
	grid
}

proptest! {
	#[test]
	fn prop_final_grid_independent_of_order(
		heights in prop::collection::vec(0u64..7, 25),
		pattern in prop::sample::select(vec!["+", "x", "o"]),
		shuffle_seed in any::<u64>(),
	) {
		let registry = PatternRegistry::with_presets();
		let p = registry.toppling(pattern).unwrap().clone();
		let start = GridSandpile::new(centre_block(21, &heights), p);
		let mass = start.grid().mass();

		let mut row = start.clone();
		row.topple().unwrap();
		let mut col = start.clone();
		col.topple_in_order(ScanOrder::ColumnMajor).unwrap();
		let mut shuffled = start.clone();
		shuffled.topple_in_order(ScanOrder::Shuffled(shuffle_seed)).unwrap();
		let mut par = start.clone();
		par.topple_parallel().unwrap();

		prop_assert!(row.is_stable());
		prop_assert_eq!(row.grid().mass(), mass);
		prop_assert_eq!(row.grid(), col.grid());
		prop_assert_eq!(row.grid(), shuffled.grid());
		prop_assert_eq!(row.grid(), par.grid());
	}
}
