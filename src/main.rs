//! Topples `2^power` grains of sand and writes the stable grid as CSV.
//!
//! ```bash
//! # 1024 grains, 4-neighbour toppling, all sand on the centre cell
//! sandheap 10 + .
//!
//! # 2^16 grains, 8-neighbour toppling, seeded on the two cells above/below centre
//! sandheap 16 o :
//! ```

use std::fs::File;
use std::io::BufWriter;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use sandheap::{initialise, output_file_name, CsvSink, Error, GridSink, PatternRegistry, Result, Seed, SizingConfig};

/// Abelian sandpile simulator
#[derive(Parser)]
#[command(name = "sandheap")]
#[command(author, version, about, long_about = None)]
struct Cli {
	/// Total sand is 2^power grains
	#[arg(allow_hyphen_values = true)]
	power: String,

	/// Toppling pattern: +, x, o, o+ or ox
	pattern: String,

	/// Seed pattern, or '.' to put all sand on the centre cell
	seed: String,
}

#[derive(Debug)]
struct RunConfig {
	power: u32,
	pattern: String,
	seed: Seed,
}

impl RunConfig {
	fn new(cli: Cli) -> Result<RunConfig> {
		let power = cli
			.power
			.trim()
			.parse::<u32>()
			.map_err(|e| Error::InvalidArgument(format!("Power must be a non-negative integer, got '{}': {}", cli.power, e)))?;
		Ok(RunConfig {
			power,
			pattern: cli.pattern,
			seed: Seed::parse(&cli.seed),
		})
	}
}

fn setup_logging() {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::new("info"))
		.with_writer(std::io::stderr)
		.with_target(false)
		.without_time()
		.init();
}

fn run(config: RunConfig) -> Result<()> {
	let registry = PatternRegistry::with_presets();
	let mut pile = initialise(&registry, config.power, &config.pattern, &config.seed, &SizingConfig::default())?;
	println!("Starting sand: {}", pile.grid().mass());
	println!("Pattern: {}", pile.pattern());
	println!("Seed: {}", config.seed);
	println!("Side length: {}", pile.grid().side());

	let start = Instant::now();
	let passes = pile.topple()?;
	let elapsed = start.elapsed();

	let fname = output_file_name(config.power, &config.pattern, config.seed.key());
	let mut sink = CsvSink::new(BufWriter::new(File::create(&fname)?));
	let rows: Vec<&[sandheap::Cell]> = pile.grid().rows().collect();
	sink.write_rows(&rows)?;

	println!("Elapsed: {:?}", elapsed);
	println!("Passes: {}", passes);
	println!("Topples: {}", pile.last_topple());
	println!("Output: {}", fname);
	Ok(())
}

fn main() -> ExitCode {
	let cli = Cli::parse();
	setup_logging();

	let result = RunConfig::new(cli).and_then(run);
	match result {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			error!("{}", e);
			ExitCode::FAILURE
		}
	}
}
