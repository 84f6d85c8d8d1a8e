//! Error types for sandpile construction, toppling and output.

use thiserror::Error;

/// Crate result type alias.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
	/// Bad power, unknown pattern or seed key, or a rejected configuration.
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),

	/// A topple tried to send sand outside the grid.
	///
	/// `pass` is 1-based; pass 0 means the seed itself did not fit.
	#[error("Grid overflow at ({row}, {col}) with offset ({dx}, {dy}) in pass {pass}: the grid is too small for this pattern and mass")]
	GridOverflow {
		row: usize,
		col: usize,
		dx: isize,
		dy: isize,
		pass: u64,
	},

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
}

impl Error {
	pub(crate) fn invalid(msg: impl Into<String>) -> Error {
		Error::InvalidArgument(msg.into())
	}
}
