//! Destinations for a stable grid.

use std::io::Write;

use crate::error::{Error, Result};
use crate::Cell;

/// Consumes a grid as a sequence of equal-length rows.
pub trait GridSink {
	fn write_rows(&mut self, rows: &[&[Cell]]) -> Result<()>;
}

/// File name for a run, built from all three run inputs.
pub fn output_file_name(power: u32, pattern: &str, seed: &str) -> String {
	format!("2_{}_{}_{}.csv", power, pattern, seed)
}

/// Comma-separated heights, one line per row.
pub struct CsvSink<W: Write> {
	writer: W,
}

impl<W: Write> CsvSink<W> {
	pub fn new(writer: W) -> CsvSink<W> {
		CsvSink { writer }
	}

	pub fn into_inner(self) -> W {
		self.writer
	}
}

impl<W: Write> GridSink for CsvSink<W> {
	fn write_rows(&mut self, rows: &[&[Cell]]) -> Result<()> {
		for row in rows {
			let line: Vec<String> = row.iter().map(Cell::to_string).collect();
			writeln!(self.writer, "{}", line.join(","))?;
		}
		self.writer.flush()?;
		Ok(())
	}
}

const COLORS: [[u8; 4]; 12] = [
	[0, 0, 0, 255],
	[64, 128, 0, 255],
	[118, 8, 170, 255],
	[255, 214, 0, 255],
	[0, 112, 192, 255],
	[220, 60, 40, 255],
	[30, 180, 160, 255],
	[240, 140, 200, 255],
	[120, 80, 30, 255],
	[180, 180, 180, 255],
	[90, 200, 80, 255],
	[255, 255, 255, 255],
];

/// One RGBA pixel per cell, coloured by height.
pub struct PngSink<W: Write> {
	writer: Option<W>,
}

impl<W: Write> PngSink<W> {
	pub fn new(writer: W) -> PngSink<W> {
		PngSink { writer: Some(writer) }
	}
}

impl<W: Write> GridSink for PngSink<W> {
	/// Encodes the image; a PNG sink takes exactly one grid.
	fn write_rows(&mut self, rows: &[&[Cell]]) -> Result<()> {
		let writer = self.writer.take().ok_or_else(|| Error::invalid("PNG sink already written"))?;
		let width = rows.first().map_or(0, |r| r.len());
		if width == 0 || rows.iter().any(|r| r.len() != width) {
			return Err(Error::invalid("PNG needs a non-empty grid with rows of equal length"));
		}
		let mut pixels = Vec::with_capacity(rows.len() * width * 4);
		for row in rows {
			for &el in row.iter() {
				let idx = usize::try_from(el).map_or(COLORS.len() - 1, |v| v.min(COLORS.len() - 1));
				pixels.extend_from_slice(&COLORS[idx]);
			}
		}
		repng::encode(writer, width as u32, rows.len() as u32, &pixels)?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_csv_rows() {
		let mut sink = CsvSink::new(Vec::new());
		sink.write_rows(&[&[0, 1, 0][..], &[1, 12, 1][..]]).unwrap();
		let out = String::from_utf8(sink.into_inner()).unwrap();
		assert_eq!(out, "0,1,0\n1,12,1\n");
	}

	#[test]
	fn test_output_file_name() {
		assert_eq!(output_file_name(10, "+", "."), "2_10_+_..csv");
		assert_ne!(output_file_name(10, "o", "x"), output_file_name(10, "x", "o"));
	}

	#[test]
	fn test_png_signature() {
		let mut buf = Vec::new();
		{
			let mut sink = PngSink::new(&mut buf);
			sink.write_rows(&[&[0, 1, 2][..], &[3, 20, 0][..]]).unwrap();
			assert!(sink.write_rows(&[&[0][..]]).is_err());
		}
		assert_eq!(&buf[..8], &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a]);
	}

	#[test]
	fn test_png_rejects_ragged_rows() {
		let mut sink = PngSink::new(Vec::new());
		assert!(sink.write_rows(&[&[0, 1][..], &[0][..]]).is_err());
	}
}
