//! Average tile colors and their hexadecimal form.

use std::fmt;

/// A quantized RGB color, one byte per channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileColor {
	pub r: u8,
	pub g: u8,
	pub b: u8,
}

impl TileColor {
	#[must_use]
	pub fn new(r: u8, g: u8, b: u8) -> TileColor {
		TileColor { r, g, b }
	}

	/// Each channel as a two-digit, zero-padded, lowercase hex string.
	#[must_use]
	pub fn hex_channels(&self) -> [String; 3] {
		[self.r, self.g, self.b].map(|c| format!("{c:02x}"))
	}

	/// The three channels concatenated, e.g. `"0a7fff"`.
	#[must_use]
	pub fn to_hex(&self) -> String {
		self.hex_channels().concat()
	}
}

impl fmt::Display for TileColor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.to_hex())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(TileColor::new(0, 0, 0), "000000")]
	#[case(TileColor::new(255, 255, 255), "ffffff")]
	#[case(TileColor::new(10, 127, 1), "0a7f01")]
	fn hex(#[case] color: TileColor, #[case] expected: &str) {
		assert_eq!(color.to_hex(), expected);
	}

	#[test]
	fn channels_are_zero_padded() {
		assert_eq!(TileColor::new(1, 2, 171).hex_channels(), ["01", "02", "ab"]);
		assert_eq!(TileColor::new(1, 2, 171).to_string(), "#0102ab");
	}
}
