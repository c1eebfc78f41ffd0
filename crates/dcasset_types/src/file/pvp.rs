//! `.PVP` palette file support.
//!
//! # File Structure
//!
//! | Offset | Size | Field         | Description                          |
//! |--------|------|---------------|--------------------------------------|
//! | 0x00   | 4    | `magic`       | "PVPL"                               |
//! | 0x04   | 4    | `data_size`   | Size of the data following this field|
//! | 0x08   | 4    | `format`      | Color format code of the entries     |
//! | 0x0C   | 2    | `unknown`     | Unused                               |
//! | 0x0E   | 2    | `entry_count` | Number of palette entries            |
//! | 0x10   | ...  | entries       | 2 bytes each, 4 for ARGB8888         |
//!
//! The same [`Palette`] type also carries the embedded codebook of
//! vector-quantized PVR textures.

use std::{fmt, io::Read};

use serde::{Deserialize, Serialize};

use super::{
	DcFileError, FileType,
	color::{Color, ColorFormat},
	reader::ByteCursor,
};

mod constants {
	/// Magic bytes for `.PVP` files
	pub const MAGIC: [u8; 4] = *b"PVPL";

	/// Size of the header in bytes
	pub const HEADER_SIZE: usize = 16;
}

/// PVP file header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Header {
	/// Size of the data after the `data_size` field
	pub data_size: u32,
	/// Raw format code
	pub format_code: u32,
	/// Unused field
	pub unknown: u16,
	/// Number of entries
	pub entry_count: u16,
}

impl Header {
	/// Size of the header in bytes
	pub const SIZE: usize = constants::HEADER_SIZE;

	/// Parses the header at the start of `data`.
	pub fn from_bytes(data: &[u8]) -> Result<Self, DcFileError> {
		let mut cursor = ByteCursor::new(data);
		Self::read(&mut cursor)
	}

	fn read(cursor: &mut ByteCursor<'_>) -> Result<Self, DcFileError> {
		let magic = cursor.read_magic()?;
		if magic != constants::MAGIC {
			return Err(DcFileError::invalid_magic(FileType::Pvp, &constants::MAGIC, &magic));
		}

		Ok(Self {
			data_size: cursor.read_u32()?,
			format_code: cursor.read_u32()?,
			unknown: cursor.read_u16()?,
			entry_count: cursor.read_u16()?,
		})
	}

	/// Returns the entry color format.
	pub fn format(&self) -> Result<ColorFormat, DcFileError> {
		u8::try_from(self.format_code).ok().and_then(ColorFormat::from_u8).ok_or_else(|| {
			DcFileError::unsupported(
				FileType::Pvp,
				format!("unknown palette format code 0x{:X}", self.format_code),
			)
		})
	}
}

impl fmt::Display for Header {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"PVP {{ data_size: {}, format: 0x{:X}, entries: {} }}",
			self.data_size, self.format_code, self.entry_count
		)
	}
}

/// Ordered list of packed color values with the format that interprets them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
	format: ColorFormat,
	entries: Vec<u32>,
}

impl Palette {
	/// Creates a palette from raw packed values.
	pub fn new(format: ColorFormat, entries: Vec<u32>) -> Self {
		Self {
			format,
			entries,
		}
	}

	/// Creates an evenly spaced opaque gray ramp of `count` levels.
	///
	/// Used in place of a missing external palette for palettized textures.
	pub fn grayscale(count: usize) -> Self {
		let step = if count > 1 {
			255 / (count - 1)
		} else {
			0
		};
		let entries =
			(0..count).map(|i| Color::gray((i * step).min(255) as u8).to_argb8888()).collect();
		Self::new(ColorFormat::Argb8888, entries)
	}

	/// Parses a `.PVP` file from a byte slice.
	pub fn from_bytes(data: &[u8]) -> Result<Self, DcFileError> {
		let mut cursor = ByteCursor::new(data);
		let header = Header::read(&mut cursor)?;
		let format = header.format()?;

		cursor.seek(constants::HEADER_SIZE);
		let entries = read_entries(&mut cursor, format, header.entry_count as usize)?;

		Ok(Self::new(format, entries))
	}

	/// Parses a `.PVP` file from any reader.
	pub fn from_reader<R: Read>(reader: &mut R) -> Result<Self, DcFileError> {
		let mut data = Vec::new();
		reader.read_to_end(&mut data)?;
		Self::from_bytes(&data)
	}

	/// Opens and parses a `.PVP` file from the specified path.
	pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, DcFileError> {
		let data = std::fs::read(path)?;
		Self::from_bytes(&data)
	}

	/// Returns the color format of the entries.
	pub fn format(&self) -> ColorFormat {
		self.format
	}

	/// Returns the raw packed entries.
	pub fn entries(&self) -> &[u32] {
		&self.entries
	}

	/// Number of entries.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Returns `true` if the palette has no entries.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Returns the raw value at `index`.
	#[inline]
	pub fn get(&self, index: usize) -> Option<u32> {
		self.entries.get(index).copied()
	}

	/// Resolves `index` to a color, `None` when the index is out of range.
	pub fn color(&self, index: usize) -> Result<Option<Color>, DcFileError> {
		self.get(index).map(|raw| self.format.decode(raw)).transpose()
	}

	/// Decodes every entry to RGBA8.
	pub fn colors(&self) -> Result<Vec<Color>, DcFileError> {
		self.entries.iter().map(|&raw| self.format.decode(raw)).collect()
	}
}

/// Reads `count` packed values of `format` from the cursor.
pub(crate) fn read_entries(
	cursor: &mut ByteCursor<'_>,
	format: ColorFormat,
	count: usize,
) -> Result<Vec<u32>, DcFileError> {
	let mut entries = Vec::with_capacity(count.min(cursor.remaining()));
	for _ in 0..count {
		let raw = match format.bytes_per_pixel() {
			4 => cursor.read_u32()?,
			_ => u32::from(cursor.read_u16()?),
		};
		entries.push(raw);
	}
	Ok(entries)
}

impl TryFrom<&[u8]> for Palette {
	type Error = DcFileError;

	fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
		Self::from_bytes(value)
	}
}

impl fmt::Display for Palette {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "PVP Palette: {} {} colors", self.entries.len(), self.format)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn build_pvp(format: u32, entries: &[u32], wide: bool) -> Vec<u8> {
		let mut data = Vec::new();
		data.extend_from_slice(b"PVPL");
		let entry_size = if wide {
			4
		} else {
			2
		};
		data.extend_from_slice(&((8 + entries.len() * entry_size) as u32).to_le_bytes());
		data.extend_from_slice(&format.to_le_bytes());
		data.extend_from_slice(&0u16.to_le_bytes());
		data.extend_from_slice(&(entries.len() as u16).to_le_bytes());
		for &entry in entries {
			if wide {
				data.extend_from_slice(&entry.to_le_bytes());
			} else {
				data.extend_from_slice(&(entry as u16).to_le_bytes());
			}
		}
		data
	}

	#[test]
	fn test_parse_rgb565_palette() {
		let data = build_pvp(1, &[0xF800, 0x07E0, 0x001F], false);
		let palette = Palette::from_bytes(&data).unwrap();
		assert_eq!(palette.format(), ColorFormat::Rgb565);
		assert_eq!(palette.entries(), &[0xF800, 0x07E0, 0x001F]);
		assert_eq!(palette.color(1).unwrap(), Some(Color::rgb(0, 255, 0)));
		assert_eq!(palette.color(3).unwrap(), None);
	}

	#[test]
	fn test_parse_argb8888_palette() {
		let data = build_pvp(6, &[0x80FF_0000, 0xFF00_FF00], true);
		let palette = Palette::from_bytes(&data).unwrap();
		assert_eq!(palette.len(), 2);
		assert_eq!(palette.color(0).unwrap(), Some(Color::new(255, 0, 0, 0x80)));
	}

	#[test]
	fn test_invalid_magic() {
		let mut data = build_pvp(1, &[0], false);
		data[0] = b'X';
		assert!(matches!(Palette::from_bytes(&data), Err(DcFileError::InvalidMagic { .. })));
	}

	#[test]
	fn test_truncated_entries() {
		let mut data = build_pvp(1, &[1, 2, 3], false);
		data.truncate(data.len() - 1);
		assert!(matches!(Palette::from_bytes(&data), Err(DcFileError::OutOfBounds { .. })));
	}

	#[test]
	fn test_unknown_format_code() {
		let data = build_pvp(0x99, &[0], false);
		assert!(matches!(
			Palette::from_bytes(&data),
			Err(DcFileError::UnsupportedFormat { .. })
		));
	}

	#[test]
	fn test_grayscale_ramp() {
		let ramp = Palette::grayscale(16);
		assert_eq!(ramp.len(), 16);
		assert_eq!(ramp.color(0).unwrap(), Some(Color::gray(0)));
		assert_eq!(ramp.color(1).unwrap(), Some(Color::gray(17)));
		assert_eq!(ramp.color(15).unwrap(), Some(Color::gray(255)));

		let ramp = Palette::grayscale(256);
		assert_eq!(ramp.color(128).unwrap(), Some(Color::gray(128)));
	}
}
