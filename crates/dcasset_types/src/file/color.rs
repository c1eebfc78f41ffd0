//! Packed pixel formats and their conversion to RGBA8.
//!
//! | Code | Format   | Bits      | Notes                                  |
//! |------|----------|-----------|----------------------------------------|
//! | 0    | ARGB1555 | 1-5-5-5   | alpha is 0 or 255                      |
//! | 1    | RGB565   | 5-6-5     | opaque                                 |
//! | 2    | ARGB4444 | 4-4-4-4   | each nibble scaled ×17                 |
//! | 3    | YUV422   |           | not supported                          |
//! | 4    | BUMP     |           | not supported                          |
//! | 5    | RGB555   | x-5-5-5   | opaque, top bit ignored                |
//! | 6    | ARGB8888 | 8-8-8-8   | 32-bit, copied as is                   |
//!
//! Narrow channels are widened by bit replication so that full intensity maps
//! to 255.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{DcFileError, FileType};

/// RGBA color representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
	/// Red component (0-255)
	pub r: u8,
	/// Green component (0-255)
	pub g: u8,
	/// Blue component (0-255)
	pub b: u8,
	/// Alpha component (0-255)
	pub a: u8,
}

impl Color {
	/// Creates a new RGBA color.
	pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
		Self {
			r,
			g,
			b,
			a,
		}
	}

	/// Creates a new RGB color with full opacity.
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self::new(r, g, b, 255)
	}

	/// Creates a new opaque grayscale color.
	pub const fn gray(value: u8) -> Self {
		Self::rgb(value, value, value)
	}

	/// Creates a transparent black color.
	pub const fn transparent() -> Self {
		Self::new(0, 0, 0, 0)
	}

	/// Packs the color as a 32-bit ARGB8888 value.
	pub const fn to_argb8888(&self) -> u32 {
		((self.a as u32) << 24) | ((self.r as u32) << 16) | ((self.g as u32) << 8) | (self.b as u32)
	}

	/// Unpacks a 32-bit ARGB8888 value.
	pub const fn from_argb8888(argb: u32) -> Self {
		Self {
			r: ((argb >> 16) & 0xFF) as u8,
			g: ((argb >> 8) & 0xFF) as u8,
			b: (argb & 0xFF) as u8,
			a: ((argb >> 24) & 0xFF) as u8,
		}
	}

	/// Returns the components as `[r, g, b, a]`.
	pub const fn to_array(&self) -> [u8; 4] {
		[self.r, self.g, self.b, self.a]
	}
}

impl Default for Color {
	fn default() -> Self {
		Self::transparent()
	}
}

impl fmt::Display for Color {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "RGBA({}, {}, {}, {})", self.r, self.g, self.b, self.a)
	}
}

/// Color encodings used by PVR textures and PVP palettes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ColorFormat {
	/// 1-bit alpha, 5-bit RGB
	Argb1555 = 0,
	/// 5-6-5 RGB
	Rgb565 = 1,
	/// 4 bits per channel
	Argb4444 = 2,
	/// YUV 4:2:2
	Yuv422 = 3,
	/// Bump map
	Bump = 4,
	/// 5-bit RGB, padding bit
	Rgb555 = 5,
	/// 8 bits per channel
	Argb8888 = 6,
}

impl ColorFormat {
	/// Converts a format code to `ColorFormat`.
	pub fn from_u8(value: u8) -> Option<Self> {
		match value {
			0 => Some(Self::Argb1555),
			1 => Some(Self::Rgb565),
			2 => Some(Self::Argb4444),
			3 => Some(Self::Yuv422),
			4 => Some(Self::Bump),
			5 => Some(Self::Rgb555),
			6 => Some(Self::Argb8888),
			_ => None,
		}
	}

	/// Converts `ColorFormat` to its format code.
	pub fn to_u8(self) -> u8 {
		self as u8
	}

	/// Size of one packed value in bytes.
	pub fn bytes_per_pixel(self) -> usize {
		match self {
			Self::Argb8888 => 4,
			_ => 2,
		}
	}

	/// Converts a packed value into RGBA8.
	///
	/// # Errors
	///
	/// Returns [`DcFileError::UnsupportedFormat`] for YUV422 and bump maps.
	pub fn decode(self, raw: u32) -> Result<Color, DcFileError> {
		let color = match self {
			Self::Argb1555 => {
				let alpha = if raw & 0x8000 != 0 {
					0xFF
				} else {
					0
				};
				Color::new(expand5(raw >> 10), expand5(raw >> 5), expand5(raw), alpha)
			}
			Self::Rgb555 => Color::rgb(expand5(raw >> 10), expand5(raw >> 5), expand5(raw)),
			Self::Rgb565 => Color::rgb(expand5(raw >> 11), expand6(raw >> 5), expand5(raw)),
			Self::Argb4444 => Color::new(
				expand4(raw >> 8),
				expand4(raw >> 4),
				expand4(raw),
				expand4(raw >> 12),
			),
			Self::Argb8888 => Color::from_argb8888(raw),
			Self::Yuv422 | Self::Bump => {
				return Err(DcFileError::unsupported(
					FileType::Pvr,
					format!("color format {self} cannot be decoded"),
				));
			}
		};
		Ok(color)
	}
}

impl fmt::Display for ColorFormat {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Argb1555 => write!(f, "ARGB1555"),
			Self::Rgb565 => write!(f, "RGB565"),
			Self::Argb4444 => write!(f, "ARGB4444"),
			Self::Yuv422 => write!(f, "YUV422"),
			Self::Bump => write!(f, "BUMP"),
			Self::Rgb555 => write!(f, "RGB555"),
			Self::Argb8888 => write!(f, "ARGB8888"),
		}
	}
}

#[inline]
fn expand4(v: u32) -> u8 {
	((v & 0x0F) * 17) as u8
}

#[inline]
fn expand5(v: u32) -> u8 {
	let v = ((v & 0x1F) << 3) as u8;
	v | (v >> 5)
}

#[inline]
fn expand6(v: u32) -> u8 {
	let v = ((v & 0x3F) << 2) as u8;
	v | (v >> 6)
}
