//! `.PVR` texture format support.
//!
//! # File Structure
//!
//! An optional global-index prefix is followed by the texture chunk:
//!
//! | Offset | Size | Field          | Description                              |
//! |--------|------|----------------|------------------------------------------|
//! | 0x00   | 4    | `magic`        | "GBIX" (optional prefix)                 |
//! | 0x04   | 4    | `size`         | Size of the prefix body                  |
//! | 0x08   | 4    | `global_index` | Present when `size >= 4`                 |
//! | +0x00  | 4    | `magic`        | "PVRT"                                   |
//! | +0x04  | 4    | `data_size`    | Size of the texture chunk after this field|
//! | +0x08  | 1    | `color_format` | See [`ColorFormat`]                      |
//! | +0x09  | 1    | `pixel_layout` | See [`PixelLayout`]                      |
//! | +0x0A  | 2    | padding        |                                          |
//! | +0x0C  | 2    | `width`        | Width in pixels                          |
//! | +0x0E  | 2    | `height`       | Height in pixels                         |
//! | +0x10  | ...  | payload        | Layout-specific pixel data               |
//!
//! `data_size` is kept for container bookkeeping only; the payload is read up
//! to whatever the layout requires.
//!
//! # Examples
//!
//! ```no_run
//! use dcasset_types::file::pvr::File;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let texture = File::open("TITLE.PVR")?;
//! println!("{}", texture.header());
//! let rgba: Vec<u8> = texture.into_pixels().into_raw();
//! # Ok(())
//! # }
//! ```

mod decode;

use std::{fmt::Display, io::Read};

use log::debug;
use serde::{Deserialize, Serialize};

use super::{
	DcFileError, DecodeConfig, FileType,
	color::{Color, ColorFormat},
	pvp::Palette,
	reader::ByteCursor,
	twiddle::TwiddleCache,
};

pub(crate) mod constants {
	/// Magic bytes of the optional global-index prefix
	pub const GBIX_MAGIC: [u8; 4] = *b"GBIX";

	/// Magic bytes of the texture chunk
	pub const PVRT_MAGIC: [u8; 4] = *b"PVRT";

	/// Size of the magic and size fields preceding chunk data
	pub const CHUNK_PREFIX_SIZE: usize = 8;
}

/// Pixel storage layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PixelLayout {
	/// Square, twiddled
	Twiddled = 0x01,
	/// Square, twiddled, with mipmaps
	TwiddledMm = 0x02,
	/// Vector quantized
	Vq = 0x03,
	/// Vector quantized, with mipmaps
	VqMm = 0x04,
	/// 4-bit palette indices
	Palettize4 = 0x05,
	/// 4-bit palette indices, with mipmaps
	Palettize4Mm = 0x06,
	/// 8-bit palette indices
	Palettize8 = 0x07,
	/// 8-bit palette indices, with mipmaps
	Palettize8Mm = 0x08,
	/// Row-major, not twiddled
	Rectangle = 0x09,
	/// Row-major with a stride
	Stride = 0x0B,
	/// Rectangle made of twiddled squares
	TwiddledRectangle = 0x0D,
	/// Bitmap
	Bmp = 0x0E,
	/// Bitmap, with mipmaps
	BmpMm = 0x0F,
	/// Vector quantized with a small codebook
	SmallVq = 0x10,
	/// Vector quantized with a small codebook, with mipmaps
	SmallVqMm = 0x11,
	/// Square, twiddled, with mipmaps (alternate code)
	TwiddledMmAlt = 0x12,
}

impl PixelLayout {
	/// Converts a layout code to `PixelLayout`.
	pub fn from_u8(value: u8) -> Option<Self> {
		let layout = match value {
			0x01 => Self::Twiddled,
			0x02 => Self::TwiddledMm,
			0x03 => Self::Vq,
			0x04 => Self::VqMm,
			0x05 => Self::Palettize4,
			0x06 => Self::Palettize4Mm,
			0x07 => Self::Palettize8,
			0x08 => Self::Palettize8Mm,
			0x09 => Self::Rectangle,
			0x0B => Self::Stride,
			0x0D => Self::TwiddledRectangle,
			0x0E => Self::Bmp,
			0x0F => Self::BmpMm,
			0x10 => Self::SmallVq,
			0x11 => Self::SmallVqMm,
			0x12 => Self::TwiddledMmAlt,
			_ => return None,
		};
		Some(layout)
	}

	/// Converts `PixelLayout` to its code.
	pub fn to_u8(self) -> u8 {
		self as u8
	}

	/// Returns `true` for layouts that store smaller mip levels.
	pub fn has_mipmaps(self) -> bool {
		matches!(
			self,
			Self::TwiddledMm
				| Self::TwiddledMmAlt
				| Self::VqMm
				| Self::Palettize4Mm
				| Self::Palettize8Mm
				| Self::BmpMm
				| Self::SmallVqMm
		)
	}

	/// Returns `true` for the small-codebook VQ layouts.
	pub fn is_small_vq(self) -> bool {
		matches!(self, Self::SmallVq | Self::SmallVqMm)
	}

	/// Returns `true` for layouts that need power-of-two dimensions.
	pub fn requires_power_of_two(self) -> bool {
		!matches!(self, Self::Rectangle | Self::Stride | Self::Bmp | Self::BmpMm)
	}
}

impl Display for PixelLayout {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let name = match self {
			Self::Twiddled => "TWIDDLED",
			Self::TwiddledMm => "TWIDDLED_MM",
			Self::Vq => "VQ",
			Self::VqMm => "VQ_MM",
			Self::Palettize4 => "PALETTIZE4",
			Self::Palettize4Mm => "PALETTIZE4_MM",
			Self::Palettize8 => "PALETTIZE8",
			Self::Palettize8Mm => "PALETTIZE8_MM",
			Self::Rectangle => "RECTANGLE",
			Self::Stride => "STRIDE",
			Self::TwiddledRectangle => "TWIDDLED_RECTANGLE",
			Self::Bmp => "BMP",
			Self::BmpMm => "BMP_MM",
			Self::SmallVq => "SMALL_VQ",
			Self::SmallVqMm => "SMALL_VQ_MM",
			Self::TwiddledMmAlt => "TWIDDLED_MM_ALT",
		};
		write!(f, "{name}")
	}
}

/// Header of a `.PVR` texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Header {
	color_format: ColorFormat,
	pixel_layout: PixelLayout,
	width: u16,
	height: u16,
	data_size: u32,
	global_index: Option<u32>,
	used_external_palette: bool,
	#[serde(skip)]
	payload_offset: usize,
}

impl Header {
	/// Parses the header (global-index prefix included) from a byte slice.
	///
	/// This allows peeking at dimensions and formats without decoding pixels.
	pub fn from_bytes(data: &[u8]) -> Result<Self, DcFileError> {
		let mut cursor = ByteCursor::new(data);
		Self::read(&mut cursor)
	}

	/// Parses the header and leaves the cursor at the start of the payload.
	pub(crate) fn read(cursor: &mut ByteCursor<'_>) -> Result<Self, DcFileError> {
		let mut global_index = None;

		if cursor.peek_magic(&constants::GBIX_MAGIC) {
			cursor.skip(4);
			let size = cursor.read_u32()? as usize;
			let body_start = cursor.tell();
			if size >= 4 {
				global_index = Some(cursor.read_u32()?);
			}
			cursor.seek(body_start.saturating_add(size));
		}

		let magic = cursor.read_magic()?;
		if magic != constants::PVRT_MAGIC {
			return Err(DcFileError::invalid_magic(FileType::Pvr, &constants::PVRT_MAGIC, &magic));
		}

		let data_size = cursor.read_u32()?;
		let color_code = cursor.read_u8()?;
		let layout_code = cursor.read_u8()?;
		cursor.skip(2);
		let width = cursor.read_u16()?;
		let height = cursor.read_u16()?;

		let pixel_layout = PixelLayout::from_u8(layout_code).ok_or_else(|| {
			DcFileError::unsupported(FileType::Pvr, format!("unknown pixel layout 0x{layout_code:02X}"))
		})?;
		let color_format = ColorFormat::from_u8(color_code).ok_or_else(|| {
			DcFileError::unsupported(FileType::Pvr, format!("unknown color format 0x{color_code:02X}"))
		})?;

		Ok(Self {
			color_format,
			pixel_layout,
			width,
			height,
			data_size,
			global_index,
			used_external_palette: false,
			payload_offset: cursor.tell(),
		})
	}

	/// Color encoding of the pixel data.
	pub fn color_format(&self) -> ColorFormat {
		self.color_format
	}

	/// Storage layout of the pixel data.
	pub fn pixel_layout(&self) -> PixelLayout {
		self.pixel_layout
	}

	/// Width in pixels.
	pub fn width(&self) -> u16 {
		self.width
	}

	/// Height in pixels.
	pub fn height(&self) -> u16 {
		self.height
	}

	/// Size recorded in the texture chunk header.
	pub fn data_size(&self) -> u32 {
		self.data_size
	}

	/// Whether the payload carries smaller mip levels.
	pub fn has_mipmaps(&self) -> bool {
		self.pixel_layout.has_mipmaps()
	}

	/// Whether the payload uses a small VQ codebook.
	pub fn is_small_vq(&self) -> bool {
		self.pixel_layout.is_small_vq()
	}

	/// Global index from the `GBIX` prefix, if any.
	pub fn global_index(&self) -> Option<u32> {
		self.global_index
	}

	/// Whether an external palette was applied during decode.
	pub fn used_external_palette(&self) -> bool {
		self.used_external_palette
	}

	/// Absolute offset of the pixel payload.
	pub fn payload_offset(&self) -> usize {
		self.payload_offset
	}
}

impl Display for Header {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(
			f,
			".PVR Texture Header:\n\
			- Global Index: {}\n\
			- Color Format: {}\n\
			- Pixel Layout: {}\n\
			- Width: {} pixels\n\
			- Height: {} pixels\n\
			- Data Size: {} bytes\n\
			- Mipmaps: {}",
			self.global_index.map_or_else(|| "none".to_string(), |index| index.to_string()),
			self.color_format,
			self.pixel_layout,
			self.width,
			self.height,
			self.data_size,
			self.has_mipmaps(),
		)
	}
}

/// Row-major RGBA8 pixel grid with a top-left origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
	width: u32,
	height: u32,
	data: Vec<u8>,
}

impl PixelBuffer {
	/// Creates a zero-filled buffer.
	pub fn new(width: u32, height: u32) -> Self {
		Self {
			width,
			height,
			data: vec![0; width as usize * height as usize * 4],
		}
	}

	/// Width in pixels.
	pub fn width(&self) -> u32 {
		self.width
	}

	/// Height in pixels.
	pub fn height(&self) -> u32 {
		self.height
	}

	/// Returns the pixel at `(x, y)`.
	pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
		let offset = self.offset(x, y)?;
		let p = self.data.get(offset..offset + 4)?;
		Some(Color::new(p[0], p[1], p[2], p[3]))
	}

	/// Writes the pixel at `(x, y)`; coordinates outside the buffer are ignored.
	#[inline]
	pub fn set_pixel(&mut self, x: u32, y: u32, color: Color) {
		if let Some(offset) = self.offset(x, y) {
			self.data[offset..offset + 4].copy_from_slice(&color.to_array());
		}
	}

	fn offset(&self, x: u32, y: u32) -> Option<usize> {
		if x >= self.width || y >= self.height {
			return None;
		}
		Some((y as usize * self.width as usize + x as usize) * 4)
	}

	/// Returns the raw RGBA8 bytes.
	pub fn as_bytes(&self) -> &[u8] {
		&self.data
	}

	/// Consumes the buffer, returning the raw RGBA8 bytes.
	pub fn into_raw(self) -> Vec<u8> {
		self.data
	}

	/// Iterates over rows of RGBA8 bytes, top to bottom.
	pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
		self.data.chunks_exact((self.width as usize * 4).max(1))
	}
}

/// Texture decoder that keeps its detwiddle tables between calls.
#[derive(Debug, Default, Clone)]
pub struct Decoder {
	config: DecodeConfig,
	twiddle: TwiddleCache,
}

impl Decoder {
	/// Creates a decoder with default limits.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a decoder with custom limits.
	pub fn with_config(config: DecodeConfig) -> Self {
		Self {
			config,
			twiddle: TwiddleCache::new(),
		}
	}

	/// Decodes a complete `.PVR` buffer, resolving palettized layouts against
	/// `palette` when given.
	pub fn decode(&mut self, data: &[u8], palette: Option<&Palette>) -> Result<File, DcFileError> {
		let mut cursor = ByteCursor::new(data);
		let header = Header::read(&mut cursor)?;
		debug!(
			"PVR {}x{} {} {} (gbix: {:?})",
			header.width, header.height, header.color_format, header.pixel_layout, header.global_index
		);

		let (header, pixels) =
			decode::decode_pixels(header, cursor, palette, &mut self.twiddle, &self.config)?;

		Ok(File {
			header,
			pixels,
		})
	}
}

/// Representation of a decoded `.PVR` texture.
#[derive(Debug, Clone)]
pub struct File {
	header: Header,
	pixels: PixelBuffer,
}

impl File {
	/// Returns a reference to the header.
	pub fn header(&self) -> &Header {
		&self.header
	}

	/// Returns the decoded pixels.
	pub fn pixels(&self) -> &PixelBuffer {
		&self.pixels
	}

	/// Consumes the texture, returning its pixels.
	pub fn into_pixels(self) -> PixelBuffer {
		self.pixels
	}

	/// Decodes a texture from a byte slice without an external palette.
	pub fn from_bytes(data: &[u8]) -> Result<Self, DcFileError> {
		Decoder::new().decode(data, None)
	}

	/// Decodes a texture from a byte slice with an external palette.
	pub fn with_palette(data: &[u8], palette: &Palette) -> Result<Self, DcFileError> {
		Decoder::new().decode(data, Some(palette))
	}

	/// Decodes a texture from any reader.
	///
	/// The whole stream is read into memory first; twiddled layouts need
	/// random access.
	pub fn from_reader<R: Read>(reader: &mut R) -> Result<Self, DcFileError> {
		let mut data = Vec::new();
		reader.read_to_end(&mut data)?;
		Self::from_bytes(&data)
	}

	/// Opens and decodes a `.PVR` file from the specified path.
	pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, DcFileError> {
		let data = std::fs::read(path)?;
		Self::from_bytes(&data)
	}
}

/// Decodes a `.PVR` buffer with a fresh decoder.
pub fn decode(data: &[u8], palette: Option<&Palette>) -> Result<File, DcFileError> {
	Decoder::new().decode(data, palette)
}
