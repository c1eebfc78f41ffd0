//! PVR pixel-layout decoders.
//!
//! ## Layouts
//!
//! | Code        | Layout              | Storage                                      |
//! |-------------|---------------------|----------------------------------------------|
//! | 0x09        | RECTANGLE           | row-major packed values                      |
//! | 0x01/02/12  | TWIDDLED(_MM)       | Morton-ordered packed values                 |
//! | 0x0D        | TWIDDLED_RECTANGLE  | Morton-ordered squares along the long axis   |
//! | 0x03/04     | VQ(_MM)             | 256-entry 2×2 codebook + twiddled indices    |
//! | 0x10/11     | SMALL_VQ(_MM)       | as VQ with a width-dependent codebook size   |
//! | 0x05/06     | PALETTIZE4(_MM)     | twiddled 4-bit indices, low nibble first     |
//! | 0x07/08     | PALETTIZE8(_MM)     | twiddled 8-bit indices                       |
//!
//! ## Mip levels
//!
//! Mipmapped layouts store every smaller level first, smallest to largest,
//! with the full-size image last. The decoders skip the smaller levels:
//!
//! - twiddled: `w × h × bytes_per_pixel` per level
//! - VQ: one index byte per 2×2 block, at least one byte per level
//! - 4-bit palettized: half a byte per pixel, rounded up
//! - 8-bit palettized: one byte per pixel
//!
//! ## VQ codebook
//!
//! Each codebook entry holds four packed values in twiddled order, i.e. the
//! top-left, bottom-left, top-right and bottom-right pixels of its block.

use log::{trace, warn};

use super::{Header, PixelBuffer, PixelLayout};
use crate::file::{
	DcFileError, DecodeConfig, FileType,
	color::{Color, ColorFormat},
	pvp::{self, Palette},
	reader::ByteCursor,
	twiddle::{TwiddleCache, is_power_of_two},
};

/// Number of entries in a regular VQ codebook
const VQ_CODEBOOK_SIZE: usize = 256;

/// Packed values per VQ codebook entry (one 2×2 block)
const VQ_BLOCK_PIXELS: usize = 4;

/// Returns the codebook size of a small-VQ texture.
///
/// Non-mipmapped textures wider than 32 pixels have no dedicated size and
/// fall back to the full 256 entries.
pub(crate) fn small_vq_codebook_size(width: u16, mipmaps: bool) -> usize {
	match (mipmaps, width) {
		(_, 0..=16) => 16,
		(false, 32) => 64,
		(true, 32) => 32,
		(true, 64) => 128,
		_ => VQ_CODEBOOK_SIZE,
	}
}

/// Dimensions of every mip level smaller than `width × height`, smallest first.
fn mip_levels(width: u32, height: u32) -> impl Iterator<Item = (u32, u32)> {
	let levels = width.max(height).max(1).ilog2();
	(1..=levels).rev().map(move |shift| ((width >> shift).max(1), (height >> shift).max(1)))
}

/// Number of codebook entries of a VQ texture.
fn codebook_entries(header: &Header) -> usize {
	if header.is_small_vq() {
		small_vq_codebook_size(header.width, header.has_mipmaps())
	} else {
		VQ_CODEBOOK_SIZE
	}
}

/// Bytes one `width × height` level occupies in the payload.
fn level_size(header: &Header, width: u32, height: u32) -> usize {
	let pixels = width as usize * height as usize;
	match header.pixel_layout {
		PixelLayout::Vq | PixelLayout::VqMm | PixelLayout::SmallVq | PixelLayout::SmallVqMm => {
			((width / 2) as usize * (height / 2) as usize).max(1)
		}
		PixelLayout::Palettize4 | PixelLayout::Palettize4Mm => pixels.div_ceil(2),
		PixelLayout::Palettize8 | PixelLayout::Palettize8Mm => pixels,
		_ => pixels * header.color_format.bytes_per_pixel(),
	}
}

/// Payload bytes the layout reads: codebook, smaller mip levels and the full level.
fn payload_size(header: &Header) -> usize {
	let (width, height) = (u32::from(header.width), u32::from(header.height));
	let codebook = match header.pixel_layout {
		PixelLayout::Vq | PixelLayout::VqMm | PixelLayout::SmallVq | PixelLayout::SmallVqMm => {
			codebook_entries(header) * VQ_BLOCK_PIXELS * header.color_format.bytes_per_pixel()
		}
		PixelLayout::Stride | PixelLayout::Bmp | PixelLayout::BmpMm => return 0,
		_ => 0,
	};
	let mips: usize = if header.has_mipmaps() {
		mip_levels(width, height).map(|(w, h)| level_size(header, w, h)).sum()
	} else {
		0
	};
	codebook + mips + level_size(header, width, height)
}

/// State for decoding one texture payload.
struct DecoderState<'a, 'c> {
	header: Header,
	cursor: ByteCursor<'a>,
	output: PixelBuffer,
	twiddle: &'c mut TwiddleCache,
	skipped_indices: usize,
}

impl<'a, 'c> DecoderState<'a, 'c> {
	fn new(header: Header, cursor: ByteCursor<'a>, twiddle: &'c mut TwiddleCache) -> Self {
		let output = PixelBuffer::new(u32::from(header.width), u32::from(header.height));
		Self {
			header,
			cursor,
			output,
			twiddle,
			skipped_indices: 0,
		}
	}

	fn width(&self) -> u32 {
		u32::from(self.header.width)
	}

	fn height(&self) -> u32 {
		u32::from(self.header.height)
	}

	/// Reads one packed value, 32-bit for ARGB8888 and 16-bit otherwise.
	#[inline]
	fn read_packed(&mut self, format: ColorFormat) -> Result<u32, DcFileError> {
		match format.bytes_per_pixel() {
			4 => self.cursor.read_u32(),
			_ => Ok(u32::from(self.cursor.read_u16()?)),
		}
	}

	/// Skips the smaller mip levels when the layout carries them.
	fn skip_mip_levels(&mut self) {
		if !self.header.has_mipmaps() {
			return;
		}
		let skip: usize = mip_levels(self.width(), self.height())
			.map(|(w, h)| level_size(&self.header, w, h))
			.sum();
		trace!("skipping {skip} bytes of mip levels");
		self.cursor.skip(skip);
	}

	/// RECTANGLE: packed values in row-major order.
	fn decode_rectangle(&mut self) -> Result<(), DcFileError> {
		let format = self.header.color_format;
		for y in 0..self.height() {
			for x in 0..self.width() {
				let raw = self.read_packed(format)?;
				self.output.set_pixel(x, y, format.decode(raw)?);
			}
		}
		Ok(())
	}

	/// TWIDDLED, TWIDDLED_MM, TWIDDLED_MM_ALT and TWIDDLED_RECTANGLE.
	fn decode_twiddled(&mut self) -> Result<(), DcFileError> {
		let format = self.header.color_format;
		self.skip_mip_levels();

		let map = self.twiddle.map(self.width(), self.height())?;
		for position in 0..map.len() {
			let raw = self.read_packed(format)?;
			if let Some((x, y)) = map.coord(position) {
				self.output.set_pixel(x, y, format.decode(raw)?);
			}
		}
		Ok(())
	}

	/// VQ, VQ_MM, SMALL_VQ and SMALL_VQ_MM.
	fn decode_vq(&mut self) -> Result<(), DcFileError> {
		let format = self.header.color_format;
		let entries = codebook_entries(&self.header);

		let codebook =
			Palette::new(format, pvp::read_entries(&mut self.cursor, format, entries * VQ_BLOCK_PIXELS)?);
		let colors = codebook.colors()?;
		trace!("VQ codebook with {entries} entries");

		self.skip_mip_levels();

		let (width, height) = (self.width(), self.height());
		let quad = self.twiddle.table(2)?;
		let map = self.twiddle.map(width / 2, height / 2)?;
		for position in 0..map.len() {
			let index = self.cursor.read_u8()? as usize;
			let Some((bx, by)) = map.coord(position) else {
				continue;
			};
			for (k, &(dx, dy)) in quad.coords().iter().enumerate() {
				match colors.get(index * VQ_BLOCK_PIXELS + k) {
					Some(&color) => self.output.set_pixel(bx * 2 + dx, by * 2 + dy, color),
					None => self.skipped_indices += 1,
				}
			}
		}
		Ok(())
	}

	/// PALETTIZE4(_MM) and PALETTIZE8(_MM).
	fn decode_palettized(&mut self, palette: Option<&Palette>) -> Result<(), DcFileError> {
		let four_bit = matches!(
			self.header.pixel_layout,
			PixelLayout::Palettize4 | PixelLayout::Palettize4Mm
		);

		let fallback;
		let palette = match palette {
			Some(palette) => {
				self.header.used_external_palette = true;
				palette
			}
			None => {
				fallback = Palette::grayscale(if four_bit {
					16
				} else {
					256
				});
				&fallback
			}
		};
		let colors = palette.colors()?;

		self.skip_mip_levels();

		let map = self.twiddle.map(self.width(), self.height())?;
		let mut position = 0;
		while position < map.len() {
			let byte = self.cursor.read_u8()?;
			let (indices, count) = if four_bit {
				([byte & 0x0F, byte >> 4], 2)
			} else {
				([byte, 0], 1)
			};
			for &index in &indices[..count] {
				if let Some((x, y)) = map.coord(position) {
					self.put_indexed(x, y, &colors, index as usize);
				}
				position += 1;
			}
		}
		Ok(())
	}

	#[inline]
	fn put_indexed(&mut self, x: u32, y: u32, colors: &[Color], index: usize) {
		match colors.get(index) {
			Some(&color) => self.output.set_pixel(x, y, color),
			None => self.skipped_indices += 1,
		}
	}
}

/// Validates the header against the limits, the layout requirements and the
/// payload length, before any buffer is allocated.
fn validate(
	header: &Header,
	config: &DecodeConfig,
	cursor: &ByteCursor<'_>,
) -> Result<(), DcFileError> {
	let (width, height) = (header.width, header.height);
	if width == 0 || height == 0 {
		return Err(DcFileError::malformed(
			FileType::Pvr,
			format!("empty texture dimensions {width}x{height}"),
		));
	}
	if width > config.max_texture_dimension || height > config.max_texture_dimension {
		return Err(DcFileError::malformed(
			FileType::Pvr,
			format!(
				"texture dimensions {width}x{height} exceed the limit of {}",
				config.max_texture_dimension
			),
		));
	}
	if header.pixel_layout.requires_power_of_two()
		&& (!is_power_of_two(u32::from(width)) || !is_power_of_two(u32::from(height)))
	{
		return Err(DcFileError::malformed(
			FileType::Pvr,
			format!("{} requires power-of-two dimensions, got {width}x{height}", header.pixel_layout),
		));
	}
	let vq = matches!(
		header.pixel_layout,
		PixelLayout::Vq | PixelLayout::VqMm | PixelLayout::SmallVq | PixelLayout::SmallVqMm
	);
	if vq && (width < 2 || height < 2) {
		return Err(DcFileError::malformed(
			FileType::Pvr,
			format!("VQ texture {width}x{height} is smaller than one 2x2 block"),
		));
	}

	let required = payload_size(header);
	if required > cursor.remaining() {
		return Err(DcFileError::OutOfBounds {
			offset: cursor.tell(),
			requested: required,
			available: cursor.len(),
		});
	}
	Ok(())
}

/// Decodes the payload the cursor is positioned at into a pixel buffer.
pub(super) fn decode_pixels(
	header: Header,
	cursor: ByteCursor<'_>,
	palette: Option<&Palette>,
	twiddle: &mut TwiddleCache,
	config: &DecodeConfig,
) -> Result<(Header, PixelBuffer), DcFileError> {
	validate(&header, config, &cursor)?;

	let mut state = DecoderState::new(header, cursor, twiddle);
	match header.pixel_layout {
		PixelLayout::Rectangle => state.decode_rectangle()?,
		PixelLayout::Twiddled
		| PixelLayout::TwiddledMm
		| PixelLayout::TwiddledMmAlt
		| PixelLayout::TwiddledRectangle => state.decode_twiddled()?,
		PixelLayout::Vq | PixelLayout::VqMm | PixelLayout::SmallVq | PixelLayout::SmallVqMm => {
			state.decode_vq()?;
		}
		PixelLayout::Palettize4
		| PixelLayout::Palettize4Mm
		| PixelLayout::Palettize8
		| PixelLayout::Palettize8Mm => state.decode_palettized(palette)?,
		PixelLayout::Stride | PixelLayout::Bmp | PixelLayout::BmpMm => {
			return Err(DcFileError::unsupported(
				FileType::Pvr,
				format!("pixel layout {} is not supported", header.pixel_layout),
			));
		}
	}

	if state.skipped_indices > 0 {
		warn!(
			"{} palette indices out of range in {}x{} texture, pixels left blank",
			state.skipped_indices, header.width, header.height
		);
	}

	Ok((state.header, state.output))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_small_vq_codebook_sizes() {
		assert_eq!(small_vq_codebook_size(8, false), 16);
		assert_eq!(small_vq_codebook_size(16, false), 16);
		assert_eq!(small_vq_codebook_size(32, false), 64);
		assert_eq!(small_vq_codebook_size(64, false), 256);
		assert_eq!(small_vq_codebook_size(8, true), 16);
		assert_eq!(small_vq_codebook_size(16, true), 16);
		assert_eq!(small_vq_codebook_size(32, true), 32);
		assert_eq!(small_vq_codebook_size(64, true), 128);
	}

	#[test]
	fn test_mip_levels_square() {
		let levels: Vec<_> = mip_levels(8, 8).collect();
		assert_eq!(levels, vec![(1, 1), (2, 2), (4, 4)]);
		assert_eq!(mip_levels(1, 1).count(), 0);
	}

	#[test]
	fn test_mip_levels_rectangle() {
		let levels: Vec<_> = mip_levels(8, 2).collect();
		assert_eq!(levels, vec![(1, 1), (2, 1), (4, 1)]);
	}
}
