//! Morton (Z-order) "twiddling" used by PowerVR texture layouts.
//!
//! A twiddled texture stores pixel `(x, y)` at the linear position obtained by
//! interleaving the bits of both coordinates. Throughout this crate `y`
//! occupies the even bit positions and `x` the odd ones, so inside any 2×2
//! block the storage order is `(0,0) (0,1) (1,0) (1,1)`.
//!
//! Non-square textures are twiddled as a row (or column) of square blocks
//! whose side is the smaller dimension, laid out along the longer axis.
//!
//! Tables are pure functions of their size. A [`TwiddleCache`] is owned by the
//! caller and hands out [`Arc`]ed tables, so one table can be shared
//! read-only between concurrent decodes.

use std::{collections::HashMap, sync::Arc};

use super::{DcFileError, FileType};

/// Spreads the low 16 bits of `v` onto the even bit positions.
fn spread_bits(v: u32) -> u32 {
	let mut v = v & 0x0000_FFFF;
	v = (v | (v << 8)) & 0x00FF_00FF;
	v = (v | (v << 4)) & 0x0F0F_0F0F;
	v = (v | (v << 2)) & 0x3333_3333;
	(v | (v << 1)) & 0x5555_5555
}

/// Gathers the even bit positions of `v` into the low 16 bits.
fn compact_bits(v: u32) -> u32 {
	let mut v = v & 0x5555_5555;
	v = (v | (v >> 1)) & 0x3333_3333;
	v = (v | (v >> 2)) & 0x0F0F_0F0F;
	v = (v | (v >> 4)) & 0x00FF_00FF;
	(v | (v >> 8)) & 0x0000_FFFF
}

/// Returns the twiddled storage index of `(x, y)` inside a square block.
pub fn twiddled_index(x: u32, y: u32) -> u32 {
	spread_bits(y) | (spread_bits(x) << 1)
}

/// Inverse of [`twiddled_index`].
pub fn detwiddled_coord(index: u32) -> (u32, u32) {
	(compact_bits(index >> 1), compact_bits(index))
}

/// Returns `true` for non-zero powers of two.
pub fn is_power_of_two(value: u32) -> bool {
	value != 0 && value.is_power_of_two()
}

/// Precomputed map from twiddled position to `(x, y)` for one square size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwiddleTable {
	size: u32,
	coords: Vec<(u32, u32)>,
}

impl TwiddleTable {
	/// Builds the detwiddle table for a square of side `size`.
	///
	/// # Errors
	///
	/// `size` must be a non-zero power of two.
	pub fn new(size: u32) -> Result<Self, DcFileError> {
		if !is_power_of_two(size) {
			return Err(DcFileError::malformed(
				FileType::Pvr,
				format!("twiddle size {size} is not a power of two"),
			));
		}

		let count = size as usize * size as usize;
		let coords = (0..count as u32).map(detwiddled_coord).collect();

		Ok(Self {
			size,
			coords,
		})
	}

	/// Side length of the square this table covers.
	pub fn size(&self) -> u32 {
		self.size
	}

	/// Number of entries (`size²`).
	pub fn len(&self) -> usize {
		self.coords.len()
	}

	/// Returns `true` if the table has no entries.
	pub fn is_empty(&self) -> bool {
		self.coords.is_empty()
	}

	/// Returns `(x, y)` for twiddled position `index`.
	#[inline]
	pub fn coord(&self, index: usize) -> Option<(u32, u32)> {
		self.coords.get(index).copied()
	}

	/// Returns all coordinates in twiddled order.
	pub fn coords(&self) -> &[(u32, u32)] {
		&self.coords
	}
}

/// Builds the detwiddle table for a square of side `size`.
pub fn build_detwiddle_table(size: u32) -> Result<TwiddleTable, DcFileError> {
	TwiddleTable::new(size)
}

/// Twiddle mapping for a `width × height` rectangle made of square blocks.
#[derive(Debug, Clone)]
pub struct TwiddleMap {
	width: u32,
	height: u32,
	table: Arc<TwiddleTable>,
}

impl TwiddleMap {
	/// Width in pixels.
	pub fn width(&self) -> u32 {
		self.width
	}

	/// Height in pixels.
	pub fn height(&self) -> u32 {
		self.height
	}

	/// Total number of positions.
	pub fn len(&self) -> usize {
		self.width as usize * self.height as usize
	}

	/// Returns `true` for an empty rectangle.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Maps a linear storage position to `(x, y)`.
	#[inline]
	pub fn coord(&self, position: usize) -> Option<(u32, u32)> {
		if position >= self.len() {
			return None;
		}
		let block_len = self.table.len();
		let block = (position / block_len) as u32;
		let (bx, by) = self.table.coord(position % block_len)?;
		let side = self.table.size();

		if self.width >= self.height {
			Some((block * side + bx, by))
		} else {
			Some((bx, block * side + by))
		}
	}
}

/// Caller-owned cache of detwiddle tables keyed by square size.
#[derive(Debug, Default, Clone)]
pub struct TwiddleCache {
	tables: HashMap<u32, Arc<TwiddleTable>>,
}

impl TwiddleCache {
	/// Creates an empty cache.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the table for `size`, building it on first use.
	pub fn table(&mut self, size: u32) -> Result<Arc<TwiddleTable>, DcFileError> {
		if let Some(table) = self.tables.get(&size) {
			return Ok(Arc::clone(table));
		}
		let table = Arc::new(TwiddleTable::new(size)?);
		self.tables.insert(size, Arc::clone(&table));
		Ok(table)
	}

	/// Returns the block-tiled mapping for a `width × height` rectangle.
	///
	/// # Errors
	///
	/// Both dimensions must be non-zero powers of two.
	pub fn map(&mut self, width: u32, height: u32) -> Result<TwiddleMap, DcFileError> {
		if !is_power_of_two(width) || !is_power_of_two(height) {
			return Err(DcFileError::malformed(
				FileType::Pvr,
				format!("twiddled dimensions {width}x{height} are not powers of two"),
			));
		}
		let table = self.table(width.min(height))?;
		Ok(TwiddleMap {
			width,
			height,
			table,
		})
	}

	/// Number of cached tables.
	pub fn len(&self) -> usize {
		self.tables.len()
	}

	/// Returns `true` if nothing has been cached yet.
	pub fn is_empty(&self) -> bool {
		self.tables.is_empty()
	}
}
