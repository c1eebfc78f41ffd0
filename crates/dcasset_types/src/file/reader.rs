//! Cursor-based little-endian reader over an in-memory byte buffer.
//!
//! Every decoder in this crate reads through a [`ByteCursor`]. Reads that
//! would cross the end of the buffer fail with [`DcFileError::OutOfBounds`];
//! seeking never fails and never panics, a cursor parked past the end simply
//! fails its next read.

use super::DcFileError;

/// Sequential reader over a borrowed byte buffer.
///
/// # Example
///
/// ```
/// use dcasset_types::file::reader::ByteCursor;
///
/// let data = [0x50, 0x56, 0x52, 0x54, 0x10, 0x00, 0x00, 0x00];
/// let mut cursor = ByteCursor::new(&data);
///
/// assert_eq!(cursor.read_magic().unwrap(), *b"PVRT");
/// assert_eq!(cursor.read_u32().unwrap(), 0x10);
/// assert!(cursor.read_u8().is_err());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ByteCursor<'a> {
	data: &'a [u8],
	pos: usize,
}

impl<'a> ByteCursor<'a> {
	/// Creates a cursor positioned at the start of `data`.
	pub fn new(data: &'a [u8]) -> Self {
		Self {
			data,
			pos: 0,
		}
	}

	/// Returns the whole underlying buffer.
	pub fn data(&self) -> &'a [u8] {
		self.data
	}

	/// Returns the buffer length.
	pub fn len(&self) -> usize {
		self.data.len()
	}

	/// Returns `true` when the underlying buffer is empty.
	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	/// Returns the current read position.
	pub fn tell(&self) -> usize {
		self.pos
	}

	/// Returns the number of bytes left before the end of the buffer.
	pub fn remaining(&self) -> usize {
		self.data.len().saturating_sub(self.pos)
	}

	/// Moves to an absolute position. Positions past the end are allowed.
	pub fn seek(&mut self, pos: usize) {
		self.pos = pos;
	}

	/// Moves relative to the current position.
	pub fn seek_relative(&mut self, delta: isize) {
		self.pos = self.pos.checked_add_signed(delta).unwrap_or(usize::MAX);
	}

	/// Moves to `from_end` bytes before the end of the buffer.
	pub fn seek_to_end(&mut self, from_end: usize) {
		self.pos = self.data.len().checked_sub(from_end).unwrap_or(usize::MAX);
	}

	/// Advances the position by `count` bytes.
	pub fn skip(&mut self, count: usize) {
		self.pos = self.pos.saturating_add(count);
	}

	/// Returns a cursor scoped to `[tell, tell + length)` without copying.
	///
	/// The returned cursor starts at position 0 and the parent position is
	/// left unchanged.
	pub fn slice(&self, length: usize) -> Result<ByteCursor<'a>, DcFileError> {
		let bytes = self.peek_bytes(length)?;
		Ok(ByteCursor::new(bytes))
	}

	/// Runs `f` and restores the current position afterwards, whether `f`
	/// succeeded or not.
	pub fn with_restore<T, F>(&mut self, f: F) -> Result<T, DcFileError>
	where
		F: FnOnce(&mut Self) -> Result<T, DcFileError>,
	{
		let saved = self.pos;
		let result = f(self);
		self.pos = saved;
		result
	}

	fn bounds(&self, length: usize) -> Result<std::ops::Range<usize>, DcFileError> {
		match self.pos.checked_add(length) {
			Some(end) if end <= self.data.len() => Ok(self.pos..end),
			_ => Err(DcFileError::OutOfBounds {
				offset: self.pos,
				requested: length,
				available: self.data.len(),
			}),
		}
	}

	/// Returns the next `length` bytes without advancing.
	pub fn peek_bytes(&self, length: usize) -> Result<&'a [u8], DcFileError> {
		let range = self.bounds(length)?;
		Ok(&self.data[range])
	}

	/// Reads the next `length` bytes.
	pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8], DcFileError> {
		let bytes = self.peek_bytes(length)?;
		self.pos += length;
		Ok(bytes)
	}

	fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DcFileError> {
		let mut out = [0u8; N];
		out.copy_from_slice(self.read_bytes(N)?);
		Ok(out)
	}

	/// Reads a 4-byte signature.
	pub fn read_magic(&mut self) -> Result<[u8; 4], DcFileError> {
		self.read_array()
	}

	/// Returns `true` if `magic` occurs at the current position.
	pub fn peek_magic(&self, magic: &[u8]) -> bool {
		self.peek_bytes(magic.len()).is_ok_and(|bytes| bytes == magic)
	}

	/// Reads an unsigned byte.
	pub fn read_u8(&mut self) -> Result<u8, DcFileError> {
		Ok(self.read_array::<1>()?[0])
	}

	/// Reads a little-endian `u16`.
	pub fn read_u16(&mut self) -> Result<u16, DcFileError> {
		Ok(u16::from_le_bytes(self.read_array()?))
	}

	/// Reads a little-endian `i16`.
	pub fn read_i16(&mut self) -> Result<i16, DcFileError> {
		Ok(i16::from_le_bytes(self.read_array()?))
	}

	/// Reads a little-endian `u32`.
	pub fn read_u32(&mut self) -> Result<u32, DcFileError> {
		Ok(u32::from_le_bytes(self.read_array()?))
	}

	/// Reads a little-endian `i32`.
	pub fn read_i32(&mut self) -> Result<i32, DcFileError> {
		Ok(i32::from_le_bytes(self.read_array()?))
	}

	/// Reads a little-endian IEEE-754 `f32`.
	pub fn read_f32(&mut self) -> Result<f32, DcFileError> {
		Ok(f32::from_le_bytes(self.read_array()?))
	}

	/// Reads three consecutive `f32` values.
	pub fn read_vec3(&mut self) -> Result<[f32; 3], DcFileError> {
		Ok([self.read_f32()?, self.read_f32()?, self.read_f32()?])
	}

	/// Reads a fixed-length string; the first NUL ends the string early but
	/// all `length` bytes are consumed.
	pub fn read_fixed_string(&mut self, length: usize) -> Result<String, DcFileError> {
		let bytes = self.read_bytes(length)?;
		let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
		Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
	}

	/// Reads a NUL-terminated string. A missing terminator is an
	/// out-of-bounds read.
	pub fn read_cstring(&mut self) -> Result<String, DcFileError> {
		let rest = self.data.get(self.pos..).unwrap_or_default();
		let Some(end) = rest.iter().position(|&b| b == 0) else {
			return Err(DcFileError::OutOfBounds {
				offset: self.pos,
				requested: rest.len() + 1,
				available: self.data.len(),
			});
		};
		let text = String::from_utf8_lossy(&rest[..end]).into_owned();
		self.pos += end + 1;
		Ok(text)
	}

	/// Searches for `pattern` starting at the current position, looking at no
	/// more than `limit` candidate offsets. Returns the absolute offset of the
	/// first match without moving the cursor.
	pub fn find(&self, pattern: &[u8], limit: usize) -> Option<usize> {
		if pattern.is_empty() {
			return None;
		}
		let rest = self.data.get(self.pos..)?;
		rest.windows(pattern.len())
			.take(limit)
			.position(|window| window == pattern)
			.map(|found| self.pos + found)
	}
}
