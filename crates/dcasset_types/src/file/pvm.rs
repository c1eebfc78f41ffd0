//! `.PVM` texture archive support.
//!
//! Two incompatible layouts share the `PVMH` signature.
//!
//! # Scanned layout
//!
//! | Offset | Size | Field       | Description                              |
//! |--------|------|-------------|------------------------------------------|
//! | 0x00   | 4    | `magic`     | "PVMH"                                   |
//! | 0x04   | 4    | `data_size` | Size of the metadata after this field    |
//! | 0x08   | 2    | `flags`     | Which optional metadata fields exist     |
//! | 0x0A   | 2    | `count`     | Number of textures                       |
//! | 0x0C   | ...  | metadata    | One record per texture                   |
//!
//! Each metadata record starts with a 2-byte id, followed by the fields
//! enabled in `flags`, in this order:
//!
//! | Bit | Field       | Size |
//! |-----|-------------|------|
//! | 3   | name        | 28   |
//! | 2   | format      | 2    |
//! | 1   | dimensions  | 2    |
//! | 0   | global index| 4    |
//!
//! Payload offsets are not stored. Each texture is located by searching for
//! the next `PVRT` marker; its length is the chunk's own size field plus the
//! 8-byte chunk prefix.
//!
//! # Directory layout
//!
//! | Offset | Size | Field       | Description                              |
//! |--------|------|-------------|------------------------------------------|
//! | 0x00   | 4    | `magic`     | "PVMH"                                   |
//! | 0x04   | 4    | `version`   | Archive version                          |
//! | 0x08   | 4    | `count`     | Number of textures                       |
//! | 0x0C   | 4    | `file_size` | Size of the archive                      |
//! | 0x10   | 36×n | entries     | name (28), offset (4), size (4)          |
//!
//! The scanned layout is tried first; if its structure does not hold up the
//! directory layout is tried, and if neither matches the archive is rejected.

use std::{fmt, io::Read, ops::Range};

use log::debug;
use serde::{Deserialize, Serialize};

use super::{
	DcFileError, DecodeConfig, FileType,
	pvp::Palette,
	pvr::{self, constants::CHUNK_PREFIX_SIZE, constants::PVRT_MAGIC},
	reader::ByteCursor,
};

mod constants {
	/// Magic bytes shared by both archive layouts
	pub const MAGIC: [u8; 4] = *b"PVMH";

	/// Size of a texture name field
	pub const NAME_SIZE: usize = 28;

	/// Size of one directory-layout entry
	pub const DIRECTORY_ENTRY_SIZE: usize = NAME_SIZE + 8;

	/// Size of the directory-layout header
	pub const DIRECTORY_HEADER_SIZE: usize = 16;

	/// Metadata flag: global index present
	pub const FLAG_GLOBAL_INDEX: u16 = 1 << 0;

	/// Metadata flag: dimension code present
	pub const FLAG_DIMENSIONS: u16 = 1 << 1;

	/// Metadata flag: format codes present
	pub const FLAG_FORMAT: u16 = 1 << 2;

	/// Metadata flag: name present
	pub const FLAG_NAME: u16 = 1 << 3;
}

/// Which archive layout an archive was parsed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PvmLayout {
	/// Metadata records followed by scanned `PVRT` payloads
	Scanned,
	/// Explicit name/offset/size directory
	Directory,
}

impl fmt::Display for PvmLayout {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Scanned => write!(f, "scanned"),
			Self::Directory => write!(f, "directory"),
		}
	}
}

/// Archive header, one variant per layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Header {
	/// Scanned-layout header
	Scanned {
		/// Size of the metadata after the `data_size` field
		data_size: u32,
		/// Metadata field flags
		flags: u16,
		/// Number of textures
		count: u16,
	},
	/// Directory-layout header
	Directory {
		/// Archive version
		version: u32,
		/// Number of textures
		count: u32,
		/// Recorded archive size
		file_size: u32,
	},
}

impl Header {
	/// Layout this header belongs to.
	pub fn layout(&self) -> PvmLayout {
		match self {
			Self::Scanned {
				..
			} => PvmLayout::Scanned,
			Self::Directory {
				..
			} => PvmLayout::Directory,
		}
	}

	/// Number of textures declared by the header.
	pub fn count(&self) -> usize {
		match *self {
			Self::Scanned {
				count,
				..
			} => count as usize,
			Self::Directory {
				count,
				..
			} => count as usize,
		}
	}
}

impl fmt::Display for Header {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Scanned {
				data_size,
				flags,
				count,
			} => write!(
				f,
				".PVM Archive Header (scanned):\n\
				- Data Size: {data_size} bytes\n\
				- Flags: 0x{flags:04X}\n\
				- Textures: {count}"
			),
			Self::Directory {
				version,
				count,
				file_size,
			} => write!(
				f,
				".PVM Archive Header (directory):\n\
				- Version: {version}\n\
				- Textures: {count}\n\
				- File Size: {file_size} bytes"
			),
		}
	}
}

/// One texture in an archive.
///
/// `offset` and `size` address the texture inside the archive buffer. The
/// metadata fields are only filled by the scanned layout, and only when the
/// archive flags enable them.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entry {
	/// Texture name, if the archive stores one
	pub name: Option<String>,
	/// Texture id
	pub id: Option<u16>,
	/// Colour format code
	pub color_code: Option<u8>,
	/// Pixel layout code
	pub layout_code: Option<u8>,
	/// Packed dimension code
	pub dimension_code: Option<u16>,
	/// Global index
	pub global_index: Option<u32>,
	/// Offset of the texture in the archive
	pub offset: usize,
	/// Size of the texture in bytes
	pub size: usize,
}

impl Entry {
	/// Byte range of the texture inside the archive.
	pub fn range(&self) -> Range<usize> {
		self.offset..self.offset + self.size
	}

	/// Returns the name, or an empty string for unnamed entries.
	pub fn name(&self) -> &str {
		self.name.as_deref().unwrap_or_default()
	}
}

impl fmt::Display for Entry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"Entry {{ name: '{}', offset: 0x{:X}, size: {} }}",
			self.name(),
			self.offset,
			self.size
		)
	}
}

/// A parsed `.PVM` archive that owns its bytes.
#[derive(Debug, Clone)]
pub struct File {
	header: Header,
	entries: Vec<Entry>,
	raw: Vec<u8>,
}

impl File {
	/// Parses an archive with default limits.
	pub fn from_bytes(data: &[u8]) -> Result<Self, DcFileError> {
		Self::from_bytes_with_config(data, &DecodeConfig::default())
	}

	/// Parses an archive with custom limits.
	pub fn from_bytes_with_config(data: &[u8], config: &DecodeConfig) -> Result<Self, DcFileError> {
		let mut cursor = ByteCursor::new(data);
		let magic = cursor.read_magic()?;
		if magic != constants::MAGIC {
			return Err(DcFileError::invalid_magic(FileType::Pvm, &constants::MAGIC, &magic));
		}

		let scanned = match parse_scanned(data, config) {
			Ok((header, entries)) => {
				debug!("PVM detected as scanned layout with {} entries", entries.len());
				return Ok(Self::new(header, entries, data));
			}
			Err(e) => e,
		};
		debug!("PVM is not a scanned archive: {scanned}");

		match parse_directory(data) {
			Ok((header, entries)) => {
				debug!("PVM detected as directory layout with {} entries", entries.len());
				Ok(Self::new(header, entries, data))
			}
			Err(directory) => Err(DcFileError::malformed(
				FileType::Pvm,
				format!(
					"archive matches neither known layout (scanned: {scanned}; directory: {directory})"
				),
			)),
		}
	}

	fn new(header: Header, entries: Vec<Entry>, data: &[u8]) -> Self {
		Self {
			header,
			entries,
			raw: data.to_vec(),
		}
	}

	/// Parses an archive from any reader.
	pub fn from_reader<R: Read>(reader: &mut R) -> Result<Self, DcFileError> {
		let mut data = Vec::new();
		reader.read_to_end(&mut data)?;
		Self::from_bytes(&data)
	}

	/// Opens and parses a `.PVM` file from the specified path.
	pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, DcFileError> {
		let data = std::fs::read(path)?;
		Self::from_bytes(&data)
	}

	/// Returns the header.
	pub fn header(&self) -> &Header {
		&self.header
	}

	/// Layout the archive was parsed as.
	pub fn layout(&self) -> PvmLayout {
		self.header.layout()
	}

	/// Returns the entries in archive order.
	pub fn entries(&self) -> &[Entry] {
		&self.entries
	}

	/// Number of entries.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Returns `true` for an archive without textures.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Returns the raw archive bytes.
	pub fn raw(&self) -> &[u8] {
		&self.raw
	}

	/// Returns the bytes of entry `index`.
	pub fn entry_data(&self, index: usize) -> Option<&[u8]> {
		let entry = self.entries.get(index)?;
		self.raw.get(entry.range())
	}

	/// Finds an entry by name, ignoring ASCII case.
	pub fn find_entry(&self, name: &str) -> Option<(usize, &Entry)> {
		self.entries.iter().enumerate().find(|(_, e)| e.name().eq_ignore_ascii_case(name))
	}

	/// Iterates over entries together with their bytes.
	pub fn iter(&self) -> impl Iterator<Item = (&Entry, &[u8])> {
		self.entries
			.iter()
			.filter_map(|entry| self.raw.get(entry.range()).map(|data| (entry, data)))
	}

	/// Decodes entry `index` as a PVR texture.
	pub fn decode_texture(
		&self,
		index: usize,
		palette: Option<&Palette>,
	) -> Result<pvr::File, DcFileError> {
		self.decode_texture_with(&mut pvr::Decoder::new(), index, palette)
	}

	/// Decodes entry `index` with a caller-owned decoder, reusing its tables.
	pub fn decode_texture_with(
		&self,
		decoder: &mut pvr::Decoder,
		index: usize,
		palette: Option<&Palette>,
	) -> Result<pvr::File, DcFileError> {
		let data = self.entry_data(index).ok_or_else(|| {
			DcFileError::malformed(
				FileType::Pvm,
				format!("no entry {index} in archive of {} entries", self.entries.len()),
			)
		})?;
		decoder.decode(data, palette)
	}
}

impl TryFrom<&[u8]> for File {
	type Error = DcFileError;

	fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
		Self::from_bytes(value)
	}
}

impl fmt::Display for File {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(f, "{}", self.header)?;
		writeln!(f, "Entries:")?;
		for entry in &self.entries {
			writeln!(f, "  {entry}")?;
		}
		Ok(())
	}
}

/// Parses the scanned layout: metadata records, then one `PVRT` search per
/// texture.
fn parse_scanned(
	data: &[u8],
	config: &DecodeConfig,
) -> Result<(Header, Vec<Entry>), DcFileError> {
	let mut cursor = ByteCursor::new(data);
	cursor.seek(constants::MAGIC.len());

	let data_size = cursor.read_u32()?;
	let flags = cursor.read_u16()?;
	let count = cursor.read_u16()?;
	if count == 0 {
		return Err(DcFileError::malformed(FileType::Pvm, "scanned archive with no textures"));
	}

	let mut entries = Vec::with_capacity(count as usize);
	for _ in 0..count {
		let mut entry = Entry {
			id: Some(cursor.read_u16()?),
			..Entry::default()
		};
		if flags & constants::FLAG_NAME != 0 {
			entry.name = Some(cursor.read_fixed_string(constants::NAME_SIZE)?);
		}
		if flags & constants::FLAG_FORMAT != 0 {
			let format = cursor.read_u16()?;
			entry.color_code = Some((format & 0xFF) as u8);
			entry.layout_code = Some((format >> 8) as u8);
		}
		if flags & constants::FLAG_DIMENSIONS != 0 {
			entry.dimension_code = Some(cursor.read_u16()?);
		}
		if flags & constants::FLAG_GLOBAL_INDEX != 0 {
			entry.global_index = Some(cursor.read_u32()?);
		}
		entries.push(entry);
	}

	let declared_end = CHUNK_PREFIX_SIZE + data_size as usize;
	if cursor.tell() > declared_end {
		return Err(DcFileError::malformed(
			FileType::Pvm,
			format!("metadata ends at 0x{:X}, past the declared 0x{declared_end:X}", cursor.tell()),
		));
	}

	for (i, entry) in entries.iter_mut().enumerate() {
		let start = cursor.find(&PVRT_MAGIC, config.pvm_scan_limit).ok_or_else(|| {
			DcFileError::malformed(
				FileType::Pvm,
				format!(
					"no PVRT marker for entry {i} within {} bytes of 0x{:X}",
					config.pvm_scan_limit,
					cursor.tell()
				),
			)
		})?;
		cursor.seek(start + PVRT_MAGIC.len());
		let size = CHUNK_PREFIX_SIZE + cursor.read_u32()? as usize;
		if start.checked_add(size).is_none_or(|end| end > data.len()) {
			return Err(DcFileError::malformed(
				FileType::Pvm,
				format!("entry {i} at 0x{start:X} with {size} bytes runs past the archive end"),
			));
		}
		entry.offset = start;
		entry.size = size;
		cursor.seek(start + size);
	}

	Ok((
		Header::Scanned {
			data_size,
			flags,
			count,
		},
		entries,
	))
}

/// Parses the directory layout: explicit name/offset/size records.
fn parse_directory(data: &[u8]) -> Result<(Header, Vec<Entry>), DcFileError> {
	let mut cursor = ByteCursor::new(data);
	cursor.seek(constants::MAGIC.len());

	let version = cursor.read_u32()?;
	let count = cursor.read_u32()?;
	let file_size = cursor.read_u32()?;

	let table_size = (count as usize).saturating_mul(constants::DIRECTORY_ENTRY_SIZE);
	if table_size > cursor.remaining() {
		return Err(DcFileError::malformed(
			FileType::Pvm,
			format!("directory of {count} entries does not fit in {} bytes", data.len()),
		));
	}

	let mut entries = Vec::with_capacity(count as usize);
	for i in 0..count {
		let name = cursor.read_fixed_string(constants::NAME_SIZE)?;
		let offset = cursor.read_u32()? as usize;
		let size = cursor.read_u32()? as usize;
		if offset < constants::DIRECTORY_HEADER_SIZE + table_size
			|| offset.checked_add(size).is_none_or(|end| end > data.len())
		{
			return Err(DcFileError::malformed(
				FileType::Pvm,
				format!("entry {i} range 0x{offset:X}+{size} lies outside the archive data"),
			));
		}
		entries.push(Entry {
			name: Some(name),
			offset,
			size,
			..Entry::default()
		});
	}

	check_disjoint(&entries)?;

	Ok((
		Header::Directory {
			version,
			count,
			file_size,
		},
		entries,
	))
}

/// Rejects entries whose byte ranges overlap.
fn check_disjoint(entries: &[Entry]) -> Result<(), DcFileError> {
	let mut ranges: Vec<_> = entries.iter().filter(|e| e.size > 0).map(Entry::range).collect();
	ranges.sort_by_key(|r| r.start);
	for pair in ranges.windows(2) {
		if pair[1].start < pair[0].end {
			return Err(DcFileError::malformed(
				FileType::Pvm,
				format!("entries at 0x{:X} and 0x{:X} overlap", pair[0].start, pair[1].start),
			));
		}
	}
	Ok(())
}
