//! `.NJ` Ninja model support.
//!
//! A Ninja file is a sequence of chunks, each a 4-byte tag followed by a
//! 4-byte little-endian body length:
//!
//! | Tag    | Contents                                         |
//! |--------|--------------------------------------------------|
//! | `NJTL` | Texture name list                                |
//! | `NJCM` | Bone tree with attached chunk models             |
//! | `POF0` | Pointer fix-up table, ignored                    |
//!
//! Parsing stops at the first unrecognised tag or when fewer than eight
//! bytes remain.
//!
//! # Texture list (`NJTL`)
//!
//! | Offset | Size | Field    | Description                            |
//! |--------|------|----------|----------------------------------------|
//! | 0x00   | 4    | `list`   | Offset of the entry array              |
//! | 0x04   | 4    | `count`  | Number of entries                      |
//!
//! Each entry is 12 bytes: name offset (u32), attributes (u32) and texture
//! address (u32). Names are NUL-terminated; all offsets are relative to the
//! chunk body.

use std::{fmt, io::Read};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::{DcFileError, DecodeConfig, FileType, reader::ByteCursor};

pub mod bone;
pub mod chunk;
pub mod material;
pub mod mesh;
pub mod model;

pub use bone::{Bone, BoneRecord};
pub use chunk::{ChunkInterpreter, Geometry, InterpreterContext, strip_triangle};
pub use material::MaterialSpec;
pub use mesh::{BoneInfluence, MaterialRange, Mesh, Vertex};
pub use model::{BoundingSphere, Model, ModelHeader};

/// Chunk tags.
pub mod constants {
	/// Texture name list
	pub const NJTL: [u8; 4] = *b"NJTL";

	/// Chunk model tree
	pub const NJCM: [u8; 4] = *b"NJCM";

	/// Pointer fix-up table
	pub const POF0: [u8; 4] = *b"POF0";

	/// Size of a chunk tag plus its length field
	pub const CHUNK_HEADER_SIZE: usize = 8;

	/// Size of one texture list entry
	pub const TEXTURE_ENTRY_SIZE: usize = 12;
}

/// One entry of a `NJTL` texture list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureName {
	/// Texture name, usually matching a PVM entry
	pub name: String,
	/// Raw attribute word
	pub attributes: u32,
	/// Runtime texture address, zero on disk
	pub texture_address: u32,
}

/// A decoded Ninja file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct File {
	textures: Vec<TextureName>,
	models: Vec<Model>,
}

impl File {
	/// Parses a Ninja file with default limits.
	pub fn from_bytes(data: &[u8]) -> Result<Self, DcFileError> {
		Self::from_bytes_with_config(data, &DecodeConfig::default())
	}

	/// Parses a Ninja file with custom limits.
	pub fn from_bytes_with_config(data: &[u8], config: &DecodeConfig) -> Result<Self, DcFileError> {
		let mut cursor = ByteCursor::new(data);
		let mut file = Self::default();

		while cursor.remaining() >= constants::CHUNK_HEADER_SIZE {
			let offset = cursor.tell();
			let tag = cursor.read_magic()?;
			let length = cursor.read_u32()? as usize;

			match tag {
				constants::NJTL => {
					let body = cursor.slice(length)?;
					debug!("NJTL chunk at 0x{offset:X}, {length} bytes");
					file.textures.extend(read_texture_list(body)?);
				}
				constants::NJCM => {
					let body = cursor.slice(length)?;
					debug!("NJCM chunk at 0x{offset:X}, {length} bytes");
					file.models.push(Model::from_bytes(body.data(), config)?);
				}
				constants::POF0 => {
					debug!("POF0 chunk at 0x{offset:X} skipped");
				}
				_ => {
					debug!(
						"unrecognised chunk {:?} at 0x{offset:X}, stopping",
						String::from_utf8_lossy(&tag)
					);
					break;
				}
			}
			cursor.skip(length);
		}

		if file.textures.is_empty() && file.models.is_empty() {
			warn!("no NJTL or NJCM chunk found");
		}
		Ok(file)
	}

	/// Parses a Ninja file from a reader.
	pub fn from_reader<R: Read>(reader: &mut R) -> Result<Self, DcFileError> {
		let mut data = Vec::new();
		reader.read_to_end(&mut data)?;
		Self::from_bytes(&data)
	}

	/// Opens and parses a `.NJ` file from the specified path.
	pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, DcFileError> {
		let data = std::fs::read(path)?;
		Self::from_bytes(&data)
	}

	/// Texture list entries in file order.
	pub fn textures(&self) -> &[TextureName] {
		&self.textures
	}

	/// Texture names in file order.
	pub fn texture_names(&self) -> impl Iterator<Item = &str> {
		self.textures.iter().map(|t| t.name.as_str())
	}

	/// Decoded model trees, one per `NJCM` chunk.
	pub fn models(&self) -> &[Model] {
		&self.models
	}

	/// Returns the first model tree.
	pub fn model(&self) -> Option<&Model> {
		self.models.first()
	}

	/// Consumes the file, returning its model trees.
	pub fn into_models(self) -> Vec<Model> {
		self.models
	}
}

impl TryFrom<&[u8]> for File {
	type Error = DcFileError;

	fn try_from(data: &[u8]) -> Result<Self, Self::Error> {
		Self::from_bytes(data)
	}
}

impl fmt::Display for File {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(f, "Ninja File:")?;
		writeln!(f, "  Textures: {}", self.textures.len())?;
		for texture in &self.textures {
			writeln!(f, "    {} (attributes 0x{:08X})", texture.name, texture.attributes)?;
		}
		writeln!(f, "  Models: {}", self.models.len())?;
		for (i, model) in self.models.iter().enumerate() {
			writeln!(
				f,
				"    [{i}] bones: {}, materials: {}, triangles: {}",
				model.bones.len(),
				model.materials.len(),
				model.mesh.triangle_count()
			)?;
		}
		Ok(())
	}
}

fn read_texture_list(mut body: ByteCursor<'_>) -> Result<Vec<TextureName>, DcFileError> {
	let list_offset = body.read_u32()? as usize;
	let count = body.read_u32()? as usize;

	let table_size = count
		.checked_mul(constants::TEXTURE_ENTRY_SIZE)
		.and_then(|size| size.checked_add(list_offset))
		.ok_or_else(|| DcFileError::malformed(FileType::Nj, "texture list size overflows"))?;
	if table_size > body.len() {
		return Err(DcFileError::malformed(
			FileType::Nj,
			format!("texture list of {count} entries does not fit in {} bytes", body.len()),
		));
	}

	body.seek(list_offset);
	let mut textures = Vec::with_capacity(count);
	for _ in 0..count {
		let name_offset = body.read_u32()? as usize;
		let attributes = body.read_u32()?;
		let texture_address = body.read_u32()?;
		let name = body.with_restore(|c| {
			c.seek(name_offset);
			c.read_cstring()
		})?;
		textures.push(TextureName {
			name,
			attributes,
			texture_address,
		});
	}
	Ok(textures)
}
