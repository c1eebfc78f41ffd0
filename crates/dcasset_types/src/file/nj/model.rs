//! Bone-tree walk of an `NJCM` chunk.
//!
//! The chunk body starts with the root bone record. Every bone may point to
//! a model and to its first child and next sibling; all offsets are relative
//! to the chunk body, and zero means "none".
//!
//! # Model header (24 bytes)
//!
//! | Offset | Size | Field    | Description                               |
//! |--------|------|----------|-------------------------------------------|
//! | 0x00   | 4    | `vlist`  | Offset of the vertex chunk list, 0 if none|
//! | 0x04   | 4    | `plist`  | Offset of the polygon chunk list, 0 if none|
//! | 0x08   | 12   | `center` | Bounding sphere centre                    |
//! | 0x14   | 4    | `radius` | Bounding sphere radius                    |

use std::collections::HashSet;

use glam::{Mat4, Vec3};
use log::debug;
use serde::{Deserialize, Serialize};

use super::{
	bone::{Bone, BoneRecord},
	chunk::{ChunkInterpreter, Geometry},
	material::MaterialSpec,
	mesh::Mesh,
};
use crate::file::{DcFileError, DecodeConfig, FileType, reader::ByteCursor};

/// Header of a model attached to a bone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelHeader {
	/// Offset of the vertex chunk list, 0 if none
	pub vertex_list: u32,
	/// Offset of the polygon chunk list, 0 if none
	pub polygon_list: u32,
	/// Bounding sphere centre in bone space
	pub center: Vec3,
	/// Bounding sphere radius
	pub radius: f32,
}

impl ModelHeader {
	/// Reads a header at the cursor position.
	pub fn read(cursor: &mut ByteCursor<'_>) -> Result<Self, DcFileError> {
		Ok(Self {
			vertex_list: cursor.read_u32()?,
			polygon_list: cursor.read_u32()?,
			center: Vec3::from_array(cursor.read_vec3()?),
			radius: cursor.read_f32()?,
		})
	}
}

/// Bounding sphere of one bone's model, in world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingSphere {
	/// Owning bone
	pub bone: usize,
	/// World-space centre
	pub center: Vec3,
	/// Radius
	pub radius: f32,
}

/// A decoded `NJCM` tree: skeleton, materials and triangles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Model {
	/// Bones in depth-first order; the root is first
	pub bones: Vec<Bone>,
	/// Distinct materials, indexed by `mesh.material_indices`
	pub materials: Vec<MaterialSpec>,
	/// Triangle soup
	pub mesh: Mesh,
	/// One bounding sphere per bone with a model
	pub bounds: Vec<BoundingSphere>,
}

impl Model {
	/// Decodes a model tree from an `NJCM` chunk body.
	pub fn from_bytes(data: &[u8], config: &DecodeConfig) -> Result<Self, DcFileError> {
		ModelReader::new(data, config).read()
	}

	/// Returns the root bone.
	pub fn root(&self) -> Option<&Bone> {
		self.bones.first()
	}
}

struct ModelReader<'a, 'c> {
	cursor: ByteCursor<'a>,
	config: &'c DecodeConfig,
	bones: Vec<Bone>,
	visited: HashSet<usize>,
	geometry: Geometry,
	bounds: Vec<BoundingSphere>,
}

impl<'a, 'c> ModelReader<'a, 'c> {
	fn new(data: &'a [u8], config: &'c DecodeConfig) -> Self {
		Self {
			cursor: ByteCursor::new(data),
			config,
			bones: Vec::new(),
			visited: HashSet::new(),
			geometry: Geometry::default(),
			bounds: Vec::new(),
		}
	}

	fn read(mut self) -> Result<Model, DcFileError> {
		self.read_siblings(0, None, 0)?;
		debug!(
			"NJCM: {} bones, {} vertex slots, {} triangles",
			self.bones.len(),
			self.geometry.vertices.len(),
			self.geometry.mesh.triangle_count()
		);

		Ok(Model {
			bones: self.bones,
			materials: self.geometry.materials.into_vec(),
			mesh: self.geometry.mesh,
			bounds: self.bounds,
		})
	}

	/// Reads the bone at `offset`, its descendants and its following siblings.
	fn read_siblings(
		&mut self,
		mut offset: usize,
		parent: Option<usize>,
		depth: usize,
	) -> Result<(), DcFileError> {
		if depth > self.config.max_bone_depth {
			return Err(DcFileError::malformed(
				FileType::Nj,
				format!("bone tree deeper than {}", self.config.max_bone_depth),
			));
		}

		loop {
			let (index, record) = self.read_bone(offset, parent)?;
			if record.child_offset != 0 {
				self.read_siblings(record.child_offset as usize, Some(index), depth + 1)?;
			}
			if record.sibling_offset == 0 {
				return Ok(());
			}
			offset = record.sibling_offset as usize;
		}
	}

	/// Reads one bone record, registers the bone and interprets its model.
	fn read_bone(
		&mut self,
		offset: usize,
		parent: Option<usize>,
	) -> Result<(usize, BoneRecord), DcFileError> {
		if !self.visited.insert(offset) {
			return Err(DcFileError::malformed(
				FileType::Nj,
				format!("bone at 0x{offset:X} is referenced more than once"),
			));
		}
		if self.bones.len() >= self.config.max_bones {
			return Err(DcFileError::malformed(
				FileType::Nj,
				format!("more than {} bones", self.config.max_bones),
			));
		}

		let record = self.cursor.with_restore(|c| {
			c.seek(offset);
			BoneRecord::read(c)
		})?;

		let index = self.bones.len();
		let parent_world = parent.and_then(|p| self.bones.get(p).map(|bone| (p, bone.world)));
		let bone = Bone::new(index, offset, parent_world, &record);
		let world = bone.world;
		self.bones.push(bone);
		if let Some(parent) = parent.and_then(|p| self.bones.get_mut(p)) {
			parent.children.push(index);
		}

		if record.model_offset != 0 {
			self.read_model(record.model_offset as usize, index, world)?;
		}
		Ok((index, record))
	}

	fn read_model(&mut self, offset: usize, bone: usize, world: Mat4) -> Result<(), DcFileError> {
		let header = self.cursor.with_restore(|c| {
			c.seek(offset);
			ModelHeader::read(c)
		})?;
		debug!(
			"bone {bone}: model at 0x{offset:X}, vlist 0x{:X}, plist 0x{:X}",
			header.vertex_list, header.polygon_list
		);

		self.bounds.push(BoundingSphere {
			bone,
			center: world.transform_point3(header.center),
			radius: header.radius,
		});

		let bone_index = u16::try_from(bone).map_err(|_| {
			DcFileError::malformed(FileType::Nj, format!("bone index {bone} exceeds 16 bits"))
		})?;
		let mut interpreter = ChunkInterpreter::new(
			self.cursor,
			&mut self.geometry,
			bone_index,
			world,
			self.config.max_chunk_steps,
		);
		if header.vertex_list != 0 {
			interpreter.run(header.vertex_list as usize)?;
		}
		if header.polygon_list != 0 {
			interpreter.run(header.polygon_list as usize)?;
		}
		Ok(())
	}
}
