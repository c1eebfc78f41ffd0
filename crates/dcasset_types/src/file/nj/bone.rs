//! Bone records of a Ninja object tree.
//!
//! # Record Structure (52 bytes)
//!
//! | Offset | Size | Field      | Description                               |
//! |--------|------|------------|-------------------------------------------|
//! | 0x00   | 4    | `flags`    | Evaluation flags                          |
//! | 0x04   | 4    | `model`    | Offset of the model, 0 if none            |
//! | 0x08   | 12   | `position` | 3 × f32                                   |
//! | 0x14   | 12   | `rotation` | 3 × i32 angles, full turn = 65536         |
//! | 0x20   | 12   | `scale`    | 3 × f32                                   |
//! | 0x2C   | 4    | `child`    | Offset of the first child, 0 if none      |
//! | 0x30   | 4    | `sibling`  | Offset of the next sibling, 0 if none     |

use std::f32::consts::TAU;

use glam::{EulerRot, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::file::{DcFileError, reader::ByteCursor};

/// Size of one bone record in bytes
pub const BONE_RECORD_SIZE: usize = 52;

/// Radians per angle unit.
const ANGLE_SCALE: f32 = TAU / 65535.0;

/// Evaluation flag bits of a bone record.
pub mod flags {
	/// Position is ignored
	pub const IGNORE_POSITION: u32 = 1 << 0;
	/// Rotation is ignored
	pub const IGNORE_ROTATION: u32 = 1 << 1;
	/// Scale is ignored
	pub const IGNORE_SCALE: u32 = 1 << 2;
	/// Model is hidden
	pub const HIDE: u32 = 1 << 3;
	/// Children are not drawn
	pub const BREAK: u32 = 1 << 4;
	/// Rotation is applied in Z, X, Y order
	pub const ZXY_ROTATION: u32 = 1 << 5;
}

/// Raw bone record as stored in the file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneRecord {
	/// Evaluation flags
	pub flags: u32,
	/// Model offset, 0 if none
	pub model_offset: u32,
	/// Local position
	pub position: [f32; 3],
	/// Local rotation in angle units
	pub rotation: [i32; 3],
	/// Local scale
	pub scale: [f32; 3],
	/// First child offset, 0 if none
	pub child_offset: u32,
	/// Next sibling offset, 0 if none
	pub sibling_offset: u32,
}

impl BoneRecord {
	/// Reads a record at the cursor position.
	pub fn read(cursor: &mut ByteCursor<'_>) -> Result<Self, DcFileError> {
		Ok(Self {
			flags: cursor.read_u32()?,
			model_offset: cursor.read_u32()?,
			position: cursor.read_vec3()?,
			rotation: [cursor.read_i32()?, cursor.read_i32()?, cursor.read_i32()?],
			scale: cursor.read_vec3()?,
			child_offset: cursor.read_u32()?,
			sibling_offset: cursor.read_u32()?,
		})
	}

	/// Local position, zero when ignored.
	pub fn local_position(&self) -> Vec3 {
		if self.flags & flags::IGNORE_POSITION != 0 {
			Vec3::ZERO
		} else {
			Vec3::from_array(self.position)
		}
	}

	/// Local rotation in radians, zero when ignored.
	pub fn local_angles(&self) -> Vec3 {
		if self.flags & flags::IGNORE_ROTATION != 0 {
			Vec3::ZERO
		} else {
			Vec3::from_array(self.rotation.map(|a| a as f32 * ANGLE_SCALE))
		}
	}

	/// Local scale, one when ignored.
	pub fn local_scale(&self) -> Vec3 {
		if self.flags & flags::IGNORE_SCALE != 0 {
			Vec3::ONE
		} else {
			Vec3::from_array(self.scale)
		}
	}

	/// Returns `true` if rotations apply in Z, X, Y order.
	pub fn zxy_rotation(&self) -> bool {
		self.flags & flags::ZXY_ROTATION != 0
	}

	/// Local rotation as a quaternion.
	pub fn local_rotation(&self) -> Quat {
		let angles = self.local_angles();
		if self.zxy_rotation() {
			Quat::from_euler(EulerRot::ZXY, angles.z, angles.x, angles.y)
		} else {
			Quat::from_euler(EulerRot::XYZ, angles.x, angles.y, angles.z)
		}
	}

	/// Local transform: translation × rotation × scale.
	pub fn local_transform(&self) -> Mat4 {
		Mat4::from_scale_rotation_translation(
			self.local_scale(),
			self.local_rotation(),
			self.local_position(),
		)
	}
}

/// A bone of the decoded skeleton.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bone {
	/// Position in the bone list
	pub index: usize,
	/// Parent bone, `None` for a top-level bone
	pub parent: Option<usize>,
	/// Child bones in file order
	pub children: Vec<usize>,
	/// Evaluation flags
	pub flags: u32,
	/// Local position
	pub position: Vec3,
	/// Local rotation in radians
	pub rotation: Vec3,
	/// Local scale
	pub scale: Vec3,
	/// Local transform
	pub local: Mat4,
	/// World transform (parent world × local)
	pub world: Mat4,
	/// Offset of the record in the model chunk
	pub offset: usize,
	/// Offset of the attached model, if any
	pub model_offset: Option<u32>,
}

impl Bone {
	/// Builds a bone from its record and the parent's world transform.
	pub fn new(
		index: usize,
		offset: usize,
		parent: Option<(usize, Mat4)>,
		record: &BoneRecord,
	) -> Self {
		let local = record.local_transform();
		let world = match parent {
			Some((_, parent_world)) => parent_world * local,
			None => local,
		};
		Self {
			index,
			parent: parent.map(|(index, _)| index),
			children: Vec::new(),
			flags: record.flags,
			position: record.local_position(),
			rotation: record.local_angles(),
			scale: record.local_scale(),
			local,
			world,
			offset,
			model_offset: (record.model_offset != 0).then_some(record.model_offset),
		}
	}

	/// Returns `true` if the bone is flagged hidden.
	pub fn is_hidden(&self) -> bool {
		self.flags & flags::HIDE != 0
	}
}
