//! Model-chunk interpreter.
//!
//! A model's vertex and polygon lists are streams of chunks. Every chunk
//! starts with a `head` byte selecting its kind and a `flag` byte whose
//! meaning depends on the kind:
//!
//! | Head        | Kind     | Body                                          |
//! |-------------|----------|-----------------------------------------------|
//! | 0x00        | null     | none                                          |
//! | 0x01..0x07  | bits     | none                                          |
//! | 0x08..0x0F  | tiny     | u16 texture word                              |
//! | 0x10..0x1F  | material | u16 size (words), colours                     |
//! | 0x20..0x37  | vertex   | u16 size (longwords), u16 index, u16 count    |
//! | 0x38..0x3F  | volume   | not supported                                 |
//! | 0x40..0x4B  | strip    | u16 size (words), u16 strip info, strips      |
//! | 0xFF        | end      | none                                          |
//!
//! Material, colour and texture state set by one chunk applies to the chunks
//! that follow it, so it lives in an [`InterpreterContext`].

use glam::{Mat3, Mat4, Vec2, Vec3};
use log::{trace, warn};

use super::{
	material::{MaterialSpec, MaterialTable, blending_from_flag, color_from_bgra},
	mesh::{BoneInfluence, Mesh, Vertex, VertexTable},
};
use crate::file::{DcFileError, FileType, reader::ByteCursor};

pub(crate) mod heads {
	pub const NULL: u8 = 0x00;
	pub const BITS_BLEND_ALPHA: u8 = 0x01;
	pub const BITS_DRAW_POLYGON_LIST: u8 = 0x05;
	pub const TINY_FIRST: u8 = 0x08;
	pub const MATERIAL_FIRST: u8 = 0x10;
	pub const VERTEX_FIRST: u8 = 0x20;
	pub const VERTEX_D8888: u8 = 0x23;
	pub const VERTEX_VN_FIRST: u8 = 0x29;
	pub const VERTEX_VN_D8888: u8 = 0x2A;
	pub const VERTEX_VN_NF32: u8 = 0x2C;
	pub const VERTEX_VN_LAST: u8 = 0x2F;
	pub const VOLUME_FIRST: u8 = 0x38;
	pub const STRIP_FIRST: u8 = 0x40;
	pub const STRIP_LAST: u8 = 0x4B;
	pub const END: u8 = 0xFF;
}

/// Mutable state carried from chunk to chunk while interpreting one bone.
#[derive(Debug, Clone, Default)]
pub struct InterpreterContext {
	/// Material applied to the next strip chunk
	pub material: MaterialSpec,
	/// Colour given to vertices without their own
	pub color: Option<[f32; 4]>,
	/// Mirror U
	pub flip_u: bool,
	/// Read V as stored instead of `1 - v`
	pub flip_v: bool,
	/// Clamp U
	pub clamp_u: bool,
	/// Clamp V
	pub clamp_v: bool,
	return_stack: Vec<usize>,
}

impl InterpreterContext {
	/// Creates a context with the default material and no colour.
	pub fn new() -> Self {
		Self::default()
	}

	/// Depth of the jump return stack.
	pub fn return_depth(&self) -> usize {
		self.return_stack.len()
	}
}

/// Geometry accumulated over all bones of one model tree.
#[derive(Debug, Default)]
pub struct Geometry {
	/// Vertex slots
	pub vertices: VertexTable,
	/// Distinct materials
	pub materials: MaterialTable,
	/// Emitted triangles
	pub mesh: Mesh,
}

/// Per-vertex extras stored after the slot index in a strip.
#[derive(Debug, Clone, Copy, PartialEq)]
struct StripLayout {
	uv_divisor: Option<f32>,
	extra_bytes: usize,
}

impl StripLayout {
	fn for_head(head: u8) -> Self {
		const UVN: Option<f32> = Some(255.0);
		const UVH: Option<f32> = Some(1023.0);
		let (uv_divisor, extra_bytes) = match head {
			0x41 => (UVN, 0),
			0x42 => (UVH, 0),
			// packed normal
			0x43 => (None, 6),
			0x44 => (UVN, 6),
			0x45 => (UVH, 6),
			// packed colour
			0x46 => (None, 4),
			0x47 => (UVN, 4),
			0x48 => (UVH, 4),
			// second UV set
			0x4A => (UVN, 4),
			0x4B => (UVH, 4),
			_ => (None, 0),
		};
		Self {
			uv_divisor,
			extra_bytes,
		}
	}
}

/// Fields present in each record of a vertex chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct VertexLayout {
	normal: bool,
	color: bool,
	weight: bool,
}

impl VertexLayout {
	fn for_head(head: u8) -> Self {
		Self {
			normal: (heads::VERTEX_VN_FIRST..=heads::VERTEX_VN_LAST).contains(&head),
			color: head == heads::VERTEX_D8888 || head == heads::VERTEX_VN_D8888,
			weight: head == heads::VERTEX_VN_NF32,
		}
	}

	/// Smallest record that holds every field that is read.
	fn min_stride(self) -> usize {
		12 + if self.normal {
			12
		} else {
			0
		} + if self.color || self.weight {
			4
		} else {
			0
		}
	}
}

/// Interprets the chunk lists attached to one bone.
pub struct ChunkInterpreter<'a, 'g> {
	cursor: ByteCursor<'a>,
	geometry: &'g mut Geometry,
	bone: u16,
	world: Mat4,
	normal_matrix: Mat3,
	context: InterpreterContext,
	max_steps: usize,
}

impl<'a, 'g> ChunkInterpreter<'a, 'g> {
	/// Creates an interpreter for bone `bone` with a fresh context.
	pub fn new(
		cursor: ByteCursor<'a>,
		geometry: &'g mut Geometry,
		bone: u16,
		world: Mat4,
		max_steps: usize,
	) -> Self {
		Self {
			cursor,
			geometry,
			bone,
			world,
			normal_matrix: Mat3::from_mat4(world).inverse().transpose(),
			context: InterpreterContext::new(),
			max_steps,
		}
	}

	/// Returns the interpreter state.
	pub fn context(&self) -> &InterpreterContext {
		&self.context
	}

	/// Interprets the chunk list at `offset` until its end chunk.
	pub fn run(&mut self, offset: usize) -> Result<(), DcFileError> {
		self.cursor.seek(offset);
		let mut steps = 0usize;

		loop {
			steps += 1;
			if steps > self.max_steps {
				return Err(DcFileError::malformed(
					FileType::Nj,
					format!("chunk list at 0x{offset:X} exceeds {} chunks", self.max_steps),
				));
			}

			let position = self.cursor.tell();
			let head = self.cursor.read_u8()?;
			let flag = self.cursor.read_u8()?;
			trace!("chunk 0x{head:02X} flag 0x{flag:02X} at 0x{position:X}");

			match head {
				heads::END => match self.context.return_stack.pop() {
					Some(resume) => self.cursor.seek(resume),
					None => break,
				},
				heads::NULL => {}
				h if h > heads::STRIP_LAST => {
					warn!("skipping unknown model chunk 0x{h:02X} at 0x{position:X}");
				}
				heads::STRIP_FIRST..=heads::STRIP_LAST => self.strip(head, flag)?,
				heads::VOLUME_FIRST.. => {
					return Err(DcFileError::not_implemented(
						FileType::Nj,
						format!("volume chunk 0x{head:02X}"),
					));
				}
				heads::VERTEX_FIRST.. => self.vertex(head, flag)?,
				heads::MATERIAL_FIRST.. => self.material(head, flag)?,
				heads::TINY_FIRST.. => self.tiny(flag)?,
				_ => self.bits(head, flag),
			}
		}
		Ok(())
	}

	fn bits(&mut self, head: u8, flag: u8) {
		match head {
			heads::BITS_BLEND_ALPHA => {
				self.context.material.blending = blending_from_flag(flag);
			}
			heads::BITS_DRAW_POLYGON_LIST => {
				self.context.return_stack.push(self.cursor.tell());
				self.cursor.seek_relative(isize::from(flag as i8));
			}
			_ => {}
		}
	}

	fn tiny(&mut self, flag: u8) -> Result<(), DcFileError> {
		let texture = self.cursor.read_u16()?;
		self.context.material.texture_id = i32::from(texture & 0x1FFF);
		self.context.flip_u = flag & 0x80 != 0;
		self.context.flip_v = flag & 0x40 != 0;
		self.context.clamp_u = flag & 0x20 != 0;
		self.context.clamp_v = flag & 0x10 != 0;
		Ok(())
	}

	fn read_color(&mut self) -> Result<[f32; 4], DcFileError> {
		let bytes = self.cursor.read_bytes(4)?;
		Ok(color_from_bgra([bytes[0], bytes[1], bytes[2], bytes[3]]))
	}

	fn material(&mut self, head: u8, flag: u8) -> Result<(), DcFileError> {
		let size = self.cursor.read_u16()? as usize;
		let end = self.cursor.tell() + size * 2;

		self.context.material.blending = blending_from_flag(flag);
		if head & 0x01 != 0 {
			let diffuse = self.read_color()?;
			self.context.material.diffuse = Some(diffuse);
			self.context.color = Some(diffuse);
		}
		if head & 0x02 != 0 {
			self.context.material.specular = Some(self.read_color()?);
		}
		if head & 0x04 != 0 {
			self.context.material.ambient = Some(self.read_color()?);
		}

		self.skip_to(end);
		Ok(())
	}

	fn vertex(&mut self, head: u8, flag: u8) -> Result<(), DcFileError> {
		let size = self.cursor.read_u16()? as usize;
		let end = self.cursor.tell() + size * 4;
		let index_offset = u32::from(self.cursor.read_u16()?);
		let count = self.cursor.read_u16()? as usize;
		if count == 0 {
			self.skip_to(end);
			return Ok(());
		}

		let layout = VertexLayout::for_head(head);
		let influence_slot = match (layout.weight, flag) {
			(false, _) => 0,
			(true, 0x80..=0x82) => usize::from(flag & 0x03),
			(true, _) => {
				return Err(DcFileError::malformed(
					FileType::Nj,
					format!("weighted vertex chunk with influence flag 0x{flag:02X}"),
				));
			}
		};
		let stride = ((size * 4).saturating_sub(4) / count).max(layout.min_stride());
		trace!("vertex chunk 0x{head:02X}: {count} vertices from slot {index_offset}, stride {stride}");

		for i in 0..count {
			let start = self.cursor.tell();
			let position = self.world.transform_point3(Vec3::from_array(self.cursor.read_vec3()?));
			let normal = if layout.normal {
				let n = Vec3::from_array(self.cursor.read_vec3()?);
				Some((self.normal_matrix * n).normalize_or_zero())
			} else {
				None
			};
			let color = if layout.color {
				Some(self.read_color()?)
			} else {
				None
			};

			if layout.weight {
				let sub_offset = u32::from(self.cursor.read_u16()?);
				let weight = f32::from(self.cursor.read_u16()?) / 255.0;
				let slot = index_offset + sub_offset;
				let influence = BoneInfluence {
					bone: self.bone,
					weight,
				};
				self.geometry.vertices.merge_weighted(
					slot,
					influence_slot,
					influence,
					position,
					normal,
				);
				if let Some(vertex) = self.geometry.vertices.get_mut(slot) {
					vertex.color = vertex.color.or(self.context.color);
				}
			} else {
				let mut vertex = Vertex::rigid(position, self.bone);
				vertex.normal = normal;
				vertex.color = color.or(self.context.color);
				self.geometry.vertices.merge(index_offset + i as u32, vertex);
			}

			self.cursor.seek(start + stride);
		}

		self.skip_to(end);
		Ok(())
	}

	fn strip(&mut self, head: u8, flag: u8) -> Result<(), DcFileError> {
		let size = self.cursor.read_u16()? as usize;
		let end = self.cursor.tell() + size * 2;
		let info = self.cursor.read_u16()?;
		let strip_count = info & 0x3FFF;
		let user_words = (info >> 14) as usize;

		self.context.material.double_sided = flag & 0x10 != 0;
		let material = self.geometry.materials.resolve(&self.context.material);
		let layout = StripLayout::for_head(head);
		trace!("strip chunk 0x{head:02X}: {strip_count} strips, material {material}");

		for _ in 0..strip_count {
			let length = self.cursor.read_i16()?;
			let clockwise = length < 0;
			let count = length.unsigned_abs() as usize;

			let mut strip = Vec::with_capacity(count);
			for k in 0..count {
				let slot = u32::from(self.cursor.read_u16()?);
				let Some(vertex) = self.geometry.vertices.get_mut(slot) else {
					return Err(DcFileError::malformed(
						FileType::Nj,
						format!("strip references empty vertex slot {slot}"),
					));
				};

				if let Some(divisor) = layout.uv_divisor {
					let u = f32::from(self.cursor.read_i16()?) / divisor;
					let v = f32::from(self.cursor.read_i16()?) / divisor;
					let v = if self.context.flip_v {
						v
					} else {
						1.0 - v
					};
					vertex.uv = Some(Vec2::new(u, v));
				}
				strip.push(*vertex);

				self.cursor.skip(layout.extra_bytes);
				if k >= 2 {
					self.cursor.skip(user_words * 2);
				}
			}

			for i in 0..count.saturating_sub(2) {
				let [a, b, c] = strip_triangle(i, clockwise);
				self.geometry.mesh.push_triangle([&strip[a], &strip[b], &strip[c]], material);
			}
		}

		self.skip_to(end);
		Ok(())
	}

	/// Moves to the end a chunk declares, never back over bytes already read.
	fn skip_to(&mut self, end: usize) {
		let position = self.cursor.tell();
		if end < position {
			trace!("chunk ends at 0x{position:X}, past its declared end 0x{end:X}");
		}
		self.cursor.seek(end.max(position));
	}
}

/// Vertex order of triangle `i` of a strip.
///
/// Alternate triangles swap their last two vertices so that every triangle
/// keeps the strip's winding.
pub fn strip_triangle(i: usize, clockwise: bool) -> [usize; 3] {
	let even = i % 2 == 0;
	if (clockwise && even) || (!clockwise && !even) {
		[i, i + 2, i + 1]
	} else {
		[i, i + 1, i + 2]
	}
}
