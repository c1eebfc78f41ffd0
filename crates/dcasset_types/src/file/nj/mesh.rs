//! Vertex slots and the flat triangle output of a model.

use std::collections::HashMap;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Number of bone influences a vertex can carry.
pub const MAX_INFLUENCES: usize = 3;

/// Colour used for vertices without one.
const WHITE: [f32; 4] = [1.0; 4];

/// One bone's weight on a vertex.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoneInfluence {
	/// Index into the model's bone list
	pub bone: u16,
	/// Weight in `[0, 1]`
	pub weight: f32,
}

/// A vertex stored in a slot of the vertex table.
///
/// Positions and normals are already in world space.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
	/// World-space position
	pub position: Vec3,
	/// World-space unit normal
	pub normal: Option<Vec3>,
	/// RGBA colour
	pub color: Option<[f32; 4]>,
	/// Texture coordinate
	pub uv: Option<Vec2>,
	/// Bone weights; unused entries have zero weight
	pub influences: [BoneInfluence; MAX_INFLUENCES],
}

impl Vertex {
	/// Creates a vertex fully bound to `bone`.
	pub fn rigid(position: Vec3, bone: u16) -> Self {
		let mut influences = [BoneInfluence::default(); MAX_INFLUENCES];
		influences[0] = BoneInfluence {
			bone,
			weight: 1.0,
		};
		Self {
			position,
			influences,
			..Self::default()
		}
	}
}

/// Sparse vertex storage addressed by the slot numbers used in the file.
#[derive(Debug, Default, Clone)]
pub struct VertexTable {
	slots: HashMap<u32, Vertex>,
}

impl VertexTable {
	/// Creates an empty table.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the vertex at `slot`.
	pub fn get(&self, slot: u32) -> Option<&Vertex> {
		self.slots.get(&slot)
	}

	/// Returns a mutable reference to the vertex at `slot`.
	pub fn get_mut(&mut self, slot: u32) -> Option<&mut Vertex> {
		self.slots.get_mut(&slot)
	}

	/// Stores a rigid vertex, keeping the UV of any vertex already there.
	pub fn merge(&mut self, slot: u32, vertex: Vertex) {
		match self.slots.get_mut(&slot) {
			Some(existing) => {
				let uv = existing.uv;
				*existing = vertex;
				existing.uv = vertex.uv.or(uv);
			}
			None => {
				self.slots.insert(slot, vertex);
			}
		}
	}

	/// Adds one weighted contribution to the vertex at `slot`.
	///
	/// Influence slot 0 starts a new blended position; slots 1 and 2 add to
	/// it. The other influences are carried over from the stored vertex.
	/// The stored normal is the weighted sum and is normalized on output.
	pub fn merge_weighted(
		&mut self,
		slot: u32,
		influence_slot: usize,
		influence: BoneInfluence,
		position: Vec3,
		normal: Option<Vec3>,
	) {
		let vertex = self.slots.entry(slot).or_default();
		let index = influence_slot.min(MAX_INFLUENCES - 1);
		let weight = influence.weight;

		if index == 0 {
			vertex.position = position * weight;
			vertex.normal = normal.map(|n| n * weight);
		} else {
			vertex.position += position * weight;
			vertex.normal = match (vertex.normal, normal) {
				(Some(sum), Some(n)) => Some(sum + n * weight),
				(sum, n) => sum.or(n.map(|n| n * weight)),
			};
		}
		vertex.influences[index] = influence;
	}

	/// Number of populated slots.
	pub fn len(&self) -> usize {
		self.slots.len()
	}

	/// Returns `true` if no slot is populated.
	pub fn is_empty(&self) -> bool {
		self.slots.is_empty()
	}
}

/// Draw range of consecutive triangles sharing one material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialRange {
	/// Material index
	pub material: u32,
	/// First vertex of the range
	pub start: usize,
	/// Number of vertices in the range
	pub count: usize,
}

/// Unindexed triangle soup with per-vertex attributes.
///
/// Every triangle contributes three entries to each attribute array, so the
/// arrays stay parallel and `material_indices` has one entry per triangle.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
	/// Positions
	pub positions: Vec<[f32; 3]>,
	/// Unit normals, zero where the vertex had none
	pub normals: Vec<[f32; 3]>,
	/// RGBA colours, white where the vertex had none
	pub colors: Vec<[f32; 4]>,
	/// Texture coordinates
	pub uvs: Vec<[f32; 2]>,
	/// Bone indices, four per vertex
	pub skin_indices: Vec<[u16; 4]>,
	/// Bone weights, four per vertex
	pub skin_weights: Vec<[f32; 4]>,
	/// Material index of each triangle
	pub material_indices: Vec<u32>,
}

impl Mesh {
	/// Creates an empty mesh.
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends one triangle.
	pub fn push_triangle(&mut self, vertices: [&Vertex; 3], material: u32) {
		for vertex in vertices {
			self.push_vertex(vertex);
		}
		self.material_indices.push(material);
	}

	fn push_vertex(&mut self, vertex: &Vertex) {
		self.positions.push(vertex.position.to_array());
		self.normals.push(vertex.normal.map_or(Vec3::ZERO, Vec3::normalize_or_zero).to_array());
		self.colors.push(vertex.color.unwrap_or(WHITE));
		self.uvs.push(vertex.uv.unwrap_or(Vec2::ZERO).to_array());

		let mut indices = [0u16; 4];
		let mut weights = [0f32; 4];
		for (i, influence) in vertex.influences.iter().enumerate() {
			indices[i] = influence.bone;
			weights[i] = influence.weight;
		}
		self.skin_indices.push(indices);
		self.skin_weights.push(weights);
	}

	/// Number of triangles.
	pub fn triangle_count(&self) -> usize {
		self.material_indices.len()
	}

	/// Number of emitted vertices.
	pub fn vertex_count(&self) -> usize {
		self.positions.len()
	}

	/// Returns `true` if no triangle was emitted.
	pub fn is_empty(&self) -> bool {
		self.material_indices.is_empty()
	}

	/// Groups consecutive triangles with the same material into draw ranges.
	pub fn material_ranges(&self) -> Vec<MaterialRange> {
		let mut ranges: Vec<MaterialRange> = Vec::new();
		for (triangle, &material) in self.material_indices.iter().enumerate() {
			match ranges.last_mut() {
				Some(range) if range.material == material => range.count += 3,
				_ => ranges.push(MaterialRange {
					material,
					start: triangle * 3,
					count: 3,
				}),
			}
		}
		ranges
	}
}
