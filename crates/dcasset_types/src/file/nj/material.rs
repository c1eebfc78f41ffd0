//! Render materials produced by the model-chunk interpreter.

use serde::{Deserialize, Serialize};

/// Colours closer than this per channel are considered equal.
pub const COLOR_EPSILON: f32 = 1.0e-4;

/// Alpha-function code for source alpha
const ALPHA_SRC: u8 = 4;

/// Alpha-function code for one minus source alpha
const ALPHA_INV_SRC: u8 = 1;

/// Returns `true` if a blend flag byte selects `SrcAlpha / OneMinusSrcAlpha`.
///
/// The flag packs the source function in bits 3..5 and the destination
/// function in bits 0..2. Every other pairing disables blending.
pub fn blending_from_flag(flag: u8) -> bool {
	let src = (flag >> 3) & 0x07;
	let dst = flag & 0x07;
	src == ALPHA_SRC && dst == ALPHA_INV_SRC
}

/// Converts four bytes stored as B, G, R, A into normalized RGBA.
pub fn color_from_bgra(bytes: [u8; 4]) -> [f32; 4] {
	let [b, g, r, a] = bytes;
	[r, g, b, a].map(|c| f32::from(c) / 255.0)
}

/// A render material.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialSpec {
	/// Index into the texture list, `-1` for untextured
	pub texture_id: i32,
	/// Alpha blending enabled
	pub blending: bool,
	/// Back faces are drawn
	pub double_sided: bool,
	/// Diffuse colour
	pub diffuse: Option<[f32; 4]>,
	/// Specular colour
	pub specular: Option<[f32; 4]>,
	/// Ambient colour
	pub ambient: Option<[f32; 4]>,
}

impl Default for MaterialSpec {
	fn default() -> Self {
		Self {
			texture_id: -1,
			blending: false,
			double_sided: false,
			diffuse: None,
			specular: None,
			ambient: None,
		}
	}
}

impl MaterialSpec {
	/// Returns `true` if both materials would render identically.
	pub fn matches(&self, other: &Self) -> bool {
		self.texture_id == other.texture_id
			&& self.blending == other.blending
			&& self.double_sided == other.double_sided
			&& colors_match(self.diffuse, other.diffuse)
			&& colors_match(self.specular, other.specular)
			&& colors_match(self.ambient, other.ambient)
	}
}

fn colors_match(a: Option<[f32; 4]>, b: Option<[f32; 4]>) -> bool {
	match (a, b) {
		(None, None) => true,
		(Some(a), Some(b)) => a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() <= COLOR_EPSILON),
		_ => false,
	}
}

/// Ordered list of distinct materials.
#[derive(Debug, Default, Clone)]
pub struct MaterialTable {
	materials: Vec<MaterialSpec>,
}

impl MaterialTable {
	/// Creates an empty table.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the index of an equal material, inserting `material` if none exists.
	pub fn resolve(&mut self, material: &MaterialSpec) -> u32 {
		if let Some(index) = self.materials.iter().position(|m| m.matches(material)) {
			return index as u32;
		}
		self.materials.push(*material);
		(self.materials.len() - 1) as u32
	}

	/// Number of distinct materials.
	pub fn len(&self) -> usize {
		self.materials.len()
	}

	/// Returns `true` if no material was resolved yet.
	pub fn is_empty(&self) -> bool {
		self.materials.is_empty()
	}

	/// Consumes the table, returning the materials in first-use order.
	pub fn into_vec(self) -> Vec<MaterialSpec> {
		self.materials
	}
}
