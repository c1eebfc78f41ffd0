//! Benchmark helper utilities for dcasset-rs
//!
//! This module provides generators for synthetic textures and archives, so the
//! benchmark suite runs without game data.

/// Generates a `PVRT` chunk with the given colour format, layout and payload.
pub fn generate_pvr(color: u8, layout: u8, width: u16, height: u16, payload: &[u8]) -> Vec<u8> {
	let mut data = Vec::with_capacity(16 + payload.len());
	data.extend_from_slice(b"PVRT");
	data.extend_from_slice(&(8 + payload.len() as u32).to_le_bytes());
	data.extend_from_slice(&[color, layout, 0, 0]);
	data.extend_from_slice(&width.to_le_bytes());
	data.extend_from_slice(&height.to_le_bytes());
	data.extend_from_slice(payload);
	data
}

/// Generates a square twiddled RGB565 texture with a gradient pattern.
pub fn generate_twiddled(size: u16) -> Vec<u8> {
	let pixels = size as usize * size as usize;
	let payload: Vec<u8> = (0..pixels).flat_map(|i| (i as u16).to_le_bytes()).collect();
	generate_pvr(1, 0x01, size, size, &payload)
}

/// Generates a square VQ texture: a 256-entry codebook followed by indices.
pub fn generate_vq(size: u16) -> Vec<u8> {
	let mut payload = Vec::new();
	for entry in 0..256u32 {
		for texel in 0..4u32 {
			payload.extend_from_slice(&((entry * 4 + texel) as u16).to_le_bytes());
		}
	}
	let quads = (size as usize / 2) * (size as usize / 2);
	payload.extend((0..quads).map(|i| (i % 256) as u8));
	generate_pvr(1, 0x03, size, size, &payload)
}

/// Generates a square 8-bit palettised texture.
pub fn generate_pal8(size: u16) -> Vec<u8> {
	let pixels = size as usize * size as usize;
	let payload: Vec<u8> = (0..pixels).map(|i| (i % 256) as u8).collect();
	generate_pvr(1, 0x07, size, size, &payload)
}

/// Generates a directory-layout PVM archive holding `count` twiddled textures.
pub fn generate_pvm(count: usize, size: u16) -> Vec<u8> {
	let texture = generate_twiddled(size);
	let table_end = 16 + count * 36;

	let mut data = Vec::new();
	data.extend_from_slice(b"PVMH");
	data.extend_from_slice(&1u32.to_le_bytes());
	data.extend_from_slice(&(count as u32).to_le_bytes());
	data.extend_from_slice(&((table_end + count * texture.len()) as u32).to_le_bytes());
	for i in 0..count {
		let mut name = [0u8; 28];
		let label = format!("tex{i:04}");
		name[..label.len()].copy_from_slice(label.as_bytes());
		data.extend_from_slice(&name);
		data.extend_from_slice(&((table_end + i * texture.len()) as u32).to_le_bytes());
		data.extend_from_slice(&(texture.len() as u32).to_le_bytes());
	}
	for _ in 0..count {
		data.extend_from_slice(&texture);
	}
	data
}

/// Common benchmark sizes for synthetic textures
pub mod sizes {
	/// Tiny texture: 32x32
	pub const TINY: u16 = 32;
	/// Small texture: 128x128
	pub const SMALL: u16 = 128;
	/// Medium texture: 256x256, common for character textures
	pub const MEDIUM: u16 = 256;
	/// Large texture: 1024x1024, the largest the hardware accepts
	pub const LARGE: u16 = 1024;
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_generated_sizes() {
		assert_eq!(generate_twiddled(4).len(), 16 + 32);
		assert_eq!(generate_vq(4).len(), 16 + 2048 + 4);
		assert_eq!(generate_pal8(4).len(), 16 + 16);
		assert_eq!(&generate_pvm(2, 4)[0..4], b"PVMH");
	}
}
