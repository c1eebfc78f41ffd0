//! Ninja model decoding

use dcasset_rs::prelude::file::nj::strip_triangle;
use dcasset_rs::prelude::{DcFileError, DecodeConfig, FileType, NjFile};

/// Little-endian byte builder for model chunks.
#[derive(Default)]
struct Bytes(Vec<u8>);

impl Bytes {
	fn u8s(mut self, values: &[u8]) -> Self {
		self.0.extend_from_slice(values);
		self
	}

	fn u16(mut self, v: u16) -> Self {
		self.0.extend_from_slice(&v.to_le_bytes());
		self
	}

	fn i16(mut self, v: i16) -> Self {
		self.0.extend_from_slice(&v.to_le_bytes());
		self
	}

	fn u32(mut self, v: u32) -> Self {
		self.0.extend_from_slice(&v.to_le_bytes());
		self
	}

	fn f32s(mut self, values: &[f32]) -> Self {
		for v in values {
			self.0.extend_from_slice(&v.to_le_bytes());
		}
		self
	}

	fn bone(self, position: [f32; 3], model: u32, child: u32, sibling: u32) -> Self {
		self.u32(0)
			.u32(model)
			.f32s(&position)
			.u32(0)
			.u32(0)
			.u32(0)
			.f32s(&[1.0, 1.0, 1.0])
			.u32(child)
			.u32(sibling)
	}
}

fn chunk(tag: &[u8; 4], body: &[u8]) -> Vec<u8> {
	let mut data = tag.to_vec();
	data.extend_from_slice(&(body.len() as u32).to_le_bytes());
	data.extend_from_slice(body);
	data
}

const QUAD: [[f32; 3]; 4] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]];

/// Root bone at z = 10 carrying a textured, blended quad strip, plus one
/// child bone without geometry.
fn quad_model(strip_length: i16) -> Vec<u8> {
	const MODEL: u32 = 104;
	const VLIST: u32 = MODEL + 24;

	let mut vlist = Bytes::default().u8s(&[0x22, 0]).u16(13).u16(0).u16(4);
	for p in QUAD {
		vlist = vlist.f32s(&p);
	}
	let vlist = vlist.u8s(&[0xFF, 0]).0;
	let plist_offset = VLIST + vlist.len() as u32;

	let mut plist = Bytes::default()
		// texture 2
		.u8s(&[0x08, 0])
		.u16(2)
		// diffuse only, src alpha / inverse src alpha
		.u8s(&[0x11, 0x21])
		.u16(2)
		.u8s(&[0, 0, 255, 128])
		.u8s(&[0x40, 0])
		.u16(6)
		.u16(1)
		.i16(strip_length);
	for slot in 0..4 {
		plist = plist.u16(slot);
	}
	let plist = plist.u8s(&[0xFF, 0]).0;

	let mut body = Bytes::default()
		.bone([0.0, 0.0, 10.0], MODEL, 52, 0)
		.bone([0.0, 5.0, 0.0], 0, 0, 0)
		.u32(VLIST)
		.u32(plist_offset)
		.f32s(&[0.5, 0.5, 0.0, 1.0])
		.0;
	body.extend(vlist);
	body.extend(plist);
	body
}

fn texture_list(names: &[&str]) -> Vec<u8> {
	let strings_offset = 8 + names.len() * 12;
	let mut body = Bytes::default().u32(8).u32(names.len() as u32);
	let mut strings = Vec::new();
	for name in names {
		body = body.u32((strings_offset + strings.len()) as u32).u32(0).u32(0);
		strings.extend_from_slice(name.as_bytes());
		strings.push(0);
	}
	let mut body = body.0;
	body.extend(strings);
	body
}

#[test_log::test]
fn two_bone_skeleton() {
	let body = Bytes::default()
		.bone([1.0, 2.0, 3.0], 0, 52, 0)
		.bone([0.0, 0.0, 4.0], 0, 0, 0)
		.0;
	let file = NjFile::from_bytes(&chunk(b"NJCM", &body)).unwrap();
	let model = file.model().unwrap();

	assert_eq!(model.bones.len(), 2);
	let (root, child) = (&model.bones[0], &model.bones[1]);
	assert_eq!(child.parent, Some(0));
	assert_eq!(child.world, root.local * child.local);
	assert!(model.mesh.is_empty());
}

#[test_log::test]
fn textured_quad_strip() {
	let mut data = chunk(b"NJTL", &texture_list(&["sky", "sea", "sand"]));
	data.extend(chunk(b"NJCM", &quad_model(4)));
	data.extend(chunk(b"POF0", &[0; 8]));

	let file = NjFile::from_bytes(&data).unwrap();
	assert_eq!(file.texture_names().collect::<Vec<_>>(), ["sky", "sea", "sand"]);

	let model = file.model().unwrap();
	assert_eq!(model.bones.len(), 2);
	assert_eq!(model.mesh.triangle_count(), 2);
	assert_eq!(model.materials.len(), 1);

	let material = &model.materials[0];
	assert_eq!(material.texture_id, 2);
	assert!(material.blending);
	assert_eq!(material.diffuse, Some([1.0, 0.0, 0.0, 128.0 / 255.0]));

	// counter-clockwise: (0, 1, 2) then (1, 3, 2), translated by the root bone
	let expected = [0, 1, 2, 1, 3, 2].map(|i| {
		let [x, y, z] = QUAD[i];
		[x, y, z + 10.0]
	});
	assert_eq!(model.mesh.positions, expected);
	// the vertex list runs before the diffuse colour is set
	assert_eq!(model.mesh.colors[0], [1.0; 4]);
	assert_eq!(model.mesh.skin_indices[0], [0, 0, 0, 0]);
	assert_eq!(model.mesh.material_indices, [0, 0]);
	assert_eq!(model.bounds[0].radius, 1.0);
}

#[test_log::test]
fn clockwise_strip_flips_winding() {
	let file = NjFile::from_bytes(&chunk(b"NJCM", &quad_model(-4))).unwrap();
	let mesh = &file.model().unwrap().mesh;
	assert_eq!(mesh.triangle_count(), 2);
	// first triangle is (0, 2, 1)
	assert_eq!(mesh.positions[1], [0.0, 1.0, 10.0]);
	assert_eq!(mesh.positions[2], [1.0, 0.0, 10.0]);
}

#[test_log::test]
fn strip_rule() {
	assert_eq!(strip_triangle(0, false), [0, 1, 2]);
	assert_eq!(strip_triangle(1, false), [1, 3, 2]);
	assert_eq!(strip_triangle(0, true), [0, 2, 1]);
	assert_eq!(strip_triangle(1, true), [1, 2, 3]);
}

#[test_log::test]
fn strip_referencing_missing_slot_fails() {
	let mut body = quad_model(4);
	// the vertex chunk now declares zero vertices
	let count_at = 104 + 24 + 6;
	body[count_at..count_at + 2].copy_from_slice(&0u16.to_le_bytes());
	assert!(matches!(
		NjFile::from_bytes(&chunk(b"NJCM", &body)),
		Err(DcFileError::MalformedStructure {
			file_type: FileType::Nj,
			..
		})
	));
}

#[test_log::test]
fn volume_chunk_is_not_implemented() {
	let body = Bytes::default()
		.bone([0.0; 3], 52, 0, 0)
		.u32(52 + 24)
		.u32(0)
		.f32s(&[0.0; 4])
		.u8s(&[0x38, 0])
		.u16(0)
		.u8s(&[0xFF, 0])
		.0;
	assert!(matches!(
		NjFile::from_bytes(&chunk(b"NJCM", &body)),
		Err(DcFileError::NotImplemented {
			file_type: FileType::Nj,
			..
		})
	));
}

#[test_log::test]
fn self_referencing_bone_fails() {
	// the child at 52 lists itself as its own child
	let body = Bytes::default().bone([0.0; 3], 0, 52, 0).bone([0.0; 3], 0, 52, 0).0;
	assert!(matches!(
		NjFile::from_bytes(&chunk(b"NJCM", &body)),
		Err(DcFileError::MalformedStructure {
			file_type: FileType::Nj,
			..
		})
	));
}

#[test_log::test]
fn strict_limits_reject_deep_trees() {
	let mut body = Bytes::default();
	for i in 0..8u32 {
		let child = if i < 7 {
			(i + 1) * 52
		} else {
			0
		};
		body = body.bone([0.0; 3], 0, child, 0);
	}
	let data = chunk(b"NJCM", &body.0);
	let config = DecodeConfig {
		max_bone_depth: 4,
		..DecodeConfig::default()
	};
	assert!(NjFile::from_bytes_with_config(&data, &config).is_err());
	assert_eq!(NjFile::from_bytes(&data).unwrap().model().unwrap().bones.len(), 8);
}
