//! PVM archive decoding

use crate::{build_pvr, words};
use dcasset_rs::prelude::{Color, DcFileError, FileType, PvmFile, PvmLayout, PvrFile};

fn name_field(name: &str) -> [u8; 28] {
	let mut field = [0u8; 28];
	field[..name.len()].copy_from_slice(name.as_bytes());
	field
}

fn solid(value: u16) -> Vec<u8> {
	build_pvr(1, 0x09, 2, 2, &words(&[value; 4]))
}

fn build_directory(textures: &[(&str, Vec<u8>)]) -> Vec<u8> {
	let table_end = 16 + textures.len() * 36;
	let total = table_end + textures.iter().map(|(_, t)| t.len()).sum::<usize>();

	let mut data = Vec::new();
	data.extend_from_slice(b"PVMH");
	data.extend_from_slice(&1u32.to_le_bytes());
	data.extend_from_slice(&(textures.len() as u32).to_le_bytes());
	data.extend_from_slice(&(total as u32).to_le_bytes());

	let mut offset = table_end;
	for (name, texture) in textures {
		data.extend_from_slice(&name_field(name));
		data.extend_from_slice(&(offset as u32).to_le_bytes());
		data.extend_from_slice(&(texture.len() as u32).to_le_bytes());
		offset += texture.len();
	}
	for (_, texture) in textures {
		data.extend_from_slice(texture);
	}
	data
}

fn build_scanned(textures: &[(&str, Vec<u8>)]) -> Vec<u8> {
	// names only
	let mut metadata = Vec::new();
	metadata.extend_from_slice(&0x0008u16.to_le_bytes());
	metadata.extend_from_slice(&(textures.len() as u16).to_le_bytes());
	for (i, (name, _)) in textures.iter().enumerate() {
		metadata.extend_from_slice(&(i as u16).to_le_bytes());
		metadata.extend_from_slice(&name_field(name));
	}

	let mut data = Vec::new();
	data.extend_from_slice(b"PVMH");
	data.extend_from_slice(&(metadata.len() as u32).to_le_bytes());
	data.extend(metadata);
	for (_, texture) in textures {
		data.extend_from_slice(texture);
	}
	data
}

#[test_log::test]
fn directory_archive_with_two_entries() {
	let textures = [("grass", solid(0x07E0)), ("stone", solid(0xFFFF))];
	let archive = PvmFile::from_bytes(&build_directory(&textures)).unwrap();

	assert_eq!(archive.layout(), PvmLayout::Directory);
	assert_eq!(archive.len(), 2);
	let names: Vec<_> = archive.entries().iter().map(|e| e.name()).collect();
	assert_eq!(names, ["grass", "stone"]);

	for (entry, bytes) in archive.iter() {
		assert_eq!(bytes.len(), textures[0].1.len());
		assert_eq!(entry.range().len(), bytes.len());
		// each byte range decodes on its own
		PvrFile::from_bytes(bytes).unwrap();
	}

	let (index, _) = archive.find_entry("STONE").unwrap();
	let texture = archive.decode_texture(index, None).unwrap();
	assert_eq!(texture.pixels().pixel(1, 1), Some(Color::rgb(255, 255, 255)));
}

#[test_log::test]
fn scanned_archive_locates_textures() {
	let textures = [("a", solid(0xF800)), ("b", solid(0x001F))];
	let archive = PvmFile::from_bytes(&build_scanned(&textures)).unwrap();

	assert_eq!(archive.layout(), PvmLayout::Scanned);
	assert_eq!(archive.entries()[1].name(), "b");
	let texture = archive.decode_texture(1, None).unwrap();
	assert_eq!(texture.pixels().pixel(0, 0), Some(Color::rgb(0, 0, 255)));
}

#[test_log::test]
fn archive_matching_neither_layout_fails() {
	let mut data = build_directory(&[("x", solid(0))]);
	// point the entry past the end of the archive
	data[16 + 28..16 + 32].copy_from_slice(&0xFFFFu32.to_le_bytes());
	assert!(matches!(
		PvmFile::from_bytes(&data),
		Err(DcFileError::MalformedStructure {
			file_type: FileType::Pvm,
			..
		})
	));
}

#[test_log::test]
fn missing_entry_index() {
	let archive = PvmFile::from_bytes(&build_directory(&[("x", solid(0))])).unwrap();
	assert!(archive.entry_data(5).is_none());
	assert!(archive.decode_texture(5, None).is_err());
}
