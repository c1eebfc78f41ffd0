//! PVR texture and PVP palette decoding

use crate::{build_pvr, words};
use dcasset_rs::prelude::file::twiddle::{build_detwiddle_table, twiddled_index};
use dcasset_rs::prelude::{Color, DcFileError, FileType, Palette, PixelLayout, PvrDecoder, PvrFile};

const RGB565: u8 = 1;
const ARGB4444: u8 = 2;

const RED: u16 = 0xF800;
const GREEN: u16 = 0x07E0;
const BLUE: u16 = 0x001F;
const WHITE: u16 = 0xFFFF;

fn build_pvp(format: u32, entries: &[u16]) -> Vec<u8> {
	let mut data = Vec::new();
	data.extend_from_slice(b"PVPL");
	data.extend_from_slice(&(8 + entries.len() as u32 * 2).to_le_bytes());
	data.extend_from_slice(&format.to_le_bytes());
	data.extend_from_slice(&0u16.to_le_bytes());
	data.extend_from_slice(&(entries.len() as u16).to_le_bytes());
	data.extend(words(entries));
	data
}

#[test_log::test]
fn rectangle_2x2_is_row_major() {
	let data = build_pvr(RGB565, 0x09, 2, 2, &words(&[RED, GREEN, BLUE, WHITE]));
	let texture = PvrFile::from_bytes(&data).unwrap();

	assert_eq!(texture.header().pixel_layout(), PixelLayout::Rectangle);
	let pixels = texture.pixels();
	assert_eq!(pixels.pixel(0, 0), Some(Color::rgb(255, 0, 0)));
	assert_eq!(pixels.pixel(1, 0), Some(Color::rgb(0, 255, 0)));
	assert_eq!(pixels.pixel(0, 1), Some(Color::rgb(0, 0, 255)));
	assert_eq!(pixels.pixel(1, 1), Some(Color::rgb(255, 255, 255)));
}

#[test_log::test]
fn twiddled_2x2_places_pixels_by_morton_order() {
	// storage order is (0,0), (0,1), (1,0), (1,1)
	let data = build_pvr(RGB565, 0x01, 2, 2, &words(&[RED, GREEN, BLUE, WHITE]));
	let pixels = PvrFile::from_bytes(&data).unwrap().into_pixels();

	assert_eq!(pixels.pixel(0, 0), Some(Color::rgb(255, 0, 0)));
	assert_eq!(pixels.pixel(0, 1), Some(Color::rgb(0, 255, 0)));
	assert_eq!(pixels.pixel(1, 0), Some(Color::rgb(0, 0, 255)));
	assert_eq!(pixels.pixel(1, 1), Some(Color::rgb(255, 255, 255)));
}

#[test_log::test]
fn twiddled_16x16_matches_index_function() {
	let size = 16u32;
	let mut stored = vec![0u16; (size * size) as usize];
	for y in 0..size {
		for x in 0..size {
			// ARGB4444 with x in red and y in green
			stored[twiddled_index(x, y) as usize] = 0xF000 | ((x as u16) << 8) | ((y as u16) << 4);
		}
	}
	let data = build_pvr(ARGB4444, 0x01, 16, 16, &words(&stored));
	let pixels = PvrFile::from_bytes(&data).unwrap().into_pixels();

	for y in 0..size {
		for x in 0..size {
			let color = pixels.pixel(x, y).unwrap();
			assert_eq!((color.r, color.g), ((x * 17) as u8, (y * 17) as u8), "({x}, {y})");
		}
	}
}

#[test_log::test]
fn detwiddle_table_is_a_bijection() {
	for size in [1u32, 2, 8, 64] {
		let table = build_detwiddle_table(size).unwrap();
		let mut seen = vec![false; (size * size) as usize];
		for index in 0..size * size {
			let (x, y) = table.coord(index as usize).unwrap();
			assert_eq!(twiddled_index(x, y), index);
			seen[(y * size + x) as usize] = true;
		}
		assert!(seen.iter().all(|&s| s));
	}
}

#[test_log::test]
fn palettised_texture_with_external_palette() {
	let palette = Palette::from_bytes(&build_pvp(1, &[RED, GREEN, BLUE, WHITE])).unwrap();
	assert_eq!(palette.len(), 4);

	// 8-bit indices, twiddled 2x2
	let data = build_pvr(RGB565, 0x07, 2, 2, &[3, 2, 1, 0]);
	let texture = PvrFile::with_palette(&data, &palette).unwrap();
	let pixels = texture.pixels();
	assert_eq!(pixels.pixel(0, 0), Some(Color::rgb(255, 255, 255)));
	assert_eq!(pixels.pixel(1, 1), Some(Color::rgb(255, 0, 0)));
	assert!(texture.header().used_external_palette());
}

#[test_log::test]
fn decoder_reuse_across_textures() {
	let mut decoder = PvrDecoder::new();
	let a = build_pvr(RGB565, 0x01, 4, 4, &words(&[RED; 16]));
	let b = build_pvr(RGB565, 0x01, 4, 4, &words(&[BLUE; 16]));

	let first = decoder.decode(&a, None).unwrap();
	let second = decoder.decode(&b, None).unwrap();
	assert_eq!(first.pixels().pixel(3, 3), Some(Color::rgb(255, 0, 0)));
	assert_eq!(second.pixels().pixel(3, 3), Some(Color::rgb(0, 0, 255)));
}

#[test_log::test]
fn unknown_layout_is_unsupported() {
	let data = build_pvr(RGB565, 0x7F, 2, 2, &words(&[0; 4]));
	assert!(matches!(
		PvrFile::from_bytes(&data),
		Err(DcFileError::UnsupportedFormat {
			file_type: FileType::Pvr,
			..
		})
	));
}

#[test_log::test]
fn twiddled_non_power_of_two_is_malformed() {
	let data = build_pvr(RGB565, 0x01, 3, 4, &words(&[0; 12]));
	assert!(matches!(
		PvrFile::from_bytes(&data),
		Err(DcFileError::MalformedStructure {
			file_type: FileType::Pvr,
			..
		})
	));
}

#[test_log::test]
fn wrong_magic_is_rejected() {
	assert!(matches!(
		PvrFile::from_bytes(b"NOPE\0\0\0\0"),
		Err(DcFileError::InvalidMagic { .. })
	));
	assert!(matches!(Palette::from_bytes(b"PVRT\0\0\0\0"), Err(DcFileError::InvalidMagic { .. })));
}

#[test_log::test]
fn reader_and_path_constructors() {
	let data = build_pvr(RGB565, 0x09, 1, 1, &words(&[GREEN]));
	let texture = PvrFile::from_reader(&mut data.as_slice()).unwrap();
	assert_eq!(texture.pixels().pixel(0, 0), Some(Color::rgb(0, 255, 0)));

	assert!(matches!(
		PvrFile::open("/nonexistent/texture.pvr"),
		Err(DcFileError::IoError(_))
	));
}
