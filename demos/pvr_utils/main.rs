//! PVR/PVM Texture CLI Utility
//!
//! A command-line tool for inspecting and decoding Dreamcast textures.
//!
//! # Features
//!
//! - **info**: Print the header of a PVR texture, PVP palette or PVM archive
//! - **decode**: Convert a PVR texture to PNG, with an optional PVP palette
//! - **extract**: Decode every texture of a PVM archive to PNG
//!
//! # Usage
//!
//! ```bash
//! # Inspect a texture or archive
//! cargo run --example pvr_utils info title.pvr
//!
//! # Decode a palettised texture
//! cargo run --example pvr_utils decode font.pvr font.png --palette font.pvp
//!
//! # Extract an archive
//! cargo run --example pvr_utils extract stage.pvm out/
//! ```

use clap::{Parser, Subcommand};
use dcasset_rs::prelude::{DecodeConfig, Palette, PixelBuffer, PvmFile, PvrDecoder};
use dcasset_rs::prelude::file::{pvp, pvr};
use image::RgbaImage;
use log::{error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "pvr_utils")]
#[command(author = "dcasset-rs project")]
#[command(version = "1.0")]
#[command(about = "PVR texture utility - inspect, decode and extract PVR/PVM files", long_about = None)]
struct Cli {
	/// JSON file with decode limits
	#[arg(short, long, global = true, value_name = "CONFIG_JSON")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Print header information
	Info {
		/// Input PVR, PVP or PVM file path
		#[arg(value_name = "INPUT")]
		input: PathBuf,
	},

	/// Decode a PVR texture to PNG
	Decode {
		/// Input PVR file path
		#[arg(value_name = "INPUT_PVR")]
		input: PathBuf,

		/// Output PNG file path
		#[arg(value_name = "OUTPUT_PNG")]
		output: PathBuf,

		/// External palette for palettised textures
		#[arg(short, long, value_name = "PALETTE_PVP")]
		palette: Option<PathBuf>,
	},

	/// Decode every texture of a PVM archive to PNG
	Extract {
		/// Input PVM file path
		#[arg(value_name = "INPUT_PVM")]
		input: PathBuf,

		/// Output directory
		#[arg(value_name = "OUTPUT_DIR")]
		output: PathBuf,

		/// External palette for palettised textures
		#[arg(short, long, value_name = "PALETTE_PVP")]
		palette: Option<PathBuf>,

		/// Also write the raw PVR bytes of each entry
		#[arg(short, long)]
		raw: bool,
	},
}

/// Load decode limits from a JSON file, or use the defaults
fn load_config(path: Option<&Path>) -> Result<DecodeConfig, Box<dyn std::error::Error>> {
	let Some(path) = path else {
		return Ok(DecodeConfig::default());
	};
	let text = fs::read_to_string(path)?;
	let config = serde_json::from_str(&text)?;
	info!("Loaded decode limits from {}", path.display());
	Ok(config)
}

/// Save a decoded texture as PNG
fn save_png(path: &Path, pixels: &PixelBuffer) -> Result<(), Box<dyn std::error::Error>> {
	let img = RgbaImage::from_raw(pixels.width(), pixels.height(), pixels.as_bytes().to_vec())
		.ok_or("Failed to create image buffer")?;
	img.save(path)?;
	Ok(())
}

fn load_palette(path: Option<&Path>) -> Result<Option<Palette>, Box<dyn std::error::Error>> {
	let Some(path) = path else {
		return Ok(None);
	};
	let palette = Palette::open(path)?;
	info!("Loaded palette with {} entries ({})", palette.len(), palette.format());
	Ok(Some(palette))
}

/// Handle info command
fn handle_info(input: &Path, config: &DecodeConfig) -> Result<(), Box<dyn std::error::Error>> {
	let data = fs::read(input)?;
	let magic = data.get(..4).unwrap_or_default();

	match magic {
		b"PVMH" => {
			let archive = PvmFile::from_bytes_with_config(&data, config)?;
			println!("{archive}");
		}
		b"PVPL" => {
			let header = pvp::Header::from_bytes(&data)?;
			println!("{header}");
		}
		_ => {
			let header = pvr::Header::from_bytes(&data)?;
			println!("{header}");
		}
	}
	Ok(())
}

/// Handle decode command
fn handle_decode(
	input: &Path,
	output: &Path,
	palette: Option<&Path>,
	config: DecodeConfig,
) -> Result<(), Box<dyn std::error::Error>> {
	let palette = load_palette(palette)?;
	let data = fs::read(input)?;

	let texture = PvrDecoder::with_config(config).decode(&data, palette.as_ref())?;
	info!(
		"Decoded {} ({}x{})",
		input.display(),
		texture.pixels().width(),
		texture.pixels().height()
	);

	save_png(output, texture.pixels())?;
	println!("✓ Saved {}", output.display());
	Ok(())
}

/// Handle extract command
fn handle_extract(
	input: &Path,
	output: &Path,
	palette: Option<&Path>,
	raw: bool,
	config: DecodeConfig,
) -> Result<(), Box<dyn std::error::Error>> {
	let palette = load_palette(palette)?;
	let archive = PvmFile::from_bytes_with_config(&fs::read(input)?, &config)?;
	info!("{} entries, {} layout", archive.len(), archive.layout());
	fs::create_dir_all(output)?;

	let mut decoder = PvrDecoder::with_config(config);
	let mut failed = 0usize;
	for (index, entry) in archive.entries().iter().enumerate() {
		let stem = match entry.name() {
			"" => format!("{index:04}"),
			name => name.to_string(),
		};

		if raw && let Some(data) = archive.entry_data(index) {
			fs::write(output.join(format!("{stem}.pvr")), data)?;
		}

		match archive.decode_texture_with(&mut decoder, index, palette.as_ref()) {
			Ok(texture) => {
				let path = output.join(format!("{stem}.png"));
				save_png(&path, texture.pixels())?;
				println!("  [{index}] {stem}: {}", texture.header());
			}
			Err(e) => {
				failed += 1;
				error!("  [{index}] {stem}: {e}");
			}
		}
	}

	if failed > 0 {
		warn!("{failed} of {} textures could not be decoded", archive.len());
	}
	println!("✓ Extracted {} textures to {}", archive.len() - failed, output.display());
	Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
	env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

	let cli = Cli::parse();
	let config = load_config(cli.config.as_deref())?;

	match cli.command {
		Commands::Info {
			input,
		} => handle_info(&input, &config),

		Commands::Decode {
			input,
			output,
			palette,
		} => handle_decode(&input, &output, palette.as_deref(), config),

		Commands::Extract {
			input,
			output,
			palette,
			raw,
		} => handle_extract(&input, &output, palette.as_deref(), raw, config),
	}
}
