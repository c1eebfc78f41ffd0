//! Ninja Model CLI Utility
//!
//! A command-line tool for inspecting `.NJ` models.
//!
//! # Features
//!
//! - **info**: Print texture names, bones, materials and draw ranges
//! - **dump**: Write the decoded model as JSON
//! - **validate**: Decode every `.NJ` file under a directory and report failures
//!
//! # Usage
//!
//! ```bash
//! cargo run --example nj_utils info player.nj
//! cargo run --example nj_utils dump player.nj player.json --pretty
//! cargo run --example nj_utils validate -d bin/nj --recursive
//! ```

use std::{
	fs,
	path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use dcasset_rs::prelude::{DecodeConfig, NjFile};
use log::{info, warn};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "nj_utils")]
#[command(author = "dcasset-rs project")]
#[command(version = "1.0")]
#[command(about = "Ninja model utility - inspect and dump NJ files", long_about = None)]
struct Cli {
	/// JSON file with decode limits
	#[arg(short, long, global = true, value_name = "CONFIG_JSON")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Print model statistics
	Info {
		/// Input NJ file path
		#[arg(value_name = "INPUT_NJ")]
		input: PathBuf,

		/// List every bone and material
		#[arg(short, long)]
		verbose: bool,
	},

	/// Dump the decoded model as JSON
	Dump {
		/// Input NJ file path
		#[arg(value_name = "INPUT_NJ")]
		input: PathBuf,

		/// Output JSON file path, stdout if omitted
		#[arg(value_name = "OUTPUT_JSON")]
		output: Option<PathBuf>,

		/// Pretty-print the JSON
		#[arg(short, long)]
		pretty: bool,
	},

	/// Decode every .NJ file under a directory
	Validate {
		/// Directory containing .NJ files
		#[arg(short = 'd', long, value_name = "DIR", default_value = "bin/nj")]
		root: PathBuf,

		/// Recurse into sub-directories while scanning
		#[arg(short, long, default_value_t = false)]
		recursive: bool,
	},
}

fn load_config(path: Option<&Path>) -> Result<DecodeConfig> {
	let Some(path) = path else {
		return Ok(DecodeConfig::default());
	};
	let text = fs::read_to_string(path)
		.with_context(|| format!("Failed to read config {}", path.display()))?;
	let config = serde_json::from_str(&text)
		.with_context(|| format!("Failed to parse config {}", path.display()))?;
	info!("Loaded decode limits from {}", path.display());
	Ok(config)
}

fn load_model(input: &Path, config: &DecodeConfig) -> Result<NjFile> {
	let data = fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
	let file = NjFile::from_bytes_with_config(&data, config)
		.with_context(|| format!("Failed to decode {}", input.display()))?;
	info!("Loaded {} ({} bytes)", input.display(), data.len());
	Ok(file)
}

/// Handle info command
fn handle_info(input: &Path, verbose: bool, config: &DecodeConfig) -> Result<()> {
	let file = load_model(input, config)?;
	print!("{file}");

	if !verbose {
		return Ok(());
	}

	for (i, model) in file.models().iter().enumerate() {
		println!("\nModel [{i}]");
		println!("  Bones:");
		for bone in &model.bones {
			let origin = bone.world.w_axis;
			println!(
				"    [{:3}] parent {:>4} model {:>10} world origin ({:.3}, {:.3}, {:.3}){}",
				bone.index,
				bone.parent.map_or_else(|| "-".to_string(), |p| p.to_string()),
				bone.model_offset.map_or_else(|| "-".to_string(), |o| format!("0x{o:X}")),
				origin.x,
				origin.y,
				origin.z,
				if bone.is_hidden() {
					" hidden"
				} else {
					""
				}
			);
		}

		println!("  Materials:");
		for (m, material) in model.materials.iter().enumerate() {
			println!(
				"    [{m}] texture {:>3} blend {:5} double-sided {:5} diffuse {:?}",
				material.texture_id, material.blending, material.double_sided, material.diffuse
			);
		}

		println!("  Draw ranges:");
		for range in model.mesh.material_ranges() {
			println!(
				"    material {} vertices {}..{}",
				range.material,
				range.start,
				range.start + range.count
			);
		}
	}
	Ok(())
}

/// Handle dump command
fn handle_dump(
	input: &Path,
	output: Option<&Path>,
	pretty: bool,
	config: &DecodeConfig,
) -> Result<()> {
	let file = load_model(input, config)?;
	let json = if pretty {
		serde_json::to_string_pretty(&file)?
	} else {
		serde_json::to_string(&file)?
	};

	match output {
		Some(path) => {
			fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
			println!("✓ Saved {}", path.display());
		}
		None => println!("{json}"),
	}
	Ok(())
}

fn collect_nj_files(root: &Path, recursive: bool) -> Vec<PathBuf> {
	let max_depth = if recursive {
		usize::MAX
	} else {
		1
	};
	let mut files = Vec::new();

	for entry in WalkDir::new(root).max_depth(max_depth).follow_links(false) {
		let entry = match entry {
			Ok(entry) => entry,
			Err(err) => {
				warn!("{err}");
				continue;
			}
		};

		let is_nj = entry
			.path()
			.extension()
			.and_then(|ext| ext.to_str())
			.is_some_and(|ext| ext.eq_ignore_ascii_case("nj"));
		if entry.file_type().is_file() && is_nj {
			files.push(entry.into_path());
		}
	}

	files.sort();
	files
}

/// Handle validate command
fn handle_validate(root: &Path, recursive: bool, config: &DecodeConfig) -> Result<()> {
	if !root.is_dir() {
		bail!("{} is not a directory", root.display());
	}

	let files = collect_nj_files(root, recursive);
	let mut failed = 0usize;
	for path in &files {
		match load_model(path, config) {
			Ok(file) => {
				let triangles: usize = file.models().iter().map(|m| m.mesh.triangle_count()).sum();
				println!("  ✓ {} ({} models, {triangles} triangles)", path.display(), file.models().len());
			}
			Err(err) => {
				failed += 1;
				println!("  ✗ {}: {err:#}", path.display());
			}
		}
	}

	println!("\n{} files, {failed} failed", files.len());
	if failed > 0 {
		bail!("{failed} files failed to decode");
	}
	Ok(())
}

fn main() -> Result<()> {
	env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

	let cli = Cli::parse();
	let config = load_config(cli.config.as_deref())?;

	match cli.command {
		Commands::Info {
			input,
			verbose,
		} => handle_info(&input, verbose, &config),

		Commands::Dump {
			input,
			output,
			pretty,
		} => handle_dump(&input, output.as_deref(), pretty, &config),

		Commands::Validate {
			root,
			recursive,
		} => handle_validate(&root, recursive, &config),
	}
}
