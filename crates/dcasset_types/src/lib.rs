//! This crate provides the decoders of the `dcasset-rs` project.
//!
//! # File Formats
//!
//! - **PVR**: Textures in one of seven colour formats and several pixel
//!   layouts (twiddled, vector-quantised, palettised, rectangular)
//! - **PVP**: External palettes for palettised PVR textures
//! - **PVM**: Texture archives, in either the scanned or the directory layout
//! - **NJ**: Ninja models, decoded to a skeleton and a triangle soup
//!
//! # Examples
//!
//! Using the prelude (recommended):
//!
//! ```no_run
//! use dcasset_types::prelude::*;
//!
//! let archive = PvmFile::open("textures.pvm")?;
//! for (i, (entry, _)) in archive.iter().enumerate() {
//!     let texture = archive.decode_texture(i, None)?;
//!     println!("{}: {}x{}", entry.name(), texture.pixels().width(), texture.pixels().height());
//! }
//!
//! let model = NjFile::open("model.nj")?;
//! println!("{model}");
//! # Ok::<(), DcFileError>(())
//! ```
//!
//! Or use explicit paths:
//!
//! ```no_run
//! use dcasset_types::file::pvr;
//!
//! let data = std::fs::read("texture.pvr")?;
//! let texture = pvr::decode(&data, None)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod file;

/// `use dcasset_types::prelude::*;` to import commonly used items.
pub mod prelude;
