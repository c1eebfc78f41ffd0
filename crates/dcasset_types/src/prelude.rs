//! Prelude module for `dcasset_types`.
//!
//! This module provides a convenient way to import commonly used types.
//!
//! # Examples
//!
//! ```no_run
//! use dcasset_types::prelude::*;
//!
//! let texture = PvrFile::open("texture.pvr")?;
//! let pixels: &PixelBuffer = texture.pixels();
//! # Ok::<(), DcFileError>(())
//! ```

// File module types
#[doc(inline)]
pub use crate::file::{
	// Colours
	Color,
	ColorFormat,

	// Errors and limits
	DcFileError,
	DecodeConfig,
	FileType,

	// NJ types
	Bone,
	MaterialSpec,
	Mesh,
	NjFile,
	NjModel,

	// PVM types
	PvmEntry,
	PvmFile,
	PvmLayout,

	// PVP types
	Palette,

	// PVR types
	PixelBuffer,
	PixelLayout,
	PvrDecoder,
	PvrFile,
	PvrHeader,
};

// Re-export the file module for advanced usage
#[doc(inline)]
pub use crate::file;
