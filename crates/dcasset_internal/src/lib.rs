//! This module is separated into its own crate to keep the decoders apart from the `dcasset` facade, and should not be used directly.

/// `use dcasset_rs::prelude::*;` to import commonly used items.
pub mod prelude;

// Re-export dcasset_types for convenience
pub use dcasset_types;

// Re-export commonly used types at crate root
pub use dcasset_types::file::{
	DcFileError, DecodeConfig, FileType, NjFile, Palette, PvmFile, PvrDecoder, PvrFile,
};
