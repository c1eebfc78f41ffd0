//! File type support for `dcasset-rs` project.

mod config;
mod error;

pub mod color;
pub mod nj;
pub mod pvm;
pub mod pvp;
pub mod pvr;
pub mod reader;
pub mod twiddle;

// Re-export unified error type and decode limits
pub use config::DecodeConfig;
pub use error::{DcFileError, FileType};

// Re-export main file types
pub use color::{Color, ColorFormat};
pub use nj::{
	Bone, BoundingSphere, File as NjFile, MaterialSpec, Mesh, Model as NjModel, TextureName,
};
pub use pvm::{Entry as PvmEntry, File as PvmFile, Header as PvmHeader, PvmLayout};
pub use pvp::{Header as PvpHeader, Palette};
pub use pvr::{
	Decoder as PvrDecoder, File as PvrFile, Header as PvrHeader, PixelBuffer, PixelLayout,
};
pub use reader::ByteCursor;
pub use twiddle::TwiddleCache;
