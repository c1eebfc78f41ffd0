#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! `dcasset-rs` decodes Dreamcast-era asset formats: PVR textures, PVP
//! palettes, PVM texture archives and NJ (Ninja) models.
//!
//! ```no_run
//! use dcasset_rs::prelude::*;
//!
//! let texture = PvrFile::open("title.pvr")?;
//! println!("{}", texture.header());
//! # Ok::<(), DcFileError>(())
//! ```
pub use dcasset_internal::*;
