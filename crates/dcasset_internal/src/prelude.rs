//! Prelude module for `dcasset_internal`.
//!
//! This module provides a convenient way to import commonly used types and traits.
//!
//! # Examples
//!
//! ```rust
//! use dcasset_internal::prelude::*;
//!
//! // Now you can use all common types directly
//! let config = DecodeConfig::strict();
//! let palette = Palette::grayscale(16);
//! assert_eq!(palette.len(), 16);
//!
//! let error = PvrFile::from_bytes(b"PVMH").unwrap_err();
//! assert!(matches!(error, DcFileError::InvalidMagic { .. }));
//! # let _ = config;
//! ```

// Re-export everything from dcasset_types::prelude
#[doc(inline)]
pub use dcasset_types::prelude::*;

// Re-export the entire dcasset_types module for advanced usage
#[doc(inline)]
pub use dcasset_types;
