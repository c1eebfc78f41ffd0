//! Error types for file format parsing.

use std::fmt::Display;

use thiserror::Error;

/// File formats understood by this crate, used to tag errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
	/// `.PVR` texture
	Pvr,
	/// `.PVP` palette
	Pvp,
	/// `.PVM` texture archive
	Pvm,
	/// `.NJ` Ninja model
	Nj,
}

impl Display for FileType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			FileType::Pvr => write!(f, "PVR"),
			FileType::Pvp => write!(f, "PVP"),
			FileType::Pvm => write!(f, "PVM"),
			FileType::Nj => write!(f, "NJ"),
		}
	}
}

/// Unified error type for every decoder in this crate.
///
/// Any error is fatal to the decode call that produced it; no partial output
/// is ever returned alongside an error.
#[derive(Debug, Error)]
pub enum DcFileError {
	/// Wrong or missing format signature
	#[error("{file_type}: invalid magic, expected {expected:02X?}, got {actual:02X?}")]
	InvalidMagic {
		/// Format being decoded
		file_type: FileType,
		/// Expected signature bytes
		expected: Vec<u8>,
		/// Bytes actually found
		actual: Vec<u8>,
	},

	/// Recognized container but an unhandled layout, colour or chunk code
	#[error("{file_type}: unsupported format: {message}")]
	UnsupportedFormat {
		/// Format being decoded
		file_type: FileType,
		/// What was not supported
		message: String,
	},

	/// A read crossed the end of its buffer
	#[error(
		"Out of bounds: read of {requested} bytes at offset {offset} exceeds buffer length {available}"
	)]
	OutOfBounds {
		/// Cursor position of the failed read
		offset: usize,
		/// Number of bytes requested
		requested: usize,
		/// Length of the buffer
		available: usize,
	},

	/// Structurally invalid data
	#[error("{file_type}: malformed structure: {message}")]
	MalformedStructure {
		/// Format being decoded
		file_type: FileType,
		/// Description of the inconsistency
		message: String,
	},

	/// A recognized feature this decoder does not implement
	#[error("{file_type}: not implemented: {feature}")]
	NotImplemented {
		/// Format being decoded
		file_type: FileType,
		/// Name of the feature
		feature: String,
	},

	/// IO error
	#[error(transparent)]
	IoError(#[from] std::io::Error),
}

impl DcFileError {
	/// Creates an [`DcFileError::InvalidMagic`] error.
	pub fn invalid_magic(file_type: FileType, expected: &[u8], actual: &[u8]) -> Self {
		Self::InvalidMagic {
			file_type,
			expected: expected.to_vec(),
			actual: actual.to_vec(),
		}
	}

	/// Creates an [`DcFileError::UnsupportedFormat`] error.
	pub fn unsupported(file_type: FileType, message: impl Into<String>) -> Self {
		Self::UnsupportedFormat {
			file_type,
			message: message.into(),
		}
	}

	/// Creates a [`DcFileError::MalformedStructure`] error.
	pub fn malformed(file_type: FileType, message: impl Into<String>) -> Self {
		Self::MalformedStructure {
			file_type,
			message: message.into(),
		}
	}

	/// Creates a [`DcFileError::NotImplemented`] error.
	pub fn not_implemented(file_type: FileType, feature: impl Into<String>) -> Self {
		Self::NotImplemented {
			file_type,
			feature: feature.into(),
		}
	}

	/// Returns the file type the error is attributed to, if any.
	pub fn file_type(&self) -> Option<FileType> {
		match self {
			Self::InvalidMagic {
				file_type,
				..
			}
			| Self::UnsupportedFormat {
				file_type,
				..
			}
			| Self::MalformedStructure {
				file_type,
				..
			}
			| Self::NotImplemented {
				file_type,
				..
			} => Some(*file_type),
			Self::OutOfBounds {
				..
			}
			| Self::IoError(_) => None,
		}
	}
}
