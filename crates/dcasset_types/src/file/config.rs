//! Decode limits shared by the texture, archive and model decoders.
//!
//! Every limit guards against malformed input: exceeding one is reported as
//! [`DcFileError::MalformedStructure`](super::DcFileError::MalformedStructure)
//! rather than looping or allocating without bound.

use serde::{Deserialize, Serialize};

/// Configuration for decoding.
///
/// # Presets
///
/// - `default()`: balanced limits suitable for retail assets
/// - `lenient()`: larger limits for unusual or hand-built files
/// - `strict()`: small limits for untrusted input
///
/// # Examples
///
/// ```
/// use dcasset_types::file::DecodeConfig;
///
/// let config = DecodeConfig::default();
/// assert_eq!(config.max_bone_depth, 256);
///
/// let config = DecodeConfig::strict();
/// assert!(config.max_bones < DecodeConfig::default().max_bones);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeConfig {
	/// Maximum bytes searched for each `PVRT` marker in scanned PVM archives
	pub pvm_scan_limit: usize,
	/// Maximum bone-tree recursion depth
	pub max_bone_depth: usize,
	/// Maximum number of bones in one NJCM tree
	pub max_bones: usize,
	/// Maximum number of model chunks interpreted per bone
	pub max_chunk_steps: usize,
	/// Largest accepted texture width or height
	pub max_texture_dimension: u16,
}

impl Default for DecodeConfig {
	fn default() -> Self {
		Self {
			pvm_scan_limit: 4 * 1024 * 1024,
			max_bone_depth: 256,
			max_bones: 4096,
			max_chunk_steps: 65536,
			max_texture_dimension: 4096,
		}
	}
}

impl DecodeConfig {
	/// Create a configuration with custom limits.
	pub fn new(
		pvm_scan_limit: usize,
		max_bone_depth: usize,
		max_bones: usize,
		max_chunk_steps: usize,
		max_texture_dimension: u16,
	) -> Self {
		Self {
			pvm_scan_limit,
			max_bone_depth,
			max_bones,
			max_chunk_steps,
			max_texture_dimension,
		}
	}

	/// Create a lenient configuration with higher limits.
	pub fn lenient() -> Self {
		Self {
			pvm_scan_limit: 64 * 1024 * 1024,
			max_bone_depth: 1024,
			max_bones: 65536,
			max_chunk_steps: 1 << 20,
			max_texture_dimension: 8192,
		}
	}

	/// Create a strict configuration with lower limits.
	pub fn strict() -> Self {
		Self {
			pvm_scan_limit: 256 * 1024,
			max_bone_depth: 64,
			max_bones: 512,
			max_chunk_steps: 4096,
			max_texture_dimension: 1024,
		}
	}
}
