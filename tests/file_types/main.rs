//! Integration tests for the `dcasset-rs` file types

mod nj;
mod pvm;
mod pvr;

/// Serialises little-endian 16-bit words.
pub(crate) fn words(values: &[u16]) -> Vec<u8> {
	values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Builds a `PVRT` chunk with the given colour format, layout and payload.
pub(crate) fn build_pvr(color: u8, layout: u8, width: u16, height: u16, payload: &[u8]) -> Vec<u8> {
	let mut data = Vec::new();
	data.extend_from_slice(b"PVRT");
	data.extend_from_slice(&(8 + payload.len() as u32).to_le_bytes());
	data.extend_from_slice(&[color, layout, 0, 0]);
	data.extend_from_slice(&width.to_le_bytes());
	data.extend_from_slice(&height.to_le_bytes());
	data.extend_from_slice(payload);
	data
}
